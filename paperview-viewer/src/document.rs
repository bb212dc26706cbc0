use std::collections::HashMap;
use std::sync::Mutex;

use iced::widget::image::Handle;

use crate::renderer::PdfiumDocument;

const CACHE_CAP: usize = 10;

/// A document held for the session, with a bounded cache of rasterized
/// pages keyed by (page, zoom percent).
pub struct LoadedDocument {
    document: PdfiumDocument,
    cache: Mutex<HashMap<(u32, u32), Handle>>,
}

// Manual Debug impl since the document contains PDFium types
impl std::fmt::Debug for LoadedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedDocument")
            .field("page_count", &self.document.page_count())
            .finish()
    }
}

impl LoadedDocument {
    pub fn new(document: PdfiumDocument) -> Self {
        Self {
            document,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn document(&self) -> &PdfiumDocument {
        &self.document
    }

    /// Rasterize `page` at `scale`, reusing the cache when possible.
    pub fn rendered_page(&self, page: u32, scale: f64) -> Option<Handle> {
        let zoom_percent = (scale * 100.0).round() as u32;
        let key = (page, zoom_percent);

        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(handle) = cache.get(&key) {
            return Some(handle.clone());
        }

        match self.document.render_page(page, scale) {
            Ok(img) => {
                let (width, height) = (img.width(), img.height());
                let handle = Handle::from_rgba(width, height, img.into_raw());
                cache.insert(key, handle.clone());

                // Keep memory bounded
                if cache.len() > CACHE_CAP {
                    let extra: Vec<_> = cache
                        .keys()
                        .take(cache.len() - CACHE_CAP)
                        .copied()
                        .collect();
                    for key in extra {
                        cache.remove(&key);
                    }
                }

                Some(handle)
            }
            Err(e) => {
                tracing::error!("failed to render page {page}: {e:#}");
                None
            }
        }
    }
}
