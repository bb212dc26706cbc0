use std::path::Path;
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use paperview_core::{PageViewport, RenderEngine, ViewerError};
use pdfium_render::prelude::*;

/// Process-wide PDFium binding, created on first use. A library placed next
/// to the executable wins over the system install.
fn pdfium() -> Result<&'static Pdfium> {
    static INSTANCE: OnceLock<Pdfium> = OnceLock::new();
    if INSTANCE.get().is_none() {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .context("failed to bind to the PDFium library; install PDFium or place the library next to the executable")?;
        let _ = INSTANCE.set(Pdfium::new(bindings));
    }
    INSTANCE
        .get()
        .ok_or_else(|| anyhow!("PDFium binding unavailable"))
}

/// Rendering backend over PDFium.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumEngine;

/// A document held open by PDFium for the lifetime of the session.
pub struct PdfiumDocument {
    inner: PdfDocument<'static>,
}

impl PdfiumDocument {
    fn open(path: &Path) -> Result<Self> {
        let inner = pdfium()?
            .load_pdf_from_file(path, None)
            .context("failed to load PDF document")?;
        Ok(Self { inner })
    }

    pub fn page_count(&self) -> u32 {
        u32::from(self.inner.pages().len())
    }

    /// Intrinsic page size in points. 1-based page number.
    pub fn page_size(&self, page: u32) -> Result<PageViewport> {
        let page = self
            .inner
            .pages()
            .get(page_index(page)?)
            .context("page index out of bounds")?;
        Ok(PageViewport::new(
            f64::from(page.width().value),
            f64::from(page.height().value),
        ))
    }

    /// Rasterize one page at `scale`. 1-based page number.
    pub fn render_page(&self, page: u32, scale: f64) -> Result<image::RgbaImage> {
        let page = self
            .inner
            .pages()
            .get(page_index(page)?)
            .context("page index out of bounds")?;

        let render_width = (f64::from(page.width().value) * scale) as i32;
        let render_height = (f64::from(page.height().value) * scale) as i32;

        let render_config = PdfRenderConfig::new()
            .set_target_width(render_width)
            .set_maximum_height(render_height)
            .rotate_if_landscape(PdfPageRenderRotation::None, false);

        let bitmap = page
            .render_with_config(&render_config)
            .context("failed to render page")?;

        let buffer = bitmap.as_raw_bytes();
        image::RgbaImage::from_raw(
            bitmap.width() as u32,
            bitmap.height() as u32,
            buffer.to_vec(),
        )
        .context("failed to create image from bitmap")
    }
}

fn page_index(page: u32) -> Result<u16> {
    page.checked_sub(1)
        .and_then(|index| u16::try_from(index).ok())
        .ok_or_else(|| anyhow!("page number {page} out of range"))
}

impl RenderEngine for PdfiumEngine {
    type Document = PdfiumDocument;

    async fn load_document(&self, locator: &Path) -> Result<PdfiumDocument, ViewerError> {
        PdfiumDocument::open(locator).map_err(|e| ViewerError::Load {
            locator: locator.to_path_buf(),
            reason: format!("{e:#}"),
        })
    }

    fn page_count(&self, document: &PdfiumDocument) -> u32 {
        document.page_count()
    }

    async fn page_viewport(
        &self,
        document: &PdfiumDocument,
        page: u32,
    ) -> Result<PageViewport, ViewerError> {
        document.page_size(page).map_err(|e| ViewerError::Page {
            page,
            reason: format!("{e:#}"),
        })
    }
}
