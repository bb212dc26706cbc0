use std::path::Path;

use crate::error::ViewerError;

/// Page number presented by a viewing session. The viewer is single-page;
/// page numbers are 1-based throughout.
pub const FIRST_PAGE: u32 = 1;

/// Intrinsic (scale = 1) page dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageViewport {
    pub width: f64,
    pub height: f64,
}

impl PageViewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Dimensions after applying a zoom multiplier.
    pub fn scaled(&self, scale: f64) -> PageViewport {
        PageViewport {
            width: self.width * scale,
            height: self.height * scale,
        }
    }
}

/// Session-visible facts about a loaded document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentInfo {
    pub page_count: u32,
    /// Intrinsic viewport of the page the session presents.
    pub first_page: PageViewport,
}

/// Rendering backend capability consumed by a viewing session.
///
/// Implementations own document decoding and rasterization; the controller
/// only ever sees page counts and intrinsic viewports. Loads and viewport
/// fetches are asynchronous so a backend may decode off the event loop.
#[allow(async_fn_in_trait)]
pub trait RenderEngine {
    /// Opaque handle to a decoded document.
    type Document;

    /// Decode the document behind `locator`.
    async fn load_document(&self, locator: &Path) -> Result<Self::Document, ViewerError>;

    fn page_count(&self, document: &Self::Document) -> u32;

    /// Intrinsic viewport of one page. 1-based page number.
    async fn page_viewport(
        &self,
        document: &Self::Document,
        page: u32,
    ) -> Result<PageViewport, ViewerError>;
}

/// Load a document and gather the facts a session needs to start presenting.
pub async fn load_session<E: RenderEngine>(
    engine: &E,
    locator: &Path,
) -> Result<(E::Document, DocumentInfo), ViewerError> {
    let document = engine.load_document(locator).await?;
    let page_count = engine.page_count(&document);
    let first_page = engine.page_viewport(&document, FIRST_PAGE).await?;
    Ok((document, DocumentInfo { page_count, first_page }))
}
