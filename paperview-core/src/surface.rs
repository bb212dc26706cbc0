use std::path::Path;

use crate::engine::PageViewport;
use crate::error::ViewerError;

/// One render request: which page to draw, at what zoom, and the pixel
/// extent the drawn page will occupy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderFrame {
    /// 1-based page number.
    pub page: u32,
    pub scale: f64,
    /// Intrinsic viewport multiplied by `scale`.
    pub extent: PageViewport,
}

/// Host-side capability consumed by a viewing session: the container the
/// page is drawn into, its labels, and the environment primitives.
pub trait HostSurface {
    /// Current content-area width in pixels.
    fn container_width(&self) -> f64;

    /// Height of the content currently in the container, 0 when nothing is
    /// rendered yet. The controller prefers its own locked height over this.
    fn container_height(&self) -> f64;

    /// Height of the surrounding display area, used as the fit-page
    /// fallback when no container height is known.
    fn viewport_height(&self) -> f64;

    /// Draw `frame` into the container.
    fn present(&mut self, frame: RenderFrame);

    /// Fix the container height; content overflow scrolls internally from
    /// now on.
    fn lock_height(&mut self, px: f64);

    fn set_zoom_label(&mut self, label: &str);
    fn set_page_label(&mut self, label: &str);

    /// Replace the page with a visible failure state.
    fn show_error(&mut self, message: &str);

    /// Open `target` with the surrounding environment's default handler.
    fn open_external(&self, target: &Path) -> Result<(), ViewerError>;

    /// Save a copy of `source`, suggesting `file_name` to the user.
    fn save_copy(&self, source: &Path, file_name: &str) -> Result<(), ViewerError>;
}
