use std::path::Path;

use paperview_core::{HostSurface, RenderFrame, ViewerError};

/// Horizontal chrome around the content area, mirrored in the view layout.
pub const CONTENT_PADDING: f64 = 10.0;

/// Host-side presentation state for the viewer content area. The view
/// reads this; the controller writes it through [`HostSurface`].
#[derive(Debug, Default)]
pub struct ViewerPanel {
    content_width: f64,
    window_height: f64,
    frame: Option<RenderFrame>,
    locked_height: Option<f64>,
    zoom_label: String,
    page_label: String,
    error: Option<String>,
}

impl ViewerPanel {
    pub fn new(window_width: f64, window_height: f64) -> Self {
        let mut panel = Self::default();
        panel.set_window_size(window_width, window_height);
        panel
    }

    /// Track the window geometry; the content area spans the window width
    /// minus the chrome padding.
    pub fn set_window_size(&mut self, width: f64, height: f64) {
        self.content_width = (width - 2.0 * CONTENT_PADDING).max(0.0);
        self.window_height = height;
    }

    pub fn frame(&self) -> Option<RenderFrame> {
        self.frame
    }

    pub fn locked_height(&self) -> Option<f64> {
        self.locked_height
    }

    pub fn zoom_label(&self) -> &str {
        &self.zoom_label
    }

    pub fn page_label(&self) -> &str {
        &self.page_label
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl HostSurface for ViewerPanel {
    fn container_width(&self) -> f64 {
        self.content_width
    }

    fn container_height(&self) -> f64 {
        self.frame.map(|f| f.extent.height).unwrap_or(0.0)
    }

    fn viewport_height(&self) -> f64 {
        self.window_height
    }

    fn present(&mut self, frame: RenderFrame) {
        self.error = None;
        self.frame = Some(frame);
    }

    fn lock_height(&mut self, px: f64) {
        self.locked_height = Some(px);
    }

    fn set_zoom_label(&mut self, label: &str) {
        self.zoom_label = label.to_owned();
    }

    fn set_page_label(&mut self, label: &str) {
        self.page_label = label.to_owned();
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_owned());
    }

    fn open_external(&self, target: &Path) -> Result<(), ViewerError> {
        open::that(target).map_err(|e| ViewerError::Load {
            locator: target.to_path_buf(),
            reason: format!("could not open externally: {e}"),
        })
    }

    fn save_copy(&self, source: &Path, file_name: &str) -> Result<(), ViewerError> {
        let Some(destination) = rfd::FileDialog::new()
            .set_title("Save a copy")
            .set_file_name(file_name)
            .save_file()
        else {
            // User cancelled
            return Ok(());
        };
        std::fs::copy(source, &destination)
            .map(|_| ())
            .map_err(|e| ViewerError::Load {
                locator: source.to_path_buf(),
                reason: format!("could not save copy to {}: {e}", destination.display()),
            })
    }
}
