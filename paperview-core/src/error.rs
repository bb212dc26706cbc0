use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by a viewing session.
///
/// Nothing here is fatal to the hosting process; the worst observable
/// outcome is a visibly erroring or unchanged viewer panel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    /// The document could not be loaded (missing, unreadable, malformed).
    #[error("failed to load document {}: {reason}", .locator.display())]
    Load { locator: PathBuf, reason: String },

    /// A page could not be fetched or decoded.
    #[error("page {page} unavailable: {reason}")]
    Page { page: u32, reason: String },

    /// The container had no usable dimension at fit time.
    #[error("container {dimension} is not usable for fitting")]
    Layout { dimension: &'static str },

    /// The intent arrived outside the ready phase.
    #[error("no document is loaded")]
    NotReady,
}
