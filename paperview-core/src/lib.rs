//! Backend-agnostic interactive document viewer controller.
//!
//! [`ViewerController`] owns the view state of one document session: the
//! current scale (clamped into configured bounds), the load phase, and the
//! one-way height lock that keeps the host container from resizing under
//! the user after the first render. It consumes two capabilities supplied
//! by the host: a [`RenderEngine`] that decodes documents and reports page
//! geometry, and a [`HostSurface`] that presents frames and exposes the
//! container's dimensions.
//!
//! Loads and fit measurements are asynchronous host tasks; the controller
//! tags every fit with a sequence number and discards completions that a
//! newer intent has superseded, so the on-screen scale always matches the
//! last thing the user asked for.

pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod surface;

pub use config::ViewerConfig;
pub use controller::{FitMode, FitRequest, ScaleOutcome, ViewerController};
pub use engine::{load_session, DocumentInfo, PageViewport, RenderEngine, FIRST_PAGE};
pub use error::ViewerError;
pub use surface::{HostSurface, RenderFrame};
