use std::path::{Path, PathBuf};

use crate::config::ViewerConfig;
use crate::engine::{DocumentInfo, PageViewport, FIRST_PAGE};
use crate::error::ViewerError;
use crate::surface::{HostSurface, RenderFrame};

/// Which dimension(s) a fit computation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Fill the container width exactly.
    Width,
    /// Fill width and height, whichever binds first.
    Page,
}

/// Ticket for an in-flight fit measurement.
///
/// The host fetches the page's intrinsic viewport and hands the ticket back
/// through [`ViewerController::complete_fit`]; a ticket issued before a
/// newer scale intent is rejected there as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitRequest {
    seq: u64,
    mode: FitMode,
    page: u32,
}

impl FitRequest {
    /// 1-based page number to measure.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn mode(&self) -> FitMode {
        self.mode
    }
}

/// How a scale intent landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleOutcome {
    /// Applied and re-presented on screen.
    Rendered(f64),
    /// Stored for the first presentation; no page is on screen yet.
    Stored(f64),
    /// A newer intent superseded this one; nothing changed.
    Stale,
    /// The input carried no usable change (non-finite, or an empty wheel
    /// gesture); nothing changed.
    Ignored,
}

#[derive(Debug)]
enum Phase {
    Unloaded,
    Loading,
    Ready(Session),
    Failed(ViewerError),
}

#[derive(Debug)]
struct Session {
    page: u32,
    page_count: u32,
    intrinsic: PageViewport,
}

/// One-way latch fixing the container height after the first presentation
/// with a positive height, so later zooming never jitters the layout.
#[derive(Debug, Clone, Copy, PartialEq)]
enum HeightLock {
    Unlocked,
    Locked(f64),
}

impl HeightLock {
    /// Observe a freshly presented height. Returns the locked value the
    /// first time a positive height is seen, `None` ever after.
    fn observe(&mut self, height: f64) -> Option<f64> {
        match self {
            HeightLock::Unlocked if height > 0.0 => {
                *self = HeightLock::Locked(height);
                Some(height)
            }
            _ => None,
        }
    }

    fn locked(&self) -> Option<f64> {
        match self {
            HeightLock::Locked(px) => Some(*px),
            HeightLock::Unlocked => None,
        }
    }
}

/// Viewer state machine for one document session.
///
/// Owns the current scale, the load phase, and the height lock; talks to
/// the outside world only through the injected [`HostSurface`] and the
/// measurements the host feeds back. Multiple controllers are fully
/// independent.
pub struct ViewerController<H: HostSurface> {
    config: ViewerConfig,
    locator: PathBuf,
    surface: H,
    phase: Phase,
    scale: f64,
    height_lock: HeightLock,
    fit_seq: u64,
}

impl<H: HostSurface> ViewerController<H> {
    pub fn new(config: ViewerConfig, locator: impl Into<PathBuf>, surface: H) -> Self {
        let scale = config.clamp_scale(config.default_scale);
        Self {
            config,
            locator: locator.into(),
            surface,
            phase: Phase::Unloaded,
            scale,
            height_lock: HeightLock::Unlocked,
            fit_seq: 0,
        }
    }

    pub fn locator(&self) -> &Path {
        &self.locator
    }

    pub fn surface(&self) -> &H {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut H {
        &mut self.surface
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready(_))
    }

    pub fn page_count(&self) -> Option<u32> {
        match &self.phase {
            Phase::Ready(session) => Some(session.page_count),
            _ => None,
        }
    }

    pub fn locked_height(&self) -> Option<f64> {
        self.height_lock.locked()
    }

    pub fn load_failure(&self) -> Option<&ViewerError> {
        match &self.phase {
            Phase::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Enter the loading phase. Permitted when nothing is loaded yet and
    /// after a failed load (retry); rejected mid-load and once ready.
    pub fn begin_load(&mut self) -> Result<(), ViewerError> {
        match self.phase {
            Phase::Unloaded | Phase::Failed(_) => {
                tracing::debug!(locator = %self.locator.display(), "loading document");
                self.phase = Phase::Loading;
                Ok(())
            }
            Phase::Loading | Phase::Ready(_) => Err(ViewerError::NotReady),
        }
    }

    /// Deliver the outcome of the asynchronous document load.
    ///
    /// On success the page is presented at the current stored scale and the
    /// labels are written; on failure the session enters the failed phase
    /// and the error is surfaced visibly.
    pub fn document_ready(&mut self, outcome: Result<DocumentInfo, ViewerError>) {
        if !matches!(self.phase, Phase::Loading) {
            tracing::warn!("discarding load completion outside the loading phase");
            return;
        }
        match outcome {
            Ok(info) => {
                tracing::debug!(pages = info.page_count, "document ready");
                self.phase = Phase::Ready(Session {
                    page: FIRST_PAGE,
                    page_count: info.page_count,
                    intrinsic: info.first_page,
                });
                let label = format!("Page {} of {}", FIRST_PAGE, info.page_count);
                self.surface.set_page_label(&label);
                self.present();
            }
            Err(error) => {
                tracing::error!(%error, "document load failed");
                self.surface.show_error(&error.to_string());
                self.phase = Phase::Failed(error);
            }
        }
    }

    /// Clamp and store `requested`; re-present if a page is on screen.
    ///
    /// A scale requested before the document is ready is kept and applied
    /// on the first presentation. Any in-flight fit is superseded.
    pub fn set_scale(&mut self, requested: f64) -> ScaleOutcome {
        if !requested.is_finite() {
            tracing::warn!(requested, "ignoring non-finite scale");
            return ScaleOutcome::Ignored;
        }
        self.fit_seq += 1;
        self.scale = self.config.clamp_scale(requested);
        match self.phase {
            Phase::Ready(_) => {
                self.present();
                ScaleOutcome::Rendered(self.scale)
            }
            _ => ScaleOutcome::Stored(self.scale),
        }
    }

    pub fn zoom_by(&mut self, delta: f64) -> ScaleOutcome {
        self.set_scale(self.scale + delta)
    }

    pub fn zoom_in(&mut self) -> ScaleOutcome {
        self.zoom_by(self.config.zoom_step)
    }

    pub fn zoom_out(&mut self) -> ScaleOutcome {
        self.zoom_by(-self.config.zoom_step)
    }

    pub fn reset_zoom(&mut self) -> ScaleOutcome {
        self.set_scale(1.0)
    }

    /// Zoom from a wheel or pinch gesture. Positive `notches` zoom in;
    /// notch values come pre-normalized from the host (one line of wheel
    /// travel is one notch).
    pub fn wheel_zoom(&mut self, notches: f64) -> ScaleOutcome {
        if !notches.is_finite() || notches.abs() < f64::EPSILON {
            return ScaleOutcome::Ignored;
        }
        self.zoom_by(notches * self.config.wheel_step())
    }

    /// Ask for a fit computation. The host fetches the returned page's
    /// intrinsic viewport and reports back through [`Self::complete_fit`].
    pub fn request_fit(&mut self, mode: FitMode) -> Result<FitRequest, ViewerError> {
        let page = self.session()?.page;
        self.fit_seq += 1;
        Ok(FitRequest {
            seq: self.fit_seq,
            mode,
            page,
        })
    }

    /// Apply a fit measurement, unless a newer intent superseded it.
    ///
    /// A failed measurement abandons the fit with the prior scale intact;
    /// so does a container with no usable dimension.
    pub fn complete_fit(
        &mut self,
        request: FitRequest,
        viewport: Result<PageViewport, ViewerError>,
    ) -> Result<ScaleOutcome, ViewerError> {
        if request.seq != self.fit_seq {
            tracing::warn!(
                seq = request.seq,
                current = self.fit_seq,
                "discarding superseded fit result"
            );
            return Ok(ScaleOutcome::Stale);
        }
        self.session()?;
        let viewport = viewport?;
        let target = self.fit_scale(request.page, request.mode, viewport)?;
        Ok(self.set_scale(target))
    }

    fn fit_scale(
        &self,
        page: u32,
        mode: FitMode,
        intrinsic: PageViewport,
    ) -> Result<f64, ViewerError> {
        if intrinsic.width <= 0.0 || intrinsic.height <= 0.0 {
            return Err(ViewerError::Page {
                page,
                reason: "page has no intrinsic size".into(),
            });
        }
        let width = self.surface.container_width();
        if width <= 0.0 {
            return Err(ViewerError::Layout { dimension: "width" });
        }
        let width_scale = width / intrinsic.width;
        match mode {
            FitMode::Width => Ok(width_scale),
            FitMode::Page => {
                let height = self.effective_height();
                if height <= 0.0 {
                    return Err(ViewerError::Layout {
                        dimension: "height",
                    });
                }
                Ok(width_scale.min(height / intrinsic.height))
            }
        }
    }

    /// Locked height if the latch fired, else the current content height,
    /// else 90% of the surrounding display area.
    fn effective_height(&self) -> f64 {
        if let Some(px) = self.height_lock.locked() {
            return px;
        }
        let current = self.surface.container_height();
        if current > 0.0 {
            current
        } else {
            self.surface.viewport_height() * 0.9
        }
    }

    /// Hand the document to the surrounding environment's default handler.
    pub fn open_external(&self) -> Result<(), ViewerError> {
        self.session()?;
        self.surface.open_external(&self.locator)
    }

    /// Save a copy of the document, suggesting its own file name.
    pub fn save_copy(&self) -> Result<(), ViewerError> {
        self.session()?;
        let name = self
            .locator
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("Untitled");
        self.surface.save_copy(&self.locator, name)
    }

    /// Current zoom formatted for display, e.g. `125%`.
    pub fn zoom_label(&self) -> String {
        format!("{}%", (self.scale * 100.0).round() as i64)
    }

    fn present(&mut self) {
        let Phase::Ready(session) = &self.phase else {
            return;
        };
        let frame = RenderFrame {
            page: session.page,
            scale: self.scale,
            extent: session.intrinsic.scaled(self.scale),
        };
        self.surface.present(frame);
        if let Some(px) = self.height_lock.observe(frame.extent.height) {
            tracing::debug!(px, "container height locked");
            self.surface.lock_height(px);
        }
        let label = self.zoom_label();
        self.surface.set_zoom_label(&label);
        tracing::debug!(scale = self.scale, "presented page");
    }

    fn session(&self) -> Result<&Session, ViewerError> {
        match &self.phase {
            Phase::Ready(session) => Ok(session),
            _ => Err(ViewerError::NotReady),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;
    use proptest::proptest;

    use super::*;

    #[derive(Default)]
    struct FakeSurface {
        width: f64,
        window_height: f64,
        frames: Vec<RenderFrame>,
        locks: Vec<f64>,
        zoom_labels: Vec<String>,
        page_label: String,
        errors: Vec<String>,
        opened: RefCell<Vec<PathBuf>>,
        saved: RefCell<Vec<(PathBuf, String)>>,
    }

    impl HostSurface for FakeSurface {
        fn container_width(&self) -> f64 {
            self.width
        }

        fn container_height(&self) -> f64 {
            self.frames.last().map(|f| f.extent.height).unwrap_or(0.0)
        }

        fn viewport_height(&self) -> f64 {
            self.window_height
        }

        fn present(&mut self, frame: RenderFrame) {
            self.frames.push(frame);
        }

        fn lock_height(&mut self, px: f64) {
            self.locks.push(px);
        }

        fn set_zoom_label(&mut self, label: &str) {
            self.zoom_labels.push(label.to_owned());
        }

        fn set_page_label(&mut self, label: &str) {
            self.page_label = label.to_owned();
        }

        fn show_error(&mut self, message: &str) {
            self.errors.push(message.to_owned());
        }

        fn open_external(&self, target: &Path) -> Result<(), ViewerError> {
            self.opened.borrow_mut().push(target.to_path_buf());
            Ok(())
        }

        fn save_copy(&self, source: &Path, file_name: &str) -> Result<(), ViewerError> {
            self.saved
                .borrow_mut()
                .push((source.to_path_buf(), file_name.to_owned()));
            Ok(())
        }
    }

    fn surface(width: f64, window_height: f64) -> FakeSurface {
        FakeSurface {
            width,
            window_height,
            ..FakeSurface::default()
        }
    }

    fn info(width: f64, height: f64) -> DocumentInfo {
        DocumentInfo {
            page_count: 1,
            first_page: PageViewport::new(width, height),
        }
    }

    fn ready(width: f64, page: PageViewport) -> ViewerController<FakeSurface> {
        let mut controller = ViewerController::new(
            ViewerConfig::default(),
            "/docs/sample.pdf",
            surface(width, 1000.0),
        );
        controller.begin_load().expect("fresh controller accepts a load");
        controller.document_ready(Ok(DocumentInfo {
            page_count: 1,
            first_page: page,
        }));
        controller
    }

    fn letter() -> PageViewport {
        PageViewport::new(600.0, 800.0)
    }

    proptest! {
        #[test]
        fn stored_scale_is_always_clamped(requested in -10.0f64..10.0) {
            let mut controller = ready(500.0, letter());
            controller.set_scale(requested);
            let scale = controller.scale();
            assert!((ViewerConfig::MIN_ZOOM..=ViewerConfig::MAX_ZOOM).contains(&scale));
            assert_eq!(scale, ViewerConfig::default().clamp_scale(requested));
        }
    }

    #[test]
    fn zoom_in_then_out_restores_the_scale() {
        let mut controller = ready(500.0, letter());
        controller.zoom_in();
        assert_eq!(controller.scale(), 1.25);
        controller.zoom_out();
        assert_eq!(controller.scale(), 1.0);
    }

    #[test]
    fn zoom_in_clamps_at_the_upper_bound() {
        let mut controller = ready(500.0, letter());
        assert_eq!(controller.zoom_in(), ScaleOutcome::Rendered(1.25));
        assert_eq!(controller.zoom_label(), "125%");
        for _ in 0..11 {
            controller.zoom_in();
        }
        assert_eq!(controller.scale(), 4.0);
        controller.zoom_in();
        assert_eq!(controller.scale(), 4.0);
        assert_eq!(controller.zoom_label(), "400%");
    }

    #[test]
    fn reset_returns_to_one_hundred_percent() {
        let mut controller = ready(500.0, letter());
        controller.set_scale(3.0);
        controller.reset_zoom();
        assert_eq!(controller.scale(), 1.0);
        assert_eq!(controller.zoom_label(), "100%");
    }

    #[test]
    fn set_scale_is_idempotent_for_the_same_input() {
        let mut controller = ready(500.0, letter());
        controller.set_scale(1.5);
        controller.set_scale(1.5);
        let frames = &controller.surface().frames;
        assert_eq!(frames[frames.len() - 1], frames[frames.len() - 2]);
        let labels = &controller.surface().zoom_labels;
        assert_eq!(labels[labels.len() - 1], labels[labels.len() - 2]);
    }

    #[test]
    fn first_presentation_locks_the_container_height_once() {
        let mut controller = ready(500.0, letter());
        assert_eq!(controller.surface().locks, vec![800.0]);
        assert_eq!(controller.locked_height(), Some(800.0));
        controller.zoom_in();
        controller.zoom_in();
        assert_eq!(controller.surface().locks, vec![800.0]);
        assert_eq!(
            controller.surface().frames.last().map(|f| f.extent.height),
            Some(1200.0)
        );
    }

    #[test]
    fn degenerate_page_height_never_locks() {
        let controller = ready(500.0, PageViewport::new(600.0, 0.0));
        assert_eq!(controller.locked_height(), None);
        assert!(controller.surface().locks.is_empty());
    }

    #[test]
    fn fit_width_fills_the_container_exactly() {
        let mut controller = ready(300.0, letter());
        let request = controller.request_fit(FitMode::Width).expect("ready");
        let outcome = controller
            .complete_fit(request, Ok(letter()))
            .expect("fit applies");
        assert_eq!(outcome, ScaleOutcome::Rendered(0.5));
        assert_eq!(controller.zoom_label(), "50%");
    }

    #[test]
    fn fit_page_uses_the_locked_height() {
        // Initial presentation at 1.0 locks the height at 800.
        let mut controller = ready(500.0, letter());
        let request = controller.request_fit(FitMode::Page).expect("ready");
        let outcome = controller
            .complete_fit(request, Ok(letter()))
            .expect("fit applies");
        let expected = 500.0 / 600.0;
        match outcome {
            ScaleOutcome::Rendered(scale) => assert!((scale - expected).abs() < 1e-12),
            other => panic!("expected a rendered fit, got {other:?}"),
        }
    }

    #[test]
    fn fit_page_falls_back_to_ninety_percent_of_the_display() {
        // A zero-height page keeps the latch open and the container empty,
        // so the fit must reach for the display-area fallback.
        let mut controller = ready(900.0, PageViewport::new(600.0, 0.0));
        let request = controller.request_fit(FitMode::Page).expect("ready");
        let outcome = controller
            .complete_fit(request, Ok(letter()))
            .expect("fit applies");
        // width scale 1.5 vs height scale 900 / 800 = 1.125
        assert_eq!(outcome, ScaleOutcome::Rendered(1.125));
    }

    #[test]
    fn fit_with_a_zero_width_container_leaves_the_scale_alone() {
        let mut controller = ready(0.0, letter());
        let request = controller.request_fit(FitMode::Width).expect("ready");
        let result = controller.complete_fit(request, Ok(letter()));
        assert_eq!(result, Err(ViewerError::Layout { dimension: "width" }));
        assert_eq!(controller.scale(), 1.0);
    }

    #[test]
    fn failed_measurement_abandons_the_fit() {
        let mut controller = ready(300.0, letter());
        let request = controller.request_fit(FitMode::Width).expect("ready");
        let result = controller.complete_fit(
            request,
            Err(ViewerError::Page {
                page: 1,
                reason: "decode failure".into(),
            }),
        );
        assert!(result.is_err());
        assert_eq!(controller.scale(), 1.0);
    }

    #[test]
    fn a_direct_scale_change_supersedes_an_in_flight_fit() {
        let mut controller = ready(300.0, letter());
        let request = controller.request_fit(FitMode::Width).expect("ready");
        controller.set_scale(2.0);
        let outcome = controller
            .complete_fit(request, Ok(letter()))
            .expect("stale results are not errors");
        assert_eq!(outcome, ScaleOutcome::Stale);
        assert_eq!(controller.scale(), 2.0);
    }

    #[test]
    fn a_newer_fit_supersedes_an_older_one() {
        let mut controller = ready(300.0, letter());
        let first = controller.request_fit(FitMode::Width).expect("ready");
        let second = controller.request_fit(FitMode::Page).expect("ready");
        assert_eq!(
            controller.complete_fit(first, Ok(letter())),
            Ok(ScaleOutcome::Stale)
        );
        let outcome = controller
            .complete_fit(second, Ok(letter()))
            .expect("latest fit applies");
        assert!(matches!(outcome, ScaleOutcome::Rendered(_)));
    }

    #[test]
    fn a_scale_stored_before_load_is_presented_on_load() {
        let mut controller = ViewerController::new(
            ViewerConfig::default(),
            "/docs/sample.pdf",
            surface(500.0, 1000.0),
        );
        assert_eq!(controller.set_scale(2.0), ScaleOutcome::Stored(2.0));
        controller.begin_load().expect("fresh controller accepts a load");
        controller.document_ready(Ok(info(600.0, 800.0)));
        assert_eq!(
            controller.surface().frames.first().map(|f| f.scale),
            Some(2.0)
        );
        // The lock measures the first presentation, not the default scale.
        assert_eq!(controller.locked_height(), Some(1600.0));
    }

    #[test]
    fn wheel_notch_down_zooms_out_by_an_eighth() {
        let mut controller = ready(500.0, letter());
        controller.wheel_zoom(-1.0);
        assert_eq!(controller.scale(), 0.875);
    }

    #[test]
    fn empty_wheel_gestures_are_ignored() {
        let mut controller = ready(500.0, letter());
        assert_eq!(controller.wheel_zoom(0.0), ScaleOutcome::Ignored);
        assert_eq!(controller.wheel_zoom(f64::NAN), ScaleOutcome::Ignored);
        assert_eq!(controller.scale(), 1.0);
    }

    #[test]
    fn intents_before_load_are_rejected_or_stored() {
        let mut controller = ViewerController::new(
            ViewerConfig::default(),
            "/docs/sample.pdf",
            surface(500.0, 1000.0),
        );
        assert_eq!(
            controller.request_fit(FitMode::Width),
            Err(ViewerError::NotReady)
        );
        assert_eq!(controller.open_external(), Err(ViewerError::NotReady));
        assert_eq!(controller.save_copy(), Err(ViewerError::NotReady));
        assert_eq!(controller.set_scale(1.5), ScaleOutcome::Stored(1.5));
        assert!(controller.surface().frames.is_empty());
    }

    #[test]
    fn load_failure_surfaces_a_visible_error_and_allows_retry() {
        let mut controller = ViewerController::new(
            ViewerConfig::default(),
            "/docs/missing.pdf",
            surface(500.0, 1000.0),
        );
        controller.begin_load().expect("fresh controller accepts a load");
        controller.document_ready(Err(ViewerError::Load {
            locator: PathBuf::from("/docs/missing.pdf"),
            reason: "no such file".into(),
        }));
        assert!(!controller.is_ready());
        assert!(controller.load_failure().is_some());
        assert_eq!(controller.surface().errors.len(), 1);
        controller.begin_load().expect("failed loads may retry");
        controller.document_ready(Ok(info(600.0, 800.0)));
        assert!(controller.is_ready());
    }

    #[test]
    fn open_and_save_delegate_without_touching_state() {
        let mut controller = ready(500.0, letter());
        let frames_before = controller.surface().frames.len();
        controller.open_external().expect("surface accepts");
        controller.save_copy().expect("surface accepts");
        assert_eq!(
            controller.surface().opened.borrow().as_slice(),
            &[PathBuf::from("/docs/sample.pdf")]
        );
        assert_eq!(
            controller.surface().saved.borrow().as_slice(),
            &[(PathBuf::from("/docs/sample.pdf"), "sample.pdf".to_owned())]
        );
        assert_eq!(controller.scale(), 1.0);
        assert_eq!(controller.surface().frames.len(), frames_before);
    }

    #[test]
    fn the_page_label_reports_the_document_page_count() {
        let mut controller = ViewerController::new(
            ViewerConfig::default(),
            "/docs/sample.pdf",
            surface(500.0, 1000.0),
        );
        controller.begin_load().expect("fresh controller accepts a load");
        controller.document_ready(Ok(DocumentInfo {
            page_count: 3,
            first_page: letter(),
        }));
        assert_eq!(controller.surface().page_label, "Page 1 of 3");
        assert_eq!(controller.page_count(), Some(3));
    }
}
