use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use iced::keyboard::{self, Modifiers};
use iced::widget::{
    button, column, container, horizontal_space, image as img, row, scrollable, text,
};
use iced::{event, mouse, window, Element, Length, Size, Subscription, Task, Theme};

use paperview_core::{
    load_session, FitMode, PageViewport, RenderEngine, RenderFrame, ViewerConfig,
    ViewerController, ViewerError,
};

mod document;
mod panel;
mod renderer;

use document::LoadedDocument;
use panel::ViewerPanel;
use renderer::PdfiumEngine;

const WINDOW_SIZE: Size = Size {
    width: 1100.0,
    height: 900.0,
};

/// Desktop document viewer with a zoom toolbar.
#[derive(Debug, Parser)]
#[command(name = "paperview", about = "View a PDF with zoom and fit controls")]
struct Cli {
    /// Document to view.
    file: PathBuf,

    /// Smallest zoom multiplier.
    #[arg(long, default_value_t = ViewerConfig::MIN_ZOOM)]
    min_zoom: f64,

    /// Largest zoom multiplier.
    #[arg(long, default_value_t = ViewerConfig::MAX_ZOOM)]
    max_zoom: f64,

    /// Zoom change per toolbar click.
    #[arg(long, default_value_t = ViewerConfig::ZOOM_STEP)]
    zoom_step: f64,

    /// Initial zoom multiplier.
    #[arg(long, default_value_t = ViewerConfig::DEFAULT_SCALE)]
    scale: f64,
}

impl Cli {
    fn config(&self) -> ViewerConfig {
        ViewerConfig {
            default_scale: self.scale,
            zoom_step: self.zoom_step,
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            ..ViewerConfig::default()
        }
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter("paperview=debug,info")
        .init();

    let cli = Cli::parse();

    iced::application("Paperview", App::update, App::view)
        .subscription(App::subscription)
        .theme(|_| Theme::Dark)
        .window_size(WINDOW_SIZE)
        .run_with(move || App::new(cli))
}

#[derive(Debug, Clone)]
enum Message {
    Loaded(Result<(Arc<LoadedDocument>, paperview_core::DocumentInfo), ViewerError>),
    ZoomIn,
    ZoomOut,
    ResetZoom,
    FitWidth,
    FitPage,
    FitMeasured(paperview_core::FitRequest, Result<PageViewport, ViewerError>),
    OpenExternal,
    Download,
    WheelScrolled(mouse::ScrollDelta),
    ModifiersChanged(Modifiers),
    WindowResized(Size),
}

struct App {
    controller: ViewerController<ViewerPanel>,
    engine: PdfiumEngine,
    document: Option<Arc<LoadedDocument>>,
    rendered: Option<img::Handle>,
    rendered_for: Option<RenderFrame>,
    modifiers: Modifiers,
}

impl App {
    fn new(cli: Cli) -> (Self, Task<Message>) {
        let panel = ViewerPanel::new(
            f64::from(WINDOW_SIZE.width),
            f64::from(WINDOW_SIZE.height),
        );
        let mut controller = ViewerController::new(cli.config(), cli.file, panel);

        let load = match controller.begin_load() {
            Ok(()) => {
                let locator = controller.locator().to_path_buf();
                Task::perform(
                    async move {
                        let (document, info) = load_session(&PdfiumEngine, &locator).await?;
                        Ok((Arc::new(LoadedDocument::new(document)), info))
                    },
                    Message::Loaded,
                )
            }
            Err(error) => {
                tracing::error!(%error, "could not start the document load");
                Task::none()
            }
        };

        (
            Self {
                controller,
                engine: PdfiumEngine,
                document: None,
                rendered: None,
                rendered_for: None,
                modifiers: Modifiers::default(),
            },
            load,
        )
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Loaded(Ok((document, info))) => {
                self.document = Some(document);
                self.controller.document_ready(Ok(info));
            }
            Message::Loaded(Err(error)) => {
                self.controller.document_ready(Err(error));
            }
            Message::ZoomIn => {
                self.controller.zoom_in();
            }
            Message::ZoomOut => {
                self.controller.zoom_out();
            }
            Message::ResetZoom => {
                self.controller.reset_zoom();
            }
            Message::FitWidth => return self.request_fit(FitMode::Width),
            Message::FitPage => return self.request_fit(FitMode::Page),
            Message::FitMeasured(request, viewport) => {
                match self.controller.complete_fit(request, viewport) {
                    Ok(outcome) => tracing::debug!(?outcome, "fit completed"),
                    Err(error) => tracing::warn!(%error, "fit abandoned"),
                }
            }
            Message::OpenExternal => {
                if let Err(error) = self.controller.open_external() {
                    tracing::warn!(%error, "open failed");
                }
            }
            Message::Download => {
                if let Err(error) = self.controller.save_copy() {
                    tracing::warn!(%error, "save failed");
                }
            }
            Message::WheelScrolled(delta) => {
                if self.modifiers.command() {
                    self.controller.wheel_zoom(f64::from(scroll_steps(delta)));
                }
            }
            Message::ModifiersChanged(modifiers) => self.modifiers = modifiers,
            Message::WindowResized(size) => {
                self.controller
                    .surface_mut()
                    .set_window_size(f64::from(size.width), f64::from(size.height));
            }
        }
        self.refresh_rendered();
        Task::none()
    }

    /// Issue a sequenced fit and measure the page on a task; a completion
    /// that lost the race is discarded by the controller.
    fn request_fit(&mut self, mode: FitMode) -> Task<Message> {
        let request = match self.controller.request_fit(mode) {
            Ok(request) => request,
            Err(error) => {
                tracing::debug!(%error, "fit ignored");
                return Task::none();
            }
        };
        let Some(document) = self.document.clone() else {
            return Task::none();
        };
        let engine = self.engine;
        let page = request.page();
        Task::perform(
            async move { engine.page_viewport(document.document(), page).await },
            move |viewport| Message::FitMeasured(request, viewport),
        )
    }

    /// Keep the rasterized page in sync with the presented frame.
    fn refresh_rendered(&mut self) {
        let frame = self.controller.surface().frame();
        if frame == self.rendered_for {
            return;
        }
        self.rendered = match (&self.document, frame) {
            (Some(document), Some(frame)) => document.rendered_page(frame.page, frame.scale),
            _ => None,
        };
        self.rendered_for = frame;
    }

    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status, _window| match event {
            event::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                Some(Message::WheelScrolled(delta))
            }
            event::Event::Keyboard(keyboard::Event::ModifiersChanged(modifiers)) => {
                Some(Message::ModifiersChanged(modifiers))
            }
            event::Event::Window(window::Event::Resized(size)) => {
                Some(Message::WindowResized(size))
            }
            _ => None,
        })
    }

    fn view(&self) -> Element<Message> {
        let panel = self.controller.surface();

        if let Some(message) = panel.error() {
            return container(
                column![
                    text("Could not display the document").size(24),
                    text(message).size(14),
                ]
                .spacing(12)
                .align_x(iced::Alignment::Center),
            )
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into();
        }

        let ready = self.controller.is_ready();
        let toolbar = row![
            button("−").on_press_maybe(ready.then_some(Message::ZoomOut)),
            button(text(panel.zoom_label()).size(14))
                .style(button::text)
                .on_press_maybe(ready.then_some(Message::ResetZoom)),
            button("+").on_press_maybe(ready.then_some(Message::ZoomIn)),
            button("Fit Width").on_press_maybe(ready.then_some(Message::FitWidth)),
            button("Fit Page").on_press_maybe(ready.then_some(Message::FitPage)),
            horizontal_space(),
            text(panel.page_label()).size(14),
            horizontal_space(),
            button("Open").on_press_maybe(ready.then_some(Message::OpenExternal)),
            button("Download").on_press_maybe(ready.then_some(Message::Download)),
        ]
        .spacing(10)
        .padding(10);

        let page_view: Element<Message> = match &self.rendered {
            Some(handle) => scrollable(
                container(img(handle.clone()).width(Length::Shrink)).center_x(Length::Fill),
            )
            .direction(scrollable::Direction::Both {
                vertical: scrollable::Scrollbar::new(),
                horizontal: scrollable::Scrollbar::new(),
            })
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
            None => container(text(if ready {
                "Rendering page..."
            } else {
                "Loading document..."
            }))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into(),
        };

        // The content box keeps the height the controller locked on first
        // render; the page scrolls inside it from then on.
        let content = match panel.locked_height() {
            Some(px) => container(page_view)
                .width(Length::Fill)
                .height(Length::Fixed(px as f32)),
            None => container(page_view).width(Length::Fill).height(Length::Fill),
        };

        column![toolbar, content].spacing(10).padding(10).into()
    }
}

/// Normalizes wheel units (lines vs. pixels) into notch values so zooming
/// feels consistent across devices.
fn scroll_steps(delta: mouse::ScrollDelta) -> f32 {
    match delta {
        mouse::ScrollDelta::Lines { y, .. } => y,
        mouse::ScrollDelta::Pixels { y, .. } => y / 120.0,
    }
}
