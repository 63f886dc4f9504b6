use crate::cli::Cli;
use crate::pointer::PointerTracker;
use anyhow::{Context, Result, anyhow};
use pixels::{Pixels, SurfaceTexture};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trajex_core::Presenter;
use trajex_experiment::{Session, SessionStatus};
use trajex_render::SkiaPresenter;
use trajex_timing::{HighPrecisionTimer, Timer};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Icon, Window, WindowId},
};

pub struct App {
    session: Session,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    presenter: Option<SkiaPresenter>,
    pointer: PointerTracker,
    timer: HighPrecisionTimer,
    font: Option<PathBuf>,
    icon: Option<Icon>,
    fullscreen: bool,
    should_exit: bool,
    failure: Option<anyhow::Error>,
}

impl App {
    pub fn new(session: Session, cli: &Cli) -> Result<Self> {
        let icon = cli.icon.as_deref().map(load_icon).transpose()?;
        Ok(Self {
            session,
            window: None,
            pixels: None,
            presenter: None,
            pointer: PointerTracker::new(0, 0),
            timer: HighPrecisionTimer::new(),
            font: cli.font.clone(),
            icon,
            fullscreen: !cli.windowed,
            should_exit: false,
            failure: None,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.run_app(&mut self)?;
        let stats = self.timer.frame_stats();
        tracing::info!(
            trials = self.session.results().len(),
            frames = stats.frames,
            avg_frame_ms = stats.average_frame_time_ns / 1e6,
            "experiment closed"
        );
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("no monitor available"))?;

        let mut attributes = Window::default_attributes()
            .with_title("Trajex")
            .with_resizable(!self.fullscreen)
            .with_window_icon(self.icon.clone());
        if self.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor.clone()))));
        }

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        tracing::info!(
            width = size.width,
            height = size.height,
            scale_factor = window.scale_factor(),
            refresh_hz = monitor.refresh_rate_millihertz().map(|mhz| mhz as f64 / 1000.0),
            "display ready"
        );

        let surface = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface)?);

        let mut presenter = SkiaPresenter::new(size.width, size.height)?;
        if let Some(font) = &self.font {
            presenter = presenter.with_font_file(font)?;
        }
        self.presenter = Some(presenter);
        self.pointer.resize(size.width, size.height);

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let frame_start = self.timer.now();
        let status = self
            .session
            .frame(self.pointer.state(), self.timer.now_secs())
            .context("running trial frame")?;

        let (Some(presenter), Some(pixels)) = (self.presenter.as_mut(), self.pixels.as_mut()) else {
            return Ok(());
        };
        presenter.present(self.session.scene())?;
        let frame = pixels.frame_mut();
        if frame.len() == presenter.frame().len() {
            frame.copy_from_slice(presenter.frame());
        }
        pixels.render()?;
        self.timer.record_frame(self.timer.elapsed(frame_start));

        if status == SessionStatus::Finished {
            tracing::info!(trials = self.session.results().len(), "all trials done");
            self.should_exit = true;
        }
        Ok(())
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }
        if let Some(pixels) = &mut self.pixels {
            pixels.resize_surface(size.width, size.height)?;
            pixels.resize_buffer(size.width, size.height)?;
        }
        if let Some(presenter) = &mut self.presenter {
            presenter.resize(size.width, size.height)?;
        }
        self.pointer.resize(size.width, size.height);
        tracing::debug!(width = size.width, height = size.height, "display resized");
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.failure = Some(err);
        self.cleanup_and_exit(event_loop);
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        self.should_exit = true;
        event_loop.exit();
    }
}

fn load_icon(path: &Path) -> Result<Icon> {
    let image = image::open(path)
        .with_context(|| format!("reading icon {}", path.display()))?
        .into_rgba8();
    let (width, height) = image.dimensions();
    Ok(Icon::from_rgba(image.into_raw(), width, height)?)
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                self.fail(event_loop, e.context("creating window and surface"));
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let result = match event {
            WindowEvent::CloseRequested => {
                self.cleanup_and_exit(event_loop);
                Ok(())
            }
            WindowEvent::RedrawRequested => {
                let result = self.redraw();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
                result
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed() && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                tracing::info!("aborted by operator");
                self.cleanup_and_exit(event_loop);
                Ok(())
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer.cursor_moved(position);
                Ok(())
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.pointer.mouse_input(button, state);
                Ok(())
            }
            WindowEvent::Touch(touch) => {
                self.pointer.touch(&touch);
                Ok(())
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => match &self.window {
                Some(window) => {
                    let size = window.inner_size();
                    self.handle_resize(size)
                }
                None => Ok(()),
            },
            _ => Ok(()),
        };
        if let Err(e) = result {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            self.cleanup_and_exit(event_loop);
        }
    }
}
