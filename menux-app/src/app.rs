use crate::controller::{Command, Controller};
use anyhow::{Context, Result};
use menux_core::{DisplayMetrics, MenuKind, Point};
use menux_experiment::{ExperimentConfig, ItemPoolSource, PointerEvent, PoolFile};
use menux_render::{Scene, SkiaRenderer, load_font};
use menux_timing::HighPrecisionTimer;
use pixels::{Pixels, SurfaceTexture};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    controller: Controller<HighPrecisionTimer>,
    cursor: Point,
    button_down: bool,
    should_exit: bool,
}

impl App {
    pub fn new(config: ExperimentConfig, participant: Option<u32>, test_mode: bool) -> Result<Self> {
        let pools = PoolFile::new(&config.pool_path)
            .load()
            .with_context(|| format!("loading item pools from {}", config.pool_path.display()))?;
        pools.validate()?;

        // real metrics arrive with the window
        let controller = Controller::new(
            config,
            pools,
            participant,
            test_mode,
            DisplayMetrics::new(1280, 720),
            HighPrecisionTimer::new(),
        )?;

        Ok(Self {
            window: None,
            pixels: None,
            renderer: None,
            controller,
            cursor: Point::ZERO,
            button_down: false,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            os = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            "press and drag to open a menu; N next participant, Delete erase data, Esc exit"
        );
        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .context("no monitor available")?;

        let attributes = Window::default_attributes()
            .with_title("Menux")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(monitor.clone()))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        info!(
            width = size.width,
            height = size.height,
            scale = window.scale_factor(),
            refresh_hz = monitor.refresh_rate_millihertz().map(|mhz| mhz as f64 / 1000.0),
            "display"
        );

        let surface = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface)?);

        let font = load_font(self.controller.font_path());
        self.renderer = Some(SkiaRenderer::new(size.width, size.height, font)?);
        self.controller
            .resize(DisplayMetrics::new(size.width, size.height));

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };

        let prompt = self.controller.prompt();
        let request = self.controller.render_request();
        let banner = self.controller.banner();
        let scene = Scene {
            prompt: Some(&prompt),
            progress: self.controller.progress(),
            menu: request.as_ref(),
            banner: (!banner.is_empty()).then_some(banner),
        };

        let stats = renderer.render_frame(&scene, pixels.frame_mut(), self.controller.timer())?;
        pixels.render()?;
        debug!(
            clear_ms = stats.clear.as_secs_f64() * 1e3,
            draw_ms = stats.draw.as_secs_f64() * 1e3,
            copy_ms = stats.copy.as_secs_f64() * 1e3,
            total_ms = stats.total.as_secs_f64() * 1e3,
            dirty = stats.dirty_count,
            "frame"
        );
        Ok(())
    }

    fn pointer(&mut self, event: PointerEvent) {
        if self.controller.pointer(event) {
            self.request_redraw();
        }
    }

    fn command(&mut self, command: Command) {
        if let Err(e) = self.controller.command(command) {
            error!(error = %e, ?command, "command failed");
        }
        self.button_down = false;
        self.request_redraw();
    }

    fn handle_key(&mut self, key: PhysicalKey, event_loop: &ActiveEventLoop) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::Escape => self.cleanup_and_exit(event_loop),
            KeyCode::KeyN => self.command(Command::NextSession),
            KeyCode::Delete => self.command(Command::EraseData),
            KeyCode::KeyT => self.command(Command::TestMode),
            KeyCode::Digit1 => self.command(Command::Shape(MenuKind::Linear)),
            KeyCode::Digit2 => self.command(Command::Shape(MenuKind::Radial)),
            KeyCode::Digit3 => self.command(Command::Shape(MenuKind::Grid)),
            _ => {}
        }
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(size.width, size.height) {
                warn!(error = %e, "failed to resize surface");
            }
            if let Err(e) = pixels.resize_buffer(size.width, size.height) {
                warn!(error = %e, "failed to resize buffer");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(size.width, size.height) {
                warn!(error = %e, "failed to resize canvas");
            }
        }
        self.controller
            .resize(DisplayMetrics::new(size.width, size.height));
        debug!(width = size.width, height = size.height, "resized");
        self.request_redraw();
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(renderer) = &self.renderer {
            for (stage, stats) in renderer.timing_report() {
                debug!(
                    stage,
                    avg_ms = stats.average_ns / 1e6,
                    jitter_ms = stats.jitter_ns / 1e6,
                    max_ms = stats.max_ns / 1e6,
                    "frame timing"
                );
            }
        }
        info!(session = %self.controller.session(), "exiting");
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!(error = %e, "failed to create window and surface");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    error!(error = %e, "render failed");
                    event_loop.exit();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                self.handle_key(event.physical_key, event_loop);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Point::new(position.x as f32, position.y as f32);
                if self.button_down {
                    self.pointer(PointerEvent::Move(self.cursor));
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    self.button_down = true;
                    self.pointer(PointerEvent::Press(self.cursor));
                }
                ElementState::Released if self.button_down => {
                    self.button_down = false;
                    self.pointer(PointerEvent::Release(self.cursor));
                }
                ElementState::Released => {}
            },
            WindowEvent::Touch(touch) => {
                let at = Point::new(touch.location.x as f32, touch.location.y as f32);
                self.cursor = at;
                match touch.phase {
                    TouchPhase::Started => {
                        self.button_down = true;
                        self.pointer(PointerEvent::Press(at));
                    }
                    TouchPhase::Moved => self.pointer(PointerEvent::Move(at)),
                    TouchPhase::Ended => {
                        self.button_down = false;
                        self.pointer(PointerEvent::Release(at));
                    }
                    TouchPhase::Cancelled => {
                        self.button_down = false;
                        self.pointer(PointerEvent::Reset);
                    }
                }
            }
            WindowEvent::Focused(false) if self.button_down => {
                self.button_down = false;
                self.pointer(PointerEvent::Reset);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    self.handle_resize(size);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}
