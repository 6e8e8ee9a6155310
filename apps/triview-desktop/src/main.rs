use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use triview_assets::ShaderSources;
use triview_common::{DemoConfig, DemoKind};
use triview_input::{InputSource, Key};
use triview_render::{LoopState, RenderLoop};
use triview_render_wgpu::WgpuSurface;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(name = "triview-desktop", about = "Triangle demos in a window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Demo to run: static, spin, pair or flythrough
    #[arg(short, long)]
    demo: Option<DemoKind>,

    /// YAML or JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Vertex shader path
    #[arg(long)]
    vertex_shader: Option<PathBuf>,

    /// Fragment shader path
    #[arg(long)]
    fragment_shader: Option<PathBuf>,

    /// Window width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window height in pixels
    #[arg(long)]
    height: Option<u32>,
}

impl Cli {
    /// Config file (or per-demo defaults) with command-line overrides applied.
    fn demo_config(&self) -> Result<DemoConfig> {
        let mut config = match &self.config {
            Some(path) => DemoConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => DemoConfig::default(),
        };
        if let Some(demo) = self.demo {
            config.demo = demo;
        }
        if let Some(path) = &self.vertex_shader {
            config.vertex_shader = path.clone();
        }
        if let Some(path) = &self.fragment_shader {
            config.fragment_shader = path.clone();
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        config.validate()?;
        Ok(config)
    }
}

fn key_for(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::Escape => Some(Key::Escape),
        _ => None,
    }
}

/// Cursor position as the render loop sees it.
///
/// Starts out following absolute `CursorMoved` positions. Once a cursor warp
/// fails (Wayland, some remote desktops) it switches to accumulating raw
/// mouse-motion deltas from the last warp target instead, so re-centering
/// keeps working without the real cursor moving.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CursorTracker {
    position: (f64, f64),
    relative: bool,
}

impl CursorTracker {
    fn new(position: (f64, f64)) -> Self {
        Self {
            position,
            relative: false,
        }
    }

    fn moved_to(&mut self, x: f64, y: f64) {
        if !self.relative {
            self.position = (x, y);
        }
    }

    fn moved_by(&mut self, dx: f64, dy: f64) {
        if self.relative {
            self.position.0 += dx;
            self.position.1 += dy;
        }
    }

    /// Record a warp to `(x, y)`. Returns true when this failure switched
    /// the tracker to relative mode.
    fn warped(&mut self, x: f64, y: f64, succeeded: bool) -> bool {
        let switched = !succeeded && !self.relative;
        if switched {
            self.relative = true;
        }
        self.position = (x, y);
        switched
    }
}

/// Window-backed input: key and cursor state fed from winit events.
struct WindowInput {
    window: Arc<Window>,
    held: HashSet<Key>,
    cursor: CursorTracker,
    started: Instant,
    close_requested: bool,
}

impl WindowInput {
    fn new(window: Arc<Window>, cursor: (f64, f64)) -> Self {
        Self {
            window,
            held: HashSet::new(),
            cursor: CursorTracker::new(cursor),
            started: Instant::now(),
            close_requested: false,
        }
    }

    fn handle_key(&mut self, code: KeyCode, pressed: bool) {
        let Some(key) = key_for(code) else {
            return;
        };
        if pressed {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
    }
}

impl InputSource for WindowInput {
    fn is_key_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    fn cursor_position(&self) -> (f64, f64) {
        self.cursor.position
    }

    fn set_cursor_position(&mut self, x: f64, y: f64) {
        let result = if self.cursor.relative {
            Ok(())
        } else {
            self.window.set_cursor_position(PhysicalPosition::new(x, y))
        };
        let failed = result.as_ref().err().map(ToString::to_string);
        if self.cursor.warped(x, y, failed.is_none()) {
            tracing::warn!(
                "cursor warp unsupported ({}); using raw mouse motion",
                failed.unwrap_or_default()
            );
            if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::Locked) {
                tracing::debug!("cursor lock unavailable: {e}");
            }
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn close_requested(&self) -> bool {
        self.close_requested
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }
}

/// Everything that only exists once the window is up.
struct Gpu {
    surface: WgpuSurface,
    input: WindowInput,
}

struct DemoApp {
    shaders: ShaderSources,
    render_loop: RenderLoop,
    gpu: Option<Gpu>,
    error: Option<anyhow::Error>,
}

impl DemoApp {
    fn new(config: DemoConfig, shaders: ShaderSources) -> Self {
        Self {
            shaders,
            render_loop: RenderLoop::new(config),
            gpu: None,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<Gpu> {
        let config = self.render_loop.config();
        let attrs = Window::default_attributes()
            .with_title(config.title())
            .with_inner_size(PhysicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(attrs).context("creating window")?);

        let flythrough = config.demo == DemoKind::Flythrough;
        let center = (config.width as f64 / 2.0, config.height as f64 / 2.0);
        let size = window.inner_size();

        let mut surface = WgpuSurface::new(window.clone(), size.width, size.height)?;
        let mut input = WindowInput::new(window.clone(), center);
        if flythrough {
            window.set_cursor_visible(false);
            input.set_cursor_position(center.0, center.1);
        }

        self.render_loop.init(&mut surface, &self.shaders)?;
        Ok(Gpu { surface, input })
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &mut self.gpu {
            if self.render_loop.state() != LoopState::Terminated {
                if let Err(e) = self.render_loop.shutdown(&mut gpu.surface) {
                    tracing::error!("shutdown failed: {e}");
                }
            }
        }
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.error = Some(error);
        self.stop(event_loop);
    }
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() || self.error.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = &mut self.gpu else {
            if matches!(event, WindowEvent::CloseRequested) {
                event_loop.exit();
            }
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                gpu.input.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                gpu.surface.resize(size.width, size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                gpu.input.handle_key(code, state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                gpu.input.cursor.moved_to(position.x, position.y);
            }
            WindowEvent::RedrawRequested => {
                match self.render_loop.frame(&mut gpu.surface, &mut gpu.input) {
                    Ok(LoopState::Running) => {}
                    Ok(_) => self.stop(event_loop),
                    Err(e) => self.fail(event_loop, e.into()),
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let (Some(gpu), DeviceEvent::MouseMotion { delta }) = (&mut self.gpu, event) {
            gpu.input.cursor.moved_by(delta.0, delta.1);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.input.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &mut self.gpu {
            if self.render_loop.state() != LoopState::Terminated {
                if let Err(e) = self.render_loop.shutdown(&mut gpu.surface) {
                    tracing::error!("shutdown failed: {e}");
                }
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = cli.demo_config()?;
    tracing::info!(demo = %config.demo, "triview-desktop starting");

    let shaders = match ShaderSources::load(&config.vertex_shader, &config.fragment_shader) {
        Ok(shaders) => shaders,
        Err(e) => {
            tracing::error!("{e}");
            return Err(e.into());
        }
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DemoApp::new(config, shaders);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
