//! vkengine demo: a few textured cubes and a fly camera.
//!
//! Controls: WASD/QE move (Shift for speed), arrow keys or right-mouse drag
//! turn, R resets the camera, Escape quits.

mod demo;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use vkengine_core::{EngineConfig, EngineContext};
use vkengine_platform::{InputState, KeyCode, Window};
use vkengine_renderer::{FrameOutcome, Renderer};

use crate::demo::DemoScene;

const CONFIG_ENV: &str = "VKENGINE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "vkengine.toml";

struct App {
    config: EngineConfig,
    context: EngineContext,
    input: InputState,
    scene: Option<DemoScene>,
    // Dropped before the window it renders to.
    renderer: Option<Renderer>,
    window: Option<Window>,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: EngineConfig) -> Self {
        Self {
            config,
            context: EngineContext::new(),
            input: InputState::new(),
            scene: None,
            renderer: None,
            window: None,
            fatal: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window =
            Window::new(event_loop, &self.config.window).context("Failed to create window")?;
        let renderer =
            Renderer::new(&window, &self.config.renderer).context("Failed to create renderer")?;

        let aspect = renderer
            .swapchain_aspect_ratio()
            .unwrap_or(self.config.window.width as f32 / self.config.window.height.max(1) as f32);
        self.scene = Some(DemoScene::new(
            &self.config,
            aspect,
            &mut self.context.random,
        ));
        self.renderer = Some(renderer);
        self.window = Some(window);

        info!("Initialization complete, entering main loop");
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let delta_secs = self.context.tick();

        let (Some(scene), Some(renderer), Some(window)) =
            (self.scene.as_mut(), self.renderer.as_mut(), self.window.as_ref())
        else {
            return Ok(());
        };

        scene.update(&self.input, delta_secs);
        self.input.end_frame();

        if window.is_minimized() {
            return Ok(());
        }

        let outcome = renderer
            .draw_frame(&scene.camera, &scene.objects)
            .context("Failed to draw frame")?;
        if matches!(
            outcome,
            FrameOutcome::PresentedAndRecreated | FrameOutcome::SwapchainRecreated
        ) && let Some(aspect) = renderer.swapchain_aspect_ratio()
        {
            scene.camera.set_aspect(aspect);
        }
        Ok(())
    }

    /// Stops the event loop; `run` reports the error.
    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        self.fatal = Some(e);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none()
            && let Err(e) = self.init(event_loop)
        {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                info!("Window resized to {}x{}", size.width, size.height);
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.set_framebuffer_resized(true);
                }
            }
            WindowEvent::RedrawRequested => {
                if self.input.is_key_just_pressed(KeyCode::Escape) {
                    info!("Escape pressed, shutting down");
                    event_loop.exit();
                    return;
                }
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = self.renderer.take() {
            if let Err(e) = renderer.wait_idle() {
                warn!("Device did not go idle on shutdown: {}", e);
            }
        }
        self.window = None;
    }
}

fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn run() -> Result<()> {
    let path = config_path();
    let config = EngineConfig::load_or_default(&path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    info!(
        "Starting vkengine ({}x{}, {} objects)",
        config.window.width, config.window.height, config.scene.spawn_count
    );

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app).context("Event loop failed")?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    vkengine_core::init_logging();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
