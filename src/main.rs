//! Whisperglass - a thirty-second horror vignette
//!
//! Something in the mirror is staring back. Touch the glass and it has
//! thirty seconds to learn your face.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use whisperglass::audio::DeviceFactory;
use whisperglass::cli::Args;
use whisperglass::params::{CueSheet, RenderConfig};
use whisperglass::playback::PlaybackDriver;
use whisperglass::recording;
use whisperglass::rendering::RenderSystem;
use whisperglass::timeline::CAPTION;
use whisperglass::visuals::{mirror_uniforms, window_title};

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Playback
    driver: PlaybackDriver<DeviceFactory>,
    autostart: bool,

    // Configuration
    render_config: RenderConfig,

    // Time tracking
    start_time: Instant,
    title: String,
}

impl App {
    fn new(args: &Args) -> Self {
        let factory = DeviceFactory {
            cues: CueSheet::default(),
            seed: args.seed,
        };

        Self {
            window: None,
            render_system: None,
            driver: PlaybackDriver::new(factory),
            autostart: args.autostart,
            render_config: RenderConfig::default(),
            start_time: Instant::now(),
            title: String::new(),
        }
    }

    /// Start or replay, only while the control is offered
    fn activate(&mut self) {
        if self.driver.button_label().is_some() {
            pollster::block_on(self.driver.start());
        }
    }

    /// Render a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        if self.driver.wants_frames() {
            self.driver.frame(Instant::now());
        }

        let state = *self.driver.state();
        let title = window_title(
            &self.render_config.title,
            &state,
            self.driver.button_label(),
        );
        if title != self.title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.title = title;
        }

        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };

        let time_s = self.start_time.elapsed().as_secs_f32();
        render_system.update_uniforms(&mirror_uniforms(
            &state,
            time_s,
            self.render_config.phase_blend_s,
        ));

        match render_system.render() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                render_system.reconfigure()
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => error!(error = ?e, "Render error"),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.render_config.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!(error = %e, "Failed to create window");
                event_loop.exit();
                return;
            }
        };

        let render_system = match pollster::block_on(RenderSystem::new(Arc::clone(&window))) {
            Ok(render_system) => render_system,
            Err(e) => {
                error!(error = %e, "Failed to initialise rendering");
                event_loop.exit();
                return;
            }
        };

        info!("{CAPTION}");
        info!("Click, Space or Enter to begin. Esc to quit.");

        self.window = Some(window);
        self.render_system = Some(render_system);

        if self.autostart {
            self.activate();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Space | KeyCode::Enter | KeyCode::NumpadEnter => self.activate(),
                _ => {}
            },
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.activate(),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.driver.teardown();
    }
}

fn render_offline(args: &Args) -> ExitCode {
    let Some(config) = args.create_recording_config() else {
        return ExitCode::FAILURE;
    };

    info!(path = %config.output_path.display(), sample_rate = config.sample_rate_hz, "Rendering offline");
    match recording::record(&config, CueSheet::default()) {
        Ok(summary) => {
            info!(
                seconds = summary.duration_secs,
                peak = summary.peak,
                "Recording complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Recording failed");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.render_wav.is_some() {
        return render_offline(&args);
    }

    info!("Whisperglass - look closer");

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!(error = %e, "Failed to create event loop");
            return ExitCode::FAILURE;
        }
    };

    let mut app = App::new(&args);
    if let Err(e) = event_loop.run_app(&mut app) {
        error!(error = %e, "Event loop error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
