use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{error, info, warn};
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};

use super::host::{GameHost, HostError, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use super::input::InputCollector;
use super::metrics::{MetricsHandle, DEFAULT_METRICS_INTERVAL};
use super::rendering::{Display, DisplayBackend, DisplayError, Renderer};
use super::scene::Scene;
use super::scheduler::DEFAULT_MAX_CATCH_UP_TICKS;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    /// Size of the window before the first scene declares its own.
    pub default_width: u32,
    pub default_height: u32,
    pub resizable: bool,
    pub max_catch_up_ticks: u32,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Stagehand".to_string(),
            default_width: DEFAULT_WIDTH,
            default_height: DEFAULT_HEIGHT,
            resizable: true,
            max_catch_up_ticks: DEFAULT_MAX_CATCH_UP_TICKS,
            metrics_log_interval: DEFAULT_METRICS_INTERVAL,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Shows the hidden window at the requested size and draws into it with a
/// [`Renderer`].
struct WinitBackend {
    window: Arc<Window>,
}

impl DisplayBackend for WinitBackend {
    fn open(&mut self, width: u32, height: u32) -> Result<Box<dyn Display>, DisplayError> {
        let applied = self
            .window
            .request_inner_size(LogicalSize::new(width as f64, height as f64));
        let size = surface_size(applied, self.window.inner_size());
        self.window.set_visible(true);
        let renderer = Renderer::new(Arc::clone(&self.window), size.width, size.height)?;
        Ok(Box::new(renderer))
    }
}

/// `request_inner_size` returns the new size when the platform applied it
/// synchronously; otherwise the current size stands until `Resized` arrives.
fn surface_size(
    applied: Option<PhysicalSize<u32>>,
    current: PhysicalSize<u32>,
) -> PhysicalSize<u32> {
    applied.unwrap_or(current)
}

pub fn run_app(config: LoopConfig, first_scene: Box<dyn Scene>) -> Result<(), AppError> {
    let metrics_handle = MetricsHandle::default();
    run_app_with_metrics(config, first_scene, metrics_handle)
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    first_scene: Box<dyn Scene>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.default_width.max(1) as f64,
                config.default_height.max(1) as f64,
            ))
            .with_resizable(config.resizable)
            .with_visible(false)
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );

    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, DEFAULT_METRICS_INTERVAL);
    let max_catch_up_ticks = config.max_catch_up_ticks.max(1);
    info!(
        window_title = %config.window_title,
        resizable = config.resizable,
        max_catch_up_ticks,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        "loop_config"
    );

    let mut host = GameHost::new(WinitBackend {
        window: Arc::clone(&window),
    })
    .with_max_catch_up_ticks(max_catch_up_ticks)
    .with_metrics(metrics_handle, metrics_log_interval);
    host.set_resizable(config.resizable);
    host.load_scene(first_scene)?;

    let mut input_collector = InputCollector::new();
    let mut fault: Option<HostError> = None;

    let run_result = event_loop.run(|event, window_target| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => {
            match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    host.close();
                }
                WindowEvent::Resized(size) => {
                    if let Err(error) = host.resize(size.width, size.height) {
                        record_fault(&mut fault, error, window_target);
                    }
                }
                WindowEvent::RedrawRequested => {
                    if let Err(error) = host.render_now() {
                        record_fault(&mut fault, error, window_target);
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.handle_cursor_moved(position.x, position.y);
                }
                WindowEvent::CursorEntered { .. } => input_collector.handle_cursor_entered(),
                WindowEvent::CursorLeft { .. } => input_collector.handle_cursor_left(),
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button.into(), state);
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    input_collector.handle_mouse_wheel(delta);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_key(
                        event.physical_key,
                        event.state,
                        event.repeat,
                        event.text.as_deref(),
                    );
                }
                _ => {}
            }

            for input in input_collector.take_pending() {
                host.dispatch_input(input);
            }
            if host.is_closed() {
                window_target.exit();
            }
        }
        Event::AboutToWait => {
            if let Err(error) = host.pump(Instant::now()) {
                record_fault(&mut fault, error, window_target);
                return;
            }
            if host.is_closed() {
                window_target.exit();
                return;
            }
            window_target.set_control_flow(control_flow_for(host.next_deadline()));
        }
        Event::LoopExiting => {
            host.close();
            info!("shutdown");
        }
        _ => {}
    });

    run_result.map_err(AppError::EventLoopRun)?;
    match fault {
        Some(error) => Err(AppError::Host(error)),
        None => Ok(()),
    }
}

fn record_fault(
    slot: &mut Option<HostError>,
    error: HostError,
    window_target: &EventLoopWindowTarget<()>,
) {
    error!(error = %error, "host_failed");
    if slot.is_some() {
        warn!("additional host failure after shutdown began");
    } else {
        *slot = Some(error);
    }
    window_target.exit();
}

fn control_flow_for(deadline: Option<Instant>) -> ControlFlow {
    match deadline {
        Some(deadline) => ControlFlow::WaitUntil(deadline),
        None => ControlFlow::Wait,
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
