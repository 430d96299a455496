mod assets;
mod host;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;
mod scheduler;
mod scratch;

pub use assets::{load_image, Image, ResourceError};
pub use host::{GameHost, HostError, HostState, PumpReport, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use input::{InputEvent, InputKind, KeyInput, MouseButton, PointerInput, WheelInput};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle, DEFAULT_METRICS_INTERVAL};
pub use rendering::{
    compose_frame, Canvas, CanvasTransform, Color, Display, DisplayBackend, DisplayError,
    LogicalSize, PixelRect, Point, Renderer, Viewport,
};
pub use scene::{Scene, SceneCommand, SceneContext, SceneDescriptor, SceneError};
pub use scheduler::{DueWork, Scheduler, TickRate, DEFAULT_MAX_CATCH_UP_TICKS, DEFAULT_RATE};
pub use scratch::ScratchStore;
pub use winit::keyboard::KeyCode;
