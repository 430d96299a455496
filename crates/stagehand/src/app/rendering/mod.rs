mod canvas;
mod display;
mod renderer;
mod transform;

pub use canvas::{Canvas, Color};
pub use display::{Display, DisplayBackend, DisplayError};
pub use renderer::{compose_frame, Renderer};
pub use transform::{CanvasTransform, LogicalSize, PixelRect, Point, Viewport};
