use thiserror::Error;

use super::canvas::Canvas;
use super::transform::{CanvasTransform, Viewport};

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("pixel surface error: {0}")]
    Surface(#[from] pixels::Error),
    #[error("display unavailable: {0}")]
    Unavailable(String),
}

/// A surface the host presents finished canvases to.
pub trait Display {
    fn viewport(&self) -> Viewport;

    /// Zero-sized viewports are ignored until a real size arrives.
    fn resize(&mut self, viewport: Viewport) -> Result<(), DisplayError>;

    /// `transform` is `None` while the mapping is degenerate; implementations
    /// then show only the background.
    fn present(
        &mut self,
        canvas: &Canvas,
        transform: Option<CanvasTransform>,
    ) -> Result<(), DisplayError>;

    fn set_resizable(&mut self, resizable: bool);

    fn request_redraw(&self) {}
}

/// Opens the display the first time a host launches.
pub trait DisplayBackend {
    fn open(&mut self, width: u32, height: u32) -> Result<Box<dyn Display>, DisplayError>;
}
