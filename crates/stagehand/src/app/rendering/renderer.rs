use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use super::canvas::Canvas;
use super::display::{Display, DisplayError};
use super::transform::{CanvasTransform, Viewport};

const BAR_COLOR: [u8; 4] = [0, 0, 0, 255];

/// `pixels`-backed display for a winit window.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    /// Builds the surface at `width×height` instead of asking the window,
    /// whose reported size can lag behind a pending resize request.
    pub fn new(window: Arc<Window>, width: u32, height: u32) -> Result<Self, Error> {
        let width = width.max(1);
        let height = height.max(1);
        let pixels = Self::build_pixels(Arc::clone(&window), width, height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport::new(width, height),
        })
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }
}

impl Display for Renderer {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport) -> Result<(), DisplayError> {
        if viewport.is_degenerate() || viewport == self.viewport {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), viewport.width, viewport.height)?;
        self.viewport = viewport;
        Ok(())
    }

    fn present(
        &mut self,
        canvas: &Canvas,
        transform: Option<CanvasTransform>,
    ) -> Result<(), DisplayError> {
        if self.viewport.is_degenerate() {
            return Ok(());
        }
        compose_frame(self.pixels.frame_mut(), self.viewport, canvas, transform);
        self.pixels.render()?;
        Ok(())
    }

    fn set_resizable(&mut self, resizable: bool) {
        self.window.set_resizable(resizable);
    }

    fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.window.set_visible(false);
    }
}

/// Fills `frame` with the bar color, then nearest-neighbour samples `canvas`
/// into the area `transform` maps it to.
pub fn compose_frame(
    frame: &mut [u8],
    viewport: Viewport,
    canvas: &Canvas,
    transform: Option<CanvasTransform>,
) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&BAR_COLOR);
    }

    let Some(transform) = transform else {
        return;
    };
    let logical = canvas.size();
    if logical.is_degenerate() || viewport.is_degenerate() {
        return;
    }
    let expected_len = viewport.width as usize * viewport.height as usize * 4;
    if frame.len() < expected_len {
        return;
    }

    let rect = transform.canvas_rect(logical, viewport);
    let src = canvas.rgba();
    let src_width = logical.width as usize;
    let dst_width = viewport.width as usize;
    let max_x = logical.width as usize - 1;
    let max_y = logical.height as usize - 1;

    for py in rect.top..rect.bottom {
        let ly = (py as f64 + 0.5) / transform.scale - transform.offset_y;
        if ly < 0.0 {
            continue;
        }
        let sy = (ly as usize).min(max_y);
        let dst_row = py as usize * dst_width;
        let src_row = sy * src_width;
        for px in rect.left..rect.right {
            let lx = (px as f64 + 0.5) / transform.scale - transform.offset_x;
            if lx < 0.0 {
                continue;
            }
            let sx = (lx as usize).min(max_x);
            let src_offset = (src_row + sx) * 4;
            let dst_offset = (dst_row + px as usize) * 4;
            frame[dst_offset..dst_offset + 4].copy_from_slice(&src[src_offset..src_offset + 4]);
        }
    }
}
