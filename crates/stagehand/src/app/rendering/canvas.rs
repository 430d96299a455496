use crate::app::assets::Image;

use super::transform::LogicalSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const CYAN: Self = Self::rgb(0, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub const fn gray(value: u8) -> Self {
        Self::rgb(value, value, value)
    }

    pub const fn to_rgba(self) -> [u8; 4] {
        self.0
    }
}

/// Fixed-resolution RGBA target a scene renders into, in logical pixels.
///
/// Every primitive clips against the canvas bounds, so scenes may draw
/// partially or fully outside `[0, width) x [0, height)`.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Canvas {
    pub fn new(size: LogicalSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
            rgba: vec![0; buffer_len(size)],
        }
    }

    pub fn size(&self) -> LogicalSize {
        LogicalSize::new(self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub(crate) fn resize(&mut self, size: LogicalSize) {
        if self.size() == size {
            return;
        }
        self.width = size.width;
        self.height = size.height;
        self.rgba.clear();
        self.rgba.resize(buffer_len(size), 0);
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        let offset = self.byte_offset(x, y)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(Color(out))
    }

    pub fn clear(&mut self, color: Color) {
        let rgba = color.to_rgba();
        for chunk in self.rgba.chunks_exact_mut(4) {
            chunk.copy_from_slice(&rgba);
        }
    }

    pub fn put_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(offset) = self.byte_offset(x, y) {
            self.rgba[offset..offset + 4].copy_from_slice(&color.to_rgba());
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color) {
        let Some((left, top, right, bottom)) = self.clip(x, y, width, height) else {
            return;
        };
        let rgba = color.to_rgba();
        let row_width = self.width as usize;
        for row in top..bottom {
            let start = (row as usize * row_width + left as usize) * 4;
            let end = (row as usize * row_width + right as usize) * 4;
            for chunk in self.rgba[start..end].chunks_exact_mut(4) {
                chunk.copy_from_slice(&rgba);
            }
        }
    }

    pub fn stroke_rect(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        thickness: u32,
        color: Color,
    ) {
        if width == 0 || height == 0 || thickness == 0 {
            return;
        }
        let t = thickness.min(width).min(height);
        self.fill_rect(x, y, width, t, color);
        self.fill_rect(x, y + height as i32 - t as i32, width, t, color);
        self.fill_rect(x, y, t, height, color);
        self.fill_rect(x + width as i32 - t as i32, y, t, height, color);
    }

    /// Ring centered on `(cx, cy)` whose outer edge sits at `radius`.
    pub fn stroke_circle(&mut self, cx: i32, cy: i32, radius: u32, thickness: u32, color: Color) {
        if radius == 0 || thickness == 0 {
            return;
        }
        let outer = radius as i64;
        let inner = outer.saturating_sub(thickness as i64).max(0);
        let outer_sq = outer * outer;
        let inner_sq = inner * inner;

        let left = (cx as i64 - outer).max(0);
        let right = (cx as i64 + outer).min(self.width as i64 - 1);
        let top = (cy as i64 - outer).max(0);
        let bottom = (cy as i64 + outer).min(self.height as i64 - 1);
        if left > right || top > bottom {
            return;
        }

        for y in top..=bottom {
            let dy = y - cy as i64;
            for x in left..=right {
                let dx = x - cx as i64;
                let dist_sq = dx * dx + dy * dy;
                if dist_sq <= outer_sq && dist_sq >= inner_sq {
                    self.put_pixel(x as i32, y as i32, color);
                }
            }
        }
    }

    /// Copies `image` with its top-left corner at `(x, y)`. Fully transparent
    /// source pixels are skipped.
    pub fn draw_image(&mut self, image: &Image, x: i32, y: i32) {
        let Some((left, top, right, bottom)) = self.clip(x, y, image.width(), image.height())
        else {
            return;
        };
        let src = image.rgba();
        let src_width = image.width() as usize;
        let dst_width = self.width as usize;

        for out_y in top..bottom {
            let src_y = (out_y - y) as usize;
            for out_x in left..right {
                let src_x = (out_x - x) as usize;
                let src_offset = (src_y * src_width + src_x) * 4;
                if src[src_offset + 3] == 0 {
                    continue;
                }
                let dst_offset = (out_y as usize * dst_width + out_x as usize) * 4;
                self.rgba[dst_offset..dst_offset + 4]
                    .copy_from_slice(&src[src_offset..src_offset + 4]);
            }
        }
    }

    fn clip(&self, x: i32, y: i32, width: u32, height: u32) -> Option<(i32, i32, i32, i32)> {
        let left = x.max(0);
        let top = y.max(0);
        let right = (x as i64 + width as i64).min(self.width as i64) as i32;
        let bottom = (y as i64 + height as i64).min(self.height as i64) as i32;
        if left >= right || top >= bottom {
            return None;
        }
        Some((left, top, right, bottom))
    }

    fn byte_offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let pixel = (y as usize).checked_mul(self.width as usize)?.checked_add(x as usize)?;
        pixel.checked_mul(4)
    }
}

fn buffer_len(size: LogicalSize) -> usize {
    size.width as usize * size.height as usize * 4
}
