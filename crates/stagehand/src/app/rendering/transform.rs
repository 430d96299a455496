#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalSize {
    pub width: u32,
    pub height: u32,
}

impl LogicalSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= 0.0
            && point.y >= 0.0
            && point.x < self.width as f64
            && point.y < self.height as f64
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Physical pixel rectangle, half-open on the right and bottom edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PixelRect {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Uniform scale plus a translation expressed in logical units.
///
/// Rendering translates by the offset and then scales; input goes the other
/// way. The canvas is letterboxed (bars above and below) or pillarboxed (bars
/// left and right) and never stretched or cropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl CanvasTransform {
    /// Returns `None` while either size has a zero dimension.
    pub fn fit(logical: LogicalSize, viewport: Viewport) -> Option<Self> {
        if logical.is_degenerate() || viewport.is_degenerate() {
            return None;
        }

        let logical_w = logical.width as f64;
        let logical_h = logical.height as f64;
        let display_w = viewport.width as f64;
        let display_h = viewport.height as f64;

        // Dw/Dh >= Lw/Lh, compared exactly so equal aspect always lands here.
        let height_driven = u64::from(viewport.width) * u64::from(logical.height)
            >= u64::from(logical.width) * u64::from(viewport.height);

        if height_driven {
            let scale = display_h / logical_h;
            Some(Self {
                scale,
                offset_x: (display_w / scale - logical_w) / 2.0,
                offset_y: 0.0,
            })
        } else {
            let scale = display_w / logical_w;
            Some(Self {
                scale,
                offset_x: 0.0,
                offset_y: (display_h / scale - logical_h) / 2.0,
            })
        }
    }

    pub fn forward(&self, logical: Point) -> Point {
        Point {
            x: (logical.x + self.offset_x) * self.scale,
            y: (logical.y + self.offset_y) * self.scale,
        }
    }

    pub fn inverse(&self, physical: Point) -> Point {
        Point {
            x: physical.x / self.scale - self.offset_x,
            y: physical.y / self.scale - self.offset_y,
        }
    }

    pub fn canvas_rect(&self, logical: LogicalSize, viewport: Viewport) -> PixelRect {
        let top_left = self.forward(Point::new(0.0, 0.0));
        let bottom_right = self.forward(Point::new(logical.width as f64, logical.height as f64));
        PixelRect {
            left: clamp_to_extent(top_left.x, viewport.width),
            top: clamp_to_extent(top_left.y, viewport.height),
            right: clamp_to_extent(bottom_right.x, viewport.width),
            bottom: clamp_to_extent(bottom_right.y, viewport.height),
        }
    }
}

fn clamp_to_extent(value: f64, extent: u32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value.round() as u64).min(u64::from(extent)) as u32
}
