use serde::{Deserialize, Serialize};

/// A point in global event space (origin top-left of the main display, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: ScreenPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle. Which origin convention applies depends on where it came from:
/// window-list and accessibility geometry is top-left, companion placement is bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Half-open containment, matching how CoreGraphics hit-tests window bounds.
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn spans_x(&self, x: f64) -> bool {
        x >= self.x && x < self.right()
    }
}

/// Convert a top-left-origin global rect into Cocoa's bottom-left global space.
///
/// Both spaces are anchored on the primary display, so the flip only needs that display's
/// height; which display the rect sits on does not matter.
pub fn to_bottom_left(rect: Rect, primary_height: f64) -> Rect {
    Rect::new(
        rect.x,
        primary_height - rect.bottom(),
        rect.width,
        rect.height,
    )
}
