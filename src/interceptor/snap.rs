//! Snap math: keep the target clear of the companion and place the companion beside it.
//!
//! Pure functions over top-left geometry. Only the final companion frame is flipped into
//! Cocoa's bottom-left space.

use serde::Serialize;

use super::displays::DisplayLayout;
use super::geometry::{to_bottom_left, Rect, ScreenPoint};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapParams {
    pub companion_width: f64,
    /// Adjustments smaller than this are treated as noise.
    pub noise_px: f64,
}

/// Companion window frame in Cocoa (bottom-left origin) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionPlacement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CompanionPlacement {
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapPlan {
    pub display: Rect,
    /// New target frame (top-left), when the target has to move.
    pub adjusted_target: Option<Rect>,
    pub companion: CompanionPlacement,
}

/// The display a window belongs to: first display holding its top-left corner, then the
/// first whose horizontal span holds its left edge, then the main display.
pub fn display_for(window: Rect, layout: &DisplayLayout) -> Rect {
    let corner = ScreenPoint::new(window.x, window.y);
    layout
        .displays
        .iter()
        .find(|display| display.contains(corner))
        .or_else(|| layout.displays.iter().find(|display| display.spans_x(window.x)))
        .copied()
        .unwrap_or(layout.main)
}

/// New target frame when the companion would cover it, or `None` when it can stay put.
pub fn plan_adjustment(window: Rect, display: Rect, params: SnapParams) -> Option<Rect> {
    if display.width <= params.companion_width {
        return None;
    }
    if window.x - display.x >= params.companion_width {
        return None;
    }

    let new_x = display.x + params.companion_width;
    let new_width = window.width.min(display.right() - new_x);

    let delta = (new_x - window.x).abs().max((new_width - window.width).abs());
    if delta < params.noise_px {
        return None;
    }
    Some(Rect::new(new_x, window.y, new_width, window.height))
}

/// Companion frame immediately left of `target`, same top and height.
pub fn companion_for(target: Rect, primary_height: f64, companion_width: f64) -> CompanionPlacement {
    let frame = Rect::new(
        target.x - companion_width,
        target.y,
        companion_width,
        target.height,
    );
    CompanionPlacement::from_rect(to_bottom_left(frame, primary_height))
}

pub fn plan_snap(window: Rect, layout: &DisplayLayout, params: SnapParams) -> SnapPlan {
    let display = display_for(window, layout);
    let adjusted_target = plan_adjustment(window, display, params);
    let placed = adjusted_target.unwrap_or(window);
    SnapPlan {
        display,
        adjusted_target,
        companion: companion_for(placed, layout.primary_height(), params.companion_width),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(width: f64) -> SnapParams {
        SnapParams {
            companion_width: width,
            noise_px: 1.0,
        }
    }

    #[test]
    fn scenario_window_near_left_edge() {
        let layout = DisplayLayout::single(Rect::new(0.0, 0.0, 1440.0, 900.0));
        let plan = plan_snap(Rect::new(50.0, 100.0, 800.0, 600.0), &layout, params(250.0));

        assert_eq!(plan.adjusted_target, Some(Rect::new(250.0, 100.0, 800.0, 600.0)));
        assert_eq!(
            plan.companion,
            CompanionPlacement {
                x: 0.0,
                y: 900.0 - (100.0 + 600.0),
                width: 250.0,
                height: 600.0
            }
        );
    }

    #[test]
    fn snap_is_idempotent() {
        let layout = DisplayLayout::single(Rect::new(0.0, 0.0, 1440.0, 900.0));
        let first = plan_snap(Rect::new(50.0, 100.0, 800.0, 600.0), &layout, params(250.0));
        let moved = first.adjusted_target.expect("first pass adjusts");

        let second = plan_snap(moved, &layout, params(250.0));
        assert_eq!(second.adjusted_target, None);
        assert_eq!(second.companion, first.companion);
    }

    #[test]
    fn sub_pixel_drift_is_noise() {
        let display = Rect::new(0.0, 0.0, 1440.0, 900.0);
        assert_eq!(
            plan_adjustment(Rect::new(249.5, 0.0, 800.0, 600.0), display, params(250.0)),
            None
        );
    }

    #[test]
    fn wide_window_is_shrunk_to_display() {
        let display = Rect::new(0.0, 0.0, 1440.0, 900.0);
        let adjusted = plan_adjustment(Rect::new(0.0, 25.0, 1440.0, 875.0), display, params(320.0))
            .expect("adjusted");
        assert_eq!(adjusted, Rect::new(320.0, 25.0, 1120.0, 875.0));
    }

    #[test]
    fn window_clear_of_companion_stays() {
        let display = Rect::new(0.0, 0.0, 1440.0, 900.0);
        assert_eq!(
            plan_adjustment(Rect::new(400.0, 0.0, 800.0, 600.0), display, params(320.0)),
            None
        );
    }

    #[test]
    fn display_narrower_than_companion_is_left_alone() {
        let display = Rect::new(0.0, 0.0, 300.0, 900.0);
        assert_eq!(
            plan_adjustment(Rect::new(0.0, 0.0, 200.0, 600.0), display, params(320.0)),
            None
        );
    }

    #[test]
    fn second_display_frame_is_used() {
        // Display 1 is enumerated first; the window lives on display 2 to its right.
        let primary = Rect::new(0.0, 0.0, 1440.0, 900.0);
        let secondary = Rect::new(1440.0, -180.0, 1920.0, 1080.0);
        let layout = DisplayLayout {
            main: primary,
            displays: vec![primary, secondary],
        };

        let plan = plan_snap(Rect::new(1500.0, 0.0, 800.0, 600.0), &layout, params(250.0));
        assert_eq!(plan.display, secondary);
        assert_eq!(plan.adjusted_target, Some(Rect::new(1690.0, 0.0, 800.0, 600.0)));
        assert_eq!(plan.companion.x, 1440.0);
        assert_eq!(plan.companion.y, 900.0 - 600.0);
    }

    #[test]
    fn display_lookup_falls_back_to_horizontal_span_then_main() {
        let primary = Rect::new(0.0, 0.0, 1440.0, 900.0);
        let secondary = Rect::new(1440.0, 0.0, 1920.0, 1080.0);
        let layout = DisplayLayout {
            main: primary,
            displays: vec![primary, secondary],
        };

        // Title bar dragged above the display's top edge.
        assert_eq!(display_for(Rect::new(1600.0, -40.0, 400.0, 300.0), &layout), secondary);
        // Entirely off any display.
        assert_eq!(display_for(Rect::new(-900.0, 10.0, 400.0, 300.0), &layout), primary);
    }
}
