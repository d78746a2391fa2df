use nativetab_lib::interceptor::displays::DisplayLayout;
use nativetab_lib::interceptor::geometry::Rect;
use nativetab_lib::interceptor::snap::{plan_snap, SnapParams};

fn params(companion_width: f64) -> SnapParams {
    SnapParams {
        companion_width,
        noise_px: 1.0,
    }
}

#[test]
fn terminal_near_left_edge_is_pushed_right() {
    let layout = DisplayLayout::single(Rect::new(0.0, 0.0, 1440.0, 900.0));
    let plan = plan_snap(Rect::new(50.0, 100.0, 800.0, 600.0), &layout, params(250.0));

    let adjusted = plan.adjusted_target.expect("target should move");
    assert_eq!(adjusted.x, 250.0);
    assert_eq!(plan.companion.x, 0.0);
    assert_eq!(plan.companion.y, 900.0 - (100.0 + 600.0));
    assert_eq!(plan.companion.height, 600.0);
}

#[test]
fn repeated_snap_settles() {
    let layout = DisplayLayout::single(Rect::new(0.0, 0.0, 1440.0, 900.0));
    let mut window = Rect::new(10.0, 40.0, 1430.0, 800.0);

    let mut adjustments = 0;
    for _ in 0..5 {
        let plan = plan_snap(window, &layout, params(320.0));
        if let Some(adjusted) = plan.adjusted_target {
            adjustments += 1;
            window = adjusted;
        }
    }
    assert_eq!(adjustments, 1);
    assert_eq!(window, Rect::new(320.0, 40.0, 1120.0, 800.0));
}

#[test]
fn left_display_uses_its_own_frame() {
    // Display 2 sits to the left of the main display (negative x) and is listed first.
    let main = Rect::new(0.0, 0.0, 1440.0, 900.0);
    let left = Rect::new(-1920.0, 0.0, 1920.0, 1200.0);
    let layout = DisplayLayout {
        main,
        displays: vec![left, main],
    };

    let plan = plan_snap(Rect::new(-1900.0, 50.0, 900.0, 700.0), &layout, params(300.0));
    assert_eq!(plan.display, left);
    assert_eq!(plan.adjusted_target.map(|r| r.x), Some(-1620.0));
    assert_eq!(plan.companion.x, -1920.0);
    assert_eq!(plan.companion.y, 900.0 - (50.0 + 700.0));
}
