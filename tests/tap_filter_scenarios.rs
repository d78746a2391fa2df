use std::sync::Mutex;

use nativetab_lib::interceptor::geometry::Rect;
use nativetab_lib::interceptor::tap_filter::{
    Injection, TapDecision, TapEvent, TapEventKind, TapFilter, TapOutcome,
};
use nativetab_lib::interceptor::window_list::{
    AppIdentity, StaticWindowList, TargetApp, WindowSnapshotEntry,
};
use nativetab_lib::interceptor::workspace::Workspace;
use nativetab_lib::settings::Settings;

const TERMINAL_PID: i32 = 321;

struct ScriptedWorkspace {
    frontmost: Mutex<Option<AppIdentity>>,
}

impl ScriptedWorkspace {
    fn terminal_frontmost() -> Self {
        Self {
            frontmost: Mutex::new(Some(terminal())),
        }
    }
}

impl Workspace for ScriptedWorkspace {
    fn frontmost(&self) -> Option<AppIdentity> {
        self.frontmost.lock().unwrap().clone()
    }

    fn running(&self, _target: &TargetApp) -> Option<AppIdentity> {
        Some(terminal())
    }

    fn activate(&self, _target: &TargetApp) -> bool {
        true
    }
}

fn terminal() -> AppIdentity {
    AppIdentity {
        pid: TERMINAL_PID,
        bundle_id: Some("com.apple.Terminal".to_string()),
        name: Some("Terminal".to_string()),
    }
}

fn window(pid: i32, name: &str, bounds: Rect, z_index: usize) -> WindowSnapshotEntry {
    WindowSnapshotEntry {
        owner_pid: pid,
        owner_name: name.to_string(),
        bounds,
        z_index,
        layer: 0,
    }
}

fn desktop() -> Vec<WindowSnapshotEntry> {
    vec![
        window(88, "Spotlight", Rect::new(400.0, 200.0, 600.0, 60.0), 0),
        window(TERMINAL_PID, "Terminal", Rect::new(100.0, 100.0, 1000.0, 700.0), 1),
        window(1, "Finder", Rect::new(0.0, 0.0, 1440.0, 900.0), 2),
    ]
}

fn event(kind: TapEventKind, x: f64, y: f64, clicks: i64) -> TapEvent {
    TapEvent::new(kind, x, y, clicks)
}

#[test]
fn selecting_text_then_right_clicking_copies_and_pastes() {
    let settings = Settings::default();
    let mut filter = TapFilter::new(
        StaticWindowList(Some(desktop())),
        ScriptedWorkspace::terminal_frontmost(),
    );

    assert_eq!(
        filter.handle(&event(TapEventKind::PointerDown, 150.0, 500.0, 1), &settings),
        TapOutcome::PASS
    );
    let up = filter.handle(&event(TapEventKind::PointerUp, 600.0, 520.0, 1), &settings);
    assert_eq!(up.decision, TapDecision::PassThrough);
    assert_eq!(up.inject, Some(Injection::Copy));

    let right = filter.handle(
        &event(TapEventKind::SecondaryPointerDown, 600.0, 520.0, 1),
        &settings,
    );
    assert_eq!(right.decision, TapDecision::Swallow);
    assert_eq!(right.inject, Some(Injection::Paste));
}

#[test]
fn spotlight_over_terminal_blocks_everything() {
    let settings = Settings::default();
    let mut filter = TapFilter::new(
        StaticWindowList(Some(desktop())),
        ScriptedWorkspace::terminal_frontmost(),
    );

    filter.handle(&event(TapEventKind::PointerDown, 150.0, 500.0, 1), &settings);
    // Release lands on the Spotlight bar, which sits above the terminal window.
    assert_eq!(
        filter.handle(&event(TapEventKind::PointerUp, 500.0, 230.0, 1), &settings),
        TapOutcome::PASS
    );
    assert_eq!(
        filter.handle(
            &event(TapEventKind::SecondaryPointerDown, 500.0, 230.0, 1),
            &settings
        ),
        TapOutcome::PASS
    );
}

#[test]
fn press_on_finder_then_release_on_terminal_does_not_copy() {
    let settings = Settings::default();
    let mut filter = TapFilter::new(
        StaticWindowList(Some(desktop())),
        ScriptedWorkspace::terminal_frontmost(),
    );

    filter.handle(&event(TapEventKind::PointerDown, 150.0, 500.0, 1), &settings);
    filter.handle(&event(TapEventKind::PointerDown, 1300.0, 850.0, 1), &settings);
    assert!(filter.drag_state().last_mouse_down().is_none());

    assert_eq!(
        filter.handle(&event(TapEventKind::PointerUp, 600.0, 500.0, 1), &settings),
        TapOutcome::PASS
    );
}

#[test]
fn triple_click_copies_line() {
    let settings = Settings::default();
    let mut filter = TapFilter::new(
        StaticWindowList(Some(desktop())),
        ScriptedWorkspace::terminal_frontmost(),
    );

    filter.handle(&event(TapEventKind::PointerDown, 300.0, 600.0, 3), &settings);
    let up = filter.handle(&event(TapEventKind::PointerUp, 300.0, 600.0, 3), &settings);
    assert_eq!(up.inject, Some(Injection::Copy));
}

#[test]
fn custom_drag_threshold_is_honoured() {
    let mut settings = Settings::default();
    settings.tuning.drag_threshold_px = 20.0;
    let mut filter = TapFilter::new(
        StaticWindowList(Some(desktop())),
        ScriptedWorkspace::terminal_frontmost(),
    );

    filter.handle(&event(TapEventKind::PointerDown, 300.0, 600.0, 1), &settings);
    let up = filter.handle(&event(TapEventKind::PointerUp, 310.0, 600.0, 1), &settings);
    assert_eq!(up.inject, None);
}
