//! Classification of system-wide pointer events: pass through, swallow, or inject.
//!
//! `TapFilter` owns the only mutable state on the tap thread (`DragState`) and is driven
//! one event at a time, in delivery order, by the event tap.

use tracing::debug;

use super::geometry::ScreenPoint;
use super::keys::KeyChord;
use super::window_list::{resolve_owner_at, OwnerResult, WindowListSource};
use super::workspace::Workspace;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapEventKind {
    PointerDown,
    PointerUp,
    SecondaryPointerDown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapEvent {
    pub kind: TapEventKind,
    pub point: ScreenPoint,
    /// Click repeat count reported by the OS (1 single, 2 double, 3 triple).
    pub click_count: i64,
}

impl TapEvent {
    pub fn new(kind: TapEventKind, x: f64, y: f64, click_count: i64) -> Self {
        Self {
            kind,
            point: ScreenPoint::new(x, y),
            click_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapDecision {
    PassThrough,
    Swallow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    /// A selection was made in the target; copy it.
    Copy,
    /// Right click in the target; paste.
    Paste,
}

impl Injection {
    pub fn chord(&self) -> KeyChord {
        match self {
            Injection::Copy => KeyChord::COPY,
            Injection::Paste => KeyChord::PASTE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapOutcome {
    pub decision: TapDecision,
    pub inject: Option<Injection>,
}

impl TapOutcome {
    pub const PASS: TapOutcome = TapOutcome {
        decision: TapDecision::PassThrough,
        inject: None,
    };

    fn pass_and(injection: Injection) -> Self {
        Self {
            decision: TapDecision::PassThrough,
            inject: Some(injection),
        }
    }

    fn swallow_and(injection: Injection) -> Self {
        Self {
            decision: TapDecision::Swallow,
            inject: Some(injection),
        }
    }
}

/// Where the last primary button press landed, if it landed in the target.
///
/// A recorded point always belongs to a press confirmed inside the target window; any
/// press elsewhere resets it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragState {
    last_mouse_down: Option<ScreenPoint>,
}

impl DragState {
    pub fn last_mouse_down(&self) -> Option<ScreenPoint> {
        self.last_mouse_down
    }

    fn record(&mut self, point: ScreenPoint) {
        self.last_mouse_down = Some(point);
    }

    fn clear(&mut self) {
        self.last_mouse_down = None;
    }
}

pub struct TapFilter<W, Ws> {
    windows: W,
    workspace: Ws,
    drag: DragState,
}

impl<W: WindowListSource, Ws: Workspace> TapFilter<W, Ws> {
    pub fn new(windows: W, workspace: Ws) -> Self {
        Self {
            windows,
            workspace,
            drag: DragState::default(),
        }
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn handle(&mut self, event: &TapEvent, settings: &Settings) -> TapOutcome {
        let frontmost = self
            .workspace
            .frontmost()
            .filter(|app| settings.target.is(app));
        let Some(target_app) = frontmost else {
            // Not our turn. A press elsewhere still invalidates any recorded drag start.
            if event.kind == TapEventKind::PointerDown {
                self.drag.clear();
            }
            return TapOutcome::PASS;
        };

        let identity = settings.target.identity(Some(&target_app));
        let owner_at = |point: ScreenPoint| {
            let snapshot = self.windows.snapshot();
            let owner = resolve_owner_at(point, snapshot.as_deref(), &identity);
            if let OwnerResult::OtherApp(name) = &owner {
                debug!(event = "interceptor.tap.blocked_by", owner = %name, x = point.x, y = point.y);
            }
            owner
        };

        match event.kind {
            TapEventKind::SecondaryPointerDown => {
                if !settings.paste_on_right_click {
                    return TapOutcome::PASS;
                }
                if owner_at(event.point) != OwnerResult::TargetApp {
                    return TapOutcome::PASS;
                }
                debug!(event = "interceptor.tap.right_click_paste", x = event.point.x, y = event.point.y);
                TapOutcome::swallow_and(Injection::Paste)
            }
            TapEventKind::PointerDown => {
                if owner_at(event.point) == OwnerResult::TargetApp {
                    self.drag.record(event.point);
                } else {
                    self.drag.clear();
                }
                TapOutcome::PASS
            }
            TapEventKind::PointerUp => {
                if !settings.copy_on_select {
                    return TapOutcome::PASS;
                }
                if owner_at(event.point) != OwnerResult::TargetApp {
                    return TapOutcome::PASS;
                }
                let Some(down) = self.drag.last_mouse_down() else {
                    return TapOutcome::PASS;
                };

                let distance = down.distance_to(event.point);
                let dragged = distance > settings.tuning.drag_threshold_px;
                if dragged || event.click_count >= 2 {
                    debug!(
                        event = "interceptor.tap.selection_detected",
                        drag_px = distance,
                        clicks = event.click_count
                    );
                    TapOutcome::pass_and(Injection::Copy)
                } else {
                    TapOutcome::PASS
                }
            }
        }
    }
}
