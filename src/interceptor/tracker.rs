//! Geometry tracking: recompute the snap on request and keep the observer pointed at the
//! running target.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::displays::DisplaySource;
use super::listener::{EngineListener, MainThreadDispatch};
use super::snap::{companion_for, plan_snap, CompanionPlacement, SnapParams};
use super::snap_queue::{SnapReason, SnapRequest, SnapRequests};
use super::target_control::TargetWindowControl;
use super::window_list::{primary_target_window, AppIdentity, WindowListSource};
use super::workspace::Workspace;
use crate::errors::{EngineError, NativeTabError};
use crate::settings::{Settings, SettingsSource};

/// Idle tick after which the pump checks on the observer.
pub const SUPERVISE_INTERVAL: Duration = Duration::from_secs(2);

pub struct GeometryTracker {
    windows: Box<dyn WindowListSource + Send + Sync>,
    workspace: Arc<dyn Workspace>,
    displays: Box<dyn DisplaySource>,
    control: Box<dyn TargetWindowControl>,
}

impl GeometryTracker {
    pub fn new(
        windows: Box<dyn WindowListSource + Send + Sync>,
        workspace: Arc<dyn Workspace>,
        displays: Box<dyn DisplaySource>,
        control: Box<dyn TargetWindowControl>,
    ) -> Self {
        Self {
            windows,
            workspace,
            displays,
            control,
        }
    }

    fn running_target(&self, settings: &Settings) -> Result<AppIdentity, EngineError> {
        self.workspace
            .running(&settings.target)
            .ok_or_else(|| EngineError::TargetNotRunning {
                bundle_id: settings.target.bundle_id.clone(),
            })
    }

    pub fn target_pid(&self, settings: &Settings) -> Option<i32> {
        self.running_target(settings).ok().map(|app| app.pid)
    }

    /// Snap the target clear of the companion and return where the companion goes.
    /// Any failed lookup returns `None`; the companion then keeps its last position.
    pub fn recompute(&self, settings: &Settings) -> Option<CompanionPlacement> {
        if !settings.snap_to_target {
            return None;
        }

        let app = match self.running_target(settings) {
            Ok(app) => app,
            Err(e) => {
                debug!(event = "interceptor.tracker.target_not_running", error = %e);
                return None;
            }
        };
        let identity = settings.target.identity(Some(&app));

        let Some(entries) = self.windows.snapshot() else {
            debug!(event = "interceptor.tracker.window_list_failed");
            return None;
        };
        let Some(window) = primary_target_window(
            &entries,
            &identity,
            settings.tuning.min_target_window_px,
        ) else {
            debug!(event = "interceptor.tracker.no_target_window", pid = app.pid);
            return None;
        };
        let Some(layout) = self.displays.layout() else {
            debug!(event = "interceptor.tracker.display_query_failed");
            return None;
        };

        let params = SnapParams {
            companion_width: settings.companion_width,
            noise_px: settings.tuning.snap_noise_px,
        };
        let plan = plan_snap(window, &layout, params);

        let Some(adjusted) = plan.adjusted_target else {
            return Some(plan.companion);
        };

        match self.control.set_frame(&settings.target, adjusted) {
            Ok(()) => {
                debug!(
                    event = "interceptor.tracker.target_adjusted",
                    from_x = window.x,
                    to_x = adjusted.x,
                    width = adjusted.width
                );
                Some(plan.companion)
            }
            Err(e) => {
                warn!(event = "interceptor.tracker.adjust_failed", error = %e);
                Some(companion_for(
                    window,
                    layout.primary_height(),
                    settings.companion_width,
                ))
            }
        }
    }
}

/// The accessibility subscription for one target process.
pub trait TargetObserver: Send {
    fn observed_pid(&self) -> Option<i32>;

    /// Start observing `pid`, replacing any current subscription.
    fn observe(&mut self, pid: i32) -> Result<(), EngineError>;

    fn stop(&mut self);
}

/// Single consumer of snap requests. Recomputes run here one at a time; the resulting
/// companion geometry is applied on the main thread.
pub struct SnapPump {
    tracker: GeometryTracker,
    settings: Arc<dyn SettingsSource>,
    dispatch: Arc<dyn MainThreadDispatch>,
    listener: Arc<dyn EngineListener>,
    running: Arc<AtomicBool>,
    /// Pid whose observer could not be created. Not retried until the pid changes.
    failed_pid: Option<i32>,
}

impl SnapPump {
    pub fn new(
        tracker: GeometryTracker,
        settings: Arc<dyn SettingsSource>,
        dispatch: Arc<dyn MainThreadDispatch>,
        listener: Arc<dyn EngineListener>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            tracker,
            settings,
            dispatch,
            listener,
            running,
            failed_pid: None,
        }
    }

    /// Recompute and apply. Returns the placement that was applied.
    pub fn apply(&self, reason: SnapReason) -> Option<CompanionPlacement> {
        let settings = self.settings.current();
        let placement = self.tracker.recompute(&settings)?;

        let listener = Arc::clone(&self.listener);
        let applied = self
            .dispatch
            .run_sync(Box::new(move || listener.on_geometry_changed(placement)));
        if !applied {
            warn!(event = "interceptor.tracker.dispatch_failed", reason = reason.as_str());
            return None;
        }

        debug!(
            event = "interceptor.tracker.snapped",
            reason = reason.as_str(),
            x = placement.x,
            y = placement.y,
            height = placement.height
        );
        Some(placement)
    }

    /// Point the observer at the running target, or stop it when the target is gone.
    /// A pid whose observer failed to start is left alone until the target quits or
    /// relaunches.
    pub fn supervise(&mut self, observer: &mut dyn TargetObserver) {
        let settings = self.settings.current();
        let running_pid = self.tracker.target_pid(&settings);

        match (running_pid, observer.observed_pid()) {
            (Some(pid), Some(observed)) if pid == observed => {}
            (Some(pid), _) if self.failed_pid == Some(pid) => {}
            (Some(pid), _) => match observer.observe(pid) {
                Ok(()) => {
                    self.failed_pid = None;
                    info!(event = "interceptor.tracker.observing", pid);
                    self.apply(SnapReason::ObserverStarted);
                }
                Err(e) => {
                    self.failed_pid = Some(pid);
                    warn!(
                        event = "interceptor.tracker.observe_failed",
                        pid,
                        code = e.error_code(),
                        error = %e
                    );
                }
            },
            (None, observed) => {
                self.failed_pid = None;
                if let Some(observed) = observed {
                    info!(event = "interceptor.tracker.target_gone", pid = observed);
                    observer.stop();
                }
            }
        }
    }

    pub fn run(mut self, requests: SnapRequests, mut observer: Box<dyn TargetObserver>) {
        self.supervise(observer.as_mut());

        while self.running.load(Ordering::SeqCst) {
            match requests.next(SUPERVISE_INTERVAL) {
                SnapRequest::Snap(_) if !self.running.load(Ordering::SeqCst) => break,
                SnapRequest::Snap(reason) => {
                    self.apply(reason);
                }
                SnapRequest::Idle => self.supervise(observer.as_mut()),
                SnapRequest::Closed => break,
            }
        }

        observer.stop();
        debug!(event = "interceptor.tracker.pump_stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::interceptor::displays::{DisplayLayout, StaticDisplays};
    use crate::interceptor::geometry::Rect;
    use crate::interceptor::listener::recording::{Call, RecordingListener};
    use crate::interceptor::listener::InlineDispatch;
    use crate::interceptor::window_list::{StaticWindowList, TargetApp, WindowSnapshotEntry};
    use crate::interceptor::workspace::fake::{terminal, FakeWorkspace};
    use crate::settings::SharedSettings;

    const PID: i32 = 500;

    #[derive(Default)]
    struct RecordingControl {
        frames: Mutex<Vec<Rect>>,
        fail: bool,
    }

    impl TargetWindowControl for RecordingControl {
        fn set_frame(&self, _target: &TargetApp, frame: Rect) -> Result<(), EngineError> {
            if self.fail {
                return Err(EngineError::ProcessControlFailed {
                    reason: "not allowed".to_string(),
                });
            }
            self.frames.lock().unwrap().push(frame);
            Ok(())
        }
    }

    fn entries(window: Rect) -> Vec<WindowSnapshotEntry> {
        vec![
            // Tab thumbnail owned by the target: too small to be the primary window.
            WindowSnapshotEntry::sample(PID, "Terminal", Rect::new(0.0, 0.0, 40.0, 40.0), 0),
            WindowSnapshotEntry::sample(PID, "Terminal", window, 1),
        ]
    }

    fn tracker(window: Rect, control: Arc<RecordingControl>) -> GeometryTracker {
        GeometryTracker::new(
            Box::new(StaticWindowList(Some(entries(window)))),
            Arc::new(FakeWorkspace::with_frontmost(Some(terminal(PID)))),
            Box::new(StaticDisplays(DisplayLayout::single(Rect::new(
                0.0, 0.0, 1440.0, 900.0,
            )))),
            Box::new(control),
        )
    }

    fn settings() -> Settings {
        Settings {
            companion_width: 250.0,
            ..Settings::default()
        }
    }

    #[test]
    fn recompute_adjusts_target_and_places_companion() {
        let control = Arc::new(RecordingControl::default());
        let t = tracker(Rect::new(50.0, 100.0, 800.0, 600.0), Arc::clone(&control));

        let placement = t.recompute(&settings()).expect("placement");
        assert_eq!(placement.rect(), Rect::new(0.0, 200.0, 250.0, 600.0));
        assert_eq!(
            *control.frames.lock().unwrap(),
            vec![Rect::new(250.0, 100.0, 800.0, 600.0)]
        );
    }

    #[test]
    fn recompute_without_adjustment_touches_nothing() {
        let control = Arc::new(RecordingControl::default());
        let t = tracker(Rect::new(250.0, 100.0, 800.0, 600.0), Arc::clone(&control));

        assert!(t.recompute(&settings()).is_some());
        assert!(t.recompute(&settings()).is_some());
        assert!(control.frames.lock().unwrap().is_empty());
    }

    #[test]
    fn control_failure_places_against_unadjusted_window() {
        let control = Arc::new(RecordingControl {
            fail: true,
            ..RecordingControl::default()
        });
        let t = tracker(Rect::new(50.0, 100.0, 800.0, 600.0), control);

        let placement = t.recompute(&settings()).expect("placement");
        assert_eq!(placement.x, 50.0 - 250.0);
    }

    #[test]
    fn snap_disabled_is_noop() {
        let control = Arc::new(RecordingControl::default());
        let t = tracker(Rect::new(50.0, 100.0, 800.0, 600.0), Arc::clone(&control));
        let off = Settings {
            snap_to_target: false,
            ..settings()
        };
        assert_eq!(t.recompute(&off), None);
        assert!(control.frames.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_target_or_window_is_noop() {
        let t = GeometryTracker::new(
            Box::new(StaticWindowList(None)),
            Arc::new(FakeWorkspace::with_frontmost(Some(terminal(PID)))),
            Box::new(StaticDisplays(DisplayLayout::single(Rect::new(
                0.0, 0.0, 1440.0, 900.0,
            )))),
            Box::new(RecordingControl::default()),
        );
        assert_eq!(t.recompute(&settings()), None);

        let t = GeometryTracker::new(
            Box::new(StaticWindowList(Some(vec![]))),
            Arc::new(FakeWorkspace::default()),
            Box::new(StaticDisplays(DisplayLayout::single(Rect::new(
                0.0, 0.0, 1440.0, 900.0,
            )))),
            Box::new(RecordingControl::default()),
        );
        assert_eq!(t.recompute(&settings()), None);
    }

    #[derive(Default)]
    struct FakeObserver {
        pid: Option<i32>,
        starts: Vec<i32>,
        stops: usize,
        fail: bool,
    }

    impl TargetObserver for FakeObserver {
        fn observed_pid(&self) -> Option<i32> {
            self.pid
        }

        fn observe(&mut self, pid: i32) -> Result<(), EngineError> {
            self.starts.push(pid);
            if self.fail {
                return Err(EngineError::ObserverCreationFailed { pid, code: -25211 });
            }
            self.pid = Some(pid);
            Ok(())
        }

        fn stop(&mut self) {
            self.pid = None;
            self.stops += 1;
        }
    }

    fn pump(workspace: Arc<FakeWorkspace>, listener: Arc<RecordingListener>) -> SnapPump {
        let tracker = GeometryTracker::new(
            Box::new(StaticWindowList(Some(entries(Rect::new(
                300.0, 100.0, 800.0, 600.0,
            ))))),
            workspace,
            Box::new(StaticDisplays(DisplayLayout::single(Rect::new(
                0.0, 0.0, 1440.0, 900.0,
            )))),
            Box::new(RecordingControl::default()),
        );
        SnapPump::new(
            tracker,
            Arc::new(SharedSettings::new(settings())),
            Arc::new(InlineDispatch),
            listener,
            Arc::new(AtomicBool::new(true)),
        )
    }

    #[test]
    fn apply_reports_placement_to_listener() {
        let listener = Arc::new(RecordingListener::default());
        let workspace = Arc::new(FakeWorkspace::with_frontmost(Some(terminal(PID))));
        let p = pump(workspace, Arc::clone(&listener));

        let placement = p.apply(SnapReason::WindowMoved).expect("applied");
        assert_eq!(listener.calls(), vec![Call::Geometry(placement)]);
    }

    #[test]
    fn supervise_follows_target_pid() {
        let listener = Arc::new(RecordingListener::default());
        let workspace = Arc::new(FakeWorkspace::with_frontmost(Some(terminal(PID))));
        let mut p = pump(Arc::clone(&workspace), Arc::clone(&listener));
        let mut observer = FakeObserver::default();

        p.supervise(&mut observer);
        p.supervise(&mut observer);
        assert_eq!(observer.starts, vec![PID]);
        // Starting observation aligns once.
        assert_eq!(listener.calls().len(), 1);

        // Relaunched with a new pid.
        *workspace.running.lock().unwrap() = Some(terminal(PID + 1));
        p.supervise(&mut observer);
        assert_eq!(observer.starts, vec![PID, PID + 1]);

        // Quit.
        *workspace.running.lock().unwrap() = None;
        p.supervise(&mut observer);
        assert_eq!(observer.pid, None);
        assert_eq!(observer.stops, 1);
    }

    #[test]
    fn failed_observer_is_not_retried_for_same_pid() {
        let listener = Arc::new(RecordingListener::default());
        let workspace = Arc::new(FakeWorkspace::with_frontmost(Some(terminal(PID))));
        let mut p = pump(Arc::clone(&workspace), Arc::clone(&listener));
        let mut observer = FakeObserver {
            fail: true,
            ..FakeObserver::default()
        };

        p.supervise(&mut observer);
        p.supervise(&mut observer);
        p.supervise(&mut observer);
        assert_eq!(observer.starts, vec![PID]);
        assert!(listener.calls().is_empty());

        // Relaunch gets one fresh attempt.
        *workspace.running.lock().unwrap() = Some(terminal(PID + 1));
        p.supervise(&mut observer);
        p.supervise(&mut observer);
        assert_eq!(observer.starts, vec![PID, PID + 1]);

        // Quit then relaunch with a reused pid also gets one.
        *workspace.running.lock().unwrap() = None;
        p.supervise(&mut observer);
        *workspace.running.lock().unwrap() = Some(terminal(PID + 1));
        p.supervise(&mut observer);
        assert_eq!(observer.starts, vec![PID, PID + 1, PID + 1]);
        assert_eq!(observer.stops, 0);
    }

    #[test]
    fn missing_display_layout_is_noop() {
        struct NoDisplays;
        impl DisplaySource for NoDisplays {
            fn layout(&self) -> Option<DisplayLayout> {
                None
            }
        }

        let control = Arc::new(RecordingControl::default());
        let t = GeometryTracker::new(
            Box::new(StaticWindowList(Some(entries(Rect::new(50.0, 100.0, 800.0, 600.0))))),
            Arc::new(FakeWorkspace::with_frontmost(Some(terminal(PID)))),
            Box::new(NoDisplays),
            Box::new(Arc::clone(&control)),
        );
        assert_eq!(t.recompute(&settings()), None);
        assert!(control.frames.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_target_reports_not_running() {
        let t = GeometryTracker::new(
            Box::new(StaticWindowList(Some(vec![]))),
            Arc::new(FakeWorkspace::default()),
            Box::new(StaticDisplays(DisplayLayout::single(Rect::new(
                0.0, 0.0, 1440.0, 900.0,
            )))),
            Box::new(RecordingControl::default()),
        );
        let err = t.running_target(&settings()).unwrap_err();
        assert_eq!(err.error_code(), "TARGET_NOT_RUNNING");
        assert_eq!(t.target_pid(&settings()), None);
    }

    #[test]
    fn run_exits_when_triggers_dropped() {
        use crate::interceptor::snap_queue::snap_channel;

        let listener = Arc::new(RecordingListener::default());
        let workspace = Arc::new(FakeWorkspace::with_frontmost(Some(terminal(PID))));
        let p = pump(workspace, Arc::clone(&listener));

        let (trigger, requests) = snap_channel();
        assert!(trigger.notify(SnapReason::WindowResized));
        drop(trigger);

        p.run(requests, Box::new(FakeObserver::default()));
        // One alignment for observer start, one for the queued request.
        assert_eq!(listener.calls().len(), 2);
    }
}
