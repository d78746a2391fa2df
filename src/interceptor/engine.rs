//! Wiring of the macOS backends: tap thread, injector worker, observer and snap pump.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{info, warn};

use super::displays::CgDisplays;
use super::event_tap::{EventTap, TapContext};
use super::injector::{CgKeyPoster, Injector};
use super::listener::{EngineListener, MainThreadDispatch};
use super::observer::AxTargetObserver;
use super::snap_queue::{snap_channel, SnapReason, SnapTrigger};
use super::tap_filter::TapFilter;
use super::target_control::OsascriptControl;
use super::tracker::{GeometryTracker, SnapPump};
use super::window_list::CgWindowList;
use super::workspace::MacWorkspace;
use crate::errors::EngineError;
use crate::permissions;
use crate::settings::SettingsSource;

pub struct Engine {
    tap: EventTap,
    trigger: SnapTrigger,
    pump_running: Arc<AtomicBool>,
}

impl Engine {
    /// Start interception and tracking. Fails fast with `PermissionDenied` when the
    /// process is not trusted for accessibility.
    pub fn start(
        settings: Arc<dyn SettingsSource>,
        listener: Arc<dyn EngineListener>,
        dispatch: Arc<dyn MainThreadDispatch>,
    ) -> Result<Self, EngineError> {
        permissions::require_accessibility()?;

        let tap = EventTap::start(TapContext {
            filter: TapFilter::new(CgWindowList, MacWorkspace),
            injector: Injector::spawn(CgKeyPoster, MacWorkspace),
            settings: Arc::clone(&settings),
            listener: Arc::clone(&listener),
        })?;

        let (trigger, requests) = snap_channel();
        let tracker = GeometryTracker::new(
            Box::new(CgWindowList),
            Arc::new(MacWorkspace),
            Box::new(CgDisplays),
            Box::new(OsascriptControl),
        );
        let pump_running = Arc::new(AtomicBool::new(true));
        let pump = SnapPump::new(
            tracker,
            settings,
            dispatch,
            listener,
            Arc::clone(&pump_running),
        );
        let observer = Box::new(AxTargetObserver::new(trigger.clone()));

        // Not joined on stop: the pump may be waiting on the main thread, which is
        // usually the thread calling stop.
        thread::Builder::new()
            .name("nativetab-snap-pump".to_string())
            .spawn(move || pump.run(requests, observer))
            .map_err(|e| {
                warn!(event = "interceptor.engine.pump_spawn_failed", error = %e);
                EngineError::SetupTimeout {
                    component: "snap pump",
                }
            })?;

        info!(event = "interceptor.engine.started");
        Ok(Self {
            tap,
            trigger,
            pump_running,
        })
    }

    /// Ask for a recompute now. Returns `false` when one is already pending.
    pub fn request_snap(&self) -> bool {
        self.trigger.notify(SnapReason::Manual)
    }

    pub fn stop(&mut self) {
        self.tap.stop();
        if self.pump_running.swap(false, Ordering::SeqCst) {
            // Wake the pump so it notices promptly.
            self.trigger.notify(SnapReason::Manual);
            info!(event = "interceptor.engine.stopped");
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}
