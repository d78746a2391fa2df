//! System-wide pointer tap on a dedicated CFRunLoop thread.
//!
//! Every left-down, left-up and right-down goes through `TapFilter` in delivery order.
//! Injections are handed to the injector worker so the tap callback never sleeps.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop, CFRunLoopRunResult};
use core_graphics::event::{
    CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType,
    EventField,
};
use tracing::{debug, warn};

use super::injector::Injector;
use super::listener::EngineListener;
use super::tap_filter::{Injection, TapDecision, TapEvent, TapEventKind, TapFilter};
use super::window_list::WindowListSource;
use super::workspace::Workspace;
use crate::errors::EngineError;
use crate::settings::SettingsSource;

/// Everything the tap thread owns.
pub struct TapContext<W, Ws> {
    pub filter: TapFilter<W, Ws>,
    pub injector: Injector,
    pub settings: Arc<dyn SettingsSource>,
    pub listener: Arc<dyn EngineListener>,
}

pub struct EventTap {
    running: Arc<AtomicBool>,
    run_loop: Arc<Mutex<Option<CFRunLoop>>>,
    handle: Option<JoinHandle<()>>,
}

impl EventTap {
    /// Create the tap on a background thread. Fails when the tap cannot be created,
    /// which almost always means accessibility trust is missing.
    pub fn start<W, Ws>(context: TapContext<W, Ws>) -> Result<Self, EngineError>
    where
        W: WindowListSource + Send + 'static,
        Ws: Workspace + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);
        let (setup_tx, setup_rx) = mpsc::channel::<Result<(), EngineError>>();
        let run_loop_holder: Arc<Mutex<Option<CFRunLoop>>> = Arc::new(Mutex::new(None));
        let run_loop_clone = Arc::clone(&run_loop_holder);

        let handle = thread::Builder::new()
            .name("nativetab-event-tap".to_string())
            .spawn(move || {
                Self::run_event_loop(context, running_clone, setup_tx, run_loop_clone);
            })
            .map_err(|_| EngineError::TapCreationFailed)?;

        match setup_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(())) => Ok(Self {
                running,
                run_loop: run_loop_holder,
                handle: Some(handle),
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(EngineError::SetupTimeout {
                component: "event tap",
            }),
        }
    }

    fn run_event_loop<W, Ws>(
        context: TapContext<W, Ws>,
        running: Arc<AtomicBool>,
        setup_tx: Sender<Result<(), EngineError>>,
        run_loop_holder: Arc<Mutex<Option<CFRunLoop>>>,
    ) where
        W: WindowListSource,
        Ws: Workspace,
    {
        let TapContext {
            filter,
            injector,
            settings,
            listener,
        } = context;
        let filter = RefCell::new(filter);
        let disabled = Arc::new(AtomicBool::new(false));
        let disabled_clone = Arc::clone(&disabled);

        let events_of_interest = vec![
            CGEventType::LeftMouseDown,
            CGEventType::LeftMouseUp,
            CGEventType::RightMouseDown,
        ];

        let tap_result = CGEventTap::new(
            CGEventTapLocation::Session,
            CGEventTapPlacement::HeadInsertEventTap,
            CGEventTapOptions::Default,
            events_of_interest,
            move |_proxy, event_type, event| {
                let kind = match event_type {
                    CGEventType::LeftMouseDown => TapEventKind::PointerDown,
                    CGEventType::LeftMouseUp => TapEventKind::PointerUp,
                    CGEventType::RightMouseDown => TapEventKind::SecondaryPointerDown,
                    CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
                        disabled_clone.store(true, Ordering::SeqCst);
                        return None;
                    }
                    _ => return None,
                };

                let location = event.location();
                let click_count = event.get_integer_value_field(EventField::MOUSE_EVENT_CLICK_STATE);
                let tap_event = TapEvent::new(kind, location.x, location.y, click_count);

                let settings = settings.current();
                let Ok(mut filter) = filter.try_borrow_mut() else {
                    return None;
                };
                let outcome = filter.handle(&tap_event, &settings);

                if let Some(injection) = outcome.inject {
                    if injection == Injection::Copy {
                        listener.on_drag_selection_detected();
                    }
                    injector.schedule(
                        injection.chord(),
                        settings.settle_delay(),
                        settings.target.clone(),
                    );
                }

                if outcome.decision == TapDecision::Swallow {
                    // Taps can only keep or replace an event; a Null event is dropped.
                    event.set_type(CGEventType::Null);
                }
                None
            },
        );

        let tap = match tap_result {
            Ok(tap) => tap,
            Err(()) => {
                let _ = setup_tx.send(Err(EngineError::TapCreationFailed));
                return;
            }
        };

        let loop_source = match tap.mach_port.create_runloop_source(0) {
            Ok(source) => source,
            Err(()) => {
                let _ = setup_tx.send(Err(EngineError::RunLoopSourceFailed {
                    component: "event tap",
                }));
                return;
            }
        };

        let current_run_loop = CFRunLoop::get_current();
        if let Ok(mut holder) = run_loop_holder.lock() {
            *holder = Some(current_run_loop.clone());
        }

        unsafe {
            current_run_loop.add_source(&loop_source, kCFRunLoopCommonModes);
        }
        tap.enable();
        let _ = setup_tx.send(Ok(()));
        debug!(event = "interceptor.tap.started");

        // kCFRunLoopCommonModes is only valid for adding sources, not for running.
        while running.load(Ordering::SeqCst) {
            let result = unsafe {
                CFRunLoop::run_in_mode(kCFRunLoopDefaultMode, Duration::from_millis(100), true)
            };
            if result == CFRunLoopRunResult::Stopped {
                break;
            }
            if disabled.swap(false, Ordering::SeqCst) {
                warn!(event = "interceptor.tap.reenabled");
                tap.enable();
            }
        }

        unsafe {
            current_run_loop.remove_source(&loop_source, kCFRunLoopCommonModes);
        }
        debug!(event = "interceptor.tap.stopped");
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Ok(holder) = self.run_loop.lock() {
            if let Some(ref run_loop) = *holder {
                run_loop.stop();
            }
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for EventTap {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::injector::CgKeyPoster;
    use crate::interceptor::listener::NoopListener;
    use crate::interceptor::window_list::CgWindowList;
    use crate::interceptor::workspace::MacWorkspace;
    use crate::settings::{Settings, SharedSettings};

    #[test]
    fn event_tap_starts_and_stops() {
        let context = TapContext {
            filter: TapFilter::new(CgWindowList, MacWorkspace),
            injector: Injector::spawn(CgKeyPoster, MacWorkspace),
            settings: Arc::new(SharedSettings::new(Settings::default())),
            listener: Arc::new(NoopListener),
        };

        // May fail without accessibility permissions; that must be an error, not a panic.
        match EventTap::start(context) {
            Ok(mut tap) => {
                assert!(tap.is_running());
                tap.stop();
                assert!(!tap.is_running());
            }
            Err(e) => {
                println!("Event tap could not start (expected without permissions): {e}");
                assert!(matches!(
                    e,
                    EngineError::TapCreationFailed
                        | EngineError::RunLoopSourceFailed { .. }
                        | EngineError::SetupTimeout { .. }
                ));
            }
        }
    }
}
