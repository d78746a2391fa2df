//! Synthetic key chords, posted from a single worker thread after a settle delay.

use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use super::keys::KeyChord;
use super::window_list::TargetApp;
use super::workspace::Workspace;
use crate::errors::InjectError;

/// Posts one key-down/key-up pair carrying only the chord's modifier.
pub trait KeyPoster: Send {
    fn post(&self, chord: KeyChord) -> Result<(), InjectError>;
}

struct Job {
    chord: KeyChord,
    delay: Duration,
    target: TargetApp,
}

/// Handle to the injector worker. Jobs run one at a time in the order scheduled, so two
/// injections never interleave. Dropping the handle drains the queue and joins the worker.
pub struct Injector {
    tx: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl Injector {
    pub fn spawn<P, Ws>(poster: P, workspace: Ws) -> Self
    where
        P: KeyPoster + 'static,
        Ws: Workspace + 'static,
    {
        let (tx, rx) = mpsc::channel::<Job>();
        let handle = thread::Builder::new()
            .name("nativetab-injector".to_string())
            .spawn(move || {
                for job in rx {
                    thread::sleep(job.delay);

                    // Focus may have moved during the delay; that doubles as cancellation.
                    if !workspace.target_is_frontmost(&job.target) {
                        debug!(
                            event = "interceptor.injector.aborted_not_frontmost",
                            chord = %job.chord.label()
                        );
                        continue;
                    }

                    match poster.post(job.chord) {
                        Ok(()) => {
                            debug!(event = "interceptor.injector.sent", chord = %job.chord.label())
                        }
                        Err(e) => debug!(
                            event = "interceptor.injector.failed",
                            chord = %job.chord.label(),
                            error = %e
                        ),
                    }
                }
            });

        match handle {
            Ok(handle) => Self {
                tx: Some(tx),
                handle: Some(handle),
            },
            Err(e) => {
                warn!(event = "interceptor.injector.spawn_failed", error = %e);
                Self {
                    tx: None,
                    handle: None,
                }
            }
        }
    }

    /// Queue `chord` to be posted after `delay` if `target` is still frontmost by then.
    /// Never blocks. Returns `false` when the worker is gone.
    pub fn schedule(&self, chord: KeyChord, delay: Duration, target: TargetApp) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        tx.send(Job {
            chord,
            delay,
            target,
        })
        .is_ok()
    }
}

impl Drop for Injector {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(target_os = "macos")]
pub use imp::CgKeyPoster;

#[cfg(target_os = "macos")]
mod imp {
    use core_graphics::event::{CGEvent, CGEventFlags, CGEventTapLocation};
    use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};

    use super::KeyPoster;
    use crate::errors::InjectError;
    use crate::interceptor::keys::{KeyChord, Modifier};

    /// Posts at the HID location so the target sees the chord as hardware input.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct CgKeyPoster;

    fn flags_for(modifier: Modifier) -> CGEventFlags {
        match modifier {
            Modifier::Command => CGEventFlags::CGEventFlagCommand,
            Modifier::Control => CGEventFlags::CGEventFlagControl,
            Modifier::Option => CGEventFlags::CGEventFlagAlternate,
        }
    }

    impl KeyPoster for CgKeyPoster {
        fn post(&self, chord: KeyChord) -> Result<(), InjectError> {
            let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
                .map_err(|()| InjectError::EventSourceFailed)?;

            let key_down = CGEvent::new_keyboard_event(source.clone(), chord.key_code, true)
                .map_err(|()| InjectError::KeyboardEventFailed {
                    keycode: chord.key_code,
                })?;
            let key_up = CGEvent::new_keyboard_event(source, chord.key_code, false).map_err(
                |()| InjectError::KeyboardEventFailed {
                    keycode: chord.key_code,
                },
            )?;

            // Replaces whatever modifiers are physically held; only the chord's one is sent.
            let flags = flags_for(chord.modifier);
            key_down.set_flags(flags);
            key_up.set_flags(flags);

            key_down.post(CGEventTapLocation::HID);
            key_up.post(CGEventTapLocation::HID);
            Ok(())
        }
    }
}
