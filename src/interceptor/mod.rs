//! Focus-aware input interception and companion-window tracking.

pub mod displays;
pub mod geometry;
pub mod injector;
pub mod keys;
pub mod listener;
pub mod shortcuts;
pub mod snap;
pub mod snap_queue;
pub mod tap_filter;
pub mod target_control;
pub mod tracker;
pub mod window_list;
pub mod workspace;

#[cfg(target_os = "macos")]
mod cf;
#[cfg(target_os = "macos")]
pub mod engine;
#[cfg(target_os = "macos")]
pub mod event_tap;
#[cfg(target_os = "macos")]
pub mod observer;

#[cfg(target_os = "macos")]
pub use engine::Engine;
pub use listener::{EngineListener, InlineDispatch, MainThreadDispatch, NoopListener};
pub use snap::CompanionPlacement;
