pub mod errors;
pub mod interceptor;
pub mod logging;
pub mod permissions;
pub mod settings;

#[cfg(target_os = "macos")]
mod companion;
#[cfg(target_os = "macos")]
mod hotkey;
#[cfg(target_os = "macos")]
mod shell;

#[cfg(target_os = "macos")]
pub use shell::run;
