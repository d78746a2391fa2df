use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Handle to the installed log filter. The debug flag is re-read from settings at
/// runtime, so the level can be switched without restarting.
#[derive(Clone)]
pub struct LogHandle {
    filter: Option<reload::Handle<EnvFilter, Registry>>,
}

fn filter_for(debug: bool) -> EnvFilter {
    // Without debug mode we force `info` so a stray RUST_LOG cannot turn on the per-click
    // diagnostics.
    if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    }
}

/// Initialise logging. Returns a handle even when a subscriber was already installed
/// (tests, embedding); that handle's `set_debug` is then a no-op.
pub fn init(debug: bool) -> LogHandle {
    let (filter, handle) = reload::Layer::new(filter_for(debug));
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .is_ok();

    LogHandle {
        filter: installed.then_some(handle),
    }
}

impl LogHandle {
    pub fn set_debug(&self, debug: bool) {
        let Some(filter) = &self.filter else {
            return;
        };
        if let Err(e) = filter.reload(filter_for(debug)) {
            tracing::warn!(event = "logging.reload_failed", error = %e);
        } else {
            // `debug` as a field value collides with `tracing::field::debug`.
            let enabled = debug;
            tracing::debug!(event = "logging.level_changed", enabled);
        }
    }

    pub fn is_installed(&self) -> bool {
        self.filter.is_some()
    }
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle")
            .field("installed", &self.is_installed())
            .finish()
    }
}
