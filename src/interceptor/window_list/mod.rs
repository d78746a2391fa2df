mod resolve;
mod types;

#[cfg(target_os = "macos")]
mod query;

#[cfg(target_os = "macos")]
pub use query::CgWindowList;
pub use resolve::{primary_target_window, resolve_owner_at};
pub use types::{AppIdentity, OwnerResult, TargetApp, TargetIdentity, WindowSnapshotEntry};

/// Source of the on-screen window list, front-to-back.
///
/// Every call fetches a fresh list; window order can change between any two events, so
/// implementations must not cache. `None` means the query itself failed.
pub trait WindowListSource {
    fn snapshot(&self) -> Option<Vec<WindowSnapshotEntry>>;
}

impl<T: WindowListSource + ?Sized> WindowListSource for std::sync::Arc<T> {
    fn snapshot(&self) -> Option<Vec<WindowSnapshotEntry>> {
        (**self).snapshot()
    }
}

/// A fixed list, handy for tests and for replaying a captured snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticWindowList(pub Option<Vec<WindowSnapshotEntry>>);

impl WindowListSource for StaticWindowList {
    fn snapshot(&self) -> Option<Vec<WindowSnapshotEntry>> {
        self.0.clone()
    }
}
