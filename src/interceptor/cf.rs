//! Ownership guard for raw CoreFoundation pointers from Create/Copy calls.

use std::ffi::c_void;

/// RAII guard for CoreFoundation objects. Calls `CFRelease` on drop.
pub(crate) struct CfRef(*mut c_void);

impl CfRef {
    /// Take ownership of a +1 pointer. Returns `None` if null.
    pub(crate) fn wrap(ptr: *mut c_void) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(Self(ptr))
        }
    }

    pub(crate) fn as_ptr(&self) -> *mut c_void {
        self.0
    }

    /// Reinterpret as a specific CF type pointer.
    pub(crate) fn as_type<T>(&self) -> *mut T {
        self.0 as *mut T
    }
}

impl Drop for CfRef {
    fn drop(&mut self) {
        unsafe {
            core_foundation::base::CFRelease(self.0 as *const _);
        }
    }
}
