//! Window server queries via `CGWindowListCopyWindowInfo`.

use std::ffi::c_void;

use core_foundation::base::{CFType, TCFType};
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_graphics::display::*;
use tracing::debug;

use super::types::WindowSnapshotEntry;
use super::WindowListSource;
use crate::interceptor::cf::CfRef;
use crate::interceptor::geometry::Rect;

/// Live window list from the window server.
///
/// Desktop elements are deliberately included: the Dock, Spotlight and other system
/// panels must be able to shadow the target window during hit testing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CgWindowList;

impl WindowListSource for CgWindowList {
    fn snapshot(&self) -> Option<Vec<WindowSnapshotEntry>> {
        let raw =
            unsafe { CGWindowListCopyWindowInfo(kCGWindowListOptionOnScreenOnly, kCGNullWindowID) };
        let Some(list) = CfRef::wrap(raw as *mut c_void) else {
            debug!(event = "interceptor.window_list.query_failed");
            return None;
        };
        let window_list = list.as_ptr();

        let count = unsafe { core_foundation::array::CFArrayGetCount(window_list as _) };
        let mut entries = Vec::with_capacity(count.max(0) as usize);

        // Front-to-back with kCGWindowListOptionOnScreenOnly.
        for i in 0..count {
            let window_dict = unsafe {
                core_foundation::array::CFArrayGetValueAtIndex(window_list as _, i)
                    as CFDictionaryRef
            };
            let dict = unsafe { CFDictionary::<CFString, CFType>::wrap_under_get_rule(window_dict) };

            let Some(bounds) = read_bounds(&dict) else {
                continue;
            };

            let owner_pid = read_i32(&dict, "kCGWindowOwnerPID").unwrap_or(0);
            let layer = read_i32(&dict, "kCGWindowLayer").unwrap_or(0);
            let owner_name = dict
                .find(CFString::new("kCGWindowOwnerName"))
                .map(|v| {
                    let s: CFString = unsafe { CFString::wrap_under_get_rule(v.as_CFTypeRef() as _) };
                    s.to_string()
                })
                .unwrap_or_default();

            entries.push(WindowSnapshotEntry {
                owner_pid,
                owner_name,
                bounds,
                z_index: entries.len(),
                layer,
            });
        }

        Some(entries)
    }
}

fn read_i32(dict: &CFDictionary<CFString, CFType>, key: &str) -> Option<i32> {
    dict.find(CFString::new(key)).and_then(|v| {
        let num: CFNumber = unsafe { CFNumber::wrap_under_get_rule(v.as_CFTypeRef() as _) };
        num.to_i32()
    })
}

fn read_bounds(dict: &CFDictionary<CFString, CFType>) -> Option<Rect> {
    let value = dict.find(CFString::new("kCGWindowBounds"))?;
    let bounds_dict: CFDictionary<CFString, CFNumber> =
        unsafe { CFDictionary::wrap_under_get_rule(value.as_CFTypeRef() as _) };

    let field = |name: &str| bounds_dict.find(CFString::new(name)).and_then(|n| n.to_f64());

    Some(Rect::new(
        field("X")?,
        field("Y")?,
        field("Width")?,
        field("Height")?,
    ))
}
