use tauri::{AppHandle, Manager, WebviewWindow};

use crate::interceptor::CompanionPlacement;

const COMPANION_LABEL: &str = "main";

pub fn companion_label() -> &'static str {
    COMPANION_LABEL
}

fn companion_window(app: &AppHandle) -> Result<WebviewWindow, String> {
    app.get_webview_window(COMPANION_LABEL)
        .ok_or_else(|| "companion window missing".to_string())
}

/// Set the companion's frame in Cocoa coordinates. Main thread only.
pub fn apply_placement(app: &AppHandle, placement: CompanionPlacement) -> Result<(), String> {
    use objc2_app_kit::NSWindow;
    use objc2_foundation::{NSPoint, NSRect, NSSize};

    let window = companion_window(app)?;
    let ns_window = window.ns_window().map_err(|err| err.to_string())?;
    if ns_window.is_null() {
        return Err("companion has no NSWindow".to_string());
    }

    let frame = NSRect::new(
        NSPoint::new(placement.x, placement.y),
        NSSize::new(placement.width, placement.height),
    );
    // SAFETY: the pointer is the live NSWindow behind `window`, and callers are on the
    // main thread (MainThreadDispatch or a Tauri main-thread callback).
    unsafe {
        let ns_window = &*(ns_window as *const NSWindow);
        ns_window.setFrame_display(frame, true);
    }
    Ok(())
}

/// Bring the companion forward and give it keyboard focus.
pub fn bring_forward(app: &AppHandle) -> Result<(), String> {
    let window = companion_window(app)?;
    window.unminimize().map_err(|err| err.to_string())?;
    window.show().map_err(|err| err.to_string())?;
    window.set_focus().map_err(|err| err.to_string())?;
    Ok(())
}
