//! Physical display frames in global top-left coordinates.

use super::geometry::Rect;

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayLayout {
    /// The display that owns the global origin (menu bar display).
    pub main: Rect,
    /// All active displays in enumeration order, `main` included.
    pub displays: Vec<Rect>,
}

impl DisplayLayout {
    pub fn single(main: Rect) -> Self {
        Self {
            main,
            displays: vec![main],
        }
    }

    /// Height used to flip into Cocoa's bottom-left space.
    pub fn primary_height(&self) -> f64 {
        self.main.height
    }
}

pub trait DisplaySource: Send + Sync {
    /// `None` when the display configuration could not be read.
    fn layout(&self) -> Option<DisplayLayout>;
}

impl<T: DisplaySource + ?Sized> DisplaySource for std::sync::Arc<T> {
    fn layout(&self) -> Option<DisplayLayout> {
        (**self).layout()
    }
}

#[derive(Debug, Clone)]
pub struct StaticDisplays(pub DisplayLayout);

impl DisplaySource for StaticDisplays {
    fn layout(&self) -> Option<DisplayLayout> {
        Some(self.0.clone())
    }
}

#[cfg(target_os = "macos")]
pub use imp::CgDisplays;

#[cfg(target_os = "macos")]
mod imp {
    use core_graphics::display::{CGDisplay, CGRect};
    use tracing::debug;

    use super::{DisplayLayout, DisplaySource};
    use crate::interceptor::geometry::Rect;

    #[derive(Debug, Default, Clone, Copy)]
    pub struct CgDisplays;

    fn to_rect(bounds: CGRect) -> Rect {
        Rect::new(
            bounds.origin.x,
            bounds.origin.y,
            bounds.size.width,
            bounds.size.height,
        )
    }

    impl DisplaySource for CgDisplays {
        fn layout(&self) -> Option<DisplayLayout> {
            let ids = match CGDisplay::active_displays() {
                Ok(ids) => ids,
                Err(code) => {
                    debug!(event = "interceptor.displays.query_failed", code);
                    return None;
                }
            };
            let main = to_rect(CGDisplay::main().bounds());
            let displays = ids
                .into_iter()
                .map(|id| to_rect(CGDisplay::new(id).bounds()))
                .collect();
            Some(DisplayLayout { main, displays })
        }
    }
}
