//! Window-level listeners for gestures that can end outside the element that
//! started them.

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::MouseEvent;

/// `mouseup` anywhere in the window, detached when dropped.
pub struct PointerReleaseListener {
    callback: Closure<dyn FnMut(MouseEvent)>,
}

impl PointerReleaseListener {
    const EVENT: &'static str = "mouseup";

    /// `None` without a browser window or when the listener is refused.
    pub fn attach(on_release: impl FnMut(MouseEvent) + 'static) -> Option<Self> {
        let window = web_sys::window()?;
        let callback = Closure::<dyn FnMut(MouseEvent)>::new(on_release);
        window.add_event_listener_with_callback(Self::EVENT, callback.as_ref().unchecked_ref()).ok()?;
        Some(Self { callback })
    }
}

impl Drop for PointerReleaseListener {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            let _ = window.remove_event_listener_with_callback(Self::EVENT, self.callback.as_ref().unchecked_ref());
        }
    }
}
