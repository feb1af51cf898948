// Page hide/restore hooks. Screens leave through full page loads, but the
// browser may keep the page in the back/forward cache and show it again.
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Event, PageTransitionEvent, Window};

/// `pagehide`/`pageshow` listeners; removed on drop.
pub struct PageLifecycle {
    window: Option<Window>,
    on_hide: Closure<dyn FnMut(Event)>,
    on_show: Closure<dyn FnMut(Event)>,
}

impl PageLifecycle {
    /// `restore` runs only for a `pageshow` coming out of the back/forward
    /// cache; the initial load is handled by mounting.
    pub fn listen(mut hide: impl FnMut() + 'static, mut restore: impl FnMut() + 'static) -> Self {
        let on_hide = Closure::wrap(Box::new(move |_e: Event| hide()) as Box<dyn FnMut(_)>);
        let on_show = Closure::wrap(Box::new(move |e: Event| {
            let persisted = e
                .dyn_ref::<PageTransitionEvent>()
                .is_some_and(|e| e.persisted());
            if persisted {
                tracing::info!("page restored from back/forward cache");
                restore();
            }
        }) as Box<dyn FnMut(_)>);

        let window = web_sys::window();
        if let Some(w) = &window {
            w.add_event_listener_with_callback("pagehide", on_hide.as_ref().unchecked_ref())
                .ok();
            w.add_event_listener_with_callback("pageshow", on_show.as_ref().unchecked_ref())
                .ok();
        }
        Self {
            window,
            on_hide,
            on_show,
        }
    }
}

impl Drop for PageLifecycle {
    fn drop(&mut self) {
        if let Some(w) = &self.window {
            let _ = w.remove_event_listener_with_callback(
                "pagehide",
                self.on_hide.as_ref().unchecked_ref(),
            );
            let _ = w.remove_event_listener_with_callback(
                "pageshow",
                self.on_show.as_ref().unchecked_ref(),
            );
        }
    }
}
