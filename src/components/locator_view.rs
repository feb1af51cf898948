use std::cell::RefCell;
use std::rc::Rc;

use tracing::{error, info, warn};
use yew::prelude::*;

use super::status_panel::StatusPanel;
use crate::config::AppConfig;
use crate::error::js_error_text;
use crate::model::FALLBACK_POSITION;
use crate::platform::{LocatorMap, PageLifecycle, PositionWatch, nav};
use crate::state::{TrackerAction, TrackerState};
use crate::storage::{LocalStoragePhotoStore, PhotoStore};

const MAP_ELEMENT_ID: &str = "map";

#[function_component(LocatorView)]
pub fn locator_view() -> Html {
    let config = use_context::<Rc<AppConfig>>().unwrap_or_default();
    let tracker = use_reducer(TrackerState::default);
    let map = use_mut_ref(|| None::<LocatorMap>);

    // Mount: map, saved photo markers, position watch
    {
        let tracker = tracker.clone();
        let map = map.clone();
        let config = config.clone();
        use_effect_with((), move |_| {
            match LocatorMap::new(MAP_ELEMENT_ID, &config.map, &FALLBACK_POSITION) {
                Ok(m) => {
                    match LocalStoragePhotoStore::open().and_then(|s| s.list()) {
                        Ok(records) => {
                            let placed = m.add_photo_markers(&records, config.map.popup_width_px);
                            info!(placed, "photo markers placed");
                        }
                        Err(e) => warn!(error = %e, "could not read saved photos"),
                    }
                    *map.borrow_mut() = Some(m);
                }
                Err(e) => error!(error = %js_error_text(&e), "map init failed"),
            }

            let start_watch = {
                let tracker = tracker.clone();
                let tracking = config.tracking.clone();
                move || {
                    let on_update = {
                        let tracker = tracker.clone();
                        Callback::from(move |pos| tracker.dispatch(TrackerAction::Fix(pos)))
                    };
                    let on_error = {
                        let tracker = tracker.clone();
                        Callback::from(move |err| tracker.dispatch(TrackerAction::Failed(err)))
                    };
                    match PositionWatch::start(&tracking, on_update, on_error.clone()) {
                        Ok(w) => Some(w),
                        Err(e) => {
                            on_error.emit(e);
                            None
                        }
                    }
                }
            };
            let watch = Rc::new(RefCell::new(start_watch()));

            // Page navigation does not unmount the app, so stop when the page
            // is hidden and resume if the browser shows it again from cache.
            let lifecycle = {
                let on_hide = watch.clone();
                let on_restore = watch.clone();
                PageLifecycle::listen(
                    move || {
                        on_hide.borrow_mut().take();
                    },
                    move || {
                        let mut slot = on_restore.borrow_mut();
                        if slot.is_none() {
                            *slot = start_watch();
                        }
                    },
                )
            };

            move || {
                drop(lifecycle);
                watch.borrow_mut().take();
                map.borrow_mut().take();
            }
        });
    }

    // Re-center on every reading, even one equal to the last
    {
        let map = map.clone();
        let position = tracker.position;
        use_effect_with(tracker.version, move |_| {
            if let Some(m) = &*map.borrow() {
                m.follow(&position);
            }
            || ()
        });
    }

    let open_camera = {
        let tracker = tracker.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some(coords) = tracker.handoff() {
                nav::go(&nav::camera_href(&coords));
            }
        })
    };

    let notice = match (&tracker.last_error, tracker.has_fix) {
        (Some(e), false) => {
            let text = if e.is_permission_denied() {
                "Location permission denied. Allow location access and reload.".to_string()
            } else {
                format!("Location unavailable: {}", e)
            };
            html! { <div style="font-size:12px; color:#f85149; padding:4px 12px;">{ text }</div> }
        }
        _ => html! {},
    };

    html! {
        <div style="display:flex; flex-direction:column; width:100vw; height:100vh;">
            <div id={MAP_ELEMENT_ID} style="flex:1;"></div>
            { notice }
            <div style="display:flex; align-items:center; gap:12px; padding:8px 12px; background:rgba(22,27,34,0.95); color:#e6edf3; border-top:1px solid #30363d;">
                <StatusPanel position={tracker.position} locale={config.locale} />
                <button
                    id="camera"
                    aria-label="Open camera"
                    disabled={!tracker.camera_enabled()}
                    onclick={open_camera}
                    style="font-size:28px; padding:8px 14px;"
                >{"📷"}</button>
            </div>
        </div>
    }
}
