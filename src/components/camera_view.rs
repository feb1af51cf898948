use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlVideoElement;
use yew::prelude::*;

use crate::config::AppConfig;
use crate::error::{CaptureError, StorageError};
use crate::model::{NavCoords, PhotoRecord};
use crate::platform::{PageLifecycle, WebStream, frame, nav, open_rear_camera};
use crate::state::capture::Ticket;
use crate::state::{CaptureEvent, CaptureHost, CaptureSession, CaptureView, Phase, ShutterMode};
use crate::storage::{LocalStoragePhotoStore, PhotoStore};

type Session = CaptureSession<WebStream>;

/// Feeds events into the session and publishes the resulting view.
#[derive(Clone)]
struct Driver {
    session: Rc<RefCell<Session>>,
    video: NodeRef,
    config: Rc<AppConfig>,
    view: UseStateSetter<CaptureView>,
}

impl Driver {
    fn send(&self, event: CaptureEvent<WebStream>) {
        let mut host = WebCaptureHost {
            driver: self.clone(),
        };
        let mut session = self.session.borrow_mut();
        session.dispatch(&mut host, event);
        self.sync_video(session.phase());
        self.view.set(session.view());
    }

    /// Binds the live stream to the video element, or unbinds it when the
    /// session is not live.
    fn sync_video(&self, phase: &Phase<WebStream>) {
        let Some(video) = self.video.cast::<HtmlVideoElement>() else {
            return;
        };
        match phase {
            Phase::Live(stream) => {
                if video.src_object().as_ref() != Some(stream.media()) {
                    video.set_muted(true);
                    video.set_autoplay(true);
                    let _ = video.set_attribute("playsinline", "");
                    video.set_src_object(Some(stream.media()));
                    let _ = video.play();
                }
            }
            _ => {
                if video.src_object().is_some() {
                    video.set_src_object(None);
                }
            }
        }
    }
}

struct WebCaptureHost {
    driver: Driver,
}

impl CaptureHost for WebCaptureHost {
    type Stream = WebStream;

    fn request_stream(&mut self, ticket: Ticket) {
        let driver = self.driver.clone();
        spawn_local(async move {
            let result = open_rear_camera().await;
            driver.send(CaptureEvent::StreamReady { ticket, result });
        });
    }

    fn grab_frame(
        &mut self,
        _stream: &WebStream,
        label: &str,
        ticket: Ticket,
    ) -> Result<(), CaptureError> {
        let video = self
            .driver
            .video
            .cast::<HtmlVideoElement>()
            .ok_or(CaptureError::NoVideoFrame)?;
        let canvas = frame::grab_annotated(&video, label, &self.driver.config.annotation)?;
        let driver = self.driver.clone();
        spawn_local(async move {
            let result = frame::encode_jpeg(canvas).await;
            driver.send(CaptureEvent::Encoded { ticket, result });
        });
        Ok(())
    }

    fn persist(&mut self, record: &PhotoRecord) -> Result<(), StorageError> {
        LocalStoragePhotoStore::open()?.put(record)
    }

    fn navigate_home(&mut self) {
        nav::go_home();
    }
}

#[derive(Properties, PartialEq, Clone)]
pub struct CaptureScreenProps {
    pub coords: NavCoords,
}

#[function_component(CaptureScreen)]
pub fn capture_screen(props: &CaptureScreenProps) -> Html {
    let config = use_context::<Rc<AppConfig>>().unwrap_or_default();
    let video_ref = use_node_ref();
    let session = use_mut_ref(|| Session::new(props.coords.clone()));
    let view = use_state(|| session.borrow().view());

    let driver = Driver {
        session: session.clone(),
        video: video_ref.clone(),
        config,
        view: view.setter(),
    };

    // Mount: open the camera; release it when the page is hidden or the
    // screen unmounts, reopen it when a cached page is shown again
    {
        let driver = driver.clone();
        use_effect_with((), move |_| {
            driver.send(CaptureEvent::Start);

            let lifecycle = {
                let on_hide = driver.clone();
                let on_restore = driver.clone();
                PageLifecycle::listen(
                    move || {
                        let mut session = on_hide.session.borrow_mut();
                        session.shutdown();
                        on_hide.sync_video(session.phase());
                        on_hide.view.set(session.view());
                    },
                    move || on_restore.send(CaptureEvent::Resume),
                )
            };

            move || {
                drop(lifecycle);
                driver.session.borrow_mut().shutdown();
            }
        });
    }

    let on_shutter = {
        let driver = driver.clone();
        Callback::from(move |_: MouseEvent| driver.send(CaptureEvent::Shutter))
    };
    let on_save = {
        let driver = driver.clone();
        Callback::from(move |_: MouseEvent| driver.send(CaptureEvent::Save))
    };
    let on_return = {
        let driver = driver.clone();
        Callback::from(move |_: MouseEvent| driver.send(CaptureEvent::Return))
    };

    let video_style = if view.show_live {
        "display:block; width:100%; height:100%; object-fit:cover;"
    } else {
        "display:none;"
    };
    let photo = match (&view.photo, view.show_live) {
        (Some(ready), false) => html! {
            <img
                id="photo"
                src={ready.data_url.to_string()}
                width={ready.photo.width.to_string()}
                height={ready.photo.height.to_string()}
                alt="Captured photo"
                style="display:block;"
            />
        },
        _ => html! {},
    };
    let error = match &view.error {
        Some(msg) => html! {
            <div style="position:absolute; top:12px; left:12px; right:12px; background:rgba(248,81,73,0.9); color:#fff; border-radius:8px; padding:8px 12px; font-size:13px;">{ msg.clone() }</div>
        },
        None => html! {},
    };
    let (shutter_icon, shutter_label) = match view.shutter {
        ShutterMode::Reset => ("▶", "Back to camera"),
        _ => ("⏸", "Take photo"),
    };

    html! {
        <div style="position:relative; width:100vw; height:100vh; background:#000;">
            <video ref={video_ref} id="video" style={video_style}></video>
            { photo }
            { error }
            <div style="position:absolute; left:0; right:0; bottom:12px; display:flex; justify-content:space-around; align-items:center;">
                <button id="return" aria-label="Return" onclick={on_return} style="font-size:28px;">{"✖"}</button>
                <button
                    id="takePhoto"
                    aria-label={shutter_label}
                    disabled={view.shutter == ShutterMode::Disabled}
                    onclick={on_shutter}
                    style="font-size:36px;"
                >{ shutter_icon }</button>
                <button
                    id="savePhoto"
                    aria-label="Save photo"
                    disabled={!view.save_enabled}
                    onclick={on_save}
                    style="font-size:28px;"
                >{"💾"}</button>
            </div>
        </div>
    }
}

/// Camera screen entry: validates the handed-over coordinates before any
/// camera access happens.
#[function_component(CameraView)]
pub fn camera_view() -> Html {
    let coords = use_memo((), |_| nav::camera_params());
    match &*coords {
        Ok(coords) => html! { <CaptureScreen coords={coords.clone()} /> },
        Err(e) => {
            tracing::warn!(error = %e, "camera screen opened without a position");
            let on_return = Callback::from(|_: MouseEvent| nav::go_home());
            html! {
                <div style="display:flex; flex-direction:column; align-items:center; justify-content:center; gap:12px; width:100vw; height:100vh;">
                    <div>{"No position available yet. Wait for a location fix on the map before taking a photo."}</div>
                    <div style="font-size:12px; opacity:0.7;">{ e.to_string() }</div>
                    <button id="return" onclick={on_return}>{"Back to map"}</button>
                </div>
            }
        }
    }
}
