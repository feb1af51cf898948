// Rear camera stream via getUserMedia.
use js_sys::{Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{MediaStream, MediaStreamConstraints, MediaStreamTrack, MediaStreamTrackState};

use crate::error::{CaptureError, js_error_text};
use crate::state::capture::CaptureStream;

pub struct WebStream {
    stream: MediaStream,
}

impl WebStream {
    pub fn media(&self) -> &MediaStream {
        &self.stream
    }

    fn tracks(&self) -> Vec<MediaStreamTrack> {
        self.stream
            .get_tracks()
            .iter()
            .filter_map(|t| t.dyn_into::<MediaStreamTrack>().ok())
            .collect()
    }

    pub fn active_tracks(&self) -> usize {
        self.tracks()
            .iter()
            .filter(|t| t.ready_state() == MediaStreamTrackState::Live)
            .count()
    }
}

impl CaptureStream for WebStream {
    fn release(&mut self) {
        for track in self.tracks() {
            track.stop();
        }
        tracing::debug!(active = self.active_tracks(), "camera tracks stopped");
    }
}

fn constraints() -> Result<MediaStreamConstraints, JsValue> {
    let video = Object::new();
    Reflect::set(&video, &"facingMode".into(), &"environment".into())?;
    let constraints = MediaStreamConstraints::new();
    constraints.set_video(&video);
    constraints.set_audio(&JsValue::FALSE);
    Ok(constraints)
}

/// Opens the environment-facing camera, video only.
pub async fn open_rear_camera() -> Result<WebStream, CaptureError> {
    let unavailable = |e: JsValue| CaptureError::CameraUnavailable(js_error_text(&e));
    let devices = web_sys::window()
        .ok_or_else(|| CaptureError::CameraUnavailable("no window".into()))?
        .navigator()
        .media_devices()
        .map_err(unavailable)?;
    let promise = devices
        .get_user_media_with_constraints(&constraints().map_err(unavailable)?)
        .map_err(unavailable)?;
    let stream = JsFuture::from(promise)
        .await
        .map_err(unavailable)?
        .dyn_into::<MediaStream>()
        .map_err(unavailable)?;
    Ok(WebStream { stream })
}
