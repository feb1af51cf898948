//! Error types for the locator and camera screens.
//!
//! Every error stays local to the operation that raised it: callers log it,
//! show it, and degrade the affected control instead of tearing the page down.

use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Failures of the continuous position stream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackingError {
    #[error("geolocation is not available in this browser")]
    Unavailable,

    #[error("error getting location: {code} - {message}")]
    PositionError { code: u16, message: String },

    #[error("geolocation call failed: {0}")]
    Js(String),
}

impl TrackingError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, TrackingError::PositionError { code: 1, .. })
    }
}

/// Failures while driving the camera or producing the annotated photo.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("video element has no frame to capture")]
    NoVideoFrame,

    #[error("canvas error: {0}")]
    Canvas(String),

    #[error("jpeg encoding failed: {0}")]
    Encode(String),

    #[error("photo is not ready yet")]
    NotReady,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures of the persistent key-value photo store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("local storage is not available")]
    Unavailable,

    #[error("could not save photo {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("could not read local storage: {0}")]
    Read(String),

    #[error("stored photo is corrupt: {0}")]
    Corrupt(String),
}

/// Problems with the `lng`/`lat` parameters handed to the camera screen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("missing query parameter `{0}`")]
    Missing(&'static str),

    #[error("query parameter `{name}` is not a number: {value:?}")]
    NotNumeric { name: &'static str, value: String },

    #[error("query parameter `{name}` is out of range: {value}")]
    OutOfRange { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataUrlError {
    #[error("not a base64 data url")]
    MissingPrefix,

    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Best-effort text for a rejected promise or thrown JS value.
pub fn js_error_text(err: &JsValue) -> String {
    if let Some(s) = err.as_string() {
        return s;
    }
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    format!("{:?}", err)
}
