// Continuous position stream (navigator.geolocation.watchPosition).
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Geolocation, GeolocationPosition, GeolocationPositionError, PositionOptions};
use yew::Callback;

use crate::config::TrackingConfig;
use crate::error::{TrackingError, js_error_text};
use crate::model::Position;

/// An active `watchPosition` subscription. Dropping it clears the watch.
pub struct PositionWatch {
    geolocation: Geolocation,
    watch_id: Option<i32>,
    _on_update: Closure<dyn FnMut(GeolocationPosition)>,
    _on_error: Closure<dyn FnMut(GeolocationPositionError)>,
}

fn geolocation() -> Result<Geolocation, TrackingError> {
    let navigator = web_sys::window()
        .ok_or(TrackingError::Unavailable)?
        .navigator();
    let present = js_sys::Reflect::has(&navigator, &"geolocation".into()).unwrap_or(false);
    if !present {
        return Err(TrackingError::Unavailable);
    }
    navigator
        .geolocation()
        .map_err(|e| TrackingError::Js(js_error_text(&e)))
}

/// `NaN` and missing values both mean "no reading" for optional fields.
fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

pub fn position_from_js(pos: &GeolocationPosition) -> Position {
    let c = pos.coords();
    Position {
        latitude: c.latitude(),
        longitude: c.longitude(),
        altitude: finite(c.altitude()),
        accuracy: finite(Some(c.accuracy())),
        heading: finite(c.heading()),
        speed: finite(c.speed()),
    }
}

impl PositionWatch {
    pub fn start(
        config: &TrackingConfig,
        on_update: Callback<Position>,
        on_error: Callback<TrackingError>,
    ) -> Result<Self, TrackingError> {
        let geolocation = geolocation()?;

        let update_cb = Closure::wrap(Box::new(move |pos: GeolocationPosition| {
            on_update.emit(position_from_js(&pos));
        }) as Box<dyn FnMut(_)>);
        let error_cb = Closure::wrap(Box::new(move |err: GeolocationPositionError| {
            on_error.emit(TrackingError::PositionError {
                code: err.code(),
                message: err.message(),
            });
        }) as Box<dyn FnMut(_)>);

        let options = PositionOptions::new();
        options.set_enable_high_accuracy(config.high_accuracy);
        options.set_timeout(config.timeout_ms);
        options.set_maximum_age(config.maximum_age_ms);

        let watch_id = geolocation.watch_position_with_error_callback_and_options(
            update_cb.as_ref().unchecked_ref(),
            Some(error_cb.as_ref().unchecked_ref()),
            &options,
        );
        tracing::info!(watch_id, "position tracking started");

        Ok(Self {
            geolocation,
            watch_id: Some(watch_id),
            _on_update: update_cb,
            _on_error: error_cb,
        })
    }

    /// Cancels the subscription. A second call does nothing.
    pub fn stop(&mut self) {
        if let Some(id) = self.watch_id.take() {
            self.geolocation.clear_watch(id);
            tracing::info!(watch_id = id, "position tracking stopped");
        }
    }
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        self.stop();
    }
}
