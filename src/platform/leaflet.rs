//! Minimal bindings to the global Leaflet (`L`) loaded by the host page,
//! plus the locator map built on top of them.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::MapConfig;
use crate::model::{PhotoRecord, Position};

#[wasm_bindgen]
extern "C" {
    pub type Map;

    #[wasm_bindgen(catch, js_namespace = L, js_name = map)]
    fn new_map(element_id: &str) -> Result<Map, JsValue>;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &Map, center: &JsValue, zoom: f64) -> Map;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_center(this: &Map, center: &JsValue) -> Map;

    #[wasm_bindgen(method, getter, js_name = zoomControl)]
    fn zoom_control(this: &Map) -> Control;

    #[wasm_bindgen(method, getter, js_name = attributionControl)]
    fn attribution_control(this: &Map) -> Control;

    #[wasm_bindgen(method, js_name = removeControl)]
    fn remove_control(this: &Map, control: &Control) -> Map;

    #[wasm_bindgen(method)]
    fn remove(this: &Map) -> Map;

    pub type Control;

    #[wasm_bindgen(method, js_name = setPosition)]
    fn set_position(this: &Control, position: &str) -> Control;

    pub type Layer;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &Layer, map: &Map) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    fn tile_layer(url: &str, options: &JsValue) -> Layer;

    #[wasm_bindgen(extends = Layer)]
    pub type Circle;

    #[wasm_bindgen(js_namespace = L, js_name = circle)]
    fn circle(center: &JsValue, options: &JsValue) -> Circle;

    #[wasm_bindgen(method, js_name = setLatLng)]
    fn set_lat_lng(this: &Circle, center: &JsValue) -> Circle;

    #[wasm_bindgen(method, js_name = setRadius)]
    fn set_radius(this: &Circle, radius: f64) -> Circle;

    #[wasm_bindgen(extends = Layer)]
    pub type Marker;

    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    fn marker(center: &JsValue) -> Marker;

    #[wasm_bindgen(method, js_name = bindPopup)]
    fn bind_popup(this: &Marker, html: &str) -> Marker;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TileOptions<'a> {
    max_zoom: f64,
    attribution: &'a str,
}

#[derive(Serialize)]
struct CircleOptions {
    radius: f64,
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&json)
}

fn lat_lng(ll: [f64; 2]) -> JsValue {
    js_sys::Array::of2(&ll[0].into(), &ll[1].into()).into()
}

pub fn is_touch_device() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    js_sys::Reflect::has(&window, &"ontouchstart".into()).unwrap_or(false)
        || window.navigator().max_touch_points() > 0
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('\'', "&#39;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// Popup body for a saved photo marker.
pub fn popup_html(data_url: &str, width_px: u32) -> String {
    format!(
        "<div class=\"popup-container\"><img src='{}' width='{}px' alt=\"Marker Image\"></div>",
        escape_attr(data_url),
        width_px
    )
}

/// The locator map: OSM tiles, an accuracy circle following the user, and
/// one marker per saved photo.
pub struct LocatorMap {
    map: Map,
    ranger: Circle,
}

impl LocatorMap {
    pub fn new(element_id: &str, config: &MapConfig, initial: &Position) -> Result<Self, JsValue> {
        let center = lat_lng(initial.lat_lng());
        let map = new_map(element_id)?;
        map.set_view(&center, config.zoom);
        if is_touch_device() {
            map.remove_control(&map.zoom_control());
        }
        map.attribution_control().set_position("bottomleft");

        tile_layer(
            &config.tile_url,
            &to_js(&TileOptions {
                max_zoom: config.max_zoom,
                attribution: &config.attribution,
            })?,
        )
        .add_to(&map);
        let ranger = circle(
            &center,
            &to_js(&CircleOptions {
                radius: config.initial_radius_m,
            })?,
        );
        ranger.add_to(&map);
        Ok(Self { map, ranger })
    }

    /// Re-centers on `pos` and moves/resizes the accuracy circle.
    pub fn follow(&self, pos: &Position) {
        let ll = lat_lng(pos.lat_lng());
        self.map.set_center(&ll);
        self.ranger.set_lat_lng(&ll);
        if let Some(acc) = pos.accuracy {
            self.ranger.set_radius(acc);
        }
    }

    pub fn add_photo_markers(&self, records: &[PhotoRecord], popup_width_px: u32) -> usize {
        let mut added = 0;
        for record in records {
            let Some(ll) = record.key.lat_lng() else {
                tracing::warn!(key = %record.key, "skipping photo with unparsable key");
                continue;
            };
            let pin = marker(&lat_lng(ll));
            pin.bind_popup(&popup_html(&record.data_url, popup_width_px));
            pin.add_to(&self.map);
            added += 1;
        }
        added
    }
}

impl Drop for LocatorMap {
    fn drop(&mut self) {
        self.map.remove();
    }
}
