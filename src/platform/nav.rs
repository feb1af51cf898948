// Page-to-page navigation between the locator and the camera screen.
use crate::error::{NavError, js_error_text};
use crate::model::NavCoords;

pub const HOME_PATH: &str = "/index.html";
pub const CAMERA_PATH: &str = "/camera.html";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Locator,
    Camera,
}

pub fn screen_for_path(path: &str) -> Screen {
    if path.trim_end_matches('/').ends_with("camera.html") {
        Screen::Camera
    } else {
        Screen::Locator
    }
}

pub fn current_screen() -> Screen {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .map(|p| screen_for_path(&p))
        .unwrap_or(Screen::Locator)
}

/// `encodeURIComponent`: everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`
/// is percent-encoded as UTF-8.
pub fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Form-style query decoding: `+` is a space, `%XX` a byte. Malformed
/// escapes are kept as they are.
pub fn decode_component(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hex = value.get(i + 1..i + 3).and_then(|h| u8::from_str_radix(h, 16).ok());
                if let Some(byte) = hex {
                    out.push(byte);
                    i += 3;
                    continue;
                }
                out.push(b'%');
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// First value of `name` in a `?a=1&b=2` query string.
pub fn query_param(search: &str, name: &str) -> Option<String> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(key, _)| decode_component(key) == name)
        .map(|(_, value)| decode_component(value))
}

pub fn camera_href(coords: &NavCoords) -> String {
    format!(
        "{}?lng={}&lat={}",
        CAMERA_PATH,
        encode_component(&coords.lng),
        encode_component(&coords.lat)
    )
}

/// Validates `lng`/`lat` from a query string.
pub fn coords_from_query(search: &str) -> Result<NavCoords, NavError> {
    NavCoords::from_params(query_param(search, "lng"), query_param(search, "lat"))
}

/// Reads and validates `lng`/`lat` from the current page's query string.
pub fn camera_params() -> Result<NavCoords, NavError> {
    let search = web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default();
    coords_from_query(&search)
}

/// Full page navigation; the current screen is torn down by the browser.
pub fn go(href: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(e) = window.location().set_href(href) {
        tracing::error!(error = %js_error_text(&e), href, "navigation failed");
    }
}

pub fn go_home() {
    go(HOME_PATH);
}
