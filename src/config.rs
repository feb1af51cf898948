//! Application settings.
//!
//! Everything has a default; a JSON override can be stored under
//! [`CONFIG_STORAGE_KEY`] in local storage. Missing fields fall back to the
//! defaults below.

use serde::{Deserialize, Serialize};

use crate::util::Locale;

/// Reserved local storage key; never read as a photo record.
pub const CONFIG_STORAGE_KEY: &str = "gc_config";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub high_accuracy: bool,
    pub timeout_ms: u32,
    /// Oldest cached reading the platform may hand back.
    pub maximum_age_ms: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 30_000,
            maximum_age_ms: 27_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub zoom: f64,
    pub max_zoom: f64,
    pub tile_url: String,
    pub attribution: String,
    /// Accuracy circle radius before the first reading.
    pub initial_radius_m: f64,
    pub popup_width_px: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom: 17.0,
            max_zoom: 19.0,
            tile_url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution:
                "© <a href=\"http://www.openstreetmap.org/copyright\">OpenStreetMap</a>"
                    .to_string(),
            initial_radius_m: 20.0,
            popup_width_px: 150,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub font_size_px: f64,
    pub font_family: String,
    /// Extra height of the background box above the font size.
    pub padding_px: f64,
    /// Text inset from the box's left edge and from the bottom of the frame.
    pub inset_px: f64,
    pub background: String,
    pub foreground: String,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            font_size_px: 18.0,
            font_family: "Arial".to_string(),
            padding_px: 15.0,
            inset_px: 10.0,
            background: "rgba(255, 255, 255, 0.5)".to_string(),
            foreground: "rgb(0,0,0)".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tracking: TrackingConfig,
    pub map: MapConfig,
    pub annotation: AnnotationConfig,
    pub locale: Locale,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Reads the override from local storage. No override means defaults;
    /// a malformed one is returned as an error for the caller to report.
    pub fn load() -> Result<Self, serde_json::Error> {
        let raw = web_sys::window()
            .and_then(|win| win.local_storage().ok().flatten())
            .and_then(|store| store.get_item(CONFIG_STORAGE_KEY).ok().flatten());
        match raw {
            Some(raw) => Self::from_json(&raw),
            None => Ok(Self::default()),
        }
    }
}
