//! Core data models for the geotag camera.
//! Positions come from the location stream, photos are keyed by the
//! coordinate pair that was handed to the camera screen.

use serde::{Deserialize, Serialize};

use crate::dataurl;
use crate::error::NavError;

/// One reading of the location stream. Only the latest one is kept.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Decimal degrees, signed.
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above the ellipsoid.
    pub altitude: Option<f64>,
    /// Radius of the 95% confidence circle in meters.
    pub accuracy: Option<f64>,
    /// Degrees clockwise from true north.
    pub heading: Option<f64>,
    /// Meters per second.
    pub speed: Option<f64>,
}

/// Shown before the first real reading arrives so the UI is never blank.
pub const FALLBACK_POSITION: Position = Position {
    latitude: 47.406653,
    longitude: 9.744844,
    altitude: Some(440.0),
    accuracy: Some(40.0),
    heading: Some(45.0),
    speed: Some(1.8),
};

impl Position {
    pub fn lat_lng(&self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }
}

/// The coordinate pair carried from the locator to the camera screen.
///
/// Both values are kept as the exact strings that travelled in the query so
/// the annotation and the storage key reproduce them without reformatting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavCoords {
    pub lng: String,
    pub lat: String,
}

impl NavCoords {
    pub fn from_position(pos: &Position) -> Self {
        Self {
            lng: pos.longitude.to_string(),
            lat: pos.latitude.to_string(),
        }
    }

    /// Validates raw `lng`/`lat` query values. Missing, non-numeric and
    /// out-of-range values are rejected instead of leaking into keys.
    pub fn from_params(lng: Option<String>, lat: Option<String>) -> Result<Self, NavError> {
        let lng = lng.ok_or(NavError::Missing("lng"))?;
        let lat = lat.ok_or(NavError::Missing("lat"))?;
        check_degrees("lng", &lng, 180.0)?;
        check_degrees("lat", &lat, 90.0)?;
        Ok(Self { lng, lat })
    }

    /// `"<lng>,<lat>"`, burned into the photo.
    pub fn label(&self) -> String {
        format!("{},{}", self.lng, self.lat)
    }

    pub fn key(&self) -> PhotoKey {
        PhotoKey(self.label())
    }
}

fn check_degrees(name: &'static str, value: &str, limit: f64) -> Result<(), NavError> {
    let parsed: f64 = value.trim().parse().map_err(|_| NavError::NotNumeric {
        name,
        value: value.to_string(),
    })?;
    if !parsed.is_finite() {
        return Err(NavError::NotNumeric {
            name,
            value: value.to_string(),
        });
    }
    if parsed.abs() > limit {
        return Err(NavError::OutOfRange {
            name,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Storage key of a saved photo: `"<lng>,<lat>"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhotoKey(pub String);

impl PhotoKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Marker position `[lat, lng]` for a key, if it holds two finite numbers.
    pub fn lat_lng(&self) -> Option<[f64; 2]> {
        let (lng, lat) = self.0.split_once(',')?;
        let lng: f64 = lng.trim().parse().ok()?;
        let lat: f64 = lat.trim().parse().ok()?;
        (lng.is_finite() && lat.is_finite()).then_some([lat, lng])
    }
}

impl std::fmt::Display for PhotoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted photo: key plus a `data:` URL that an `<img>` can show directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoRecord {
    pub key: PhotoKey,
    pub data_url: String,
}

/// The annotated frame after JPEG encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedPhoto {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub const PHOTO_MIME: &str = "image/jpeg";

impl EncodedPhoto {
    pub fn to_data_url(&self) -> String {
        dataurl::encode(PHOTO_MIME, &self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nav_coords_keep_query_text_verbatim() {
        let coords =
            NavCoords::from_params(Some("9.744844".into()), Some("47.406653".into())).unwrap();
        assert_eq!(coords.label(), "9.744844,47.406653");
        assert_eq!(coords.key(), PhotoKey("9.744844,47.406653".into()));

        let padded =
            NavCoords::from_params(Some("9.7448440".into()), Some("47.40665300".into())).unwrap();
        assert_eq!(padded.label(), "9.7448440,47.40665300");
    }

    #[test]
    fn nav_coords_reject_missing_and_garbage() {
        assert_eq!(
            NavCoords::from_params(None, Some("47.4".into())),
            Err(NavError::Missing("lng"))
        );
        assert_eq!(
            NavCoords::from_params(Some("9.7".into()), None),
            Err(NavError::Missing("lat"))
        );
        assert_eq!(
            NavCoords::from_params(Some("undefined".into()), Some("undefined".into())),
            Err(NavError::NotNumeric {
                name: "lng",
                value: "undefined".into()
            })
        );
        assert!(matches!(
            NavCoords::from_params(Some("NaN".into()), Some("1".into())),
            Err(NavError::NotNumeric { name: "lng", .. })
        ));
        assert!(matches!(
            NavCoords::from_params(Some("9.7".into()), Some("91".into())),
            Err(NavError::OutOfRange { name: "lat", .. })
        ));
    }

    #[test]
    fn position_round_trips_through_nav_coords() {
        let coords = NavCoords::from_position(&FALLBACK_POSITION);
        assert_eq!(coords.lng, "9.744844");
        assert_eq!(coords.lat, "47.406653");
        assert_eq!(
            coords.key().lat_lng(),
            Some([FALLBACK_POSITION.latitude, FALLBACK_POSITION.longitude])
        );
    }

    #[test]
    fn photo_key_parsing_skips_foreign_keys() {
        assert_eq!(PhotoKey("gc_config".into()).lat_lng(), None);
        assert_eq!(PhotoKey("a,b".into()).lat_lng(), None);
        assert_eq!(PhotoKey("-0.5,-12.25".into()).lat_lng(), Some([-12.25, -0.5]));
    }
}
