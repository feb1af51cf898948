// Position tracker state driven by the location stream.
use std::rc::Rc;

use tracing::{debug, warn};
use yew::Reducible;

use crate::error::TrackingError;
use crate::model::{FALLBACK_POSITION, NavCoords, Position};

#[derive(Clone, Debug, PartialEq)]
pub struct TrackerState {
    /// Latest reading, or the fallback until one arrives.
    pub position: Position,
    /// Has a real reading been observed yet? Gates the camera control.
    pub has_fix: bool,
    pub last_error: Option<TrackingError>,
    /// Bumped on every reading, including repeats; map sync keys on it.
    pub version: u64,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            position: FALLBACK_POSITION,
            has_fix: false,
            last_error: None,
            version: 0,
        }
    }
}

impl TrackerState {
    pub fn camera_enabled(&self) -> bool {
        self.has_fix
    }

    /// Coordinates for the camera screen; `None` until the first fix.
    pub fn handoff(&self) -> Option<NavCoords> {
        self.has_fix.then(|| NavCoords::from_position(&self.position))
    }
}

#[derive(Clone, Debug)]
pub enum TrackerAction {
    Fix(Position),
    Failed(TrackingError),
}

impl Reducible for TrackerState {
    type Action = TrackerAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut new = (*self).clone();
        match action {
            TrackerAction::Fix(pos) => {
                debug!(lat = pos.latitude, lng = pos.longitude, "got new coordinates");
                new.position = pos;
                new.has_fix = true;
                new.last_error = None;
                new.version = new.version.wrapping_add(1);
            }
            TrackerAction::Failed(err) => {
                warn!(error = %err, "location stream error");
                new.last_error = Some(err);
            }
        }
        Rc::new(new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(lat: f64, lng: f64) -> Position {
        Position {
            latitude: lat,
            longitude: lng,
            altitude: None,
            accuracy: Some(12.0),
            heading: None,
            speed: None,
        }
    }

    #[test]
    fn starts_on_fallback_with_camera_disabled() {
        let state = TrackerState::default();
        assert_eq!(state.position, FALLBACK_POSITION);
        assert!(!state.camera_enabled());
        assert_eq!(state.handoff(), None);
    }

    #[test]
    fn last_reading_wins() {
        let state = Rc::new(TrackerState::default())
            .reduce(TrackerAction::Fix(reading(1.0, 2.0)))
            .reduce(TrackerAction::Fix(reading(3.0, 4.0)));
        assert_eq!(state.position, reading(3.0, 4.0));
        assert_eq!(state.version, 2);
        assert!(state.camera_enabled());
        assert_eq!(
            state.handoff(),
            Some(NavCoords {
                lng: "4".into(),
                lat: "3".into()
            })
        );
    }

    #[test]
    fn repeated_reading_still_bumps_version() {
        let once = Rc::new(TrackerState::default()).reduce(TrackerAction::Fix(reading(1.0, 2.0)));
        let twice = once.clone().reduce(TrackerAction::Fix(reading(1.0, 2.0)));
        assert_eq!(once.position, twice.position);
        assert_ne!(once.version, twice.version);
    }

    #[test]
    fn errors_do_not_bump_version() {
        let state = Rc::new(TrackerState::default())
            .reduce(TrackerAction::Fix(reading(1.0, 2.0)))
            .reduce(TrackerAction::Failed(TrackingError::Unavailable));
        assert_eq!(state.version, 1);
    }

    #[test]
    fn errors_do_not_clear_a_fix() {
        let state = Rc::new(TrackerState::default())
            .reduce(TrackerAction::Fix(reading(1.0, 2.0)))
            .reduce(TrackerAction::Failed(TrackingError::PositionError {
                code: 3,
                message: "Timeout expired".into(),
            }));
        assert!(state.has_fix);
        assert_eq!(state.position, reading(1.0, 2.0));
        assert!(state.last_error.is_some());
    }

    #[test]
    fn denied_permission_keeps_camera_disabled() {
        let state = Rc::new(TrackerState::default()).reduce(TrackerAction::Failed(
            TrackingError::PositionError {
                code: 1,
                message: "User denied Geolocation".into(),
            },
        ));
        assert!(!state.camera_enabled());
        assert_eq!(state.position, FALLBACK_POSITION);
    }
}
