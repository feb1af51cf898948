pub mod capture;
pub mod tracker;

pub use capture::{CaptureEvent, CaptureHost, CaptureSession, CaptureView, Phase, ShutterMode};
pub use tracker::{TrackerAction, TrackerState};
