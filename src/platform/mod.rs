pub mod camera;
pub mod frame;
pub mod geolocation;
pub mod leaflet;
pub mod lifecycle;
pub mod nav;

pub use camera::{WebStream, open_rear_camera};
pub use geolocation::PositionWatch;
pub use leaflet::LocatorMap;
pub use lifecycle::PageLifecycle;
