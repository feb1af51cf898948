pub mod app;
pub mod camera_view;
pub mod locator_view;
pub mod status_panel;

pub use app::{App, AppProps};
