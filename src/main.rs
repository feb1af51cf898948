use std::rc::Rc;

mod annotate;
mod components;
mod config;
mod dataurl;
mod error;
mod logging;
mod model;
mod platform;
mod state;
mod storage;
mod util;

use components::{App, AppProps};
use config::AppConfig;

fn main() {
    let loaded = AppConfig::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();
    logging::init(&config.logging);
    if let Err(e) = &loaded {
        tracing::warn!(error = %e, "ignoring malformed {}", config::CONFIG_STORAGE_KEY);
    }
    tracing::info!(screen = ?platform::nav::current_screen(), "starting");

    yew::Renderer::<App>::with_props(AppProps {
        config: Rc::new(config),
    })
    .render();
}
