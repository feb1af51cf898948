//! Browser logging: `tracing` events go to the devtools console through
//! `tracing-wasm`, panics are forwarded to `console.error`.

use std::sync::OnceLock;

use tracing::Level;
use wasm_bindgen::JsValue;

use crate::config::LoggingConfig;

static SUBSCRIBER_SET: OnceLock<()> = OnceLock::new();
static PANIC_HOOK_SET: OnceLock<()> = OnceLock::new();

/// Unknown names fall back to `INFO`.
pub fn parse_level(level: &str) -> Level {
    level.trim().parse::<Level>().unwrap_or(Level::INFO)
}

/// Installs the global subscriber and panic hook. Safe to call more than once.
pub fn init(config: &LoggingConfig) {
    PANIC_HOOK_SET.get_or_init(|| {
        std::panic::set_hook(Box::new(|info| {
            web_sys::console::error_1(&JsValue::from_str(&info.to_string()));
        }));
    });
    SUBSCRIBER_SET.get_or_init(|| {
        let layer_config = tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(parse_level(&config.level))
            .build();
        tracing_wasm::set_as_global_default_with_config(layer_config);
    });
}
