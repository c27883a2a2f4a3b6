use wasm_bindgen::prelude::*;

#[macro_use]
pub mod macros;

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod global_state;
pub mod infrastructure;
pub mod presentation;

/// Install the panic hook and the browser clock. The console logger is
/// installed by `DashboardCharts` once the page config is known.
#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();
    domain::logging::init_time_provider(Box::new(infrastructure::BrowserTimeProvider::new()));
}
