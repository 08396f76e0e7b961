use wasm_bindgen::prelude::*;

use crate::domain::logging::{LogComponent, get_logger};

pub mod app;
pub mod application;
pub mod domain;
pub mod event_utils;
pub mod global_state;
pub mod infrastructure;
pub mod macros;
pub mod presentation;
pub mod time_utils;

/// Initialize logging and mount the terminal
#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();

    // Initialize logger with infrastructure implementation
    let console_logger = Box::new(infrastructure::services::ConsoleLogger::new_development());
    domain::logging::init_logger(console_logger);

    // Initialize time provider with browser implementation
    let browser_time_provider = Box::new(infrastructure::services::BrowserTimeProvider::new());
    domain::logging::init_time_provider(browser_time_provider);

    get_logger().info(LogComponent::Presentation("Initialize"), "🚀 Price panes initialized");

    leptos::mount_to_body(app::App);
}
