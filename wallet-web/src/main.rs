//! Wallet Connect Widget - Leptos Frontend
//!
//! Browser entry point: installs logging, loads the widget config and mounts
//! the app. All connection logic lives in `lib-wallet`; this crate only
//! supplies the browser side of its capability traits.

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

mod app;
mod components;
mod services;
mod state;

use app::App;

#[wasm_bindgen(start)]
pub fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    // Initialize logger (also receives `tracing` events from the core crates)
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Wallet widget starting...");

    if let Err(err) = lib_core::init_config() {
        log::error!("Invalid widget configuration, using defaults: {}", err);
    }

    hide_loading_screen();

    leptos::mount::mount_to_body(|| view! { <App/> });
}

/// Hide the static loading placeholder once the bundle is running.
fn hide_loading_screen() {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        log::warn!("No document available");
        return;
    };

    let Some(loading_element) = document.get_element_by_id("leptos-loading") else {
        log::debug!("Loading element not found");
        return;
    };

    if let Some(html_element) = loading_element.dyn_ref::<HtmlElement>() {
        if let Err(e) = html_element.class_list().add_1("hidden") {
            log::warn!("Failed to hide loading screen: {:?}", e);
        }
    }
    if let Err(e) = loading_element.set_attribute("style", "display: none !important;") {
        log::warn!("Failed to set loading screen style: {:?}", e);
    }
}
