//! tarot-lumina Web Frontend
//!
//! Leptos-based WASM frontend: coin balance display with animated
//! reconciliation, plus thin bindings to the reading and checkout APIs.

mod api;
mod app;
mod coins;
mod components;

pub use app::App;
pub use coins::{step_interval_ms, CoinAnimation};

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
