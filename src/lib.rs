/// Only One Tab - Chrome extension that keeps one tab per site
/// Built with Rust + WASM

pub mod error;
pub mod url_info;
pub mod pattern;
pub mod tracking;
pub mod tab_data;
pub mod host;
pub mod storage;
pub mod registry;
pub mod operations;
pub mod controller;
pub mod messages;
pub mod chrome;
#[cfg(test)]
mod testing;

use wasm_bindgen::prelude::*;

pub use chrome::start_background;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}
