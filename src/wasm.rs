//! WASM bindings for Breadboard Core.
//!
//! The browser host keeps the board graph in JavaScript; the boundary is a
//! single JSON round trip per solve.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { solve_json } from 'breadboard_core';
//!
//! await init();
//!
//! const results = JSON.parse(solve_json(JSON.stringify({
//!   elements: board.elements,
//!   wires: board.wires,
//! })));
//! ```

use wasm_bindgen::prelude::*;

use serde::Deserialize;

use crate::circuit::{Element, Wire};
use crate::solver::solve;

#[derive(Deserialize)]
struct Snapshot {
    #[serde(default)]
    elements: Vec<Element>,
    #[serde(default)]
    wires: Vec<Wire>,
}

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Solve a board snapshot.
///
/// Takes `{"elements": [...], "wires": [...]}` as a JSON string and returns
/// the solved element array as JSON, `computed` records filled in.
///
/// # Errors
/// Returns a JavaScript error when the snapshot cannot be decoded; the
/// solve itself never fails.
#[wasm_bindgen]
pub fn solve_json(snapshot: &str) -> Result<String, JsValue> {
    let snapshot: Snapshot =
        serde_json::from_str(snapshot).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let results = solve(&snapshot.elements, &snapshot.wires);

    serde_json::to_string(&results).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
