//! # Breadboard Core
//!
//! The DC steady-state circuit solver behind the Breadboard circuit-design
//! playground.
//!
//! The host application (canvas editor, block editor, microcontroller
//! emulator) hands the solver an immutable snapshot of the board - elements
//! with their terminals, plus the wires between terminals - and receives
//! the same elements back with voltage, current, power, and meter readings
//! filled in. Those readings drive bulb glow, LED brightness, and meter
//! displays.
//!
//! ## Architecture
//!
//! - [`circuit`] - the element/wire data model, effective-node resolution
//!   (union-find over ideal wires), and subcircuit partitioning
//! - [`solver`] - source classification, MNA assembly, Gaussian
//!   elimination, the LED on/off fixed-point loop, and result extraction
//!
//! ## Simulation method
//!
//! Each galvanically isolated subcircuit is solved independently with
//! Modified Nodal Analysis:
//!
//! 1. Merge terminals joined by ideal wires into effective nodes.
//! 2. Pick a ground, classify the ideal sources (batteries, supplies,
//!    controller rails and driven-HIGH pins, meter shunts/test sources).
//! 3. Stamp conductances and sources into the `[G B; C D]` block system
//!    and solve it by Gaussian elimination with scaled partial pivoting.
//! 4. Re-stamp and re-solve while any LED's on/off state disagrees with
//!    the voltages just computed (ideal threshold diode model, capped
//!    iteration).
//!
//! A subcircuit with no sensible DC solution (singular system) reports
//! all-zero readings; nothing here returns an error to the host.
//!
//! The engine is pure and synchronous: same snapshot in, same readings
//! out, no state retained between calls.

pub mod circuit;
pub mod error;
pub mod solver;

// Re-export main types for convenience
pub use circuit::{Computed, Element, Node, PinState, Properties, Wire};
pub use error::{BreadboardError, Result};
pub use solver::solve;

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::solve_json;
