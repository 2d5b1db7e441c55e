//! DC steady-state MNA solver.
//!
//! One call to [`crate::solve`] runs, per subcircuit:
//!
//! 1. effective-node resolution (`circuit::equiv`)
//! 2. ground choice + source classification ([`classify`])
//! 3. MNA stamping ([`mna`]) inside the LED fixed-point loop ([`engine`])
//! 4. Gaussian elimination ([`gauss`])
//! 5. result extraction back onto the elements ([`engine`])
//!
//! All failure handling is local to a subcircuit; the entry point never
//! returns an error.

mod classify;
mod engine;
mod gauss;
mod mna;

pub use classify::{classify, Classification, NodeLayout, SourceKind, SourceStamp};
pub use engine::solve;
pub use mna::MnaSystem;

/// Hard cap on LED on/off fixed-point iterations per subcircuit.
pub const MAX_LED_ITERATIONS: usize = 8;

/// Scaled pivots below this are treated as singular.
pub const PIVOT_EPSILON: f64 = 1e-12;

/// Floor applied to user resistances to avoid infinite conductance.
pub const MIN_RESISTANCE: f64 = 1e-12;

/// Fixed filament resistance of the lightbulb element, in ohms.
pub const LIGHTBULB_RESISTANCE: f64 = 20.0;

/// On-state resistance of a conducting LED, in ohms.
pub const LED_ON_RESISTANCE: f64 = 100.0;

/// Controller supply rail voltage, in volts.
pub const RAIL_VOLTAGE: f64 = 3.3;

/// Series resistance of the controller's rail source and of each
/// driven-HIGH pin tie, in ohms.
pub const CONTROLLER_SERIES_RESISTANCE: f64 = 25.0;

/// Voltmeter input resistance, in ohms. Large enough to leave the probed
/// branch effectively unloaded.
pub const VOLTMETER_RESISTANCE: f64 = 10.0e6;

/// Ammeter shunt resistance, in ohms.
pub const AMMETER_SHUNT_RESISTANCE: f64 = 0.1;

/// Ohmmeter test-source voltage, in volts.
pub const OHMMETER_TEST_VOLTAGE: f64 = 1.0;

/// Floor for each potentiometer leg so ratio 0 and 1 stay solvable.
pub const MIN_LEG_RESISTANCE: f64 = 0.1;
