//! Core types for the element/wire graph.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of element kinds the solver understands.
///
/// Anything the host sends that is not an electrical component (stickers,
/// labels, drawn annotations) decodes to [`ElementKind::Decoration`] and is
/// ignored by the solver apart from receiving zeroed readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Resistor,
    Lightbulb,
    Led,
    Battery,
    #[serde(rename = "powersupply")]
    PowerSupply,
    Potentiometer,
    Multimeter,
    Microbit,
    #[serde(rename = "microbitbreakout")]
    MicrobitBreakout,
    #[serde(other)]
    Decoration,
}

impl ElementKind {
    /// Controller-type elements carry external pin state and do not short
    /// their own terminals together.
    pub fn is_controller(&self) -> bool {
        matches!(self, ElementKind::Microbit | ElementKind::MicrobitBreakout)
    }

    /// Whether this kind participates in the electrical graph at all.
    pub fn is_electrical(&self) -> bool {
        !matches!(self, ElementKind::Decoration)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Resistor => "resistor",
            ElementKind::Lightbulb => "lightbulb",
            ElementKind::Led => "led",
            ElementKind::Battery => "battery",
            ElementKind::PowerSupply => "powersupply",
            ElementKind::Potentiometer => "potentiometer",
            ElementKind::Multimeter => "multimeter",
            ElementKind::Microbit => "microbit",
            ElementKind::MicrobitBreakout => "microbitbreakout",
            ElementKind::Decoration => "decoration",
        };
        write!(f, "{name}")
    }
}

/// Terminal polarity for oriented elements (batteries, LEDs, meters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

/// Multimeter operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeterMode {
    #[default]
    Voltage,
    Current,
    Resistance,
}

/// LED body color. Determines the forward-voltage threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedColor {
    #[default]
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    White,
}

impl LedColor {
    /// Forward-voltage threshold in volts. The LED conducts once the
    /// anode-cathode voltage reaches this value (inclusive).
    pub fn forward_voltage(&self) -> f64 {
        match self {
            LedColor::Red | LedColor::Orange => 1.8,
            LedColor::Yellow => 2.0,
            LedColor::Green => 2.1,
            LedColor::Blue | LedColor::White => 2.8,
        }
    }
}

/// Placeholder label of a controller supply pad.
pub const RAIL_3V3: &str = "3.3V";
/// Placeholder label of a controller ground pad.
pub const RAIL_GND: &str = "GND";

/// Check whether a placeholder names a digital GPIO pin (`P0`, `P1`, ...).
pub fn is_digital_pin(placeholder: &str) -> bool {
    let mut chars = placeholder.chars();
    matches!(chars.next(), Some('P'))
        && placeholder.len() > 1
        && chars.all(|c| c.is_ascii_digit())
}
