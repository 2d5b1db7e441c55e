//! Element/wire graph snapshot supplied by the host application.
//!
//! The host sends a fresh snapshot on every solve; nothing here is retained
//! between calls. Field names follow the host's camelCase JSON schema.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{ElementKind, LedColor, MeterMode, Polarity};

/// A terminal of exactly one element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Globally unique node id
    pub id: String,
    /// Id of the owning element
    pub parent_id: String,
    /// Terminal polarity for oriented elements (battery +/-, LED anode/cathode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polarity: Option<Polarity>,
    /// Role label: `3.3V`, `GND`, `P0`, `Wiper`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// An ideal zero-resistance connection between two node ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wire {
    pub from_node_id: String,
    pub to_node_id: String,
}

/// Named numeric/enum attributes of an element.
///
/// All optional; [`Element`] accessors apply per-kind defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Properties {
    /// Resistance in ohms (resistor value, source internal resistance)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resistance: Option<f64>,
    /// Nominal EMF in volts (battery, power supply)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    /// Potentiometer wiper position in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    /// Multimeter operating mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<MeterMode>,
    /// LED body color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<LedColor>,
}

/// Externally supplied digital state of one controller pin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinState {
    /// 1 while the program drives the pin HIGH, 0 otherwise
    #[serde(default)]
    pub digital: u8,
}

/// Solver output for one element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Computed {
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    /// Meter readout; `NaN` marks an ohmmeter on a powered circuit
    pub measurement: f64,
}

impl Computed {
    /// All-zero readings, used for unsolvable or disconnected elements.
    pub const ZERO: Computed = Computed {
        voltage: 0.0,
        current: 0.0,
        power: 0.0,
        measurement: 0.0,
    };
}

/// One electrical component (or decorative item) on the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique element id
    pub id: String,
    /// Element kind; unknown kinds decode as decorations
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Ordered terminals owned by this element
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Named attributes
    #[serde(default)]
    pub properties: Properties,
    /// Digital pin states, keyed by pin placeholder (controllers only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<HashMap<String, PinState>>,
    /// Solver output, written by [`crate::solve`]
    #[serde(default)]
    pub computed: Computed,
}

/// Default resistance for resistors and potentiometers without an explicit
/// value, in ohms.
const DEFAULT_RESISTANCE: f64 = 100.0;
/// Default battery EMF in volts.
const DEFAULT_BATTERY_VOLTAGE: f64 = 9.0;
/// Default bench power supply EMF in volts.
const DEFAULT_SUPPLY_VOLTAGE: f64 = 5.0;

impl Element {
    /// Resistance property with the per-kind default applied.
    pub fn resistance(&self) -> f64 {
        let default = match self.kind {
            ElementKind::Battery | ElementKind::PowerSupply => 0.0,
            _ => DEFAULT_RESISTANCE,
        };
        self.properties.resistance.unwrap_or(default)
    }

    /// Source EMF with the per-kind default applied.
    pub fn source_voltage(&self) -> f64 {
        let default = match self.kind {
            ElementKind::Battery => DEFAULT_BATTERY_VOLTAGE,
            ElementKind::PowerSupply => DEFAULT_SUPPLY_VOLTAGE,
            _ => 0.0,
        };
        self.properties.voltage.unwrap_or(default)
    }

    /// Potentiometer wiper position, clamped to [0, 1].
    pub fn ratio(&self) -> f64 {
        self.properties.ratio.unwrap_or(0.5).clamp(0.0, 1.0)
    }

    /// Multimeter mode (defaults to voltage).
    pub fn meter_mode(&self) -> MeterMode {
        self.properties.mode.unwrap_or_default()
    }

    /// LED color (defaults to red).
    pub fn led_color(&self) -> LedColor {
        self.properties.color.unwrap_or_default()
    }

    /// First terminal with the given polarity.
    pub fn terminal_by_polarity(&self, polarity: Polarity) -> Option<&Node> {
        self.nodes.iter().find(|n| n.polarity == Some(polarity))
    }

    /// The (positive, negative) terminal pair for two-terminal oriented
    /// elements. Falls back to declaration order when polarity labels are
    /// missing. Returns `None` for elements with fewer than two terminals.
    pub fn oriented_pair(&self) -> Option<(&Node, &Node)> {
        if self.nodes.len() < 2 {
            return None;
        }
        match (
            self.terminal_by_polarity(Polarity::Positive),
            self.terminal_by_polarity(Polarity::Negative),
        ) {
            (Some(pos), Some(neg)) => Some((pos, neg)),
            _ => Some((&self.nodes[0], &self.nodes[1])),
        }
    }

    /// The (a, wiper, b) terminal triple of a potentiometer. The wiper is
    /// located by its placeholder, falling back to the middle terminal.
    pub fn wiper_split(&self) -> Option<(&Node, &Node, &Node)> {
        if self.nodes.len() < 3 {
            return None;
        }
        let wiper_idx = self
            .nodes
            .iter()
            .position(|n| n.placeholder.as_deref() == Some("Wiper"))
            .unwrap_or(1);
        let mut ends = (0..self.nodes.len()).filter(|&i| i != wiper_idx);
        let a = ends.next()?;
        let b = ends.next()?;
        Some((&self.nodes[a], &self.nodes[wiper_idx], &self.nodes[b]))
    }

    /// Terminals carrying the given placeholder label.
    pub fn terminals_with_placeholder<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = &'a Node> {
        self.nodes
            .iter()
            .filter(move |n| n.placeholder.as_deref() == Some(label))
    }

    /// Whether the controller currently drives the named pin HIGH.
    pub fn pin_is_high(&self, placeholder: &str) -> bool {
        self.controller
            .as_ref()
            .and_then(|pins| pins.get(placeholder))
            .map(|pin| pin.digital == 1)
            .unwrap_or(false)
    }
}
