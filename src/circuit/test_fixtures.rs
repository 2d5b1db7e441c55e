//! Element constructors shared by unit tests across modules.

use std::collections::HashMap;

use super::element::{Computed, Element, Node, PinState, Properties, Wire};
use super::types::{ElementKind, LedColor, MeterMode, Polarity};

pub fn node(id: &str, parent: &str) -> Node {
    Node {
        id: id.to_string(),
        parent_id: parent.to_string(),
        polarity: None,
        placeholder: None,
    }
}

pub fn polarized(id: &str, parent: &str, polarity: Polarity) -> Node {
    Node {
        polarity: Some(polarity),
        ..node(id, parent)
    }
}

pub fn labeled(id: &str, parent: &str, placeholder: &str) -> Node {
    Node {
        placeholder: Some(placeholder.to_string()),
        ..node(id, parent)
    }
}

pub fn wire(from: &str, to: &str) -> Wire {
    Wire {
        from_node_id: from.to_string(),
        to_node_id: to.to_string(),
    }
}

fn bare(id: &str, kind: ElementKind, nodes: Vec<Node>) -> Element {
    Element {
        id: id.to_string(),
        kind,
        nodes,
        properties: Properties::default(),
        controller: None,
        computed: Computed::ZERO,
    }
}

pub fn resistor(id: &str, ohms: f64) -> Element {
    let mut el = bare(
        id,
        ElementKind::Resistor,
        vec![node(&format!("{id}.0"), id), node(&format!("{id}.1"), id)],
    );
    el.properties.resistance = Some(ohms);
    el
}

pub fn lightbulb(id: &str) -> Element {
    bare(
        id,
        ElementKind::Lightbulb,
        vec![node(&format!("{id}.0"), id), node(&format!("{id}.1"), id)],
    )
}

pub fn battery(id: &str, volts: f64, internal: f64) -> Element {
    let mut el = bare(
        id,
        ElementKind::Battery,
        vec![
            polarized(&format!("{id}+"), id, Polarity::Positive),
            polarized(&format!("{id}-"), id, Polarity::Negative),
        ],
    );
    el.properties.voltage = Some(volts);
    el.properties.resistance = Some(internal);
    el
}

pub fn led(id: &str, color: LedColor) -> Element {
    let mut el = bare(
        id,
        ElementKind::Led,
        vec![
            polarized(&format!("{id}.a"), id, Polarity::Positive),
            polarized(&format!("{id}.c"), id, Polarity::Negative),
        ],
    );
    el.properties.color = Some(color);
    el
}

pub fn potentiometer(id: &str, ohms: f64, ratio: f64) -> Element {
    let mut el = bare(
        id,
        ElementKind::Potentiometer,
        vec![
            node(&format!("{id}.a"), id),
            labeled(&format!("{id}.w"), id, "Wiper"),
            node(&format!("{id}.b"), id),
        ],
    );
    el.properties.resistance = Some(ohms);
    el.properties.ratio = Some(ratio);
    el
}

pub fn multimeter(id: &str, mode: MeterMode) -> Element {
    let mut el = bare(
        id,
        ElementKind::Multimeter,
        vec![
            polarized(&format!("{id}+"), id, Polarity::Positive),
            polarized(&format!("{id}-"), id, Polarity::Negative),
        ],
    );
    el.properties.mode = Some(mode);
    el
}

/// A micro:bit with pads P0/P1/P2 plus one 3.3V and one GND pad.
/// `pins` supplies the digital state per pin placeholder.
pub fn microbit(id: &str, pins: &[(&str, u8)]) -> Element {
    let mut el = bare(
        id,
        ElementKind::Microbit,
        vec![
            labeled(&format!("{id}.P0"), id, "P0"),
            labeled(&format!("{id}.P1"), id, "P1"),
            labeled(&format!("{id}.P2"), id, "P2"),
            labeled(&format!("{id}.3.3V"), id, "3.3V"),
            labeled(&format!("{id}.GND"), id, "GND"),
        ],
    );
    el.controller = Some(
        pins.iter()
            .map(|(name, digital)| (name.to_string(), PinState { digital: *digital }))
            .collect::<HashMap<_, _>>(),
    );
    el
}

/// A breakout with many numbered pins and duplicated supply pads.
pub fn breakout(id: &str, pins: &[(&str, u8)]) -> Element {
    let mut nodes: Vec<Node> = (0..16)
        .map(|i| labeled(&format!("{id}.P{i}"), id, &format!("P{i}")))
        .collect();
    nodes.push(labeled(&format!("{id}.3.3V.0"), id, "3.3V"));
    nodes.push(labeled(&format!("{id}.3.3V.1"), id, "3.3V"));
    nodes.push(labeled(&format!("{id}.GND.0"), id, "GND"));
    nodes.push(labeled(&format!("{id}.GND.1"), id, "GND"));
    let mut el = bare(id, ElementKind::MicrobitBreakout, nodes);
    el.controller = Some(
        pins.iter()
            .map(|(name, digital)| (name.to_string(), PinState { digital: *digital }))
            .collect::<HashMap<_, _>>(),
    );
    el
}
