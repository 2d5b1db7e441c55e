//! Ground choice, node indexing, and source classification.
//!
//! Ideal sources have no conductance, so each one adds an auxiliary
//! current unknown to the MNA system. This module decides which elements
//! act as sources for the current subcircuit and allocates their auxiliary
//! rows, mirroring how the assembler will stamp them.

use std::collections::HashMap;

use crate::circuit::{
    is_digital_pin, EffectiveNodes, Element, ElementKind, MeterMode, RAIL_3V3, RAIL_GND,
};

use super::{AMMETER_SHUNT_RESISTANCE, CONTROLLER_SERIES_RESISTANCE, OHMMETER_TEST_VOLTAGE, RAIL_VOLTAGE};

/// Matrix position of every effective node: ground (`None`) or a 0-based
/// row/column index.
#[derive(Debug)]
pub struct NodeLayout {
    map: HashMap<String, Option<usize>>,
    /// Non-ground node count
    pub n: usize,
}

impl NodeLayout {
    /// Index the effective nodes of a subcircuit. Ground preference goes to
    /// the first effective node carrying a `GND` marker, then to the first
    /// one registered.
    pub fn new(eff: &EffectiveNodes) -> Self {
        let ground = eff
            .ground_candidate()
            .or_else(|| eff.representatives().first().map(String::as_str))
            .map(str::to_string);

        let mut map = HashMap::new();
        let mut next = 0usize;
        for rep in eff.representatives() {
            if Some(rep) == ground.as_ref() {
                map.insert(rep.clone(), None);
            } else {
                map.insert(rep.clone(), Some(next));
                next += 1;
            }
        }

        // Extend the map so any registered terminal id resolves directly
        // through its representative.
        let pairs: Vec<(String, Option<usize>)> = eff
            .terminal_ids()
            .map(|id| {
                let rep = eff.effective(id).unwrap_or(id);
                (id.to_string(), map[rep])
            })
            .collect();
        map.extend(pairs);

        Self { map, n: next }
    }

    /// Matrix index of a terminal's effective node. Outer `None` means the
    /// terminal is not part of this subcircuit; inner `None` means ground.
    pub fn index(&self, node_id: &str) -> Option<Option<usize>> {
        self.map.get(node_id).copied()
    }
}

/// What kind of source an auxiliary unknown belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Battery or bench power supply
    Supply,
    /// Controller 3.3V-to-GND rail source
    Rail,
    /// Controller pin driven HIGH, tied to the 3.3V rail
    Pin,
    /// Multimeter shunt in current mode
    Ammeter,
    /// Multimeter test source in resistance mode
    Ohmmeter,
}

/// One auxiliary unknown and the stamp that realizes it.
#[derive(Debug, Clone)]
pub struct SourceStamp {
    /// Index of the owning element within the subcircuit slice
    pub element_idx: usize,
    pub kind: SourceKind,
    pub n_pos: Option<usize>,
    pub n_neg: Option<usize>,
    pub emf: f64,
    pub r_series: f64,
    /// Auxiliary row/column, 0-based
    pub aux: usize,
}

/// Classification result for one subcircuit.
#[derive(Debug, Default)]
pub struct Classification {
    pub sources: Vec<SourceStamp>,
    /// Whether any externally powered element (battery, supply, controller
    /// rail or active pin) is present; ohmmeters refuse to measure then.
    pub powered: bool,
}

impl Classification {
    /// Auxiliary unknown count.
    pub fn aux_count(&self) -> usize {
        self.sources.len()
    }

    /// The stamps belonging to one element.
    pub fn sources_of(&self, element_idx: usize) -> impl Iterator<Item = &SourceStamp> {
        self.sources
            .iter()
            .filter(move |s| s.element_idx == element_idx)
    }
}

/// Classify the sources of a subcircuit and allocate auxiliary rows.
pub fn classify(elements: &[&Element], layout: &NodeLayout) -> Classification {
    let mut cls = Classification::default();
    // Ohmmeters are only stamped on unpowered subcircuits, so their aux
    // allocation waits until every powering element has been seen.
    let mut ohmmeters: Vec<(usize, Option<usize>, Option<usize>)> = Vec::new();

    for (idx, el) in elements.iter().enumerate() {
        match el.kind {
            ElementKind::Battery | ElementKind::PowerSupply => {
                let Some((pos, neg)) = el.oriented_pair() else {
                    continue;
                };
                let (Some(n_pos), Some(n_neg)) =
                    (layout.index(&pos.id), layout.index(&neg.id))
                else {
                    continue;
                };
                let aux = cls.sources.len();
                cls.sources.push(SourceStamp {
                    element_idx: idx,
                    kind: SourceKind::Supply,
                    n_pos,
                    n_neg,
                    emf: el.source_voltage(),
                    r_series: el.resistance(),
                    aux,
                });
                cls.powered = true;
            }

            ElementKind::Microbit | ElementKind::MicrobitBreakout => {
                classify_controller(el, idx, layout, &mut cls);
            }

            ElementKind::Multimeter => {
                let Some((pos, neg)) = el.oriented_pair() else {
                    continue;
                };
                let (Some(n_pos), Some(n_neg)) =
                    (layout.index(&pos.id), layout.index(&neg.id))
                else {
                    continue;
                };
                match el.meter_mode() {
                    MeterMode::Current => {
                        let aux = cls.sources.len();
                        cls.sources.push(SourceStamp {
                            element_idx: idx,
                            kind: SourceKind::Ammeter,
                            n_pos,
                            n_neg,
                            emf: 0.0,
                            r_series: AMMETER_SHUNT_RESISTANCE,
                            aux,
                        });
                    }
                    MeterMode::Resistance => {
                        ohmmeters.push((idx, n_pos, n_neg));
                    }
                    MeterMode::Voltage => {}
                }
            }

            _ => {}
        }
    }

    if !cls.powered {
        for (idx, n_pos, n_neg) in ohmmeters {
            let aux = cls.sources.len();
            cls.sources.push(SourceStamp {
                element_idx: idx,
                kind: SourceKind::Ohmmeter,
                n_pos,
                n_neg,
                emf: OHMMETER_TEST_VOLTAGE,
                r_series: 0.0,
                aux,
            });
        }
    }

    log::debug!(
        "classified {} aux unknown(s), powered={}",
        cls.aux_count(),
        cls.powered
    );

    cls
}

/// A controller contributes one rail source (3.3V to GND) plus one 0 V
/// pin-to-rail source per wired pin currently driven HIGH. A controller
/// with no resolvable rail pair contributes nothing.
fn classify_controller(
    el: &Element,
    idx: usize,
    layout: &NodeLayout,
    cls: &mut Classification,
) {
    let rail_3v3 = el
        .terminals_with_placeholder(RAIL_3V3)
        .find_map(|n| layout.index(&n.id));
    let rail_gnd = el
        .terminals_with_placeholder(RAIL_GND)
        .find_map(|n| layout.index(&n.id));

    let Some(n_rail) = rail_3v3 else {
        // Without a supply rail in this subcircuit the board cannot drive
        // anything.
        return;
    };

    if let Some(n_gnd) = rail_gnd {
        let aux = cls.sources.len();
        cls.sources.push(SourceStamp {
            element_idx: idx,
            kind: SourceKind::Rail,
            n_pos: n_rail,
            n_neg: n_gnd,
            emf: RAIL_VOLTAGE,
            r_series: CONTROLLER_SERIES_RESISTANCE,
            aux,
        });
        cls.powered = true;
    }

    for node in &el.nodes {
        let Some(pin) = node.placeholder.as_deref().filter(|p| is_digital_pin(p)) else {
            continue;
        };
        if !el.pin_is_high(pin) {
            continue;
        }
        let Some(n_pin) = layout.index(&node.id) else {
            continue;
        };
        let aux = cls.sources.len();
        cls.sources.push(SourceStamp {
            element_idx: idx,
            kind: SourceKind::Pin,
            n_pos: n_rail,
            n_neg: n_pin,
            emf: 0.0,
            r_series: CONTROLLER_SERIES_RESISTANCE,
            aux,
        });
        cls.powered = true;
    }
}
