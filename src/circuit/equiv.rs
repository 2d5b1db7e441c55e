//! Effective-node resolution.
//!
//! Terminals joined by ideal wires are electrically one node. A union-find
//! over node-id strings merges them into "effective nodes"; everything
//! downstream (classification, stamping, extraction) works on the
//! representatives this module produces.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use super::element::{Element, Node, Wire};
use super::types::{is_digital_pin, RAIL_3V3, RAIL_GND};

/// Union-find over node-id strings with path compression.
///
/// Slots are allocated in registration order, which keeps representative
/// choice and downstream node indexing deterministic for a given snapshot.
#[derive(Debug, Default)]
pub struct NodeMerger {
    index: IndexMap<String, usize>,
    parent: Vec<usize>,
    rank: Vec<usize>,
    /// Slot carries a ground marker (`GND` placeholder or id substring)
    gnd: Vec<bool>,
}

impl NodeMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node id as its own representative. Re-registering is a
    /// no-op, so ground markers must be supplied on first sight.
    pub fn register(&mut self, id: &str, gnd_marker: bool) -> usize {
        if let Some(&slot) = self.index.get(id) {
            return slot;
        }
        let slot = self.parent.len();
        self.index.insert(id.to_string(), slot);
        self.parent.push(slot);
        self.rank.push(0);
        self.gnd.push(gnd_marker);
        slot
    }

    /// Whether the id has been registered.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    fn find(&mut self, mut slot: usize) -> usize {
        while self.parent[slot] != slot {
            self.parent[slot] = self.parent[self.parent[slot]];
            slot = self.parent[slot];
        }
        slot
    }

    /// Merge the classes of two registered ids. Ids that were never
    /// registered (dangling wire endpoints) are ignored.
    pub fn union(&mut self, a: &str, b: &str) {
        let (Some(&sa), Some(&sb)) = (self.index.get(a), self.index.get(b)) else {
            return;
        };
        let ra = self.find(sa);
        let rb = self.find(sb);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }

    /// Finalize into an effective-node map.
    pub fn into_effective_nodes(mut self) -> EffectiveNodes {
        let slots: Vec<(String, usize)> = self
            .index
            .iter()
            .map(|(id, &slot)| (id.clone(), slot))
            .collect();

        let mut map = HashMap::with_capacity(slots.len());
        let mut reps: Vec<String> = Vec::new();
        let mut rep_of_root: HashMap<usize, String> = HashMap::new();
        let mut grounded: HashSet<String> = HashSet::new();

        for (id, slot) in slots {
            let root = self.find(slot);
            let rep = rep_of_root
                .entry(root)
                .or_insert_with(|| {
                    // The root slot's own id names the class
                    let rep = self
                        .index
                        .get_index(root)
                        .map(|(k, _)| k.clone())
                        .unwrap_or_else(|| id.clone());
                    reps.push(rep.clone());
                    rep
                })
                .clone();
            if self.gnd[slot] {
                grounded.insert(rep.clone());
            }
            map.insert(id, rep);
        }

        EffectiveNodes { map, reps, grounded }
    }
}

/// The resolved node-equivalence of one subcircuit.
#[derive(Debug, Default)]
pub struct EffectiveNodes {
    map: HashMap<String, String>,
    reps: Vec<String>,
    grounded: HashSet<String>,
}

impl EffectiveNodes {
    /// The effective node a terminal belongs to, if it participates.
    pub fn effective(&self, node_id: &str) -> Option<&str> {
        self.map.get(node_id).map(String::as_str)
    }

    /// Distinct effective nodes in first-registered order.
    pub fn representatives(&self) -> &[String] {
        &self.reps
    }

    /// Every registered terminal id (arbitrary order).
    pub fn terminal_ids(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// First effective node carrying a ground marker, if any.
    pub fn ground_candidate(&self) -> Option<&str> {
        self.reps
            .iter()
            .find(|rep| self.grounded.contains(*rep))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.reps.is_empty()
    }
}

fn gnd_marker(node: &Node) -> bool {
    node.placeholder.as_deref() == Some(RAIL_GND) || node.id.contains(RAIL_GND)
}

/// Resolve the effective nodes of one subcircuit.
///
/// Non-controller terminals always participate. Controller terminals
/// participate only when wired, with two exceptions mirroring the board's
/// internal rails: all `3.3V` (resp. `GND`) pads merge into one effective
/// node as soon as one of them is wired, and the `3.3V` rail also
/// materializes when a wired digital pin is driven HIGH, since the pin's
/// auxiliary source ties it to that rail.
pub fn resolve_effective_nodes(elements: &[&Element], wires: &[&Wire]) -> EffectiveNodes {
    let wired: HashSet<&str> = wires
        .iter()
        .flat_map(|w| [w.from_node_id.as_str(), w.to_node_id.as_str()])
        .collect();

    let mut merger = NodeMerger::new();

    for el in elements {
        if !el.kind.is_electrical() {
            continue;
        }
        if !el.kind.is_controller() {
            for node in &el.nodes {
                merger.register(&node.id, gnd_marker(node));
            }
            continue;
        }

        for node in el.nodes.iter().filter(|n| wired.contains(n.id.as_str())) {
            merger.register(&node.id, gnd_marker(node));
        }

        let pin_driven_high = el.nodes.iter().any(|n| {
            n.placeholder.as_deref().is_some_and(|p| {
                is_digital_pin(p) && wired.contains(n.id.as_str()) && el.pin_is_high(p)
            })
        });

        for label in [RAIL_3V3, RAIL_GND] {
            let rail: Vec<&Node> = el.terminals_with_placeholder(label).collect();
            let any_wired = rail.iter().any(|n| wired.contains(n.id.as_str()));
            let active = any_wired || (label == RAIL_3V3 && pin_driven_high);
            if !active || rail.is_empty() {
                continue;
            }
            merger.register(&rail[0].id, gnd_marker(rail[0]));
            for node in &rail[1..] {
                merger.register(&node.id, gnd_marker(node));
                merger.union(&rail[0].id, &node.id);
            }
        }
    }

    for wire in wires {
        merger.union(&wire.from_node_id, &wire.to_node_id);
    }

    merger.into_effective_nodes()
}
