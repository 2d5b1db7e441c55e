//! Galvanic subcircuit partitioning.
//!
//! Two elements interact only if current can flow between them, so the
//! solver runs once per connected component of the connectivity graph.
//! Connectivity is broader than equivalence: a resistor's two terminals are
//! different effective nodes but belong to the same component, because the
//! resistor body conducts. Controller terminals conduct only along their
//! supply rails; pin-to-pin paths exist solely through stamped sources.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;

use super::element::{Element, Node, Wire};
use super::types::{RAIL_3V3, RAIL_GND};

/// One galvanically isolated group of elements and wires, as indices into
/// the full input slices.
#[derive(Debug, Default)]
pub struct Subcircuit {
    pub element_indices: Vec<usize>,
    pub wire_indices: Vec<usize>,
}

#[derive(Debug, Default)]
struct Adjacency {
    vertex: IndexMap<String, usize>,
    edges: Vec<Vec<usize>>,
}

impl Adjacency {
    fn add_vertex(&mut self, id: &str) -> usize {
        if let Some(&v) = self.vertex.get(id) {
            return v;
        }
        let v = self.edges.len();
        self.vertex.insert(id.to_string(), v);
        self.edges.push(Vec::new());
        v
    }

    fn add_edge(&mut self, a: &str, b: &str) {
        let va = self.add_vertex(a);
        let vb = self.add_vertex(b);
        self.edges[va].push(vb);
        self.edges[vb].push(va);
    }

    /// Connected components by BFS, in vertex insertion order.
    fn components(&self) -> Vec<Option<usize>> {
        let mut component = vec![None; self.edges.len()];
        let mut next = 0usize;
        for start in 0..self.edges.len() {
            if component[start].is_some() {
                continue;
            }
            let id = next;
            next += 1;
            let mut queue = VecDeque::from([start]);
            component[start] = Some(id);
            while let Some(v) = queue.pop_front() {
                for &w in &self.edges[v] {
                    if component[w].is_none() {
                        component[w] = Some(id);
                        queue.push_back(w);
                    }
                }
            }
        }
        component
    }
}

fn pairwise_connect(graph: &mut Adjacency, nodes: &[&Node]) {
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            graph.add_edge(&a.id, &b.id);
        }
    }
}

/// Split the board into independent subcircuits.
///
/// Wires with a dangling endpoint (no owning element) are dropped here and
/// never reach the solver. Elements with no terminal in any component are
/// left out entirely; the caller zeroes their readings.
pub fn partition(elements: &[Element], wires: &[Wire]) -> Vec<Subcircuit> {
    let owner: HashMap<&str, usize> = elements
        .iter()
        .enumerate()
        .flat_map(|(i, el)| el.nodes.iter().map(move |n| (n.id.as_str(), i)))
        .collect();

    let mut graph = Adjacency::default();

    for el in elements.iter().filter(|el| el.kind.is_electrical()) {
        if el.kind.is_controller() {
            // Only the supply rails conduct through the board itself, and
            // only their wired pads exist as vertices.
            for label in [RAIL_3V3, RAIL_GND] {
                let wired_pads: Vec<&Node> = el
                    .terminals_with_placeholder(label)
                    .filter(|n| {
                        wires.iter().any(|w| {
                            w.from_node_id == n.id || w.to_node_id == n.id
                        })
                    })
                    .collect();
                pairwise_connect(&mut graph, &wired_pads);
                for pad in &wired_pads {
                    graph.add_vertex(&pad.id);
                }
            }
        } else if el.nodes.len() >= 2 {
            let terminals: Vec<&Node> = el.nodes.iter().collect();
            pairwise_connect(&mut graph, &terminals);
        } else if let Some(n) = el.nodes.first() {
            graph.add_vertex(&n.id);
        }
    }

    let mut live_wires: Vec<usize> = Vec::new();
    for (wi, w) in wires.iter().enumerate() {
        if !owner.contains_key(w.from_node_id.as_str())
            || !owner.contains_key(w.to_node_id.as_str())
        {
            log::trace!(
                "dropping dangling wire {} -> {}",
                w.from_node_id,
                w.to_node_id
            );
            continue;
        }
        graph.add_edge(&w.from_node_id, &w.to_node_id);
        live_wires.push(wi);
    }

    let component = graph.components();
    let count = component.iter().flatten().max().map_or(0, |&c| c + 1);
    let mut parts: Vec<Subcircuit> = (0..count).map(|_| Subcircuit::default()).collect();

    for (ei, el) in elements.iter().enumerate() {
        let assigned = el.nodes.iter().find_map(|n| {
            graph
                .vertex
                .get(n.id.as_str())
                .and_then(|&v| component[v])
        });
        if let Some(c) = assigned {
            parts[c].element_indices.push(ei);
        }
    }

    for wi in live_wires {
        let from = wires[wi].from_node_id.as_str();
        if let Some(c) = graph.vertex.get(from).and_then(|&v| component[v]) {
            parts[c].wire_indices.push(wi);
        }
    }

    parts
}
