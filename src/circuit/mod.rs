//! Circuit graph representation: the element/wire snapshot supplied by the
//! host, effective-node resolution, and subcircuit partitioning.

mod element;
mod equiv;
mod partition;
mod types;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use element::{Computed, Element, Node, PinState, Properties, Wire};
pub use equiv::{resolve_effective_nodes, EffectiveNodes, NodeMerger};
pub use partition::{partition, Subcircuit};
pub use types::*;
