//! Error types for the Breadboard circuit solver.
//!
//! This module provides a unified error type [`BreadboardError`] covering
//! graph decoding and the numerical solve. Solver errors never escape
//! [`crate::solve`]: a failed subcircuit simply yields zeroed readings, so
//! these variants are mostly visible to the CLI and WASM embeddings.

use thiserror::Error;

/// Result type alias using [`BreadboardError`].
pub type Result<T> = std::result::Result<T, BreadboardError>;

/// Unified error type for all Breadboard operations.
#[derive(Error, Debug)]
pub enum BreadboardError {
    // ============ Graph Errors ============
    /// A wire references a node id that no element owns
    #[error("Wire endpoint '{node}' does not match any element terminal")]
    DanglingWire { node: String },

    /// A node id was expected in the effective-node map but is missing
    #[error("Node '{node}' is not part of the resolved subcircuit")]
    UnresolvedNode { node: String },

    // ============ Simulation Errors ============
    /// Matrix is singular and cannot be solved
    #[error("Singular matrix - subcircuit has no well-defined DC solution")]
    SingularMatrix,

    // ============ I/O Errors ============
    /// Error reading a circuit file
    #[error("Failed to read circuit file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error decoding a circuit snapshot
    #[error("Failed to decode circuit snapshot: {0}")]
    DecodeError(#[from] serde_json::Error),
}

impl BreadboardError {
    /// Create a dangling-wire error
    pub fn dangling_wire(node: impl Into<String>) -> Self {
        Self::DanglingWire { node: node.into() }
    }

    /// Create an unresolved-node error
    pub fn unresolved_node(node: impl Into<String>) -> Self {
        Self::UnresolvedNode { node: node.into() }
    }
}
