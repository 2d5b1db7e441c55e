//! Breadboard - DC circuit solver for board snapshots
//!
//! Reads a circuit snapshot (the playground's JSON export), solves it, and
//! prints one readout line per element.
//!
//! # Usage
//!
//! ```bash
//! breadboard circuit.json
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use breadboard_core::{
    error::{BreadboardError, Result},
    solve, Element, Wire,
};

/// A board snapshot as exported by the playground.
#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    elements: Vec<Element>,
    #[serde(default)]
    wires: Vec<Wire>,
}

/// Breadboard circuit solver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the circuit snapshot file (.json)
    #[arg(value_name = "CIRCUIT_FILE")]
    circuit_file: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let text = std::fs::read_to_string(&args.circuit_file).map_err(|source| {
        BreadboardError::FileReadError {
            path: args.circuit_file.display().to_string(),
            source,
        }
    })?;
    let snapshot: Snapshot = serde_json::from_str(&text)?;

    let results = solve(&snapshot.elements, &snapshot.wires);

    println!(
        "{:<16} {:<16} {:>12} {:>12} {:>12} {:>12}",
        "id", "type", "voltage", "current", "power", "measurement"
    );
    for el in &results {
        println!(
            "{:<16} {:<16} {:>12.6} {:>12.6} {:>12.6} {:>12.6}",
            el.id,
            el.kind.to_string(),
            el.computed.voltage,
            el.computed.current,
            el.computed.power,
            el.computed.measurement,
        );
    }

    Ok(())
}
