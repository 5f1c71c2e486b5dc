// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graphviz DOT export for inspecting circuits.

use std::fmt::Write as _;
use std::path::Path;

use thiserror::Error;

use crate::circuit::PowerCircuit;
use crate::error::PowerCircuitError;
use crate::marking::Marking;
use crate::sign::Sign;

/// Number of markings that get their own colour.
pub const MAX_HIGHLIGHTS: usize = 9;

const PALETTE: [&str; MAX_HIGHLIGHTS] = [
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#a65628", "#f781bf", "#999999",
    "#66c2a5",
];

/// Failure while rendering or writing a DOT file.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A highlighted marking or node was rejected by the circuit.
    #[error(transparent)]
    Circuit(#[from] PowerCircuitError),
    /// Writing the output file failed.
    #[error("failed to write dot file: {0}")]
    Io(#[from] std::io::Error),
}

fn edge_label(sign: Sign) -> &'static str {
    if sign == Sign::Minus {
        "-"
    } else {
        "+"
    }
}

/// DOT source for `circuit`.
///
/// Reduced nodes are labelled `R` followed by their rank. The first
/// [`MAX_HIGHLIGHTS`] entries of `highlights` are drawn as coloured boxes
/// with signed edges into their support; further entries are ignored.
pub fn to_dot(circuit: &dyn PowerCircuit, highlights: &[&Marking]) -> Result<String, RenderError> {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "digraph power_circuit {{");
    let _ = writeln!(out, "  rankdir=BT;");
    let _ = writeln!(out, "  node [shape=circle, fontsize=10];");
    for node in circuit.nodes() {
        let label = match circuit.order(node)? {
            Some(rank) => format!("R{rank}"),
            None => String::new(),
        };
        let _ = writeln!(out, "  n{} [label=\"{label}\", tooltip=\"{node}\"];", node.index());
    }
    for node in circuit.nodes() {
        for (succ, sign) in circuit.successors(node)? {
            let _ = writeln!(
                out,
                "  n{} -> n{} [label=\"{}\"];",
                node.index(),
                succ.index(),
                edge_label(sign)
            );
        }
    }
    for (slot, marking) in highlights.iter().take(MAX_HIGHLIGHTS).enumerate() {
        if marking.circuit() != circuit.id() {
            return Err(PowerCircuitError::ForeignCircuit {
                expected: circuit.id(),
                found: marking.circuit(),
            }
            .into());
        }
        let colour = PALETTE[slot];
        let _ = writeln!(
            out,
            "  h{slot} [shape=box, color=\"{colour}\", fontcolor=\"{colour}\", label=\"{}\"];",
            marking.id()
        );
        for (node, sign) in marking.terms() {
            let _ = writeln!(
                out,
                "  h{slot} -> n{} [color=\"{colour}\", label=\"{}\"];",
                node.index(),
                edge_label(sign)
            );
        }
    }
    let _ = writeln!(out, "}}");
    Ok(out)
}

/// Writes [`to_dot`] output to `path`.
pub fn write_dot(
    path: impl AsRef<Path>,
    circuit: &dyn PowerCircuit,
    highlights: &[&Marking],
) -> Result<(), RenderError> {
    let dot = to_dot(circuit, highlights)?;
    std::fs::write(path, dot)?;
    Ok(())
}
