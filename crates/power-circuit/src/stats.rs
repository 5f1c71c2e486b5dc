// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use std::fmt;

use crate::graph::GraphCircuit;

/// Size counters for a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CircuitStats {
    /// Live nodes.
    pub nodes: usize,
    /// Nodes in the reduced prefix.
    pub reduced_nodes: usize,
    /// Markings with at least one live handle.
    pub markings: usize,
    /// Successor entries over all live nodes.
    pub edges: usize,
}

impl fmt::Display for CircuitStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes ({} reduced), {} markings, {} edges",
            self.nodes, self.reduced_nodes, self.markings, self.edges
        )
    }
}

fn write_terms(f: &mut fmt::Formatter<'_>, terms: &[crate::Term]) -> fmt::Result {
    f.write_str("[")?;
    for (i, (node, sign)) in terms.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{sign}{node}")?;
    }
    f.write_str("]")
}

/// Adjacency dump: reduced prefix by rank (with `*` on BV flags), then
/// pending nodes, then live markings.
impl fmt::Display for GraphCircuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use crate::PowerCircuit;

        writeln!(f, "circuit {:?}: {}", self.id, self.stats())?;
        for (rank, &node) in self.order.iter().enumerate() {
            let flag = if self.slots[node.slot()].doubles { "*" } else { " " };
            write!(f, "  #{rank:<4}{flag} {:<8} ", node.to_string())?;
            write_terms(f, self.successors_of(node))?;
            writeln!(f)?;
        }
        for node in self.pending_nodes() {
            write!(f, "  --     {:<8} ", node.to_string())?;
            write_terms(f, self.successors_of(node))?;
            writeln!(f)?;
        }
        for cell in self.live_markings() {
            write!(f, "  {:<14} ", cell.id.to_string())?;
            write_terms(f, &cell.terms.borrow())?;
            writeln!(f)?;
        }
        Ok(())
    }
}
