// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reference-counted marking handles.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ident::{CircuitId, MarkingId, Node};
use crate::sign::Sign;

/// One `(node, sign)` entry of a marking or successor list.
pub type Term = (Node, Sign);

/// Shared storage behind every handle to the same marking.
///
/// The circuit keeps only a weak reference, so the storage goes away with
/// the last [`Marking`] handle.
pub(crate) struct MarkingCell {
    pub(crate) id: MarkingId,
    pub(crate) circuit: CircuitId,
    pub(crate) terms: RefCell<Vec<Term>>,
}

/// A sparse signed combination of nodes: one value of a circuit.
///
/// Cloning the handle shares the underlying marking. Use the circuit's
/// `copy_marking` for an independent marking over the same nodes, or
/// `clone_marking` for one over fresh copies of the nodes.
#[derive(Clone)]
pub struct Marking {
    pub(crate) cell: Rc<MarkingCell>,
}

impl Marking {
    pub(crate) fn from_cell(cell: Rc<MarkingCell>) -> Self {
        Self { cell }
    }

    /// Circuit that owns this marking.
    pub fn circuit(&self) -> CircuitId {
        self.cell.circuit
    }

    /// Identity of the marking within its circuit.
    pub fn id(&self) -> MarkingId {
        self.cell.id
    }

    /// Snapshot of the entries in insertion order.
    pub fn terms(&self) -> Vec<Term> {
        self.cell.terms.borrow().clone()
    }

    /// Support of the marking.
    pub fn nodes(&self) -> Vec<Node> {
        self.cell.terms.borrow().iter().map(|&(n, _)| n).collect()
    }

    /// Sign of `node` in this marking; `Zero` when absent.
    pub fn sign(&self, node: Node) -> Sign {
        self.cell
            .terms
            .borrow()
            .iter()
            .find(|(n, _)| *n == node)
            .map_or(Sign::Zero, |&(_, s)| s)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.cell.terms.borrow().len()
    }

    /// `true` when the support is empty (the zero marking).
    pub fn is_empty(&self) -> bool {
        self.cell.terms.borrow().is_empty()
    }

    /// Number of live handles sharing this marking.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.cell)
    }

    /// `true` if both handles share the same storage.
    pub fn same_marking(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.cell.id)?;
        for (i, (node, sign)) in self.cell.terms.borrow().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{sign}{node}")?;
        }
        f.write_str("]")
    }
}
