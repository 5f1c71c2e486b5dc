// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The backend-independent power circuit contract.

use std::cmp::Ordering;

use crate::config::CircuitConfig;
use crate::error::PowerCircuitError;
use crate::ident::{CircuitId, Node};
use crate::marking::{Marking, Term};
use crate::sign::Sign;
use crate::stats::CircuitStats;

/// A power circuit: a DAG of nodes whose values are `2^(successor value)`,
/// plus markings that name signed sums of nodes.
///
/// Nodes become *reduced* once `reduce` has placed them in the canonical
/// order of strictly increasing values. Only reduced markings can be compared.
/// Every other operation either builds non-reduced structure or reads
/// reduced structure.
///
/// All handles passed in must have been issued by the same circuit; a
/// foreign handle yields [`PowerCircuitError::ForeignCircuit`].
pub trait PowerCircuit {
    /// Identity of this circuit instance.
    fn id(&self) -> CircuitId;

    /// Policy this circuit was created with.
    fn config(&self) -> &CircuitConfig;

    // ── construction ────────────────────────────────────────────────────

    /// Reduced marking with the given integer value.
    ///
    /// Missing powers of two are created inside the reduced prefix.
    fn create_marking(&mut self, value: i64) -> Marking;

    /// Marking `n₁ + n₂ + …` over the given nodes.
    fn create_marking_from_nodes(&mut self, nodes: &[Node]) -> Result<Marking, PowerCircuitError>;

    /// Marking `s₁·n₁ + s₂·n₂ + …`. `Zero` signs are skipped and a
    /// repeated node is combined with the ternary adder.
    fn create_marking_with_signs(
        &mut self,
        nodes: &[Node],
        signs: &[Sign],
    ) -> Result<Marking, PowerCircuitError>;

    /// New non-reduced node whose successor marking is a copy of `successor`.
    fn create_node(&mut self, successor: &Marking) -> Result<Node, PowerCircuitError>;

    /// New non-reduced node with a copy of `node`'s successor marking.
    fn clone_node(&mut self, node: Node) -> Result<Node, PowerCircuitError>;

    /// Marking over fresh, non-reduced copies of every node in the support.
    ///
    /// Mutating the copies (for example with [`PowerCircuit::connect`])
    /// cannot disturb other markings that share the original nodes.
    fn clone_marking(&mut self, marking: &Marking) -> Result<Marking, PowerCircuitError>;

    /// Independent marking over the same nodes.
    fn copy_marking(&mut self, marking: &Marking) -> Result<Marking, PowerCircuitError>;

    // ── arithmetic ──────────────────────────────────────────────────────

    /// `-m`.
    fn invert(&mut self, marking: &Marking) -> Result<Marking, PowerCircuitError>;

    /// `a + b`, entry by entry.
    ///
    /// The caller must keep every per-node sum in {-1, 0, 1}. With
    /// invariant checking enabled a violation yields
    /// [`PowerCircuitError::SignOverflow`]; otherwise the result is
    /// arithmetically undefined.
    fn add(&mut self, a: &Marking, b: &Marking) -> Result<Marking, PowerCircuitError>;

    /// Entries on which `a` and `b` agree.
    fn intersect(&mut self, a: &Marking, b: &Marking) -> Result<Marking, PowerCircuitError>;

    /// `m + 1`. Reduced input gives a reduced result built by carrying
    /// through the reduced prefix. Non-reduced input gets a fresh unit node
    /// appended and stays non-reduced until the next `reduce`.
    fn increment(&mut self, marking: &Marking) -> Result<Marking, PowerCircuitError>;

    /// Compares the values of two reduced markings.
    fn compare(&self, a: &Marking, b: &Marking) -> Result<Ordering, PowerCircuitError>;

    /// `true` if both reduced markings have the same value.
    fn equals(&self, a: &Marking, b: &Marking) -> Result<bool, PowerCircuitError> {
        Ok(self.compare(a, b)? == Ordering::Equal)
    }

    // ── queries ─────────────────────────────────────────────────────────

    /// `true` if every node of the support is reduced.
    fn is_reduced(&self, marking: &Marking) -> Result<bool, PowerCircuitError>;

    /// `true` if `node` has a canonical rank.
    fn is_node_reduced(&self, node: Node) -> Result<bool, PowerCircuitError> {
        Ok(self.order(node)?.is_some())
    }

    /// Canonical rank of `node`, or `None` when it is not reduced.
    fn order(&self, node: Node) -> Result<Option<usize>, PowerCircuitError>;

    /// Reduced node at `rank`, or `None` past the end of the reduced prefix.
    fn reduced_node(&self, rank: usize) -> Option<Node>;

    /// Length of the reduced prefix.
    fn reduced_len(&self) -> usize;

    /// Copy of the successor entries of `node`.
    fn successors(&self, node: Node) -> Result<Vec<Term>, PowerCircuitError>;

    /// New marking holding a copy of `node`'s successor marking.
    fn successor_marking(&mut self, node: Node) -> Result<Marking, PowerCircuitError>;

    /// Lowest-ranked node of a reduced marking.
    fn smallest_node(&self, marking: &Marking) -> Result<Option<Node>, PowerCircuitError>;

    /// Every live node: the reduced prefix in rank order, then the rest.
    fn nodes(&self) -> Vec<Node>;

    /// Every marking that still has a live handle.
    fn markings(&self) -> Vec<Marking>;

    /// Size counters.
    fn stats(&self) -> CircuitStats;

    // ── canonicalization ────────────────────────────────────────────────

    /// Reduces every non-reduced node, merging value duplicates.
    fn reduce(&mut self) -> Result<(), PowerCircuitError>;

    /// Reduces the non-reduced nodes reachable from `markings`.
    fn reduce_markings(&mut self, markings: &[Marking]) -> Result<(), PowerCircuitError>;

    /// Reduces exactly `nodes`. Their successors and the supports of
    /// `markings` must lie in `nodes` or the reduced prefix.
    fn reduce_nodes(&mut self, nodes: &[Node], markings: &[Marking]) -> Result<(), PowerCircuitError>;

    // ── structure ───────────────────────────────────────────────────────

    /// Adds `p` to the successor marking of every node in `m`.
    ///
    /// Every node of `m` must be non-reduced. The caller keeps sums in
    /// {-1, 0, 1} and the graph acyclic; both are verified only with
    /// invariant checking enabled.
    fn connect(&mut self, m: &Marking, p: &Marking) -> Result<(), PowerCircuitError>;

    /// Subtracts `p` from the successor marking of every node in `m`.
    fn connect_inv(&mut self, m: &Marking, p: &Marking) -> Result<(), PowerCircuitError>;

    /// Deletes every node of `m`'s support and drops references to them
    /// from all successor markings and markings.
    ///
    /// Removing a reduced node demotes the reduced prefix down to the unit
    /// node; call `reduce` afterwards to restore canonical order.
    fn remove(&mut self, m: &Marking) -> Result<(), PowerCircuitError>;

    /// Independent copy of the whole circuit plus the remapped `keep`
    /// markings, in input order.
    fn clone_circuit(&self, keep: &[Marking]) -> Result<(Self, Vec<Marking>), PowerCircuitError>
    where
        Self: Sized;

    /// Verifies every structural invariant.
    fn check_consistency(&self) -> Result<(), PowerCircuitError>;
}
