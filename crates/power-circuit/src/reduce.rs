// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonicalization: ordering, deduplication and carry routing in the
//! reduced prefix.
//!
//! Reduced nodes are kept sorted by value. Since every value is a power of
//! two, a reduced marking reads as a sparse balanced-ternary numeral whose
//! digit positions are ranks. Adjacent ranks differ by a factor of exactly two
//! when the lower one has its BV flag set, and by at least four otherwise.
//! That is enough to compare two numerals from the top down while carrying a
//! single small remainder.
//!
//! `reduce` processes a frontier of non-reduced nodes in dependency order.
//! Each node is binary-searched into the prefix. A node equal to an existing
//! one is merged. Every holder of the duplicate is rewritten to the survivor,
//! and colliding entries carry into the next power of two.

use std::cmp::Ordering;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::error::PowerCircuitError;
use crate::graph::GraphCircuit;
use crate::ident::Node;
use crate::marking::{MarkingCell, Term};
use crate::sign::Sign;

/// Something whose entries may reference a frontier node.
enum Holder {
    Node(Node),
    Marking(Rc<MarkingCell>),
}

#[derive(Debug, Default, Clone, Copy)]
struct ReduceReport {
    frontier: usize,
    inserted: usize,
    merged: usize,
}

/// A double still being built: `terms` accumulates `successors(target) + 1`
/// and `carry` has yet to be absorbed into it.
struct PendingDouble {
    target: Node,
    terms: Vec<Term>,
    carry: Term,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Open,
    Done,
}

impl GraphCircuit {
    pub(crate) fn rank_of(&self, node: Node) -> Option<usize> {
        self.slots[node.slot()].rank
    }

    // ── comparison ──────────────────────────────────────────────────────

    /// `(rank, digit)` pairs, most significant first.
    fn digits(&self, terms: &[Term]) -> Result<Vec<(usize, i32)>, PowerCircuitError> {
        let mut digits = terms
            .iter()
            .map(|&(n, s)| {
                let rank = self.rank_of(n).ok_or(PowerCircuitError::NotReduced)?;
                Ok((rank, i32::from(s.to_i8())))
            })
            .collect::<Result<Vec<_>, PowerCircuitError>>()?;
        digits.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        Ok(digits)
    }

    /// Compares `lhs` against `rhs + rhs_bias` where both term lists are
    /// reduced and `rhs_bias` is added at the unit place.
    ///
    /// Fails with [`PowerCircuitError::NotReduced`] when either side holds a
    /// node outside the reduced prefix.
    pub(crate) fn compare_terms(
        &self,
        lhs: &[Term],
        rhs: &[Term],
        rhs_bias: i32,
    ) -> Result<Ordering, PowerCircuitError> {
        let lhs = self.digits(lhs)?;
        let mut rhs = self.digits(rhs)?;
        if rhs_bias != 0 {
            match rhs.last_mut() {
                Some((0, digit)) => *digit += rhs_bias,
                _ => rhs.push((0, rhs_bias)),
            }
        }

        let (mut i, mut j) = (0, 0);
        let mut carry = 0_i32;
        let mut previous: Option<usize> = None;
        loop {
            let rank = match (lhs.get(i), rhs.get(j)) {
                (Some(&(a, _)), Some(&(b, _))) => a.max(b),
                (Some(&(r, _)), None) | (None, Some(&(r, _))) => r,
                (None, None) => break,
            };
            let mut value = 0;
            if let Some(&(r, digit)) = lhs.get(i) {
                if r == rank {
                    value += digit;
                    i += 1;
                }
            }
            if let Some(&(r, digit)) = rhs.get(j) {
                if r == rank {
                    value -= digit;
                    j += 1;
                }
            }
            let scale = match previous {
                Some(p) if p == rank + 1 && self.slots[self.order[rank].slot()].doubles => 2,
                _ => 4,
            };
            value += scale * carry;
            // Everything below `rank` is worth less than two units of it.
            if value > 1 {
                return Ok(Ordering::Greater);
            }
            if value < -1 {
                return Ok(Ordering::Less);
            }
            carry = value;
            previous = Some(rank);
        }
        Ok(carry.cmp(&0))
    }

    // ── reduced prefix maintenance ──────────────────────────────────────

    fn place(&mut self, node: Node, rank: usize) {
        self.order.insert(rank, node);
        for r in rank..self.order.len() {
            let n = self.order[r];
            self.slots[n.slot()].rank = Some(r);
        }
    }

    /// Recomputes the BV flag of a reduced node from its upper neighbour.
    fn refresh_doubles(&mut self, node: Node) {
        let Some(rank) = self.rank_of(node) else {
            return;
        };
        let doubles = self.order.get(rank + 1).is_some_and(|&next| {
            self.compare_terms(self.successors_of(next), self.successors_of(node), 1)
                == Ok(Ordering::Equal)
        });
        self.slots[node.slot()].doubles = doubles;
    }

    /// The reduced unit node (value 1), created at rank 0 if missing.
    pub(crate) fn ensure_unit(&mut self) -> Node {
        if let Some(&first) = self.order.first() {
            if self.successors_of(first).is_empty() {
                return first;
            }
        }
        let unit = self.alloc_node(Vec::new());
        self.place(unit, 0);
        self.refresh_doubles(unit);
        trace!(node = %unit, "created unit node");
        unit
    }

    /// The reduced node after `node` when its BV flag says it is the double.
    fn known_double(&self, node: Node) -> Option<Node> {
        if !self.slots[node.slot()].doubles {
            return None;
        }
        let rank = self.rank_of(node)?;
        self.order.get(rank + 1).copied()
    }

    /// The reduced node worth twice `node`, created if missing.
    ///
    /// Building a double means incrementing the exponent of `node`, and that
    /// increment may itself carry into doubles that do not exist yet. Those
    /// are resolved innermost first from an explicit stack.
    pub(crate) fn double_of(&mut self, node: Node) -> Node {
        if let Some(next) = self.known_double(node) {
            return next;
        }
        let mut stack = vec![self.start_double(node)];
        let mut finished = node;
        while let Some(mut pending) = stack.pop() {
            match self.absorb_step(&mut pending.terms, pending.carry) {
                Some(blocked) => {
                    let inner = self.start_double(blocked.0);
                    pending.carry = blocked;
                    stack.push(pending);
                    stack.push(inner);
                }
                None => {
                    finished = self.finish_double(pending.target, pending.terms);
                    if let Some(outer) = stack.last_mut() {
                        outer.carry.0 = finished;
                    }
                }
            }
        }
        finished
    }

    fn start_double(&mut self, target: Node) -> PendingDouble {
        let unit = self.ensure_unit();
        PendingDouble {
            target,
            terms: self.successors_of(target).to_vec(),
            carry: (unit, Sign::Plus),
        }
    }

    fn finish_double(&mut self, target: Node, successors: Vec<Term>) -> Node {
        // Carrying may have created the double already.
        if let Some(next) = self.known_double(target) {
            return next;
        }
        debug_assert!(self.is_reduced_node(target), "{target} is not reduced");
        let rank = self.rank_of(target).map_or(self.order.len(), |r| r + 1);
        let twin = self.alloc_node(successors);
        self.place(twin, rank);
        self.slots[target.slot()].doubles = true;
        self.refresh_doubles(twin);
        trace!(node = %twin, rank, "created double");
        twin
    }

    /// Adds `carry` into reduced `terms`, following existing doubles upward.
    /// Returns the carry that is left when the next double does not exist.
    fn absorb_step(&self, terms: &mut Vec<Term>, carry: Term) -> Option<Term> {
        let (mut node, mut sign) = carry;
        loop {
            let Some(k) = terms.iter().position(|&(n, _)| n == node) else {
                terms.push((node, sign));
                return None;
            };
            let (sum, carry) = terms[k].1.add_with_carry(sign);
            if sum.is_zero() {
                terms.remove(k);
            } else {
                terms[k].1 = sum;
            }
            if carry.is_zero() {
                return None;
            }
            match self.known_double(node) {
                Some(next) => (node, sign) = (next, carry),
                None => return Some((node, carry)),
            }
        }
    }

    /// Adds `sign · node` into reduced `terms`, carrying upward through
    /// doubles until no entry collides.
    fn absorb(&mut self, terms: &mut Vec<Term>, node: Node, sign: Sign) {
        let mut carry = (node, sign);
        while let Some((blocked, sign)) = self.absorb_step(terms, carry) {
            carry = (self.double_of(blocked), sign);
        }
    }

    /// `terms + 1` for reduced `terms`.
    pub(crate) fn increment_terms(&mut self, terms: &[Term]) -> Vec<Term> {
        let unit = self.ensure_unit();
        let mut result = terms.to_vec();
        self.absorb(&mut result, unit, Sign::Plus);
        result
    }

    // ── reduce ──────────────────────────────────────────────────────────

    /// Non-reduced nodes reachable from `roots`, in discovery order.
    pub(crate) fn pending_reachable(&self, roots: &[Node]) -> Vec<Node> {
        let mut seen: FxHashSet<Node> = FxHashSet::default();
        let mut found = Vec::new();
        let mut stack: Vec<Node> = roots.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.is_reduced_node(node) || !seen.insert(node) {
                continue;
            }
            found.push(node);
            stack.extend(self.successors_of(node).iter().rev().map(|&(n, _)| n));
        }
        found
    }

    /// Orders `frontier` so that every node follows the frontier nodes it
    /// depends on.
    fn topological_order(&self, frontier: &[Node]) -> Result<Vec<Node>, PowerCircuitError> {
        let members: FxHashSet<Node> = frontier.iter().copied().collect();
        let mut state: FxHashMap<Node, Visit> = FxHashMap::default();
        let mut sorted = Vec::with_capacity(frontier.len());
        let mut stack: Vec<(Node, usize)> = Vec::new();

        for &root in frontier {
            if state.contains_key(&root) {
                continue;
            }
            state.insert(root, Visit::Open);
            stack.push((root, 0));
            while let Some(&(node, cursor)) = stack.last() {
                let Some(&(child, _)) = self.successors_of(node).get(cursor) else {
                    stack.pop();
                    state.insert(node, Visit::Done);
                    sorted.push(node);
                    continue;
                };
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                if self.is_reduced_node(child) {
                    continue;
                }
                if !members.contains(&child) {
                    return Err(PowerCircuitError::OutsideFrontier { node: child });
                }
                match state.get(&child) {
                    Some(Visit::Open) => {
                        return Err(PowerCircuitError::CycleDetected { node: child });
                    }
                    Some(Visit::Done) => {}
                    None => {
                        state.insert(child, Visit::Open);
                        stack.push((child, 0));
                    }
                }
            }
        }
        Ok(sorted)
    }

    /// Holders (non-reduced successor lists and live markings) of every
    /// frontier node.
    fn referrers(&self, frontier: &[Node]) -> FxHashMap<Node, Vec<Holder>> {
        let members: FxHashSet<Node> = frontier.iter().copied().collect();
        let mut referrers: FxHashMap<Node, Vec<Holder>> = FxHashMap::default();
        for owner in self.pending_nodes() {
            for &(target, _) in self.successors_of(owner) {
                if members.contains(&target) {
                    referrers.entry(target).or_default().push(Holder::Node(owner));
                }
            }
        }
        for cell in self.live_markings() {
            let targets: Vec<Node> = cell
                .terms
                .borrow()
                .iter()
                .map(|&(n, _)| n)
                .filter(|n| members.contains(n))
                .collect();
            for target in targets {
                referrers
                    .entry(target)
                    .or_default()
                    .push(Holder::Marking(Rc::clone(&cell)));
            }
        }
        referrers
    }

    fn take_terms(&mut self, holder: &Holder) -> Vec<Term> {
        match holder {
            Holder::Node(node) => std::mem::take(&mut self.slots[node.slot()].successors),
            Holder::Marking(cell) => cell.terms.take(),
        }
    }

    fn put_terms(&mut self, holder: &Holder, terms: Vec<Term>) {
        match holder {
            Holder::Node(node) => self.slots[node.slot()].successors = terms,
            Holder::Marking(cell) => {
                cell.terms.replace(terms);
            }
        }
    }

    /// Redirects every holder of `duplicate` to `survivor` and frees
    /// `duplicate`.
    fn merge_duplicate(
        &mut self,
        duplicate: Node,
        survivor: Node,
        referrers: &mut FxHashMap<Node, Vec<Holder>>,
    ) {
        for holder in referrers.remove(&duplicate).unwrap_or_default() {
            let mut terms = self.take_terms(&holder);
            if let Some(k) = terms.iter().position(|&(n, _)| n == duplicate) {
                let (_, sign) = terms.remove(k);
                self.absorb(&mut terms, survivor, sign);
            }
            self.put_terms(&holder, terms);
        }
        self.free_node(duplicate);
    }

    /// Binary-searches the reduced prefix for the value of `node`.
    fn search_prefix(&self, node: Node) -> Result<Result<usize, usize>, PowerCircuitError> {
        let successors = self.successors_of(node);
        let mut failure = None;
        let found = self.order.binary_search_by(|candidate| {
            self.compare_terms(self.successors_of(*candidate), successors, 0)
                .unwrap_or_else(|err| {
                    if failure.is_none() {
                        failure = Some(err);
                    }
                    Ordering::Equal
                })
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(found),
        }
    }

    fn reduce_frontier(&mut self, frontier: &[Node]) -> Result<ReduceReport, PowerCircuitError> {
        let sorted = self.topological_order(frontier)?;
        let mut referrers = self.referrers(&sorted);
        let mut report = ReduceReport {
            frontier: sorted.len(),
            ..ReduceReport::default()
        };
        for node in sorted {
            let found = self.search_prefix(node)?;
            match found {
                Ok(rank) => {
                    let survivor = self.order[rank];
                    trace!(node = %node, survivor = %survivor, "merging duplicate");
                    self.merge_duplicate(node, survivor, &mut referrers);
                    report.merged += 1;
                }
                Err(rank) => {
                    trace!(node = %node, rank, "inserting");
                    self.place(node, rank);
                    if rank > 0 {
                        let below = self.order[rank - 1];
                        self.refresh_doubles(below);
                    }
                    self.refresh_doubles(node);
                    report.inserted += 1;
                }
            }
        }
        Ok(report)
    }

    pub(crate) fn run_reduce(&mut self, frontier: &[Node]) -> Result<(), PowerCircuitError> {
        let report = self.reduce_frontier(frontier)?;
        debug!(
            frontier = report.frontier,
            inserted = report.inserted,
            merged = report.merged,
            reduced = self.order.len(),
            "reduce"
        );
        if self.config.check_invariants {
            self.verify()?;
        }
        Ok(())
    }
}
