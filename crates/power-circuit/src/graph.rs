// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Adjacency-list backend.
//!
//! Nodes live in an arena of generational slots owned by the circuit. Each
//! slot stores the node's successor entries, its canonical rank (for reduced
//! nodes) and its BV flag: set when the next reduced node has exactly twice
//! the value, so carries can be routed without allocating.
//!
//! Markings are `Rc` cells; the circuit keeps a `Weak` registry so that
//! `reduce` and `remove` can rewrite every live marking in place.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashSet;
use tracing::{instrument, warn};

use crate::circuit::PowerCircuit;
use crate::config::CircuitConfig;
use crate::error::PowerCircuitError;
use crate::ident::{CircuitId, MarkingId, Node};
use crate::marking::{Marking, MarkingCell, Term};
use crate::sign::Sign;
use crate::stats::CircuitStats;

/// Minimum registry size before dead marking entries are pruned.
const REGISTRY_PRUNE_FLOOR: usize = 64;

#[derive(Debug, Clone, Default)]
pub(crate) struct NodeSlot {
    pub(crate) generation: u32,
    pub(crate) live: bool,
    pub(crate) rank: Option<usize>,
    pub(crate) doubles: bool,
    pub(crate) successors: Vec<Term>,
}

/// Power circuit stored as per-node successor lists.
#[derive(Debug)]
pub struct GraphCircuit {
    pub(crate) id: CircuitId,
    pub(crate) config: CircuitConfig,
    pub(crate) slots: Vec<NodeSlot>,
    pub(crate) free: Vec<u32>,
    pub(crate) live_nodes: usize,
    /// Reduced prefix, smallest value first.
    pub(crate) order: Vec<Node>,
    registry: BTreeMap<MarkingId, Weak<MarkingCell>>,
    prune_at: usize,
    next_marking: u64,
}

impl Default for GraphCircuit {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphCircuit {
    /// Empty circuit with the default configuration.
    pub fn new() -> Self {
        Self::with_config(CircuitConfig::default())
    }

    /// Empty circuit with an explicit configuration.
    pub fn with_config(config: CircuitConfig) -> Self {
        Self {
            id: CircuitId::fresh(),
            config,
            slots: Vec::with_capacity(config.node_capacity),
            free: Vec::new(),
            live_nodes: 0,
            order: Vec::new(),
            registry: BTreeMap::new(),
            prune_at: REGISTRY_PRUNE_FLOOR,
            next_marking: 0,
        }
    }

    // ── handles ─────────────────────────────────────────────────────────

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn handle(&self, slot: usize) -> Node {
        Node {
            circuit: self.id,
            index: slot as u32,
            generation: self.slots[slot].generation,
        }
    }

    pub(crate) fn check_node(&self, node: Node) -> Result<(), PowerCircuitError> {
        if node.circuit != self.id {
            return Err(PowerCircuitError::ForeignCircuit {
                expected: self.id,
                found: node.circuit,
            });
        }
        match self.slots.get(node.slot()) {
            Some(slot) if slot.live && slot.generation == node.generation => Ok(()),
            _ => Err(PowerCircuitError::StaleNode { node }),
        }
    }

    pub(crate) fn check_marking(&self, marking: &Marking) -> Result<(), PowerCircuitError> {
        if marking.circuit() == self.id {
            Ok(())
        } else {
            Err(PowerCircuitError::ForeignCircuit {
                expected: self.id,
                found: marking.circuit(),
            })
        }
    }

    pub(crate) fn is_reduced_node(&self, node: Node) -> bool {
        self.slots[node.slot()].rank.is_some()
    }

    pub(crate) fn terms_reduced(&self, terms: &[Term]) -> bool {
        terms.iter().all(|&(n, _)| self.is_reduced_node(n))
    }

    pub(crate) fn successors_of(&self, node: Node) -> &[Term] {
        &self.slots[node.slot()].successors
    }

    /// Live nodes that are not reduced, in slot order.
    pub(crate) fn pending_nodes(&self) -> Vec<Node> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.live && slot.rank.is_none())
            .map(|(i, _)| self.handle(i))
            .collect()
    }

    // ── node arena ──────────────────────────────────────────────────────

    pub(crate) fn alloc_node(&mut self, successors: Vec<Term>) -> Node {
        let index = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.live = true;
            slot.successors = successors;
            index
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let index = self.slots.len() as u32;
            self.slots.push(NodeSlot {
                live: true,
                successors,
                ..NodeSlot::default()
            });
            index
        };
        self.live_nodes += 1;
        self.handle(index as usize)
    }

    pub(crate) fn free_node(&mut self, node: Node) {
        let slot = &mut self.slots[node.slot()];
        slot.live = false;
        slot.rank = None;
        slot.doubles = false;
        slot.successors = Vec::new();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(node.index);
        self.live_nodes -= 1;
    }

    // ── marking registry ────────────────────────────────────────────────

    pub(crate) fn new_marking(&mut self, terms: Vec<Term>) -> Marking {
        let id = MarkingId(self.next_marking);
        self.next_marking += 1;
        let cell = Rc::new(MarkingCell {
            id,
            circuit: self.id,
            terms: RefCell::new(terms),
        });
        if self.registry.len() >= self.prune_at {
            self.registry.retain(|_, weak| weak.strong_count() > 0);
            self.prune_at = (self.registry.len() * 2).max(REGISTRY_PRUNE_FLOOR);
        }
        self.registry.insert(id, Rc::downgrade(&cell));
        Marking::from_cell(cell)
    }

    /// Live marking cells in creation order.
    pub(crate) fn live_markings(&self) -> Vec<Rc<MarkingCell>> {
        self.registry.values().filter_map(Weak::upgrade).collect()
    }

    // ── term arithmetic ─────────────────────────────────────────────────

    /// Adds `sign · node` into `terms` without carrying.
    fn accumulate(&self, terms: &mut Vec<Term>, node: Node, sign: Sign) -> Result<(), PowerCircuitError> {
        if sign.is_zero() {
            return Ok(());
        }
        match terms.iter().position(|&(n, _)| n == node) {
            None => terms.push((node, sign)),
            Some(k) => {
                let (sum, carry) = terms[k].1.add_with_carry(sign);
                if !carry.is_zero() && self.config.check_invariants {
                    return Err(PowerCircuitError::SignOverflow { node });
                }
                if sum.is_zero() {
                    terms.remove(k);
                } else {
                    terms[k].1 = sum;
                }
            }
        }
        Ok(())
    }

    /// First node of `targets` reachable from `from` along successor edges
    /// (a node reaches itself).
    pub(crate) fn reaches_any(&self, from: &[Node], targets: &FxHashSet<Node>) -> Option<Node> {
        let mut seen: FxHashSet<Node> = FxHashSet::default();
        let mut stack: Vec<Node> = from.to_vec();
        while let Some(node) = stack.pop() {
            if targets.contains(&node) {
                return Some(node);
            }
            if seen.insert(node) {
                stack.extend(self.successors_of(node).iter().map(|&(n, _)| n));
            }
        }
        None
    }

    fn attach(&mut self, m: &Marking, p: &Marking, negate: bool) -> Result<(), PowerCircuitError> {
        self.check_marking(m)?;
        self.check_marking(p)?;
        let targets = m.nodes();
        let mut addend = p.terms();
        if negate {
            for term in &mut addend {
                term.1 = -term.1;
            }
        }
        if let Some(&node) = targets.iter().find(|&&n| self.is_reduced_node(n)) {
            return Err(PowerCircuitError::TargetAlreadyReduced { node });
        }
        if self.config.check_invariants {
            for &target in &targets {
                let existing = self.successors_of(target);
                for &(q, s) in &addend {
                    if existing.iter().any(|&(n, t)| n == q && t == s) {
                        return Err(PowerCircuitError::SignOverflow { node: target });
                    }
                }
            }
            let target_set: FxHashSet<Node> = targets.iter().copied().collect();
            let sources: Vec<Node> = addend.iter().map(|&(n, _)| n).collect();
            if let Some(node) = self.reaches_any(&sources, &target_set) {
                return Err(PowerCircuitError::CycleDetected { node });
            }
        }
        for target in targets {
            let mut successors = std::mem::take(&mut self.slots[target.slot()].successors);
            let merged = addend
                .iter()
                .try_for_each(|&(q, s)| self.accumulate(&mut successors, q, s));
            self.slots[target.slot()].successors = successors;
            merged?;
        }
        Ok(())
    }
}

impl PowerCircuit for GraphCircuit {
    fn id(&self) -> CircuitId {
        self.id
    }

    fn config(&self) -> &CircuitConfig {
        &self.config
    }

    fn create_marking(&mut self, value: i64) -> Marking {
        let sign = Sign::of(value);
        let mut bits = value.unsigned_abs();
        let mut terms = Vec::new();
        if bits != 0 {
            let mut power = self.ensure_unit();
            loop {
                if bits & 1 == 1 {
                    terms.push((power, sign));
                }
                bits >>= 1;
                if bits == 0 {
                    break;
                }
                power = self.double_of(power);
            }
        }
        self.new_marking(terms)
    }

    fn create_marking_from_nodes(&mut self, nodes: &[Node]) -> Result<Marking, PowerCircuitError> {
        let signs = vec![Sign::Plus; nodes.len()];
        self.create_marking_with_signs(nodes, &signs)
    }

    fn create_marking_with_signs(
        &mut self,
        nodes: &[Node],
        signs: &[Sign],
    ) -> Result<Marking, PowerCircuitError> {
        if nodes.len() != signs.len() {
            return Err(PowerCircuitError::LengthMismatch {
                nodes: nodes.len(),
                signs: signs.len(),
            });
        }
        let mut terms = Vec::with_capacity(nodes.len());
        for (&node, &sign) in nodes.iter().zip(signs) {
            self.check_node(node)?;
            self.accumulate(&mut terms, node, sign)?;
        }
        Ok(self.new_marking(terms))
    }

    fn create_node(&mut self, successor: &Marking) -> Result<Node, PowerCircuitError> {
        self.check_marking(successor)?;
        Ok(self.alloc_node(successor.terms()))
    }

    fn clone_node(&mut self, node: Node) -> Result<Node, PowerCircuitError> {
        self.check_node(node)?;
        let successors = self.successors_of(node).to_vec();
        Ok(self.alloc_node(successors))
    }

    fn clone_marking(&mut self, marking: &Marking) -> Result<Marking, PowerCircuitError> {
        self.check_marking(marking)?;
        let terms = marking
            .terms()
            .into_iter()
            .map(|(node, sign)| {
                let successors = self.successors_of(node).to_vec();
                (self.alloc_node(successors), sign)
            })
            .collect();
        Ok(self.new_marking(terms))
    }

    fn copy_marking(&mut self, marking: &Marking) -> Result<Marking, PowerCircuitError> {
        self.check_marking(marking)?;
        Ok(self.new_marking(marking.terms()))
    }

    fn invert(&mut self, marking: &Marking) -> Result<Marking, PowerCircuitError> {
        self.check_marking(marking)?;
        let terms = marking.terms().into_iter().map(|(n, s)| (n, -s)).collect();
        Ok(self.new_marking(terms))
    }

    fn add(&mut self, a: &Marking, b: &Marking) -> Result<Marking, PowerCircuitError> {
        self.check_marking(a)?;
        self.check_marking(b)?;
        let mut terms = a.terms();
        for (node, sign) in b.terms() {
            self.accumulate(&mut terms, node, sign)?;
        }
        Ok(self.new_marking(terms))
    }

    fn intersect(&mut self, a: &Marking, b: &Marking) -> Result<Marking, PowerCircuitError> {
        self.check_marking(a)?;
        self.check_marking(b)?;
        let terms = a
            .terms()
            .into_iter()
            .filter(|&(n, s)| b.sign(n) == s)
            .collect();
        Ok(self.new_marking(terms))
    }

    fn increment(&mut self, marking: &Marking) -> Result<Marking, PowerCircuitError> {
        self.check_marking(marking)?;
        let mut terms = marking.terms();
        if self.terms_reduced(&terms) {
            terms = self.increment_terms(&terms);
        } else {
            let one = if self.order.is_empty() {
                self.ensure_unit()
            } else {
                self.alloc_node(Vec::new())
            };
            terms.push((one, Sign::Plus));
        }
        Ok(self.new_marking(terms))
    }

    fn compare(&self, a: &Marking, b: &Marking) -> Result<Ordering, PowerCircuitError> {
        self.check_marking(a)?;
        self.check_marking(b)?;
        self.compare_terms(&a.terms(), &b.terms(), 0)
    }

    fn is_reduced(&self, marking: &Marking) -> Result<bool, PowerCircuitError> {
        self.check_marking(marking)?;
        Ok(self.terms_reduced(&marking.cell.terms.borrow()))
    }

    fn order(&self, node: Node) -> Result<Option<usize>, PowerCircuitError> {
        self.check_node(node)?;
        Ok(self.slots[node.slot()].rank)
    }

    fn reduced_node(&self, rank: usize) -> Option<Node> {
        self.order.get(rank).copied()
    }

    fn reduced_len(&self) -> usize {
        self.order.len()
    }

    fn successors(&self, node: Node) -> Result<Vec<Term>, PowerCircuitError> {
        self.check_node(node)?;
        Ok(self.successors_of(node).to_vec())
    }

    fn successor_marking(&mut self, node: Node) -> Result<Marking, PowerCircuitError> {
        let terms = self.successors(node)?;
        Ok(self.new_marking(terms))
    }

    fn smallest_node(&self, marking: &Marking) -> Result<Option<Node>, PowerCircuitError> {
        self.check_marking(marking)?;
        let terms = marking.terms();
        if !self.terms_reduced(&terms) {
            return Err(PowerCircuitError::NotReduced);
        }
        Ok(terms
            .into_iter()
            .map(|(n, _)| n)
            .min_by_key(|&n| self.slots[n.slot()].rank))
    }

    fn nodes(&self) -> Vec<Node> {
        let mut nodes = self.order.clone();
        nodes.extend(self.pending_nodes());
        nodes
    }

    fn markings(&self) -> Vec<Marking> {
        self.live_markings()
            .into_iter()
            .map(Marking::from_cell)
            .collect()
    }

    fn stats(&self) -> CircuitStats {
        CircuitStats {
            nodes: self.live_nodes,
            reduced_nodes: self.order.len(),
            markings: self.live_markings().len(),
            edges: self
                .slots
                .iter()
                .filter(|slot| slot.live)
                .map(|slot| slot.successors.len())
                .sum(),
        }
    }

    #[instrument(level = "debug", skip_all, fields(circuit = ?self.id))]
    fn reduce(&mut self) -> Result<(), PowerCircuitError> {
        let frontier = self.pending_nodes();
        self.run_reduce(&frontier)
    }

    #[instrument(level = "debug", skip_all, fields(circuit = ?self.id, markings = markings.len()))]
    fn reduce_markings(&mut self, markings: &[Marking]) -> Result<(), PowerCircuitError> {
        let mut roots = Vec::new();
        for marking in markings {
            self.check_marking(marking)?;
            roots.extend(marking.nodes());
        }
        let frontier = self.pending_reachable(&roots);
        self.run_reduce(&frontier)
    }

    #[instrument(level = "debug", skip_all, fields(circuit = ?self.id, nodes = nodes.len()))]
    fn reduce_nodes(&mut self, nodes: &[Node], markings: &[Marking]) -> Result<(), PowerCircuitError> {
        for &node in nodes {
            self.check_node(node)?;
            if self.is_reduced_node(node) {
                return Err(PowerCircuitError::AlreadyReduced { node });
            }
        }
        let members: FxHashSet<Node> = nodes.iter().copied().collect();
        for marking in markings {
            self.check_marking(marking)?;
            if let Some(node) = marking
                .nodes()
                .into_iter()
                .find(|n| !members.contains(n) && !self.is_reduced_node(*n))
            {
                return Err(PowerCircuitError::OutsideFrontier { node });
            }
        }
        self.run_reduce(nodes)
    }

    fn connect(&mut self, m: &Marking, p: &Marking) -> Result<(), PowerCircuitError> {
        self.attach(m, p, false)
    }

    fn connect_inv(&mut self, m: &Marking, p: &Marking) -> Result<(), PowerCircuitError> {
        self.attach(m, p, true)
    }

    fn remove(&mut self, m: &Marking) -> Result<(), PowerCircuitError> {
        self.check_marking(m)?;
        let doomed = m.nodes();
        if doomed.is_empty() {
            return Ok(());
        }
        if let Some(lowest) = doomed.iter().filter_map(|n| self.slots[n.slot()].rank).min() {
            let keep = usize::from(lowest != 0).min(self.order.len());
            warn!(
                circuit = ?self.id,
                removed_rank = lowest,
                demoted = self.order.len() - keep,
                "removing reduced nodes demotes the reduced prefix"
            );
            for node in self.order.drain(keep..) {
                self.slots[node.slot()].rank = None;
            }
            for slot in &mut self.slots {
                slot.doubles = false;
            }
        }
        let gone: FxHashSet<Node> = doomed.iter().copied().collect();
        for node in doomed {
            self.free_node(node);
        }
        for slot in self.slots.iter_mut().filter(|slot| slot.live) {
            slot.successors.retain(|(n, _)| !gone.contains(n));
        }
        for cell in self.live_markings() {
            cell.terms.borrow_mut().retain(|(n, _)| !gone.contains(n));
        }
        Ok(())
    }

    fn clone_circuit(&self, keep: &[Marking]) -> Result<(Self, Vec<Marking>), PowerCircuitError> {
        for marking in keep {
            self.check_marking(marking)?;
        }
        let id = CircuitId::fresh();
        let rehome = |terms: &[Term]| -> Vec<Term> {
            terms.iter().map(|&(n, s)| (n.rehome(id), s)).collect()
        };
        let slots = self
            .slots
            .iter()
            .map(|slot| NodeSlot {
                successors: rehome(&slot.successors),
                ..slot.clone()
            })
            .collect();
        let mut copy = Self {
            id,
            config: self.config,
            slots,
            free: self.free.clone(),
            live_nodes: self.live_nodes,
            order: self.order.iter().map(|n| n.rehome(id)).collect(),
            registry: BTreeMap::new(),
            prune_at: REGISTRY_PRUNE_FLOOR,
            next_marking: 0,
        };
        let markings = keep
            .iter()
            .map(|m| {
                let terms = rehome(&m.cell.terms.borrow());
                copy.new_marking(terms)
            })
            .collect();
        Ok((copy, markings))
    }

    fn check_consistency(&self) -> Result<(), PowerCircuitError> {
        self.verify()
    }
}
