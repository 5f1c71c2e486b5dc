// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use std::cmp::Ordering;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::PowerCircuitError;
use crate::graph::GraphCircuit;
use crate::ident::Node;
use crate::marking::Term;

fn violated(message: String) -> Result<(), PowerCircuitError> {
    Err(PowerCircuitError::InvariantViolated(message))
}

impl GraphCircuit {
    /// Full structural check; see [`crate::PowerCircuit::check_consistency`].
    pub(crate) fn verify(&self) -> Result<(), PowerCircuitError> {
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.live {
                let owner = self.handle(index);
                self.verify_terms(&slot.successors, || format!("successors of {owner}"))?;
            } else if slot.rank.is_some() {
                return violated(format!("free slot {index} still has a rank"));
            }
        }
        for cell in self.live_markings() {
            self.verify_terms(&cell.terms.borrow(), || format!("marking {}", cell.id))?;
        }

        for (rank, &node) in self.order.iter().enumerate() {
            self.check_node(node)?;
            let recorded = self.slots[node.slot()].rank;
            if recorded != Some(rank) {
                return violated(format!(
                    "{node} is listed at rank {rank} but records {recorded:?}"
                ));
            }
            if let Some(&(succ, _)) = self
                .successors_of(node)
                .iter()
                .find(|&&(n, _)| !self.is_reduced_node(n))
            {
                return violated(format!("reduced {node} references non-reduced {succ}"));
            }
        }
        let ranked = self.slots.iter().filter(|s| s.rank.is_some()).count();
        if ranked != self.order.len() {
            return violated(format!(
                "{ranked} ranked slots but a reduced prefix of {}",
                self.order.len()
            ));
        }

        if let Some(node) = self.find_cycle() {
            return Err(PowerCircuitError::CycleDetected { node });
        }

        for pair in self.order.windows(2) {
            let (low, high) = (pair[0], pair[1]);
            if self.compare_terms(self.successors_of(low), self.successors_of(high), 0)?
                != Ordering::Less
            {
                return violated(format!("reduced order is not increasing at {low} < {high}"));
            }
            let doubles = self
                .compare_terms(self.successors_of(high), self.successors_of(low), 1)?
                == Ordering::Equal;
            if self.slots[low.slot()].doubles != doubles {
                return violated(format!("stale BV flag on {low}"));
            }
        }
        if let Some(&top) = self.order.last() {
            if self.slots[top.slot()].doubles {
                return violated(format!("top node {top} claims a double"));
            }
        }
        if let Some(&first) = self.order.first() {
            if self.compare_terms(self.successors_of(first), &[], 0)? == Ordering::Less {
                return violated(format!("smallest reduced node {first} has a negative exponent"));
            }
        }
        Ok(())
    }

    fn verify_terms(
        &self,
        terms: &[Term],
        context: impl Fn() -> String,
    ) -> Result<(), PowerCircuitError> {
        let mut seen: FxHashSet<Node> = FxHashSet::default();
        for &(node, sign) in terms {
            self.check_node(node)?;
            if sign.is_zero() {
                return violated(format!("{}: zero entry for {node}", context()));
            }
            if !seen.insert(node) {
                return violated(format!("{}: {node} appears twice", context()));
            }
        }
        Ok(())
    }

    /// A node on some cycle of the successor relation, if any.
    pub(crate) fn find_cycle(&self) -> Option<Node> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Open,
            Done,
        }
        let mut marks: FxHashMap<Node, Mark> = FxHashMap::default();
        let mut stack: Vec<(Node, usize)> = Vec::new();
        for index in (0..self.slots.len()).filter(|&i| self.slots[i].live) {
            let root = self.handle(index);
            if marks.contains_key(&root) {
                continue;
            }
            marks.insert(root, Mark::Open);
            stack.push((root, 0));
            while let Some(&(node, cursor)) = stack.last() {
                let Some(&(child, _)) = self.successors_of(node).get(cursor) else {
                    marks.insert(node, Mark::Done);
                    stack.pop();
                    continue;
                };
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                match marks.get(&child) {
                    Some(Mark::Open) => return Some(child),
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(child, Mark::Open);
                        stack.push((child, 0));
                    }
                }
            }
        }
        None
    }
}
