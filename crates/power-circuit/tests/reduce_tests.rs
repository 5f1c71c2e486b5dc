// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

mod common;

use std::cmp::Ordering;

use common::{assert_value, checked_circuit, tower};
use power_circuit::{snapshot, PowerCircuit, PowerCircuitError, Sign};

#[test]
fn reducing_clones_merges_them_into_existing_nodes() {
    let mut pc = checked_circuit();
    let m = pc.create_marking(21);
    let copy = pc.clone_marking(&m).unwrap();
    let clone_nodes = copy.nodes();
    let before = pc.stats();
    assert_eq!(before.nodes, before.reduced_nodes + copy.len());

    pc.reduce().unwrap();

    let after = pc.stats();
    assert_eq!(after.nodes, after.reduced_nodes, "duplicates are freed");
    assert_eq!(after.reduced_nodes, before.reduced_nodes);
    let mut left = copy.nodes();
    let mut right = m.nodes();
    left.sort();
    right.sort();
    assert_eq!(left, right, "perfect sharing after reduce");
    for node in clone_nodes {
        assert_eq!(pc.order(node), Err(PowerCircuitError::StaleNode { node }));
    }
}

#[test]
fn reduce_on_a_reduced_circuit_is_a_no_op() {
    let mut pc = checked_circuit();
    let _ = pc.create_marking(999);
    let digest = snapshot::reduced_prefix_digest(&pc).unwrap();
    let stats = pc.stats();
    pc.reduce().unwrap();
    pc.reduce().unwrap();
    assert_eq!(pc.stats(), stats);
    assert_eq!(snapshot::reduced_prefix_digest(&pc).unwrap(), digest);
}

#[test]
fn duplicate_units_carry_into_higher_powers() {
    let mut pc = checked_circuit();
    let one = pc.create_marking(1);
    let two = pc.create_marking(2);
    let a = pc.clone_marking(&one).unwrap();
    let b = pc.clone_marking(&one).unwrap();
    // 1 + 1 + 1 + 2 = 5 with three separate unit nodes.
    let ab = pc.add(&a, &b).unwrap();
    let ab1 = pc.add(&ab, &one).unwrap();
    let total = pc.add(&ab1, &two).unwrap();
    assert_eq!(total.len(), 4);

    pc.reduce().unwrap();
    assert!(pc.is_reduced(&total).unwrap());
    assert_value(&mut pc, &total, 5);
    assert_value(&mut pc, &ab, 2);
    assert_value(&mut pc, &ab1, 3);
    pc.check_consistency().unwrap();
}

#[test]
fn opposite_duplicates_cancel_in_holders() {
    let mut pc = checked_circuit();
    let eight = pc.create_marking(8);
    let copy = pc.clone_marking(&eight).unwrap();
    let neg = pc.invert(&copy).unwrap();
    let diff = pc.add(&eight, &neg).unwrap();
    assert_eq!(diff.len(), 2);
    pc.reduce().unwrap();
    assert!(diff.is_empty());
}

#[test]
fn subset_reduction_leaves_unrelated_nodes_pending() {
    let mut pc = checked_circuit();
    let three = pc.create_marking(3);
    let a = pc.clone_marking(&three).unwrap();
    let b = pc.clone_marking(&three).unwrap();
    pc.reduce_markings(std::slice::from_ref(&a)).unwrap();
    assert!(pc.is_reduced(&a).unwrap());
    assert!(!pc.is_reduced(&b).unwrap());
    assert_eq!(pc.stats().nodes, pc.stats().reduced_nodes + b.len());

    let b_nodes = b.nodes();
    pc.reduce_nodes(&b_nodes, std::slice::from_ref(&b)).unwrap();
    assert!(pc.is_reduced(&b).unwrap());
    assert_eq!(pc.compare(&a, &b).unwrap(), Ordering::Equal);
}

#[test]
fn explicit_frontiers_are_validated() {
    let mut pc = checked_circuit();
    let four = pc.create_marking(4);
    let reduced = four.nodes()[0];
    assert_eq!(
        pc.reduce_nodes(&[reduced], &[]),
        Err(PowerCircuitError::AlreadyReduced { node: reduced })
    );

    // inner -> leaf, but only `inner` is offered.
    let leaf_marking = pc.clone_marking(&four).unwrap();
    let leaf = leaf_marking.nodes()[0];
    let inner = pc.create_node(&leaf_marking).unwrap();
    assert_eq!(
        pc.reduce_nodes(&[inner], &[]),
        Err(PowerCircuitError::OutsideFrontier { node: leaf })
    );
    let outer = pc.create_marking_from_nodes(&[inner]).unwrap();
    assert_eq!(
        pc.reduce_nodes(&[leaf], std::slice::from_ref(&outer)),
        Err(PowerCircuitError::OutsideFrontier { node: inner })
    );

    pc.reduce_nodes(&[inner, leaf], std::slice::from_ref(&outer))
        .unwrap();
    // outer = 2^4
    let exponent = pc.create_marking(4);
    let expected = tower(&mut pc, &exponent);
    assert_eq!(pc.compare(&outer, &expected).unwrap(), Ordering::Equal);
}

#[test]
fn cycles_are_reported_and_leave_the_circuit_untouched() {
    let mut pc = checked_circuit();
    let one = pc.create_marking(1);
    let a = pc.clone_marking(&one).unwrap();
    let b = pc.clone_marking(&one).unwrap();
    pc.connect(&a, &b).unwrap();
    let a_node = a.nodes()[0];
    let b_node = b.nodes()[0];
    // The checked config refuses to close the loop.
    assert_eq!(
        pc.connect(&b, &a),
        Err(PowerCircuitError::CycleDetected { node: b_node })
    );
    assert_eq!(pc.successors(b_node).unwrap(), Vec::new());
    assert_eq!(pc.successors(a_node).unwrap(), vec![(b_node, Sign::Plus)]);
}

#[test]
fn reduce_detects_cycles_built_without_checks() {
    let mut pc = power_circuit::GraphCircuit::with_config(power_circuit::CircuitConfig::unchecked());
    let one = pc.create_marking(1);
    let a = pc.clone_marking(&one).unwrap();
    let b = pc.clone_marking(&one).unwrap();
    pc.connect(&a, &b).unwrap();
    pc.connect(&b, &a).unwrap();
    let stats = pc.stats();
    let err = pc.reduce().unwrap_err();
    assert!(matches!(err, PowerCircuitError::CycleDetected { .. }));
    assert_eq!(pc.stats(), stats);
    assert!(matches!(
        pc.check_consistency(),
        Err(PowerCircuitError::CycleDetected { .. })
    ));
}

#[test]
fn nodes_lists_the_reduced_prefix_first() {
    let mut pc = checked_circuit();
    let six = pc.create_marking(6);
    let pending = pc.clone_marking(&six).unwrap();
    let nodes = pc.nodes();
    let prefix: Vec<_> = (0..pc.reduced_len())
        .map(|r| pc.reduced_node(r).unwrap())
        .collect();
    assert_eq!(&nodes[..prefix.len()], prefix.as_slice());
    let mut tail = nodes[prefix.len()..].to_vec();
    let mut expected = pending.nodes();
    tail.sort();
    expected.sort();
    assert_eq!(tail, expected);
}

#[test]
fn display_lists_ranks_and_markings() {
    let mut pc = checked_circuit();
    let _m = pc.create_marking(5);
    let dump = pc.to_string();
    assert!(dump.contains("3 nodes (3 reduced)"), "{dump}");
    assert!(dump.contains("#0"));
    assert!(dump.contains("m0"));
}
