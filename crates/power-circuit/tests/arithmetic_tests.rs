// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

mod common;

use std::cmp::Ordering;

use common::{assert_value, checked_circuit, sum};
use power_circuit::{PowerCircuit, PowerCircuitError, Sign};

#[test]
fn six_plus_minus_six_is_zero() {
    let mut pc = checked_circuit();
    let six = pc.create_marking(6);
    let minus_six = pc.create_marking(-6);
    let total = pc.add(&six, &minus_six).unwrap();
    pc.reduce().unwrap();
    let zero = pc.create_marking(0);
    assert_eq!(pc.compare(&total, &zero).unwrap(), Ordering::Equal);
    assert!(total.is_empty());
}

#[test]
fn five_incremented_twice_is_seven() {
    let mut pc = checked_circuit();
    let five = pc.create_marking(5);
    let six = pc.increment(&five).unwrap();
    let seven = pc.increment(&six).unwrap();
    pc.reduce().unwrap();
    assert_value(&mut pc, &seven, 7);
    assert_value(&mut pc, &five, 5);
}

#[test]
fn increment_of_reduced_markings_stays_reduced() {
    let mut pc = checked_circuit();
    for v in -20..20 {
        let m = pc.create_marking(v);
        let next = pc.increment(&m).unwrap();
        assert!(pc.is_reduced(&next).unwrap(), "{v} + 1 should be reduced");
        assert_value(&mut pc, &next, v + 1);
    }
    pc.check_consistency().unwrap();
}

#[test]
fn increment_carries_into_a_new_top_node() {
    let mut pc = checked_circuit();
    let fifteen = pc.create_marking(15);
    assert_eq!(pc.reduced_len(), 4);
    let sixteen = pc.increment(&fifteen).unwrap();
    assert_eq!(pc.reduced_len(), 5);
    assert_eq!(sixteen.len(), 1);
    assert_eq!(pc.order(sixteen.nodes()[0]).unwrap(), Some(4));
    assert_value(&mut pc, &sixteen, 16);
}

#[test]
fn increment_of_non_reduced_appends_a_unit_node() {
    let mut pc = checked_circuit();
    let three = pc.create_marking(3);
    let copy = pc.clone_marking(&three).unwrap();
    let nodes_before = pc.stats().nodes;
    let four = pc.increment(&copy).unwrap();
    assert!(!pc.is_reduced(&four).unwrap());
    assert_eq!(four.len(), copy.len() + 1);
    assert_eq!(pc.stats().nodes, nodes_before + 1);
    assert_eq!(pc.compare(&four, &three), Err(PowerCircuitError::NotReduced));

    pc.reduce().unwrap();
    assert_value(&mut pc, &four, 4);
}

#[test]
fn adding_an_inverse_cancels() {
    let mut pc = checked_circuit();
    for v in [-37, -1, 1, 2, 1000, 123_456] {
        let m = pc.create_marking(v);
        let neg = pc.invert(&m).unwrap();
        let total = pc.add(&m, &neg).unwrap();
        pc.reduce().unwrap();
        assert_value(&mut pc, &total, 0);
    }
}

#[test]
fn double_negation_is_identity() {
    let mut pc = checked_circuit();
    let m = pc.create_marking(-77);
    let once = pc.invert(&m).unwrap();
    let twice = pc.invert(&once).unwrap();
    assert_eq!(pc.compare(&twice, &m).unwrap(), Ordering::Equal);
    assert_value(&mut pc, &once, 77);
}

#[test]
fn sums_of_cloned_operands_are_exact() {
    let mut pc = checked_circuit();
    let cases = [(5, 7), (15, 1), (-9, 9), (100, -250), (63, 63), (0, -4)];
    for (a, b) in cases {
        let ma = pc.create_marking(a);
        let mb = pc.create_marking(b);
        let total = sum(&mut pc, &ma, &mb);
        assert_value(&mut pc, &total, a + b);
    }
    pc.check_consistency().unwrap();
}

#[test]
fn add_reports_overflowing_entries() {
    let mut pc = checked_circuit();
    let three = pc.create_marking(3);
    let err = pc.add(&three, &three).unwrap_err();
    assert!(matches!(err, PowerCircuitError::SignOverflow { .. }));
}

#[test]
fn intersect_keeps_entries_with_matching_signs() {
    let mut pc = checked_circuit();
    let a = pc.create_marking(0b0111);
    let b = pc.create_marking(0b1101);
    let unit = pc.reduced_node(0).unwrap();
    let four = pc.reduced_node(2).unwrap();
    let both = pc.intersect(&a, &b).unwrap();
    let mut nodes = both.nodes();
    nodes.sort();
    let mut expected = vec![unit, four];
    expected.sort();
    assert_eq!(nodes, expected);

    let neg = pc.invert(&b).unwrap();
    let none = pc.intersect(&a, &neg).unwrap();
    assert!(none.is_empty());
}

#[test]
fn compare_rejects_non_reduced_markings() {
    let mut pc = checked_circuit();
    let two = pc.create_marking(2);
    let a = pc.clone_marking(&two).unwrap();
    let b = pc.clone_marking(&two).unwrap();
    assert_eq!(pc.compare(&a, &b), Err(PowerCircuitError::NotReduced));
    assert_eq!(pc.compare(&two, &b), Err(PowerCircuitError::NotReduced));
    assert_eq!(pc.smallest_node(&a), Err(PowerCircuitError::NotReduced));
}

#[test]
fn copy_marking_shares_nodes_but_not_storage() {
    let mut pc = checked_circuit();
    let m = pc.create_marking(10);
    let copy = pc.copy_marking(&m).unwrap();
    assert!(!copy.same_marking(&m));
    assert_eq!(copy.terms(), m.terms());
    assert_eq!(copy.sign(m.nodes()[0]), Sign::Plus);
    assert_eq!(pc.compare(&copy, &m).unwrap(), Ordering::Equal);
}
