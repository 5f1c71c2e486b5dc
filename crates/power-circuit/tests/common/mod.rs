// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code, clippy::expect_used)]

use std::cmp::Ordering;

use power_circuit::{CircuitConfig, GraphCircuit, Marking, PowerCircuit};

/// Circuit with every contract check enabled, regardless of build profile.
pub fn checked_circuit() -> GraphCircuit {
    GraphCircuit::with_config(CircuitConfig::checked())
}

/// `2^exponent` as a reduced marking: a fresh unit node whose successor
/// marking is `exponent`.
pub fn tower(pc: &mut GraphCircuit, exponent: &Marking) -> Marking {
    let unit = pc.create_marking(1);
    let top = pc.clone_marking(&unit).expect("clone unit node");
    pc.connect(&top, exponent).expect("connect exponent");
    pc.reduce_markings(std::slice::from_ref(&top))
        .expect("reduce tower");
    top
}

/// `a + b` as a reduced marking, cloning both operands first so that shared
/// nodes never collide.
pub fn sum(pc: &mut GraphCircuit, a: &Marking, b: &Marking) -> Marking {
    let a = pc.clone_marking(a).expect("clone lhs");
    let b = pc.clone_marking(b).expect("clone rhs");
    let total = pc.add(&a, &b).expect("disjoint add");
    pc.reduce_markings(std::slice::from_ref(&total))
        .expect("reduce sum");
    total
}

/// Asserts that reduced `marking` equals the integer `value`.
pub fn assert_value(pc: &mut GraphCircuit, marking: &Marking, value: i64) {
    let expected = pc.create_marking(value);
    assert_eq!(
        pc.compare(marking, &expected).expect("compare reduced markings"),
        Ordering::Equal,
        "marking {marking:?} should equal {value}"
    );
}

/// Tiny deterministic RNG (xorshift64*) so tests don't need `rand`.
#[derive(Clone)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Creates a new PRNG with the given seed; a zero seed is replaced by 1.
    pub fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    /// Next value of the xorshift64* sequence.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Pseudo-random value in `[-bound, bound]`.
    pub fn next_signed(&mut self, bound: i64) -> i64 {
        let span = (bound as u64) * 2 + 1;
        (self.next_u64() % span) as i64 - bound
    }
}
