// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared fixtures for the power-circuit benchmarks.

use power_circuit::{GraphCircuit, Marking, PowerCircuit, PowerCircuitError};

/// Builds the marking `2^exponent`; `exponent` must be reduced and non-negative.
pub fn tower(pc: &mut GraphCircuit, exponent: &Marking) -> Result<Marking, PowerCircuitError> {
    let unit = pc.create_marking(1);
    let top = pc.clone_marking(&unit)?;
    pc.connect(&top, exponent)?;
    pc.reduce_markings(std::slice::from_ref(&top))?;
    Ok(top)
}

/// Deterministic values spread over `[-2^bits, 2^bits)`.
pub fn spread(count: usize, bits: u32) -> Vec<i64> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..count)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let span = 1_i64 << bits;
            (state % (2 * span as u64)) as i64 - span
        })
        .collect()
}
