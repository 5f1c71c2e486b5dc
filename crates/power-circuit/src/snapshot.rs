// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical digest of the reduced prefix.
//!
//! Encoding (all integers little-endian `u64`):
//! - domain tag `b"power-circuit:reduced-prefix:v1"`
//! - length of the reduced prefix
//! - for each rank, ascending: number of successor entries, then for each
//!   entry in ascending rank order its rank followed by one sign byte
//!   (`0xFF` minus, `0x01` plus)
//!
//! Node slots and circuit ids are not part of the encoding, so two circuits
//! whose reduced prefixes have the same shape hash identically.

use blake3::Hasher;

use crate::circuit::PowerCircuit;
use crate::error::PowerCircuitError;

/// 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

const DOMAIN: &[u8] = b"power-circuit:reduced-prefix:v1";

/// Digest of the reduced prefix of `circuit`.
pub fn reduced_prefix_digest(circuit: &dyn PowerCircuit) -> Result<Hash, PowerCircuitError> {
    let mut hasher = Hasher::new();
    hasher.update(DOMAIN);
    let len = circuit.reduced_len();
    hasher.update(&(len as u64).to_le_bytes());
    for rank in 0..len {
        let Some(node) = circuit.reduced_node(rank) else {
            break;
        };
        let mut entries = Vec::new();
        for (succ, sign) in circuit.successors(node)? {
            let Some(succ_rank) = circuit.order(succ)? else {
                return Err(PowerCircuitError::InvariantViolated(format!(
                    "reduced {node} references non-reduced {succ}"
                )));
            };
            entries.push((succ_rank as u64, sign.to_i8()));
        }
        entries.sort_unstable();
        hasher.update(&(entries.len() as u64).to_le_bytes());
        for (succ_rank, sign) in entries {
            hasher.update(&succ_rank.to_le_bytes());
            hasher.update(&sign.to_le_bytes());
        }
    }
    Ok(hasher.finalize().into())
}
