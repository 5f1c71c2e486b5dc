// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier and handle types for circuits, nodes and markings.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CIRCUIT: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one circuit instance.
///
/// Handles carry the id of the circuit that issued them so that mixing
/// handles across circuits is caught at the API boundary.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CircuitId(u64);

impl CircuitId {
    pub(crate) fn fresh() -> Self {
        Self(NEXT_CIRCUIT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pc{}", self.0)
    }
}

/// Handle to one vertex of a circuit.
///
/// `generation` is bumped whenever the slot is freed, so a handle to a
/// removed or merged node is detected as stale rather than silently
/// aliasing whatever reuses the slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node {
    pub(crate) circuit: CircuitId,
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Node {
    /// Circuit that owns this node.
    pub const fn circuit(self) -> CircuitId {
        self.circuit
    }

    /// Arena slot of this node. Stable for the node's lifetime and
    /// preserved by whole-circuit cloning.
    pub const fn index(self) -> u32 {
        self.index
    }

    pub(crate) const fn slot(self) -> usize {
        self.index as usize
    }

    pub(crate) const fn rehome(self, circuit: CircuitId) -> Self {
        Self {
            circuit,
            index: self.index,
            generation: self.generation,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.index)?;
        if self.generation != 0 {
            write!(f, "@{}", self.generation)?;
        }
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Identity of a marking, unique within its circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkingId(pub(crate) u64);

impl MarkingId {
    /// Raw numeric id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MarkingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}
