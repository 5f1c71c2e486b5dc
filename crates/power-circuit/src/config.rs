// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

/// Runtime policy for a circuit instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CircuitConfig {
    /// Validate caller contracts that are otherwise trusted: sign overflow in
    /// `add`/`connect`, cycles introduced by `connect`, and a full
    /// consistency pass after every `reduce`.
    ///
    /// Defaults to on in debug builds and off in release builds.
    pub check_invariants: bool,
    /// Number of node slots to reserve up front.
    pub node_capacity: usize,
}

impl CircuitConfig {
    /// Configuration with every check enabled.
    pub const fn checked() -> Self {
        Self {
            check_invariants: true,
            node_capacity: 0,
        }
    }

    /// Configuration that trusts its callers.
    pub const fn unchecked() -> Self {
        Self {
            check_invariants: false,
            node_capacity: 0,
        }
    }
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            check_invariants: cfg!(debug_assertions),
            node_capacity: 0,
        }
    }
}
