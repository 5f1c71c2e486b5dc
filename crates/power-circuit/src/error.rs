// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use thiserror::Error;

use crate::ident::{CircuitId, Node};

/// Contract violations reported by circuit operations.
///
/// These are programmer errors in the calling algorithm, not data errors.
/// The circuit is left unchanged whenever an operation returns one of them,
/// except for [`PowerCircuitError::InvariantViolated`], which reports state
/// that is already broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PowerCircuitError {
    /// An operation that needs canonical input got a marking whose support
    /// contains non-reduced nodes.
    #[error("marking is not reduced")]
    NotReduced,
    /// `connect` was asked to extend the successors of a reduced node.
    #[error("can only connect non-reduced nodes; {node} is reduced")]
    TargetAlreadyReduced {
        /// The reduced node found in the target support.
        node: Node,
    },
    /// The successor relation contains, or would contain, a cycle.
    #[error("cycle detected through node {node}")]
    CycleDetected {
        /// A node on the cycle.
        node: Node,
    },
    /// A per-node sum left {-1, 0, 1}.
    #[error("sign overflow at node {node}")]
    SignOverflow {
        /// Node whose entry would overflow.
        node: Node,
    },
    /// A handle issued by a different circuit was passed in.
    #[error("handle belongs to circuit {found:?}, expected {expected:?}")]
    ForeignCircuit {
        /// The circuit the operation was called on.
        expected: CircuitId,
        /// The circuit that issued the handle.
        found: CircuitId,
    },
    /// The node was removed or merged into an equal node by `reduce`.
    #[error("node {node} no longer exists")]
    StaleNode {
        /// The stale handle.
        node: Node,
    },
    /// An explicit reduction frontier names an already reduced node.
    #[error("node {node} is already reduced")]
    AlreadyReduced {
        /// The offending node.
        node: Node,
    },
    /// An explicit reduction frontier depends on a non-reduced node that is
    /// not part of it.
    #[error("node {node} is neither reduced nor part of the frontier")]
    OutsideFrontier {
        /// The missing dependency.
        node: Node,
    },
    /// Node and sign lists differ in length.
    #[error("{nodes} nodes but {signs} signs")]
    LengthMismatch {
        /// Number of nodes supplied.
        nodes: usize,
        /// Number of signs supplied.
        signs: usize,
    },
    /// A structural invariant does not hold.
    #[error("invariant violated: {0}")]
    InvariantViolated(String),
}
