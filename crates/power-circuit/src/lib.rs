// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! power-circuit: succinct shared representation of integers.
//!
//! A power circuit is a DAG of nodes. Each node has a *successor marking*, a
//! signed sum of other nodes, and the node's value is `2^(successor value)`.
//! A [`Marking`] names a signed sum of nodes and so denotes one integer.
//! Values as large as towers of exponentials fit in polynomial space.
//!
//! Construction (`create_marking`, `clone_marking`, `connect`) produces
//! non-reduced structure. [`PowerCircuit::reduce`] then sorts nodes by value
//! and merges duplicates, which makes reduced markings comparable.
//!
//! ```
//! use power_circuit::{GraphCircuit, PowerCircuit};
//! use std::cmp::Ordering;
//!
//! let mut pc = GraphCircuit::new();
//! // 2^3 built as a tower: a fresh unit node whose successor is 3.
//! let three = pc.create_marking(3);
//! let unit = pc.create_marking(1);
//! let tower = pc.clone_marking(&unit)?;
//! pc.connect(&tower, &three)?;
//! pc.reduce()?;
//!
//! let eight = pc.create_marking(8);
//! assert_eq!(pc.compare(&tower, &eight)?, Ordering::Equal);
//! # Ok::<(), power_circuit::PowerCircuitError>(())
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod circuit;
mod config;
mod error;
mod graph;
mod ident;
mod marking;
mod reduce;
/// Graphviz export.
pub mod render;
mod sign;
/// Canonical digests of the reduced prefix.
pub mod snapshot;
mod stats;
mod validate;

/// Backend-independent contract.
pub use circuit::PowerCircuit;
/// Runtime policy.
pub use config::CircuitConfig;
/// Contract violations.
pub use error::PowerCircuitError;
/// Adjacency-list backend.
pub use graph::GraphCircuit;
/// Handle types.
pub use ident::{CircuitId, MarkingId, Node};
/// Marking handles and entries.
pub use marking::{Marking, Term};
/// Ternary digit.
pub use sign::Sign;
/// Size counters.
pub use stats::CircuitStats;
