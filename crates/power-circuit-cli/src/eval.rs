// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Builds markings for parsed expressions.

use power_circuit::{GraphCircuit, Marking, PowerCircuit, PowerCircuitError};
use thiserror::Error;
use tracing::debug;

use crate::expr::{AddOp, Expr};

/// Evaluation failures.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A circuit operation rejected its inputs.
    #[error(transparent)]
    Circuit(#[from] PowerCircuitError),
    /// `2^e` with `e < 0` is not an integer.
    #[error("exponent of 2^(...) is negative")]
    NegativeExponent,
}

/// Evaluates `expr` into a reduced marking of `pc`.
///
/// Every node built along the way is reduced too, so duplicates created by
/// cloning operands are merged back into the prefix.
pub fn evaluate(pc: &mut GraphCircuit, expr: &Expr) -> Result<Marking, EvalError> {
    let marking = build(pc, expr)?;
    pc.reduce()?;
    debug!(marking = %marking.id(), stats = %pc.stats(), "evaluated");
    Ok(marking)
}

fn build(pc: &mut GraphCircuit, expr: &Expr) -> Result<Marking, EvalError> {
    match expr {
        Expr::Int(value) => Ok(pc.create_marking(*value)),
        Expr::Neg(inner) => {
            let m = build(pc, inner)?;
            Ok(pc.invert(&m)?)
        }
        Expr::Sum(first, rest) => {
            let mut total = build(pc, first)?;
            for (op, term) in rest {
                let term = build(pc, term)?;
                total = combine(pc, &total, &term, *op)?;
            }
            Ok(total)
        }
        Expr::Pow2(exponent) => {
            let exponent = build(pc, exponent)?;
            pc.reduce_markings(std::slice::from_ref(&exponent))?;
            let zero = pc.create_marking(0);
            if pc.compare(&exponent, &zero)?.is_lt() {
                return Err(EvalError::NegativeExponent);
            }
            let unit = pc.create_marking(1);
            let top = pc.clone_marking(&unit)?;
            pc.connect(&top, &exponent)?;
            Ok(top)
        }
    }
}

// Operands are cloned so that `add` only ever meets disjoint node sets.
fn combine(
    pc: &mut GraphCircuit,
    lhs: &Marking,
    rhs: &Marking,
    op: AddOp,
) -> Result<Marking, EvalError> {
    let lhs = pc.clone_marking(lhs)?;
    let mut rhs = pc.clone_marking(rhs)?;
    if op == AddOp::Minus {
        rhs = pc.invert(&rhs)?;
    }
    Ok(pc.add(&lhs, &rhs)?)
}
