//! Structural transaction verification.
//!
//! [`verify_transaction`] looks at a transaction in isolation: shape,
//! limits, arithmetic. Anything that needs ledger state (do the inputs
//! exist, do signatures match the outputs they spend, does a contract
//! accept the spend) is the ledger's job at admission time.

use std::collections::HashSet;
use thiserror::Error;

use super::builder::Transaction;
use super::types::{OutPoint, Unlock};
use crate::config::{MAX_ANNOTATION_LENGTH, MAX_MONEY, MAX_TX_INPUTS, MAX_TX_OUTPUTS};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Structural failures. Each variant maps to one rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// A transaction must create at least one output.
    #[error("transaction has no outputs")]
    NoOutputs,

    #[error("too many inputs: {count} (max {max})")]
    TooManyInputs { count: usize, max: usize },

    #[error("too many outputs: {count} (max {max})")]
    TooManyOutputs { count: usize, max: usize },

    /// The same previous output is spent twice within one transaction.
    #[error("duplicate input {outpoint}")]
    DuplicateInput { outpoint: OutPoint },

    /// Output values overflow or exceed the money supply.
    #[error("output value out of range")]
    ValueOutOfRange,

    #[error("annotation too long: {len} bytes (max {max})")]
    AnnotationTooLong { len: usize, max: usize },

    /// An ordinary input was never signed.
    #[error("input {index} is unsigned")]
    UnsignedInput { index: usize },
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verifies a transaction's structure.
///
/// The checks, in order:
///
/// 1. **Outputs**: at least one.
/// 2. **Counts**: inputs and outputs within limits.
/// 3. **Duplicate inputs**: no outpoint spent twice.
/// 4. **Value range**: output sum fits in `MAX_MONEY`.
/// 5. **Annotation**: within `MAX_ANNOTATION_LENGTH`.
/// 6. **Signed**: no input left `Pending`.
///
/// # Errors
///
/// Returns the first failing check.
pub fn verify_transaction(tx: &Transaction) -> Result<(), TransactionError> {
    if tx.outputs.is_empty() {
        return Err(TransactionError::NoOutputs);
    }

    if tx.inputs.len() > MAX_TX_INPUTS {
        return Err(TransactionError::TooManyInputs {
            count: tx.inputs.len(),
            max: MAX_TX_INPUTS,
        });
    }
    if tx.outputs.len() > MAX_TX_OUTPUTS {
        return Err(TransactionError::TooManyOutputs {
            count: tx.outputs.len(),
            max: MAX_TX_OUTPUTS,
        });
    }

    let mut seen = HashSet::with_capacity(tx.inputs.len());
    for input in &tx.inputs {
        if !seen.insert(input.prevout) {
            return Err(TransactionError::DuplicateInput {
                outpoint: input.prevout,
            });
        }
    }

    match tx.output_total() {
        Some(total) if total <= MAX_MONEY => {}
        _ => return Err(TransactionError::ValueOutOfRange),
    }

    if let Some(annotation) = &tx.annotation {
        if annotation.len() > MAX_ANNOTATION_LENGTH {
            return Err(TransactionError::AnnotationTooLong {
                len: annotation.len(),
                max: MAX_ANNOTATION_LENGTH,
            });
        }
    }

    if let Some(index) = tx
        .inputs
        .iter()
        .position(|input| matches!(input.unlock, Unlock::Pending))
    {
        return Err(TransactionError::UnsignedInput { index });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
