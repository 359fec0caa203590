//! Ledger error types.

use thiserror::Error;

use crate::storage::DbError;
use crate::transaction::{OutPoint, TransactionError, TxId};

/// Errors from ledger queries, admission and persistence.
///
/// Admission errors are reported in the order the ledger checks them, so
/// the first violated rule is the one returned.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The transaction failed structural verification.
    #[error("invalid transaction: {0}")]
    Invalid(#[from] TransactionError),

    /// Coinbase transactions only enter the ledger through a block.
    #[error("coinbase transactions cannot be submitted")]
    CoinbaseNotAllowed,

    #[error("transaction {txid} already known")]
    Duplicate { txid: TxId },

    /// An input references an output that does not exist.
    #[error("input {outpoint} not found")]
    MissingInput { outpoint: OutPoint },

    /// An input references an output already spent, on chain or in the mempool.
    #[error("input {outpoint} already spent")]
    AlreadySpent { outpoint: OutPoint },

    /// A signed input spends an output that does not pay the signer.
    #[error("input {index} is not owned by its signer")]
    WrongOwner { index: usize },

    #[error("input {index} has an invalid signature")]
    BadSignature { index: usize },

    /// Contract inputs must spend pool outputs of the same contract, and
    /// ordinary inputs must never spend pool outputs.
    #[error("input {index} uses the wrong spend path for its output")]
    SpendPathMismatch { index: usize },

    #[error("inputs {inputs} less than outputs {outputs}")]
    InsufficientInputValue { inputs: u64, outputs: u64 },

    #[error("no validator registered for evalcode 0x{evalcode:02x}")]
    NoValidator { evalcode: u8 },

    /// A contract validator refused the transaction. `reason` is the
    /// contract's stable reason string.
    #[error("contract 0x{evalcode:02x} rejected transaction: {reason}")]
    ContractRejected { evalcode: u8, reason: String },

    /// Block times never go backwards.
    #[error("block time {time} is before tip time {tip_time}")]
    InvalidBlockTime { time: u64, tip_time: u64 },

    /// A stored chain could not be replayed.
    #[error("corrupt chain data: {0}")]
    Corrupt(String),

    #[error("storage error: {0}")]
    Storage(#[from] DbError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
