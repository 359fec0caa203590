//! # Transaction Module
//!
//! Construction, signing and structural verification of UTXO transactions.
//! Every movement of value, including every contract operation, is a
//! [`Transaction`] consuming earlier outputs and creating new ones.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        — TxId, OutPoint, Lock/Unlock, TxIn/TxOut
//! builder.rs      — Transaction, canonical bytes, fluent TransactionBuilder
//! signing.rs      — Ed25519 signing of pending ordinary inputs
//! verification.rs — Structural checks run before ledger admission
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: a contract builder or [`TransactionBuilder`] assembles the
//!    inputs, outputs and annotation.
//! 2. **Sign**: [`sign_transaction`] signs the ordinary inputs.
//! 3. **Submit**: the ledger runs [`verify_transaction`], resolves inputs,
//!    checks signatures, then asks each spent contract to validate.
//! 4. **Confirm**: the next block moves it out of the mempool.
//!
//! ## Design Decisions
//!
//! - Transaction IDs are `double_sha256` of a hand-written canonical byte
//!   format, never of serde output: the faucet proof-of-work gate depends on
//!   the exact bytes, and serde gives no such guarantee across formats.
//! - All amounts are `u64` in the smallest denomination. No floating point
//!   anywhere near monetary values.
//! - Contract state lives in the annotation channel, an opaque byte vector
//!   this module never interprets.

pub mod builder;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{Transaction, TransactionBuilder};
pub use signing::sign_transaction;
pub use types::{Lock, OutPoint, TxId, TxIn, TxOut, Unlock};
pub use verification::{verify_transaction, TransactionError};
