// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ccpool Protocol — Ledger Primitives
//!
//! Everything a contract needs from the ledger it runs on, and nothing it
//! doesn't: a UTXO transaction model with a byte-exact canonical form, the
//! addresses and keys that own outputs, and the query/hook boundary through
//! which a host ledger and its contracts talk to each other.
//!
//! ## Architecture
//!
//! - **config**: Consensus constants. Changing one is a hard fork.
//! - **crypto**: SHA-256, BLAKE3 and Ed25519 wrappers. Don't roll your own.
//! - **identity**: Ordinary and contract-pool addresses.
//! - **transaction**: Transaction model, canonical bytes, signing, verification.
//! - **ledger**: `LedgerView`, `ContractValidator`, and the `MemoryLedger` host.
//! - **storage**: Blocks and their sled persistence.
//!
//! ## Design Philosophy
//!
//! 1. Consensus bytes are written by hand, never by a serializer.
//! 2. Contracts hold no state; the ledger is the database.
//! 3. If it touches money, it has tests. Plural.

pub mod config;
pub mod crypto;
pub mod identity;
pub mod ledger;
pub mod storage;
pub mod transaction;

pub use identity::Address;
pub use ledger::{ContractValidator, LedgerError, LedgerResult, LedgerView, MemoryLedger};
pub use storage::LedgerDb;
pub use transaction::{OutPoint, Transaction, TransactionBuilder, TxId};
