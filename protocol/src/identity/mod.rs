//! # Identity Module
//!
//! Who can spend what. Every output on the ledger pays an [`Address`]:
//!
//! 1. **Ordinary**: derived from an Ed25519 public key; spent by signature.
//! 2. **Contract pool**: derived from a contract evalcode; spent only when
//!    that contract's validator accepts the spending transaction.
//!
//! ## Design Decisions
//!
//! - Addresses are hash prefixes, not raw keys, so a contract address and a
//!   key address share one textual space without ambiguity: the prefix
//!   character says which spend path applies.
//! - Pool and marker addresses use BLAKE3 derive-key contexts, so the same
//!   evalcode can never produce colliding pool and marker addresses.

pub mod address;

pub use address::Address;
