//! # Cryptographic Primitives
//!
//! Thin, type-safe wrappers around audited implementations: SHA-256 for
//! transaction IDs, BLAKE3 for contract address derivation, Ed25519 for
//! ordinary-input signatures. Nothing here is hand-rolled.

pub mod hash;
pub mod keys;

pub use hash::{blake3_hash, double_sha256, domain_separated_hash, sha256};
pub use keys::{KeyError, LedgerKeypair, PublicKey};
