//! Ledger addresses.
//!
//! Two kinds of address exist, distinguished by their first character:
//!
//! - `R…`: ordinary, key-owned. Derived from an Ed25519 public key; an
//!   output paying one is spent with a signature from that key. Each
//!   contract also has an ordinary *marker* address used purely as an
//!   index anchor (the Rewards funding marker, for instance).
//! - `C…`: contract pool. Derived from an evalcode; outputs paying one are
//!   spendable only under the contract's validation rule.
//!
//! Both are 20-byte hash prefixes rendered as lowercase hex after the
//! prefix character.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{
    CONTRACT_ADDRESS_PREFIX, MARKER_ADDRESS_CONTEXT, ORDINARY_ADDRESS_PREFIX, POOL_ADDRESS_CONTEXT,
};
use crate::crypto::hash::{domain_separated_hash, sha256};
use crate::crypto::keys::PublicKey;

/// Length of the hash prefix encoded in an address.
const ADDRESS_HASH_LEN: usize = 20;

/// A ledger address in its textual form.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// The ordinary address owned by `public_key`.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let digest = sha256(public_key.as_bytes());
        Self::render(ORDINARY_ADDRESS_PREFIX, &digest)
    }

    /// The pool address of the contract identified by `evalcode`.
    pub fn contract_pool(evalcode: u8) -> Self {
        let digest = domain_separated_hash(POOL_ADDRESS_CONTEXT, &[evalcode]);
        Self::render(CONTRACT_ADDRESS_PREFIX, &digest)
    }

    /// The ordinary marker address of the contract identified by `evalcode`.
    ///
    /// No key is known for it, so value paid here is effectively burned.
    /// Builders only ever pay it a fee-sized marker output.
    pub fn contract_marker(evalcode: u8) -> Self {
        let digest = domain_separated_hash(MARKER_ADDRESS_CONTEXT, &[evalcode]);
        Self::render(ORDINARY_ADDRESS_PREFIX, &digest)
    }

    /// Parses a textual address, checking prefix and hex body.
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let prefix = chars.next()?;
        if prefix != ORDINARY_ADDRESS_PREFIX && prefix != CONTRACT_ADDRESS_PREFIX {
            return None;
        }
        let body = chars.as_str();
        if body.len() != ADDRESS_HASH_LEN * 2 {
            return None;
        }
        if !body.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)) {
            return None;
        }
        Some(Self(s.to_string()))
    }

    /// Returns `true` for `C…` pool addresses.
    pub fn is_contract(&self) -> bool {
        self.0.starts_with(CONTRACT_ADDRESS_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn render(prefix: char, digest: &[u8; 32]) -> Self {
        let mut s = String::with_capacity(1 + ADDRESS_HASH_LEN * 2);
        s.push(prefix);
        s.push_str(&hex::encode(&digest[..ADDRESS_HASH_LEN]));
        Self(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}
