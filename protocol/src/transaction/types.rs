//! Core value types for UTXO transactions: identifiers, outpoints, and the
//! lock/unlock pair that decides who may spend an output.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::crypto::keys::PublicKey;
use crate::identity::Address;

// ---------------------------------------------------------------------------
// TxId
// ---------------------------------------------------------------------------

/// A transaction identifier: `double_sha256` of the canonical bytes.
///
/// Serialized as lowercase hex in every serde format so that JSON output and
/// sled records read the same way as log lines.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TxId([u8; 32]);

impl TxId {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a 64-character hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s.trim()).ok()?;
        let array: [u8; 32] = bytes.as_slice().try_into().ok()?;
        Some(Self(array))
    }

    /// The all-zero id. Never the id of a real transaction.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self.to_hex())
    }
}

impl Serialize for TxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TxId::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid txid hex: {}", s)))
    }
}

// ---------------------------------------------------------------------------
// OutPoint
// ---------------------------------------------------------------------------

/// Reference to a specific output of a specific transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: TxId,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: TxId, vout: u32) -> Self {
        Self { txid, vout }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

// ---------------------------------------------------------------------------
// Unlock / Lock
// ---------------------------------------------------------------------------

/// How an input proves it may spend its previous output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unlock {
    /// Ordinary input awaiting a signature.
    Pending,

    /// Ordinary input signed by the key owning the previous output.
    Signature {
        public_key: PublicKey,
        signature: Vec<u8>,
    },

    /// Contract input. Authorized only if the contract with this evalcode
    /// accepts the whole transaction.
    Contract { evalcode: u8 },
}

impl Unlock {
    /// The evalcode of a contract input, `None` for ordinary inputs.
    pub fn evalcode(&self) -> Option<u8> {
        match self {
            Unlock::Contract { evalcode } => Some(*evalcode),
            _ => None,
        }
    }
}

/// Who may spend an output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lock {
    /// Spendable by the key behind an ordinary address.
    Address(Address),

    /// Spendable only under the rules of the contract with this evalcode.
    /// `address` is always `Address::contract_pool(evalcode)`.
    Contract { evalcode: u8, address: Address },
}

impl Lock {
    /// A lock paying the pool of the contract identified by `evalcode`.
    pub fn contract(evalcode: u8) -> Self {
        Lock::Contract {
            evalcode,
            address: Address::contract_pool(evalcode),
        }
    }

    /// The address this lock pays, for either variant.
    pub fn address(&self) -> &Address {
        match self {
            Lock::Address(address) => address,
            Lock::Contract { address, .. } => address,
        }
    }

    /// The evalcode of a contract lock, `None` for ordinary locks.
    pub fn evalcode(&self) -> Option<u8> {
        match self {
            Lock::Contract { evalcode, .. } => Some(*evalcode),
            Lock::Address(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// TxIn / TxOut
// ---------------------------------------------------------------------------

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub prevout: OutPoint,
    pub unlock: Unlock,
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: u64,
    pub lock: Lock,
}

impl TxOut {
    /// An output paying an ordinary address.
    pub fn to_address(address: Address, value: u64) -> Self {
        Self {
            value,
            lock: Lock::Address(address),
        }
    }

    /// An output paying a contract pool.
    pub fn to_contract(evalcode: u8, value: u64) -> Self {
        Self {
            value,
            lock: Lock::contract(evalcode),
        }
    }

    /// Returns `true` if this output pays `address`.
    pub fn pays(&self, address: &Address) -> bool {
        self.lock.address() == address
    }
}
