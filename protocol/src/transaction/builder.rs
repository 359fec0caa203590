//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] assembles inputs, outputs, a lock time and an
//! optional annotation, then hands back an unsigned [`Transaction`]. The
//! builder does not sign: that happens in [`super::signing`], which keeps
//! construction testable without key material.

use serde::{Deserialize, Serialize};

use super::types::{Lock, OutPoint, TxId, TxIn, TxOut, Unlock};
use crate::config::TX_VERSION;
use crate::crypto::hash::double_sha256;
use crate::identity::Address;

// Canonical tags. Changing any of these changes every txid.
const UNLOCK_TAG_UNSIGNED: u8 = 0;
const UNLOCK_TAG_SIGNATURE: u8 = 1;
const UNLOCK_TAG_CONTRACT: u8 = 2;
const LOCK_TAG_ADDRESS: u8 = 0;
const LOCK_TAG_CONTRACT: u8 = 1;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A UTXO ledger transaction.
///
/// The identifier is not stored: it is always recomputed from the content
/// with [`Transaction::txid`], so a transaction can never carry a stale id.
///
/// # Canonical Byte Format
///
/// [`Transaction::to_bytes`] writes, in order and little-endian: version
/// (u16), input count (u32), each input (prevout txid, vout u32, unlock),
/// output count (u32), each output (value u64, lock), lock time (u64),
/// annotation (presence flag, u32 length, bytes). The faucet proof-of-work
/// gate inspects the hash of exactly these bytes, so builders and
/// validators must never hash anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u16,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,

    /// Chain time the transaction was built against. Coinbase transactions
    /// carry their block height here instead, which keeps their ids unique.
    pub lock_time: u64,

    /// The annotation channel: opaque, unspendable contract metadata.
    pub annotation: Option<Vec<u8>>,
}

impl Transaction {
    /// Canonical serialization. The transaction id is the double SHA-256
    /// of these bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode(false)
    }

    /// Canonical bytes with every unlock reduced to its kind, so that
    /// signing an input does not change what the other inputs signed.
    pub fn signable_bytes(&self) -> Vec<u8> {
        self.encode(true)
    }

    pub fn txid(&self) -> TxId {
        TxId::from_bytes(double_sha256(&self.to_bytes()))
    }

    /// The message every ordinary input signs.
    pub fn sighash(&self) -> [u8; 32] {
        double_sha256(&self.signable_bytes())
    }

    /// A dev-ledger coinbase creating `value` out of nothing for `address`.
    pub fn coinbase(address: Address, value: u64, height: u64) -> Self {
        Self {
            version: TX_VERSION,
            inputs: Vec::new(),
            outputs: vec![TxOut::to_address(address, value)],
            lock_time: height,
            annotation: None,
        }
    }

    /// A transaction without inputs only ever appears as a block coinbase.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Sum of output values, `None` on overflow.
    pub fn output_total(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.value))
    }

    /// Evalcodes of every contract whose pool this transaction spends, in
    /// first-seen order and without duplicates.
    pub fn contract_evalcodes(&self) -> Vec<u8> {
        let mut codes = Vec::new();
        for input in &self.inputs {
            if let Some(code) = input.unlock.evalcode() {
                if !codes.contains(&code) {
                    codes.push(code);
                }
            }
        }
        codes
    }

    /// Returns `true` if every ordinary input carries a signature.
    pub fn is_signed(&self) -> bool {
        !self
            .inputs
            .iter()
            .any(|input| matches!(input.unlock, Unlock::Pending))
    }

    fn encode(&self, blank_signatures: bool) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128 + self.inputs.len() * 48 + self.outputs.len() * 56);

        buf.extend_from_slice(&self.version.to_le_bytes());

        buf.extend_from_slice(&(self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            buf.extend_from_slice(input.prevout.txid.as_bytes());
            buf.extend_from_slice(&input.prevout.vout.to_le_bytes());
            match &input.unlock {
                Unlock::Pending => buf.push(UNLOCK_TAG_UNSIGNED),
                Unlock::Signature { .. } if blank_signatures => buf.push(UNLOCK_TAG_UNSIGNED),
                Unlock::Signature {
                    public_key,
                    signature,
                } => {
                    buf.push(UNLOCK_TAG_SIGNATURE);
                    buf.extend_from_slice(public_key.as_bytes());
                    buf.extend_from_slice(&(signature.len() as u16).to_le_bytes());
                    buf.extend_from_slice(signature);
                }
                Unlock::Contract { evalcode } => {
                    buf.push(UNLOCK_TAG_CONTRACT);
                    buf.push(*evalcode);
                }
            }
        }

        buf.extend_from_slice(&(self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            buf.extend_from_slice(&output.value.to_le_bytes());
            match &output.lock {
                Lock::Address(address) => {
                    buf.push(LOCK_TAG_ADDRESS);
                    write_str(&mut buf, address.as_str());
                }
                Lock::Contract { evalcode, address } => {
                    buf.push(LOCK_TAG_CONTRACT);
                    buf.push(*evalcode);
                    write_str(&mut buf, address.as_str());
                }
            }
        }

        buf.extend_from_slice(&self.lock_time.to_le_bytes());

        match &self.annotation {
            Some(data) => {
                buf.push(0x01);
                buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
                buf.extend_from_slice(data);
            }
            None => buf.push(0x00),
        }

        buf
    }
}

fn write_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u16).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned [`Transaction`] instances.
///
/// # Usage
///
/// ```rust
/// use ccpool_protocol::identity::Address;
/// use ccpool_protocol::transaction::{OutPoint, TransactionBuilder, TxId};
///
/// let funding = OutPoint::new(TxId::from_bytes([7u8; 32]), 0);
/// let tx = TransactionBuilder::new()
///     .ordinary_input(funding)
///     .pay_contract(0xe5, 50_000)
///     .annotation(vec![0xe5, b'L'])
///     .build();
///
/// assert_eq!(tx.inputs.len(), 1);
/// assert!(tx.outputs[0].pays(&Address::contract_pool(0xe5)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    inputs: Vec<TxIn>,
    outputs: Vec<TxOut>,
    lock_time: u64,
    annotation: Option<Vec<u8>>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an ordinary input that [`super::sign_transaction`] will sign.
    pub fn ordinary_input(mut self, prevout: OutPoint) -> Self {
        self.inputs.push(TxIn {
            prevout,
            unlock: Unlock::Pending,
        });
        self
    }

    /// Adds an input spending from a contract pool.
    pub fn contract_input(mut self, prevout: OutPoint, evalcode: u8) -> Self {
        self.inputs.push(TxIn {
            prevout,
            unlock: Unlock::Contract { evalcode },
        });
        self
    }

    /// Pays `value` to an ordinary address.
    pub fn pay(mut self, address: Address, value: u64) -> Self {
        self.outputs.push(TxOut::to_address(address, value));
        self
    }

    /// Pays `value` to the pool of the contract identified by `evalcode`.
    pub fn pay_contract(mut self, evalcode: u8, value: u64) -> Self {
        self.outputs.push(TxOut::to_contract(evalcode, value));
        self
    }

    pub fn lock_time(mut self, lock_time: u64) -> Self {
        self.lock_time = lock_time;
        self
    }

    pub fn annotation(mut self, data: Vec<u8>) -> Self {
        self.annotation = Some(data);
        self
    }

    /// Consumes the builder and produces an unsigned [`Transaction`].
    pub fn build(self) -> Transaction {
        Transaction {
            version: TX_VERSION,
            inputs: self.inputs,
            outputs: self.outputs,
            lock_time: self.lock_time,
            annotation: self.annotation,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
