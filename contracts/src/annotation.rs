//! # Annotation Codec
//!
//! Contract records travel in a transaction's annotation channel with a
//! fixed, version-free layout:
//!
//! ```text
//! [evalcode:1][tag:1][fields, little-endian, fixed width per tag]
//!
//! rewards 'F'  plan:8 apr:8 min_seconds:8 max_seconds:8 min_deposit:8   42 bytes
//! rewards 'L'  plan:8 funding_txid:32                                    42 bytes
//! rewards 'U'  plan:8 funding_txid:32                                    42 bytes
//! rewards 'A'  plan:8 funding_txid:32                                    42 bytes
//! faucet  'F'                                                             2 bytes
//! faucet  'G'  nonce:4                                                    6 bytes
//! ```
//!
//! This is the one compatibility-sensitive byte format in the system.
//! Decoding is total: any input that is absent, carries another contract's
//! evalcode, an unknown tag, or the wrong length decodes to `None`. It never
//! panics on untrusted bytes.

use std::fmt;

use ccpool_protocol::config::{EVAL_FAUCET, EVAL_REWARDS};
use ccpool_protocol::transaction::{Transaction, TxId};
use serde::{Deserialize, Serialize};

use crate::error::BuildError;

const TAG_FUNDING: u8 = b'F';
const TAG_LOCK: u8 = b'L';
const TAG_UNLOCK: u8 = b'U';
const TAG_ADD_FUNDING: u8 = b'A';
const TAG_FAUCET_FUND: u8 = b'F';
const TAG_FAUCET_GET: u8 = b'G';

const REWARDS_RECORD_LEN: usize = 2 + 8 + 32;
const FAUCET_GET_LEN: usize = 2 + 4;

// ---------------------------------------------------------------------------
// PlanName
// ---------------------------------------------------------------------------

/// A plan identifier: up to eight ASCII characters packed big-endian into
/// a `u64` ("plan bits"). `"OOT"` packs to `0x4f4f54`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanName(u64);

impl PlanName {
    /// Packs a name. Rejects empty names, names longer than eight bytes and
    /// anything that is not printable ASCII.
    pub fn new(name: &str) -> Result<Self, BuildError> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > 8 || !bytes.iter().all(u8::is_ascii_graphic) {
            return Err(BuildError::InvalidPlanName {
                name: name.to_string(),
            });
        }
        let bits = bytes
            .iter()
            .fold(0u64, |bits, &b| (bits << 8) | u64::from(b));
        Ok(Self(bits))
    }

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlanName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        f.write_str(&String::from_utf8_lossy(&bytes[start..]))
    }
}

// ---------------------------------------------------------------------------
// Rewards records
// ---------------------------------------------------------------------------

/// The parameters a Funding record fixes for the lifetime of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanParams {
    /// Annual rate on the `COIN` fixed-point scale (`COIN` = 100%).
    pub apr: u64,
    pub min_seconds: u64,
    pub max_seconds: u64,
    pub min_deposit: u64,
}

/// A decoded Rewards annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardsRecord {
    /// Declares a plan. The transaction carrying it *is* the plan.
    Funding { plan: PlanName, params: PlanParams },
    /// A deposit into the pool.
    Lock { plan: PlanName, funding_txid: TxId },
    /// A withdrawal of principal plus reward.
    Unlock { plan: PlanName, funding_txid: TxId },
    /// Additional reward funds.
    AddFunding { plan: PlanName, funding_txid: TxId },
}

impl RewardsRecord {
    pub fn plan(&self) -> PlanName {
        match self {
            RewardsRecord::Funding { plan, .. }
            | RewardsRecord::Lock { plan, .. }
            | RewardsRecord::Unlock { plan, .. }
            | RewardsRecord::AddFunding { plan, .. } => *plan,
        }
    }

    /// The funding txid a non-Funding record points at.
    pub fn funding_reference(&self) -> Option<TxId> {
        match self {
            RewardsRecord::Funding { .. } => None,
            RewardsRecord::Lock { funding_txid, .. }
            | RewardsRecord::Unlock { funding_txid, .. }
            | RewardsRecord::AddFunding { funding_txid, .. } => Some(*funding_txid),
        }
    }

    /// Whether a record found in transaction `txid` belongs to the plan
    /// declared by `funding_txid`.
    pub fn belongs_to(&self, txid: &TxId, plan: PlanName, funding_txid: &TxId) -> bool {
        if self.plan() != plan {
            return false;
        }
        match self.funding_reference() {
            None => txid == funding_txid,
            Some(reference) => &reference == funding_txid,
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            RewardsRecord::Funding { .. } => TAG_FUNDING,
            RewardsRecord::Lock { .. } => TAG_LOCK,
            RewardsRecord::Unlock { .. } => TAG_UNLOCK,
            RewardsRecord::AddFunding { .. } => TAG_ADD_FUNDING,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(REWARDS_RECORD_LEN);
        buf.push(EVAL_REWARDS);
        buf.push(self.tag());
        buf.extend_from_slice(&self.plan().bits().to_le_bytes());
        match self {
            RewardsRecord::Funding { params, .. } => {
                buf.extend_from_slice(&params.apr.to_le_bytes());
                buf.extend_from_slice(&params.min_seconds.to_le_bytes());
                buf.extend_from_slice(&params.max_seconds.to_le_bytes());
                buf.extend_from_slice(&params.min_deposit.to_le_bytes());
            }
            RewardsRecord::Lock { funding_txid, .. }
            | RewardsRecord::Unlock { funding_txid, .. }
            | RewardsRecord::AddFunding { funding_txid, .. } => {
                buf.extend_from_slice(funding_txid.as_bytes());
            }
        }
        buf
    }

    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() != REWARDS_RECORD_LEN || data[0] != EVAL_REWARDS {
            return None;
        }
        let plan = PlanName::from_bits(read_u64(data, 2)?);
        let tag = data[1];
        if tag == TAG_FUNDING {
            return Some(RewardsRecord::Funding {
                plan,
                params: PlanParams {
                    apr: read_u64(data, 10)?,
                    min_seconds: read_u64(data, 18)?,
                    max_seconds: read_u64(data, 26)?,
                    min_deposit: read_u64(data, 34)?,
                },
            });
        }

        let funding_txid = TxId::from_bytes(data.get(10..42)?.try_into().ok()?);
        match tag {
            TAG_LOCK => Some(RewardsRecord::Lock { plan, funding_txid }),
            TAG_UNLOCK => Some(RewardsRecord::Unlock { plan, funding_txid }),
            TAG_ADD_FUNDING => Some(RewardsRecord::AddFunding { plan, funding_txid }),
            _ => None,
        }
    }

    /// Decodes the annotation of `tx`, `None` if it has none.
    pub fn from_transaction(tx: &Transaction) -> Option<Self> {
        tx.annotation.as_deref().and_then(Self::decode)
    }
}

// ---------------------------------------------------------------------------
// Faucet records
// ---------------------------------------------------------------------------

/// A decoded Faucet annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaucetRecord {
    /// Tops up the faucet pool.
    Fund,
    /// A proof-of-work-gated disbursement. `nonce` is the value the
    /// grinder settled on.
    Get { nonce: u32 },
}

impl FaucetRecord {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            FaucetRecord::Fund => vec![EVAL_FAUCET, TAG_FAUCET_FUND],
            FaucetRecord::Get { nonce } => {
                let mut buf = Vec::with_capacity(FAUCET_GET_LEN);
                buf.push(EVAL_FAUCET);
                buf.push(TAG_FAUCET_GET);
                buf.extend_from_slice(&nonce.to_le_bytes());
                buf
            }
        }
    }

    pub fn decode(data: &[u8]) -> Option<Self> {
        match data {
            [EVAL_FAUCET, TAG_FAUCET_FUND] => Some(FaucetRecord::Fund),
            [EVAL_FAUCET, TAG_FAUCET_GET, a, b, c, d] => Some(FaucetRecord::Get {
                nonce: u32::from_le_bytes([*a, *b, *c, *d]),
            }),
            _ => None,
        }
    }

    pub fn from_transaction(tx: &Transaction) -> Option<Self> {
        tx.annotation.as_deref().and_then(Self::decode)
    }
}

fn read_u64(data: &[u8], offset: usize) -> Option<u64> {
    let bytes: [u8; 8] = data.get(offset..offset + 8)?.try_into().ok()?;
    Some(u64::from_le_bytes(bytes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
