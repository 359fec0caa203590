//! # Block Structure
//!
//! A block confirms an ordered batch of transactions at one height and one
//! chain time. Block time is the only clock contracts ever read: reward
//! accrual and faucet address freshness are measured in block time and
//! block height, never in wall-clock time at the validating node.
//!
//! ## Hash Computation
//!
//! The block hash is BLAKE3 over `height || time || parent_hash || tx_root`.
//! `tx_root` is BLAKE3 over the concatenated txids in block order; empty
//! blocks have a tx_root of all zeros.

use serde::{Deserialize, Serialize};

use crate::crypto::hash::blake3_hash;
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// BlockHeader
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block height (genesis = 0).
    pub height: u64,
    /// Chain time in Unix seconds.
    pub time: u64,
    /// Hash of the parent header. All zeros for genesis.
    pub parent_hash: [u8; 32],
    pub tx_root: [u8; 32],
    pub hash: [u8; 32],
}

impl BlockHeader {
    fn compute_hash(&self) -> [u8; 32] {
        let mut buf = Vec::with_capacity(80);
        buf.extend_from_slice(&self.height.to_le_bytes());
        buf.extend_from_slice(&self.time.to_le_bytes());
        buf.extend_from_slice(&self.parent_hash);
        buf.extend_from_slice(&self.tx_root);
        blake3_hash(&buf)
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// The empty block at height 0.
    pub fn genesis(time: u64) -> Self {
        Self::assemble(0, time, [0u8; 32], Vec::new())
    }

    /// A block extending `parent`.
    pub fn new(parent: &BlockHeader, time: u64, transactions: Vec<Transaction>) -> Self {
        Self::assemble(parent.height + 1, time, parent.hash, transactions)
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn time(&self) -> u64 {
        self.header.time
    }

    /// Recomputes tx_root and hash and compares them with the header.
    pub fn verify_hash(&self) -> bool {
        self.header.tx_root == tx_root(&self.transactions)
            && self.header.hash == self.header.compute_hash()
    }

    fn assemble(
        height: u64,
        time: u64,
        parent_hash: [u8; 32],
        transactions: Vec<Transaction>,
    ) -> Self {
        let mut header = BlockHeader {
            height,
            time,
            parent_hash,
            tx_root: tx_root(&transactions),
            hash: [0u8; 32],
        };
        header.hash = header.compute_hash();
        Self {
            header,
            transactions,
        }
    }
}

fn tx_root(transactions: &[Transaction]) -> [u8; 32] {
    if transactions.is_empty() {
        return [0u8; 32];
    }
    let mut buf = Vec::with_capacity(transactions.len() * 32);
    for tx in transactions {
        buf.extend_from_slice(tx.txid().as_bytes());
    }
    blake3_hash(&buf)
}
