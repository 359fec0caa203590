//! # LedgerDb — Persistent Storage Engine
//!
//! Persistence for the reference ledger, built on sled's embedded key-value
//! store. The ledger's indices (UTXO set, address history) are never stored:
//! they are rebuilt by replaying blocks, so the only durable facts are the
//! blocks themselves and the mempool in admission order.
//!
//! ## Tree Layout
//!
//! | Tree       | Key                   | Value                  |
//! |------------|-----------------------|------------------------|
//! | `blocks`   | `height` (8B BE)      | `bincode(Block)`       |
//! | `mempool`  | `sequence` (8B BE)    | `bincode(Transaction)` |
//! | `metadata` | key (UTF-8)           | value (bytes)          |
//!
//! Heights and mempool sequence numbers are big-endian so that sled's
//! lexicographic ordering matches numeric ordering: iterating a tree yields
//! blocks by height and mempool entries in admission order.

use sled::{Batch, Db, Tree};
use std::path::Path;

use super::block::Block;
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Well-known key in the `metadata` tree for the latest block height.
const META_LATEST_HEIGHT: &[u8] = b"latest_block_height";

// ---------------------------------------------------------------------------
// LedgerDb
// ---------------------------------------------------------------------------

/// Persistent storage for blocks and pending transactions.
///
/// sled trees support concurrent reads and serialized writes, so a
/// `LedgerDb` can be cloned and shared freely.
#[derive(Debug, Clone)]
pub struct LedgerDb {
    db: Db,
    blocks: Tree,
    mempool: Tree,
    metadata: Tree,
}

impl LedgerDb {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database that is removed when dropped.
    pub fn open_temporary() -> DbResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let blocks = db.open_tree("blocks")?;
        let mempool = db.open_tree("mempool")?;
        let metadata = db.open_tree("metadata")?;
        Ok(Self {
            db,
            blocks,
            mempool,
            metadata,
        })
    }

    // -- Block operations ---------------------------------------------------

    /// Persist a block and drop the mempool entries it confirmed.
    ///
    /// The reference ledger confirms its whole mempool in every block, so
    /// the mempool tree is simply cleared.
    pub fn put_block(&self, block: &Block) -> DbResult<()> {
        let height_key = block.height().to_be_bytes();
        let bytes = encode(block)?;

        let mut batch = Batch::default();
        batch.insert(&height_key, bytes);
        self.blocks.apply_batch(batch)?;
        self.metadata.insert(META_LATEST_HEIGHT, &height_key)?;
        self.mempool.clear()?;

        self.db.flush()?;
        Ok(())
    }

    /// Retrieve a block by height.
    pub fn get_block(&self, height: u64) -> DbResult<Option<Block>> {
        match self.blocks.get(height.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every stored block in ascending height order.
    pub fn blocks(&self) -> DbResult<Vec<Block>> {
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for result in self.blocks.iter() {
            let (_key, value) = result?;
            blocks.push(decode(&value)?);
        }
        Ok(blocks)
    }

    /// The latest persisted block height, `None` for an empty database.
    pub fn latest_height(&self) -> DbResult<Option<u64>> {
        match self.metadata.get(META_LATEST_HEIGHT)? {
            Some(bytes) => {
                let height = u64::from_be_bytes(
                    bytes
                        .as_ref()
                        .try_into()
                        .map_err(|_| DbError::Serialization("invalid height bytes".to_string()))?,
                );
                Ok(Some(height))
            }
            None => Ok(None),
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    // -- Mempool operations -------------------------------------------------

    /// Append an admitted transaction to the persisted mempool.
    pub fn put_mempool_transaction(&self, tx: &Transaction) -> DbResult<()> {
        let sequence = self.db.generate_id()?;
        self.mempool.insert(sequence.to_be_bytes(), encode(tx)?)?;
        self.db.flush()?;
        Ok(())
    }

    /// Persisted mempool transactions in admission order.
    pub fn mempool_transactions(&self) -> DbResult<Vec<Transaction>> {
        let mut txs = Vec::with_capacity(self.mempool.len());
        for result in self.mempool.iter() {
            let (_key, value) = result?;
            txs.push(decode(&value)?);
        }
        Ok(txs)
    }

    /// Force a flush of all pending writes to disk.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn encode<T: serde::Serialize>(value: &T) -> DbResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| DbError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> DbResult<T> {
    bincode::deserialize(bytes).map_err(|e| DbError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
