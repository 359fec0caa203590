//! # Storage Module
//!
//! Blocks and their persistence.
//!
//! ## Architecture
//!
//! ```text
//! block.rs  — Block structure, genesis block, hash/verify operations
//! db.rs     — sled persistence of blocks and the pending mempool
//! ```
//!
//! ## Design Decisions
//!
//! 1. **Blocks are the source of truth.** The UTXO set and address indices
//!    are derived state, rebuilt by replay on every open.
//!
//! 2. **Bincode for on-disk serialization.** Compact and fast. JSON is for
//!    the CLI; bincode is for storage.

pub mod block;
pub mod db;

pub use block::{Block, BlockHeader};
pub use db::{DbError, DbResult, LedgerDb};
