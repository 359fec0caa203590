//! # Ledger Module
//!
//! The host side of the contract boundary.
//!
//! ## Architecture
//!
//! ```text
//! view.rs    — LedgerView query trait and the ContractValidator hook
//! mempool.rs — Admission-ordered pending transaction pool
//! memory.rs  — MemoryLedger, the reference host (UTXO set, indices, blocks)
//! error.rs   — LedgerError
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! builder ──► sign ──► MemoryLedger::submit ──► ContractValidator::validate
//!                              │                        │
//!                              ▼                        ▼
//!                           Mempool ◄──────────── LedgerView queries
//!                              │
//!                      mine_block ──► LedgerDb
//! ```
//!
//! Contracts only ever see `&dyn LedgerView`. Any host that can answer
//! those five queries can run them; `MemoryLedger` is the one this
//! workspace ships.

pub mod error;
pub mod memory;
pub mod mempool;
pub mod view;

pub use error::{LedgerError, LedgerResult};
pub use memory::MemoryLedger;
pub use mempool::Mempool;
pub use view::{
    AddressHistoryEntry, ChainTip, Confirmation, ContractValidator, LedgerView, TxLookup,
    UnspentOutput,
};
