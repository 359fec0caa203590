//! The query surface contracts see, and the hook the ledger calls them through.
//!
//! Contracts never hold ledger state. Every fact they need (does a plan
//! exist, what is in the pool, how old is this output) is recomputed on
//! each call from these queries.

use serde::{Deserialize, Serialize};

use super::error::LedgerResult;
use crate::identity::Address;
use crate::transaction::{OutPoint, Transaction, TxId};

/// Where a transaction currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confirmation {
    /// Admitted but not yet in a block.
    Mempool,
    Confirmed { height: u64, time: u64 },
}

impl Confirmation {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Confirmation::Confirmed { .. })
    }
}

/// A transaction together with its confirmation status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxLookup {
    pub transaction: Transaction,
    pub confirmation: Confirmation,
}

/// One confirmed transaction paying an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressHistoryEntry {
    pub txid: TxId,
    pub height: u64,
}

/// One confirmed, unspent output paying an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    pub outpoint: OutPoint,
    pub value: u64,
    pub height: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTip {
    pub height: u64,
    pub time: u64,
}

/// Read-only ledger queries.
///
/// Orders are stable: history comes back in confirmation order, unspents in
/// outpoint order. Contract logic relies on that stability for
/// first-match-wins lookups.
pub trait LedgerView {
    fn get_transaction(&self, txid: &TxId) -> LedgerResult<Option<TxLookup>>;

    /// Confirmed transactions with at least one output paying `address`.
    fn address_history(&self, address: &Address) -> LedgerResult<Vec<AddressHistoryEntry>>;

    /// Confirmed outputs paying `address` that no block has spent yet.
    /// Outputs spent only in the mempool are still listed.
    fn address_unspents(&self, address: &Address) -> LedgerResult<Vec<UnspentOutput>>;

    fn is_spent_in_mempool(&self, outpoint: &OutPoint) -> LedgerResult<bool>;

    fn tip(&self) -> LedgerResult<ChainTip>;
}

/// Consensus hook for one contract.
///
/// The ledger calls `validate` for every transaction spending at least one
/// output locked to `evalcode()`. An `Err` carries the stable reason string
/// of the first rule the transaction violates.
pub trait ContractValidator: Send + Sync {
    fn evalcode(&self) -> u8;

    fn validate(&self, ledger: &dyn LedgerView, tx: &Transaction) -> Result<(), String>;
}
