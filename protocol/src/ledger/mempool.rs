//! Admission-ordered transaction pool.
//!
//! Holds transactions that passed admission but are not yet in a block.
//! Besides the transactions themselves it indexes which outpoints they
//! spend, which is what the faucet selector's double-spend guard and the
//! ledger's conflict check read.
//!
//! ## Design
//!
//! - `DashMap` gives lock-free concurrent reads on the hot path
//!   (`is_spent`, `get`), which contract validators and selectors hit once
//!   per candidate output.
//! - `parking_lot::RwLock<Vec<TxId>>` keeps admission order. Blocks confirm
//!   in that order, so a transaction spending another unconfirmed output is
//!   always applied after its parent.

use std::fmt;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::transaction::{OutPoint, Transaction, TxId};

/// A thread-safe mempool.
#[derive(Default)]
pub struct Mempool {
    /// Pending transactions indexed by txid.
    transactions: DashMap<TxId, Transaction>,

    /// Outpoint -> txid of the pending transaction spending it.
    spent: DashMap<OutPoint, TxId>,

    /// Admission order.
    order: RwLock<Vec<TxId>>,
}

impl fmt::Debug for Mempool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mempool")
            .field("size", &self.transactions.len())
            .finish()
    }
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an admitted transaction.
    ///
    /// Returns `false` without modifying the pool if a transaction with the
    /// same id is already present. Conflict checks are the ledger's job and
    /// must have happened before this call.
    pub fn insert(&self, tx: Transaction) -> bool {
        let txid = tx.txid();
        if self.transactions.contains_key(&txid) {
            return false;
        }
        for input in &tx.inputs {
            self.spent.insert(input.prevout, txid);
        }
        self.order.write().push(txid);
        self.transactions.insert(txid, tx);
        true
    }

    /// Returns a clone of the transaction with the given id, if present.
    pub fn get(&self, txid: &TxId) -> Option<Transaction> {
        self.transactions.get(txid).map(|e| e.value().clone())
    }

    pub fn contains(&self, txid: &TxId) -> bool {
        self.transactions.contains_key(txid)
    }

    /// The pending transaction spending `outpoint`, if any.
    pub fn spender_of(&self, outpoint: &OutPoint) -> Option<TxId> {
        self.spent.get(outpoint).map(|e| *e.value())
    }

    pub fn is_spent(&self, outpoint: &OutPoint) -> bool {
        self.spent.contains_key(outpoint)
    }

    /// Pending transactions in admission order.
    pub fn transactions(&self) -> Vec<Transaction> {
        let order = self.order.read();
        order.iter().filter_map(|txid| self.get(txid)).collect()
    }

    /// Removes and returns every pending transaction in admission order.
    pub fn drain(&self) -> Vec<Transaction> {
        let order: Vec<TxId> = std::mem::take(&mut *self.order.write());
        let drained = order
            .iter()
            .filter_map(|txid| self.transactions.remove(txid).map(|(_, tx)| tx))
            .collect();
        self.spent.clear();
        drained
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
