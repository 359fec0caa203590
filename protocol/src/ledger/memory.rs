//! # MemoryLedger — Reference Host
//!
//! A single-node UTXO ledger that plays the host role for contracts: it
//! admits transactions into a mempool, asks contract validators to approve
//! every contract spend, and confirms the mempool into blocks on demand.
//!
//! ## Admission Order
//!
//! [`MemoryLedger::submit`] checks, returning the first failure:
//!
//! 1. structural verification ([`verify_transaction`]),
//! 2. not a coinbase, not already known,
//! 3. every input resolves to an unspent output (confirmed or pending),
//! 4. signed inputs spend outputs owned by the signer, with a valid signature,
//! 5. contract inputs spend pool outputs of their own contract,
//! 6. input value covers output value,
//! 7. every contract whose pool is spent accepts the transaction.
//!
//! ## Locking
//!
//! Chain state sits behind a `parking_lot::RwLock`. Submissions and block
//! production serialize on a separate admission mutex, and contract
//! validators run while holding only that mutex: they query the ledger
//! through [`LedgerView`], which takes short read locks of its own.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::error::{LedgerError, LedgerResult};
use super::mempool::Mempool;
use super::view::{
    AddressHistoryEntry, ChainTip, Confirmation, ContractValidator, LedgerView, TxLookup,
    UnspentOutput,
};
use crate::config::contract_name;
use crate::identity::Address;
use crate::storage::{Block, BlockHeader, LedgerDb};
use crate::transaction::{
    verify_transaction, Lock, OutPoint, Transaction, TxId, TxOut, Unlock,
};

// ---------------------------------------------------------------------------
// Chain state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct ConfirmedTx {
    transaction: Transaction,
    height: u64,
    time: u64,
}

#[derive(Debug, Clone)]
struct Utxo {
    output: TxOut,
    height: u64,
}

/// Everything derived from confirmed blocks.
#[derive(Debug, Default)]
struct ChainState {
    headers: Vec<BlockHeader>,
    transactions: HashMap<TxId, ConfirmedTx>,
    utxos: BTreeMap<OutPoint, Utxo>,
    unspent_by_address: HashMap<Address, BTreeSet<OutPoint>>,
    history: HashMap<Address, Vec<AddressHistoryEntry>>,
}

impl ChainState {
    fn tip(&self) -> Option<&BlockHeader> {
        self.headers.last()
    }

    fn apply_block(&mut self, block: &Block) {
        let height = block.height();
        let time = block.time();

        for tx in &block.transactions {
            let txid = tx.txid();

            for input in &tx.inputs {
                if let Some(spent) = self.utxos.remove(&input.prevout) {
                    if let Some(set) = self.unspent_by_address.get_mut(spent.output.lock.address()) {
                        set.remove(&input.prevout);
                    }
                }
            }

            let mut paid: Vec<&Address> = Vec::new();
            for (vout, output) in tx.outputs.iter().enumerate() {
                let outpoint = OutPoint::new(txid, vout as u32);
                let address = output.lock.address();
                self.utxos.insert(
                    outpoint,
                    Utxo {
                        output: output.clone(),
                        height,
                    },
                );
                self.unspent_by_address
                    .entry(address.clone())
                    .or_default()
                    .insert(outpoint);
                if !paid.contains(&address) {
                    paid.push(address);
                }
            }
            for address in paid {
                self.history
                    .entry(address.clone())
                    .or_default()
                    .push(AddressHistoryEntry { txid, height });
            }

            self.transactions.insert(
                txid,
                ConfirmedTx {
                    transaction: tx.clone(),
                    height,
                    time,
                },
            );
        }

        self.headers.push(block.header.clone());
    }
}

// ---------------------------------------------------------------------------
// MemoryLedger
// ---------------------------------------------------------------------------

/// In-memory reference ledger, optionally backed by a [`LedgerDb`].
pub struct MemoryLedger {
    chain: RwLock<ChainState>,
    mempool: Mempool,
    validators: RwLock<HashMap<u8, Arc<dyn ContractValidator>>>,
    admission: Mutex<()>,
    store: Option<LedgerDb>,
}

impl std::fmt::Debug for MemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chain = self.chain.read();
        f.debug_struct("MemoryLedger")
            .field("height", &chain.tip().map(|h| h.height))
            .field("mempool", &self.mempool.len())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

impl MemoryLedger {
    /// A fresh, non-persistent ledger holding only a genesis block.
    pub fn new(genesis_time: u64) -> Self {
        let mut state = ChainState::default();
        state.apply_block(&Block::genesis(genesis_time));
        Self::from_state(state, None)
    }

    /// Opens a persistent ledger.
    ///
    /// An empty store is initialized with a genesis block at
    /// `genesis_time`. Otherwise every stored block is replayed, then the
    /// persisted mempool is re-admitted through the full admission path
    /// with `validators` registered; pending transactions that no longer
    /// pass are dropped with a warning.
    pub fn open(
        db: LedgerDb,
        genesis_time: u64,
        validators: Vec<Arc<dyn ContractValidator>>,
    ) -> LedgerResult<Self> {
        let blocks = db.blocks()?;
        let mut state = ChainState::default();

        if blocks.is_empty() {
            let genesis = Block::genesis(genesis_time);
            db.put_block(&genesis)?;
            state.apply_block(&genesis);
            info!(time = genesis_time, "initialized genesis block");
        } else {
            for (expected, block) in blocks.iter().enumerate() {
                if block.height() != expected as u64 || !block.verify_hash() {
                    return Err(LedgerError::Corrupt(format!(
                        "block at position {} has height {}",
                        expected,
                        block.height()
                    )));
                }
                if let Some(tip) = state.tip() {
                    if block.header.parent_hash != tip.hash {
                        return Err(LedgerError::Corrupt(format!(
                            "block {} does not extend its parent",
                            block.height()
                        )));
                    }
                }
                state.apply_block(block);
            }
        }

        let pending = db.mempool_transactions()?;
        let ledger = Self::from_state(state, Some(db));
        for validator in validators {
            ledger.register_validator(validator);
        }

        let mut restored = 0usize;
        for tx in pending {
            let txid = tx.txid();
            match ledger.admit(tx, false) {
                Ok(_) => restored += 1,
                Err(e) => warn!(%txid, error = %e, "dropping persisted mempool transaction"),
            }
        }

        let tip = ledger.tip()?;
        info!(height = tip.height, mempool = restored, "ledger restored");
        Ok(ledger)
    }

    fn from_state(state: ChainState, store: Option<LedgerDb>) -> Self {
        Self {
            chain: RwLock::new(state),
            mempool: Mempool::new(),
            validators: RwLock::new(HashMap::new()),
            admission: Mutex::new(()),
            store,
        }
    }

    /// Registers the consensus hook for one contract. A later registration
    /// for the same evalcode replaces the earlier one.
    pub fn register_validator(&self, validator: Arc<dyn ContractValidator>) {
        let evalcode = validator.evalcode();
        debug!(contract = %contract_name(evalcode), "registered contract validator");
        self.validators.write().insert(evalcode, validator);
    }

    /// Admits a signed transaction into the mempool.
    pub fn submit(&self, tx: Transaction) -> LedgerResult<TxId> {
        self.admit(tx, true)
    }

    fn admit(&self, tx: Transaction, persist: bool) -> LedgerResult<TxId> {
        let _guard = self.admission.lock();

        verify_transaction(&tx)?;
        if tx.is_coinbase() {
            return Err(LedgerError::CoinbaseNotAllowed);
        }

        let txid = tx.txid();
        if self.mempool.contains(&txid) || self.chain.read().transactions.contains_key(&txid) {
            return Err(LedgerError::Duplicate { txid });
        }

        let spent_outputs = self.resolve_inputs(&tx)?;
        self.check_spend_paths(&tx, &spent_outputs)?;

        let mut input_total: u64 = 0;
        for output in &spent_outputs {
            input_total = input_total.saturating_add(output.value);
        }
        // verify_transaction already bounded the output sum
        let output_total = tx.output_total().unwrap_or(u64::MAX);
        if input_total < output_total {
            return Err(LedgerError::InsufficientInputValue {
                inputs: input_total,
                outputs: output_total,
            });
        }

        for evalcode in tx.contract_evalcodes() {
            let validator = self
                .validators
                .read()
                .get(&evalcode)
                .cloned()
                .ok_or(LedgerError::NoValidator { evalcode })?;
            if let Err(reason) = validator.validate(self, &tx) {
                warn!(%txid, contract = %contract_name(evalcode), %reason, "contract rejected transaction");
                return Err(LedgerError::ContractRejected { evalcode, reason });
            }
        }

        if persist {
            if let Some(store) = &self.store {
                store.put_mempool_transaction(&tx)?;
            }
        }
        self.mempool.insert(tx);
        debug!(%txid, fee = input_total - output_total, "admitted transaction");
        Ok(txid)
    }

    /// The outputs spent by each input, in input order.
    fn resolve_inputs(&self, tx: &Transaction) -> LedgerResult<Vec<TxOut>> {
        let chain = self.chain.read();
        let mut outputs = Vec::with_capacity(tx.inputs.len());

        for input in &tx.inputs {
            let outpoint = input.prevout;
            if self.mempool.is_spent(&outpoint) {
                return Err(LedgerError::AlreadySpent { outpoint });
            }

            if let Some(utxo) = chain.utxos.get(&outpoint) {
                outputs.push(utxo.output.clone());
                continue;
            }
            if chain.transactions.contains_key(&outpoint.txid) {
                return Err(LedgerError::AlreadySpent { outpoint });
            }

            let pending = self
                .mempool
                .get(&outpoint.txid)
                .and_then(|parent| parent.outputs.get(outpoint.vout as usize).cloned());
            match pending {
                Some(output) => outputs.push(output),
                None => return Err(LedgerError::MissingInput { outpoint }),
            }
        }

        Ok(outputs)
    }

    fn check_spend_paths(&self, tx: &Transaction, spent: &[TxOut]) -> LedgerResult<()> {
        let sighash = tx.sighash();

        for (index, (input, output)) in tx.inputs.iter().zip(spent).enumerate() {
            match (&input.unlock, &output.lock) {
                (
                    Unlock::Signature {
                        public_key,
                        signature,
                    },
                    Lock::Address(owner),
                ) => {
                    if &Address::from_public_key(public_key) != owner {
                        return Err(LedgerError::WrongOwner { index });
                    }
                    if !public_key.verify(&sighash, signature) {
                        return Err(LedgerError::BadSignature { index });
                    }
                }
                (Unlock::Contract { evalcode }, Lock::Contract { evalcode: locked, .. })
                    if evalcode == locked => {}
                _ => return Err(LedgerError::SpendPathMismatch { index }),
            }
        }

        Ok(())
    }

    /// Confirms the whole mempool, in admission order, into a new block at
    /// `time`. `coinbase` transactions are placed first.
    pub fn mine_block(&self, time: u64, coinbase: Vec<Transaction>) -> LedgerResult<Block> {
        let _guard = self.admission.lock();

        let tip = self.current_tip();
        if time < tip.time {
            return Err(LedgerError::InvalidBlockTime {
                time,
                tip_time: tip.time,
            });
        }
        if coinbase.iter().any(|tx| !tx.is_coinbase()) {
            return Err(LedgerError::Corrupt(
                "coinbase list contains a transaction with inputs".to_string(),
            ));
        }

        let mut transactions = coinbase;
        transactions.extend(self.mempool.transactions());

        let mut chain = self.chain.write();
        let parent = chain
            .tip()
            .cloned()
            .ok_or_else(|| LedgerError::Corrupt("ledger has no genesis".to_string()))?;
        let block = Block::new(&parent, time, transactions);

        if let Some(store) = &self.store {
            store.put_block(&block)?;
        }
        chain.apply_block(&block);
        self.mempool.drain();

        info!(
            height = block.height(),
            time,
            transactions = block.transactions.len(),
            "mined block"
        );
        Ok(block)
    }

    fn current_tip(&self) -> ChainTip {
        let chain = self.chain.read();
        chain
            .tip()
            .map(|h| ChainTip {
                height: h.height,
                time: h.time,
            })
            .unwrap_or(ChainTip { height: 0, time: 0 })
    }

    // -- Convenience queries -------------------------------------------------

    /// Sum of confirmed unspent outputs paying `address`.
    pub fn balance(&self, address: &Address) -> LedgerResult<u64> {
        Ok(self
            .address_unspents(address)?
            .iter()
            .map(|u| u.value)
            .sum())
    }

    pub fn mempool_len(&self) -> usize {
        self.mempool.len()
    }

    /// Pending transactions in admission order.
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.mempool.transactions()
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }
}

// ---------------------------------------------------------------------------
// LedgerView
// ---------------------------------------------------------------------------

impl LedgerView for MemoryLedger {
    fn get_transaction(&self, txid: &TxId) -> LedgerResult<Option<TxLookup>> {
        if let Some(confirmed) = self.chain.read().transactions.get(txid) {
            return Ok(Some(TxLookup {
                transaction: confirmed.transaction.clone(),
                confirmation: Confirmation::Confirmed {
                    height: confirmed.height,
                    time: confirmed.time,
                },
            }));
        }
        Ok(self.mempool.get(txid).map(|transaction| TxLookup {
            transaction,
            confirmation: Confirmation::Mempool,
        }))
    }

    fn address_history(&self, address: &Address) -> LedgerResult<Vec<AddressHistoryEntry>> {
        Ok(self
            .chain
            .read()
            .history
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    fn address_unspents(&self, address: &Address) -> LedgerResult<Vec<UnspentOutput>> {
        let chain = self.chain.read();
        let Some(outpoints) = chain.unspent_by_address.get(address) else {
            return Ok(Vec::new());
        };
        Ok(outpoints
            .iter()
            .filter_map(|outpoint| {
                chain.utxos.get(outpoint).map(|utxo| UnspentOutput {
                    outpoint: *outpoint,
                    value: utxo.output.value,
                    height: utxo.height,
                })
            })
            .collect())
    }

    fn is_spent_in_mempool(&self, outpoint: &OutPoint) -> LedgerResult<bool> {
        Ok(self.mempool.is_spent(outpoint))
    }

    fn tip(&self) -> LedgerResult<ChainTip> {
        Ok(self.current_tip())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
