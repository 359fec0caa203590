//! # UTXO Selection
//!
//! Walks an address's confirmed unspent outputs in outpoint order and
//! accumulates them toward a target. Two policies sit on top of the same
//! loop:
//!
//! - [`accumulate_to_target`] takes every output a caller-supplied filter
//!   accepts. Rewards uses it with an annotation re-check.
//! - [`threshold_accumulate`] additionally skips small outputs and outputs
//!   already spent by a pending transaction. The faucet uses it.
//!
//! Selection stops at the target or the input ceiling, whichever comes
//! first. A total below the target is a partial selection; callers must
//! treat it as "insufficient funds", never build from it.

use ccpool_protocol::ledger::{LedgerResult, LedgerView, UnspentOutput};
use ccpool_protocol::transaction::OutPoint;
use ccpool_protocol::Address;
use tracing::debug;

use crate::error::BuildError;

/// The outputs one selection picked, in the order picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub inputs: Vec<UnspentOutput>,
    pub total: u64,
}

impl Selection {
    pub fn covers(&self, target: u64) -> bool {
        self.total >= target
    }

    /// Turns a partial selection into [`BuildError::InsufficientFunds`].
    pub fn require(self, target: u64) -> Result<Self, BuildError> {
        if self.covers(target) {
            Ok(self)
        } else {
            Err(BuildError::InsufficientFunds {
                needed: target,
                available: self.total,
            })
        }
    }

    pub fn outpoints(&self) -> impl Iterator<Item = OutPoint> + '_ {
        self.inputs.iter().map(|u| u.outpoint)
    }
}

/// Accumulates outputs of `address` that `accept` admits.
///
/// `exclude` lists outputs the transaction under construction already
/// spends.
pub fn accumulate_to_target<F>(
    ledger: &dyn LedgerView,
    address: &Address,
    target: u64,
    max_inputs: usize,
    exclude: &[OutPoint],
    mut accept: F,
) -> LedgerResult<Selection>
where
    F: FnMut(&UnspentOutput) -> LedgerResult<bool>,
{
    let mut selection = Selection::default();

    for unspent in ledger.address_unspents(address)? {
        if selection.covers(target) || selection.inputs.len() >= max_inputs {
            break;
        }
        if exclude.contains(&unspent.outpoint) || !accept(&unspent)? {
            continue;
        }
        selection.total = selection.total.saturating_add(unspent.value);
        selection.inputs.push(unspent);
    }

    debug!(
        %address,
        target,
        selected = selection.total,
        inputs = selection.inputs.len(),
        "accumulated inputs"
    );
    Ok(selection)
}

/// Faucet policy: skips outputs under `target / (max_inputs + 1)`, outputs
/// worth exactly `fee`, outputs under `min_input`, and outputs a pending
/// transaction already spends.
pub fn threshold_accumulate(
    ledger: &dyn LedgerView,
    pool: &Address,
    target: u64,
    max_inputs: usize,
    min_input: u64,
    fee: u64,
    exclude: &[OutPoint],
) -> LedgerResult<Selection> {
    let threshold = target / (max_inputs as u64 + 1);

    accumulate_to_target(ledger, pool, target, max_inputs, exclude, |unspent| {
        if unspent.value < threshold || unspent.value == fee || unspent.value < min_input {
            return Ok(false);
        }
        if ledger.is_spent_in_mempool(&unspent.outpoint)? {
            return Ok(false);
        }
        // the source must still show this output paying the pool
        let pays_pool = ledger
            .get_transaction(&unspent.outpoint.txid)?
            .and_then(|lookup| {
                lookup
                    .transaction
                    .outputs
                    .get(unspent.outpoint.vout as usize)
                    .map(|output| output.pays(pool))
            })
            .unwrap_or(false);
        Ok(pays_pool)
    })
}

/// Ordinary funding from `owner`'s confirmed outputs, skipping anything a
/// pending transaction already spends.
pub fn select_ordinary(
    ledger: &dyn LedgerView,
    owner: &Address,
    target: u64,
    max_inputs: usize,
) -> LedgerResult<Selection> {
    accumulate_to_target(ledger, owner, target, max_inputs, &[], |unspent| {
        Ok(!ledger.is_spent_in_mempool(&unspent.outpoint)?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccpool_protocol::config::{COIN, EVAL_FAUCET};
    use ccpool_protocol::transaction::{Transaction, TransactionBuilder};
    use ccpool_protocol::MemoryLedger;

    fn pool() -> Address {
        Address::contract_pool(EVAL_FAUCET)
    }

    fn pool_coinbase(values: &[u64], height: u64) -> Transaction {
        values
            .iter()
            .fold(TransactionBuilder::new(), |b, v| b.pay_contract(EVAL_FAUCET, *v))
            .lock_time(height)
            .build()
    }

    fn ledger_with(values: &[u64]) -> (MemoryLedger, Transaction) {
        let ledger = MemoryLedger::new(1_000);
        let coinbase = pool_coinbase(values, 1);
        ledger.mine_block(1_060, vec![coinbase.clone()]).unwrap();
        (ledger, coinbase)
    }

    #[test]
    fn stops_at_target() {
        let (ledger, _) = ledger_with(&[COIN, COIN, COIN, COIN]);
        let selection =
            accumulate_to_target(&ledger, &pool(), 2 * COIN, 10, &[], |_| Ok(true)).unwrap();
        assert_eq!(selection.inputs.len(), 2);
        assert_eq!(selection.total, 2 * COIN);
        assert!(selection.covers(2 * COIN));
    }

    #[test]
    fn stops_at_input_ceiling() {
        let (ledger, _) = ledger_with(&[COIN, COIN, COIN, COIN]);
        let selection =
            accumulate_to_target(&ledger, &pool(), 4 * COIN, 3, &[], |_| Ok(true)).unwrap();
        assert_eq!(selection.inputs.len(), 3);
        assert!(!selection.covers(4 * COIN));
        match selection.require(4 * COIN) {
            Err(BuildError::InsufficientFunds { needed, available }) => {
                assert_eq!(needed, 4 * COIN);
                assert_eq!(available, 3 * COIN);
            }
            other => panic!("expected InsufficientFunds, got {:?}", other),
        }
    }

    #[test]
    fn honours_exclusions_and_filter() {
        let (ledger, coinbase) = ledger_with(&[COIN, 2 * COIN, 3 * COIN]);
        let txid = coinbase.txid();
        let excluded = [OutPoint::new(txid, 0)];
        let selection = accumulate_to_target(&ledger, &pool(), 10 * COIN, 10, &excluded, |u| {
            Ok(u.value != 2 * COIN)
        })
        .unwrap();
        assert_eq!(selection.outpoints().collect::<Vec<_>>(), vec![OutPoint::new(txid, 2)]);
        assert_eq!(selection.total, 3 * COIN);
    }

    #[test]
    fn threshold_skips_small_and_fee_sized_outputs() {
        let fee = 10_000;
        // threshold for a 1 COIN target over 60 inputs is COIN / 61
        let (ledger, coinbase) = ledger_with(&[fee, COIN / 100, 500_000, COIN / 2, COIN / 2]);
        let selection =
            threshold_accumulate(&ledger, &pool(), COIN, 60, 1_000_000, fee, &[]).unwrap();
        assert_eq!(
            selection.outpoints().collect::<Vec<_>>(),
            vec![
                OutPoint::new(coinbase.txid(), 3),
                OutPoint::new(coinbase.txid(), 4)
            ]
        );
        assert!(selection.covers(COIN));
    }

    #[test]
    fn repeated_selection_is_stable() {
        let (ledger, _) = ledger_with(&[COIN, 3 * COIN, 2 * COIN, COIN]);
        let first =
            threshold_accumulate(&ledger, &pool(), 4 * COIN, 60, 1_000_000, 10_000, &[]).unwrap();
        let second =
            threshold_accumulate(&ledger, &pool(), 4 * COIN, 60, 1_000_000, 10_000, &[]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_address_selects_nothing() {
        let ledger = MemoryLedger::new(1_000);
        let selection = select_ordinary(&ledger, &pool(), COIN, 64).unwrap();
        assert_eq!(selection, Selection::default());
        assert!(selection.require(0).is_ok());
    }
}
