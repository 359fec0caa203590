//! # Conservation
//!
//! The generic half of every contract validator: every input must take the
//! contract spend path, every spent pool output must come from a confirmed
//! transaction, and pool value in must equal pool value out plus whatever
//! the operation declares leaves the pool, plus the fee.
//!
//! ```text
//! inputs == outputs + declared + fee
//! ```

use ccpool_protocol::ledger::{Confirmation, LedgerView};
use ccpool_protocol::transaction::{OutPoint, Transaction};
use tracing::debug;

use crate::contract::ContractInfo;
use crate::error::ValidationError;

/// One input that spends a pool output, with its resolved source.
#[derive(Debug, Clone)]
pub struct PoolInput {
    /// Position in the spending transaction.
    pub index: usize,
    pub outpoint: OutPoint,
    pub value: u64,
    pub source: Transaction,
    pub height: u64,
    /// Block time of the source transaction.
    pub time: u64,
}

/// Pool value moving through one transaction.
#[derive(Debug, Clone, Default)]
pub struct PoolFlows {
    pub inputs: Vec<PoolInput>,
    pub input_total: u64,
    pub output_total: u64,
}

impl PoolFlows {
    /// Checks `inputs == outputs + declared + fee`, exactly.
    pub fn ensure_balanced(&self, declared: u64, fee: u64) -> Result<(), ValidationError> {
        let expected = u128::from(self.output_total) + u128::from(declared) + u128::from(fee);
        if u128::from(self.input_total) != expected {
            debug!(
                inputs = self.input_total,
                outputs = self.output_total,
                declared,
                fee,
                "pool value not conserved"
            );
            return Err(ValidationError::ConservationMismatch {
                inputs: self.input_total,
                outputs: self.output_total,
                declared,
                fee,
            });
        }
        Ok(())
    }
}

/// Rejects any input not unlocked through `contract`.
pub fn ensure_contract_inputs(
    contract: &ContractInfo,
    tx: &Transaction,
) -> Result<(), ValidationError> {
    if tx
        .inputs
        .iter()
        .all(|input| input.unlock.evalcode() == Some(contract.evalcode))
    {
        Ok(())
    } else {
        Err(ValidationError::IllegalNormalInput)
    }
}

/// Index of the single external payout: right after the pool change
/// output when vout 0 is one, else vout 0.
pub fn payout_index(contract: &ContractInfo, tx: &Transaction) -> usize {
    match tx.outputs.first() {
        Some(first) if contract.owns(&first.lock) => 1,
        _ => 0,
    }
}

/// Resolves every input's source and sums the pool value in and out.
///
/// Sources must be confirmed: contract funds never derive from pending
/// state.
pub fn collect_pool_flows(
    ledger: &dyn LedgerView,
    contract: &ContractInfo,
    tx: &Transaction,
) -> Result<PoolFlows, ValidationError> {
    let mut flows = PoolFlows::default();

    for (index, input) in tx.inputs.iter().enumerate() {
        let lookup = ledger
            .get_transaction(&input.prevout.txid)?
            .ok_or(ValidationError::MissingVinTx)?;
        let (height, time) = match lookup.confirmation {
            Confirmation::Confirmed { height, time } => (height, time),
            Confirmation::Mempool => {
                return Err(ValidationError::FromMempool {
                    contract: contract.name,
                })
            }
        };
        let output = lookup
            .transaction
            .outputs
            .get(input.prevout.vout as usize)
            .ok_or(ValidationError::MissingVinTx)?;

        if contract.owns(&output.lock) {
            flows.input_total = flows.input_total.saturating_add(output.value);
            flows.inputs.push(PoolInput {
                index,
                outpoint: input.prevout,
                value: output.value,
                source: lookup.transaction.clone(),
                height,
                time,
            });
        }
    }

    flows.output_total = tx
        .outputs
        .iter()
        .filter(|output| contract.owns(&output.lock))
        .fold(0u64, |total, output| total.saturating_add(output.value));

    Ok(flows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccpool_protocol::config::{COIN, EVAL_FAUCET, EVAL_REWARDS};
    use ccpool_protocol::transaction::{TransactionBuilder, TxId};
    use ccpool_protocol::{Address, MemoryLedger};

    #[test]
    fn ordinary_input_is_illegal() {
        let faucet = ContractInfo::faucet();
        let prev = OutPoint::new(TxId::from_bytes([1; 32]), 0);

        let tx = TransactionBuilder::new()
            .contract_input(prev, EVAL_FAUCET)
            .ordinary_input(OutPoint::new(TxId::from_bytes([2; 32]), 0))
            .pay_contract(EVAL_FAUCET, 1)
            .build();
        assert_eq!(
            ensure_contract_inputs(&faucet, &tx),
            Err(ValidationError::IllegalNormalInput)
        );

        let foreign = TransactionBuilder::new()
            .contract_input(prev, EVAL_REWARDS)
            .pay_contract(EVAL_FAUCET, 1)
            .build();
        assert_eq!(
            ensure_contract_inputs(&faucet, &foreign),
            Err(ValidationError::IllegalNormalInput)
        );

        let clean = TransactionBuilder::new()
            .contract_input(prev, EVAL_FAUCET)
            .pay_contract(EVAL_FAUCET, 1)
            .build();
        assert_eq!(ensure_contract_inputs(&faucet, &clean), Ok(()));
    }

    #[test]
    fn balance_is_exact() {
        let flows = PoolFlows {
            inputs: Vec::new(),
            input_total: 10 * COIN,
            output_total: 4 * COIN,
        };
        assert_eq!(flows.ensure_balanced(6 * COIN - 100, 100), Ok(()));
        assert!(matches!(
            flows.ensure_balanced(6 * COIN - 100, 99),
            Err(ValidationError::ConservationMismatch { .. })
        ));
        assert!(matches!(
            flows.ensure_balanced(6 * COIN, 100),
            Err(ValidationError::ConservationMismatch { .. })
        ));
    }

    #[test]
    fn balance_does_not_overflow() {
        let flows = PoolFlows {
            inputs: Vec::new(),
            input_total: u64::MAX,
            output_total: u64::MAX,
        };
        assert!(flows.ensure_balanced(u64::MAX, u64::MAX).is_err());
    }

    #[test]
    fn flows_from_confirmed_pool_outputs() {
        let ledger = MemoryLedger::new(1_000);
        let faucet = ContractInfo::faucet();
        // no inputs: mined as a coinbase straight into the pool
        let coinbase = TransactionBuilder::new()
            .pay_contract(EVAL_FAUCET, 3 * COIN)
            .lock_time(1)
            .build();
        let source = coinbase.txid();
        ledger.mine_block(1_060, vec![coinbase]).unwrap();

        let tx = TransactionBuilder::new()
            .contract_input(OutPoint::new(source, 0), EVAL_FAUCET)
            .pay_contract(EVAL_FAUCET, 2 * COIN)
            .pay(Address::contract_marker(EVAL_FAUCET), COIN)
            .build();
        let flows = collect_pool_flows(&ledger, &faucet, &tx).unwrap();
        assert_eq!(flows.input_total, 3 * COIN);
        assert_eq!(flows.output_total, 2 * COIN);
        assert_eq!(flows.inputs.len(), 1);
        assert_eq!(flows.inputs[0].height, 1);
        assert_eq!(flows.inputs[0].time, 1_060);
    }

    #[test]
    fn unknown_source_is_missing() {
        let ledger = MemoryLedger::new(1_000);
        let tx = TransactionBuilder::new()
            .contract_input(OutPoint::new(TxId::from_bytes([9; 32]), 0), EVAL_FAUCET)
            .pay_contract(EVAL_FAUCET, 1)
            .build();
        assert_eq!(
            collect_pool_flows(&ledger, &ContractInfo::faucet(), &tx).unwrap_err(),
            ValidationError::MissingVinTx
        );
    }
}
