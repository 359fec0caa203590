//! # Plan Resolution
//!
//! A Rewards plan is not stored anywhere. It *is* the Funding transaction
//! that declared it, plus every later record that references that
//! transaction. Every query here is recomputed from the ledger's address
//! indices on each call; there is no cache to invalidate.
//!
//! Iteration order matters: [`find_plan`] returns the first Funding record
//! in pool history order, so two Funding records for the same name can
//! never both be "the" plan.

use ccpool_protocol::ledger::{LedgerResult, LedgerView};
use ccpool_protocol::transaction::{Transaction, TxId};
use serde::Serialize;
use tracing::debug;

use crate::annotation::{PlanName, PlanParams, RewardsRecord};
use crate::contract::ContractInfo;

/// A resolved plan: the Funding transaction and what it declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanRecord {
    pub funding_txid: TxId,
    pub plan: PlanName,
    pub params: PlanParams,
}

/// Read-out of one plan for operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanInfo {
    pub funding_txid: TxId,
    pub name: String,
    pub bits: u64,
    #[serde(flatten)]
    pub params: PlanParams,
    /// Value of the declaring transaction's pool output.
    pub funding: u64,
    /// Pool value currently attributed to the plan.
    pub available: u64,
}

/// Decodes `tx` as a well-formed Funding transaction: vout 0 pays the pool
/// and the annotation is a Funding record.
fn funding_record(contract: &ContractInfo, txid: TxId, tx: &Transaction) -> Option<PlanRecord> {
    let first = tx.outputs.first()?;
    if !contract.owns(&first.lock) {
        return None;
    }
    match RewardsRecord::from_transaction(tx)? {
        RewardsRecord::Funding { plan, params } => Some(PlanRecord {
            funding_txid: txid,
            plan,
            params,
        }),
        _ => None,
    }
}

/// Finds the plan called `plan` by scanning the pool's confirmed history.
pub fn find_plan(
    ledger: &dyn LedgerView,
    contract: &ContractInfo,
    plan: PlanName,
) -> LedgerResult<Option<PlanRecord>> {
    for entry in ledger.address_history(&contract.pool)? {
        let Some(lookup) = ledger.get_transaction(&entry.txid)? else {
            continue;
        };
        if let Some(record) = funding_record(contract, entry.txid, &lookup.transaction) {
            if record.plan == plan {
                return Ok(Some(record));
            }
        }
    }
    Ok(None)
}

/// Sums the pool outputs that belong to the plan declared by
/// `funding_txid`: the Funding output itself and every output of a Lock,
/// Unlock or AddFunding record referencing it. Sources that no longer
/// decode simply do not match.
pub fn funds_for_plan(
    ledger: &dyn LedgerView,
    contract: &ContractInfo,
    plan: PlanName,
    funding_txid: &TxId,
) -> LedgerResult<u64> {
    let mut total = 0u64;
    for unspent in ledger.address_unspents(&contract.pool)? {
        let Some(lookup) = ledger.get_transaction(&unspent.outpoint.txid)? else {
            continue;
        };
        let matches = RewardsRecord::from_transaction(&lookup.transaction)
            .map(|record| record.belongs_to(&unspent.outpoint.txid, plan, funding_txid))
            .unwrap_or(false);
        if matches {
            total = total.saturating_add(unspent.value);
        }
    }
    debug!(%plan, funding = %funding_txid, total, "plan funds");
    Ok(total)
}

/// Every plan ever declared, in the order the marker address saw them.
pub fn list_plans(
    ledger: &dyn LedgerView,
    contract: &ContractInfo,
) -> LedgerResult<Vec<PlanRecord>> {
    let mut plans = Vec::new();
    for entry in ledger.address_history(&contract.marker)? {
        if let Some(lookup) = ledger.get_transaction(&entry.txid)? {
            if let Some(record) = funding_record(contract, entry.txid, &lookup.transaction) {
                plans.push(record);
            }
        }
    }
    Ok(plans)
}

/// Describes the plan declared by `funding_txid`, `None` if that is not a
/// Funding transaction.
pub fn plan_info(
    ledger: &dyn LedgerView,
    contract: &ContractInfo,
    funding_txid: &TxId,
) -> LedgerResult<Option<PlanInfo>> {
    let Some(lookup) = ledger.get_transaction(funding_txid)? else {
        return Ok(None);
    };
    let Some(record) = funding_record(contract, *funding_txid, &lookup.transaction) else {
        return Ok(None);
    };
    let funding = lookup.transaction.outputs[0].value;
    let available = funds_for_plan(ledger, contract, record.plan, funding_txid)?;

    Ok(Some(PlanInfo {
        funding_txid: *funding_txid,
        name: record.plan.to_string(),
        bits: record.plan.bits(),
        params: record.params,
        funding,
        available,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccpool_protocol::config::{COIN, EVAL_REWARDS};
    use ccpool_protocol::transaction::TransactionBuilder;
    use ccpool_protocol::MemoryLedger;

    fn params() -> PlanParams {
        PlanParams {
            apr: COIN / 10,
            min_seconds: 60,
            max_seconds: 3_600,
            min_deposit: COIN,
        }
    }

    fn funding_coinbase(name: &str, value: u64, height: u64) -> Transaction {
        let contract = ContractInfo::rewards();
        TransactionBuilder::new()
            .pay_contract(EVAL_REWARDS, value)
            .pay(contract.marker, 10_000)
            .lock_time(height)
            .annotation(
                RewardsRecord::Funding {
                    plan: PlanName::new(name).unwrap(),
                    params: params(),
                }
                .encode(),
            )
            .build()
    }

    #[test]
    fn first_funding_wins() {
        let ledger = MemoryLedger::new(1_000);
        let contract = ContractInfo::rewards();
        let first = funding_coinbase("gold", 10 * COIN, 1);
        let second = funding_coinbase("gold", 20 * COIN, 2);
        ledger.mine_block(1_060, vec![first.clone()]).unwrap();
        ledger.mine_block(1_120, vec![second]).unwrap();

        let found = find_plan(&ledger, &contract, PlanName::new("gold").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(found.funding_txid, first.txid());
        assert_eq!(found.params, params());

        assert!(find_plan(&ledger, &contract, PlanName::new("silver").unwrap())
            .unwrap()
            .is_none());
        assert_eq!(list_plans(&ledger, &contract).unwrap().len(), 2);
    }

    #[test]
    fn funding_must_pay_pool_at_vout_zero() {
        let ledger = MemoryLedger::new(1_000);
        let contract = ContractInfo::rewards();
        let misshapen = TransactionBuilder::new()
            .pay(contract.marker.clone(), 10_000)
            .pay_contract(EVAL_REWARDS, 10 * COIN)
            .lock_time(1)
            .annotation(
                RewardsRecord::Funding {
                    plan: PlanName::new("gold").unwrap(),
                    params: params(),
                }
                .encode(),
            )
            .build();
        let txid = misshapen.txid();
        ledger.mine_block(1_060, vec![misshapen]).unwrap();

        assert!(find_plan(&ledger, &contract, PlanName::new("gold").unwrap())
            .unwrap()
            .is_none());
        assert!(plan_info(&ledger, &contract, &txid).unwrap().is_none());
    }

    #[test]
    fn funds_count_only_matching_records() {
        let ledger = MemoryLedger::new(1_000);
        let contract = ContractInfo::rewards();
        let gold = PlanName::new("gold").unwrap();
        let funding = funding_coinbase("gold", 10 * COIN, 1);
        let funding_txid = funding.txid();

        let add = TransactionBuilder::new()
            .pay_contract(EVAL_REWARDS, 5 * COIN)
            .lock_time(2)
            .annotation(
                RewardsRecord::AddFunding {
                    plan: gold,
                    funding_txid,
                }
                .encode(),
            )
            .build();
        let foreign = TransactionBuilder::new()
            .pay_contract(EVAL_REWARDS, 7 * COIN)
            .lock_time(3)
            .annotation(
                RewardsRecord::AddFunding {
                    plan: gold,
                    funding_txid: TxId::from_bytes([3; 32]),
                }
                .encode(),
            )
            .build();
        let bare = TransactionBuilder::new()
            .pay_contract(EVAL_REWARDS, 11 * COIN)
            .lock_time(4)
            .build();
        ledger
            .mine_block(1_060, vec![funding, add, foreign, bare])
            .unwrap();

        assert_eq!(
            funds_for_plan(&ledger, &contract, gold, &funding_txid).unwrap(),
            15 * COIN
        );

        let info = plan_info(&ledger, &contract, &funding_txid).unwrap().unwrap();
        assert_eq!(info.name, "gold");
        assert_eq!(info.funding, 10 * COIN);
        assert_eq!(info.available, 15 * COIN);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["name"], "gold");
        assert_eq!(json["apr"], COIN / 10);
        assert_eq!(json["funding_txid"], funding_txid.to_hex());
    }
}
