//! # Rewards Contract
//!
//! Time-locked deposits that earn a fixed annual rate out of a funded pool.
//! The lifecycle of a plan:
//!
//! 1. **Create**: a Funding transaction declares the plan (name, APR, lock
//!    bounds, minimum deposit) and seeds its pool.
//! 2. **Add funding**: anyone may top up the plan's reward funds.
//! 3. **Lock**: a depositor moves principal into the pool. Vout 1 of the
//!    lock names the only address its unlock may pay.
//! 4. **Unlock**: principal plus the accrued reward leave the pool in a
//!    single payout. This is the only transaction that spends the pool, and
//!    [`RewardsValidator`] is what enforces it.
//!
//! Builders return unsigned transactions. Create, add-funding and lock
//! spend ordinary inputs and need [`sign_transaction`]; an unlock spends
//! only pool inputs and is ready to submit as built.
//!
//! [`sign_transaction`]: ccpool_protocol::transaction::sign_transaction

use ccpool_protocol::config::NORMAL_MAX_INPUTS;
use ccpool_protocol::ledger::{Confirmation, LedgerResult, LedgerView};
use ccpool_protocol::transaction::{Lock, OutPoint, Transaction, TransactionBuilder, TxId};
use ccpool_protocol::{Address, ContractValidator};
use tracing::{debug, info, warn};

use crate::annotation::{PlanName, PlanParams, RewardsRecord};
use crate::conservation::{collect_pool_flows, ensure_contract_inputs, payout_index};
use crate::contract::{ContractInfo, RewardsParams};
use crate::error::{BuildError, ValidationError};
use crate::plan::{find_plan, funds_for_plan, list_plans, plan_info, PlanInfo, PlanRecord};
use crate::reward::{calc_reward, reward_for_lock};
use crate::selector::{accumulate_to_target, select_ordinary, Selection};

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Transaction builders for the Rewards contract.
#[derive(Debug, Clone)]
pub struct Rewards {
    contract: ContractInfo,
    params: RewardsParams,
}

impl Default for Rewards {
    fn default() -> Self {
        Self::new(RewardsParams::default())
    }
}

/// A confirmed, unspent lock output.
#[derive(Debug, Clone)]
struct LockedDeposit {
    outpoint: OutPoint,
    principal: u64,
    beneficiary: Address,
    time: u64,
}

impl Rewards {
    pub fn new(params: RewardsParams) -> Self {
        Self {
            contract: ContractInfo::rewards(),
            params,
        }
    }

    pub fn contract(&self) -> &ContractInfo {
        &self.contract
    }

    pub fn params(&self) -> &RewardsParams {
        &self.params
    }

    /// The consensus hook matching these builders.
    pub fn validator(&self) -> RewardsValidator {
        RewardsValidator::new(self.params)
    }

    /// Declares a new plan and seeds it with `funds`.
    ///
    /// Outputs: pool `funds`, marker `fee`, change to `owner`.
    pub fn create_funding(
        &self,
        ledger: &dyn LedgerView,
        owner: &Address,
        name: &str,
        funds: u64,
        params: PlanParams,
    ) -> Result<Transaction, BuildError> {
        let plan = PlanName::new(name)?;
        if params.min_seconds > params.max_seconds {
            return Err(BuildError::InvalidPlanParameters {
                min_seconds: params.min_seconds,
                max_seconds: params.max_seconds,
            });
        }
        if funds == 0 {
            return Err(BuildError::ZeroAmount);
        }
        if let Some(existing) = find_plan(ledger, &self.contract, plan)? {
            return Err(BuildError::PlanExists {
                plan: plan.to_string(),
                funding_txid: existing.funding_txid,
            });
        }

        let fee = self.params.fee;
        let needed = funds.saturating_add(fee).saturating_add(fee);
        let selection = self.fund_from(ledger, owner, needed)?;

        let builder = ordinary_inputs(&selection)
            .pay_contract(self.contract.evalcode, funds)
            .pay(self.contract.marker.clone(), fee);
        let tx = finish(builder, owner, selection.total - needed)
            .lock_time(ledger.tip()?.time)
            .annotation(RewardsRecord::Funding { plan, params }.encode())
            .build();

        info!(%plan, funds, apr = params.apr, "built rewards funding");
        Ok(tx)
    }

    /// Adds `amount` to the reward funds of an existing plan.
    pub fn add_funding(
        &self,
        ledger: &dyn LedgerView,
        owner: &Address,
        name: &str,
        funding_txid: TxId,
        amount: u64,
    ) -> Result<Transaction, BuildError> {
        let record = self.resolve(ledger, name, funding_txid)?;
        if amount == 0 {
            return Err(BuildError::ZeroAmount);
        }

        let needed = amount.saturating_add(self.params.fee);
        let selection = self.fund_from(ledger, owner, needed)?;

        let builder =
            ordinary_inputs(&selection).pay_contract(self.contract.evalcode, amount);
        let tx = finish(builder, owner, selection.total - needed)
            .lock_time(ledger.tip()?.time)
            .annotation(
                RewardsRecord::AddFunding {
                    plan: record.plan,
                    funding_txid,
                }
                .encode(),
            )
            .build();

        info!(plan = %record.plan, amount, "built rewards add-funding");
        Ok(tx)
    }

    /// Locks `deposit` from `owner` into the plan.
    ///
    /// Outputs: pool `deposit`, `fee` to `owner` as the beneficiary marker,
    /// change to `owner`.
    pub fn lock(
        &self,
        ledger: &dyn LedgerView,
        owner: &Address,
        name: &str,
        funding_txid: TxId,
        deposit: u64,
    ) -> Result<Transaction, BuildError> {
        let record = self.resolve(ledger, name, funding_txid)?;
        if deposit == 0 {
            return Err(BuildError::ZeroAmount);
        }
        if deposit < record.params.min_deposit {
            return Err(BuildError::DepositBelowMinimum {
                deposit,
                minimum: record.params.min_deposit,
            });
        }
        let available = funds_for_plan(ledger, &self.contract, record.plan, &funding_txid)?;
        if available < deposit {
            return Err(BuildError::InsufficientPlanFunds { deposit, available });
        }

        let fee = self.params.fee;
        let needed = deposit.saturating_add(fee).saturating_add(fee);
        let selection = self.fund_from(ledger, owner, needed)?;

        let builder = ordinary_inputs(&selection)
            .pay_contract(self.contract.evalcode, deposit)
            .pay(owner.clone(), fee);
        let tx = finish(builder, owner, selection.total - needed)
            .lock_time(ledger.tip()?.time)
            .annotation(
                RewardsRecord::Lock {
                    plan: record.plan,
                    funding_txid,
                }
                .encode(),
            )
            .build();

        info!(plan = %record.plan, deposit, %owner, "built rewards lock");
        Ok(tx)
    }

    /// Pays a matured lock's principal plus reward to its beneficiary.
    ///
    /// With `lock_txid` the named lock is unlocked; otherwise the first
    /// unspent lock of the plan whose beneficiary is `owner`. The reward is
    /// computed at the current tip time, which becomes the transaction's
    /// `lock_time`.
    pub fn unlock(
        &self,
        ledger: &dyn LedgerView,
        name: &str,
        funding_txid: TxId,
        owner: &Address,
        lock_txid: Option<TxId>,
    ) -> Result<Transaction, BuildError> {
        let record = self.resolve(ledger, name, funding_txid)?;
        let deposit = self
            .find_lock(ledger, &record, owner, lock_txid)?
            .ok_or(BuildError::LockNotFound)?;

        let now = ledger.tip()?.time;
        let elapsed = now.saturating_sub(deposit.time);
        let reward = reward_for_lock(
            ledger,
            deposit.principal,
            &deposit.outpoint.txid,
            now,
            &record.params,
        )?
        .ok_or(BuildError::LockNotFound)?;
        if reward == 0 {
            return Err(BuildError::LockNotMature {
                elapsed,
                min_seconds: record.params.min_seconds,
            });
        }
        let fee = self.params.fee;
        if reward <= fee {
            return Err(BuildError::RewardTooSmall { reward, fee });
        }

        let needed = reward.saturating_add(fee);
        let selection = accumulate_to_target(
            ledger,
            &self.contract.pool,
            needed,
            self.params.max_inputs,
            &[deposit.outpoint],
            |unspent| {
                let Some(lookup) = ledger.get_transaction(&unspent.outpoint.txid)? else {
                    return Ok(false);
                };
                // other depositors' principal never pays a reward
                Ok(match RewardsRecord::from_transaction(&lookup.transaction) {
                    Some(RewardsRecord::Lock { .. }) | None => false,
                    Some(source) => {
                        source.belongs_to(&unspent.outpoint.txid, record.plan, &funding_txid)
                    }
                })
            },
        )?;
        let selection = selection.require(needed).inspect_err(|_| {
            warn!(plan = %record.plan, needed, "cant find rewards inputs");
        })?;

        let change = selection.total - needed;
        let mut builder = TransactionBuilder::new()
            .contract_input(deposit.outpoint, self.contract.evalcode);
        for outpoint in selection.outpoints() {
            builder = builder.contract_input(outpoint, self.contract.evalcode);
        }
        if change > 0 {
            builder = builder.pay_contract(self.contract.evalcode, change);
        }
        let payout = deposit.principal.saturating_add(reward);
        let tx = builder
            .pay(deposit.beneficiary.clone(), payout)
            .lock_time(now)
            .annotation(
                RewardsRecord::Unlock {
                    plan: record.plan,
                    funding_txid,
                }
                .encode(),
            )
            .build();

        info!(
            plan = %record.plan,
            principal = deposit.principal,
            reward,
            elapsed,
            payee = %deposit.beneficiary,
            txid = %tx.txid(),
            "built rewards unlock"
        );
        Ok(tx)
    }

    pub fn info(
        &self,
        ledger: &dyn LedgerView,
        funding_txid: &TxId,
    ) -> LedgerResult<Option<PlanInfo>> {
        plan_info(ledger, &self.contract, funding_txid)
    }

    pub fn list(&self, ledger: &dyn LedgerView) -> LedgerResult<Vec<PlanRecord>> {
        list_plans(ledger, &self.contract)
    }

    // -- internals -----------------------------------------------------------

    fn resolve(
        &self,
        ledger: &dyn LedgerView,
        name: &str,
        funding_txid: TxId,
    ) -> Result<PlanRecord, BuildError> {
        let plan = PlanName::new(name)?;
        let record = find_plan(ledger, &self.contract, plan)?.ok_or_else(|| {
            BuildError::PlanNotFound {
                plan: plan.to_string(),
            }
        })?;
        if record.funding_txid != funding_txid {
            return Err(BuildError::FundingMismatch {
                plan: plan.to_string(),
                expected: record.funding_txid,
                given: funding_txid,
            });
        }
        Ok(record)
    }

    fn fund_from(
        &self,
        ledger: &dyn LedgerView,
        owner: &Address,
        needed: u64,
    ) -> Result<Selection, BuildError> {
        select_ordinary(ledger, owner, needed, NORMAL_MAX_INPUTS)?.require(needed)
    }

    fn find_lock(
        &self,
        ledger: &dyn LedgerView,
        record: &PlanRecord,
        owner: &Address,
        lock_txid: Option<TxId>,
    ) -> Result<Option<LockedDeposit>, BuildError> {
        for unspent in ledger.address_unspents(&self.contract.pool)? {
            let outpoint = unspent.outpoint;
            if outpoint.vout != 0 || lock_txid.is_some_and(|txid| txid != outpoint.txid) {
                continue;
            }
            if ledger.is_spent_in_mempool(&outpoint)? {
                continue;
            }
            let Some(lookup) = ledger.get_transaction(&outpoint.txid)? else {
                continue;
            };
            let Some(RewardsRecord::Lock { plan, funding_txid }) =
                RewardsRecord::from_transaction(&lookup.transaction)
            else {
                continue;
            };
            if plan != record.plan || funding_txid != record.funding_txid {
                continue;
            }
            let Some(beneficiary) = beneficiary_of(&lookup.transaction) else {
                continue;
            };
            if lock_txid.is_none() && &beneficiary != owner {
                continue;
            }
            // unlockable only at or above the plan minimum
            if unspent.value < record.params.min_deposit {
                continue;
            }
            let time = match lookup.confirmation {
                Confirmation::Confirmed { time, .. } => time,
                Confirmation::Mempool => continue,
            };
            return Ok(Some(LockedDeposit {
                outpoint,
                principal: unspent.value,
                beneficiary,
                time,
            }));
        }
        Ok(None)
    }
}

/// The ordinary address at vout 1 of a lock transaction.
fn beneficiary_of(lock_tx: &Transaction) -> Option<Address> {
    match &lock_tx.outputs.get(1)?.lock {
        Lock::Address(address) => Some(address.clone()),
        Lock::Contract { .. } => None,
    }
}

fn ordinary_inputs(selection: &Selection) -> TransactionBuilder {
    selection
        .outpoints()
        .fold(TransactionBuilder::new(), |builder, outpoint| {
            builder.ordinary_input(outpoint)
        })
}

fn finish(builder: TransactionBuilder, owner: &Address, change: u64) -> TransactionBuilder {
    if change > 0 {
        builder.pay(owner.clone(), change)
    } else {
        builder
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Consensus rules for spends of the Rewards pool. Only a well-formed
/// unlock of exactly one matured lock may spend it.
#[derive(Debug, Clone)]
pub struct RewardsValidator {
    contract: ContractInfo,
    params: RewardsParams,
}

impl RewardsValidator {
    pub fn new(params: RewardsParams) -> Self {
        Self {
            contract: ContractInfo::rewards(),
            params,
        }
    }

    /// Checks `tx`, returning the first rule it violates.
    pub fn check(&self, ledger: &dyn LedgerView, tx: &Transaction) -> Result<(), ValidationError> {
        if tx.outputs.is_empty() {
            return Err(ValidationError::NoOutputs);
        }
        ensure_contract_inputs(&self.contract, tx)?;

        let Some(RewardsRecord::Unlock { plan, funding_txid }) =
            RewardsRecord::from_transaction(tx)
        else {
            return Err(ValidationError::InvalidRewardsAnnotation);
        };
        let record = find_plan(ledger, &self.contract, plan)?
            .filter(|record| record.funding_txid == funding_txid)
            .ok_or(ValidationError::PlanNotFound)?;

        let flows = collect_pool_flows(ledger, &self.contract, tx)?;

        let mut lock = None;
        let mut locks = 0usize;
        for input in &flows.inputs {
            let source = RewardsRecord::from_transaction(&input.source)
                .filter(|source| source.belongs_to(&input.outpoint.txid, plan, &funding_txid))
                .ok_or(ValidationError::WrongPlanReference)?;
            if let RewardsRecord::Lock { .. } = source {
                locks += 1;
                lock = Some(input);
            }
        }
        let lock = match (locks, lock) {
            (1, Some(lock)) => lock,
            _ => return Err(ValidationError::LockCount),
        };
        if lock.value < record.params.min_deposit {
            return Err(ValidationError::LockBelowMinimum);
        }

        let tip = ledger.tip()?;
        if tx.lock_time < lock.time || tx.lock_time > tip.time {
            return Err(ValidationError::UnlockTime);
        }
        let reward = calc_reward(lock.value, tx.lock_time - lock.time, &record.params);
        if reward == 0 {
            return Err(ValidationError::LockNotMatured);
        }

        let payout = lock.value.saturating_add(reward);
        flows.ensure_balanced(payout, self.params.fee)?;

        let index = payout_index(&self.contract, tx);
        let output = tx
            .outputs
            .get(index)
            .filter(|output| output.value == payout)
            .ok_or(ValidationError::InvalidRewardsOutput)?;
        match (&output.lock, beneficiary_of(&lock.source)) {
            (Lock::Address(payee), Some(beneficiary)) if *payee == beneficiary => {}
            _ => return Err(ValidationError::WrongPayee),
        }
        if tx.outputs.len() > index + 1 {
            return Err(ValidationError::ExtraOutputs);
        }

        debug!(%plan, principal = lock.value, reward, "rewards unlock validated");
        Ok(())
    }
}

impl ContractValidator for RewardsValidator {
    fn evalcode(&self) -> u8 {
        self.contract.evalcode
    }

    fn validate(&self, ledger: &dyn LedgerView, tx: &Transaction) -> Result<(), String> {
        self.check(ledger, tx).map_err(|err| {
            warn!(txid = %tx.txid(), reason = %err, "rewards validation failed");
            err.to_string()
        })
    }
}
