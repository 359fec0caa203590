//! # Faucet Contract
//!
//! A pool anyone can fund and any brand new address can draw a fixed grant
//! from. There is no owner and no signature on a disbursement; what limits
//! the drain rate is proof of work. A disbursement is only valid if its own
//! txid starts and ends with a zero byte (see [`crate::grinder`]), and only
//! pays an address that had no history more than a few blocks deep.

use ccpool_protocol::config::NORMAL_MAX_INPUTS;
use ccpool_protocol::ledger::{LedgerResult, LedgerView};
use ccpool_protocol::transaction::{Lock, Transaction, TransactionBuilder};
use ccpool_protocol::{Address, ContractValidator};
use tracing::{info, warn};

use crate::annotation::FaucetRecord;
use crate::conservation::{collect_pool_flows, ensure_contract_inputs, payout_index};
use crate::contract::{ContractInfo, FaucetParams};
use crate::error::{BuildError, ValidationError};
use crate::grinder::{grind, meets_target, random_start_nonce, Grind};
use crate::selector::{select_ordinary, threshold_accumulate};

/// The age in blocks of the oldest confirmed transaction paying `address`,
/// `None` for an address the chain has never paid.
pub fn address_age(ledger: &dyn LedgerView, address: &Address) -> LedgerResult<Option<u64>> {
    let tip = ledger.tip()?;
    Ok(ledger
        .address_history(address)?
        .iter()
        .map(|entry| tip.height.saturating_sub(entry.height))
        .max())
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Faucet {
    contract: ContractInfo,
    params: FaucetParams,
}

impl Default for Faucet {
    fn default() -> Self {
        Self::new(FaucetParams::default())
    }
}

impl Faucet {
    pub fn new(params: FaucetParams) -> Self {
        Self {
            contract: ContractInfo::faucet(),
            params,
        }
    }

    pub fn contract(&self) -> &ContractInfo {
        &self.contract
    }

    pub fn params(&self) -> &FaucetParams {
        &self.params
    }

    pub fn validator(&self) -> FaucetValidator {
        FaucetValidator::new(self.params)
    }

    /// Moves `amount` of `owner`'s funds into the faucet pool.
    pub fn fund(
        &self,
        ledger: &dyn LedgerView,
        owner: &Address,
        amount: u64,
    ) -> Result<Transaction, BuildError> {
        if amount == 0 {
            return Err(BuildError::ZeroAmount);
        }
        let needed = amount.saturating_add(self.params.fee);
        let selection =
            select_ordinary(ledger, owner, needed, NORMAL_MAX_INPUTS)?.require(needed)?;

        let mut builder = selection
            .outpoints()
            .fold(TransactionBuilder::new(), |builder, outpoint| {
                builder.ordinary_input(outpoint)
            })
            .pay_contract(self.contract.evalcode, amount);
        let change = selection.total - needed;
        if change > 0 {
            builder = builder.pay(owner.clone(), change);
        }
        let tx = builder
            .lock_time(ledger.tip()?.time)
            .annotation(FaucetRecord::Fund.encode())
            .build();

        info!(amount, "built faucet fund");
        Ok(tx)
    }

    /// Builds and grinds a disbursement of the fixed payout to `payee`.
    ///
    /// `start_nonce` defaults to a random 28-bit value. Exhausting the
    /// search is [`BuildError::PowExhausted`]: retry, ideally later.
    pub fn disburse(
        &self,
        ledger: &dyn LedgerView,
        payee: &Address,
        start_nonce: Option<u32>,
    ) -> Result<Grind, BuildError> {
        if let Some(age_blocks) = address_age(ledger, payee)? {
            if age_blocks > self.params.fresh_address_max_age {
                return Err(BuildError::AddressNotFresh {
                    address: payee.clone(),
                    age_blocks,
                });
            }
        }

        let needed = self.params.payout.saturating_add(self.params.fee);
        let selection = threshold_accumulate(
            ledger,
            &self.contract.pool,
            needed,
            self.params.max_inputs,
            self.params.min_input,
            self.params.fee,
            &[],
        )?
        .require(needed)?;

        let mut template = selection
            .outpoints()
            .fold(TransactionBuilder::new(), |builder, outpoint| {
                builder.contract_input(outpoint, self.contract.evalcode)
            });
        let change = selection.total - needed;
        if change > 0 {
            template = template.pay_contract(self.contract.evalcode, change);
        }
        let template = template
            .pay(payee.clone(), self.params.payout)
            .lock_time(ledger.tip()?.time)
            .build();

        let start = start_nonce.unwrap_or_else(random_start_nonce);
        let found = grind(template, start, self.params.grind_attempts).ok_or(
            BuildError::PowExhausted {
                attempts: self.params.grind_attempts,
            },
        )?;

        info!(
            %payee,
            payout = self.params.payout,
            inputs = selection.inputs.len(),
            attempts = found.attempts,
            txid = %found.txid(),
            "built faucet disbursement"
        );
        Ok(found)
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Consensus rules for spends of the Faucet pool.
#[derive(Debug, Clone)]
pub struct FaucetValidator {
    contract: ContractInfo,
    params: FaucetParams,
}

impl FaucetValidator {
    pub fn new(params: FaucetParams) -> Self {
        Self {
            contract: ContractInfo::faucet(),
            params,
        }
    }

    /// Checks `tx`, returning the first rule it violates.
    pub fn check(&self, ledger: &dyn LedgerView, tx: &Transaction) -> Result<(), ValidationError> {
        if tx.outputs.is_empty() {
            return Err(ValidationError::NoOutputs);
        }
        ensure_contract_inputs(&self.contract, tx)?;
        if !matches!(
            FaucetRecord::from_transaction(tx),
            Some(FaucetRecord::Get { .. })
        ) {
            return Err(ValidationError::InvalidFaucetAnnotation);
        }

        let flows = collect_pool_flows(ledger, &self.contract, tx)?;
        flows.ensure_balanced(self.params.payout, self.params.fee)?;

        let index = payout_index(&self.contract, tx);
        let payee = match tx.outputs.get(index) {
            Some(output) if output.value == self.params.payout => match &output.lock {
                Lock::Address(address) => address,
                Lock::Contract { .. } => return Err(ValidationError::InvalidFaucetOutput),
            },
            _ => return Err(ValidationError::InvalidFaucetOutput),
        };

        if !meets_target(&tx.txid()) {
            return Err(ValidationError::InvalidFaucetTxid);
        }
        if let Some(age) = address_age(ledger, payee)? {
            if age > self.params.fresh_address_max_age {
                return Err(ValidationError::AddressNotFresh);
            }
        }
        if tx.outputs.len() > index + 1 {
            return Err(ValidationError::ExtraOutputs);
        }
        Ok(())
    }
}

impl ContractValidator for FaucetValidator {
    fn evalcode(&self) -> u8 {
        self.contract.evalcode
    }

    fn validate(&self, ledger: &dyn LedgerView, tx: &Transaction) -> Result<(), String> {
        self.check(ledger, tx).map_err(|err| {
            warn!(txid = %tx.txid(), reason = %err, "faucet validation failed");
            err.to_string()
        })
    }
}
