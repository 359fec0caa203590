//! Contract identity and per-contract tunables.

use ccpool_protocol::config::{
    DEFAULT_TX_FEE, EVAL_FAUCET, EVAL_REWARDS, FAUCET_MAX_INPUTS, FAUCET_MIN_INPUT,
    FAUCET_PAYOUT, FRESH_ADDRESS_MAX_AGE_BLOCKS, GRIND_MAX_ATTEMPTS, REWARDS_MAX_INPUTS,
};
use ccpool_protocol::transaction::Lock;
use ccpool_protocol::Address;
use serde::{Deserialize, Serialize};

/// Who a contract is on the ledger: its evalcode and the two addresses
/// derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInfo {
    pub evalcode: u8,
    pub name: &'static str,
    /// Contract-owned outputs. Spendable only under the contract's rules.
    pub pool: Address,
    /// An ordinary address used to index contract events.
    pub marker: Address,
}

impl ContractInfo {
    fn new(evalcode: u8, name: &'static str) -> Self {
        Self {
            evalcode,
            name,
            pool: Address::contract_pool(evalcode),
            marker: Address::contract_marker(evalcode),
        }
    }

    pub fn rewards() -> Self {
        Self::new(EVAL_REWARDS, "rewards")
    }

    pub fn faucet() -> Self {
        Self::new(EVAL_FAUCET, "faucet")
    }

    /// Whether `lock` is this contract's pool lock.
    pub fn owns(&self, lock: &Lock) -> bool {
        matches!(lock, Lock::Contract { evalcode, address } if *evalcode == self.evalcode && address == &self.pool)
    }
}

/// Rewards tunables. Builders and the validator of one ledger must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsParams {
    pub fee: u64,
    /// Ceiling on pool inputs an unlock may gather for the reward.
    pub max_inputs: usize,
}

impl Default for RewardsParams {
    fn default() -> Self {
        Self {
            fee: DEFAULT_TX_FEE,
            max_inputs: REWARDS_MAX_INPUTS,
        }
    }
}

/// Faucet tunables. Builders and the validator of one ledger must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaucetParams {
    pub fee: u64,
    /// The fixed amount every disbursement pays out.
    pub payout: u64,
    /// Pool outputs below this are never selected.
    pub min_input: u64,
    pub max_inputs: usize,
    /// Nonces tried per disbursement before giving up.
    pub grind_attempts: u32,
    /// An address funded more than this many blocks ago is not fresh.
    pub fresh_address_max_age: u64,
}

impl Default for FaucetParams {
    fn default() -> Self {
        Self {
            fee: DEFAULT_TX_FEE,
            payout: FAUCET_PAYOUT,
            min_input: FAUCET_MIN_INPUT,
            max_inputs: FAUCET_MAX_INPUTS,
            grind_attempts: GRIND_MAX_ATTEMPTS,
            fresh_address_max_age: FRESH_ADDRESS_MAX_AGE_BLOCKS,
        }
    }
}
