//! Node configuration, read from `config.json`.
//!
//! Every field has a default, so a partial file (or none at all) is valid.
//! Contract tunables live here because the builders and validators of one
//! ledger must agree on them: a node that changes the fee after locks exist
//! will reject its own unlocks.

use std::path::Path;

use anyhow::{Context, Result};
use ccpool_contracts::{FaucetParams, RewardsParams};
use ccpool_protocol::config::{
    DEFAULT_TX_FEE, FAUCET_PAYOUT, FRESH_ADDRESS_MAX_AGE_BLOCKS, GRIND_MAX_ATTEMPTS,
};
use serde::{Deserialize, Serialize};

/// Seconds of chain time between consecutive blocks produced by `mine`.
pub const DEFAULT_BLOCK_SPACING: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub fee: u64,
    pub faucet_payout: u64,
    pub grind_attempts: u32,
    pub fresh_address_max_age: u64,
    pub block_spacing: u64,
    /// Block time of the genesis block, in unix seconds. Only read when the
    /// store is created.
    pub genesis_time: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            fee: DEFAULT_TX_FEE,
            faucet_payout: FAUCET_PAYOUT,
            grind_attempts: GRIND_MAX_ATTEMPTS,
            fresh_address_max_age: FRESH_ADDRESS_MAX_AGE_BLOCKS,
            block_spacing: DEFAULT_BLOCK_SPACING,
            genesis_time: 0,
        }
    }
}

impl NodeConfig {
    /// Loads `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write config {}", path.display()))
    }

    pub fn rewards_params(&self) -> RewardsParams {
        RewardsParams {
            fee: self.fee,
            ..RewardsParams::default()
        }
    }

    pub fn faucet_params(&self) -> FaucetParams {
        FaucetParams {
            fee: self.fee,
            payout: self.faucet_payout,
            grind_attempts: self.grind_attempts,
            fresh_address_max_age: self.fresh_address_max_age,
            ..FaucetParams::default()
        }
    }
}
