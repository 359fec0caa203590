//! # Protocol Configuration & Constants
//!
//! Every consensus constant of the contract engine lives here. Builders and
//! validators read the same values, so changing one of these after a chain
//! has history is a hard fork, not a tuning exercise.

// ---------------------------------------------------------------------------
// Monetary Units
// ---------------------------------------------------------------------------

/// Fixed-point scale of every monetary value in the ledger: one whole coin
/// expressed in its smallest unit. Rates (APR) use the same scale, so an APR
/// of `COIN` means 100% per year.
pub const COIN: u64 = 100_000_000;

/// Upper bound for any single amount or sum of amounts.
pub const MAX_MONEY: u64 = 21_000_000 * COIN;

/// Fee charged by every transaction the builders produce. Contract
/// validators check conservation against this exact value.
pub const DEFAULT_TX_FEE: u64 = 10_000;

/// Seconds in a (non-leap) year, the denominator of the reward formula.
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Contract Identifiers
// ---------------------------------------------------------------------------

/// Evalcode of the Rewards contract. First byte of every rewards annotation.
pub const EVAL_REWARDS: u8 = 0xe5;

/// Evalcode of the Faucet contract. First byte of every faucet annotation.
pub const EVAL_FAUCET: u8 = 0x10;

// ---------------------------------------------------------------------------
// Contract Parameters
// ---------------------------------------------------------------------------

/// Fixed size of one faucet disbursement. A pool output of exactly one
/// `COIN` funds one disbursement plus its fee with no change left over.
pub const FAUCET_PAYOUT: u64 = COIN - DEFAULT_TX_FEE;

/// Pool outputs below this value are never selected for a disbursement.
pub const FAUCET_MIN_INPUT: u64 = 1_000_000;

/// Most pool inputs a disbursement may consume.
pub const FAUCET_MAX_INPUTS: usize = 60;

/// Most reward-funding inputs an unlock may consume.
pub const REWARDS_MAX_INPUTS: usize = 30;

/// Most ordinary inputs a funding or lock transaction may consume.
pub const NORMAL_MAX_INPUTS: usize = 64;

/// Ceiling of the disbursement proof-of-work search. With a two-byte
/// target the expected cost is 65_536 attempts, so exhausting this ceiling
/// happens roughly once in e^15 searches.
pub const GRIND_MAX_ATTEMPTS: u32 = 1_000_000;

/// A faucet payout address must not have been funded more than this many
/// blocks before the tip.
pub const FRESH_ADDRESS_MAX_AGE_BLOCKS: u64 = 3;

// ---------------------------------------------------------------------------
// Transaction Limits
// ---------------------------------------------------------------------------

/// Maximum number of inputs per transaction. Keeps validation bounded.
pub const MAX_TX_INPUTS: usize = 256;

/// Maximum number of outputs per transaction.
pub const MAX_TX_OUTPUTS: usize = 256;

/// Maximum annotation length in bytes. The largest contract record is 42
/// bytes; the slack leaves room for future record kinds.
pub const MAX_ANNOTATION_LENGTH: usize = 512;

/// Current transaction format version.
pub const TX_VERSION: u16 = 1;

// ---------------------------------------------------------------------------
// Address Derivation
// ---------------------------------------------------------------------------

/// Prefix of ordinary (key-owned) addresses.
pub const ORDINARY_ADDRESS_PREFIX: char = 'R';

/// Prefix of contract pool addresses.
pub const CONTRACT_ADDRESS_PREFIX: char = 'C';

/// BLAKE3 derive-key context for contract pool addresses.
pub const POOL_ADDRESS_CONTEXT: &str = "ccpool 2026-01 contract pool address";

/// BLAKE3 derive-key context for a contract's ordinary marker address.
pub const MARKER_ADDRESS_CONTEXT: &str = "ccpool 2026-01 contract marker address";

/// Returns a friendly name for a contract evalcode, mainly for logging.
pub fn contract_name(evalcode: u8) -> String {
    match evalcode {
        EVAL_REWARDS => "rewards".to_string(),
        EVAL_FAUCET => "faucet".to_string(),
        other => format!("unknown(0x{:02x})", other),
    }
}
