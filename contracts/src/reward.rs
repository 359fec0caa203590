//! Reward calculation.
//!
//! Rewards accrue linearly on the `COIN` fixed-point scale:
//!
//! ```text
//! reward = principal * apr * elapsed / (SECONDS_PER_YEAR * COIN)
//! ```
//!
//! `elapsed` is measured in block time only. Below `min_seconds` nothing
//! accrues; beyond `max_seconds` accrual stops.

use ccpool_protocol::config::{COIN, SECONDS_PER_YEAR};
use ccpool_protocol::ledger::{Confirmation, LedgerResult, LedgerView};
use ccpool_protocol::transaction::TxId;

use crate::annotation::PlanParams;

/// The reward owed on `principal` after `elapsed` seconds.
pub fn calc_reward(principal: u64, elapsed: u64, params: &PlanParams) -> u64 {
    if elapsed < params.min_seconds {
        return 0;
    }
    let elapsed = elapsed.min(params.max_seconds);
    let denominator = u128::from(SECONDS_PER_YEAR) * u128::from(COIN);
    // a numerator past u128 is far past u64 once divided
    u128::from(principal)
        .checked_mul(u128::from(params.apr))
        .and_then(|n| n.checked_mul(u128::from(elapsed)))
        .and_then(|n| u64::try_from(n / denominator).ok())
        .unwrap_or(u64::MAX)
}

/// The reward owed on the lock `lock_txid` at chain time `now`. `None` if
/// the lock is unknown or not yet confirmed.
pub fn reward_for_lock(
    ledger: &dyn LedgerView,
    principal: u64,
    lock_txid: &TxId,
    now: u64,
    params: &PlanParams,
) -> LedgerResult<Option<u64>> {
    let Some(lookup) = ledger.get_transaction(lock_txid)? else {
        return Ok(None);
    };
    match lookup.confirmation {
        Confirmation::Confirmed { time, .. } => Ok(Some(calc_reward(
            principal,
            now.saturating_sub(time),
            params,
        ))),
        Confirmation::Mempool => Ok(None),
    }
}
