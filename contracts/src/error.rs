//! Error types shared by both contracts.
//!
//! Construction and validation fail differently. A builder that cannot
//! produce a transaction returns a [`BuildError`]: plan not found, not enough
//! funds, a lock that has not matured. The caller is expected to branch on
//! these. A validator that refuses a transaction returns a
//! [`ValidationError`] whose `Display` is the stable reason string the host
//! ledger reports. Validation never recovers; a refused transaction stays
//! refused.

use ccpool_protocol::ledger::LedgerError;
use ccpool_protocol::transaction::TxId;
use ccpool_protocol::Address;
use thiserror::Error;

// ---------------------------------------------------------------------------
// BuildError
// ---------------------------------------------------------------------------

/// Expected negative outcomes of transaction construction.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Plan names are 1 to 8 printable ASCII characters.
    #[error("invalid plan name {name:?}: expected 1-8 printable ASCII characters")]
    InvalidPlanName { name: String },

    #[error("invalid plan parameters: min_seconds {min_seconds} > max_seconds {max_seconds}")]
    InvalidPlanParameters { min_seconds: u64, max_seconds: u64 },

    /// A Funding record for this plan name already exists.
    #[error("rewards plan {plan} already exists (funding {funding_txid})")]
    PlanExists { plan: String, funding_txid: TxId },

    #[error("rewards plan {plan} does not exist")]
    PlanNotFound { plan: String },

    /// The caller named a funding transaction that is not the plan's.
    #[error("funding {given} is not the funding transaction of plan {plan} ({expected})")]
    FundingMismatch {
        plan: String,
        expected: TxId,
        given: TxId,
    },

    #[error("amount must be > 0")]
    ZeroAmount,

    #[error("insufficient funds: need {needed}, found {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("deposit {deposit} below plan minimum {minimum}")]
    DepositBelowMinimum { deposit: u64, minimum: u64 },

    /// The plan's pool holds less than the requested deposit.
    #[error("plan funds {available} cannot back a deposit of {deposit}")]
    InsufficientPlanFunds { deposit: u64, available: u64 },

    #[error("no unspent lock found")]
    LockNotFound,

    /// The lock exists but was confirmed less than `min_seconds` ago.
    #[error("lock has not matured: {elapsed}s elapsed, plan minimum is {min_seconds}s")]
    LockNotMature { elapsed: u64, min_seconds: u64 },

    /// An unlock would pay less reward than it costs in fees.
    #[error("reward {reward} does not exceed fee {fee}")]
    RewardTooSmall { reward: u64, fee: u64 },

    #[error("faucet payouts are only for brand new addresses: {address} funded {age_blocks} blocks ago")]
    AddressNotFresh { address: Address, age_blocks: u64 },

    /// No nonce in the searched range produced a qualifying txid. Try again
    /// later with a fresh start nonce.
    #[error("proof-of-work search exhausted after {attempts} attempts")]
    PowExhausted { attempts: u32 },

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// Consensus violations. One variant per rule; `Display` is the stable
/// reason string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no vouts")]
    NoOutputs,

    /// An input spends something other than this contract's pool.
    #[error("illegal normal vini")]
    IllegalNormalInput,

    #[error("invalid rewards annotation")]
    InvalidRewardsAnnotation,

    #[error("invalid faucet annotation")]
    InvalidFaucetAnnotation,

    #[error("rewards plan not found")]
    PlanNotFound,

    #[error("cant find vinTx")]
    MissingVinTx,

    /// Contract funds must come from settled state.
    #[error("cant {contract} from mempool")]
    FromMempool { contract: &'static str },

    /// A pool input belongs to a different plan or funding.
    #[error("wrong plan reference")]
    WrongPlanReference,

    #[error("unlock must spend exactly one lock")]
    LockCount,

    /// The lock's principal is below the plan's `min_deposit`.
    #[error("lock below plan minimum deposit")]
    LockBelowMinimum,

    /// The unlock's reference time lies outside `[lock time, tip time]`.
    #[error("unlock time in the future")]
    UnlockTime,

    #[error("lock has not matured")]
    LockNotMatured,

    #[error("mismatched inputs != outputs + payout + txfee")]
    ConservationMismatch {
        inputs: u64,
        outputs: u64,
        declared: u64,
        fee: u64,
    },

    #[error("invalid rewards output")]
    InvalidRewardsOutput,

    #[error("unlock must pay the lock owner")]
    WrongPayee,

    #[error("invalid faucet output")]
    InvalidFaucetOutput,

    /// The txid misses the proof-of-work target.
    #[error("invalid faucetget txid")]
    InvalidFaucetTxid,

    #[error("faucet is only for brand new addresses")]
    AddressNotFresh,

    #[error("unexpected extra outputs")]
    ExtraOutputs,

    /// The host could not answer a query. Not a property of the
    /// transaction, but validation cannot proceed without the answer.
    #[error("ledger query failed")]
    LedgerQuery { detail: String },
}

impl From<LedgerError> for ValidationError {
    fn from(err: LedgerError) -> Self {
        ValidationError::LedgerQuery {
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_strings_are_stable() {
        assert_eq!(ValidationError::NoOutputs.to_string(), "no vouts");
        assert_eq!(
            ValidationError::IllegalNormalInput.to_string(),
            "illegal normal vini"
        );
        assert_eq!(
            ValidationError::FromMempool { contract: "faucet" }.to_string(),
            "cant faucet from mempool"
        );
        assert_eq!(
            ValidationError::ConservationMismatch {
                inputs: 3,
                outputs: 1,
                declared: 1,
                fee: 0
            }
            .to_string(),
            "mismatched inputs != outputs + payout + txfee"
        );
        assert_eq!(
            ValidationError::InvalidFaucetTxid.to_string(),
            "invalid faucetget txid"
        );
        assert_eq!(
            ValidationError::LockBelowMinimum.to_string(),
            "lock below plan minimum deposit"
        );
    }

    #[test]
    fn ledger_errors_become_query_failures() {
        let err: ValidationError = LedgerError::Corrupt("x".into()).into();
        assert_eq!(err.to_string(), "ledger query failed");
    }
}
