//! # ccpool Contracts
//!
//! Two pool contracts over a UTXO ledger:
//!
//! - **Rewards**: time-locked deposits earning a fixed annual rate out of
//!   a funded plan. Create a plan, add funding, lock, unlock.
//! - **Faucet**: a fixed grant for brand new addresses, rate-limited by
//!   proof of work on the disbursement's own txid.
//!
//! Contracts hold no state of their own. A plan is the transaction that
//! declared it, a pool balance is whatever the ledger's unspent index says,
//! and every builder and validator recomputes both through
//! [`ccpool_protocol::LedgerView`] on each call.
//!
//! ## Architecture
//!
//! ```text
//! annotation.rs   — Byte-exact record codec for the annotation channel
//! conservation.rs — Pool inputs == pool outputs + payout + fee
//! selector.rs     — UTXO selection policies
//! plan.rs         — Plan lookup and per-plan fund totals
//! reward.rs       — Fixed-point reward calculation
//! grinder.rs      — Disbursement proof-of-work search
//! rewards.rs      — Rewards builders and validator
//! faucet.rs       — Faucet builders and validator
//! ```
//!
//! ## Design Principles
//!
//! 1. Builders return `Result<_, BuildError>`: "plan not found" is an
//!    answer, not a crash.
//! 2. Validators report the first rule broken as a stable reason string.
//! 3. All value arithmetic saturates or widens; nothing wraps.

pub mod annotation;
pub mod conservation;
pub mod contract;
pub mod error;
pub mod faucet;
pub mod grinder;
pub mod plan;
pub mod reward;
pub mod rewards;
pub mod selector;

pub use annotation::{FaucetRecord, PlanName, PlanParams, RewardsRecord};
pub use contract::{ContractInfo, FaucetParams, RewardsParams};
pub use error::{BuildError, ValidationError};
pub use faucet::{Faucet, FaucetValidator};
pub use grinder::Grind;
pub use plan::{PlanInfo, PlanRecord};
pub use rewards::{Rewards, RewardsValidator};
