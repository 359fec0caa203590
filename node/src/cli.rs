//! # CLI Interface
//!
//! Defines the command-line argument structure for `ccpool-node` using
//! `clap` derive. Global flags select the data directory, config file, key
//! and log format; subcommands drive the dev chain and both contracts.
//!
//! All amounts are raw ledger units (`COIN` = 100 000 000). APR uses the
//! same scale: `10000000` is 10%.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ccpool dev-chain operator.
///
/// Runs the Rewards and Faucet contracts against a single-node, sled-backed
/// ledger. Every command opens the store, does one thing, prints JSON to
/// stdout and exits.
#[derive(Parser, Debug)]
#[command(
    name = "ccpool-node",
    about = "ccpool Rewards & Faucet dev-chain operator",
    version,
    propagate_version = true
)]
pub struct CcpoolNodeCli {
    /// Data directory holding the ledger, key file and config.
    #[arg(long, short = 'd', env = "CCPOOL_DATA_DIR", default_value = ".ccpool", global = true)]
    pub data_dir: PathBuf,

    /// Path to the node configuration file (JSON).
    ///
    /// When omitted, the node looks for `config.json` in the data directory.
    #[arg(long, short = 'c', env = "CCPOOL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Hex-encoded Ed25519 secret key. Overrides the key file.
    #[arg(long, env = "CCPOOL_KEY", hide_env_values = true, global = true)]
    pub key: Option<String>,

    /// Log output format: pretty or json.
    #[arg(long, env = "CCPOOL_LOG_FORMAT", default_value = "pretty", global = true)]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a data directory: key file, default config, genesis block.
    Init,
    /// Print chain tip, mempool size and balances.
    Status,
    /// Mint new coins to the node key in a fresh block (dev only).
    Mint(MintArgs),
    /// Confirm the mempool into one or more blocks.
    Mine(MineArgs),
    /// Rewards contract operations.
    #[command(subcommand)]
    Rewards(RewardsCommand),
    /// Faucet contract operations.
    #[command(subcommand)]
    Faucet(FaucetCommand),
}

#[derive(Args, Debug)]
pub struct MintArgs {
    /// Amount to create, in ledger units.
    #[arg(long)]
    pub amount: u64,
}

#[derive(Args, Debug)]
pub struct MineArgs {
    /// Number of blocks to produce.
    #[arg(long, default_value_t = 1)]
    pub blocks: u32,

    /// Seconds between blocks. Defaults to the configured block spacing.
    #[arg(long)]
    pub advance: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum RewardsCommand {
    /// Declare a new plan and seed its pool.
    Create(CreatePlanArgs),
    /// Add reward funds to an existing plan.
    AddFunding(PlanAmountArgs),
    /// Lock a deposit into a plan.
    Lock(PlanAmountArgs),
    /// Withdraw a matured lock with its reward.
    Unlock(UnlockArgs),
    /// Describe one plan by its funding txid.
    Info(InfoArgs),
    /// List every declared plan.
    List,
}

#[derive(Args, Debug)]
pub struct CreatePlanArgs {
    /// Plan name, 1-8 printable ASCII characters.
    #[arg(long)]
    pub name: String,

    /// Initial pool funds.
    #[arg(long)]
    pub funds: u64,

    /// Annual rate on the COIN scale.
    #[arg(long)]
    pub apr: u64,

    #[arg(long)]
    pub min_seconds: u64,

    #[arg(long)]
    pub max_seconds: u64,

    #[arg(long, default_value_t = 0)]
    pub min_deposit: u64,
}

#[derive(Args, Debug)]
pub struct PlanAmountArgs {
    #[arg(long)]
    pub name: String,

    /// Txid of the plan's Funding transaction.
    #[arg(long)]
    pub funding: String,

    #[arg(long)]
    pub amount: u64,
}

#[derive(Args, Debug)]
pub struct UnlockArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub funding: String,

    /// A specific lock txid. Defaults to the node key's first open lock.
    #[arg(long)]
    pub lock: Option<String>,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[arg(long)]
    pub funding: String,
}

#[derive(Subcommand, Debug)]
pub enum FaucetCommand {
    /// Move funds from the node key into the faucet pool.
    Fund(FundArgs),
    /// Grind and submit a disbursement.
    Get(GetArgs),
}

#[derive(Args, Debug)]
pub struct FundArgs {
    #[arg(long)]
    pub amount: u64,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Payee address. Defaults to the node key's address.
    #[arg(long)]
    pub address: Option<String>,

    /// Starting nonce for the search. Random when omitted.
    #[arg(long)]
    pub nonce: Option<u32>,
}
