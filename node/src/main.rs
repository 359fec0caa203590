// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ccpool Dev-Chain Node
//!
//! Entry point for the `ccpool-node` binary. Parses CLI arguments,
//! initializes logging, runs one subcommand against the data directory and
//! prints its result as JSON.
//!
//! - `init`: create the data directory, node key, config and genesis block
//! - `status`: chain tip, mempool and balances
//! - `mint`: dev-only coinbase to the node key
//! - `mine`: confirm the mempool into blocks
//! - `rewards`: create, add-funding, lock, unlock, info, list
//! - `faucet`: fund, get

mod cli;
mod commands;
mod config;
mod logging;
mod node;

use anyhow::Result;
use clap::Parser;

use cli::CcpoolNodeCli;
use logging::LogFormat;

fn main() -> Result<()> {
    let cli = CcpoolNodeCli::parse();
    logging::init_logging(
        logging::DEFAULT_DIRECTIVE,
        LogFormat::from_str_lossy(&cli.log_format),
    );

    tracing::debug!(data_dir = %cli.data_dir.display(), command = ?cli.command, "dispatching");
    let output = commands::run(&cli)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
