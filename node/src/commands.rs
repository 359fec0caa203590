//! Subcommand handlers.
//!
//! Every handler runs against an opened [`NodeContext`], performs one
//! operation and returns the JSON document `main` prints to stdout. `init`
//! prepares the data directory first and then reports status. Builder
//! refusals such as an immature lock are returned as errors unchanged.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ccpool_contracts::PlanParams;
use ccpool_protocol::crypto::LedgerKeypair;
use ccpool_protocol::ledger::LedgerView;
use ccpool_protocol::transaction::{Transaction, TxId};
use ccpool_protocol::Address;
use serde_json::{json, Value};
use tracing::info;

use crate::cli::{
    CcpoolNodeCli, Commands, CreatePlanArgs, FaucetCommand, GetArgs, InfoArgs, MineArgs,
    PlanAmountArgs, RewardsCommand, UnlockArgs,
};
use crate::config::NodeConfig;
use crate::node::{config_path, load_keypair, NodeContext, KEY_FILE};

pub fn run(cli: &CcpoolNodeCli) -> Result<Value> {
    let node = match cli.command {
        Commands::Init => init(cli)?,
        _ => NodeContext::open(cli)?,
    };
    let output = match &cli.command {
        Commands::Init | Commands::Status => status(&node),
        Commands::Mint(args) => mint(&node, args.amount),
        Commands::Mine(args) => mine(&node, args),
        Commands::Rewards(command) => rewards(&node, command),
        Commands::Faucet(command) => faucet(&node, command),
    }?;
    node.flush()?;
    Ok(output)
}

fn parse_txid(label: &str, hex: &str) -> Result<TxId> {
    TxId::from_hex(hex).ok_or_else(|| anyhow!("invalid {} txid: {}", label, hex))
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Creates the data directory, key file and config as needed, then opens
/// the ledger. Existing files are kept.
fn init(cli: &CcpoolNodeCli) -> Result<NodeContext> {
    let data_dir = &cli.data_dir;
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let key_path = data_dir.join(KEY_FILE);
    let keypair = match &cli.key {
        Some(hex) => LedgerKeypair::from_hex(hex).context("invalid node key")?,
        None if key_path.exists() => load_keypair(cli)?,
        None => {
            let keypair = LedgerKeypair::generate();
            write_key_file(&key_path, &keypair)?;
            info!(path = %key_path.display(), "generated node key");
            keypair
        }
    };

    let config_path = config_path(cli);
    let config = if config_path.exists() {
        NodeConfig::load(&config_path)?
    } else {
        let config = NodeConfig {
            genesis_time: u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0),
            ..NodeConfig::default()
        };
        config.save(&config_path)?;
        info!(path = %config_path.display(), "wrote default config");
        config
    };

    NodeContext::open_with(data_dir, config, keypair)
}

fn write_key_file(path: &Path, keypair: &LedgerKeypair) -> Result<()> {
    std::fs::write(path, keypair.to_hex())
        .with_context(|| format!("failed to write key file {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

fn status(node: &NodeContext) -> Result<Value> {
    let tip = node.ledger.tip()?;
    Ok(json!({
        "height": tip.height,
        "time": tip.time,
        "mempool": node.ledger.mempool_len(),
        "address": node.address.to_string(),
        "balance": node.ledger.balance(&node.address)?,
        "rewards_pool": node.ledger.balance(&node.rewards.contract().pool)?,
        "faucet_pool": node.ledger.balance(&node.faucet.contract().pool)?,
    }))
}

fn mint(node: &NodeContext, amount: u64) -> Result<Value> {
    let height = node.ledger.tip()?.height + 1;
    let coinbase = Transaction::coinbase(node.address.clone(), amount, height);
    let txid = coinbase.txid();
    let block = node.mine(node.next_block_time()?, vec![coinbase])?;
    Ok(json!({
        "txid": txid,
        "height": block.height(),
        "amount": amount,
    }))
}

fn mine(node: &NodeContext, args: &MineArgs) -> Result<Value> {
    let spacing = args.advance.unwrap_or(node.config.block_spacing);
    let mut blocks = Vec::with_capacity(args.blocks as usize);
    for _ in 0..args.blocks {
        let time = node.ledger.tip()?.time + spacing;
        let block = node.mine(time, Vec::new())?;
        blocks.push(json!({
            "height": block.height(),
            "time": block.time(),
            "transactions": block.transactions.len(),
        }));
    }
    Ok(json!({ "blocks": blocks }))
}

// ---------------------------------------------------------------------------
// Rewards
// ---------------------------------------------------------------------------

fn rewards(node: &NodeContext, command: &RewardsCommand) -> Result<Value> {
    match command {
        RewardsCommand::Create(args) => rewards_create(node, args),
        RewardsCommand::AddFunding(args) => {
            let funding = parse_txid("funding", &args.funding)?;
            let tx = node.rewards.add_funding(
                &node.ledger,
                &node.address,
                &args.name,
                funding,
                args.amount,
            )?;
            submitted(node.sign_and_submit(tx)?)
        }
        RewardsCommand::Lock(args) => rewards_lock(node, args),
        RewardsCommand::Unlock(args) => rewards_unlock(node, args),
        RewardsCommand::Info(args) => rewards_info(node, args),
        RewardsCommand::List => {
            let plans: Vec<Value> = node
                .rewards
                .list(&node.ledger)?
                .into_iter()
                .map(|plan| {
                    json!({
                        "name": plan.plan.to_string(),
                        "funding_txid": plan.funding_txid,
                        "params": plan.params,
                    })
                })
                .collect();
            Ok(json!({ "plans": plans }))
        }
    }
}

fn rewards_create(node: &NodeContext, args: &CreatePlanArgs) -> Result<Value> {
    let params = PlanParams {
        apr: args.apr,
        min_seconds: args.min_seconds,
        max_seconds: args.max_seconds,
        min_deposit: args.min_deposit,
    };
    let tx = node.rewards.create_funding(
        &node.ledger,
        &node.address,
        &args.name,
        args.funds,
        params,
    )?;
    let txid = node.sign_and_submit(tx)?;
    Ok(json!({ "txid": txid, "plan": args.name }))
}

fn rewards_lock(node: &NodeContext, args: &PlanAmountArgs) -> Result<Value> {
    let funding = parse_txid("funding", &args.funding)?;
    let tx = node
        .rewards
        .lock(&node.ledger, &node.address, &args.name, funding, args.amount)?;
    submitted(node.sign_and_submit(tx)?)
}

fn rewards_unlock(node: &NodeContext, args: &UnlockArgs) -> Result<Value> {
    let funding = parse_txid("funding", &args.funding)?;
    let lock = args
        .lock
        .as_deref()
        .map(|hex| parse_txid("lock", hex))
        .transpose()?;
    let tx = node
        .rewards
        .unlock(&node.ledger, &args.name, funding, &node.address, lock)?;
    let payout = tx.outputs.last().map(|out| out.value).unwrap_or(0);
    // pool inputs only: nothing to sign
    let txid = node.submit(tx)?;
    Ok(json!({ "txid": txid, "payout": payout }))
}

fn rewards_info(node: &NodeContext, args: &InfoArgs) -> Result<Value> {
    let funding = parse_txid("funding", &args.funding)?;
    let info = node
        .rewards
        .info(&node.ledger, &funding)?
        .ok_or_else(|| anyhow!("{} is not a rewards funding transaction", funding))?;
    Ok(serde_json::to_value(info)?)
}

// ---------------------------------------------------------------------------
// Faucet
// ---------------------------------------------------------------------------

fn faucet(node: &NodeContext, command: &FaucetCommand) -> Result<Value> {
    match command {
        FaucetCommand::Fund(args) => {
            let tx = node.faucet.fund(&node.ledger, &node.address, args.amount)?;
            submitted(node.sign_and_submit(tx)?)
        }
        FaucetCommand::Get(args) => faucet_get(node, args),
    }
}

fn faucet_get(node: &NodeContext, args: &GetArgs) -> Result<Value> {
    let payee = match &args.address {
        Some(address) => {
            Address::parse(address).ok_or_else(|| anyhow!("invalid address: {}", address))?
        }
        None => node.address.clone(),
    };
    let found = node.faucet.disburse(&node.ledger, &payee, args.nonce)?;
    let nonce = found.nonce;
    let attempts = found.attempts;
    let txid = node.submit(found.transaction)?;
    Ok(json!({
        "txid": txid,
        "payee": payee.to_string(),
        "nonce": nonce,
        "attempts": attempts,
    }))
}

fn submitted(txid: TxId) -> Result<Value> {
    Ok(json!({ "txid": txid }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccpool_contracts::reward::calc_reward;
    use ccpool_protocol::config::{COIN, DEFAULT_TX_FEE, FAUCET_PAYOUT};
    use clap::Parser;

    struct Harness {
        dir: tempfile::TempDir,
    }

    impl Harness {
        fn new() -> Self {
            let harness = Self {
                dir: tempfile::tempdir().unwrap(),
            };
            harness.run(&["init"]).unwrap();
            harness
        }

        fn run(&self, args: &[&str]) -> Result<Value> {
            let data_dir = self.dir.path().to_str().unwrap().to_string();
            let mut argv = vec!["ccpool-node", "--data-dir", data_dir.as_str()];
            argv.extend_from_slice(args);
            let cli = CcpoolNodeCli::try_parse_from(argv).unwrap();
            run(&cli)
        }
    }

    fn txid_of(value: &Value) -> String {
        value["txid"].as_str().unwrap().to_string()
    }

    #[test]
    fn init_is_idempotent() {
        let harness = Harness::new();
        let first = harness.run(&["status"]).unwrap();
        let again = harness.run(&["init"]).unwrap();
        assert_eq!(first["address"], again["address"]);
        assert_eq!(again["height"], 0);
    }

    #[test]
    fn rewards_lifecycle_through_cli() {
        let harness = Harness::new();
        let coins = (1_000 * COIN).to_string();
        harness.run(&["mint", "--amount", &coins]).unwrap();

        let funding = txid_of(
            &harness
                .run(&[
                    "rewards",
                    "create",
                    "--name",
                    "gold",
                    "--funds",
                    &(500 * COIN).to_string(),
                    "--apr",
                    &COIN.to_string(),
                    "--min-seconds",
                    "3600",
                    "--max-seconds",
                    "86400",
                ])
                .unwrap(),
        );
        harness.run(&["mine"]).unwrap();

        harness
            .run(&[
                "rewards",
                "lock",
                "--name",
                "gold",
                "--funding",
                &funding,
                "--amount",
                &(100 * COIN).to_string(),
            ])
            .unwrap();
        harness.run(&["mine"]).unwrap();

        let early = harness.run(&["rewards", "unlock", "--name", "gold", "--funding", &funding]);
        assert!(early.is_err());

        harness.run(&["mine", "--advance", "7200"]).unwrap();
        let unlocked = harness
            .run(&["rewards", "unlock", "--name", "gold", "--funding", &funding])
            .unwrap();
        harness.run(&["mine"]).unwrap();

        let reward = calc_reward(
            100 * COIN,
            7_200,
            &PlanParams {
                apr: COIN,
                min_seconds: 3_600,
                max_seconds: 86_400,
                min_deposit: 0,
            },
        );
        assert_eq!(unlocked["payout"], 100 * COIN + reward);

        let info = harness
            .run(&["rewards", "info", "--funding", &funding])
            .unwrap();
        assert_eq!(info["name"], "gold");
        assert_eq!(info["available"], 500 * COIN - reward - DEFAULT_TX_FEE);

        let list = harness.run(&["rewards", "list"]).unwrap();
        assert_eq!(list["plans"].as_array().unwrap().len(), 1);
        assert_eq!(harness.run(&["status"]).unwrap()["mempool"], 0);
    }

    #[test]
    fn faucet_pays_a_fresh_address() {
        let harness = Harness::new();
        harness
            .run(&["mint", "--amount", &(10 * COIN).to_string()])
            .unwrap();
        harness
            .run(&["faucet", "fund", "--amount", &(5 * COIN).to_string()])
            .unwrap();
        harness.run(&["mine"]).unwrap();

        let payee = Address::from_public_key(&LedgerKeypair::from_seed(&[9u8; 32]).public_key());
        let got = harness
            .run(&["faucet", "get", "--address", payee.as_str()])
            .unwrap();
        assert!(got["attempts"].as_u64().unwrap() >= 1);
        harness.run(&["mine"]).unwrap();

        let status = harness.run(&["status"]).unwrap();
        assert_eq!(status["faucet_pool"], 5 * COIN - FAUCET_PAYOUT - DEFAULT_TX_FEE);
    }

    #[test]
    fn malformed_txid_is_reported() {
        let harness = Harness::new();
        let err = harness
            .run(&["rewards", "info", "--funding", "zz"])
            .unwrap_err();
        assert!(err.to_string().contains("invalid funding txid"));
    }
}
