//! The opened data directory: config, persistent ledger with both contract
//! validators registered, and the operator key.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ccpool_contracts::{Faucet, Rewards};
use ccpool_protocol::crypto::LedgerKeypair;
use ccpool_protocol::ledger::{ContractValidator, LedgerView};
use ccpool_protocol::storage::Block;
use ccpool_protocol::transaction::{sign_transaction, Transaction, TxId};
use ccpool_protocol::{Address, LedgerDb, MemoryLedger};
use tracing::{debug, info};

use crate::cli::CcpoolNodeCli;
use crate::config::NodeConfig;

pub const CONFIG_FILE: &str = "config.json";
pub const KEY_FILE: &str = "node.key";
pub const LEDGER_DIR: &str = "ledger";

pub struct NodeContext {
    pub config: NodeConfig,
    pub ledger: MemoryLedger,
    pub db: LedgerDb,
    pub rewards: Rewards,
    pub faucet: Faucet,
    pub keypair: LedgerKeypair,
    pub address: Address,
}

pub fn config_path(cli: &CcpoolNodeCli) -> PathBuf {
    cli.config
        .clone()
        .unwrap_or_else(|| cli.data_dir.join(CONFIG_FILE))
}

/// Reads the hex secret from `--key`, else from the key file.
pub fn load_keypair(cli: &CcpoolNodeCli) -> Result<LedgerKeypair> {
    let hex = match &cli.key {
        Some(hex) => hex.trim().to_string(),
        None => {
            let path = cli.data_dir.join(KEY_FILE);
            if !path.exists() {
                bail!(
                    "no key file at {}; run `ccpool-node init` or pass --key",
                    path.display()
                );
            }
            std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read key file {}", path.display()))?
                .trim()
                .to_string()
        }
    };
    LedgerKeypair::from_hex(&hex).context("invalid node key")
}

impl NodeContext {
    pub fn open(cli: &CcpoolNodeCli) -> Result<Self> {
        let config = NodeConfig::load(&config_path(cli))?;
        let keypair = load_keypair(cli)?;
        Self::open_with(&cli.data_dir, config, keypair)
    }

    pub fn open_with(data_dir: &Path, config: NodeConfig, keypair: LedgerKeypair) -> Result<Self> {
        let db_path = data_dir.join(LEDGER_DIR);
        let db = LedgerDb::open(&db_path)
            .with_context(|| format!("failed to open ledger at {}", db_path.display()))?;

        let rewards = Rewards::new(config.rewards_params());
        let faucet = Faucet::new(config.faucet_params());
        let validators: Vec<Arc<dyn ContractValidator>> =
            vec![Arc::new(rewards.validator()), Arc::new(faucet.validator())];
        let ledger = MemoryLedger::open(db.clone(), config.genesis_time, validators)
            .context("failed to restore ledger")?;

        let address = Address::from_public_key(&keypair.public_key());
        debug!(%address, path = %db_path.display(), "node context opened");

        Ok(Self {
            config,
            ledger,
            db,
            rewards,
            faucet,
            keypair,
            address,
        })
    }

    /// Time of the next block: one spacing past the tip.
    pub fn next_block_time(&self) -> Result<u64> {
        Ok(self.ledger.tip()?.time + self.config.block_spacing)
    }

    /// Signs the ordinary inputs of `tx` with the node key and submits it.
    pub fn sign_and_submit(&self, mut tx: Transaction) -> Result<TxId> {
        sign_transaction(&mut tx, &self.keypair);
        self.submit(tx)
    }

    pub fn submit(&self, tx: Transaction) -> Result<TxId> {
        let txid = self.ledger.submit(tx)?;
        info!(%txid, mempool = self.ledger.mempool_len(), "transaction admitted");
        Ok(txid)
    }

    pub fn mine(&self, time: u64, coinbase: Vec<Transaction>) -> Result<Block> {
        Ok(self.ledger.mine_block(time, coinbase)?)
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush().context("failed to flush ledger")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccpool_protocol::config::COIN;

    #[test]
    fn reopen_restores_chain_and_mempool() {
        let dir = tempfile::tempdir().unwrap();
        let seed = [5u8; 32];
        let config = NodeConfig {
            genesis_time: 1_000,
            ..NodeConfig::default()
        };

        let pending = {
            let node =
                NodeContext::open_with(dir.path(), config.clone(), LedgerKeypair::from_seed(&seed))
                    .unwrap();
            let coinbase = Transaction::coinbase(node.address.clone(), 10 * COIN, 1);
            node.mine(node.next_block_time().unwrap(), vec![coinbase])
                .unwrap();
            let tx = node
                .faucet
                .fund(&node.ledger, &node.address, 2 * COIN)
                .unwrap();
            let txid = node.sign_and_submit(tx).unwrap();
            node.flush().unwrap();
            txid
        };

        let node =
            NodeContext::open_with(dir.path(), config, LedgerKeypair::from_seed(&seed)).unwrap();
        let tip = node.ledger.tip().unwrap();
        assert_eq!(tip.height, 1);
        assert_eq!(tip.time, 1_060);
        assert_eq!(node.ledger.mempool_len(), 1);
        assert_eq!(node.ledger.pending_transactions()[0].txid(), pending);
    }

    #[test]
    fn key_must_be_present() {
        let dir = tempfile::tempdir().unwrap();
        let cli = <CcpoolNodeCli as clap::Parser>::try_parse_from([
            "ccpool-node",
            "--data-dir",
            dir.path().to_str().unwrap(),
            "status",
        ])
        .unwrap();
        assert!(load_keypair(&cli).is_err());
    }
}
