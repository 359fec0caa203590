//! # Proof-of-Work Grinder
//!
//! A faucet disbursement is only valid if its own txid starts and ends with
//! a zero byte. The grinder finds one by rewriting the nonce in the
//! transaction's Faucet annotation until the hash qualifies, about 65 536
//! tries on average.
//!
//! The annotation is the last field of the canonical bytes and the nonce is
//! the last four bytes of the annotation, so each attempt patches four bytes
//! in place and rehashes. The result is byte-identical to what
//! [`Transaction::txid`] computes; validators re-check with
//! [`meets_target`].

use ccpool_protocol::crypto::double_sha256;
use ccpool_protocol::transaction::{Transaction, TxId};
use rand::Rng;
use tracing::debug;

use crate::annotation::FaucetRecord;

/// Whether `txid` satisfies the disbursement target.
pub fn meets_target(txid: &TxId) -> bool {
    let bytes = txid.as_bytes();
    bytes[0] == 0 && bytes[31] == 0
}

/// A random starting nonce in `[0, 2^28)`.
pub fn random_start_nonce() -> u32 {
    rand::thread_rng().gen::<u32>() & 0x0fff_ffff
}

/// A transaction whose txid meets the target.
#[derive(Debug, Clone)]
pub struct Grind {
    pub transaction: Transaction,
    pub nonce: u32,
    /// Nonces tried, including the winning one.
    pub attempts: u32,
}

impl Grind {
    pub fn txid(&self) -> TxId {
        self.transaction.txid()
    }
}

/// Searches `max_attempts` nonces from `start_nonce` for a qualifying txid.
///
/// `template`'s annotation is replaced with a Faucet Get record. `None`
/// means the search was exhausted; retry with another start nonce or
/// another snapshot of the pool.
pub fn grind(mut template: Transaction, start_nonce: u32, max_attempts: u32) -> Option<Grind> {
    template.annotation = Some(FaucetRecord::Get { nonce: start_nonce }.encode());
    let mut bytes = template.to_bytes();
    let nonce_at = bytes.len() - 4;

    let mut nonce = start_nonce;
    for attempt in 1..=max_attempts {
        bytes[nonce_at..].copy_from_slice(&nonce.to_le_bytes());
        let txid = TxId::from_bytes(double_sha256(&bytes));
        if meets_target(&txid) {
            template.annotation = Some(FaucetRecord::Get { nonce }.encode());
            debug!(%txid, nonce, attempts = attempt, "found valid txid");
            return Some(Grind {
                transaction: template,
                nonce,
                attempts: attempt,
            });
        }
        nonce = nonce.wrapping_add(1);
    }

    debug!(start_nonce, max_attempts, "proof-of-work search exhausted");
    None
}
