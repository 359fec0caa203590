//! Transaction signing with Ed25519 keypairs.
//!
//! Signing is a separate step from building because contract builders run
//! without key material. Every input still [`Unlock::Pending`] receives a
//! signature over [`Transaction::sighash`]; contract inputs are left alone,
//! so a transaction spending only contract inputs keeps its txid.

use super::builder::Transaction;
use super::types::Unlock;
use crate::crypto::keys::LedgerKeypair;

/// Signs every pending ordinary input of `tx` with `keypair`.
///
/// Returns the number of inputs signed. The caller is responsible for
/// `keypair` owning the outputs those inputs spend: the ledger rejects a
/// signature from any other key at admission.
///
/// # Example
///
/// ```rust
/// use ccpool_protocol::crypto::LedgerKeypair;
/// use ccpool_protocol::identity::Address;
/// use ccpool_protocol::transaction::{sign_transaction, OutPoint, TransactionBuilder, TxId};
///
/// let keypair = LedgerKeypair::generate();
/// let mut tx = TransactionBuilder::new()
///     .ordinary_input(OutPoint::new(TxId::from_bytes([1u8; 32]), 0))
///     .pay(Address::from_public_key(&keypair.public_key()), 1_000)
///     .build();
///
/// assert_eq!(sign_transaction(&mut tx, &keypair), 1);
/// assert!(tx.is_signed());
/// ```
pub fn sign_transaction(tx: &mut Transaction, keypair: &LedgerKeypair) -> usize {
    let sighash = tx.sighash();
    let signature = keypair.sign(&sighash);
    let public_key = keypair.public_key();

    let mut signed = 0;
    for input in tx.inputs.iter_mut() {
        if matches!(input.unlock, Unlock::Pending) {
            input.unlock = Unlock::Signature {
                public_key,
                signature: signature.clone(),
            };
            signed += 1;
        }
    }
    signed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Address;
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::types::{OutPoint, TxId};

    fn mixed_tx(owner: &LedgerKeypair) -> Transaction {
        TransactionBuilder::new()
            .ordinary_input(OutPoint::new(TxId::from_bytes([1u8; 32]), 0))
            .ordinary_input(OutPoint::new(TxId::from_bytes([1u8; 32]), 1))
            .contract_input(OutPoint::new(TxId::from_bytes([2u8; 32]), 0), 0xe5)
            .pay(Address::from_public_key(&owner.public_key()), 10)
            .build()
    }

    #[test]
    fn signs_only_pending_inputs() {
        let kp = LedgerKeypair::from_seed(&[1u8; 32]);
        let mut tx = mixed_tx(&kp);
        assert_eq!(sign_transaction(&mut tx, &kp), 2);
        assert!(tx.is_signed());
        assert_eq!(tx.inputs[2].unlock, Unlock::Contract { evalcode: 0xe5 });
    }

    #[test]
    fn signature_verifies_over_sighash() {
        let kp = LedgerKeypair::from_seed(&[2u8; 32]);
        let mut tx = mixed_tx(&kp);
        sign_transaction(&mut tx, &kp);

        match &tx.inputs[0].unlock {
            Unlock::Signature {
                public_key,
                signature,
            } => assert!(public_key.verify(&tx.sighash(), signature)),
            other => panic!("expected signature, got {:?}", other),
        }
    }

    #[test]
    fn resigning_is_a_noop() {
        let kp = LedgerKeypair::from_seed(&[3u8; 32]);
        let mut tx = mixed_tx(&kp);
        sign_transaction(&mut tx, &kp);
        let id = tx.txid();
        assert_eq!(sign_transaction(&mut tx, &kp), 0);
        assert_eq!(tx.txid(), id);
    }

    #[test]
    fn contract_only_transaction_keeps_txid() {
        let kp = LedgerKeypair::from_seed(&[4u8; 32]);
        let mut tx = TransactionBuilder::new()
            .contract_input(OutPoint::new(TxId::from_bytes([2u8; 32]), 0), 0x10)
            .pay(Address::from_public_key(&kp.public_key()), 10)
            .build();
        let id = tx.txid();
        assert_eq!(sign_transaction(&mut tx, &kp), 0);
        assert_eq!(tx.txid(), id);
    }
}
