//! Integration tests for the Faucet contract.
//!
//! Disbursements here really grind: each one searches for a txid with a
//! zero first and last byte before it is submitted to a `MemoryLedger`
//! running the Faucet validator.

use std::sync::Arc;

use ccpool_contracts::grinder::meets_target;
use ccpool_contracts::{BuildError, Faucet, FaucetParams, FaucetRecord};
use ccpool_protocol::config::{COIN, DEFAULT_TX_FEE, EVAL_FAUCET};
use ccpool_protocol::crypto::LedgerKeypair;
use ccpool_protocol::ledger::LedgerResult;
use ccpool_protocol::transaction::{sign_transaction, OutPoint, TransactionBuilder, TxOut};
use ccpool_protocol::{Address, LedgerError, LedgerView, MemoryLedger, Transaction, TxId};

const GENESIS: u64 = 1_700_000_000;
const FEE: u64 = DEFAULT_TX_FEE;
const PAYOUT: u64 = COIN - DEFAULT_TX_FEE;

struct Wallet {
    key: LedgerKeypair,
    address: Address,
}

fn wallet(seed: u8) -> Wallet {
    let key = LedgerKeypair::from_seed(&[seed; 32]);
    let address = Address::from_public_key(&key.public_key());
    Wallet { key, address }
}

/// A ledger with the Faucet validator and a funder holding 20 COIN.
fn setup() -> (MemoryLedger, Faucet, Wallet) {
    let faucet = Faucet::default();
    let ledger = MemoryLedger::new(GENESIS);
    ledger.register_validator(Arc::new(faucet.validator()));

    let funder = wallet(1);
    let coinbase = Transaction::coinbase(funder.address.clone(), 20 * COIN, 1);
    ledger.mine_block(GENESIS + 60, vec![coinbase]).unwrap();
    (ledger, faucet, funder)
}

fn mine(ledger: &MemoryLedger) {
    let time = ledger.tip().unwrap().time + 60;
    ledger.mine_block(time, Vec::new()).unwrap();
}

/// Funds the pool with `amount` and confirms it.
fn fund(ledger: &MemoryLedger, faucet: &Faucet, funder: &Wallet, amount: u64) -> TxId {
    let mut tx = faucet.fund(ledger, &funder.address, amount).unwrap();
    sign_transaction(&mut tx, &funder.key);
    let txid = ledger.submit(tx).unwrap();
    mine(ledger);
    txid
}

fn rejection(result: LedgerResult<TxId>) -> String {
    match result {
        Err(LedgerError::ContractRejected { evalcode, reason }) => {
            assert_eq!(evalcode, EVAL_FAUCET);
            reason
        }
        other => panic!("expected a contract rejection, got {:?}", other),
    }
}

fn pool_balance(ledger: &MemoryLedger, faucet: &Faucet) -> u64 {
    ledger.balance(&faucet.contract().pool).unwrap()
}

// ---------------------------------------------------------------------------
// Funding
// ---------------------------------------------------------------------------

#[test]
fn fund_moves_value_into_the_pool() {
    let (ledger, faucet, funder) = setup();
    let tx = faucet.fund(&ledger, &funder.address, 3 * COIN).unwrap();
    assert_eq!(FaucetRecord::from_transaction(&tx), Some(FaucetRecord::Fund));
    assert_eq!(tx.outputs[0], TxOut::to_contract(EVAL_FAUCET, 3 * COIN));
    assert_eq!(
        tx.outputs[1],
        TxOut::to_address(funder.address.clone(), 17 * COIN - FEE)
    );

    fund(&ledger, &faucet, &funder, 3 * COIN);
    assert_eq!(pool_balance(&ledger, &faucet), 3 * COIN);
    assert_eq!(ledger.balance(&funder.address).unwrap(), 17 * COIN - FEE);
}

#[test]
fn fund_requires_funds() {
    let (ledger, faucet, funder) = setup();
    assert!(matches!(
        faucet.fund(&ledger, &funder.address, 0),
        Err(BuildError::ZeroAmount)
    ));
    assert!(matches!(
        faucet.fund(&ledger, &funder.address, 20 * COIN),
        Err(BuildError::InsufficientFunds { .. })
    ));
}

// ---------------------------------------------------------------------------
// Disbursement
// ---------------------------------------------------------------------------

#[test]
fn disbursement_gate() {
    let (ledger, faucet, funder) = setup();
    fund(&ledger, &faucet, &funder, COIN);
    let payee = wallet(10);

    let grind = faucet
        .disburse(&ledger, &payee.address, Some(0x0123_4567))
        .unwrap();
    let tx = grind.transaction.clone();
    let txid = tx.txid();
    assert_eq!(txid.as_bytes()[0], 0);
    assert_eq!(txid.as_bytes()[31], 0);
    assert_eq!(tx.outputs, vec![TxOut::to_address(payee.address.clone(), PAYOUT)]);
    assert_eq!(
        FaucetRecord::from_transaction(&tx),
        Some(FaucetRecord::Get { nonce: grind.nonce })
    );

    let mut tampered = tx.clone();
    tampered.annotation = Some(
        FaucetRecord::Get {
            nonce: grind.nonce.wrapping_sub(1),
        }
        .encode(),
    );
    assert!(!meets_target(&tampered.txid()));
    assert_eq!(rejection(ledger.submit(tampered)), "invalid faucetget txid");

    assert_eq!(ledger.submit(tx).unwrap(), txid);
    mine(&ledger);
    assert_eq!(ledger.balance(&payee.address).unwrap(), PAYOUT);
    assert_eq!(pool_balance(&ledger, &faucet), 0);
}

#[test]
fn change_returns_to_the_pool() {
    let (ledger, faucet, funder) = setup();
    fund(&ledger, &faucet, &funder, 3 * COIN);
    let payee = wallet(11);

    let grind = faucet.disburse(&ledger, &payee.address, Some(99)).unwrap();
    let tx = grind.transaction;
    assert_eq!(tx.outputs.len(), 2);
    assert_eq!(tx.outputs[0], TxOut::to_contract(EVAL_FAUCET, 2 * COIN));
    assert_eq!(tx.outputs[1], TxOut::to_address(payee.address.clone(), PAYOUT));

    ledger.submit(tx).unwrap();
    mine(&ledger);
    assert_eq!(pool_balance(&ledger, &faucet), 2 * COIN);
}

#[test]
fn pending_spends_are_not_selected_again() {
    let (ledger, faucet, funder) = setup();
    fund(&ledger, &faucet, &funder, COIN);
    fund(&ledger, &faucet, &funder, COIN);
    let first = wallet(12);
    let second = wallet(13);

    let a = faucet.disburse(&ledger, &first.address, Some(1)).unwrap();
    ledger.submit(a.transaction.clone()).unwrap();

    let b = faucet.disburse(&ledger, &second.address, Some(2)).unwrap();
    assert_ne!(a.transaction.inputs[0].prevout, b.transaction.inputs[0].prevout);
    ledger.submit(b.transaction).unwrap();

    // nothing left that isn't already claimed
    assert!(matches!(
        faucet.disburse(&ledger, &wallet(14).address, Some(3)),
        Err(BuildError::InsufficientFunds { .. })
    ));

    mine(&ledger);
    assert_eq!(ledger.balance(&first.address).unwrap(), PAYOUT);
    assert_eq!(ledger.balance(&second.address).unwrap(), PAYOUT);
}

#[test]
fn empty_pool_is_insufficient() {
    let (ledger, faucet, _) = setup();
    match faucet.disburse(&ledger, &wallet(10).address, Some(0)) {
        Err(BuildError::InsufficientFunds { needed, available }) => {
            assert_eq!(needed, COIN);
            assert_eq!(available, 0);
        }
        other => panic!("expected InsufficientFunds, got {:?}", other.map(|g| g.nonce)),
    }
}

#[test]
fn exhausted_search_is_reported() {
    let (ledger, _, funder) = setup();
    let stingy = Faucet::new(FaucetParams {
        grind_attempts: 0,
        ..FaucetParams::default()
    });
    fund(&ledger, &stingy, &funder, COIN);
    assert!(matches!(
        stingy.disburse(&ledger, &wallet(10).address, Some(0)),
        Err(BuildError::PowExhausted { attempts: 0 })
    ));
}

// ---------------------------------------------------------------------------
// Fresh-address rule
// ---------------------------------------------------------------------------

#[test]
fn recently_funded_address_still_qualifies() {
    let (ledger, faucet, funder) = setup();
    let payee = wallet(20);
    let mut gift = faucet
        .fund(&ledger, &funder.address, COIN)
        .map(|mut tx| {
            tx.outputs.push(TxOut::to_address(payee.address.clone(), COIN));
            tx.outputs[1].value -= COIN;
            tx
        })
        .unwrap();
    sign_transaction(&mut gift, &funder.key);
    ledger.submit(gift).unwrap();
    mine(&ledger);
    mine(&ledger);

    let grind = faucet.disburse(&ledger, &payee.address, Some(5)).unwrap();
    ledger.submit(grind.transaction).unwrap();
}

#[test]
fn old_addresses_are_refused() {
    let (ledger, faucet, funder) = setup();
    fund(&ledger, &faucet, &funder, COIN);
    fund(&ledger, &faucet, &funder, COIN);
    let payee = wallet(21);

    let first = faucet.disburse(&ledger, &payee.address, Some(7)).unwrap();
    ledger.submit(first.transaction).unwrap();
    for _ in 0..5 {
        mine(&ledger);
    }

    match faucet.disburse(&ledger, &payee.address, Some(8)) {
        Err(BuildError::AddressNotFresh {
            address,
            age_blocks,
        }) => {
            assert_eq!(address, payee.address);
            assert!(age_blocks > 3);
        }
        other => panic!("expected AddressNotFresh, got {:?}", other.map(|g| g.nonce)),
    }

    // a builder that skips the check still cannot get past the validator
    let lenient = Faucet::new(FaucetParams {
        fresh_address_max_age: u64::MAX,
        ..FaucetParams::default()
    });
    let second = lenient.disburse(&ledger, &payee.address, Some(8)).unwrap();
    assert_eq!(
        rejection(ledger.submit(second.transaction)),
        "faucet is only for brand new addresses"
    );
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

#[test]
fn pending_pool_outputs_cannot_be_spent() {
    let (ledger, faucet, funder) = setup();
    let mut tx = faucet.fund(&ledger, &funder.address, COIN).unwrap();
    sign_transaction(&mut tx, &funder.key);
    let pending = ledger.submit(tx).unwrap();

    let spend = TransactionBuilder::new()
        .contract_input(OutPoint::new(pending, 0), EVAL_FAUCET)
        .pay(wallet(30).address, PAYOUT)
        .annotation(FaucetRecord::Get { nonce: 0 }.encode())
        .build();
    assert_eq!(rejection(ledger.submit(spend)), "cant faucet from mempool");
}

#[test]
fn payout_must_be_the_fixed_amount() {
    let (ledger, faucet, funder) = setup();
    let source = fund(&ledger, &faucet, &funder, COIN);

    // conserves value, but splits the payout across two addresses
    let spend = TransactionBuilder::new()
        .contract_input(OutPoint::new(source, 0), EVAL_FAUCET)
        .pay(wallet(31).address, PAYOUT - 1)
        .pay(wallet(32).address, 1)
        .annotation(FaucetRecord::Get { nonce: 0 }.encode())
        .build();
    assert_eq!(rejection(ledger.submit(spend)), "invalid faucet output");
}

#[test]
fn pool_spends_need_a_get_annotation() {
    let (ledger, faucet, funder) = setup();
    let source = fund(&ledger, &faucet, &funder, COIN);

    let spend = TransactionBuilder::new()
        .contract_input(OutPoint::new(source, 0), EVAL_FAUCET)
        .pay(wallet(33).address, PAYOUT)
        .annotation(FaucetRecord::Fund.encode())
        .build();
    assert_eq!(rejection(ledger.submit(spend)), "invalid faucet annotation");

    let bare = TransactionBuilder::new()
        .contract_input(OutPoint::new(source, 0), EVAL_FAUCET)
        .pay(wallet(33).address, PAYOUT)
        .build();
    assert_eq!(rejection(ledger.submit(bare)), "invalid faucet annotation");
}

#[test]
fn overdrawn_pool_spend_breaks_conservation() {
    let (ledger, faucet, funder) = setup();
    let source = fund(&ledger, &faucet, &funder, 3 * COIN);

    let spend = TransactionBuilder::new()
        .contract_input(OutPoint::new(source, 0), EVAL_FAUCET)
        .pay_contract(EVAL_FAUCET, COIN)
        .pay(wallet(34).address, PAYOUT)
        .annotation(FaucetRecord::Get { nonce: 0 }.encode())
        .build();
    assert_eq!(
        rejection(ledger.submit(spend)),
        "mismatched inputs != outputs + payout + txfee"
    );
}
