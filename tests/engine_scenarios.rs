//! End-to-end ledger scenarios driven through the consensus engine

use anyhow::Result;
use utxo_ledger::*;

fn key(seed: u8) -> KeyPair {
    KeyPair::from_secret_bytes(&[seed; 32]).unwrap()
}

/// Engine whose proposer is `key(1)`, advanced once so that `key(1)` owns a
/// confirmed 10-unit coinbase. Returns that coinbase.
fn funded_engine() -> (ConsensusEngine<KeyPair>, Transaction) {
    let mut engine = ConsensusEngine::in_memory(key(1)).unwrap();
    let genesis = engine.advance().unwrap();
    let coinbase = genesis.transactions[0].clone();
    (engine, coinbase)
}

#[test]
fn test_empty_chain_three_blocks() -> Result<()> {
    let mut engine = ConsensusEngine::in_memory(key(1))?;
    for _ in 0..3 {
        engine.advance()?;
    }

    let mut walked = 0;
    let mut cursor = engine.latest_block_hash();
    while let Some(hash) = cursor {
        let block = engine.stores().block(&hash)?.expect("block in chain is stored");
        assert_eq!(block.transactions.len(), 1);
        assert!(block.transactions[0].is_coinbase());
        walked += 1;
        cursor = if block.previous_block_hash == GENESIS_PREVIOUS_HASH {
            None
        } else {
            Some(block.previous_block_hash)
        };
    }
    assert_eq!(walked, 3);
    assert_eq!(engine.stores().blocks.iter_prefix(&[])?.len(), 3);
    Ok(())
}

#[test]
fn test_payment_with_change_is_confirmed() -> Result<()> {
    let (mut engine, coinbase) = funded_engine();
    let sender = key(1);
    let receiver = key(2);

    let payment = coinbase.spend(&sender, receiver.public_key_hash(), 5)?;
    assert_eq!(payment.outputs.len(), 2);
    let payment_id = engine.submit_transaction(payment.clone())?;

    let block = engine.advance()?;
    assert_eq!(block.transactions.len(), 2);
    assert!(block.transactions[0].is_coinbase());
    assert_eq!(block.transactions[1], payment);
    assert!(engine.mempool().is_empty());

    let stores = engine.stores();
    assert!(stores.utxo(&OutPoint::new(coinbase.id(), 0))?.is_none());
    assert_eq!(
        stores.utxo(&OutPoint::new(payment_id, 0))?,
        Some(TransactionOutput::new(receiver.public_key_hash(), 5))
    );
    assert_eq!(
        stores.utxo(&OutPoint::new(payment_id, 1))?,
        Some(TransactionOutput::new(sender.public_key_hash(), 5))
    );
    Ok(())
}

#[test]
fn test_spending_confirmed_spent_output() -> Result<()> {
    let (mut engine, coinbase) = funded_engine();
    let sender = key(1);

    let first = coinbase.spend(&sender, key(2).public_key_hash(), 5)?;
    engine.submit_transaction(first)?;
    engine.advance()?;

    let second = coinbase.spend(&sender, key(3).public_key_hash(), 7)?;
    let result = engine.submit_transaction(second);
    assert!(matches!(result, Err(ConsensusError::AlreadySpent(_))));
    assert!(engine.mempool().is_empty());
    Ok(())
}

#[test]
fn test_chained_pending_transactions() -> Result<()> {
    let (mut engine, coinbase) = funded_engine();
    let alice = key(1);
    let bob = key(2);

    let a = coinbase.spend_all_to(&alice, bob.public_key_hash())?;
    let b = a.spend(&bob, key(3).public_key_hash(), 4)?;
    engine.submit_transaction(a.clone())?;
    engine.submit_transaction(b.clone())?;
    assert_eq!(engine.mempool().len(), 2);

    let block = engine.advance()?;
    assert_eq!(block.transactions.len(), 3);
    assert_eq!(block.transactions[1], a);
    assert_eq!(block.transactions[2], b);
    assert!(engine.stores().utxo(&OutPoint::new(a.id(), 0))?.is_none());
    assert!(engine.stores().utxo(&OutPoint::new(b.id(), 0))?.is_some());
    Ok(())
}

#[test]
fn test_mempool_conflict() -> Result<()> {
    let (mut engine, coinbase) = funded_engine();
    let alice = key(1);
    let bob = key(2);

    let a = coinbase.spend_all_to(&alice, bob.public_key_hash())?;
    engine.submit_transaction(a.clone())?;

    let first = a.spend(&bob, key(3).public_key_hash(), 3)?;
    let second = a.spend(&bob, key(4).public_key_hash(), 6)?;
    engine.submit_transaction(first)?;
    let result = engine.submit_transaction(second);

    assert!(matches!(result, Err(ConsensusError::MempoolConflict(_))));
    assert_eq!(engine.mempool().len(), 2);
    Ok(())
}

#[test]
fn test_double_spend_in_pool_of_confirmed_output() -> Result<()> {
    let (mut engine, coinbase) = funded_engine();
    let sender = key(1);

    engine.submit_transaction(coinbase.spend(&sender, key(2).public_key_hash(), 1)?)?;
    let result = engine.submit_transaction(coinbase.spend(&sender, key(3).public_key_hash(), 2)?);
    assert!(matches!(result, Err(ConsensusError::MempoolConflict(_))));
    Ok(())
}

#[test]
fn test_resubmission_rejected() -> Result<()> {
    let (mut engine, coinbase) = funded_engine();
    let payment = coinbase.spend(&key(1), key(2).public_key_hash(), 5)?;

    engine.submit_transaction(payment.clone())?;
    assert!(matches!(
        engine.submit_transaction(payment.clone()),
        Err(ConsensusError::DuplicateInMempool(_))
    ));

    engine.advance()?;
    assert!(matches!(
        engine.submit_transaction(payment),
        Err(ConsensusError::AlreadyConfirmed(_))
    ));
    Ok(())
}

#[test]
fn test_wrong_key_cannot_spend() -> Result<()> {
    let (mut engine, coinbase) = funded_engine();
    let thief = key(7);

    // Signed correctly by the thief, but the output is locked to key(1)
    let theft = Transaction {
        inputs: vec![TransactionInput::unsigned(
            OutPoint::new(coinbase.id(), 0),
            thief.public_key(),
        )],
        outputs: vec![TransactionOutput::new(thief.public_key_hash(), 10)],
    }
    .signed_by(&thief)?;

    let result = engine.submit_transaction(theft);
    assert!(matches!(result, Err(ConsensusError::KeyMismatch(_))));
    Ok(())
}

#[test]
fn test_unknown_source_rejected() -> Result<()> {
    let (mut engine, _) = funded_engine();
    let stranger = Transaction::coinbase(key(1).public_key_hash(), &[42; 32]);
    let spend = stranger.spend(&key(1), key(2).public_key_hash(), 1)?;

    let result = engine.submit_transaction(spend);
    assert!(matches!(result, Err(ConsensusError::InputNotFound(_))));
    Ok(())
}

#[test]
fn test_out_of_range_output_index() -> Result<()> {
    let (mut engine, coinbase) = funded_engine();
    let owner = key(1);
    let spend = Transaction {
        inputs: vec![TransactionInput::unsigned(
            OutPoint::new(coinbase.id(), 3),
            owner.public_key(),
        )],
        outputs: vec![TransactionOutput::new([9; 32], 1)],
    }
    .signed_by(&owner)?;

    let result = engine.submit_transaction(spend);
    assert!(matches!(result, Err(ConsensusError::InputNotFound(_))));
    Ok(())
}

#[test]
fn test_negative_output_rejected() -> Result<()> {
    let (mut engine, coinbase) = funded_engine();
    let owner = key(1);
    let spend = Transaction {
        inputs: vec![TransactionInput::unsigned(
            OutPoint::new(coinbase.id(), 0),
            owner.public_key(),
        )],
        outputs: vec![
            TransactionOutput::new([9; 32], 15),
            TransactionOutput::new([8; 32], -5),
        ],
    }
    .signed_by(&owner)?;

    let result = engine.submit_transaction(spend);
    assert!(matches!(result, Err(ConsensusError::NegativeAmount(_))));
    Ok(())
}

#[test]
fn test_tip_survives_engine_restart() -> Result<()> {
    let (mut engine, coinbase) = funded_engine();
    engine.submit_transaction(coinbase.spend(&key(1), key(2).public_key_hash(), 5)?)?;
    let tip = engine.advance()?;

    // Same stores, fresh engine: the tip is recovered by scanning blocks
    let mut stores = LedgerStores::in_memory();
    for block in engine.stores().blocks.iter_prefix(&[])? {
        stores.blocks.put(&block.id(), &block)?;
    }
    let restarted = ConsensusEngine::new(stores, key(1), LedgerConfig::default())?;
    assert_eq!(restarted.latest_block_hash(), Some(tip.id()));
    assert_eq!(restarted.latest_block(), Some(&tip));
    Ok(())
}

#[test]
fn test_accepted_block_prunes_its_transactions() -> Result<()> {
    let (mut engine, coinbase) = funded_engine();
    let payment = coinbase.spend(&key(1), key(2).public_key_hash(), 5)?;
    engine.submit_transaction(payment.clone())?;

    let tip = engine.latest_block_hash().expect("funded chain has a tip");
    let block = BlockProposer::new(key(1)).propose(tip, [0; 32], &[payment])?;
    engine.accept_block(block.clone())?;

    assert!(engine.mempool().is_empty());
    assert_eq!(engine.latest_block_hash(), Some(block.id()));

    let next = engine.advance()?;
    assert_eq!(next.previous_block_hash, block.id());
    assert_eq!(next.transactions.len(), 1);
    Ok(())
}

#[test]
fn test_accepted_block_evicts_conflicting_pending() -> Result<()> {
    let (mut engine, coinbase) = funded_engine();
    let alice = key(1);
    let bob = key(2);

    // Pending chain: a spends the coinbase, b spends a
    let a = coinbase.spend_all_to(&alice, bob.public_key_hash())?;
    let b = a.spend_all_to(&bob, key(3).public_key_hash())?;
    engine.submit_transaction(a.clone())?;
    engine.submit_transaction(b.clone())?;

    // A block from another proposer spends the same coinbase output differently
    let rival = coinbase.spend(&alice, key(4).public_key_hash(), 7)?;
    let tip = engine.latest_block_hash().expect("funded chain has a tip");
    let block = BlockProposer::new(key(5)).propose(tip, [0; 32], &[rival])?;
    engine.accept_block(block)?;

    assert!(!engine.mempool().contains(&a.id()));
    assert!(!engine.mempool().contains(&b.id()));
    assert!(engine.mempool().is_empty());
    assert_eq!(engine.advance()?.transactions.len(), 1);
    Ok(())
}
