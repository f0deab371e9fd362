//! Consensus engine: mempool ownership, chain-tip resolution and block production
//!
//! Single-writer by construction: every mutating operation takes `&mut self`.
//! Sharing an engine across threads needs an outer lock around the whole
//! engine, since tip resolution is a full scan followed by a conditional write.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::block::{connect_block, BlockValidator};
use crate::config::LedgerConfig;
use crate::constants::GENESIS_PREVIOUS_HASH;
use crate::crypto::Signer;
use crate::error::Result;
use crate::mempool::{accept_to_memory_pool, Mempool};
use crate::proposer::BlockProposer;
use crate::storage::LedgerStores;
use crate::types::*;

/// Reserved state root written into every proposed block
const EMPTY_STATE_ROOT: Hash = [0u8; 32];

pub struct ConsensusEngine<S> {
    stores: LedgerStores,
    proposer: BlockProposer<S>,
    validator: BlockValidator,
    mempool: Mempool,
    latest: Option<Block>,
    config: LedgerConfig,
}

impl<S: Signer> ConsensusEngine<S> {
    pub fn new(stores: LedgerStores, signer: S, config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        let mut engine = Self {
            stores,
            proposer: BlockProposer::new(signer),
            validator: BlockValidator::new(config.conservation_rule),
            mempool: Mempool::new(),
            latest: None,
            config,
        };
        engine.ensure_latest()?;
        Ok(engine)
    }

    /// Engine over fresh in-memory stores with default parameters
    pub fn in_memory(signer: S) -> Result<Self> {
        Self::new(LedgerStores::in_memory(), signer, LedgerConfig::default())
    }

    pub fn stores(&self) -> &LedgerStores {
        &self.stores
    }

    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn validator(&self) -> &BlockValidator {
        &self.validator
    }

    pub fn latest_block(&self) -> Option<&Block> {
        self.latest.as_ref()
    }

    pub fn latest_block_hash(&self) -> Option<Hash> {
        self.latest.as_ref().map(Block::id)
    }

    pub fn set_max_block_size(&mut self, max_block_size: usize) -> Result<()> {
        let config = LedgerConfig {
            max_block_size,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Re-resolve the chain tip: the one stored block no other block names
    /// as its predecessor.
    ///
    /// Full scan, O(blocks). Assumes one linear chain; with competing
    /// branches the choice among unreferenced blocks is unspecified.
    pub fn ensure_latest(&mut self) -> Result<Option<&Block>> {
        let blocks = self.stores.blocks.iter_prefix(&[])?;
        let referenced: HashSet<Hash> = blocks.iter().map(|b| b.previous_block_hash).collect();

        let mut tips = blocks.into_iter().filter(|b| !referenced.contains(&b.id()));
        let tip = tips.next();
        let extra = tips.count();
        if extra > 0 {
            warn!(candidates = extra + 1, "multiple unreferenced blocks; chain has forked");
        }

        self.latest = tip;
        Ok(self.latest.as_ref())
    }

    /// Validate `tx` against confirmed state and the pool, then queue it.
    /// The pool is untouched on failure.
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<Hash> {
        let tx_id = tx.id();
        if let Err(e) = accept_to_memory_pool(&tx, &self.stores, &self.mempool, &self.config) {
            warn!(tx = %hex::encode(tx_id), error = %e, "transaction rejected");
            return Err(e);
        }

        self.mempool.push(tx);
        debug!(tx = %hex::encode(tx_id), pending = self.mempool.len(), "transaction admitted");
        Ok(tx_id)
    }

    /// Produce, validate and commit the next block. Returns the accepted block.
    pub fn advance(&mut self) -> Result<Block> {
        self.ensure_latest()?;

        let block = match self.latest_block_hash() {
            None => self
                .proposer
                .propose(GENESIS_PREVIOUS_HASH, EMPTY_STATE_ROOT, &[])?,
            Some(tip) => self.propose_within_budget(tip)?,
        };

        debug!(
            previous = %hex::encode(block.previous_block_hash),
            txs = block.transactions.len(),
            size = block.encoded_len(),
            "block proposed"
        );

        self.accept_block(block.clone())?;
        Ok(block)
    }

    /// Propose from the whole pool, dropping transactions from the tail
    /// until the encoded block fits `max_block_size`.
    fn propose_within_budget(&self, previous_block_hash: Hash) -> Result<Block> {
        let candidates = self.mempool.transactions();
        let budget = self.config.max_block_size;

        // Coinbase-only block without signature bytes: a lower bound on the
        // signed size, so trimming against it never drops a transaction the
        // exact check below would keep.
        let coinbase = Transaction::coinbase(self.proposer.signer().public_key_hash(), &previous_block_hash);
        let mut lower_bound =
            Block::build_unsigned(previous_block_hash, EMPTY_STATE_ROOT, vec![coinbase]).encoded_len();
        let tx_sizes: Vec<usize> = candidates.iter().map(|tx| 1 + tx.encoded_len()).collect();
        lower_bound += tx_sizes.iter().sum::<usize>();

        let mut count = candidates.len();
        while count > 0 && lower_bound > budget {
            count -= 1;
            lower_bound -= tx_sizes[count];
        }

        loop {
            let block = self
                .proposer
                .propose(previous_block_hash, EMPTY_STATE_ROOT, &candidates[..count])?;
            let size = block.encoded_len();
            if size <= budget || count == 0 {
                if count < candidates.len() {
                    debug!(
                        included = count,
                        deferred = candidates.len() - count,
                        size,
                        budget,
                        "trimmed block to size budget"
                    );
                }
                return Ok(block);
            }
            count -= 1;
        }
    }

    /// Commit a block to the stores, make it the tip and prune the mempool of
    /// everything the block confirmed or invalidated.
    ///
    /// # Panics
    ///
    /// If the block fails validation or does not become the chain tip. Both
    /// indicate a logic fault in block production, not a recoverable condition.
    pub fn accept_block(&mut self, block: Block) -> Result<()> {
        let block_id = block.id();
        if self.stores.blocks.contains(&block_id)? {
            debug!(block = %hex::encode(block_id), "block already stored");
            return Ok(());
        }

        let valid = self.validator.is_valid(&block, &self.stores)?;
        assert!(
            valid,
            "invariant violation: block {} failed validation",
            hex::encode(block_id)
        );

        connect_block(&block, &mut self.stores)?;
        let evicted = self.mempool.remove_confirmed(&block);
        if evicted > 0 {
            warn!(
                block = %hex::encode(block_id),
                evicted,
                "evicted pending transactions conflicting with block"
            );
        }

        let tip = self.ensure_latest()?.map(Block::id);
        assert_eq!(
            tip,
            Some(block_id),
            "invariant violation: accepted block {} is not the chain tip",
            hex::encode(block_id)
        );

        info!(
            block = %hex::encode(block_id),
            previous = %hex::encode(block.previous_block_hash),
            txs = block.transactions.len(),
            "block accepted"
        );
        Ok(())
    }
}
