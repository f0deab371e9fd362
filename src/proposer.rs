//! Block construction and signing

use crate::crypto::Signer;
use crate::error::Result;
use crate::hashing::{block_id, block_signing_hash};
use crate::merkle::compute_root;
use crate::serialization::encode_block;
use crate::types::*;

impl Block {
    /// Unsigned block committing to `transactions` in order
    pub fn build_unsigned(
        previous_block_hash: Hash,
        global_state_root: Hash,
        transactions: Vec<Transaction>,
    ) -> Self {
        let ids: Vec<Hash> = transactions.iter().map(Transaction::id).collect();
        Block {
            transactions_root: compute_root(&ids),
            global_state_root,
            previous_block_hash,
            transactions,
            signature: Vec::new(),
            signer_public_key: Vec::new(),
        }
    }

    /// Copy of this block signed by `signer` over its signing payload
    pub fn signed<S: Signer>(&self, signer: &S) -> Result<Block> {
        let signature = signer.sign(&self.signing_hash())?;
        Ok(Block {
            signature,
            signer_public_key: signer.public_key(),
            ..self.clone()
        })
    }

    pub fn id(&self) -> Hash {
        block_id(self)
    }

    pub fn signing_hash(&self) -> Hash {
        block_signing_hash(self)
    }

    /// Size of the final encoding
    pub fn encoded_len(&self) -> usize {
        encode_block(self, false).len()
    }
}

/// CreateBlock: ℍ × ℍ × 𝒯𝒳* → ℬ
///
/// Stateless apart from the proposer's key. Performs no validation.
#[derive(Debug)]
pub struct BlockProposer<S> {
    signer: S,
}

impl<S: Signer> BlockProposer<S> {
    pub fn new(signer: S) -> Self {
        Self { signer }
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    /// 1. Pay the reward to the proposer's key hash in a coinbase
    /// 2. Put the coinbase at index 0, followed by `transactions` in order
    /// 3. Commit to the list and sign the block
    pub fn propose(
        &self,
        previous_block_hash: Hash,
        global_state_root: Hash,
        transactions: &[Transaction],
    ) -> Result<Block> {
        let coinbase = Transaction::coinbase(self.signer.public_key_hash(), &previous_block_hash);

        let mut block_txs = Vec::with_capacity(transactions.len() + 1);
        block_txs.push(coinbase);
        block_txs.extend_from_slice(transactions);

        Block::build_unsigned(previous_block_hash, global_state_root, block_txs).signed(&self.signer)
    }
}
