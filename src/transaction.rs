//! Transaction construction, identity and structural checks

use crate::constants::*;
use crate::crypto::{verify_signature, Signer};
use crate::economic::{checked_sum, total_output_value};
use crate::error::{ConsensusError, Result};
use crate::hashing::{transaction_id, transaction_signing_hash};
use crate::serialization::encode_transaction;
use crate::types::*;

impl Transaction {
    /// Coinbase paying `BLOCK_REWARD` to `target_hash`.
    ///
    /// The input's key slot carries `0x00 ‖ previous_block_hash` so that
    /// coinbases at different chain positions have different IDs.
    pub fn coinbase(target_hash: Hash, previous_block_hash: &Hash) -> Self {
        Transaction {
            inputs: vec![TransactionInput::unsigned(
                OutPoint::new(COINBASE_SOURCE_HASH, 0),
                coinbase_tag(previous_block_hash),
            )],
            outputs: vec![TransactionOutput::new(target_hash, BLOCK_REWARD)],
        }
    }

    pub fn id(&self) -> Hash {
        transaction_id(self)
    }

    pub fn signing_hash(&self) -> Hash {
        transaction_signing_hash(self)
    }

    pub fn is_coinbase(&self) -> bool {
        is_coinbase(self)
    }

    /// Size of the canonical encoding
    pub fn encoded_len(&self) -> usize {
        encode_transaction(self, false).len()
    }

    pub fn total_output_value(&self) -> Result<Amount> {
        total_output_value(self)
    }

    /// Every input carries a valid signature by its own key. Coinbases always pass.
    pub fn verify_signatures(&self) -> bool {
        if self.is_coinbase() {
            return true;
        }
        let digest = self.signing_hash();
        self.inputs.iter().all(|input| {
            !input.signature.is_empty()
                && verify_signature(&input.public_key, &input.signature, &digest)
        })
    }

    /// New transaction with every input owned by `signer` signed
    pub fn signed_by<S: Signer>(&self, signer: &S) -> Result<Transaction> {
        let public_key = signer.public_key();
        let signature = signer.sign(&self.signing_hash())?;
        let inputs = self
            .inputs
            .iter()
            .map(|input| {
                let mut input = input.clone();
                if input.public_key == public_key {
                    input.signature = signature.clone();
                }
                input
            })
            .collect();
        Ok(Transaction {
            inputs,
            outputs: self.outputs.clone(),
        })
    }

    /// Spend every output of `self` owned by `signer`: pay `amount` to
    /// `target_hash` and return the rest to the signer.
    pub fn spend<S: Signer>(&self, signer: &S, target_hash: Hash, amount: Amount) -> Result<Transaction> {
        let owner = signer.public_key_hash();
        let source = self.id();
        let owned: Vec<(u32, Amount)> = self
            .outputs
            .iter()
            .enumerate()
            .filter(|(_, o)| o.target_hash == owner)
            .map(|(i, o)| (i as u32, o.amount))
            .collect();

        if owned.is_empty() {
            return Err(ConsensusError::InsufficientFunds(format!(
                "transaction {} has no outputs owned by {}",
                hex::encode(source),
                hex::encode(owner)
            )));
        }

        let available = checked_sum(owned.iter().map(|(_, value)| *value))?;
        if amount < 0 || amount > available {
            return Err(ConsensusError::InsufficientFunds(format!(
                "cannot pay {} out of {}",
                amount, available
            )));
        }

        let public_key = signer.public_key();
        let inputs = owned
            .iter()
            .map(|(index, _)| TransactionInput::unsigned(OutPoint::new(source, *index), public_key.clone()))
            .collect();

        let mut outputs = vec![TransactionOutput::new(target_hash, amount)];
        let change = available - amount;
        if change > 0 {
            outputs.push(TransactionOutput::new(owner, change));
        }

        Transaction { inputs, outputs }.signed_by(signer)
    }

    /// Spend everything `signer` owns in `self` to `target_hash`
    pub fn spend_all_to<S: Signer>(&self, signer: &S, target_hash: Hash) -> Result<Transaction> {
        let owner = signer.public_key_hash();
        let available = checked_sum(
            self.outputs
                .iter()
                .filter(|o| o.target_hash == owner)
                .map(|o| o.amount),
        )?;
        self.spend(signer, target_hash, available)
    }
}

/// A coinbase has exactly one input, spending the all-zero sentinel at index 0
pub fn is_coinbase(tx: &Transaction) -> bool {
    tx.inputs.len() == 1
        && tx.inputs[0].prevout.hash == COINBASE_SOURCE_HASH
        && tx.inputs[0].prevout.index == 0
}

/// Key-slot tag of the coinbase built on top of `previous_block_hash`
pub fn coinbase_tag(previous_block_hash: &Hash) -> ByteString {
    let mut tag = Vec::with_capacity(PUBLIC_KEY_SIZE);
    tag.push(0x00);
    tag.extend_from_slice(previous_block_hash);
    tag
}

/// CheckTransaction: 𝒯𝒳 → {valid, invalid}
///
/// A transaction tx = (ins, outs) is well formed if and only if:
/// 1. |ins| > 0
/// 2. |ins| ≤ 255 ∧ |outs| ≤ 255
/// 3. ∀i ∈ ins: |i.public_key| = 33 ∧ |i.signature| ≤ M_max_sig
/// 4. |tx| fits a block's single-byte length envelope and `max_tx_size`
pub fn check_transaction(tx: &Transaction, max_tx_size: usize) -> Result<()> {
    // 1. Check inputs are not empty
    if tx.inputs.is_empty() {
        return Err(ConsensusError::InputNotFound(
            "transaction has no inputs".to_string(),
        ));
    }

    // 2. Check count limits
    if tx.inputs.len() > MAX_IO_COUNT || tx.outputs.len() > MAX_IO_COUNT {
        return Err(ConsensusError::TransactionTooLarge(format!(
            "{} inputs / {} outputs exceed {}",
            tx.inputs.len(),
            tx.outputs.len(),
            MAX_IO_COUNT
        )));
    }

    // 3. Check field widths
    for (i, input) in tx.inputs.iter().enumerate() {
        if input.public_key.len() != PUBLIC_KEY_SIZE {
            return Err(ConsensusError::MalformedEncoding(format!(
                "input {} public key is {} bytes",
                i,
                input.public_key.len()
            )));
        }
        if input.signature.len() > MAX_SIGNATURE_SIZE {
            return Err(ConsensusError::MalformedEncoding(format!(
                "input {} signature is {} bytes",
                i,
                input.signature.len()
            )));
        }
    }

    // 4. Check encoded size
    let tx_size = tx.encoded_len();
    let limit = max_tx_size.min(MAX_ENVELOPE_LEN);
    if tx_size > limit {
        return Err(ConsensusError::TransactionTooLarge(format!(
            "{} bytes exceeds {}",
            tx_size, limit
        )));
    }

    Ok(())
}
