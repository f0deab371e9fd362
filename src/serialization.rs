//! Canonical byte encoding of outputs, inputs, transactions and blocks
//!
//! Layouts (all integers big-endian):
//! - Output: `version(1) ‖ target_hash(32) ‖ amount(8)` = 41 bytes
//! - Input: `source_hash(32) ‖ index(4) ‖ public_key(33) [‖ signature]`
//! - Transaction: `version(1) ‖ n_in(1) ‖ {len(1) ‖ input}* ‖ n_out(1) ‖ {len(1) ‖ output}*`
//! - Block: `version(1) ‖ tx_root(32) ‖ state_root(32) ‖ prev(32) ‖ n_tx(4) ‖ {len(1) ‖ tx}*`
//!   followed, outside the signing payload, by `sig_len(1) ‖ sig ‖ key_len(1) ‖ key`
//!
//! Signatures carry no length of their own; the surrounding envelope length
//! byte determines where an input ends.

use crate::constants::*;
use crate::error::{ConsensusError, Result};
use crate::types::*;

/// Values that have a canonical byte form
pub trait CanonicalEncoding: Sized {
    fn encode(&self) -> Vec<u8>;
    fn decode(bytes: &[u8]) -> Result<Self>;
}

impl CanonicalEncoding for TransactionOutput {
    fn encode(&self) -> Vec<u8> {
        encode_output(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        decode_output(bytes)
    }
}

impl CanonicalEncoding for TransactionInput {
    fn encode(&self) -> Vec<u8> {
        encode_input(self, true)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        decode_input(bytes)
    }
}

impl CanonicalEncoding for Transaction {
    fn encode(&self) -> Vec<u8> {
        encode_transaction(self, false)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        decode_transaction(bytes)
    }
}

impl CanonicalEncoding for Block {
    fn encode(&self) -> Vec<u8> {
        encode_block(self, false)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        decode_block(bytes)
    }
}

pub fn encode_output(output: &TransactionOutput) -> Vec<u8> {
    let mut data = Vec::with_capacity(OUTPUT_SIZE);
    data.push(ENCODING_VERSION);
    data.extend_from_slice(&output.target_hash);
    data.extend_from_slice(&output.amount.to_be_bytes());
    data
}

/// Encode an input. `signed == false` yields the 69-byte form used in signing payloads.
pub fn encode_input(input: &TransactionInput, signed: bool) -> Vec<u8> {
    let mut data = Vec::with_capacity(UNSIGNED_INPUT_SIZE + input.signature.len());
    data.extend_from_slice(&input.prevout.hash);
    data.extend_from_slice(&input.prevout.index.to_be_bytes());
    data.extend_from_slice(&input.public_key);
    if signed {
        data.extend_from_slice(&input.signature);
    }
    data
}

/// Encode a transaction. `for_signing` replaces every input with its unsigned form.
pub fn encode_transaction(tx: &Transaction, for_signing: bool) -> Vec<u8> {
    let mut data = Vec::new();
    data.push(ENCODING_VERSION);

    debug_assert!(tx.inputs.len() <= MAX_IO_COUNT);
    data.push(tx.inputs.len() as u8);
    for input in &tx.inputs {
        let raw = encode_input(input, !for_signing);
        debug_assert!(raw.len() <= MAX_ENVELOPE_LEN);
        data.push(raw.len() as u8);
        data.extend_from_slice(&raw);
    }

    debug_assert!(tx.outputs.len() <= MAX_IO_COUNT);
    data.push(tx.outputs.len() as u8);
    for output in &tx.outputs {
        data.push(OUTPUT_SIZE as u8);
        data.extend_from_slice(&encode_output(output));
    }

    data
}

/// Encode a block. `for_signing` omits the trailing signature section.
pub fn encode_block(block: &Block, for_signing: bool) -> Vec<u8> {
    let mut data = Vec::new();
    data.push(ENCODING_VERSION);
    data.extend_from_slice(&block.transactions_root);
    data.extend_from_slice(&block.global_state_root);
    data.extend_from_slice(&block.previous_block_hash);
    data.extend_from_slice(&(block.transactions.len() as u32).to_be_bytes());

    for tx in &block.transactions {
        let raw = encode_transaction(tx, false);
        debug_assert!(raw.len() <= MAX_ENVELOPE_LEN);
        data.push(raw.len() as u8);
        data.extend_from_slice(&raw);
    }

    if !for_signing {
        data.push(block.signature.len() as u8);
        data.extend_from_slice(&block.signature);
        data.push(block.signer_public_key.len() as u8);
        data.extend_from_slice(&block.signer_public_key);
    }

    data
}

pub fn decode_output(bytes: &[u8]) -> Result<TransactionOutput> {
    let mut reader = Reader::new(bytes);
    reader.version()?;
    let target_hash = reader.hash()?;
    let amount = i64::from_be_bytes(reader.array::<8>()?);
    reader.finish("output")?;
    Ok(TransactionOutput { target_hash, amount })
}

/// Decode an input whose full extent is `bytes`; anything past the public key
/// is the signature.
pub fn decode_input(bytes: &[u8]) -> Result<TransactionInput> {
    if bytes.len() < UNSIGNED_INPUT_SIZE {
        return Err(ConsensusError::MalformedEncoding(format!(
            "input of {} bytes is shorter than {}",
            bytes.len(),
            UNSIGNED_INPUT_SIZE
        )));
    }
    if bytes.len() - UNSIGNED_INPUT_SIZE > MAX_SIGNATURE_SIZE {
        return Err(ConsensusError::MalformedEncoding(format!(
            "input signature of {} bytes exceeds {}",
            bytes.len() - UNSIGNED_INPUT_SIZE,
            MAX_SIGNATURE_SIZE
        )));
    }

    let mut reader = Reader::new(bytes);
    let hash = reader.hash()?;
    let index = u32::from_be_bytes(reader.array::<4>()?);
    let public_key = reader.take(PUBLIC_KEY_SIZE)?.to_vec();
    let signature = reader.rest().to_vec();

    Ok(TransactionInput {
        prevout: OutPoint { hash, index },
        public_key,
        signature,
    })
}

pub fn decode_transaction(bytes: &[u8]) -> Result<Transaction> {
    let mut reader = Reader::new(bytes);
    reader.version()?;

    let input_count = reader.u8()? as usize;
    let mut inputs = Vec::with_capacity(input_count);
    for _ in 0..input_count {
        let raw = reader.length_prefixed()?;
        inputs.push(decode_input(raw)?);
    }

    let output_count = reader.u8()? as usize;
    let mut outputs = Vec::with_capacity(output_count);
    for _ in 0..output_count {
        let raw = reader.length_prefixed()?;
        outputs.push(decode_output(raw)?);
    }

    reader.finish("transaction")?;
    Ok(Transaction { inputs, outputs })
}

pub fn decode_block(bytes: &[u8]) -> Result<Block> {
    let mut reader = Reader::new(bytes);
    reader.version()?;
    let transactions_root = reader.hash()?;
    let global_state_root = reader.hash()?;
    let previous_block_hash = reader.hash()?;

    let tx_count = u32::from_be_bytes(reader.array::<4>()?) as usize;
    // Each transaction occupies at least one length byte
    if tx_count > reader.remaining() {
        return Err(ConsensusError::MalformedEncoding(format!(
            "block declares {} transactions but only {} bytes remain",
            tx_count,
            reader.remaining()
        )));
    }
    let mut transactions = Vec::with_capacity(tx_count);
    for _ in 0..tx_count {
        let raw = reader.length_prefixed()?;
        transactions.push(decode_transaction(raw)?);
    }

    let signature = reader.length_prefixed()?.to_vec();
    if signature.len() > MAX_SIGNATURE_SIZE {
        return Err(ConsensusError::MalformedEncoding(format!(
            "block signature of {} bytes exceeds {}",
            signature.len(),
            MAX_SIGNATURE_SIZE
        )));
    }
    let signer_public_key = reader.length_prefixed()?.to_vec();
    if !signer_public_key.is_empty() && signer_public_key.len() != PUBLIC_KEY_SIZE {
        return Err(ConsensusError::MalformedEncoding(format!(
            "signer public key must be {} bytes, got {}",
            PUBLIC_KEY_SIZE,
            signer_public_key.len()
        )));
    }

    reader.finish("block")?;
    Ok(Block {
        transactions_root,
        global_state_root,
        previous_block_hash,
        transactions,
        signature,
        signer_public_key,
    })
}

/// Cursor over an encoded buffer that reports truncation as `MalformedEncoding`
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(ConsensusError::MalformedEncoding(format!(
                "truncated: need {} bytes at offset {}, have {}",
                len,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn hash(&mut self) -> Result<Hash> {
        self.array::<32>()
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn version(&mut self) -> Result<()> {
        let version = self.u8()?;
        if version != ENCODING_VERSION {
            return Err(ConsensusError::MalformedEncoding(format!(
                "unsupported version byte {}",
                version
            )));
        }
        Ok(())
    }

    fn length_prefixed(&mut self) -> Result<&'a [u8]> {
        let len = self.u8()? as usize;
        self.take(len)
    }

    fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }

    fn finish(&self, what: &str) -> Result<()> {
        if self.remaining() != 0 {
            return Err(ConsensusError::MalformedEncoding(format!(
                "{} trailing bytes after {}",
                self.remaining(),
                what
            )));
        }
        Ok(())
    }
}
