//! Core ledger types

use serde::{Deserialize, Serialize};

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Value type. Signed so that negative amounts are representable and rejected
/// by validation instead of wrapping.
pub type Amount = i64;

/// OutPoint: 𝒪 = ℍ × ℕ
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

impl OutPoint {
    pub fn new(hash: Hash, index: u32) -> Self {
        Self { hash, index }
    }

    /// UTXO store key: transaction hash followed by the big-endian output index
    pub fn key(&self) -> [u8; 36] {
        let mut key = [0u8; 36];
        key[..32].copy_from_slice(&self.hash);
        key[32..].copy_from_slice(&self.index.to_be_bytes());
        key
    }
}

/// Transaction Output: 𝒯 = ℍ × ℤ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    /// Hash of the public key allowed to spend this output
    pub target_hash: Hash,
    pub amount: Amount,
}

impl TransactionOutput {
    pub fn new(target_hash: Hash, amount: Amount) -> Self {
        Self { target_hash, amount }
    }
}

/// Transaction Input: ℐ = 𝒪 × 𝕂 × 𝕊
///
/// `public_key` is a 33-byte compressed key; `signature` is empty while the
/// owning transaction is unsigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub public_key: ByteString,
    pub signature: ByteString,
}

impl TransactionInput {
    pub fn unsigned(prevout: OutPoint, public_key: ByteString) -> Self {
        Self {
            prevout,
            public_key,
            signature: Vec::new(),
        }
    }
}

/// Transaction: 𝒯𝒳 = ℐ* × 𝒯*
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
}

/// Block: ℬ = ℍ × ℍ × ℍ × 𝒯𝒳* × 𝕊 × 𝕂
///
/// A block is unsigned while `signature` and `signer_public_key` are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub transactions_root: Hash,
    /// Reserved, currently unconstrained
    pub global_state_root: Hash,
    pub previous_block_hash: Hash,
    pub transactions: Vec<Transaction>,
    pub signature: ByteString,
    pub signer_public_key: ByteString,
}

impl Block {
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty() && !self.signer_public_key.is_empty()
    }
}

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}
