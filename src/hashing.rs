//! Content hashing over canonical encodings

use sha2::{Digest, Sha256};

use crate::serialization::{encode_block, encode_transaction};
use crate::types::*;

/// SHA-256 of arbitrary bytes
pub fn sha256(data: &[u8]) -> Hash {
    let digest = Sha256::digest(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&digest);
    hash
}

/// Transaction ID: hash of the full (signed) encoding
pub fn transaction_id(tx: &Transaction) -> Hash {
    sha256(&encode_transaction(tx, false))
}

/// Digest each input signature commits to
pub fn transaction_signing_hash(tx: &Transaction) -> Hash {
    sha256(&encode_transaction(tx, true))
}

/// Block ID: hash of the final encoding, signature section included
pub fn block_id(block: &Block) -> Hash {
    sha256(&encode_block(block, false))
}

/// Digest the proposer signs
pub fn block_signing_hash(block: &Block) -> Hash {
    sha256(&encode_block(block, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transaction(signature: ByteString) -> Transaction {
        Transaction {
            inputs: vec![TransactionInput {
                prevout: OutPoint { hash: [1; 32], index: 0 },
                public_key: vec![2; 33],
                signature,
            }],
            outputs: vec![TransactionOutput::new([3; 32], 10)],
        }
    }

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_transaction_id_deterministic() {
        let tx = sample_transaction(vec![1, 2, 3]);
        assert_eq!(transaction_id(&tx), transaction_id(&tx.clone()));
    }

    #[test]
    fn test_signature_changes_id_but_not_signing_hash() {
        let a = sample_transaction(vec![1, 2, 3]);
        let b = sample_transaction(vec![4, 5, 6]);
        assert_ne!(transaction_id(&a), transaction_id(&b));
        assert_eq!(transaction_signing_hash(&a), transaction_signing_hash(&b));
    }

    #[test]
    fn test_block_signature_changes_id_but_not_signing_hash() {
        let mut block = Block {
            transactions_root: [0; 32],
            global_state_root: [0; 32],
            previous_block_hash: [0; 32],
            transactions: vec![sample_transaction(vec![])],
            signature: vec![],
            signer_public_key: vec![],
        };
        let unsigned_id = block_id(&block);
        let payload = block_signing_hash(&block);
        block.signature = vec![0x30; 70];
        block.signer_public_key = vec![2; 33];
        assert_ne!(block_id(&block), unsigned_id);
        assert_eq!(block_signing_hash(&block), payload);
    }
}
