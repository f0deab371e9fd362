//! Transactions root: a binary Merkle tree over `(index, transaction id)` leaves
//!
//! Leaves bind each transaction ID to its position, so reordering the list
//! changes the root. Leaf, node and empty-list digests use distinct one-byte
//! domain tags. An odd node at the end of a level is promoted unchanged.

use bitcoin_hashes::{sha256, Hash as BitcoinHash, HashEngine};

use crate::types::Hash;

const LEAF_TAG: u8 = 0x00;
const NODE_TAG: u8 = 0x01;
const EMPTY_TAG: u8 = 0x02;

/// Root over the ordered transaction IDs
pub fn compute_root(transaction_ids: &[Hash]) -> Hash {
    if transaction_ids.is_empty() {
        return tagged_hash(EMPTY_TAG, &[]);
    }

    let mut level: Vec<Hash> = transaction_ids
        .iter()
        .enumerate()
        .map(|(index, id)| leaf_hash(index as u32, id))
        .collect();

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => tagged_hash(NODE_TAG, &[&left[..], &right[..]]),
                [single] => *single,
                _ => unreachable!("chunks(2) yields one or two elements"),
            })
            .collect();
    }

    level[0]
}

fn leaf_hash(index: u32, id: &Hash) -> Hash {
    tagged_hash(LEAF_TAG, &[&index.to_be_bytes()[..], &id[..]])
}

fn tagged_hash(tag: u8, parts: &[&[u8]]) -> Hash {
    let mut engine = sha256::Hash::engine();
    engine.input(&[tag]);
    for part in parts {
        engine.input(part);
    }
    sha256::Hash::from_engine(engine).into_inner()
}
