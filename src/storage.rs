//! Ordered key-value storage contract and an in-memory implementation
//!
//! Keys compare as unsigned byte strings. `put` is first-write-wins: writing
//! an existing key leaves the stored value alone and returns `false`.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use crate::error::Result;
use crate::serialization::CanonicalEncoding;
use crate::types::*;

/// Ordered store of `V` values under byte keys
pub trait LedgerStore<V> {
    fn get(&self, key: &[u8]) -> Result<Option<V>>;

    /// Insert `value` under `key` unless the key is present. Returns whether it was inserted.
    fn put(&mut self, key: &[u8], value: &V) -> Result<bool>;

    /// Delete `key`. Returns whether a value was present.
    fn remove(&mut self, key: &[u8]) -> Result<bool>;

    /// Values whose keys start with `prefix`, in ascending key order
    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<V>>;

    fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// In-memory store holding canonical encodings in a `BTreeMap`
#[derive(Debug, Clone)]
pub struct MemoryStore<V> {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    _value: PhantomData<V>,
}

impl<V> MemoryStore<V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            _value: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: CanonicalEncoding> LedgerStore<V> for MemoryStore<V> {
    fn get(&self, key: &[u8]) -> Result<Option<V>> {
        self.entries.get(key).map(|raw| V::decode(raw)).transpose()
    }

    fn put(&mut self, key: &[u8], value: &V) -> Result<bool> {
        if self.entries.contains_key(key) {
            return Ok(false);
        }
        self.entries.insert(key.to_vec(), value.encode());
        Ok(true)
    }

    fn remove(&mut self, key: &[u8]) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<V>> {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, raw)| V::decode(raw))
            .collect()
    }

    fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.entries.contains_key(key))
    }
}

/// The three logical stores the ledger runs on
pub struct LedgerStores {
    /// Block by block hash
    pub blocks: Box<dyn LedgerStore<Block>>,
    /// Transaction by transaction hash
    pub transactions: Box<dyn LedgerStore<Transaction>>,
    /// Unspent output by `transaction hash ‖ big-endian index`
    pub utxos: Box<dyn LedgerStore<TransactionOutput>>,
}

impl LedgerStores {
    pub fn new(
        blocks: Box<dyn LedgerStore<Block>>,
        transactions: Box<dyn LedgerStore<Transaction>>,
        utxos: Box<dyn LedgerStore<TransactionOutput>>,
    ) -> Self {
        Self {
            blocks,
            transactions,
            utxos,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Box::new(MemoryStore::new()),
            Box::new(MemoryStore::new()),
            Box::new(MemoryStore::new()),
        )
    }

    pub fn block(&self, hash: &Hash) -> Result<Option<Block>> {
        self.blocks.get(hash)
    }

    pub fn transaction(&self, hash: &Hash) -> Result<Option<Transaction>> {
        self.transactions.get(hash)
    }

    pub fn utxo(&self, outpoint: &OutPoint) -> Result<Option<TransactionOutput>> {
        self.utxos.get(&outpoint.key())
    }

    /// Every unspent output created by `tx_hash`, in index order
    pub fn utxos_of(&self, tx_hash: &Hash) -> Result<Vec<TransactionOutput>> {
        self.utxos.iter_prefix(tx_hash)
    }
}

impl Default for LedgerStores {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(amount: Amount) -> TransactionOutput {
        TransactionOutput::new([amount as u8; 32], amount)
    }

    #[test]
    fn test_put_is_first_write_wins() {
        let mut store: MemoryStore<TransactionOutput> = MemoryStore::new();
        assert!(store.put(b"key", &output(1)).unwrap());
        assert!(!store.put(b"key", &output(2)).unwrap());
        assert_eq!(store.get(b"key").unwrap(), Some(output(1)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let store: MemoryStore<TransactionOutput> = MemoryStore::new();
        assert_eq!(store.get(b"missing").unwrap(), None);
        assert!(!store.contains(b"missing").unwrap());
    }

    #[test]
    fn test_remove() {
        let mut store: MemoryStore<TransactionOutput> = MemoryStore::new();
        store.put(b"key", &output(1)).unwrap();
        assert!(store.remove(b"key").unwrap());
        assert!(!store.remove(b"key").unwrap());
        assert!(store.is_empty());
        // key may be written again once removed
        assert!(store.put(b"key", &output(3)).unwrap());
    }

    #[test]
    fn test_iter_prefix() {
        let mut store: MemoryStore<TransactionOutput> = MemoryStore::new();
        store.put(&[0xca, 0xfe, 0xca, 0xfa, 0xaa], &output(11)).unwrap();
        store.put(&[0xca, 0xfe, 0xca, 0xfe, 0xaa], &output(12)).unwrap();
        store.put(&[0xca, 0xfe, 0xca, 0xfe, 0xbb], &output(13)).unwrap();
        store.put(&[0xca, 0xfe, 0xcf, 0xfe, 0xaa], &output(14)).unwrap();
        store.put(&[0xdd, 0xdd, 0xdd, 0xdd, 0xdd], &output(15)).unwrap();

        let values = store.iter_prefix(&[0xca, 0xfe, 0xca, 0xfe]).unwrap();
        assert_eq!(values, vec![output(12), output(13)]);
    }

    #[test]
    fn test_iter_prefix_unsigned_order() {
        let mut store: MemoryStore<TransactionOutput> = MemoryStore::new();
        store.put(&[0x01, 0xff], &output(2)).unwrap();
        store.put(&[0x01, 0x00], &output(1)).unwrap();
        store.put(&[0x01, 0x7f], &output(3)).unwrap();

        let amounts: Vec<Amount> = store
            .iter_prefix(&[0x01])
            .unwrap()
            .into_iter()
            .map(|o| o.amount)
            .collect();
        assert_eq!(amounts, vec![1, 3, 2]);
    }

    #[test]
    fn test_empty_prefix_returns_everything() {
        let mut store: MemoryStore<TransactionOutput> = MemoryStore::new();
        store.put(&[2], &output(2)).unwrap();
        store.put(&[1], &output(1)).unwrap();
        assert_eq!(store.iter_prefix(&[]).unwrap().len(), 2);
    }

    #[test]
    fn test_utxos_of_uses_outpoint_prefix() {
        let mut stores = LedgerStores::in_memory();
        let tx_hash = [9u8; 32];
        stores.utxos.put(&OutPoint::new(tx_hash, 1).key(), &output(2)).unwrap();
        stores.utxos.put(&OutPoint::new(tx_hash, 0).key(), &output(1)).unwrap();
        stores.utxos.put(&OutPoint::new([8u8; 32], 0).key(), &output(3)).unwrap();

        assert_eq!(stores.utxos_of(&tx_hash).unwrap(), vec![output(1), output(2)]);
        assert_eq!(stores.utxo(&OutPoint::new(tx_hash, 1)).unwrap(), Some(output(2)));
    }
}
