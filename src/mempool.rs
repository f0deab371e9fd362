//! Pending-transaction pool and admission rules

use std::collections::{HashMap, HashSet};

use crate::config::LedgerConfig;
use crate::crypto::hash_public_key;
use crate::economic::{check_non_negative_outputs, checked_sum};
use crate::error::{ConsensusError, Result};
use crate::storage::LedgerStores;
use crate::transaction::check_transaction;
use crate::types::*;

/// Admission-ordered, in-memory pool of unconfirmed transactions
#[derive(Debug, Clone, Default)]
pub struct Mempool {
    transactions: Vec<Transaction>,
    /// Transaction ID → position in `transactions`
    positions: HashMap<Hash, usize>,
    /// Outpoint → ID of the pending transaction consuming it
    spenders: HashMap<OutPoint, Hash>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Pending transactions in admission order
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn contains(&self, id: &Hash) -> bool {
        self.positions.contains_key(id)
    }

    pub fn get(&self, id: &Hash) -> Option<&Transaction> {
        self.positions.get(id).map(|&pos| &self.transactions[pos])
    }

    /// ID of the pending transaction that consumes `outpoint`, if any
    pub fn spender_of(&self, outpoint: &OutPoint) -> Option<&Hash> {
        self.spenders.get(outpoint)
    }

    /// Append at the tail. Callers check admission first.
    pub(crate) fn push(&mut self, tx: Transaction) {
        let id = tx.id();
        for input in &tx.inputs {
            self.spenders.insert(input.prevout, id);
        }
        self.positions.insert(id, self.transactions.len());
        self.transactions.push(tx);
    }

    /// Prune the pool after `block` is applied, keeping the relative order of
    /// what stays.
    ///
    /// Drops the transactions `block` included, every pending transaction that
    /// spends an outpoint `block` consumed, and every pending descendant of
    /// such a conflict. Returns the number of conflicts evicted.
    pub(crate) fn remove_confirmed(&mut self, block: &Block) -> usize {
        let included: HashSet<Hash> = block.transactions.iter().map(Transaction::id).collect();
        let consumed: HashSet<OutPoint> = block
            .transactions
            .iter()
            .filter(|tx| !tx.is_coinbase())
            .flat_map(|tx| tx.inputs.iter().map(|input| input.prevout))
            .collect();

        // Admission order is topological, so parents are seen before children
        let mut evicted: HashSet<Hash> = HashSet::new();
        let mut remaining = Vec::with_capacity(self.transactions.len());
        for tx in std::mem::take(&mut self.transactions) {
            let id = tx.id();
            if included.contains(&id) {
                continue;
            }
            let conflicts = tx.inputs.iter().any(|input| {
                consumed.contains(&input.prevout) || evicted.contains(&input.prevout.hash)
            });
            if conflicts {
                evicted.insert(id);
                continue;
            }
            remaining.push(tx);
        }

        self.positions.clear();
        self.spenders.clear();
        for tx in remaining {
            self.push(tx);
        }
        evicted.len()
    }
}

/// AcceptToMemoryPool: 𝒯𝒳 × 𝒮 × 𝒫 → {accepted, rejected}
///
/// For transaction tx, confirmed stores s and pool p:
/// 1. tx is well formed and within the size limits
/// 2. Every input signature verifies (coinbases pass)
/// 3. tx is neither confirmed nor already pending
/// 4. Each input spends an output of a confirmed or pending transaction,
///    not consumed by another pending transaction, unspent if confirmed,
///    and owned by the input's key
/// 5. No output is negative
/// 6. Input and output sums satisfy the conservation rule
///
/// Pure check: the pool is never modified here.
pub fn accept_to_memory_pool(
    tx: &Transaction,
    stores: &LedgerStores,
    mempool: &Mempool,
    config: &LedgerConfig,
) -> Result<()> {
    // 1. Validate transaction structure
    check_transaction(tx, config.max_transaction_size)?;

    // 2. Verify signatures
    if !tx.verify_signatures() {
        return Err(ConsensusError::InvalidSignature(
            "transaction input signature does not verify".to_string(),
        ));
    }

    // 3. Check if transaction is already known
    let tx_id = tx.id();
    if stores.transactions.contains(&tx_id)? {
        return Err(ConsensusError::AlreadyConfirmed(hex::encode(tx_id)));
    }
    if mempool.contains(&tx_id) {
        return Err(ConsensusError::DuplicateInMempool(hex::encode(tx_id)));
    }

    // 4. Check inputs against confirmed state and the pool
    let mut seen = HashSet::with_capacity(tx.inputs.len());
    let mut input_values = Vec::with_capacity(tx.inputs.len());
    for (i, input) in tx.inputs.iter().enumerate() {
        let prevout = &input.prevout;
        if !seen.insert(*prevout) {
            return Err(ConsensusError::DuplicateInput(format!(
                "input {} repeats {}:{}",
                i,
                hex::encode(prevout.hash),
                prevout.index
            )));
        }

        let (referenced, confirmed) = match stores.transaction(&prevout.hash)? {
            Some(parent) => (parent, true),
            None => match mempool.get(&prevout.hash) {
                Some(parent) => (parent.clone(), false),
                None => {
                    return Err(ConsensusError::InputNotFound(format!(
                        "input {} references unknown transaction {}",
                        i,
                        hex::encode(prevout.hash)
                    )))
                }
            },
        };

        let output = match referenced.outputs.get(prevout.index as usize) {
            Some(output) => output,
            None => {
                return Err(ConsensusError::InputNotFound(format!(
                    "input {} references missing output {}:{}",
                    i,
                    hex::encode(prevout.hash),
                    prevout.index
                )))
            }
        };

        if let Some(spender) = mempool.spender_of(prevout) {
            return Err(ConsensusError::MempoolConflict(format!(
                "input {} already spent by pending {}",
                i,
                hex::encode(spender)
            )));
        }

        if confirmed && stores.utxo(prevout)?.is_none() {
            return Err(ConsensusError::AlreadySpent(format!(
                "input {} spends {}:{}",
                i,
                hex::encode(prevout.hash),
                prevout.index
            )));
        }

        if output.target_hash != hash_public_key(&input.public_key) {
            return Err(ConsensusError::KeyMismatch(format!(
                "input {} key hash {} does not match {}",
                i,
                hex::encode(hash_public_key(&input.public_key)),
                hex::encode(output.target_hash)
            )));
        }

        input_values.push(output.amount);
    }

    // 5. Check output amounts
    check_non_negative_outputs(tx)?;

    // 6. Check value conservation
    let total_in = checked_sum(input_values)?;
    let total_out = tx.total_output_value()?;
    config.conservation_rule.check(total_in, total_out)
}
