//! Block validation and application against confirmed ledger state

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::constants::BLOCK_REWARD;
use crate::crypto::{hash_public_key, verify_signature};
use crate::economic::{check_non_negative_outputs, checked_sum, ConservationRule};
use crate::error::Result;
use crate::merkle::compute_root;
use crate::storage::LedgerStores;
use crate::types::*;

impl Block {
    /// Signer key and signature present, and the signature covers the signing payload
    pub fn is_signature_valid(&self) -> bool {
        self.is_signed()
            && verify_signature(&self.signer_public_key, &self.signature, &self.signing_hash())
    }
}

/// Stateless block checker; all ledger state comes from the stores it is handed
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockValidator {
    rule: ConservationRule,
}

impl BlockValidator {
    pub fn new(rule: ConservationRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> ConservationRule {
        self.rule
    }

    /// Blocks already in storage are taken as valid
    pub fn is_valid(&self, block: &Block, stores: &LedgerStores) -> Result<bool> {
        Ok(self.validate_block(block, stores, false)? == ValidationResult::Valid)
    }

    /// CheckBlock: ℬ × 𝒮 → {valid, invalid}
    ///
    /// For block b = (root, state, prev, txs, sig, key) against stores s:
    /// 1. If b is stored and not forced: valid. A forced check of a stored
    ///    block re-runs 2-5 against the state b itself produced: its own
    ///    transactions are not replays and the outputs it consumed need not
    ///    be in the UTXO set.
    /// 2. sig must verify under key over the signing payload
    /// 3. txs[0] is the only coinbase, and root = MerkleRoot(ids(txs))
    /// 4. Coinbase: one input and Σ outputs = reward
    /// 5. Other txs: signed inputs, each spending an output that is unspent in
    ///    s or created earlier in b, owned by the input key, spent at most once;
    ///    outputs non-negative; values satisfy the conservation rule
    pub fn validate_block(
        &self,
        block: &Block,
        stores: &LedgerStores,
        force: bool,
    ) -> Result<ValidationResult> {
        // 1. Stored blocks were checked when accepted
        let applied = stores.blocks.contains(&block.id())?;
        if applied && !force {
            return Ok(ValidationResult::Valid);
        }

        // 2. Check proposer signature
        if !block.is_signature_valid() {
            return Ok(invalid("Invalid block signature".to_string()));
        }

        // 3. Check coinbase position and transactions root
        match block.transactions.first() {
            Some(first) if first.is_coinbase() => {}
            Some(_) => return Ok(invalid("First transaction must be coinbase".to_string())),
            None => return Ok(invalid("Block must have at least one transaction".to_string())),
        }

        let ids: Vec<Hash> = block.transactions.iter().map(Transaction::id).collect();
        if compute_root(&ids) != block.transactions_root {
            return Ok(invalid("Transactions root mismatch".to_string()));
        }

        // Outputs created and outpoints consumed by earlier transactions in this block
        let mut created: HashMap<Hash, &Transaction> = HashMap::new();
        let mut spent: HashSet<OutPoint> = HashSet::new();

        for (i, (tx, id)) in block.transactions.iter().zip(ids.iter()).enumerate() {
            if created.contains_key(id) || (!applied && stores.transactions.contains(id)?) {
                return Ok(invalid(format!(
                    "Transaction {} at index {} is already confirmed",
                    hex::encode(id),
                    i
                )));
            }

            let result = if i == 0 {
                check_coinbase(tx)
            } else {
                self.check_spend(tx, i, stores, applied, &created, &mut spent)?
            };
            if result != ValidationResult::Valid {
                return Ok(result);
            }

            created.insert(*id, tx);
        }

        Ok(ValidationResult::Valid)
    }

    fn check_spend(
        &self,
        tx: &Transaction,
        i: usize,
        stores: &LedgerStores,
        applied: bool,
        created: &HashMap<Hash, &Transaction>,
        spent: &mut HashSet<OutPoint>,
    ) -> Result<ValidationResult> {
        if tx.is_coinbase() {
            return Ok(invalid(format!("Extra coinbase at index {}", i)));
        }

        if !tx.verify_signatures() {
            return Ok(invalid(format!("Invalid input signature in transaction {}", i)));
        }

        let mut input_values = Vec::with_capacity(tx.inputs.len());
        for (j, input) in tx.inputs.iter().enumerate() {
            let prevout = input.prevout;
            if !spent.insert(prevout) {
                return Ok(invalid(format!(
                    "Transaction {} input {} spends an outpoint already spent in this block",
                    i, j
                )));
            }

            let referenced = match created.get(&prevout.hash) {
                Some(parent) => parent.outputs.get(prevout.index as usize).cloned(),
                None => {
                    let parent = match stores.transaction(&prevout.hash)? {
                        Some(parent) => parent,
                        None => {
                            return Ok(invalid(format!(
                                "Transaction {} input {} references unknown transaction",
                                i, j
                            )))
                        }
                    };
                    if prevout.index as usize >= parent.outputs.len() {
                        None
                    } else if applied {
                        parent.outputs.get(prevout.index as usize).cloned()
                    } else {
                        match stores.utxo(&prevout)? {
                            Some(output) => Some(output),
                            None => {
                                return Ok(invalid(format!(
                                    "Transaction {} input {} spends a spent output",
                                    i, j
                                )))
                            }
                        }
                    }
                }
            };

            let output = match referenced {
                Some(output) => output,
                None => {
                    return Ok(invalid(format!(
                        "Transaction {} input {} output index {} out of range",
                        i, j, prevout.index
                    )))
                }
            };

            if output.target_hash != hash_public_key(&input.public_key) {
                return Ok(invalid(format!(
                    "Transaction {} input {} key does not own the output",
                    i, j
                )));
            }

            input_values.push(output.amount);
        }

        if let Err(e) = check_non_negative_outputs(tx) {
            return Ok(invalid(format!("Transaction {}: {}", i, e)));
        }

        let conserved = checked_sum(input_values).and_then(|total_in| {
            let total_out = tx.total_output_value()?;
            self.rule.check(total_in, total_out)
        });
        if let Err(e) = conserved {
            return Ok(invalid(format!("Transaction {}: {}", i, e)));
        }

        Ok(ValidationResult::Valid)
    }
}

/// Coinbase: exactly one input and Σ outputs = reward, none negative
fn check_coinbase(tx: &Transaction) -> ValidationResult {
    if tx.inputs.len() != 1 || check_non_negative_outputs(tx).is_err() {
        return invalid("Malformed coinbase".to_string());
    }
    match tx.total_output_value() {
        Ok(total) if total == BLOCK_REWARD => ValidationResult::Valid,
        Ok(total) => invalid(format!("Coinbase pays {} instead of {}", total, BLOCK_REWARD)),
        Err(e) => invalid(format!("Coinbase: {}", e)),
    }
}

fn invalid(reason: String) -> ValidationResult {
    debug!(%reason, "block rejected");
    ValidationResult::Invalid(reason)
}

/// ApplyBlock: ℬ × 𝒮 → 𝒮
///
/// Persist the block and its transactions; remove every consumed outpoint
/// from the UTXO set and add every created output, transaction by transaction.
pub fn connect_block(block: &Block, stores: &mut LedgerStores) -> Result<()> {
    stores.blocks.put(&block.id(), block)?;

    for tx in &block.transactions {
        let tx_id = tx.id();
        stores.transactions.put(&tx_id, tx)?;

        // Remove spent inputs (except for coinbase)
        if !tx.is_coinbase() {
            for input in &tx.inputs {
                stores.utxos.remove(&input.prevout.key())?;
            }
        }

        // Add new outputs
        for (i, output) in tx.outputs.iter().enumerate() {
            stores.utxos.put(&OutPoint::new(tx_id, i as u32).key(), output)?;
        }
    }

    Ok(())
}
