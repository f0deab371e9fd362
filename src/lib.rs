//! # UTXO Ledger
//!
//! Single-proposer UTXO ledger: signed transactions spend outputs locked to
//! public-key hashes, a proposer batches pending transactions into signed
//! blocks, and a validator checks each block against confirmed state before
//! it is committed to the stores.
//!
//! ## Architecture
//!
//! - `types`, `constants`, `error`: data model and limits
//! - `serialization`, `hashing`, `merkle`: canonical bytes and the hashes over them
//! - `crypto`: secp256k1 signing behind the `Signer` seam
//! - `storage`: ordered key-value stores for blocks, transactions and UTXOs
//! - `transaction`, `economic`: per-transaction rules and value arithmetic
//! - `mempool`, `proposer`, `block`: admission, block construction and validation
//! - `engine`: the driver tying the above together
//!
//! ## Usage
//!
//! ```rust
//! use utxo_ledger::{ConsensusEngine, KeyPair, Signer};
//!
//! let proposer = KeyPair::from_secret_bytes(&[1; 32]).unwrap();
//! let owner = proposer.public_key_hash();
//! let mut engine = ConsensusEngine::in_memory(proposer).unwrap();
//!
//! let genesis = engine.advance().unwrap();
//! let reward = &genesis.transactions[0];
//! assert_eq!(reward.outputs[0].target_hash, owner);
//!
//! let payer = KeyPair::from_secret_bytes(&[1; 32]).unwrap();
//! let payment = reward.spend(&payer, [9; 32], 4).unwrap();
//! engine.submit_transaction(payment.clone()).unwrap();
//!
//! let block = engine.advance().unwrap();
//! assert_eq!(block.transactions[1], payment);
//! assert!(engine.mempool().is_empty());
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod serialization;
pub mod hashing;
pub mod merkle;
pub mod crypto;
pub mod storage;
pub mod economic;
pub mod transaction;
pub mod proposer;
pub mod block;
pub mod mempool;
pub mod config;
pub mod engine;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use error::{ConsensusError, Result};
pub use block::BlockValidator;
pub use config::LedgerConfig;
pub use crypto::{KeyPair, Signer};
pub use economic::ConservationRule;
pub use engine::ConsensusEngine;
pub use mempool::Mempool;
pub use proposer::BlockProposer;
pub use serialization::CanonicalEncoding;
pub use storage::{LedgerStore, LedgerStores, MemoryStore};
