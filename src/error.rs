//! Error types for ledger encoding, admission and validation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Input not found: {0}")]
    InputNotFound(String),

    #[error("Output already spent: {0}")]
    AlreadySpent(String),

    #[error("Output already consumed by a pending transaction: {0}")]
    MempoolConflict(String),

    #[error("Transaction already confirmed: {0}")]
    AlreadyConfirmed(String),

    #[error("Transaction already in mempool: {0}")]
    DuplicateInMempool(String),

    #[error("Spender key does not own output: {0}")]
    KeyMismatch(String),

    #[error("Negative output amount: {0}")]
    NegativeAmount(String),

    #[error("Amount spent greater than inputs: {0}")]
    ValueMismatch(String),

    #[error("Outpoint spent twice by one transaction: {0}")]
    DuplicateInput(String),

    #[error("Transaction too large: {0}")]
    TransactionTooLarge(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ConsensusError>;
