//! Ledger parameters
//!
//! Defaults match the constants in [`crate::constants`]. A JSON document may
//! override any subset of fields:
//!
//! ```
//! use utxo_ledger::config::LedgerConfig;
//! use utxo_ledger::economic::ConservationRule;
//!
//! let config = LedgerConfig::from_json(r#"{ "conservation_rule": "outputs_cover_inputs" }"#).unwrap();
//! assert_eq!(config.max_block_size, 2 * 1024 * 1024);
//! assert_eq!(config.conservation_rule, ConservationRule::OutputsCoverInputs);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::economic::ConservationRule;
use crate::error::{ConsensusError, Result};

/// Smallest block budget that still holds a coinbase-only block:
/// header (101) + coinbase envelope (1 + 115) + signature section (1 + 72 + 1 + 33)
pub const MIN_BLOCK_SIZE: usize = 1 + 3 * HASH_SIZE + 4
    + 1 + (1 + 1 + 1 + UNSIGNED_INPUT_SIZE + 1 + 1 + OUTPUT_SIZE)
    + 1 + MAX_SIGNATURE_SIZE + 1 + PUBLIC_KEY_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Byte budget for an encoded block
    pub max_block_size: usize,
    /// Byte ceiling for an encoded transaction at admission
    pub max_transaction_size: usize,
    /// Informational only
    pub target_block_time_secs: u64,
    pub conservation_rule: ConservationRule,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_block_size: MAX_BLOCK_SIZE,
            max_transaction_size: MAX_TX_SIZE,
            target_block_time_secs: TARGET_BLOCK_TIME_SECS,
            conservation_rule: ConservationRule::default(),
        }
    }
}

impl LedgerConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json)
            .map_err(|e| ConsensusError::Config(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConsensusError::Config(format!("cannot serialize config: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_block_size < MIN_BLOCK_SIZE {
            return Err(ConsensusError::Config(format!(
                "max_block_size {} is below the {} bytes of a coinbase-only block",
                self.max_block_size, MIN_BLOCK_SIZE
            )));
        }
        if self.max_transaction_size == 0 {
            return Err(ConsensusError::Config(
                "max_transaction_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
