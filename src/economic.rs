//! Value accounting: checked sums and the conservation check

use serde::{Deserialize, Serialize};

use crate::error::{ConsensusError, Result};
use crate::types::*;

/// Relation required between a transaction's input and output value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConservationRule {
    /// Σ outputs ≤ Σ inputs; the difference is burned
    #[default]
    InputsCoverOutputs,
    /// Σ inputs ≤ Σ outputs
    OutputsCoverInputs,
}

impl ConservationRule {
    /// CheckConservation: ℤ × ℤ → {ok, ValueMismatch}
    pub fn check(self, total_in: Amount, total_out: Amount) -> Result<()> {
        let violated = match self {
            ConservationRule::InputsCoverOutputs => total_out > total_in,
            ConservationRule::OutputsCoverInputs => total_in > total_out,
        };
        if violated {
            return Err(ConsensusError::ValueMismatch(format!(
                "inputs {} / outputs {} violate {:?}",
                total_in, total_out, self
            )));
        }
        Ok(())
    }
}

/// Σ amounts, failing with `ValueMismatch` on overflow
pub fn checked_sum<I>(amounts: I) -> Result<Amount>
where
    I: IntoIterator<Item = Amount>,
{
    amounts.into_iter().try_fold(0i64, |acc, amount| {
        acc.checked_add(amount)
            .ok_or_else(|| ConsensusError::ValueMismatch("value sum overflows".to_string()))
    })
}

/// Σ o.amount over a transaction's outputs
pub fn total_output_value(tx: &Transaction) -> Result<Amount> {
    checked_sum(tx.outputs.iter().map(|o| o.amount))
}

/// First negative output, reported as `NegativeAmount`
pub fn check_non_negative_outputs(tx: &Transaction) -> Result<()> {
    for (i, output) in tx.outputs.iter().enumerate() {
        if output.amount < 0 {
            return Err(ConsensusError::NegativeAmount(format!(
                "output {} has amount {}",
                i, output.amount
            )));
        }
    }
    Ok(())
}
