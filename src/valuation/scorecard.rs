//! Scorecard method: qualitative factor scores applied to a DCF equity value

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::dcf::DcfResult;
use crate::drivers::ScorecardInputs;
use crate::error::{invalid, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardFactor {
    pub name: String,
    pub weight: f64,
    /// Weight divided by the total of all weights
    pub normalized_weight: f64,
    pub score: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardResult {
    pub factors: Vec<ScorecardFactor>,
    /// Sum of normalised weight times score
    pub total_score: f64,
    /// Equity value of the first DCF terminal method
    pub base_equity_value: f64,
    pub valuation: f64,
}

/// Scale weights so they sum to one
pub fn normalize_weights(weights: &BTreeMap<String, f64>) -> Result<BTreeMap<String, f64>> {
    let total: f64 = weights.values().sum();
    if !total.is_finite() || total <= 0.0 {
        return invalid("valuation.scorecard.weights", "scorecard weights must sum to more than zero");
    }
    Ok(weights.iter().map(|(name, w)| (name.clone(), w / total)).collect())
}

pub fn value(inputs: &ScorecardInputs, dcf: &DcfResult) -> Result<ScorecardResult> {
    let base_equity_value = match dcf.terminals.first() {
        Some(terminal) => terminal.equity_value,
        None => return invalid("valuation.scorecard", "the DCF has no terminal value to adjust"),
    };

    let normalized = normalize_weights(&inputs.weights)?;
    let factors: Vec<ScorecardFactor> = inputs
        .weights
        .iter()
        .zip(normalized.into_values())
        .map(|((name, &weight), normalized_weight)| {
            let score = inputs.score_for(name);
            ScorecardFactor {
                name: name.clone(),
                weight,
                normalized_weight,
                score,
                contribution: normalized_weight * score,
            }
        })
        .collect();

    let total_score: f64 = factors.iter().map(|f| f.contribution).sum();

    Ok(ScorecardResult {
        factors,
        total_score,
        base_equity_value,
        valuation: base_equity_value * total_score,
    })
}
