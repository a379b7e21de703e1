//! Valuation settings: the methods to evaluate on a finished projection

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::common::{check_fraction, check_non_negative, check_positive};
use crate::error::{invalid, Result};

/// Projected figure a multiple or exit value is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    NetRevenue,
    GrossProfit,
    Ebitda,
    NetIncome,
    Arr,
    Fcff,
}

/// Which slice of the series a metric is measured over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricWindow {
    /// Sum of the last twelve months, annualised when fewer exist
    #[default]
    TrailingTwelveMonths,
    /// Last month times twelve
    RunRate,
}

/// Cash flow discounted by the DCF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowBasis {
    /// Free cash flow to firm, discounted at WACC
    #[default]
    Fcff,
    /// Free cash flow to equity, discounted at cost of equity
    Fcfe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum TerminalValueMethod {
    PerpetuityGrowth {
        growth_rate: f64,
    },
    ExitMultiple {
        metric: Metric,
        #[serde(default)]
        window: MetricWindow,
        multiple: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfInputs {
    /// Annual discount rate (WACC for FCFF, cost of equity for FCFE)
    pub discount_rate: f64,
    #[serde(default)]
    pub basis: CashFlowBasis,
    pub terminal_methods: Vec<TerminalValueMethod>,
}

impl DcfInputs {
    pub(crate) fn validate(&self, path: &str) -> Result<()> {
        if !self.discount_rate.is_finite() || self.discount_rate <= -1.0 {
            return invalid(format!("{}.discount_rate", path), "must exceed -1");
        }
        for (i, method) in self.terminal_methods.iter().enumerate() {
            let method_path = format!("{}.terminal_methods[{}]", path, i);
            match method {
                TerminalValueMethod::PerpetuityGrowth { growth_rate } => {
                    if !growth_rate.is_finite() {
                        return invalid(format!("{}.growth_rate", method_path), "must be finite");
                    }
                    if self.discount_rate <= *growth_rate {
                        return invalid(
                            format!("{}.growth_rate", method_path),
                            format!(
                                "perpetuity growth requires discount rate ({}) above growth rate ({})",
                                self.discount_rate, growth_rate
                            ),
                        );
                    }
                }
                TerminalValueMethod::ExitMultiple { multiple, .. } => {
                    check_non_negative(&format!("{}.multiple", method_path), *multiple)?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleSpec {
    pub metric: Metric,
    #[serde(default)]
    pub window: MetricWindow,
    pub multiple: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplesInputs {
    pub applications: Vec<MultipleSpec>,
}

impl MultiplesInputs {
    pub(crate) fn validate(&self, path: &str) -> Result<()> {
        for (i, application) in self.applications.iter().enumerate() {
            check_non_negative(&format!("{}.applications[{}].multiple", path, i), application.multiple)?;
        }
        Ok(())
    }
}

/// How the VC method arrives at the exit valuation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitValue {
    Explicit {
        value: f64,
    },
    Multiple {
        metric: Metric,
        #[serde(default)]
        window: MetricWindow,
        multiple: f64,
    },
}

/// Return the investor requires by exit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequiredReturn {
    /// Cash-on-cash multiple (e.g. 10x)
    Multiple { multiple: f64 },
    /// Annual target rate compounded over the years to exit
    AnnualRate { rate: f64 },
}

fn default_rounds() -> u32 {
    1
}

fn default_probability() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcInputs {
    pub exit: ExitValue,
    pub years_to_exit: f64,
    pub required_return: RequiredReturn,
    /// Amount invested now; defaults to the equity raised in the projection
    #[serde(default)]
    pub investment: Option<f64>,
    /// Financing rounds until exit, including the current one
    #[serde(default = "default_rounds")]
    pub financing_rounds: u32,
    /// Dilution suffered at each later round
    #[serde(default)]
    pub dilution_per_round: f64,
    #[serde(default = "default_probability")]
    pub probability_of_success: f64,
}

impl VcInputs {
    pub(crate) fn validate(&self, path: &str) -> Result<()> {
        match &self.exit {
            ExitValue::Explicit { value } => check_positive(&format!("{}.exit.value", path), *value)?,
            ExitValue::Multiple { multiple, .. } => {
                check_positive(&format!("{}.exit.multiple", path), *multiple)?
            }
        }
        check_non_negative(&format!("{}.years_to_exit", path), self.years_to_exit)?;
        match &self.required_return {
            RequiredReturn::Multiple { multiple } => {
                check_positive(&format!("{}.required_return.multiple", path), *multiple)?
            }
            RequiredReturn::AnnualRate { rate } => {
                if !rate.is_finite() || *rate <= -1.0 {
                    return invalid(format!("{}.required_return.rate", path), "must exceed -1");
                }
            }
        }
        if let Some(investment) = self.investment {
            check_positive(&format!("{}.investment", path), investment)?;
        }
        if self.financing_rounds == 0 {
            return invalid(format!("{}.financing_rounds", path), "at least one round is required");
        }
        check_fraction(&format!("{}.dilution_per_round", path), self.dilution_per_round)?;
        if self.dilution_per_round >= 1.0 && self.financing_rounds > 1 {
            return invalid(format!("{}.dilution_per_round", path), "full dilution leaves no ownership");
        }
        check_fraction(&format!("{}.probability_of_success", path), self.probability_of_success)?;
        if self.probability_of_success == 0.0 {
            return invalid(format!("{}.probability_of_success", path), "must be above zero");
        }
        Ok(())
    }
}

/// Scorecard adjustment of the DCF equity value
///
/// Weights are normalised to sum to one. Each factor's score compares the
/// company with a typical peer (1.0 = on par); factors without a score count
/// as 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardInputs {
    pub weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
}

impl ScorecardInputs {
    pub fn score_for(&self, factor: &str) -> f64 {
        self.scores.get(factor).copied().unwrap_or(1.0)
    }

    pub(crate) fn validate(&self, path: &str) -> Result<()> {
        for (factor, weight) in &self.weights {
            check_non_negative(&format!("{}.weights.{}", path, factor), *weight)?;
        }
        let total: f64 = self.weights.values().sum();
        if total <= 0.0 {
            return invalid(format!("{}.weights", path), "scorecard weights must sum to more than zero");
        }
        for (factor, score) in &self.scores {
            if !self.weights.contains_key(factor) {
                return invalid(format!("{}.scores.{}", path, factor), "no weight given for this factor");
            }
            check_non_negative(&format!("{}.scores.{}", path, factor), *score)?;
        }
        Ok(())
    }
}

/// Valuation methods as tagged variants; each carries its own inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ValuationMethod {
    Dcf(DcfInputs),
    Multiples(MultiplesInputs),
    VcMethod(VcInputs),
    /// Reads the equity value of the first DCF in the same run
    Scorecard(ScorecardInputs),
}

impl ValuationMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ValuationMethod::Dcf(_) => "dcf",
            ValuationMethod::Multiples(_) => "multiples",
            ValuationMethod::VcMethod(_) => "vc_method",
            ValuationMethod::Scorecard(_) => "scorecard",
        }
    }

    pub(crate) fn validate(&self, path: &str) -> Result<()> {
        match self {
            ValuationMethod::Dcf(inputs) => inputs.validate(path),
            ValuationMethod::Multiples(inputs) => inputs.validate(path),
            ValuationMethod::VcMethod(inputs) => inputs.validate(path),
            ValuationMethod::Scorecard(inputs) => inputs.validate(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValuationAssumptions {
    #[serde(default)]
    pub methods: Vec<ValuationMethod>,
}

impl ValuationAssumptions {
    /// Inputs of the DCF a scorecard builds on
    pub fn base_dcf(&self) -> Option<&DcfInputs> {
        self.methods.iter().find_map(|m| match m {
            ValuationMethod::Dcf(inputs) => Some(inputs),
            _ => None,
        })
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (i, method) in self.methods.iter().enumerate() {
            let path = format!("valuation.methods[{}]", i);
            method.validate(&path)?;
            if let ValuationMethod::Scorecard(_) = method {
                let has_terminal = self.base_dcf().map_or(false, |dcf| !dcf.terminal_methods.is_empty());
                if !has_terminal {
                    return invalid(path, "scorecard needs a DCF method with a terminal value in the same run");
                }
            }
        }
        Ok(())
    }
}
