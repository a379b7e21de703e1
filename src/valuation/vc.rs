//! Venture capital method: back-solve ownership and pricing from a target exit

use serde::{Deserialize, Serialize};

use super::metrics::measure;
use crate::drivers::{ExitValue, RequiredReturn, VcInputs};
use crate::error::{invalid, Result};
use crate::projection::ProjectionResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcResult {
    pub exit_value: f64,
    pub years_to_exit: f64,
    /// Cash-on-cash multiple the investor requires
    pub required_multiple: f64,
    /// Required multiple grossed up for the probability of success
    pub risk_adjusted_multiple: f64,
    pub investment: f64,
    /// Share of today's stake still held at exit after later rounds
    pub retention: f64,
    /// Ownership the investor must hold at exit
    pub ownership_at_exit: f64,
    /// Ownership the investor must buy today
    pub required_ownership: f64,
    pub post_money: f64,
    pub pre_money: f64,
    /// Annual return implied by the required multiple over the holding period
    pub implied_irr: Option<f64>,
}

/// Parameters of a VC-method calculation after exit value and investment are known
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VcTerms {
    pub exit_value: f64,
    pub years_to_exit: f64,
    pub required_multiple: f64,
    pub investment: f64,
    pub financing_rounds: u32,
    pub dilution_per_round: f64,
    pub probability_of_success: f64,
}

/// Back-solve required ownership and pricing
///
/// Post-money today is the exit value discounted by the risk-adjusted required
/// multiple. Later rounds dilute the stake by `dilution_per_round` each, so the
/// investor buys more today to hold the required share at exit. Fails when the
/// required stake exceeds 100%.
pub fn vc_valuation(terms: &VcTerms) -> Result<VcResult> {
    if terms.exit_value <= 0.0 {
        return invalid("valuation.vc_method.exit", "exit value must be positive");
    }
    if terms.investment <= 0.0 {
        return invalid("valuation.vc_method.investment", "investment must be positive");
    }

    let risk_adjusted_multiple = terms.required_multiple / terms.probability_of_success;
    let retention = (1.0 - terms.dilution_per_round).powi(terms.financing_rounds.saturating_sub(1) as i32);
    let ownership_at_exit = terms.investment * risk_adjusted_multiple / terms.exit_value;
    let required_ownership = ownership_at_exit / retention;

    if !required_ownership.is_finite() || required_ownership > 1.0 {
        return invalid(
            "valuation.vc_method",
            format!(
                "investor would need {:.2}% ownership, which exceeds 100%",
                required_ownership * 100.0
            ),
        );
    }

    let post_money = terms.investment / required_ownership;
    let implied_irr = if terms.years_to_exit > 0.0 {
        Some(terms.required_multiple.powf(1.0 / terms.years_to_exit) - 1.0)
    } else {
        None
    };

    Ok(VcResult {
        exit_value: terms.exit_value,
        years_to_exit: terms.years_to_exit,
        required_multiple: terms.required_multiple,
        risk_adjusted_multiple,
        investment: terms.investment,
        retention,
        ownership_at_exit,
        required_ownership,
        post_money,
        pre_money: post_money - terms.investment,
        implied_irr,
    })
}

/// Run the VC method against a finished projection
///
/// A multiple-based exit is applied to the metric at the end of the horizon.
/// Without an explicit investment the equity raised over the horizon is used.
pub fn value(inputs: &VcInputs, projection: &ProjectionResult) -> Result<VcResult> {
    let exit_value = match &inputs.exit {
        ExitValue::Explicit { value } => *value,
        ExitValue::Multiple { metric, window, multiple } => measure(projection, *metric, *window) * multiple,
    };

    let required_multiple = match inputs.required_return {
        RequiredReturn::Multiple { multiple } => multiple,
        RequiredReturn::AnnualRate { rate } => (1.0 + rate).powf(inputs.years_to_exit),
    };

    let investment = match inputs.investment {
        Some(amount) => amount,
        None => {
            let raised = projection.equity_issued();
            if raised <= 0.0 {
                return invalid(
                    "valuation.vc_method.investment",
                    "no investment given and the projection raises no equity",
                );
            }
            raised
        }
    };

    vc_valuation(&VcTerms {
        exit_value,
        years_to_exit: inputs.years_to_exit,
        required_multiple,
        investment,
        financing_rounds: inputs.financing_rounds,
        dilution_per_round: inputs.dilution_per_round,
        probability_of_success: inputs.probability_of_success,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{FinancingEvent, Metric, MetricWindow};
    use crate::testing::{project, reference_scenario};
    use approx::assert_relative_eq;

    fn terms() -> VcTerms {
        VcTerms {
            exit_value: 100_000_000.0,
            years_to_exit: 5.0,
            required_multiple: 10.0,
            investment: 1_000_000.0,
            financing_rounds: 1,
            dilution_per_round: 0.0,
            probability_of_success: 1.0,
        }
    }

    #[test]
    fn test_single_round_back_solve() {
        let result = vc_valuation(&terms()).unwrap();
        assert_relative_eq!(result.required_ownership, 0.10, max_relative = 1e-12);
        assert_relative_eq!(result.post_money, 10_000_000.0, max_relative = 1e-12);
        assert_relative_eq!(result.pre_money, 9_000_000.0, max_relative = 1e-12);
        assert_relative_eq!(
            result.pre_money,
            result.post_money * (1.0 - result.required_ownership),
            max_relative = 1e-12
        );
        assert_relative_eq!(result.implied_irr.unwrap(), 10f64.powf(0.2) - 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_later_rounds_raise_required_ownership() {
        let result = vc_valuation(&VcTerms {
            financing_rounds: 3,
            dilution_per_round: 0.2,
            ..terms()
        })
        .unwrap();
        assert_relative_eq!(result.retention, 0.64, max_relative = 1e-12);
        assert_relative_eq!(result.required_ownership, 0.10 / 0.64, max_relative = 1e-12);
        assert!(result.post_money < 10_000_000.0);
    }

    #[test]
    fn test_probability_of_success_grosses_up_multiple() {
        let result = vc_valuation(&VcTerms {
            probability_of_success: 0.5,
            ..terms()
        })
        .unwrap();
        assert_relative_eq!(result.risk_adjusted_multiple, 20.0, max_relative = 1e-12);
        assert_relative_eq!(result.required_ownership, 0.20, max_relative = 1e-12);
    }

    #[test]
    fn test_ownership_above_one_is_validation_error() {
        let err = vc_valuation(&VcTerms {
            investment: 20_000_000.0,
            ..terms()
        })
        .unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_defaults_investment_to_equity_raised() {
        let mut scenario = reference_scenario();
        scenario.financing.events.push(FinancingEvent::equity("Seed", 1, 500_000.0));
        let projection = project(&scenario);
        let inputs = VcInputs {
            exit: ExitValue::Multiple {
                metric: Metric::Arr,
                window: MetricWindow::RunRate,
                multiple: 1_000.0,
            },
            years_to_exit: 4.0,
            required_return: RequiredReturn::AnnualRate { rate: 0.5 },
            investment: None,
            financing_rounds: 1,
            dilution_per_round: 0.0,
            probability_of_success: 1.0,
        };
        let result = value(&inputs, &projection).unwrap();
        assert_eq!(result.investment, 500_000.0);
        assert_relative_eq!(result.required_multiple, 1.5f64.powi(4), max_relative = 1e-12);
        assert_relative_eq!(result.exit_value, projection.monthly[11].revenue.arr() * 1_000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_missing_investment_without_equity_fails() {
        let projection = project(&reference_scenario());
        let inputs = VcInputs {
            exit: ExitValue::Explicit { value: 1e8 },
            years_to_exit: 5.0,
            required_return: RequiredReturn::Multiple { multiple: 10.0 },
            investment: None,
            financing_rounds: 1,
            dilution_per_round: 0.0,
            probability_of_success: 1.0,
        };
        assert!(value(&inputs, &projection).is_err());
    }
}
