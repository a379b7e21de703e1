//! Valuation toolkit operating on a finished projection
//!
//! Each method is independently callable through its own module; the tagged
//! [`ValuationMethod`] dispatches to them and [`ValuationResult`] keeps the
//! outcomes in configuration order.

pub mod discount;
pub mod metrics;
pub mod dcf;
pub mod multiples;
pub mod vc;
pub mod scorecard;

use serde::{Deserialize, Serialize};

use crate::drivers::{ValuationAssumptions, ValuationMethod};
use crate::error::{invalid, Result};
use crate::projection::ProjectionResult;

pub use dcf::{DcfResult, DiscountedFlow, TerminalValuation};
pub use discount::DiscountCurve;
pub use multiples::{MultipleApplication, MultiplesResult};
pub use scorecard::{ScorecardFactor, ScorecardResult};
pub use vc::{VcResult, VcTerms};

/// Outcome of one valuation method, with its intermediate values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ValuationOutcome {
    Dcf(DcfResult),
    Multiples(MultiplesResult),
    VcMethod(VcResult),
    Scorecard(ScorecardResult),
}

impl ValuationOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            ValuationOutcome::Dcf(_) => "dcf",
            ValuationOutcome::Multiples(_) => "multiples",
            ValuationOutcome::VcMethod(_) => "vc_method",
            ValuationOutcome::Scorecard(_) => "scorecard",
        }
    }
}

impl ValuationMethod {
    /// Value a finished projection with this method
    ///
    /// `base_dcf` is the DCF of the same run; only the scorecard reads it.
    pub fn evaluate(&self, projection: &ProjectionResult, base_dcf: Option<&DcfResult>) -> Result<ValuationOutcome> {
        match self {
            ValuationMethod::Dcf(inputs) => dcf::value(inputs, projection).map(ValuationOutcome::Dcf),
            ValuationMethod::Multiples(inputs) => multiples::value(inputs, projection).map(ValuationOutcome::Multiples),
            ValuationMethod::VcMethod(inputs) => vc::value(inputs, projection).map(ValuationOutcome::VcMethod),
            ValuationMethod::Scorecard(inputs) => match base_dcf {
                Some(base) => scorecard::value(inputs, base).map(ValuationOutcome::Scorecard),
                None => invalid("valuation.scorecard", "scorecard needs a DCF method in the same run"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValuationResult {
    pub outcomes: Vec<ValuationOutcome>,
}

impl ValuationResult {
    pub fn dcf(&self) -> Option<&DcfResult> {
        self.outcomes.iter().find_map(|o| match o {
            ValuationOutcome::Dcf(result) => Some(result),
            _ => None,
        })
    }

    pub fn multiples(&self) -> Option<&MultiplesResult> {
        self.outcomes.iter().find_map(|o| match o {
            ValuationOutcome::Multiples(result) => Some(result),
            _ => None,
        })
    }

    pub fn vc_method(&self) -> Option<&VcResult> {
        self.outcomes.iter().find_map(|o| match o {
            ValuationOutcome::VcMethod(result) => Some(result),
            _ => None,
        })
    }

    pub fn scorecard(&self) -> Option<&ScorecardResult> {
        self.outcomes.iter().find_map(|o| match o {
            ValuationOutcome::Scorecard(result) => Some(result),
            _ => None,
        })
    }
}

/// Evaluate every configured method; the first failure aborts
///
/// The first DCF is valued up front so a scorecard can read it wherever it
/// appears in the list.
pub fn value_projection(assumptions: &ValuationAssumptions, projection: &ProjectionResult) -> Result<ValuationResult> {
    let base_dcf = assumptions
        .base_dcf()
        .map(|inputs| dcf::value(inputs, projection))
        .transpose()?;
    let outcomes = assumptions
        .methods
        .iter()
        .map(|method| method.evaluate(projection, base_dcf.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    Ok(ValuationResult { outcomes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{
        CashFlowBasis, DcfInputs, Metric, MetricWindow, MultipleSpec, MultiplesInputs, ScorecardInputs,
        TerminalValueMethod,
    };
    use crate::testing::{project, rich_scenario};
    use approx::assert_relative_eq;

    #[test]
    fn test_outcomes_follow_configuration_order() {
        let scenario = rich_scenario();
        let projection = project(&scenario);
        let result = value_projection(&scenario.valuation, &projection).unwrap();

        let names: Vec<&str> = result.outcomes.iter().map(|o| o.name()).collect();
        let expected: Vec<&str> = scenario.valuation.methods.iter().map(|m| m.name()).collect();
        assert_eq!(names, expected);
        assert!(result.dcf().is_some());
        assert!(result.multiples().is_some());
        assert!(result.vc_method().is_some());
        assert!(result.scorecard().is_some());
    }

    #[test]
    fn test_scorecard_reads_dcf_listed_after_it() {
        let projection = project(&rich_scenario());
        let weights = [("team".to_string(), 2.0), ("market".to_string(), 2.0)].into_iter().collect();
        let scores = [("team".to_string(), 1.5)].into_iter().collect();
        let dcf_inputs = DcfInputs {
            discount_rate: 0.3,
            basis: CashFlowBasis::Fcff,
            terminal_methods: vec![TerminalValueMethod::PerpetuityGrowth { growth_rate: 0.02 }],
        };
        let assumptions = ValuationAssumptions {
            methods: vec![
                ValuationMethod::Scorecard(ScorecardInputs { weights, scores }),
                ValuationMethod::Dcf(dcf_inputs),
            ],
        };
        let result = value_projection(&assumptions, &projection).unwrap();

        assert_eq!(result.outcomes[0].name(), "scorecard");
        let equity = result.dcf().unwrap().terminals[0].equity_value;
        let scorecard = result.scorecard().unwrap();
        assert_eq!(scorecard.base_equity_value, equity);
        assert_relative_eq!(scorecard.total_score, 1.25, max_relative = 1e-12);
        assert_relative_eq!(scorecard.valuation, equity * 1.25, max_relative = 1e-12);
    }

    #[test]
    fn test_scorecard_without_dcf_is_validation_error() {
        let projection = project(&rich_scenario());
        let method = ValuationMethod::Scorecard(ScorecardInputs {
            weights: [("team".to_string(), 1.0)].into_iter().collect(),
            scores: Default::default(),
        });
        let err = method.evaluate(&projection, None).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_failing_method_aborts_valuation() {
        let projection = project(&rich_scenario());
        let assumptions = ValuationAssumptions {
            methods: vec![
                ValuationMethod::Multiples(MultiplesInputs {
                    applications: vec![MultipleSpec {
                        metric: Metric::Ebitda,
                        window: MetricWindow::RunRate,
                        multiple: 10.0,
                    }],
                }),
                ValuationMethod::Dcf(DcfInputs {
                    discount_rate: 0.08,
                    basis: CashFlowBasis::Fcff,
                    terminal_methods: vec![TerminalValueMethod::PerpetuityGrowth { growth_rate: 0.08 }],
                }),
            ],
        };
        let err = value_projection(&assumptions, &projection).unwrap_err();
        assert!(err.is_recoverable());
    }
}
