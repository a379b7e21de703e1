//! Scenario: the root input of a run, and the runner for batches of them
//!
//! A scenario bundles every driver set with the opening balances and horizon.
//! `run` validates it, folds the months into linked statements and values the
//! result. Runs share nothing, so batches fan out across threads.

use chrono::{Months, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::drivers::{
    check_non_negative, CapexPlan, CostPlan, FinancingAssumptions, HeadcountPlan, RevenuePlan, TaxRules,
    ValuationAssumptions, WorkingCapitalPolicy,
};
use crate::error::{invalid, Result};
use crate::projection::{AnnualStatement, MonthlyPeriod, ProjectionConfig, ProjectionResult, StatementAssembler};
use crate::valuation::{value_projection, ValuationResult};

fn default_release_months() -> u32 {
    1
}

/// Balance-sheet values before month 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningBalances {
    pub cash: f64,
    #[serde(default)]
    pub accounts_receivable: f64,
    #[serde(default)]
    pub inventory: f64,
    /// Gross fixed assets at cost
    #[serde(default)]
    pub fixed_assets: f64,
    #[serde(default)]
    pub accumulated_depreciation: f64,
    /// Remaining life of the opening net fixed assets; not depreciated when absent
    #[serde(default)]
    pub fixed_asset_remaining_life_months: Option<u32>,
    #[serde(default)]
    pub accounts_payable: f64,
    #[serde(default)]
    pub deferred_revenue: f64,
    /// Months over which the opening deferred revenue is recognised
    #[serde(default = "default_release_months")]
    pub deferred_revenue_release_months: u32,
    #[serde(default)]
    pub debt: f64,
    /// Interest rate on the opening debt
    #[serde(default)]
    pub debt_annual_rate: f64,
    #[serde(default)]
    pub paid_in_capital: f64,
    #[serde(default)]
    pub tax_loss_carryforward: f64,
}

impl Default for OpeningBalances {
    fn default() -> Self {
        Self {
            cash: 0.0,
            accounts_receivable: 0.0,
            inventory: 0.0,
            fixed_assets: 0.0,
            accumulated_depreciation: 0.0,
            fixed_asset_remaining_life_months: None,
            accounts_payable: 0.0,
            deferred_revenue: 0.0,
            deferred_revenue_release_months: 1,
            debt: 0.0,
            debt_annual_rate: 0.0,
            paid_in_capital: 0.0,
            tax_loss_carryforward: 0.0,
        }
    }
}

impl OpeningBalances {
    fn validate(&self) -> Result<()> {
        if !self.cash.is_finite() {
            return invalid("opening.cash", "must be finite");
        }
        check_non_negative("opening.accounts_receivable", self.accounts_receivable)?;
        check_non_negative("opening.inventory", self.inventory)?;
        check_non_negative("opening.fixed_assets", self.fixed_assets)?;
        check_non_negative("opening.accumulated_depreciation", self.accumulated_depreciation)?;
        if self.accumulated_depreciation > self.fixed_assets {
            return invalid("opening.accumulated_depreciation", "exceeds gross fixed assets");
        }
        if self.fixed_asset_remaining_life_months == Some(0) {
            return invalid("opening.fixed_asset_remaining_life_months", "must be at least one month");
        }
        check_non_negative("opening.accounts_payable", self.accounts_payable)?;
        check_non_negative("opening.deferred_revenue", self.deferred_revenue)?;
        if self.deferred_revenue_release_months == 0 {
            return invalid("opening.deferred_revenue_release_months", "must be at least one month");
        }
        check_non_negative("opening.debt", self.debt)?;
        check_non_negative("opening.debt_annual_rate", self.debt_annual_rate)?;
        check_non_negative("opening.paid_in_capital", self.paid_in_capital)?;
        check_non_negative("opening.tax_loss_carryforward", self.tax_loss_carryforward)?;
        Ok(())
    }
}

/// A named, fully specified set of drivers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// First day of projection month 1
    pub start_date: NaiveDate,
    pub horizon_months: u32,
    #[serde(default)]
    pub opening: OpeningBalances,
    #[serde(default)]
    pub revenue: RevenuePlan,
    #[serde(default)]
    pub headcount: HeadcountPlan,
    #[serde(default)]
    pub costs: CostPlan,
    #[serde(default)]
    pub taxes: TaxRules,
    #[serde(default)]
    pub financing: FinancingAssumptions,
    #[serde(default)]
    pub capex: CapexPlan,
    #[serde(default)]
    pub working_capital: WorkingCapitalPolicy,
    #[serde(default)]
    pub valuation: ValuationAssumptions,
}

impl Scenario {
    /// Check every driver against its allowed range
    pub fn validate(&self) -> Result<()> {
        if self.horizon_months == 0 {
            return invalid("horizon_months", "horizon must be at least one month");
        }
        if self.start_date.checked_add_months(Months::new(self.horizon_months)).is_none() {
            return invalid("horizon_months", "horizon runs past the supported calendar");
        }
        self.opening.validate()?;
        self.revenue.validate()?;
        self.headcount.validate()?;
        self.costs.validate()?;
        self.taxes.validate()?;
        self.financing.validate()?;
        self.capex.validate()?;
        self.working_capital.validate()?;
        self.valuation.validate()?;
        Ok(())
    }

    /// Validate and fold the scenario into monthly statements
    pub fn project(&self, config: ProjectionConfig) -> Result<ProjectionResult> {
        self.validate()?;
        StatementAssembler::new(self, config).project()
    }

    /// Project and value the scenario with default configuration
    pub fn run(&self) -> Result<ScenarioResult> {
        self.run_with(ProjectionConfig::default())
    }

    pub fn run_with(&self, config: ProjectionConfig) -> Result<ScenarioResult> {
        let projection = self.project(config)?;
        let valuation = value_projection(&self.valuation, &projection)?;
        Ok(ScenarioResult { projection, valuation })
    }
}

/// Everything a run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub projection: ProjectionResult,
    pub valuation: ValuationResult,
}

impl ScenarioResult {
    pub fn periods(&self) -> &[MonthlyPeriod] {
        &self.projection.monthly
    }

    pub fn annual(&self) -> &[AnnualStatement] {
        &self.projection.annual
    }
}

/// Run one scenario: `(periods, valuation)` on success
pub fn run(scenario: &Scenario) -> Result<ScenarioResult> {
    scenario.run()
}

/// Runs scenarios with a shared projection configuration
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    config: ProjectionConfig,
}

impl ScenarioRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn run(&self, scenario: &Scenario) -> Result<ScenarioResult> {
        scenario.run_with(self.config.clone())
    }

    /// Run independent scenarios in parallel; results keep the input order
    pub fn run_batch(&self, scenarios: &[Scenario]) -> Vec<Result<ScenarioResult>> {
        scenarios.par_iter().map(|s| self.run(s)).collect()
    }

    /// Run variants of a base scenario produced by `vary`, one per input value
    pub fn run_sensitivity<T, F>(&self, base: &Scenario, values: &[T], vary: F) -> Vec<Result<ScenarioResult>>
    where
        T: Sync,
        F: Fn(&mut Scenario, &T) + Sync,
    {
        values
            .par_iter()
            .map(|value| {
                let mut scenario = base.clone();
                vary(&mut scenario, value);
                self.run(&scenario)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::DeferralSchedule;
    use crate::error::ModelError;
    use crate::testing::{reference_scenario, rich_scenario};

    #[test]
    fn test_run_is_idempotent() {
        let scenario = rich_scenario();
        let first = run(&scenario).unwrap();
        let second = run(&scenario).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.periods().len(), scenario.horizon_months as usize);
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let mut scenario = reference_scenario();
        scenario.horizon_months = 0;
        match run(&scenario) {
            Err(ModelError::Validation(e)) => assert_eq!(e.field, "horizon_months"),
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_bad_deferral_rejected_before_run() {
        let mut scenario = reference_scenario();
        scenario.revenue.streams[0].deferral = DeferralSchedule { weights: vec![0.5, 0.4] };
        let err = run(&scenario).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_negative_headcount_rejected_before_run() {
        let mut scenario = reference_scenario();
        let mut area = crate::drivers::AreaPlan::new("Support", 1.0, 50_000.0);
        area.events = vec![crate::drivers::HeadcountEvent::departure(5, 2.0)];
        scenario.headcount.areas.push(area);
        match scenario.validate() {
            Err(ModelError::Validation(e)) => assert_eq!(e.field, "headcount.areas[0].events"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_batch_preserves_order_and_isolates_failures() {
        let good = rich_scenario();
        let mut bad = reference_scenario();
        bad.horizon_months = 0;
        let runner = ScenarioRunner::new();

        let results = runner.run_batch(&[good.clone(), bad, good.clone()]);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(results[0].as_ref().unwrap(), results[2].as_ref().unwrap());
        assert_eq!(results[0].as_ref().unwrap(), &runner.run(&good).unwrap());
    }

    #[test]
    fn test_sensitivity_on_churn() {
        let base = reference_scenario();
        let runner = ScenarioRunner::new();
        let results = runner.run_sensitivity(&base, &[0.02, 0.05, 0.10], |s, churn| {
            s.revenue.streams[0].churn_rate = crate::drivers::MonthlySchedule::constant(*churn);
        });
        let cash: Vec<f64> = results
            .iter()
            .map(|r| r.as_ref().unwrap().projection.summary().ending_cash)
            .collect();
        assert!(cash[0] > cash[1] && cash[1] > cash[2]);
    }

    #[test]
    fn test_scenario_json_defaults() {
        let json = r#"{
            "name": "Minimal",
            "start_date": "2025-01-01",
            "horizon_months": 3,
            "opening": {"cash": 1000.0}
        }"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.opening.deferred_revenue_release_months, 1);
        let result = scenario.run().unwrap();
        assert_eq!(result.periods().len(), 3);
        assert_eq!(result.projection.summary().ending_cash, 1000.0);
        assert!(result.valuation.outcomes.is_empty());
    }
}
