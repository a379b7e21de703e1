//! Working capital policy expressed in days

use serde::{Deserialize, Serialize};

use super::common::check_non_negative;
use crate::error::Result;

/// Days per month used to convert day counts into balances
pub const DAYS_PER_MONTH: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkingCapitalPolicy {
    /// Days sales outstanding, applied to billings
    #[serde(default)]
    pub dso_days: f64,
    /// Days payables outstanding, applied to COGS plus non-payroll opex
    #[serde(default)]
    pub dpo_days: f64,
    /// Days inventory outstanding, applied to COGS
    #[serde(default)]
    pub dio_days: f64,
}

impl WorkingCapitalPolicy {
    pub fn receivables(&self, billings: f64) -> f64 {
        billings * self.dso_days / DAYS_PER_MONTH
    }

    pub fn payables(&self, payable_costs: f64) -> f64 {
        payable_costs * self.dpo_days / DAYS_PER_MONTH
    }

    pub fn inventory(&self, cogs: f64) -> f64 {
        cogs * self.dio_days / DAYS_PER_MONTH
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_non_negative("working_capital.dso_days", self.dso_days)?;
        check_non_negative("working_capital.dpo_days", self.dpo_days)?;
        check_non_negative("working_capital.dio_days", self.dio_days)?;
        Ok(())
    }
}
