//! Cost plan: fixed, variable and supplier-contract cost items

use serde::{Deserialize, Serialize};

use super::common::{check_month, check_non_negative, MonthlySchedule};
use crate::error::{invalid, Result};

/// Where a cost lands on the income statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostAllocation {
    Cogs,
    #[default]
    Opex,
}

/// Functional cost center used for breakdowns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCenter {
    Engineering,
    Product,
    Sales,
    Marketing,
    CustomerSuccess,
    GeneralAdministrative,
    #[default]
    Other,
}

impl CostCenter {
    /// Centers counted as customer acquisition spend
    pub fn is_acquisition(&self) -> bool {
        matches!(self, CostCenter::Sales | CostCenter::Marketing)
    }
}

/// Operating figure a variable cost scales with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostDriver {
    /// Recognised (gross) revenue
    Revenue,
    Billings,
    Headcount,
    Customers,
    NewCustomers,
}

/// A step change in a supplier contract's monthly amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractStep {
    pub from_month: u32,
    pub monthly_amount: f64,
}

/// Usage-linked component of a supplier contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageFee {
    pub driver: CostDriver,
    pub rate: f64,
}

fn default_escalation_frequency() -> u32 {
    12
}

/// Terms of a supplier contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractTerms {
    pub start_month: u32,
    /// Last month billed (inclusive); open-ended when absent
    #[serde(default)]
    pub end_month: Option<u32>,
    pub monthly_amount: f64,
    #[serde(default)]
    pub steps: Vec<ContractStep>,
    /// Escalation applied every `escalation_frequency_months` after start
    #[serde(default)]
    pub escalation_pct: f64,
    #[serde(default = "default_escalation_frequency")]
    pub escalation_frequency_months: u32,
    #[serde(default)]
    pub usage: Option<UsageFee>,
    /// Floor on the monthly charge while the contract is active
    #[serde(default)]
    pub minimum_commitment: f64,
}

impl ContractTerms {
    pub fn is_active(&self, month: u32) -> bool {
        month >= self.start_month && self.end_month.map_or(true, |end| month <= end)
    }

    /// Base amount in effect before escalation and usage
    pub fn base_amount(&self, month: u32) -> f64 {
        self.steps
            .iter()
            .filter(|s| s.from_month <= month)
            .max_by_key(|s| s.from_month)
            .map(|s| s.monthly_amount)
            .unwrap_or(self.monthly_amount)
    }

    /// Number of escalations applied by the given month
    pub fn escalations(&self, month: u32) -> u32 {
        if self.escalation_frequency_months == 0 || month < self.start_month {
            return 0;
        }
        (month - self.start_month) / self.escalation_frequency_months
    }
}

/// Category tag and category-specific terms of a cost item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum CostCategory {
    Fixed {
        amount: MonthlySchedule,
        /// Annual escalation applied at the start of each fiscal year after the first
        #[serde(default)]
        annual_escalation: f64,
    },
    Variable {
        driver: CostDriver,
        rate: f64,
    },
    SupplierContract(ContractTerms),
}

/// A single line of the cost plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItem {
    pub name: String,
    #[serde(flatten)]
    pub category: CostCategory,
    #[serde(default)]
    pub allocation: CostAllocation,
    #[serde(default)]
    pub cost_center: CostCenter,
}

impl CostItem {
    pub fn fixed(name: &str, monthly_amount: f64) -> Self {
        Self {
            name: name.to_string(),
            category: CostCategory::Fixed {
                amount: MonthlySchedule::constant(monthly_amount),
                annual_escalation: 0.0,
            },
            allocation: CostAllocation::Opex,
            cost_center: CostCenter::Other,
        }
    }

    pub fn variable(name: &str, driver: CostDriver, rate: f64) -> Self {
        Self {
            name: name.to_string(),
            category: CostCategory::Variable { driver, rate },
            allocation: CostAllocation::Opex,
            cost_center: CostCenter::Other,
        }
    }

    pub fn supplier(name: &str, terms: ContractTerms) -> Self {
        Self {
            name: name.to_string(),
            category: CostCategory::SupplierContract(terms),
            allocation: CostAllocation::Opex,
            cost_center: CostCenter::Other,
        }
    }

    pub fn allocated_to(mut self, allocation: CostAllocation) -> Self {
        self.allocation = allocation;
        self
    }

    pub fn in_center(mut self, center: CostCenter) -> Self {
        self.cost_center = center;
        self
    }

    pub(crate) fn validate(&self, path: &str) -> Result<()> {
        match &self.category {
            CostCategory::Fixed { amount, annual_escalation } => {
                amount.validate_non_negative(&format!("{}.amount", path))?;
                if !annual_escalation.is_finite() || *annual_escalation <= -1.0 {
                    return invalid(format!("{}.annual_escalation", path), "must exceed -1");
                }
            }
            CostCategory::Variable { rate, .. } => {
                check_non_negative(&format!("{}.rate", path), *rate)?;
            }
            CostCategory::SupplierContract(terms) => {
                check_month(&format!("{}.start_month", path), terms.start_month)?;
                if let Some(end) = terms.end_month {
                    if end < terms.start_month {
                        return invalid(format!("{}.end_month", path), "ends before it starts");
                    }
                }
                check_non_negative(&format!("{}.monthly_amount", path), terms.monthly_amount)?;
                check_non_negative(&format!("{}.minimum_commitment", path), terms.minimum_commitment)?;
                for (i, step) in terms.steps.iter().enumerate() {
                    check_month(&format!("{}.steps[{}].from_month", path, i), step.from_month)?;
                    check_non_negative(&format!("{}.steps[{}].monthly_amount", path, i), step.monthly_amount)?;
                }
                if !terms.escalation_pct.is_finite() || terms.escalation_pct <= -1.0 {
                    return invalid(format!("{}.escalation_pct", path), "must exceed -1");
                }
                if let Some(usage) = &terms.usage {
                    check_non_negative(&format!("{}.usage.rate", path), usage.rate)?;
                }
            }
        }
        Ok(())
    }
}

/// Full cost plan of a scenario
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostPlan {
    #[serde(default)]
    pub items: Vec<CostItem>,
    /// COGS as a fraction of net revenue
    #[serde(default)]
    pub cogs_pct_of_revenue: f64,
    /// COGS per billed customer per month
    #[serde(default)]
    pub cogs_per_customer: f64,
}

impl CostPlan {
    pub fn with_items(items: Vec<CostItem>) -> Self {
        Self {
            items,
            cogs_pct_of_revenue: 0.0,
            cogs_per_customer: 0.0,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (i, item) in self.items.iter().enumerate() {
            item.validate(&format!("costs.items[{}]", i))?;
        }
        check_non_negative("costs.cogs_pct_of_revenue", self.cogs_pct_of_revenue)?;
        check_non_negative("costs.cogs_per_customer", self.cogs_per_customer)?;
        Ok(())
    }
}
