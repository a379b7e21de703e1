//! Cost engine: monthly amounts for every cost item of the plan

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::drivers::{CostAllocation, CostCategory, CostCenter, CostDriver, CostItem, CostPlan};

/// Operating figures variable costs scale with
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostDrivers {
    /// Gross recognised revenue
    pub revenue: f64,
    /// Recognised revenue net of revenue-based indirect taxes
    pub net_revenue: f64,
    pub billings: f64,
    pub headcount: f64,
    pub customers: f64,
    pub new_customers: f64,
}

impl CostDrivers {
    pub fn value(&self, driver: CostDriver) -> f64 {
        match driver {
            CostDriver::Revenue => self.revenue,
            CostDriver::Billings => self.billings,
            CostDriver::Headcount => self.headcount,
            CostDriver::Customers => self.customers,
            CostDriver::NewCustomers => self.new_customers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostKind {
    Fixed,
    Variable,
    SupplierContract,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub name: String,
    pub kind: CostKind,
    pub allocation: CostAllocation,
    pub cost_center: CostCenter,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterCost {
    pub cost_center: CostCenter,
    pub amount: f64,
}

/// Non-payroll costs for one month
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub lines: Vec<CostLine>,
    pub fixed: f64,
    pub variable: f64,
    pub supplier_contracts: f64,
    /// COGS from the plan-level revenue percentage and per-customer cost
    pub direct_cogs: f64,
    pub cogs: f64,
    pub opex: f64,
    /// Totals per cost center, in center order
    pub by_center: Vec<CenterCost>,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.cogs + self.opex
    }

    pub fn center(&self, center: CostCenter) -> f64 {
        self.by_center
            .iter()
            .find(|c| c.cost_center == center)
            .map(|c| c.amount)
            .unwrap_or(0.0)
    }
}

fn item_amount(item: &CostItem, month: u32, drivers: &CostDrivers) -> (CostKind, f64) {
    match &item.category {
        CostCategory::Fixed { amount, annual_escalation } => {
            let years_elapsed = month.saturating_sub(1) / 12;
            let escalated = amount.value_for(month) * (1.0 + annual_escalation).powi(years_elapsed as i32);
            (CostKind::Fixed, escalated)
        }
        CostCategory::Variable { driver, rate } => (CostKind::Variable, drivers.value(*driver) * rate),
        CostCategory::SupplierContract(terms) => {
            if !terms.is_active(month) {
                return (CostKind::SupplierContract, 0.0);
            }
            let base = terms.base_amount(month) * (1.0 + terms.escalation_pct).powi(terms.escalations(month) as i32);
            let usage = terms
                .usage
                .as_ref()
                .map(|u| drivers.value(u.driver) * u.rate)
                .unwrap_or(0.0);
            (CostKind::SupplierContract, (base + usage).max(terms.minimum_commitment))
        }
    }
}

/// Cost every item of the plan for one month
pub fn project_month(plan: &CostPlan, month: u32, drivers: &CostDrivers) -> CostBreakdown {
    let mut breakdown = CostBreakdown::default();
    let mut centers: BTreeMap<CostCenter, f64> = BTreeMap::new();

    for item in &plan.items {
        let (kind, amount) = item_amount(item, month, drivers);
        match kind {
            CostKind::Fixed => breakdown.fixed += amount,
            CostKind::Variable => breakdown.variable += amount,
            CostKind::SupplierContract => breakdown.supplier_contracts += amount,
        }
        match item.allocation {
            CostAllocation::Cogs => breakdown.cogs += amount,
            CostAllocation::Opex => breakdown.opex += amount,
        }
        *centers.entry(item.cost_center).or_insert(0.0) += amount;
        breakdown.lines.push(CostLine {
            name: item.name.clone(),
            kind,
            allocation: item.allocation,
            cost_center: item.cost_center,
            amount,
        });
    }

    breakdown.direct_cogs =
        plan.cogs_pct_of_revenue * drivers.net_revenue + plan.cogs_per_customer * drivers.customers;
    breakdown.cogs += breakdown.direct_cogs;
    if breakdown.direct_cogs != 0.0 {
        *centers.entry(CostCenter::Other).or_insert(0.0) += breakdown.direct_cogs;
    }

    breakdown.by_center = centers
        .into_iter()
        .map(|(cost_center, amount)| CenterCost { cost_center, amount })
        .collect();
    breakdown
}
