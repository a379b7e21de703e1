//! Tax engine: monthly income tax with loss carryforward, and indirect taxes

use serde::{Deserialize, Serialize};

use crate::drivers::{IndirectTaxBase, TaxRules};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxLine {
    pub name: String,
    pub amount: f64,
}

/// Income tax for one month
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaxComputation {
    pub pre_tax_income: f64,
    pub carryforward_opening: f64,
    pub carryforward_used: f64,
    pub carryforward_added: f64,
    pub carryforward_closing: f64,
    pub taxable_income: f64,
    pub income_tax: f64,
    pub by_jurisdiction: Vec<TaxLine>,
}

/// Compute income tax on a month's pre-tax income
///
/// Losses add to the carryforward balance (when enabled) and incur no tax.
/// Profits are first offset by carried losses, up to the policy's offset cap.
/// Progressive brackets apply to the annualised taxable income.
pub fn compute_income_tax(rules: &TaxRules, pre_tax_income: f64, carryforward: f64) -> TaxComputation {
    let policy = &rules.carryforward;
    let mut result = TaxComputation {
        pre_tax_income,
        carryforward_opening: carryforward,
        carryforward_closing: carryforward,
        ..Default::default()
    };

    if pre_tax_income <= 0.0 {
        if policy.enabled {
            result.carryforward_added = -pre_tax_income;
            result.carryforward_closing = carryforward - pre_tax_income;
        }
        return result;
    }

    let used = if policy.enabled {
        carryforward.min(pre_tax_income * policy.max_offset_fraction).max(0.0)
    } else {
        0.0
    };
    result.carryforward_used = used;
    result.carryforward_closing = carryforward - used;
    result.taxable_income = pre_tax_income - used;

    result.by_jurisdiction = rules
        .income_tax
        .iter()
        .map(|c| TaxLine {
            name: c.jurisdiction.clone(),
            amount: c.schedule.monthly_tax(result.taxable_income),
        })
        .collect();
    result.income_tax = result.by_jurisdiction.iter().map(|l| l.amount).sum();
    result
}

/// Indirect taxes for one month
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndirectTaxes {
    /// Deducted from gross revenue to arrive at net revenue
    pub revenue_taxes: f64,
    /// Added to operating expenses
    pub payroll_taxes: f64,
    pub lines: Vec<TaxLine>,
}

pub fn compute_indirect_taxes(rules: &TaxRules, gross_revenue: f64, payroll: f64) -> IndirectTaxes {
    let mut taxes = IndirectTaxes::default();
    for tax in &rules.indirect {
        let amount = match tax.base {
            IndirectTaxBase::GrossRevenue => {
                let amount = gross_revenue * tax.rate;
                taxes.revenue_taxes += amount;
                amount
            }
            IndirectTaxBase::Payroll => {
                let amount = payroll * tax.rate;
                taxes.payroll_taxes += amount;
                amount
            }
        };
        taxes.lines.push(TaxLine {
            name: tax.name.clone(),
            amount,
        });
    }
    taxes
}
