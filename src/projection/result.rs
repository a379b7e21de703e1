//! Projection output: the monthly series, annual statements and summary

use serde::{Deserialize, Serialize};

use super::annual::AnnualStatement;
use super::statements::{BalanceSheet, MonthlyPeriod};

/// Complete projection of one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// Scenario name
    pub scenario: String,

    /// Balance sheet before month 1
    pub opening_balance_sheet: BalanceSheet,

    /// One period per projection month, in order
    pub monthly: Vec<MonthlyPeriod>,

    /// Fiscal-year aggregates of `monthly`
    pub annual: Vec<AnnualStatement>,
}

impl ProjectionResult {
    /// Closing balance sheet of the last month, or the opening sheet for an empty run
    pub fn ending_balance_sheet(&self) -> &BalanceSheet {
        self.monthly
            .last()
            .map(|p| &p.balance_sheet)
            .unwrap_or(&self.opening_balance_sheet)
    }

    /// Ending debt less ending cash
    pub fn net_debt(&self) -> f64 {
        let bs = self.ending_balance_sheet();
        bs.debt - bs.cash
    }

    /// Equity raised through scheduled rounds over the horizon
    pub fn equity_issued(&self) -> f64 {
        self.monthly.iter().map(|p| p.cash_flow.equity_issued).sum()
    }

    pub fn summary(&self) -> ProjectionSummary {
        let sum = |f: fn(&MonthlyPeriod) -> f64| -> f64 { self.monthly.iter().map(f).sum() };

        let (min_cash, min_cash_month) = self
            .monthly
            .iter()
            .map(|p| (p.balance_sheet.cash, p.month))
            .fold(None, |acc: Option<(f64, u32)>, (cash, month)| match acc {
                Some((low, _)) if low <= cash => acc,
                _ => Some((cash, month)),
            })
            .unwrap_or((self.opening_balance_sheet.cash, 0));

        let last = self.monthly.last();
        let ending = self.ending_balance_sheet();

        ProjectionSummary {
            total_months: self.monthly.len() as u32,
            total_billings: sum(|p| p.revenue.billings),
            total_net_revenue: sum(|p| p.income_statement.net_revenue),
            total_ebitda: sum(|p| p.income_statement.ebitda),
            total_net_income: sum(|p| p.income_statement.net_income),
            total_fcff: sum(|p| p.free_cash_flow.fcff),
            total_fcfe: sum(|p| p.free_cash_flow.fcfe),
            total_equity_raised: sum(|p| p.cash_flow.equity_issued + p.cash_flow.funding_backstop),
            ending_cash: ending.cash,
            ending_debt: ending.debt,
            ending_headcount: last.map(|p| p.headcount.total_headcount).unwrap_or(0.0),
            ending_arr: last.map(|p| p.revenue.arr()).unwrap_or(0.0),
            min_cash,
            min_cash_month,
        }
    }
}

/// Headline figures for a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub total_months: u32,
    pub total_billings: f64,
    pub total_net_revenue: f64,
    pub total_ebitda: f64,
    pub total_net_income: f64,
    pub total_fcff: f64,
    pub total_fcfe: f64,
    /// Scheduled rounds plus minimum-cash injections
    pub total_equity_raised: f64,
    pub ending_cash: f64,
    pub ending_debt: f64,
    pub ending_headcount: f64,
    pub ending_arr: f64,
    /// Lowest month-end cash and the month it occurs (0 when only the opening exists)
    pub min_cash: f64,
    pub min_cash_month: u32,
}
