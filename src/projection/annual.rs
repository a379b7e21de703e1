//! Fiscal-year aggregation of monthly periods

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::statements::{BalanceSheet, CashFlowStatement, IncomeStatement, MonthlyPeriod};
use super::working_capital::{FreeCashFlow, WorkingCapital};

/// One fiscal year (12 consecutive projection months, fewer for a trailing partial year)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualStatement {
    pub fiscal_year: u32,
    /// Months covered (12 except possibly the last year)
    pub months: u32,
    pub first_month: u32,
    pub last_month: u32,
    pub start_date: NaiveDate,
    /// Last calendar day covered by the year
    pub end_date: NaiveDate,

    /// Flows summed over the year
    pub income_statement: IncomeStatement,
    pub cash_flow: CashFlowStatement,
    pub free_cash_flow: FreeCashFlow,
    pub billings: f64,

    /// Stocks at the last month of the year
    pub balance_sheet: BalanceSheet,
    pub working_capital: WorkingCapital,
    pub ending_headcount: f64,
    pub ending_customers: f64,
    pub ending_arr: f64,
}

/// Day before the following period starts
fn period_end(period_start: NaiveDate) -> NaiveDate {
    period_start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(period_start)
}

fn aggregate_year(fiscal_year: u32, months: &[MonthlyPeriod]) -> Option<AnnualStatement> {
    let first = months.first()?;
    let last = months.last()?;

    let mut income_statement = IncomeStatement::default();
    let mut cash_flow = CashFlowStatement {
        beginning_cash: first.cash_flow.beginning_cash,
        ..Default::default()
    };
    let mut free_cash_flow = FreeCashFlow::default();
    let mut change_in_nwc = 0.0;
    let mut billings = 0.0;

    for period in months {
        income_statement.accumulate(&period.income_statement);
        cash_flow.accumulate(&period.cash_flow);
        free_cash_flow.accumulate(&period.free_cash_flow);
        change_in_nwc += period.working_capital.change_in_nwc;
        billings += period.revenue.billings;
    }

    Some(AnnualStatement {
        fiscal_year,
        months: months.len() as u32,
        first_month: first.month,
        last_month: last.month,
        start_date: first.period_start,
        end_date: period_end(last.period_start),
        income_statement,
        cash_flow,
        free_cash_flow,
        billings,
        balance_sheet: last.balance_sheet.clone(),
        working_capital: WorkingCapital {
            change_in_nwc,
            ..last.working_capital.clone()
        },
        ending_headcount: last.headcount.total_headcount,
        ending_customers: last.revenue.customers - last.revenue.churned_customers,
        ending_arr: last.revenue.arr(),
    })
}

/// Group monthly periods into fiscal years of 12 consecutive months
pub fn aggregate_annual(monthly: &[MonthlyPeriod]) -> Vec<AnnualStatement> {
    monthly
        .chunks(12)
        .enumerate()
        .filter_map(|(i, chunk)| aggregate_year(i as u32 + 1, chunk))
        .collect()
}
