//! Scenario files in, CSV and JSON out

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::error::ModelError;
use crate::projection::{AnnualStatement, MonthlyPeriod};
use crate::scenario::{Scenario, ScenarioResult};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Parse and validate a scenario document
pub fn scenario_from_json(json: &str) -> Result<Scenario, IoError> {
    let scenario: Scenario = serde_json::from_str(json)?;
    scenario.validate()?;
    Ok(scenario)
}

pub fn load_scenario(path: impl AsRef<Path>) -> Result<Scenario, IoError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    scenario_from_json(&json)
}

/// Flat CSV row for one month
#[derive(Debug, Serialize)]
struct MonthlyRow {
    month: u32,
    period_start: NaiveDate,
    fiscal_year: u32,
    customers: f64,
    new_customers: f64,
    churned_customers: f64,
    billings: f64,
    arr: f64,
    transactional_revenue: f64,
    professional_services_revenue: f64,
    gross_revenue: f64,
    net_revenue: f64,
    cogs: f64,
    gross_profit: f64,
    operating_expenses: f64,
    ebitda: f64,
    depreciation: f64,
    ebit: f64,
    interest_expense: f64,
    income_tax: f64,
    net_income: f64,
    headcount: f64,
    payroll_cost: f64,
    cash: f64,
    accounts_receivable: f64,
    inventory: f64,
    net_fixed_assets: f64,
    total_assets: f64,
    accounts_payable: f64,
    deferred_revenue: f64,
    debt: f64,
    total_equity: f64,
    operating_cash_flow: f64,
    investing_cash_flow: f64,
    financing_cash_flow: f64,
    funding_backstop: f64,
    net_working_capital: f64,
    change_in_nwc: f64,
    fcff: f64,
    fcfe: f64,
}

impl From<&MonthlyPeriod> for MonthlyRow {
    fn from(p: &MonthlyPeriod) -> Self {
        let is = &p.income_statement;
        let bs = &p.balance_sheet;
        let cf = &p.cash_flow;
        Self {
            month: p.month,
            period_start: p.period_start,
            fiscal_year: p.fiscal_year,
            customers: p.revenue.customers,
            new_customers: p.revenue.new_customers,
            churned_customers: p.revenue.churned_customers,
            billings: p.revenue.billings,
            arr: p.revenue.arr(),
            transactional_revenue: p.revenue.transactional_revenue,
            professional_services_revenue: p.revenue.professional_services_revenue,
            gross_revenue: is.gross_revenue,
            net_revenue: is.net_revenue,
            cogs: is.cogs,
            gross_profit: is.gross_profit,
            operating_expenses: is.operating_expenses,
            ebitda: is.ebitda,
            depreciation: is.depreciation,
            ebit: is.ebit,
            interest_expense: is.interest_expense,
            income_tax: is.income_tax,
            net_income: is.net_income,
            headcount: p.headcount.total_headcount,
            payroll_cost: p.headcount.payroll_cost,
            cash: bs.cash,
            accounts_receivable: bs.accounts_receivable,
            inventory: bs.inventory,
            net_fixed_assets: bs.net_fixed_assets(),
            total_assets: bs.total_assets(),
            accounts_payable: bs.accounts_payable,
            deferred_revenue: bs.deferred_revenue,
            debt: bs.debt,
            total_equity: bs.total_equity(),
            operating_cash_flow: cf.operating_cash_flow,
            investing_cash_flow: cf.investing_cash_flow,
            financing_cash_flow: cf.financing_cash_flow,
            funding_backstop: cf.funding_backstop,
            net_working_capital: p.working_capital.net_working_capital,
            change_in_nwc: p.working_capital.change_in_nwc,
            fcff: p.free_cash_flow.fcff,
            fcfe: p.free_cash_flow.fcfe,
        }
    }
}

#[derive(Debug, Serialize)]
struct AnnualRow {
    fiscal_year: u32,
    months: u32,
    start_date: NaiveDate,
    end_date: NaiveDate,
    billings: f64,
    net_revenue: f64,
    gross_profit: f64,
    ebitda: f64,
    net_income: f64,
    operating_cash_flow: f64,
    fcff: f64,
    fcfe: f64,
    ending_cash: f64,
    ending_debt: f64,
    ending_headcount: f64,
    ending_customers: f64,
    ending_arr: f64,
}

impl From<&AnnualStatement> for AnnualRow {
    fn from(a: &AnnualStatement) -> Self {
        Self {
            fiscal_year: a.fiscal_year,
            months: a.months,
            start_date: a.start_date,
            end_date: a.end_date,
            billings: a.billings,
            net_revenue: a.income_statement.net_revenue,
            gross_profit: a.income_statement.gross_profit,
            ebitda: a.income_statement.ebitda,
            net_income: a.income_statement.net_income,
            operating_cash_flow: a.cash_flow.operating_cash_flow,
            fcff: a.free_cash_flow.fcff,
            fcfe: a.free_cash_flow.fcfe,
            ending_cash: a.balance_sheet.cash,
            ending_debt: a.balance_sheet.debt,
            ending_headcount: a.ending_headcount,
            ending_customers: a.ending_customers,
            ending_arr: a.ending_arr,
        }
    }
}

/// One row per month, header first
pub fn write_monthly_csv<W: Write>(writer: W, periods: &[MonthlyPeriod]) -> Result<(), IoError> {
    let mut csv = csv::Writer::from_writer(writer);
    for period in periods {
        csv.serialize(MonthlyRow::from(period))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_annual_csv<W: Write>(writer: W, years: &[AnnualStatement]) -> Result<(), IoError> {
    let mut csv = csv::Writer::from_writer(writer);
    for year in years {
        csv.serialize(AnnualRow::from(year))?;
    }
    csv.flush()?;
    Ok(())
}

/// Full run output as pretty-printed JSON
pub fn write_result_json<W: Write>(writer: W, result: &ScenarioResult) -> Result<(), IoError> {
    serde_json::to_writer_pretty(writer, result)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{reference_scenario, rich_scenario};

    #[test]
    fn test_scenario_json_is_validated() {
        let json = r#"{"name": "Bad", "start_date": "2025-01-01", "horizon_months": 0}"#;
        match scenario_from_json(json) {
            Err(IoError::Model(e)) => assert!(e.is_recoverable()),
            other => panic!("expected model error, got {:?}", other),
        }
        assert!(matches!(scenario_from_json("{"), Err(IoError::Json(_))));
    }

    #[test]
    fn test_scenario_survives_json() {
        let scenario = rich_scenario();
        let json = serde_json::to_string(&scenario).unwrap();
        assert_eq!(scenario_from_json(&json).unwrap(), scenario);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_scenario("does/not/exist.json").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }

    #[test]
    fn test_monthly_csv_has_one_row_per_month() {
        let result = reference_scenario().run().unwrap();
        let mut buffer = Vec::new();
        write_monthly_csv(&mut buffer, result.periods()).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 13);
        assert!(lines[0].starts_with("month,period_start,fiscal_year,"));
        assert!(lines[1].starts_with("1,2025-01-01,1,"));
    }

    #[test]
    fn test_annual_csv_partial_year() {
        let mut scenario = reference_scenario();
        scenario.horizon_months = 18;
        let result = scenario.run().unwrap();
        let mut buffer = Vec::new();
        write_annual_csv(&mut buffer, result.annual()).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].starts_with("2,6,2026-01-01,2026-06-30,"));
    }

    #[test]
    fn test_result_json_tags_methods() {
        let result = rich_scenario().run().unwrap();
        let mut buffer = Vec::new();
        write_result_json(&mut buffer, &result).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["valuation"]["outcomes"][0]["method"], "dcf");
    }
}
