//! Read-only summaries over a finished run
//!
//! Nothing here feeds back into the projection; every function takes a
//! completed [`ScenarioResult`] and slices it for presentation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::drivers::{Metric, MetricWindow, TerminalValueMethod};
use crate::projection::MonthlyPeriod;
use crate::scenario::ScenarioResult;
use crate::valuation::ValuationOutcome;

/// Months of history used for trailing unit economics and burn
const TRAILING_MONTHS: usize = 12;
const BURN_WINDOW: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenuePoint {
    pub month: u32,
    pub period_start: NaiveDate,
    pub recognized_revenue: f64,
    pub billings: f64,
    pub arr: f64,
    pub customers: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashPoint {
    pub month: u32,
    pub period_start: NaiveDate,
    pub cash: f64,
    /// Operating plus investing outflow, positive when burning
    pub burn: f64,
    /// Months of cash left at the trailing average burn; `None` when not burning
    pub runway_months: Option<f64>,
}

/// One headline value from a valuation method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationLine {
    pub method: String,
    pub label: String,
    pub enterprise_value: Option<f64>,
    pub equity_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitEconomics {
    /// Gross profit over net revenue across the trailing window
    pub gross_margin: f64,
    /// Recurring revenue per customer in the last month
    pub arpa: f64,
    /// Average monthly churn across the trailing window
    pub monthly_churn: f64,
    /// Sales and marketing spend per new customer
    pub cac: Option<f64>,
    /// Gross-margin lifetime value of a customer
    pub ltv: Option<f64>,
    pub ltv_to_cac: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub scenario: String,
    pub revenue: Vec<RevenuePoint>,
    pub cash: Vec<CashPoint>,
    pub valuation: Vec<ValuationLine>,
    pub unit_economics: UnitEconomics,
}

pub fn revenue_trend(result: &ScenarioResult) -> Vec<RevenuePoint> {
    result
        .periods()
        .iter()
        .map(|p| RevenuePoint {
            month: p.month,
            period_start: p.period_start,
            recognized_revenue: p.revenue.recognized_revenue,
            billings: p.revenue.billings,
            arr: p.revenue.arr(),
            customers: p.revenue.customers,
        })
        .collect()
}

pub fn cash_trend(result: &ScenarioResult) -> Vec<CashPoint> {
    let periods = result.periods();
    periods
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let window = &periods[(i + 1).saturating_sub(BURN_WINDOW)..=i];
            let average_burn = window.iter().map(|w| w.cash_flow.burn()).sum::<f64>() / window.len() as f64;
            let cash = p.balance_sheet.cash;
            CashPoint {
                month: p.month,
                period_start: p.period_start,
                cash,
                burn: p.cash_flow.burn(),
                runway_months: (average_burn > 0.0).then(|| cash.max(0.0) / average_burn),
            }
        })
        .collect()
}

fn metric_name(metric: Metric) -> &'static str {
    match metric {
        Metric::NetRevenue => "net revenue",
        Metric::GrossProfit => "gross profit",
        Metric::Ebitda => "EBITDA",
        Metric::NetIncome => "net income",
        Metric::Arr => "ARR",
        Metric::Fcff => "FCFF",
    }
}

fn window_name(window: MetricWindow) -> &'static str {
    match window {
        MetricWindow::TrailingTwelveMonths => "TTM",
        MetricWindow::RunRate => "run-rate",
    }
}

fn terminal_label(method: &TerminalValueMethod) -> String {
    match method {
        TerminalValueMethod::PerpetuityGrowth { growth_rate } => {
            format!("perpetuity growth {:.1}%", growth_rate * 100.0)
        }
        TerminalValueMethod::ExitMultiple { metric, window, multiple } => {
            format!("exit {:.1}x {} {}", multiple, window_name(*window), metric_name(*metric))
        }
    }
}

/// One line per enterprise or equity value the run produced, in method order
pub fn valuation_summary(result: &ScenarioResult) -> Vec<ValuationLine> {
    let mut lines = Vec::new();
    for outcome in &result.valuation.outcomes {
        let method = outcome.name().to_string();
        match outcome {
            ValuationOutcome::Dcf(dcf) => {
                for terminal in &dcf.terminals {
                    lines.push(ValuationLine {
                        method: method.clone(),
                        label: terminal_label(&terminal.method),
                        enterprise_value: Some(terminal.enterprise_value),
                        equity_value: terminal.equity_value,
                    });
                }
            }
            ValuationOutcome::Multiples(multiples) => {
                for application in &multiples.applications {
                    lines.push(ValuationLine {
                        method: method.clone(),
                        label: format!(
                            "{:.1}x {} {}",
                            application.multiple,
                            window_name(application.window),
                            metric_name(application.metric)
                        ),
                        enterprise_value: Some(application.enterprise_value),
                        equity_value: application.equity_value,
                    });
                }
            }
            ValuationOutcome::VcMethod(vc) => {
                lines.push(ValuationLine {
                    method: method.clone(),
                    label: "pre-money".to_string(),
                    enterprise_value: None,
                    equity_value: vc.pre_money,
                });
                lines.push(ValuationLine {
                    method,
                    label: "post-money".to_string(),
                    enterprise_value: None,
                    equity_value: vc.post_money,
                });
            }
            ValuationOutcome::Scorecard(scorecard) => {
                lines.push(ValuationLine {
                    method,
                    label: format!("score {:.2} x DCF equity", scorecard.total_score),
                    enterprise_value: None,
                    equity_value: scorecard.valuation,
                });
            }
        }
    }
    lines
}

fn acquisition_spend(period: &MonthlyPeriod) -> f64 {
    period
        .costs
        .by_center
        .iter()
        .filter(|c| c.cost_center.is_acquisition())
        .map(|c| c.amount)
        .sum()
}

/// Unit economics over the last twelve months (or the whole run if shorter)
///
/// LTV is ARPA times gross margin over monthly churn. CAC and LTV are absent
/// when there were no new customers or no churn.
pub fn unit_economics(result: &ScenarioResult) -> UnitEconomics {
    let periods = result.periods();
    let window = &periods[periods.len().saturating_sub(TRAILING_MONTHS)..];

    let net_revenue: f64 = window.iter().map(|p| p.income_statement.net_revenue).sum();
    let gross_profit: f64 = window.iter().map(|p| p.income_statement.gross_profit).sum();
    let gross_margin = if net_revenue != 0.0 { gross_profit / net_revenue } else { 0.0 };

    let billed: f64 = window.iter().map(|p| p.revenue.customers).sum();
    let churned: f64 = window.iter().map(|p| p.revenue.churned_customers).sum();
    let monthly_churn = if billed > 0.0 { churned / billed } else { 0.0 };

    let new_customers: f64 = window.iter().map(|p| p.revenue.new_customers).sum();
    let spend: f64 = window.iter().map(acquisition_spend).sum();
    let cac = (new_customers > 0.0).then(|| spend / new_customers);

    let arpa = periods.last().map(|p| p.revenue.arpa()).unwrap_or(0.0);
    let ltv = (monthly_churn > 0.0).then(|| arpa * gross_margin / monthly_churn);
    let ltv_to_cac = match (ltv, cac) {
        (Some(ltv), Some(cac)) if cac > 0.0 => Some(ltv / cac),
        _ => None,
    };

    UnitEconomics {
        gross_margin,
        arpa,
        monthly_churn,
        cac,
        ltv,
        ltv_to_cac,
    }
}

pub fn build(result: &ScenarioResult) -> Dashboard {
    Dashboard {
        scenario: result.projection.scenario.clone(),
        revenue: revenue_trend(result),
        cash: cash_trend(result),
        valuation: valuation_summary(result),
        unit_economics: unit_economics(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{reference_scenario, rich_scenario};
    use approx::assert_relative_eq;

    #[test]
    fn test_revenue_trend_tracks_periods() {
        let result = reference_scenario().run().unwrap();
        let trend = revenue_trend(&result);
        assert_eq!(trend.len(), 12);
        assert_eq!(trend[0].month, 1);
        assert_relative_eq!(trend[0].recognized_revenue, 10_000.0, max_relative = 1e-12);
        assert_relative_eq!(trend[0].arr, 120_000.0, max_relative = 1e-12);
        assert!(trend.windows(2).all(|w| w[1].customers < w[0].customers));
    }

    #[test]
    fn test_runway_uses_trailing_burn() {
        let result = reference_scenario().run().unwrap();
        let cash = cash_trend(&result);
        // month 1 breaks even
        assert!(cash[0].runway_months.is_none());

        let last = &cash[11];
        let periods = result.periods();
        let average_burn: f64 = periods[9..12].iter().map(|p| p.cash_flow.burn()).sum::<f64>() / 3.0;
        assert!(average_burn > 0.0);
        assert_relative_eq!(last.runway_months.unwrap(), last.cash / average_burn, max_relative = 1e-12);
    }

    #[test]
    fn test_unit_economics_reference() {
        let result = reference_scenario().run().unwrap();
        let economics = unit_economics(&result);
        assert_relative_eq!(economics.gross_margin, 1.0, max_relative = 1e-12);
        assert_relative_eq!(economics.monthly_churn, 0.05, max_relative = 1e-9);
        assert_relative_eq!(economics.arpa, 100.0, max_relative = 1e-12);
        assert_relative_eq!(economics.ltv.unwrap(), 2_000.0, max_relative = 1e-9);
        // no acquisition
        assert!(economics.cac.is_none());
        assert!(economics.ltv_to_cac.is_none());
    }

    #[test]
    fn test_rich_dashboard() {
        let result = rich_scenario().run().unwrap();
        let dashboard = build(&result);
        assert_eq!(dashboard.scenario, "Rich");
        assert_eq!(dashboard.revenue.len(), 24);
        assert_eq!(dashboard.cash.len(), 24);

        // two DCF terminals, two multiples, pre and post money, scorecard
        assert_eq!(dashboard.valuation.len(), 7);
        assert_eq!(dashboard.valuation[0].method, "dcf");
        assert_eq!(dashboard.valuation[5].label, "post-money");
        assert!(dashboard.valuation[5].equity_value > dashboard.valuation[4].equity_value);
        assert_eq!(dashboard.valuation[6].method, "scorecard");
        assert_eq!(dashboard.valuation[6].label, "score 1.03 x DCF equity");

        let economics = &dashboard.unit_economics;
        assert!(economics.cac.unwrap() > 0.0);
        assert!(economics.ltv.unwrap() > 0.0);
        assert!(economics.gross_margin > 0.0 && economics.gross_margin < 1.0);
    }
}
