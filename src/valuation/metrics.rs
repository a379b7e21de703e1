//! Metric extraction from a finished projection

use crate::drivers::{Metric, MetricWindow};
use crate::projection::{MonthlyPeriod, ProjectionResult};

/// Monthly value of a metric in one period
pub fn monthly_value(period: &MonthlyPeriod, metric: Metric) -> f64 {
    let is = &period.income_statement;
    match metric {
        Metric::NetRevenue => is.net_revenue,
        Metric::GrossProfit => is.gross_profit,
        Metric::Ebitda => is.ebitda,
        Metric::NetIncome => is.net_income,
        Metric::Arr => period.revenue.arr(),
        Metric::Fcff => period.free_cash_flow.fcff,
    }
}

/// Annualise a monthly series over a window
///
/// Trailing twelve months sums the last twelve values, scaling up when fewer
/// than twelve exist. Run-rate is the last value times twelve.
pub fn annualise(values: &[f64], window: MetricWindow) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    match window {
        MetricWindow::TrailingTwelveMonths => {
            let tail = &values[values.len().saturating_sub(12)..];
            tail.iter().sum::<f64>() * 12.0 / tail.len() as f64
        }
        MetricWindow::RunRate => values[values.len() - 1] * 12.0,
    }
}

/// Annual value of a metric at the end of the projection
///
/// ARR is already an annual point-in-time figure, so it is read from the last
/// month under either window.
pub fn measure(projection: &ProjectionResult, metric: Metric, window: MetricWindow) -> f64 {
    if metric == Metric::Arr {
        return projection.monthly.last().map(|p| p.revenue.arr()).unwrap_or(0.0);
    }
    let values: Vec<f64> = projection.monthly.iter().map(|p| monthly_value(p, metric)).collect();
    annualise(&values, window)
}
