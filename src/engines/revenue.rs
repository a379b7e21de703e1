//! Revenue engine: subscription drivers to billings, recognition and deferred revenue
//!
//! Each stream keeps a deferral waterfall: `waterfall[k]` is the amount of
//! already-billed revenue that will be recognised `k` months after the current
//! month. Billing a month spreads its amount over the waterfall using the
//! stream's deferral weights; recognition pops the head of the waterfall.

use serde::{Deserialize, Serialize};

use crate::drivers::{RevenuePlan, RevenueStream};
use crate::error::{invalid, Result};

/// Carry-in state of one stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamState {
    /// Customers active at the start of the next month
    pub customers: f64,
    /// Cumulative per-customer billing multiplier (price growth, expansion, contraction)
    pub billing_multiplier: f64,
    pub waterfall: Vec<f64>,
}

/// Carry-in state of the whole revenue plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueState {
    pub streams: Vec<StreamState>,
    /// Release schedule of the opening deferred revenue balance
    pub opening_release: Vec<f64>,
}

impl RevenueState {
    /// State before month 1
    pub fn opening(plan: &RevenuePlan, opening_deferred: f64, release_months: u32) -> Self {
        let streams = plan
            .streams
            .iter()
            .map(|s| StreamState {
                customers: s.starting_customers,
                billing_multiplier: 1.0,
                waterfall: Vec::new(),
            })
            .collect();

        let opening_release = if opening_deferred > 0.0 {
            let n = release_months.max(1) as usize;
            vec![opening_deferred / n as f64; n]
        } else {
            Vec::new()
        };

        Self {
            streams,
            opening_release,
        }
    }

    /// Billed but not yet recognised revenue
    pub fn deferred_balance(&self) -> f64 {
        let streams: f64 = self.streams.iter().flat_map(|s| s.waterfall.iter()).sum();
        streams + self.opening_release.iter().sum::<f64>()
    }
}

/// Revenue figures for one stream in one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRevenue {
    pub name: String,
    /// Customers billed this month (opening plus new)
    pub customers: f64,
    pub new_customers: f64,
    pub churned_customers: f64,
    pub discounts: f64,
    /// Subscription billings net of discounts
    pub subscription_billings: f64,
    pub services_billings: f64,
    /// Usage fees, recognised in the month
    pub transactional_billings: f64,
    pub billings: f64,
    /// Subscription revenue recognised this month
    pub recurring_revenue: f64,
    pub recognized_revenue: f64,
    pub deferred_balance: f64,
}

/// Revenue engine output for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueOutput {
    pub streams: Vec<StreamRevenue>,
    pub billings: f64,
    pub recognized_revenue: f64,
    /// Recognised subscription revenue (MRR)
    pub recurring_revenue: f64,
    pub services_revenue: f64,
    pub transactional_revenue: f64,
    pub professional_services_revenue: f64,
    pub other_revenue: f64,
    pub deferred_revenue_balance: f64,
    pub customers: f64,
    pub new_customers: f64,
    pub churned_customers: f64,
}

impl RevenueOutput {
    pub fn arr(&self) -> f64 {
        self.recurring_revenue * 12.0
    }

    /// Average recognised subscription revenue per billed customer
    pub fn arpa(&self) -> f64 {
        if self.customers > 0.0 {
            self.recurring_revenue / self.customers
        } else {
            0.0
        }
    }
}

/// Spread `amount` over the waterfall, then release the current month
fn bill_and_recognize(waterfall: &[f64], weights: &[f64], amount: f64) -> (f64, Vec<f64>) {
    let len = waterfall.len().max(weights.len());
    let mut next = vec![0.0; len];
    next[..waterfall.len()].copy_from_slice(waterfall);
    for (slot, w) in next.iter_mut().zip(weights) {
        *slot += amount * w;
    }
    if next.is_empty() {
        return (0.0, next);
    }
    let recognized = next.remove(0);
    (recognized, next)
}

fn release(waterfall: &[f64]) -> (f64, Vec<f64>) {
    match waterfall.split_first() {
        Some((head, rest)) => (*head, rest.to_vec()),
        None => (0.0, Vec::new()),
    }
}

fn project_stream(
    stream: &RevenueStream,
    index: usize,
    month: u32,
    prior: &StreamState,
) -> Result<(StreamRevenue, StreamState)> {
    let new_customers = stream.new_customers.value_for(month);
    if new_customers < 0.0 {
        return invalid(
            format!("revenue.streams[{}].new_customers", index),
            format!("stream '{}' would acquire {} customers in month {}", stream.name, new_customers, month),
        );
    }

    let customers = prior.customers + new_customers;
    let price = stream.price * prior.billing_multiplier * stream.seasonality.factor(month);
    let gross = customers * price;
    let discounts = gross * stream.discount_rate.value_for(month);
    let subscription_billings = gross - discounts;

    let services_billings = stream
        .services
        .as_ref()
        .map(|s| s.attach_rate * new_customers * s.average_price)
        .unwrap_or(0.0);
    let transactional_billings = stream
        .transactional
        .as_ref()
        .map(|t| t.billings_for(month))
        .unwrap_or(0.0);

    let (recurring_revenue, waterfall) =
        bill_and_recognize(&prior.waterfall, &stream.deferral.weights, subscription_billings);

    let churned_customers = customers * stream.churn_rate.value_for(month);
    let growth = stream.price_growth_rate.value_for(month) + stream.expansion_rate.value_for(month)
        - stream.contraction_rate.value_for(month);

    let next = StreamState {
        customers: customers - churned_customers,
        billing_multiplier: prior.billing_multiplier * (1.0 + growth),
        waterfall,
    };

    let row = StreamRevenue {
        name: stream.name.clone(),
        customers,
        new_customers,
        churned_customers,
        discounts,
        subscription_billings,
        services_billings,
        transactional_billings,
        billings: subscription_billings + services_billings + transactional_billings,
        recurring_revenue,
        recognized_revenue: recurring_revenue + services_billings + transactional_billings,
        deferred_balance: next.waterfall.iter().sum(),
    };

    Ok((row, next))
}

/// Project one month of revenue from the prior month's carry-in state
pub fn project_month(plan: &RevenuePlan, month: u32, prior: &RevenueState) -> Result<(RevenueOutput, RevenueState)> {
    let mut rows = Vec::with_capacity(plan.streams.len());
    let mut next_streams = Vec::with_capacity(plan.streams.len());

    for (index, (stream, state)) in plan.streams.iter().zip(&prior.streams).enumerate() {
        let (row, next) = project_stream(stream, index, month, state)?;
        rows.push(row);
        next_streams.push(next);
    }

    let (opening_released, opening_release) = release(&prior.opening_release);
    let other_revenue = plan.other_recurring_revenue.value_for(month);
    let professional_services_revenue = plan.professional_services_revenue.value_for(month);

    let recurring_revenue: f64 = rows.iter().map(|r| r.recurring_revenue).sum();
    let services_revenue: f64 = rows.iter().map(|r| r.services_billings).sum();
    let transactional_revenue: f64 = rows.iter().map(|r| r.transactional_billings).sum();
    let stream_billings: f64 = rows.iter().map(|r| r.billings).sum();
    let immediate = other_revenue + professional_services_revenue;

    let next = RevenueState {
        streams: next_streams,
        opening_release,
    };

    let output = RevenueOutput {
        billings: stream_billings + immediate,
        recognized_revenue: recurring_revenue
            + services_revenue
            + transactional_revenue
            + immediate
            + opening_released,
        recurring_revenue,
        services_revenue,
        transactional_revenue,
        professional_services_revenue,
        other_revenue: other_revenue + opening_released,
        deferred_revenue_balance: next.deferred_balance(),
        customers: rows.iter().map(|r| r.customers).sum(),
        new_customers: rows.iter().map(|r| r.new_customers).sum(),
        churned_customers: rows.iter().map(|r| r.churned_customers).sum(),
        streams: rows,
    };

    Ok((output, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{DeferralSchedule, MonthlySchedule, ServicesRevenue, TransactionalRevenue};
    use approx::assert_abs_diff_eq;

    fn plan(stream: RevenueStream) -> RevenuePlan {
        RevenuePlan::with_streams(vec![stream])
    }

    fn run(plan: &RevenuePlan, months: u32) -> Vec<RevenueOutput> {
        let mut state = RevenueState::opening(plan, 0.0, 1);
        let mut out = Vec::new();
        for month in 1..=months {
            let (row, next) = project_month(plan, month, &state).unwrap();
            out.push(row);
            state = next;
        }
        out
    }

    #[test]
    fn test_immediate_recognition_matches_billings() {
        let mut stream = RevenueStream::subscription("core", 100.0, 100.0);
        stream.churn_rate = MonthlySchedule::constant(0.05);
        let rows = run(&plan(stream), 3);

        assert_abs_diff_eq!(rows[0].billings, 10_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[0].recognized_revenue, 10_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[1].recognized_revenue, 9_500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[2].recognized_revenue, 9_025.0, epsilon = 1e-9);
        for row in &rows {
            assert_eq!(row.deferred_revenue_balance, 0.0);
            assert_eq!(row.billings, row.recognized_revenue);
        }
    }

    #[test]
    fn test_straight_line_deferral_builds_balance() {
        let mut stream = RevenueStream::subscription("annual", 12.0, 100.0);
        stream.deferral = DeferralSchedule::straight_line(3);
        let rows = run(&plan(stream), 4);

        // 1200 billed monthly, 400 of each month's billing recognised per month
        assert_abs_diff_eq!(rows[0].recognized_revenue, 400.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[0].deferred_revenue_balance, 800.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[1].recognized_revenue, 800.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[2].recognized_revenue, 1_200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[3].deferred_revenue_balance, 1_200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_deferred_balance_rolls_forward() {
        let mut stream = RevenueStream::subscription("annual", 10.0, 90.0);
        stream.new_customers = MonthlySchedule::constant(2.0);
        stream.deferral = DeferralSchedule { weights: vec![0.5, 0.3, 0.2] };
        let rows = run(&plan(stream), 6);

        let mut prior = 0.0;
        for row in &rows {
            assert_abs_diff_eq!(
                row.deferred_revenue_balance,
                prior + row.billings - row.recognized_revenue,
                epsilon = 1e-9
            );
            prior = row.deferred_revenue_balance;
        }
    }

    #[test]
    fn test_deferred_balance_drains_after_billing_stops() {
        let mut stream = RevenueStream::subscription("annual", 10.0, 100.0);
        stream.churn_rate = MonthlySchedule::constant(0.0).with_override(2, 1.0);
        stream.deferral = DeferralSchedule::straight_line(4);
        let rows = run(&plan(stream), 8);

        assert!(rows[1].deferred_revenue_balance > 0.0);
        // Last billing in month 2 fully released by month 5
        assert_eq!(rows[4].deferred_revenue_balance, 0.0);
        assert_eq!(rows[7].deferred_revenue_balance, 0.0);
        assert!(rows.iter().all(|r| r.deferred_revenue_balance >= 0.0));
    }

    #[test]
    fn test_expansion_and_price_growth_compound() {
        let mut stream = RevenueStream::subscription("core", 10.0, 100.0);
        stream.expansion_rate = MonthlySchedule::constant(0.02);
        stream.price_growth_rate = MonthlySchedule::constant(0.01);
        let rows = run(&plan(stream), 3);

        assert_abs_diff_eq!(rows[0].billings, 1_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[1].billings, 1_030.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[2].billings, 1_000.0 * 1.03 * 1.03, epsilon = 1e-9);
    }

    #[test]
    fn test_new_customers_and_services() {
        let mut stream = RevenueStream::subscription("core", 0.0, 50.0);
        stream.new_customers = MonthlySchedule::constant(4.0);
        stream.services = Some(ServicesRevenue { attach_rate: 0.5, average_price: 1_000.0 });
        let rows = run(&plan(stream), 2);

        assert_eq!(rows[0].customers, 4.0);
        assert_eq!(rows[1].customers, 8.0);
        assert_abs_diff_eq!(rows[0].services_revenue, 2_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[0].recognized_revenue, 2_200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_usage_fees_billed_and_recognised_outside_arr() {
        let mut stream = RevenueStream::subscription("payments", 10.0, 100.0);
        stream.deferral = DeferralSchedule::straight_line(2);
        stream.transactional = Some(TransactionalRevenue {
            volume: MonthlySchedule::constant(2_000.0).with_override(2, 5_000.0),
            fee: 0.25,
        });
        let rows = run(&plan(stream), 2);

        assert_abs_diff_eq!(rows[0].transactional_revenue, 500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[1].transactional_revenue, 1_250.0, epsilon = 1e-9);
        // 1000 subscription billed, half deferred; usage fees never deferred
        assert_abs_diff_eq!(rows[0].billings, 1_500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[0].recognized_revenue, 1_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[0].deferred_revenue_balance, 500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[0].arr(), 6_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[1].arr(), 12_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[0].streams[0].transactional_billings, 500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_professional_services_recognised_in_month() {
        let mut plan = plan(RevenueStream::subscription("core", 10.0, 100.0));
        plan.professional_services_revenue = MonthlySchedule::zero().with_override(2, 7_500.0);
        let rows = run(&plan, 3);

        assert_eq!(rows[0].professional_services_revenue, 0.0);
        assert_abs_diff_eq!(rows[1].professional_services_revenue, 7_500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[1].billings, 8_500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[1].recognized_revenue, 8_500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[1].arr(), 12_000.0, epsilon = 1e-9);
        assert_eq!(rows[1].deferred_revenue_balance, 0.0);
        assert_abs_diff_eq!(rows[2].recognized_revenue, 1_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_acquisition_is_validation_error() {
        let mut stream = RevenueStream::subscription("core", 10.0, 50.0);
        stream.new_customers = MonthlySchedule::constant(1.0).with_override(2, -3.0);
        let plan = plan(stream);
        let state = RevenueState::opening(&plan, 0.0, 1);
        let (_, state) = project_month(&plan, 1, &state).unwrap();
        let err = project_month(&plan, 2, &state).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_opening_deferred_released_straight_line() {
        let plan = RevenuePlan::default();
        let state = RevenueState::opening(&plan, 900.0, 3);
        let (row, state) = project_month(&plan, 1, &state).unwrap();
        assert_abs_diff_eq!(row.recognized_revenue, 300.0, epsilon = 1e-9);
        assert_abs_diff_eq!(row.deferred_revenue_balance, 600.0, epsilon = 1e-9);
        assert_eq!(row.billings, 0.0);
        assert_abs_diff_eq!(state.deferred_balance(), 600.0, epsilon = 1e-9);
    }
}
