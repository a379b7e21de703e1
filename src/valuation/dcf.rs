//! Discounted cash flow valuation with side-by-side terminal values

use serde::{Deserialize, Serialize};

use super::discount::DiscountCurve;
use super::metrics::{annualise, measure};
use crate::drivers::{CashFlowBasis, DcfInputs, MetricWindow, TerminalValueMethod};
use crate::error::{invalid, Result};
use crate::projection::ProjectionResult;

/// One explicit-period flow with its discounting trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountedFlow {
    pub month: u32,
    pub cash_flow: f64,
    pub discount_factor: f64,
    pub present_value: f64,
}

/// Valuation under one terminal-value method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalValuation {
    pub method: TerminalValueMethod,
    /// Annual flow or metric the terminal value is built from
    pub terminal_base: f64,
    /// Terminal value at the horizon, on the same basis as the discounted flows
    pub terminal_value: f64,
    pub discount_factor: f64,
    pub present_value: f64,
    pub enterprise_value: f64,
    pub equity_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfResult {
    pub basis: CashFlowBasis,
    pub discount_rate: f64,
    pub flows: Vec<DiscountedFlow>,
    /// Sum of discounted explicit-period flows
    pub explicit_present_value: f64,
    /// Ending debt less ending cash
    pub net_debt: f64,
    pub terminals: Vec<TerminalValuation>,
}

/// Discount a monthly series; the first element falls in month 1
pub fn discount_cash_flows(cash_flows: &[f64], discount_rate: f64) -> Vec<DiscountedFlow> {
    let curve = DiscountCurve::single_rate(discount_rate);
    cash_flows
        .iter()
        .zip(1u32..)
        .map(|(&cash_flow, month)| {
            let discount_factor = curve.discount_to_month(month);
            DiscountedFlow {
                month,
                cash_flow,
                discount_factor,
                present_value: cash_flow * discount_factor,
            }
        })
        .collect()
}

/// Gordon growth terminal value: `flow × (1 + g) / (r − g)`
pub fn perpetuity_growth_value(terminal_flow: f64, discount_rate: f64, growth_rate: f64) -> Result<f64> {
    if discount_rate <= growth_rate {
        return invalid(
            "valuation.dcf.growth_rate",
            format!(
                "perpetuity growth requires discount rate ({}) above growth rate ({})",
                discount_rate, growth_rate
            ),
        );
    }
    Ok(terminal_flow * (1.0 + growth_rate) / (discount_rate - growth_rate))
}

/// Value a projection by discounting its FCFF or FCFE
///
/// On an FCFF basis the discounted total is enterprise value and equity value
/// is EV less net debt. On an FCFE basis the discounted total is equity value
/// and EV adds net debt back. Exit-multiple terminal values are enterprise
/// values, so on an FCFE basis net debt is taken off before discounting.
pub fn value(inputs: &DcfInputs, projection: &ProjectionResult) -> Result<DcfResult> {
    let series: Vec<f64> = projection
        .monthly
        .iter()
        .map(|p| match inputs.basis {
            CashFlowBasis::Fcff => p.free_cash_flow.fcff,
            CashFlowBasis::Fcfe => p.free_cash_flow.fcfe,
        })
        .collect();

    let flows = discount_cash_flows(&series, inputs.discount_rate);
    let explicit_present_value: f64 = flows.iter().map(|f| f.present_value).sum();
    let net_debt = projection.net_debt();
    let horizon = projection.monthly.len() as u32;
    let horizon_factor = DiscountCurve::single_rate(inputs.discount_rate).discount_to_month(horizon);
    let terminal_flow = annualise(&series, MetricWindow::TrailingTwelveMonths);

    let mut terminals = Vec::with_capacity(inputs.terminal_methods.len());
    for method in &inputs.terminal_methods {
        let (terminal_base, terminal_value) = match method {
            TerminalValueMethod::PerpetuityGrowth { growth_rate } => (
                terminal_flow,
                perpetuity_growth_value(terminal_flow, inputs.discount_rate, *growth_rate)?,
            ),
            TerminalValueMethod::ExitMultiple { metric, window, multiple } => {
                let base = measure(projection, *metric, *window);
                let enterprise = base * multiple;
                let value = match inputs.basis {
                    CashFlowBasis::Fcff => enterprise,
                    CashFlowBasis::Fcfe => enterprise - net_debt,
                };
                (base, value)
            }
        };

        let present_value = terminal_value * horizon_factor;
        let discounted_total = explicit_present_value + present_value;
        let (enterprise_value, equity_value) = match inputs.basis {
            CashFlowBasis::Fcff => (discounted_total, discounted_total - net_debt),
            CashFlowBasis::Fcfe => (discounted_total + net_debt, discounted_total),
        };

        terminals.push(TerminalValuation {
            method: method.clone(),
            terminal_base,
            terminal_value,
            discount_factor: horizon_factor,
            present_value,
            enterprise_value,
            equity_value,
        });
    }

    Ok(DcfResult {
        basis: inputs.basis,
        discount_rate: inputs.discount_rate,
        flows,
        explicit_present_value,
        net_debt,
        terminals,
    })
}
