//! Discount curve for monthly cash-flow series

use serde::{Deserialize, Serialize};

/// Flat annual discount rate applied with monthly compounding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountCurve {
    /// Annual discount rate (WACC or cost of equity)
    pub annual_rate: f64,
}

impl DiscountCurve {
    pub fn single_rate(annual_rate: f64) -> Self {
        Self { annual_rate }
    }

    /// Discount factor to the end of projection month `month`: (1 + r)^(-month / 12)
    pub fn discount_to_month(&self, month: u32) -> f64 {
        (1.0 + self.annual_rate).powf(-(month as f64) / 12.0)
    }

    /// Present value of a monthly series whose first element falls in month 1
    pub fn present_value(&self, cash_flows: &[f64]) -> f64 {
        cash_flows
            .iter()
            .zip(1u32..)
            .map(|(amount, month)| amount * self.discount_to_month(month))
            .sum()
    }
}
