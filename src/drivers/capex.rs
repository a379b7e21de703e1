//! Capital expenditure plan

use serde::{Deserialize, Serialize};

use super::common::{check_month, check_non_negative};
use crate::error::{invalid, Result};

/// A fixed-asset purchase depreciated straight line from its purchase month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapexItem {
    pub name: String,
    pub month: u32,
    pub amount: f64,
    pub useful_life_months: u32,
    #[serde(default)]
    pub salvage_value: f64,
}

impl CapexItem {
    pub fn monthly_depreciation(&self) -> f64 {
        if self.useful_life_months == 0 {
            return 0.0;
        }
        (self.amount - self.salvage_value).max(0.0) / self.useful_life_months as f64
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CapexPlan {
    #[serde(default)]
    pub items: Vec<CapexItem>,
}

impl CapexPlan {
    pub fn spend_in(&self, month: u32) -> f64 {
        self.items.iter().filter(|i| i.month == month).map(|i| i.amount).sum()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (i, item) in self.items.iter().enumerate() {
            let path = format!("capex.items[{}]", i);
            check_month(&format!("{}.month", path), item.month)?;
            check_non_negative(&format!("{}.amount", path), item.amount)?;
            check_non_negative(&format!("{}.salvage_value", path), item.salvage_value)?;
            if item.useful_life_months == 0 {
                return invalid(format!("{}.useful_life_months", path), "useful life must be at least one month");
            }
            if item.salvage_value > item.amount {
                return invalid(format!("{}.salvage_value", path), "salvage value exceeds purchase amount");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_depreciation_net_of_salvage() {
        let item = CapexItem {
            name: "Servers".to_string(),
            month: 1,
            amount: 36_000.0,
            useful_life_months: 36,
            salvage_value: 3_600.0,
        };
        assert!((item.monthly_depreciation() - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_salvage_above_amount_rejected() {
        let plan = CapexPlan {
            items: vec![CapexItem {
                name: "Laptops".to_string(),
                month: 1,
                amount: 1_000.0,
                useful_life_months: 24,
                salvage_value: 2_000.0,
            }],
        };
        assert!(plan.validate().is_err());
    }
}
