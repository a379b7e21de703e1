//! Capex engine: purchases and straight-line depreciation tracks

use serde::{Deserialize, Serialize};

use crate::drivers::CapexPlan;

/// A depreciating asset with its remaining monthly charges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetTrack {
    pub name: String,
    pub monthly_charge: f64,
    pub remaining_months: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DepreciationState {
    pub tracks: Vec<AssetTrack>,
}

impl DepreciationState {
    /// Opening net fixed assets depreciate over their remaining life when one is given
    pub fn opening(net_fixed_assets: f64, remaining_life_months: Option<u32>) -> Self {
        let tracks = match remaining_life_months {
            Some(months) if months > 0 && net_fixed_assets > 0.0 => vec![AssetTrack {
                name: "Opening fixed assets".to_string(),
                monthly_charge: net_fixed_assets / months as f64,
                remaining_months: months,
            }],
            _ => Vec::new(),
        };
        Self { tracks }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CapexOutput {
    pub capex: f64,
    pub depreciation: f64,
}

/// Book the month's purchases and charge depreciation, starting in the purchase month
pub fn project_month(plan: &CapexPlan, month: u32, prior: &DepreciationState) -> (CapexOutput, DepreciationState) {
    let mut tracks = prior.tracks.clone();
    let mut output = CapexOutput::default();

    for item in plan.items.iter().filter(|i| i.month == month) {
        output.capex += item.amount;
        tracks.push(AssetTrack {
            name: item.name.clone(),
            monthly_charge: item.monthly_depreciation(),
            remaining_months: item.useful_life_months,
        });
    }

    for track in tracks.iter_mut() {
        output.depreciation += track.monthly_charge;
        track.remaining_months -= 1;
    }
    tracks.retain(|t| t.remaining_months > 0);

    (output, DepreciationState { tracks })
}
