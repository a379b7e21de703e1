//! Headcount engine: roster roll-forward and payroll cost per functional area

use serde::{Deserialize, Serialize};

use crate::drivers::{CostAllocation, HeadcountPlan, HEADCOUNT_EPSILON};
use crate::error::{invalid, Result};

/// Closing headcount per area, aligned with `HeadcountPlan::areas`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadcountState {
    pub headcount: Vec<f64>,
}

impl HeadcountState {
    pub fn opening(plan: &HeadcountPlan) -> Self {
        Self {
            headcount: plan.areas.iter().map(|a| a.opening_headcount).collect(),
        }
    }

    pub fn total(&self) -> f64 {
        self.headcount.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaHeadcount {
    pub area: String,
    pub allocation: CostAllocation,
    /// Closing headcount for the month
    pub headcount: f64,
    pub hires: f64,
    pub departures: f64,
    /// Full-time equivalents paid this month after hire ramp
    pub paid_fte: f64,
    pub cost_per_head: f64,
    pub payroll_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadcountOutput {
    pub areas: Vec<AreaHeadcount>,
    pub total_headcount: f64,
    pub hires: f64,
    pub departures: f64,
    pub payroll_cost: f64,
    pub payroll_cogs: f64,
    pub payroll_opex: f64,
}

impl HeadcountOutput {
    /// Headcount of a named area, if it exists
    pub fn area(&self, name: &str) -> Option<&AreaHeadcount> {
        self.areas.iter().find(|a| a.area == name)
    }
}

/// Apply one month of hire and departure events
///
/// Departures leave at the start of the month and are not paid. Hires are paid
/// their ramp fraction of a full month in the hire month.
pub fn project_month(
    plan: &HeadcountPlan,
    month: u32,
    prior: &HeadcountState,
) -> Result<(HeadcountOutput, HeadcountState)> {
    let mut output = HeadcountOutput::default();
    let mut closing = Vec::with_capacity(plan.areas.len());

    for (index, (area, opening)) in plan.areas.iter().zip(&prior.headcount).enumerate() {
        let (hires, ramped_hires, departures) = area.events_in(month);
        let headcount = opening + hires - departures;
        if headcount < -HEADCOUNT_EPSILON {
            return invalid(
                format!("headcount.areas[{}].events", index),
                format!(
                    "area '{}' would have {} heads in month {} ({} departures against {} available)",
                    area.area,
                    headcount,
                    month,
                    departures,
                    opening + hires
                ),
            );
        }
        let headcount = headcount.max(0.0);

        let paid_fte = (headcount - hires + ramped_hires).max(0.0);
        let cost_per_head = area.monthly_cost_per_head(month);
        let payroll_cost = paid_fte * cost_per_head;

        match area.allocation {
            CostAllocation::Cogs => output.payroll_cogs += payroll_cost,
            CostAllocation::Opex => output.payroll_opex += payroll_cost,
        }
        output.total_headcount += headcount;
        output.hires += hires;
        output.departures += departures;
        output.payroll_cost += payroll_cost;

        closing.push(headcount);
        output.areas.push(AreaHeadcount {
            area: area.area.clone(),
            allocation: area.allocation,
            headcount,
            hires,
            departures,
            paid_fte,
            cost_per_head,
            payroll_cost,
        });
    }

    Ok((output, HeadcountState { headcount: closing }))
}
