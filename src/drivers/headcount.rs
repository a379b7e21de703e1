//! Headcount plan: functional areas with hire and attrition events

use serde::{Deserialize, Serialize};

use super::common::{check_fraction, check_month, check_non_negative};
use super::costs::CostAllocation;
use crate::error::{invalid, Result};

/// Rounding slack allowed below zero heads
pub const HEADCOUNT_EPSILON: f64 = 1e-9;

fn default_multiplier() -> f64 {
    1.0
}

fn default_ramp() -> f64 {
    1.0
}

/// A change in headcount applied at the start of a month
///
/// Positive deltas are hires, negative deltas are departures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadcountEvent {
    pub month: u32,
    pub delta: f64,
    /// Share of a full month's cost the new hires incur in their first month
    #[serde(default = "default_ramp")]
    pub ramp_fraction: f64,
}

impl HeadcountEvent {
    pub fn hire(month: u32, count: f64) -> Self {
        Self {
            month,
            delta: count,
            ramp_fraction: 1.0,
        }
    }

    pub fn departure(month: u32, count: f64) -> Self {
        Self {
            month,
            delta: -count,
            ramp_fraction: 1.0,
        }
    }

    pub fn with_ramp(mut self, ramp_fraction: f64) -> Self {
        self.ramp_fraction = ramp_fraction;
        self
    }
}

/// Staffing plan for one functional area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaPlan {
    pub area: String,

    pub opening_headcount: f64,

    /// Base annual salary per head
    pub annual_salary: f64,

    /// Fully-loaded cost multiplier applied to salary (benefits, payroll loading)
    #[serde(default = "default_multiplier")]
    pub loaded_cost_multiplier: f64,

    /// Fixed monthly benefits per head on top of the loaded salary
    #[serde(default)]
    pub benefits_per_head: f64,

    /// Annual raise, applied at the start of every fiscal year after the first
    #[serde(default)]
    pub annual_raise: f64,

    #[serde(default)]
    pub allocation: CostAllocation,

    #[serde(default)]
    pub events: Vec<HeadcountEvent>,
}

impl AreaPlan {
    pub fn new(area: &str, opening_headcount: f64, annual_salary: f64) -> Self {
        Self {
            area: area.to_string(),
            opening_headcount,
            annual_salary,
            loaded_cost_multiplier: 1.0,
            benefits_per_head: 0.0,
            annual_raise: 0.0,
            allocation: CostAllocation::Opex,
            events: Vec::new(),
        }
    }

    /// Fully-loaded monthly cost of one head in the given projection month
    pub fn monthly_cost_per_head(&self, month: u32) -> f64 {
        let years_elapsed = month.saturating_sub(1) / 12;
        let salary = self.annual_salary * (1.0 + self.annual_raise).powi(years_elapsed as i32);
        salary / 12.0 * self.loaded_cost_multiplier + self.benefits_per_head
    }

    /// Events scheduled for a month as (hires, ramp-weighted hires, departures)
    pub fn events_in(&self, month: u32) -> (f64, f64, f64) {
        let mut hires = 0.0;
        let mut ramped_hires = 0.0;
        let mut departures = 0.0;
        for event in self.events.iter().filter(|e| e.month == month) {
            if event.delta >= 0.0 {
                hires += event.delta;
                ramped_hires += event.delta * event.ramp_fraction;
            } else {
                departures += -event.delta;
            }
        }
        (hires, ramped_hires, departures)
    }

    pub(crate) fn validate(&self, path: &str) -> Result<()> {
        if self.area.trim().is_empty() {
            return invalid(format!("{}.area", path), "area name must not be empty");
        }
        check_non_negative(&format!("{}.opening_headcount", path), self.opening_headcount)?;
        check_non_negative(&format!("{}.annual_salary", path), self.annual_salary)?;
        check_non_negative(&format!("{}.loaded_cost_multiplier", path), self.loaded_cost_multiplier)?;
        check_non_negative(&format!("{}.benefits_per_head", path), self.benefits_per_head)?;
        if !self.annual_raise.is_finite() || self.annual_raise <= -1.0 {
            return invalid(format!("{}.annual_raise", path), "must exceed -1");
        }
        for (i, event) in self.events.iter().enumerate() {
            let event_path = format!("{}.events[{}]", path, i);
            check_month(&format!("{}.month", event_path), event.month)?;
            check_fraction(&format!("{}.ramp_fraction", event_path), event.ramp_fraction)?;
            if !event.delta.is_finite() {
                return invalid(format!("{}.delta", event_path), "must be finite");
            }
        }

        let mut months: Vec<u32> = self.events.iter().map(|e| e.month).collect();
        months.sort_unstable();
        months.dedup();
        let mut headcount = self.opening_headcount;
        for month in months {
            let (hires, _, departures) = self.events_in(month);
            headcount += hires - departures;
            if headcount < -HEADCOUNT_EPSILON {
                return invalid(
                    format!("{}.events", path),
                    format!("area '{}' would have {} heads in month {}", self.area, headcount, month),
                );
            }
        }
        Ok(())
    }
}

/// Headcount plan across all areas
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadcountPlan {
    #[serde(default)]
    pub areas: Vec<AreaPlan>,
}

impl HeadcountPlan {
    pub fn opening_headcount(&self) -> f64 {
        self.areas.iter().map(|a| a.opening_headcount).sum()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (i, area) in self.areas.iter().enumerate() {
            area.validate(&format!("headcount.areas[{}]", i))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_per_head_includes_loading_and_raise() {
        let mut plan = AreaPlan::new("Engineering", 5.0, 120_000.0);
        plan.loaded_cost_multiplier = 1.25;
        plan.benefits_per_head = 200.0;
        plan.annual_raise = 0.10;

        assert!((plan.monthly_cost_per_head(1) - (10_000.0 * 1.25 + 200.0)).abs() < 1e-9);
        assert!((plan.monthly_cost_per_head(12) - plan.monthly_cost_per_head(1)).abs() < 1e-9);
        assert!((plan.monthly_cost_per_head(13) - (11_000.0 * 1.25 + 200.0)).abs() < 1e-9);
    }

    #[test]
    fn test_events_split_hires_and_departures() {
        let mut plan = AreaPlan::new("Sales", 2.0, 90_000.0);
        plan.events = vec![
            HeadcountEvent::hire(3, 2.0).with_ramp(0.5),
            HeadcountEvent::departure(3, 1.0),
            HeadcountEvent::hire(4, 1.0),
        ];
        let (hires, ramped, departures) = plan.events_in(3);
        assert_eq!(hires, 2.0);
        assert_eq!(ramped, 1.0);
        assert_eq!(departures, 1.0);
    }

    #[test]
    fn test_cumulative_departures_checked_in_month_order() {
        let mut plan = AreaPlan::new("Sales", 2.0, 90_000.0);
        // listed out of order; the month-4 hire only arrives after the month-2 departures
        plan.events = vec![HeadcountEvent::hire(4, 5.0), HeadcountEvent::departure(2, 3.0)];
        let err = plan.validate("headcount.areas[0]").unwrap_err();
        assert!(err.to_string().contains("headcount.areas[0].events"));

        plan.events = vec![HeadcountEvent::departure(4, 3.0), HeadcountEvent::hire(2, 1.0)];
        assert!(plan.validate("headcount.areas[0]").is_ok());
    }

    #[test]
    fn test_ramp_fraction_validated() {
        let mut plan = AreaPlan::new("Sales", 2.0, 90_000.0);
        plan.events = vec![HeadcountEvent::hire(1, 1.0).with_ramp(1.5)];
        assert!(plan.validate("headcount.areas[0]").is_err());
    }
}
