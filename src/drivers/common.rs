//! Shared driver primitives: month-indexed schedules and seasonality

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{invalid, Result};

/// A value per projection month with a default and sparse overrides
///
/// Overrides are keyed by 1-indexed projection month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySchedule {
    pub default: f64,
    #[serde(default, with = "month_keys")]
    pub overrides: BTreeMap<u32, f64>,
}

/// Month-keyed maps as JSON objects with string keys
///
/// Keys pass through `String` so the map also loads inside tagged or flattened
/// enums, where serde buffers keys as strings.
mod month_keys {
    use std::collections::BTreeMap;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(map: &BTreeMap<u32, f64>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(map.iter().map(|(month, value)| (month.to_string(), value)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeMap<u32, f64>, D::Error> {
        BTreeMap::<String, f64>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, value)| {
                key.parse::<u32>()
                    .map(|month| (month, value))
                    .map_err(|_| D::Error::custom(format!("override key {:?} is not a month number", key)))
            })
            .collect()
    }
}

impl MonthlySchedule {
    /// Same value in every month
    pub fn constant(value: f64) -> Self {
        Self {
            default: value,
            overrides: BTreeMap::new(),
        }
    }

    pub fn zero() -> Self {
        Self::constant(0.0)
    }

    /// Replace the value for a single month
    pub fn with_override(mut self, month: u32, value: f64) -> Self {
        self.overrides.insert(month, value);
        self
    }

    /// Value in effect for the given projection month
    pub fn value_for(&self, month: u32) -> f64 {
        self.overrides.get(&month).copied().unwrap_or(self.default)
    }

    /// Iterate over every distinct value the schedule can produce
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        std::iter::once(self.default).chain(self.overrides.values().copied())
    }

    pub(crate) fn validate_non_negative(&self, field: &str) -> Result<()> {
        for value in self.values() {
            check_non_negative(field, value)?;
        }
        Ok(())
    }

    pub(crate) fn validate_fraction(&self, field: &str) -> Result<()> {
        for value in self.values() {
            check_fraction(field, value)?;
        }
        Ok(())
    }
}

impl Default for MonthlySchedule {
    fn default() -> Self {
        Self::zero()
    }
}

/// Twelve multipliers applied by position within the fiscal year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPattern {
    pub values: Vec<f64>,
}

impl SeasonalPattern {
    pub fn flat() -> Self {
        Self {
            values: vec![1.0; 12],
        }
    }

    /// Multiplier for a projection month (month 1 uses the first value)
    pub fn factor(&self, month: u32) -> f64 {
        let idx = (month.saturating_sub(1) % 12) as usize;
        self.values.get(idx).copied().unwrap_or(1.0)
    }

    pub(crate) fn validate(&self, field: &str) -> Result<()> {
        if self.values.len() != 12 {
            return invalid(field, format!("expected 12 seasonal values, got {}", self.values.len()));
        }
        for value in &self.values {
            check_non_negative(field, *value)?;
        }
        Ok(())
    }
}

impl Default for SeasonalPattern {
    fn default() -> Self {
        Self::flat()
    }
}

pub(crate) fn check_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return invalid(field, format!("must be a non-negative number, got {}", value));
    }
    Ok(())
}

pub(crate) fn check_positive(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return invalid(field, format!("must be positive, got {}", value));
    }
    Ok(())
}

pub(crate) fn check_fraction(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return invalid(field, format!("must lie in [0, 1], got {}", value));
    }
    Ok(())
}

/// Months are 1-indexed; events past the horizon are allowed and never fire
pub(crate) fn check_month(field: &str, month: u32) -> Result<()> {
    if month == 0 {
        return invalid(field, "months are 1-indexed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_override() {
        let schedule = MonthlySchedule::constant(10.0).with_override(3, 25.0);
        assert_eq!(schedule.value_for(1), 10.0);
        assert_eq!(schedule.value_for(3), 25.0);
        assert_eq!(schedule.value_for(4), 10.0);
    }

    #[test]
    fn test_schedule_fraction_validation() {
        let schedule = MonthlySchedule::constant(0.05).with_override(2, 1.5);
        assert!(schedule.validate_fraction("churn").is_err());
        assert!(MonthlySchedule::constant(0.05).validate_fraction("churn").is_ok());
    }

    #[test]
    fn test_seasonal_wraps_every_twelve_months() {
        let mut values = vec![1.0; 12];
        values[0] = 0.5;
        let pattern = SeasonalPattern { values };
        assert_eq!(pattern.factor(1), 0.5);
        assert_eq!(pattern.factor(13), 0.5);
        assert_eq!(pattern.factor(2), 1.0);
    }

    #[test]
    fn test_seasonal_requires_twelve_values() {
        let pattern = SeasonalPattern { values: vec![1.0; 11] };
        assert!(pattern.validate("seasonality").is_err());
    }
}
