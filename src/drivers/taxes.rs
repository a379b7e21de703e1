//! Tax rules: income-tax components, indirect taxes and loss carryforward

use serde::{Deserialize, Serialize};

use super::common::{check_fraction, check_non_negative};
use crate::error::{invalid, Result};

/// One band of a progressive schedule
///
/// `threshold` is the annual taxable income at which `rate` starts to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub threshold: f64,
    pub rate: f64,
}

/// Pure rate-application function for a single tax component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateSchedule {
    Flat { rate: f64 },
    Progressive { brackets: Vec<TaxBracket> },
}

impl RateSchedule {
    /// Tax due on an annual taxable amount
    pub fn annual_tax(&self, annual_income: f64) -> f64 {
        if annual_income <= 0.0 {
            return 0.0;
        }
        match self {
            RateSchedule::Flat { rate } => annual_income * rate,
            RateSchedule::Progressive { brackets } => {
                let mut tax = 0.0;
                for (i, bracket) in brackets.iter().enumerate() {
                    if annual_income <= bracket.threshold {
                        break;
                    }
                    let upper = brackets
                        .get(i + 1)
                        .map(|next| next.threshold.min(annual_income))
                        .unwrap_or(annual_income);
                    tax += (upper - bracket.threshold) * bracket.rate;
                }
                tax
            }
        }
    }

    /// Tax on one month of income, with brackets applied to the annualised amount
    pub fn monthly_tax(&self, monthly_income: f64) -> f64 {
        self.annual_tax(monthly_income * 12.0) / 12.0
    }

    /// Rate applying to the next unit of annual income
    pub fn marginal_rate(&self, annual_income: f64) -> f64 {
        match self {
            RateSchedule::Flat { rate } => *rate,
            RateSchedule::Progressive { brackets } => {
                let income = annual_income.max(0.0);
                brackets
                    .iter()
                    .filter(|b| b.threshold <= income)
                    .last()
                    .or_else(|| brackets.first())
                    .map(|b| b.rate)
                    .unwrap_or(0.0)
            }
        }
    }

    fn validate(&self, path: &str) -> Result<()> {
        match self {
            RateSchedule::Flat { rate } => check_fraction(&format!("{}.rate", path), *rate),
            RateSchedule::Progressive { brackets } => {
                if brackets.is_empty() {
                    return invalid(path, "progressive schedule needs at least one bracket");
                }
                if brackets[0].threshold != 0.0 {
                    return invalid(path, "first bracket must start at 0");
                }
                for (i, bracket) in brackets.iter().enumerate() {
                    check_fraction(&format!("{}.brackets[{}].rate", path, i), bracket.rate)?;
                    check_non_negative(&format!("{}.brackets[{}].threshold", path, i), bracket.threshold)?;
                    if i > 0 && bracket.threshold <= brackets[i - 1].threshold {
                        return invalid(path, "bracket thresholds must be strictly increasing");
                    }
                }
                Ok(())
            }
        }
    }
}

/// Income tax levied by one jurisdiction; components are summed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeTaxComponent {
    pub jurisdiction: String,
    pub schedule: RateSchedule,
}

/// Base of an indirect tax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndirectTaxBase {
    /// Deducted from gross recognised revenue
    GrossRevenue,
    /// Charged to operating expenses on top of payroll
    Payroll,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndirectTax {
    pub name: String,
    pub base: IndirectTaxBase,
    pub rate: f64,
}

fn default_true() -> bool {
    true
}

fn default_offset() -> f64 {
    1.0
}

/// How tax losses are carried into later periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarryforwardPolicy {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Share of positive pre-tax income that carried losses may offset
    #[serde(default = "default_offset")]
    pub max_offset_fraction: f64,
}

impl Default for CarryforwardPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_offset_fraction: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaxRules {
    #[serde(default)]
    pub income_tax: Vec<IncomeTaxComponent>,
    #[serde(default)]
    pub indirect: Vec<IndirectTax>,
    #[serde(default)]
    pub carryforward: CarryforwardPolicy,
}

impl TaxRules {
    /// Single flat income tax with full loss carryforward
    pub fn flat(rate: f64) -> Self {
        Self {
            income_tax: vec![IncomeTaxComponent {
                jurisdiction: "federal".to_string(),
                schedule: RateSchedule::Flat { rate },
            }],
            indirect: Vec::new(),
            carryforward: CarryforwardPolicy::default(),
        }
    }

    /// Combined marginal income-tax rate at an annual income level
    pub fn marginal_rate(&self, annual_income: f64) -> f64 {
        self.income_tax
            .iter()
            .map(|c| c.schedule.marginal_rate(annual_income))
            .sum()
    }

    /// Sum of indirect tax rates on the given base
    pub fn indirect_rate(&self, base: IndirectTaxBase) -> f64 {
        self.indirect.iter().filter(|t| t.base == base).map(|t| t.rate).sum()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (i, component) in self.income_tax.iter().enumerate() {
            component
                .schedule
                .validate(&format!("taxes.income_tax[{}].schedule", i))?;
        }
        for (i, tax) in self.indirect.iter().enumerate() {
            check_fraction(&format!("taxes.indirect[{}].rate", i), tax.rate)?;
        }
        check_fraction("taxes.carryforward.max_offset_fraction", self.carryforward.max_offset_fraction)?;
        if self.marginal_rate(f64::MAX) > 1.0 {
            return invalid("taxes.income_tax", "combined income tax rate exceeds 100%");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progressive() -> RateSchedule {
        RateSchedule::Progressive {
            brackets: vec![
                TaxBracket { threshold: 0.0, rate: 0.10 },
                TaxBracket { threshold: 100_000.0, rate: 0.20 },
                TaxBracket { threshold: 500_000.0, rate: 0.30 },
            ],
        }
    }

    #[test]
    fn test_flat_tax() {
        let schedule = RateSchedule::Flat { rate: 0.21 };
        assert!((schedule.annual_tax(1_000.0) - 210.0).abs() < 1e-9);
        assert_eq!(schedule.annual_tax(-500.0), 0.0);
    }

    #[test]
    fn test_progressive_tax_fills_brackets() {
        let schedule = progressive();
        // 100k at 10% + 100k at 20%
        assert!((schedule.annual_tax(200_000.0) - 30_000.0).abs() < 1e-6);
        // 100k at 10% + 400k at 20% + 100k at 30%
        assert!((schedule.annual_tax(600_000.0) - 120_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_progressive_monthly_uses_annualised_income() {
        let schedule = progressive();
        let monthly = schedule.monthly_tax(200_000.0 / 12.0);
        assert!((monthly - 30_000.0 / 12.0).abs() < 1e-6);
    }

    #[test]
    fn test_marginal_rate() {
        let schedule = progressive();
        assert_eq!(schedule.marginal_rate(-10.0), 0.10);
        assert_eq!(schedule.marginal_rate(150_000.0), 0.20);
        assert_eq!(schedule.marginal_rate(900_000.0), 0.30);
    }

    #[test]
    fn test_components_compose_additively() {
        let mut rules = TaxRules::flat(0.21);
        rules.income_tax.push(IncomeTaxComponent {
            jurisdiction: "state".to_string(),
            schedule: RateSchedule::Flat { rate: 0.05 },
        });
        assert!((rules.marginal_rate(1.0) - 0.26).abs() < 1e-12);
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_bracket_thresholds_must_increase() {
        let rules = TaxRules {
            income_tax: vec![IncomeTaxComponent {
                jurisdiction: "federal".to_string(),
                schedule: RateSchedule::Progressive {
                    brackets: vec![
                        TaxBracket { threshold: 0.0, rate: 0.1 },
                        TaxBracket { threshold: 0.0, rate: 0.2 },
                    ],
                },
            }],
            ..Default::default()
        };
        assert!(rules.validate().is_err());
    }
}
