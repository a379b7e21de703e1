//! Financing assumptions: equity rounds, loans and the minimum-cash backstop

use serde::{Deserialize, Serialize};

use super::common::{check_month, check_non_negative, check_positive};
use crate::error::{invalid, Result};

/// Instrument raised by a financing event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instrument {
    Equity {
        #[serde(default)]
        pre_money_valuation: Option<f64>,
    },
    /// Interest-only during grace, then equal principal instalments
    TermLoan {
        annual_rate: f64,
        term_months: u32,
        #[serde(default)]
        grace_months: u32,
    },
    /// Interest monthly, principal repaid in full in the last term month
    BulletLoan { annual_rate: f64, term_months: u32 },
}

impl Instrument {
    pub fn is_equity(&self) -> bool {
        matches!(self, Instrument::Equity { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingEvent {
    pub name: String,
    /// Month the cash arrives
    pub month: u32,
    pub amount: f64,
    pub instrument: Instrument,
}

impl FinancingEvent {
    pub fn equity(name: &str, month: u32, amount: f64) -> Self {
        Self {
            name: name.to_string(),
            month,
            amount,
            instrument: Instrument::Equity { pre_money_valuation: None },
        }
    }

    pub fn term_loan(name: &str, month: u32, amount: f64, annual_rate: f64, term_months: u32) -> Self {
        Self {
            name: name.to_string(),
            month,
            amount,
            instrument: Instrument::TermLoan {
                annual_rate,
                term_months,
                grace_months: 0,
            },
        }
    }

    /// Post-money valuation implied by an equity round, when priced
    pub fn post_money_valuation(&self) -> Option<f64> {
        match self.instrument {
            Instrument::Equity { pre_money_valuation: Some(pre) } => Some(pre + self.amount),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinancingAssumptions {
    #[serde(default)]
    pub events: Vec<FinancingEvent>,
    /// Cash floor; shortfalls are covered by an equity injection
    #[serde(default)]
    pub minimum_cash_balance: Option<f64>,
}

impl FinancingAssumptions {
    /// Total equity raised across scheduled rounds within `horizon` months
    pub fn equity_raised(&self, horizon: u32) -> f64 {
        self.events
            .iter()
            .filter(|e| e.instrument.is_equity() && e.month <= horizon)
            .map(|e| e.amount)
            .sum()
    }

    /// Number of priced or unpriced equity rounds
    pub fn equity_rounds(&self) -> usize {
        self.events.iter().filter(|e| e.instrument.is_equity()).count()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (i, event) in self.events.iter().enumerate() {
            let path = format!("financing.events[{}]", i);
            check_month(&format!("{}.month", path), event.month)?;
            check_non_negative(&format!("{}.amount", path), event.amount)?;
            match &event.instrument {
                Instrument::Equity { pre_money_valuation } => {
                    if let Some(pre) = pre_money_valuation {
                        check_positive(&format!("{}.pre_money_valuation", path), *pre)?;
                    }
                }
                Instrument::TermLoan { annual_rate, term_months, .. }
                | Instrument::BulletLoan { annual_rate, term_months } => {
                    check_non_negative(&format!("{}.annual_rate", path), *annual_rate)?;
                    if *term_months == 0 {
                        return invalid(format!("{}.term_months", path), "loan term must be at least one month");
                    }
                }
            }
        }
        if let Some(floor) = self.minimum_cash_balance {
            check_non_negative("financing.minimum_cash_balance", floor)?;
        }
        Ok(())
    }
}
