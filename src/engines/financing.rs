//! Financing engine: equity proceeds, loan draws, interest and principal

use serde::{Deserialize, Serialize};

use crate::drivers::{FinancingAssumptions, Instrument};

/// Principal repayment profile of an outstanding tranche
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Repayment {
    /// No scheduled principal (opening debt)
    InterestOnly,
    /// Grace months, then equal principal instalments
    Amortizing { grace_remaining: u32, instalments_remaining: u32 },
    /// Full principal in the last term month
    Bullet { months_remaining: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tranche {
    pub name: String,
    pub balance: f64,
    pub annual_rate: f64,
    pub repayment: Repayment,
}

impl Tranche {
    fn monthly_interest(&self) -> f64 {
        self.balance * self.annual_rate / 12.0
    }

    /// Principal due this month; advances the repayment schedule
    fn principal_due(&mut self) -> f64 {
        let balance = self.balance;
        match &mut self.repayment {
            Repayment::InterestOnly => 0.0,
            Repayment::Amortizing { grace_remaining, instalments_remaining } => {
                if *grace_remaining > 0 {
                    *grace_remaining -= 1;
                    0.0
                } else if *instalments_remaining > 0 {
                    let due = balance / *instalments_remaining as f64;
                    *instalments_remaining -= 1;
                    due
                } else {
                    0.0
                }
            }
            Repayment::Bullet { months_remaining } => {
                *months_remaining = months_remaining.saturating_sub(1);
                if *months_remaining == 0 {
                    balance
                } else {
                    0.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinancingState {
    pub tranches: Vec<Tranche>,
}

impl FinancingState {
    pub fn opening(debt: f64, annual_rate: f64) -> Self {
        let tranches = if debt > 0.0 {
            vec![Tranche {
                name: "Opening debt".to_string(),
                balance: debt,
                annual_rate,
                repayment: Repayment::InterestOnly,
            }]
        } else {
            Vec::new()
        };
        Self { tranches }
    }

    pub fn debt_balance(&self) -> f64 {
        self.tranches.iter().map(|t| t.balance).sum()
    }
}

/// Financing flows for one month
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinancingOutput {
    pub equity_issued: f64,
    pub debt_drawn: f64,
    pub principal_repaid: f64,
    /// Interest expense; reported in the income statement only
    pub interest_expense: f64,
    pub debt_balance: f64,
}

impl FinancingOutput {
    pub fn net_borrowing(&self) -> f64 {
        self.debt_drawn - self.principal_repaid
    }
}

/// Roll debt forward one month and book the month's financing events
///
/// Existing tranches accrue interest on their opening balance and then pay the
/// scheduled principal. Tranches drawn this month accrue a full month of
/// interest and start repaying the following month.
pub fn project_month(
    assumptions: &FinancingAssumptions,
    month: u32,
    prior: &FinancingState,
) -> (FinancingOutput, FinancingState) {
    let mut output = FinancingOutput::default();
    let mut tranches = Vec::with_capacity(prior.tranches.len());

    for tranche in &prior.tranches {
        let mut next = tranche.clone();
        output.interest_expense += next.monthly_interest();
        let principal = next.principal_due().min(next.balance);
        next.balance -= principal;
        output.principal_repaid += principal;
        if next.balance > 0.0 {
            tranches.push(next);
        }
    }

    for event in assumptions.events.iter().filter(|e| e.month == month) {
        let repayment = match &event.instrument {
            Instrument::Equity { .. } => {
                output.equity_issued += event.amount;
                continue;
            }
            Instrument::TermLoan { term_months, grace_months, .. } => Repayment::Amortizing {
                grace_remaining: (*grace_months).min(term_months.saturating_sub(1)),
                instalments_remaining: term_months.saturating_sub(*grace_months).max(1),
            },
            Instrument::BulletLoan { term_months, .. } => Repayment::Bullet {
                months_remaining: *term_months,
            },
        };
        let annual_rate = match &event.instrument {
            Instrument::TermLoan { annual_rate, .. } | Instrument::BulletLoan { annual_rate, .. } => *annual_rate,
            Instrument::Equity { .. } => 0.0,
        };
        let tranche = Tranche {
            name: event.name.clone(),
            balance: event.amount,
            annual_rate,
            repayment,
        };
        output.debt_drawn += event.amount;
        output.interest_expense += tranche.monthly_interest();
        if tranche.balance > 0.0 {
            tranches.push(tranche);
        }
    }

    let next = FinancingState { tranches };
    output.debt_balance = next.debt_balance();
    (output, next)
}
