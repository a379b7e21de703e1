//! Net working capital and free cash flow derived from consecutive balance sheets

use serde::{Deserialize, Serialize};

use super::statements::{BalanceSheet, IncomeStatement};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkingCapital {
    pub accounts_receivable: f64,
    pub inventory: f64,
    pub accounts_payable: f64,
    pub deferred_revenue: f64,
    pub net_working_capital: f64,
    /// Increase in NWC over the period (a use of cash when positive)
    pub change_in_nwc: f64,
}

/// Operating NWC: receivables plus inventory, less payables and deferred revenue
pub fn net_working_capital(bs: &BalanceSheet) -> f64 {
    bs.accounts_receivable + bs.inventory - bs.accounts_payable - bs.deferred_revenue
}

pub fn derive(previous: &BalanceSheet, current: &BalanceSheet) -> WorkingCapital {
    let nwc = net_working_capital(current);
    WorkingCapital {
        accounts_receivable: current.accounts_receivable,
        inventory: current.inventory,
        accounts_payable: current.accounts_payable,
        deferred_revenue: current.deferred_revenue,
        net_working_capital: nwc,
        change_in_nwc: nwc - net_working_capital(previous),
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FreeCashFlow {
    pub ebit: f64,
    /// Marginal income-tax rate applied to EBIT
    pub tax_rate: f64,
    pub nopat: f64,
    pub depreciation: f64,
    pub capex: f64,
    pub change_in_nwc: f64,
    /// Free cash flow to firm
    pub fcff: f64,
    pub after_tax_interest: f64,
    pub net_borrowing: f64,
    /// Free cash flow to equity
    pub fcfe: f64,
}

impl FreeCashFlow {
    /// Sum flows over periods; the tax rate is taken from the later period
    pub fn accumulate(&mut self, other: &FreeCashFlow) {
        self.ebit += other.ebit;
        self.tax_rate = other.tax_rate;
        self.nopat += other.nopat;
        self.depreciation += other.depreciation;
        self.capex += other.capex;
        self.change_in_nwc += other.change_in_nwc;
        self.fcff += other.fcff;
        self.after_tax_interest += other.after_tax_interest;
        self.net_borrowing += other.net_borrowing;
        self.fcfe += other.fcfe;
    }
}

/// FCFF = EBIT(1 - t) + D&A - capex - change in NWC;
/// FCFE = FCFF - interest(1 - t) + net borrowing
pub fn free_cash_flow(
    income: &IncomeStatement,
    working_capital: &WorkingCapital,
    capex: f64,
    net_borrowing: f64,
    tax_rate: f64,
) -> FreeCashFlow {
    let nopat = income.ebit * (1.0 - tax_rate);
    let fcff = nopat + income.depreciation - capex - working_capital.change_in_nwc;
    let after_tax_interest = income.interest_expense * (1.0 - tax_rate);
    FreeCashFlow {
        ebit: income.ebit,
        tax_rate,
        nopat,
        depreciation: income.depreciation,
        capex,
        change_in_nwc: working_capital.change_in_nwc,
        fcff,
        after_tax_interest,
        net_borrowing,
        fcfe: fcff - after_tax_interest + net_borrowing,
    }
}
