//! Financial statement structures produced by the assembler

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::working_capital::{FreeCashFlow, WorkingCapital};
use crate::engines::{CostBreakdown, FinancingOutput, HeadcountOutput, IndirectTaxes, RevenueOutput, TaxComputation};
use crate::error::{Result, StatementImbalanceError};

/// Identity tolerance scaled to the size of the balance sheet
pub fn balance_tolerance(relative: f64, total_assets: f64) -> f64 {
    relative * total_assets.abs().max(1.0)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IncomeStatement {
    /// Recognised revenue before revenue-based indirect taxes
    pub gross_revenue: f64,
    pub revenue_taxes: f64,
    pub net_revenue: f64,

    pub payroll_cogs: f64,
    pub other_cogs: f64,
    pub cogs: f64,
    pub gross_profit: f64,

    pub payroll_opex: f64,
    pub payroll_taxes: f64,
    pub other_opex: f64,
    pub operating_expenses: f64,

    pub ebitda: f64,
    pub depreciation: f64,
    pub ebit: f64,
    pub interest_expense: f64,
    pub pre_tax_income: f64,
    pub income_tax: f64,
    pub net_income: f64,
}

impl IncomeStatement {
    pub fn gross_margin(&self) -> f64 {
        if self.net_revenue.abs() > 0.0 {
            self.gross_profit / self.net_revenue
        } else {
            0.0
        }
    }

    pub fn ebitda_margin(&self) -> f64 {
        if self.net_revenue.abs() > 0.0 {
            self.ebitda / self.net_revenue
        } else {
            0.0
        }
    }

    /// Add another period's flows into this one
    pub fn accumulate(&mut self, other: &IncomeStatement) {
        self.gross_revenue += other.gross_revenue;
        self.revenue_taxes += other.revenue_taxes;
        self.net_revenue += other.net_revenue;
        self.payroll_cogs += other.payroll_cogs;
        self.other_cogs += other.other_cogs;
        self.cogs += other.cogs;
        self.gross_profit += other.gross_profit;
        self.payroll_opex += other.payroll_opex;
        self.payroll_taxes += other.payroll_taxes;
        self.other_opex += other.other_opex;
        self.operating_expenses += other.operating_expenses;
        self.ebitda += other.ebitda;
        self.depreciation += other.depreciation;
        self.ebit += other.ebit;
        self.interest_expense += other.interest_expense;
        self.pre_tax_income += other.pre_tax_income;
        self.income_tax += other.income_tax;
        self.net_income += other.net_income;
    }
}

/// Balance sheet at month end
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceSheet {
    // Assets
    pub cash: f64,
    pub accounts_receivable: f64,
    pub inventory: f64,
    pub fixed_assets_gross: f64,
    pub accumulated_depreciation: f64,

    // Liabilities
    pub accounts_payable: f64,
    pub deferred_revenue: f64,
    pub debt: f64,

    // Equity
    pub paid_in_capital: f64,
    pub retained_earnings: f64,
}

impl BalanceSheet {
    pub fn net_fixed_assets(&self) -> f64 {
        self.fixed_assets_gross - self.accumulated_depreciation
    }

    /// All assets other than cash
    pub fn non_cash_assets(&self) -> f64 {
        self.accounts_receivable + self.inventory + self.net_fixed_assets()
    }

    pub fn total_assets(&self) -> f64 {
        self.cash + self.non_cash_assets()
    }

    pub fn total_liabilities(&self) -> f64 {
        self.accounts_payable + self.deferred_revenue + self.debt
    }

    pub fn total_equity(&self) -> f64 {
        self.paid_in_capital + self.retained_earnings
    }

    pub fn total_liabilities_and_equity(&self) -> f64 {
        self.total_liabilities() + self.total_equity()
    }

    /// Assets minus liabilities and equity
    pub fn imbalance(&self) -> f64 {
        self.total_assets() - self.total_liabilities_and_equity()
    }

    /// Verify assets equal liabilities plus equity within `relative` tolerance
    pub fn check_identity(&self, month: u32, relative: f64) -> Result<()> {
        let total_assets = self.total_assets();
        let tolerance = balance_tolerance(relative, total_assets);
        let difference = self.imbalance();
        if difference.abs() > tolerance || !difference.is_finite() {
            return Err(StatementImbalanceError {
                month,
                total_assets,
                total_liabilities_and_equity: self.total_liabilities_and_equity(),
                difference,
                tolerance,
            }
            .into());
        }
        Ok(())
    }
}

/// Indirect-method cash flow statement
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CashFlowStatement {
    pub beginning_cash: f64,

    pub net_income: f64,
    pub depreciation: f64,
    pub change_in_receivables: f64,
    pub change_in_inventory: f64,
    pub change_in_payables: f64,
    pub change_in_deferred_revenue: f64,
    pub operating_cash_flow: f64,

    pub capex: f64,
    pub investing_cash_flow: f64,

    pub equity_issued: f64,
    /// Equity injected to hold the minimum cash balance
    pub funding_backstop: f64,
    pub debt_drawn: f64,
    pub principal_repaid: f64,
    pub financing_cash_flow: f64,

    pub net_change_in_cash: f64,
    pub ending_cash: f64,
}

impl CashFlowStatement {
    /// Add a later period's flows; the ending cash moves to the later period's
    pub fn accumulate(&mut self, other: &CashFlowStatement) {
        self.net_income += other.net_income;
        self.depreciation += other.depreciation;
        self.change_in_receivables += other.change_in_receivables;
        self.change_in_inventory += other.change_in_inventory;
        self.change_in_payables += other.change_in_payables;
        self.change_in_deferred_revenue += other.change_in_deferred_revenue;
        self.operating_cash_flow += other.operating_cash_flow;
        self.capex += other.capex;
        self.investing_cash_flow += other.investing_cash_flow;
        self.equity_issued += other.equity_issued;
        self.funding_backstop += other.funding_backstop;
        self.debt_drawn += other.debt_drawn;
        self.principal_repaid += other.principal_repaid;
        self.financing_cash_flow += other.financing_cash_flow;
        self.net_change_in_cash += other.net_change_in_cash;
        self.ending_cash = other.ending_cash;
    }

    /// Cash consumed by operations and investment, positive when burning
    pub fn burn(&self) -> f64 {
        -(self.operating_cash_flow + self.investing_cash_flow)
    }
}

/// Everything the assembler produces for one projection month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPeriod {
    /// Projection month (1-indexed)
    pub month: u32,
    pub period_start: NaiveDate,
    /// Fiscal year counted from the scenario start (1-indexed)
    pub fiscal_year: u32,
    pub month_in_year: u32,

    pub revenue: RevenueOutput,
    pub headcount: HeadcountOutput,
    pub costs: CostBreakdown,
    pub indirect_taxes: IndirectTaxes,
    pub tax: TaxComputation,
    pub financing: FinancingOutput,

    pub income_statement: IncomeStatement,
    pub balance_sheet: BalanceSheet,
    pub cash_flow: CashFlowStatement,
    pub working_capital: WorkingCapital,
    pub free_cash_flow: FreeCashFlow,

    /// Balance-sheet cash minus cash-flow-statement cash before reconciliation
    pub reconciliation_drift: f64,
}
