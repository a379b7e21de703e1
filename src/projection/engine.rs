//! Statement assembler: the monthly fold that produces linked statements

use chrono::{Months, NaiveDate};
use log::{debug, error, info, warn};

use super::annual::aggregate_annual;
use super::result::ProjectionResult;
use super::state::CarryState;
use super::statements::{balance_tolerance, BalanceSheet, CashFlowStatement, IncomeStatement, MonthlyPeriod};
use super::working_capital;
use crate::engines::{capex, costs, financing, headcount, revenue, tax, CostDrivers};
use crate::error::{Result, StatementImbalanceError};
use crate::scenario::Scenario;

/// Configuration for a projection run
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    /// Balance-sheet identity tolerance, relative to max(1, |total assets|)
    pub balance_tolerance: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: 1e-6,
        }
    }
}

/// Folds a scenario's drivers into monthly linked statements
///
/// Each month is computed from the scenario and the prior month's
/// [`CarryState`] only. Cash is the balancing account: the balance-sheet cash
/// is derived from liabilities and equity and must agree with the cash-flow
/// statement within tolerance, otherwise the run aborts.
pub struct StatementAssembler<'a> {
    scenario: &'a Scenario,
    config: ProjectionConfig,
}

impl<'a> StatementAssembler<'a> {
    pub fn new(scenario: &'a Scenario, config: ProjectionConfig) -> Self {
        Self { scenario, config }
    }

    /// Run the fold over the scenario horizon
    ///
    /// The scenario is assumed validated; `Scenario::project` validates first.
    pub fn project(&self) -> Result<ProjectionResult> {
        let scenario = self.scenario;
        info!(
            "Projecting scenario '{}' over {} months from {}",
            scenario.name, scenario.horizon_months, scenario.start_date
        );

        let opening = CarryState::from_scenario(scenario);
        opening.balance_sheet.check_identity(0, self.config.balance_tolerance)?;
        let opening_balance_sheet = opening.balance_sheet.clone();

        let mut monthly = Vec::with_capacity(scenario.horizon_months as usize);
        let mut state = opening;
        for _ in 0..scenario.horizon_months {
            let (period, next) = self.step(&state)?;
            monthly.push(period);
            state = next;
        }

        let annual = aggregate_annual(&monthly);
        let result = ProjectionResult {
            scenario: scenario.name.clone(),
            opening_balance_sheet,
            monthly,
            annual,
        };

        let summary = result.summary();
        info!(
            "Scenario '{}' complete: revenue {:.2}, net income {:.2}, ending cash {:.2}",
            scenario.name, summary.total_net_revenue, summary.total_net_income, summary.ending_cash
        );
        Ok(result)
    }

    /// Compute the month after `prior` and the state carried out of it
    pub fn step(&self, prior: &CarryState) -> Result<(MonthlyPeriod, CarryState)> {
        let scenario = self.scenario;
        let month = prior.month + 1;
        let previous = &prior.balance_sheet;

        // Operating drivers
        let (revenue, revenue_state) = revenue::project_month(&scenario.revenue, month, &prior.revenue)?;
        let (headcount, headcount_state) = headcount::project_month(&scenario.headcount, month, &prior.headcount)?;
        let indirect_taxes =
            tax::compute_indirect_taxes(&scenario.taxes, revenue.recognized_revenue, headcount.payroll_cost);
        let net_revenue = revenue.recognized_revenue - indirect_taxes.revenue_taxes;

        let drivers = CostDrivers {
            revenue: revenue.recognized_revenue,
            net_revenue,
            billings: revenue.billings,
            headcount: headcount.total_headcount,
            customers: revenue.customers,
            new_customers: revenue.new_customers,
        };
        let cost_breakdown = costs::project_month(&scenario.costs, month, &drivers);
        let (capex, depreciation_state) = capex::project_month(&scenario.capex, month, &prior.depreciation);
        let (financing, financing_state) = financing::project_month(&scenario.financing, month, &prior.financing);

        // Income statement
        let mut income = IncomeStatement {
            gross_revenue: revenue.recognized_revenue,
            revenue_taxes: indirect_taxes.revenue_taxes,
            net_revenue,
            payroll_cogs: headcount.payroll_cogs,
            other_cogs: cost_breakdown.cogs,
            cogs: headcount.payroll_cogs + cost_breakdown.cogs,
            payroll_opex: headcount.payroll_opex,
            payroll_taxes: indirect_taxes.payroll_taxes,
            other_opex: cost_breakdown.opex,
            operating_expenses: headcount.payroll_opex + indirect_taxes.payroll_taxes + cost_breakdown.opex,
            depreciation: capex.depreciation,
            interest_expense: financing.interest_expense,
            ..Default::default()
        };
        income.gross_profit = income.net_revenue - income.cogs;
        income.ebitda = income.gross_profit - income.operating_expenses;
        income.ebit = income.ebitda - income.depreciation;
        income.pre_tax_income = income.ebit - income.interest_expense;

        let income_tax = tax::compute_income_tax(&scenario.taxes, income.pre_tax_income, prior.tax_loss_carryforward);
        income.income_tax = income_tax.income_tax;
        income.net_income = income.pre_tax_income - income.income_tax;

        // Operating balances
        let policy = &scenario.working_capital;
        let accounts_receivable = policy.receivables(revenue.billings);
        let inventory = policy.inventory(income.cogs);
        let accounts_payable = policy.payables(cost_breakdown.total());
        let deferred_revenue = revenue.deferred_revenue_balance;

        // Cash flow statement
        let mut cash_flow = CashFlowStatement {
            beginning_cash: previous.cash,
            net_income: income.net_income,
            depreciation: income.depreciation,
            change_in_receivables: previous.accounts_receivable - accounts_receivable,
            change_in_inventory: previous.inventory - inventory,
            change_in_payables: accounts_payable - previous.accounts_payable,
            change_in_deferred_revenue: deferred_revenue - previous.deferred_revenue,
            capex: capex.capex,
            investing_cash_flow: -capex.capex,
            equity_issued: financing.equity_issued,
            debt_drawn: financing.debt_drawn,
            principal_repaid: financing.principal_repaid,
            ..Default::default()
        };
        cash_flow.operating_cash_flow = cash_flow.net_income
            + cash_flow.depreciation
            + cash_flow.change_in_receivables
            + cash_flow.change_in_inventory
            + cash_flow.change_in_payables
            + cash_flow.change_in_deferred_revenue;

        let scheduled_financing = cash_flow.equity_issued + cash_flow.debt_drawn - cash_flow.principal_repaid;
        let cash_before_backstop = cash_flow.beginning_cash
            + cash_flow.operating_cash_flow
            + cash_flow.investing_cash_flow
            + scheduled_financing;
        if let Some(floor) = scenario.financing.minimum_cash_balance {
            if cash_before_backstop < floor {
                cash_flow.funding_backstop = floor - cash_before_backstop;
                warn!(
                    "Scenario '{}' month {}: cash {:.2} below minimum {:.2}, injecting {:.2} of equity",
                    scenario.name, month, cash_before_backstop, floor, cash_flow.funding_backstop
                );
            }
        }
        cash_flow.financing_cash_flow = scheduled_financing + cash_flow.funding_backstop;
        cash_flow.net_change_in_cash =
            cash_flow.operating_cash_flow + cash_flow.investing_cash_flow + cash_flow.financing_cash_flow;
        cash_flow.ending_cash = cash_flow.beginning_cash + cash_flow.net_change_in_cash;

        // Balance sheet, with cash as the balancing account
        let mut balance_sheet = BalanceSheet {
            cash: 0.0,
            accounts_receivable,
            inventory,
            fixed_assets_gross: previous.fixed_assets_gross + capex.capex,
            accumulated_depreciation: previous.accumulated_depreciation + capex.depreciation,
            accounts_payable,
            deferred_revenue,
            debt: financing.debt_balance,
            paid_in_capital: previous.paid_in_capital + financing.equity_issued + cash_flow.funding_backstop,
            retained_earnings: previous.retained_earnings + income.net_income,
        };
        let plug = balance_sheet.total_liabilities_and_equity() - balance_sheet.non_cash_assets();
        let reconciliation_drift = plug - cash_flow.ending_cash;
        let total_assets = cash_flow.ending_cash + balance_sheet.non_cash_assets();
        let tolerance = balance_tolerance(self.config.balance_tolerance, total_assets);
        if reconciliation_drift.abs() > tolerance || !reconciliation_drift.is_finite() {
            error!(
                "Scenario '{}' month {}: cash flow ending cash {:.6} disagrees with balance sheet by {:.3e}",
                scenario.name, month, cash_flow.ending_cash, reconciliation_drift
            );
            return Err(StatementImbalanceError {
                month,
                total_assets,
                total_liabilities_and_equity: balance_sheet.total_liabilities_and_equity(),
                difference: -reconciliation_drift,
                tolerance,
            }
            .into());
        }
        balance_sheet.cash = plug;
        cash_flow.ending_cash = plug;
        if let Err(e) = balance_sheet.check_identity(month, self.config.balance_tolerance) {
            error!("Scenario '{}' month {}: {}", scenario.name, month, e);
            return Err(e);
        }

        // Working capital and free cash flow
        let working_capital = working_capital::derive(previous, &balance_sheet);
        let tax_rate = scenario.taxes.marginal_rate(income.ebit * 12.0);
        let free_cash_flow = working_capital::free_cash_flow(
            &income,
            &working_capital,
            capex.capex,
            financing.net_borrowing(),
            tax_rate,
        );

        debug!(
            "Month {}: revenue {:.2}, net income {:.2}, cash {:.2}, headcount {}",
            month, income.net_revenue, income.net_income, balance_sheet.cash, headcount.total_headcount
        );

        let next = CarryState {
            month,
            balance_sheet: balance_sheet.clone(),
            tax_loss_carryforward: income_tax.carryforward_closing,
            revenue: revenue_state,
            headcount: headcount_state,
            financing: financing_state,
            depreciation: depreciation_state,
        };

        let period = MonthlyPeriod {
            month,
            period_start: period_start(scenario.start_date, month),
            fiscal_year: (month - 1) / 12 + 1,
            month_in_year: (month - 1) % 12 + 1,
            revenue,
            headcount,
            costs: cost_breakdown,
            indirect_taxes,
            tax: income_tax,
            financing,
            income_statement: income,
            balance_sheet,
            cash_flow,
            working_capital,
            free_cash_flow,
            reconciliation_drift,
        };

        Ok((period, next))
    }
}

/// First calendar day covered by a projection month
pub fn period_start(start_date: NaiveDate, month: u32) -> NaiveDate {
    start_date
        .checked_add_months(Months::new(month.saturating_sub(1)))
        .unwrap_or(start_date)
}
