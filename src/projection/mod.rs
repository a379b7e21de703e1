//! Statement assembler: monthly linked statements and their annual aggregates

mod state;
mod engine;
mod statements;
mod annual;
mod result;
pub mod working_capital;

pub use state::{opening_balance_sheet, CarryState};
pub use engine::{period_start, ProjectionConfig, StatementAssembler};
pub use statements::{balance_tolerance, BalanceSheet, CashFlowStatement, IncomeStatement, MonthlyPeriod};
pub use annual::{aggregate_annual, AnnualStatement};
pub use result::{ProjectionResult, ProjectionSummary};
pub use working_capital::{FreeCashFlow, WorkingCapital};
