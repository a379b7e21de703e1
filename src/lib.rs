//! Startup Valuation - deterministic financial projection and valuation engine
//!
//! This library provides:
//! - Driver models for revenue, headcount, costs, taxes, financing and capex
//! - Monthly sub-engines folded into linked Income Statement, Balance Sheet and
//!   Cash Flow statements with a balance-sheet identity check every month
//! - Working capital and free cash flow (FCFF/FCFE) series
//! - DCF, trading-multiple and VC-method valuation
//! - Parallel batch and sensitivity runs over independent scenarios

pub mod drivers;
pub mod engines;
pub mod projection;
pub mod valuation;
pub mod scenario;
pub mod dashboard;
pub mod io;
pub mod error;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use error::{ModelError, Result, StatementImbalanceError, ValidationError};
pub use projection::{AnnualStatement, MonthlyPeriod, ProjectionConfig, ProjectionResult, StatementAssembler};
pub use scenario::{run, OpeningBalances, Scenario, ScenarioResult, ScenarioRunner};
pub use valuation::{ValuationOutcome, ValuationResult};
