//! Single-month sub-engines
//!
//! Each engine is a pure function of the drivers, the month, and its own
//! carry-in state, returning the month's figures and the next state. The
//! statement assembler composes them.

pub mod revenue;
pub mod headcount;
pub mod costs;
pub mod tax;
pub mod financing;
pub mod capex;

pub use revenue::{RevenueOutput, RevenueState, StreamRevenue, StreamState};
pub use headcount::{AreaHeadcount, HeadcountOutput, HeadcountState};
pub use costs::{CenterCost, CostBreakdown, CostDrivers, CostKind, CostLine};
pub use tax::{compute_income_tax, compute_indirect_taxes, IndirectTaxes, TaxComputation, TaxLine};
pub use financing::{FinancingOutput, FinancingState, Repayment, Tranche};
pub use capex::{AssetTrack, CapexOutput, DepreciationState};
