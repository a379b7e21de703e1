//! Driver models: the inputs a scenario run consumes
//!
//! Everything here is plain data with serde support and input validation.
//! No projection logic lives in this module.

mod common;
mod revenue;
mod headcount;
mod costs;
mod taxes;
mod financing;
mod capex;
mod working_capital;
mod valuation;

pub use common::{MonthlySchedule, SeasonalPattern};
pub(crate) use common::check_non_negative;
pub use revenue::{
    DeferralSchedule, RevenuePlan, RevenueStream, ServicesRevenue, TransactionalRevenue, DEFERRAL_SUM_TOLERANCE,
};
pub use headcount::{AreaPlan, HeadcountEvent, HeadcountPlan, HEADCOUNT_EPSILON};
pub use costs::{
    ContractStep, ContractTerms, CostAllocation, CostCategory, CostCenter, CostDriver, CostItem, CostPlan, UsageFee,
};
pub use taxes::{
    CarryforwardPolicy, IncomeTaxComponent, IndirectTax, IndirectTaxBase, RateSchedule, TaxBracket, TaxRules,
};
pub use financing::{FinancingAssumptions, FinancingEvent, Instrument};
pub use capex::{CapexItem, CapexPlan};
pub use working_capital::{WorkingCapitalPolicy, DAYS_PER_MONTH};
pub use valuation::{
    CashFlowBasis, DcfInputs, ExitValue, Metric, MetricWindow, MultipleSpec, MultiplesInputs, RequiredReturn,
    ScorecardInputs, TerminalValueMethod, ValuationAssumptions, ValuationMethod, VcInputs,
};
