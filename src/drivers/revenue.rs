//! Revenue plan: subscription streams and their recognition schedules

use serde::{Deserialize, Serialize};

use super::common::{check_fraction, check_non_negative, check_positive, MonthlySchedule, SeasonalPattern};
use crate::error::{invalid, Result};

/// Allowed drift when checking that deferral weights sum to 1.0
pub const DEFERRAL_SUM_TOLERANCE: f64 = 1e-9;

/// Share of each month's billings recognised in the billing month and after
///
/// `weights[0]` is recognised in the billing month, `weights[k]` k months later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferralSchedule {
    pub weights: Vec<f64>,
}

impl DeferralSchedule {
    /// Recognise everything in the billing month
    pub fn immediate() -> Self {
        Self { weights: vec![1.0] }
    }

    /// Recognise evenly over `months` months starting with the billing month
    pub fn straight_line(months: u32) -> Self {
        let n = months.max(1) as usize;
        Self {
            weights: vec![1.0 / n as f64; n],
        }
    }

    /// Number of months a single billing keeps releasing revenue
    pub fn horizon(&self) -> usize {
        self.weights.len()
    }

    pub fn is_immediate(&self) -> bool {
        self.weights.len() == 1
    }

    pub(crate) fn validate(&self, field: &str) -> Result<()> {
        if self.weights.is_empty() {
            return invalid(field, "deferral schedule needs at least one weight");
        }
        for w in &self.weights {
            check_non_negative(field, *w)?;
        }
        let total: f64 = self.weights.iter().sum();
        if (total - 1.0).abs() > DEFERRAL_SUM_TOLERANCE {
            return invalid(field, format!("deferral weights must sum to 1.0, got {}", total));
        }
        Ok(())
    }
}

impl Default for DeferralSchedule {
    fn default() -> Self {
        Self::immediate()
    }
}

/// One-off onboarding revenue billed on newly acquired customers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicesRevenue {
    /// Fraction of new customers buying onboarding services
    pub attach_rate: f64,
    /// Price per services engagement
    pub average_price: f64,
}

/// Usage-based revenue: a fee per transaction, billed and recognised in the month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionalRevenue {
    /// Transactions processed per month
    pub volume: MonthlySchedule,
    pub fee: f64,
}

impl TransactionalRevenue {
    pub fn billings_for(&self, month: u32) -> f64 {
        self.volume.value_for(month) * self.fee
    }
}

/// A subscription revenue stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueStream {
    pub name: String,

    /// Customers active at the start of month 1
    pub starting_customers: f64,

    /// New customers acquired per month
    #[serde(default)]
    pub new_customers: MonthlySchedule,

    /// Monthly logo churn as a fraction of billed customers
    #[serde(default)]
    pub churn_rate: MonthlySchedule,

    /// Monthly per-customer expansion
    #[serde(default)]
    pub expansion_rate: MonthlySchedule,

    /// Monthly per-customer contraction
    #[serde(default)]
    pub contraction_rate: MonthlySchedule,

    /// Price per customer per month at month 1
    pub price: f64,

    /// Monthly list-price growth
    #[serde(default)]
    pub price_growth_rate: MonthlySchedule,

    /// Fraction of gross billings given away as discounts
    #[serde(default)]
    pub discount_rate: MonthlySchedule,

    #[serde(default)]
    pub seasonality: SeasonalPattern,

    #[serde(default)]
    pub deferral: DeferralSchedule,

    #[serde(default)]
    pub services: Option<ServicesRevenue>,

    #[serde(default)]
    pub transactional: Option<TransactionalRevenue>,
}

impl RevenueStream {
    /// Plain monthly subscription with immediate recognition
    pub fn subscription(name: &str, starting_customers: f64, price: f64) -> Self {
        Self {
            name: name.to_string(),
            starting_customers,
            new_customers: MonthlySchedule::zero(),
            churn_rate: MonthlySchedule::zero(),
            expansion_rate: MonthlySchedule::zero(),
            contraction_rate: MonthlySchedule::zero(),
            price,
            price_growth_rate: MonthlySchedule::zero(),
            discount_rate: MonthlySchedule::zero(),
            seasonality: SeasonalPattern::flat(),
            deferral: DeferralSchedule::immediate(),
            services: None,
            transactional: None,
        }
    }

    pub(crate) fn validate(&self, path: &str) -> Result<()> {
        check_non_negative(&format!("{}.starting_customers", path), self.starting_customers)?;
        self.new_customers.validate_non_negative(&format!("{}.new_customers", path))?;
        self.churn_rate.validate_fraction(&format!("{}.churn_rate", path))?;
        self.expansion_rate.validate_non_negative(&format!("{}.expansion_rate", path))?;
        self.contraction_rate.validate_fraction(&format!("{}.contraction_rate", path))?;
        check_positive(&format!("{}.price", path), self.price)?;
        self.discount_rate.validate_fraction(&format!("{}.discount_rate", path))?;
        for g in self.price_growth_rate.values() {
            if !g.is_finite() || g <= -1.0 {
                return invalid(format!("{}.price_growth_rate", path), format!("must exceed -1, got {}", g));
            }
        }
        self.seasonality.validate(&format!("{}.seasonality", path))?;
        self.deferral.validate(&format!("{}.deferral", path))?;
        if let Some(services) = &self.services {
            check_fraction(&format!("{}.services.attach_rate", path), services.attach_rate)?;
            check_non_negative(&format!("{}.services.average_price", path), services.average_price)?;
        }
        if let Some(transactional) = &self.transactional {
            transactional
                .volume
                .validate_non_negative(&format!("{}.transactional.volume", path))?;
            check_non_negative(&format!("{}.transactional.fee", path), transactional.fee)?;
        }
        Ok(())
    }
}

/// All revenue streams of a scenario
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RevenuePlan {
    #[serde(default)]
    pub streams: Vec<RevenueStream>,

    /// Non-subscription recurring revenue, billed and recognised monthly
    #[serde(default)]
    pub other_recurring_revenue: MonthlySchedule,

    /// Plan-level professional services, billed and recognised monthly
    #[serde(default)]
    pub professional_services_revenue: MonthlySchedule,
}

impl RevenuePlan {
    pub fn with_streams(streams: Vec<RevenueStream>) -> Self {
        Self {
            streams,
            other_recurring_revenue: MonthlySchedule::zero(),
            professional_services_revenue: MonthlySchedule::zero(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (i, stream) in self.streams.iter().enumerate() {
            stream.validate(&format!("revenue.streams[{}]", i))?;
        }
        self.other_recurring_revenue
            .validate_non_negative("revenue.other_recurring_revenue")?;
        self.professional_services_revenue
            .validate_non_negative("revenue.professional_services_revenue")?;
        Ok(())
    }
}
