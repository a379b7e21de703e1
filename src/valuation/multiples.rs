//! Trading multiples applied to projected metrics

use serde::{Deserialize, Serialize};

use super::metrics::measure;
use crate::drivers::{Metric, MetricWindow, MultiplesInputs};
use crate::error::Result;
use crate::projection::ProjectionResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleApplication {
    pub metric: Metric,
    pub window: MetricWindow,
    pub multiple: f64,
    pub metric_value: f64,
    pub enterprise_value: f64,
    pub equity_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplesResult {
    pub net_debt: f64,
    pub applications: Vec<MultipleApplication>,
}

impl MultiplesResult {
    pub fn mean_enterprise_value(&self) -> Option<f64> {
        if self.applications.is_empty() {
            return None;
        }
        let total: f64 = self.applications.iter().map(|a| a.enterprise_value).sum();
        Some(total / self.applications.len() as f64)
    }
}

/// EV = metric × multiple; no discounting
pub fn value(inputs: &MultiplesInputs, projection: &ProjectionResult) -> Result<MultiplesResult> {
    let net_debt = projection.net_debt();
    let applications = inputs
        .applications
        .iter()
        .map(|application| {
            let metric_value = measure(projection, application.metric, application.window);
            let enterprise_value = metric_value * application.multiple;
            MultipleApplication {
                metric: application.metric,
                window: application.window,
                multiple: application.multiple,
                metric_value,
                enterprise_value,
                equity_value: enterprise_value - net_debt,
            }
        })
        .collect();
    Ok(MultiplesResult {
        net_debt,
        applications,
    })
}
