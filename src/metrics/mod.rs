//! The five irrigation performance metrics.
//!
//! Every module is a pure function from typed records to a serializable
//! report; modules never call each other. `compute_from_csv` is the single
//! entry point that loads a file, validates it and runs one metric.

pub mod adequacy;
pub mod cropping_intensity;
pub mod equity;
pub mod irrigation_utilization;
pub mod productivity;

use crate::error::{IpaError, Result};
use crate::loader::{load_records, LoadReport};
use crate::types::{
    AdequacyRecord, CroppingRecord, EquityRecord, Metric, ProductivityRecord, UtilizationRecord,
};
use crate::util::usable_reference_area;
use serde::Serialize;
use std::path::Path;

/// A reference area (CCA) that has been checked to be positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceArea(f64);

impl ReferenceArea {
    pub fn new(value: f64) -> Result<Self> {
        if usable_reference_area(value) {
            Ok(ReferenceArea(value))
        } else {
            Err(IpaError::InvalidReferenceArea(value))
        }
    }

    /// Rejects a missing value as well as a non-positive one.
    pub fn require(value: Option<f64>, metric: Metric) -> Result<Self> {
        match value {
            Some(v) => ReferenceArea::new(v),
            None => Err(IpaError::MissingReferenceArea {
                metric: metric.to_string(),
            }),
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Which metric to run, with its parameters.
#[derive(Debug, Clone)]
pub enum MetricRequest {
    Adequacy(adequacy::AdequacyOptions),
    Productivity,
    Equity { crop_id: Option<u8> },
    CroppingIntensity { cca: ReferenceArea },
    IrrigationUtilization { cca: ReferenceArea },
}

impl MetricRequest {
    pub fn metric(&self) -> Metric {
        match self {
            MetricRequest::Adequacy(_) => Metric::Adequacy,
            MetricRequest::Productivity => Metric::Productivity,
            MetricRequest::Equity { .. } => Metric::Equity,
            MetricRequest::CroppingIntensity { .. } => Metric::CroppingIntensity,
            MetricRequest::IrrigationUtilization { .. } => Metric::IrrigationUtilization,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricReport {
    Adequacy(adequacy::AdequacyReport),
    Productivity(productivity::ProductivityReport),
    Equity(equity::EquityReport),
    CroppingIntensity(cropping_intensity::CroppingIntensityReport),
    IrrigationUtilization(irrigation_utilization::UtilizationReport),
}

/// Loads `path`, checks the metric's column contract and computes it.
/// Nothing is computed when the contract is violated.
pub fn compute_from_csv(
    path: impl AsRef<Path>,
    request: &MetricRequest,
) -> Result<(MetricReport, LoadReport)> {
    let path = path.as_ref();
    let out = match request {
        MetricRequest::Adequacy(options) => {
            let loaded = load_records::<AdequacyRecord>(path)?;
            (
                MetricReport::Adequacy(adequacy::compute(&loaded.records, options)),
                loaded.report,
            )
        }
        MetricRequest::Productivity => {
            let loaded = load_records::<ProductivityRecord>(path)?;
            (
                MetricReport::Productivity(productivity::compute(&loaded.records)),
                loaded.report,
            )
        }
        MetricRequest::Equity { crop_id } => {
            let loaded = load_records::<EquityRecord>(path)?;
            (
                MetricReport::Equity(equity::compute(&loaded.records, *crop_id)),
                loaded.report,
            )
        }
        MetricRequest::CroppingIntensity { cca } => {
            let loaded = load_records::<CroppingRecord>(path)?;
            (
                MetricReport::CroppingIntensity(cropping_intensity::compute(
                    &loaded.records,
                    cca.value(),
                )),
                loaded.report,
            )
        }
        MetricRequest::IrrigationUtilization { cca } => {
            let loaded = load_records::<UtilizationRecord>(path)?;
            (
                MetricReport::IrrigationUtilization(irrigation_utilization::compute(
                    &loaded.records,
                    cca.value(),
                )),
                loaded.report,
            )
        }
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_area_validation() {
        assert_eq!(ReferenceArea::new(1000.0).unwrap().value(), 1000.0);
        assert!(matches!(
            ReferenceArea::new(0.0),
            Err(IpaError::InvalidReferenceArea(_))
        ));
        assert!(ReferenceArea::new(-1.0).is_err());
        assert!(ReferenceArea::new(f64::NAN).is_err());
        assert!(matches!(
            ReferenceArea::require(None, Metric::CroppingIntensity),
            Err(IpaError::MissingReferenceArea { .. })
        ));
    }

    #[test]
    fn test_request_metric() {
        let request = MetricRequest::Equity { crop_id: Some(2) };
        assert_eq!(request.metric(), Metric::Equity);
        assert_eq!(
            MetricRequest::Adequacy(Default::default()).metric(),
            Metric::Adequacy
        );
    }
}
