//! Irrigation utilization: irrigated area of a year over the CCA. Season
//! and crop are ignored.

use crate::dimensions::distinct_years;
use crate::types::UtilizationRecord;
use crate::util::{average, ratio, usable_reference_area};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationRow {
    pub year: i32,
    pub irrigated_area: f64,
    pub utilization_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationAverage {
    pub irrigated_area: f64,
    pub utilization_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationReport {
    pub data: Vec<UtilizationRow>,
    pub average: UtilizationAverage,
    pub cca: f64,
    /// Set when the CCA was not positive and every ratio was forced to 0.
    pub ratios_suppressed: bool,
}

pub fn compute(records: &[UtilizationRecord], cca: f64) -> UtilizationReport {
    let ratios_suppressed = !usable_reference_area(cca);
    if ratios_suppressed {
        warn!(cca, "Reference area is not positive; utilization ratios set to 0");
    }

    let mut irrigated: BTreeMap<i32, f64> = BTreeMap::new();
    for r in records.iter().filter(|r| r.status.is_irrigated()) {
        *irrigated.entry(r.year).or_insert(0.0) += r.area;
    }

    // Years without any irrigated row still get a zero row.
    let data: Vec<UtilizationRow> = distinct_years(records.iter().map(|r| r.year))
        .into_iter()
        .map(|year| {
            let irrigated_area = irrigated.get(&year).copied().unwrap_or(0.0);
            UtilizationRow {
                year,
                irrigated_area,
                utilization_ratio: ratio(irrigated_area, cca),
            }
        })
        .collect();

    let average = UtilizationAverage {
        irrigated_area: average(&data.iter().map(|r| r.irrigated_area).collect::<Vec<_>>()),
        utilization_ratio: average(&data.iter().map(|r| r.utilization_ratio).collect::<Vec<_>>()),
    };

    info!(rows = records.len(), years = data.len(), cca, "Irrigation utilization computed");
    UtilizationReport {
        data,
        average,
        cca,
        ratios_suppressed,
    }
}
