//! Cropping intensity: total cropped area of a year over the culturable
//! command area (CCA), broken down by the eight crop categories.

use crate::dimensions::{distinct_years, CATEGORY_COUNT, CROP_CATEGORIES};
use crate::types::CroppingRecord;
use crate::util::{average, ratio, usable_reference_area};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Areas of categories 1..=8, index 0 holding category 1.
pub type CategoryValues = [f64; CATEGORY_COUNT];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub year: i32,
    pub values: CategoryValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTable {
    pub data: Vec<CategoryRow>,
    /// The `AVERAGE` row: mean across years of each category.
    pub average: CategoryValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntensityRow {
    pub year: i32,
    pub cropping_intensity: f64,
    pub total_cropped_area: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntensityAverage {
    pub cropping_intensity: f64,
    pub total_cropped_area: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntensityTable {
    pub data: Vec<IntensityRow>,
    pub average: IntensityAverage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CroppingIntensityReport {
    pub cropped_area: CategoryTable,
    pub normalized_area: CategoryTable,
    pub intensity: IntensityTable,
    pub crop_labels: BTreeMap<u8, &'static str>,
    pub cca: f64,
    /// Set when the CCA was not positive and every ratio was forced to 0.
    pub ratios_suppressed: bool,
}

pub fn compute(records: &[CroppingRecord], cca: f64) -> CroppingIntensityReport {
    let ratios_suppressed = !usable_reference_area(cca);
    if ratios_suppressed {
        warn!(cca, "Reference area is not positive; cropping intensity ratios set to 0");
    }

    let years = distinct_years(records.iter().map(|r| r.year));
    let mut areas: BTreeMap<i32, CategoryValues> = BTreeMap::new();
    for r in records {
        let slot = usize::from(r.crop_id).wrapping_sub(1);
        if slot < CATEGORY_COUNT {
            areas.entry(r.year).or_insert([0.0; CATEGORY_COUNT])[slot] += r.area;
        }
    }

    let mut cropped = Vec::with_capacity(years.len());
    let mut normalized = Vec::with_capacity(years.len());
    let mut intensity = Vec::with_capacity(years.len());
    for &year in &years {
        let values = areas.get(&year).copied().unwrap_or([0.0; CATEGORY_COUNT]);
        let total: f64 = values.iter().sum();
        cropped.push(CategoryRow { year, values });
        normalized.push(CategoryRow {
            year,
            values: values.map(|v| ratio(v, cca)),
        });
        intensity.push(IntensityRow {
            year,
            cropping_intensity: ratio(total, cca),
            total_cropped_area: total,
        });
    }

    let ratios: Vec<f64> = intensity.iter().map(|r| r.cropping_intensity).collect();
    let totals: Vec<f64> = intensity.iter().map(|r| r.total_cropped_area).collect();
    let intensity_average = IntensityAverage {
        cropping_intensity: average(&ratios),
        total_cropped_area: average(&totals),
    };

    info!(
        rows = records.len(),
        years = years.len(),
        cca,
        "Cropping intensity computed"
    );
    CroppingIntensityReport {
        cropped_area: category_table(cropped),
        normalized_area: category_table(normalized),
        intensity: IntensityTable {
            data: intensity,
            average: intensity_average,
        },
        crop_labels: (*CROP_CATEGORIES).clone(),
        cca,
        ratios_suppressed,
    }
}

fn category_table(data: Vec<CategoryRow>) -> CategoryTable {
    let mut average_row = [0.0; CATEGORY_COUNT];
    for (i, slot) in average_row.iter_mut().enumerate() {
        *slot = average(&data.iter().map(|r| r.values[i]).collect::<Vec<_>>());
    }
    CategoryTable {
        data,
        average: average_row,
    }
}
