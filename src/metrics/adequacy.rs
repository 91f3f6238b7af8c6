//! Adequacy: `1 - mean(ETa) / mean(ETa90)` per (year, crop) over irrigated
//! rows, rolled up per year with area weights. Lower is better.

use crate::dimensions::{crops_first_seen, distinct_years};
use crate::summary::{assemble, SeasonSummary};
use crate::types::{AdequacyRecord, CropMatrix, MatrixRow, Season, SeasonColumn, SeasonTables};
use crate::util::{average, weighted_mean};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Always excluded, whatever the caller passes.
pub const ALWAYS_EXCLUDED: &str = "Other Unirrigated";

const SEASONS: [(Season, SeasonColumn); 4] = [
    (Season::Annual, SeasonColumn::Annual),
    (Season::Kharif, SeasonColumn::Kharif),
    (Season::Rabi, SeasonColumn::Rabi),
    (Season::Zaid, SeasonColumn::Zaid),
];

#[derive(Debug, Clone)]
pub struct AdequacyOptions {
    pub excluded_crops: Vec<String>,
}

impl Default for AdequacyOptions {
    fn default() -> Self {
        AdequacyOptions {
            excluded_crops: vec![ALWAYS_EXCLUDED.to_string()],
        }
    }
}

impl AdequacyOptions {
    fn is_excluded(&self, crop: &str) -> bool {
        crop == ALWAYS_EXCLUDED || self.excluded_crops.iter().any(|c| c == crop)
    }
}

/// Tables of one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdequacySeason {
    /// Crops of the season in first-seen order, irrigated or not.
    pub crop_types: Vec<String>,
    pub years: Vec<i32>,
    /// Irrigated area per (year, crop).
    pub area: CropMatrix<f64>,
    pub adequacy: CropMatrix<Option<f64>>,
    /// Area-weighted adequacy per year.
    pub combined: BTreeMap<i32, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdequacyReport {
    #[serde(flatten)]
    pub seasons: SeasonSummary,
    pub season_results: SeasonTables<AdequacySeason>,
}

pub fn compute(records: &[AdequacyRecord], options: &AdequacyOptions) -> AdequacyReport {
    let mut season_results = SeasonTables::default();
    for (season, column) in SEASONS {
        season_results.set(column, season_tables(records, season, options));
    }

    let combined: Vec<(SeasonColumn, &BTreeMap<i32, Option<f64>>)> = SeasonColumn::ALL
        .iter()
        .filter_map(|c| season_results.get(*c).map(|s| (*c, &s.combined)))
        .collect();
    let seasons = assemble(&combined);

    info!(
        rows = records.len(),
        years = seasons.summary.len(),
        "Adequacy computed"
    );
    AdequacyReport {
        seasons,
        season_results,
    }
}

/// Adequacy tables of one season, or `None` when the season has no rows.
pub fn season_tables(
    records: &[AdequacyRecord],
    season: Season,
    options: &AdequacyOptions,
) -> Option<AdequacySeason> {
    let rows: Vec<&AdequacyRecord> = records
        .iter()
        .filter(|r| r.season == season && !options.is_excluded(&r.crop))
        .collect();
    if rows.is_empty() {
        debug!(season = season.code(), "No adequacy rows for season");
        return None;
    }

    let crop_types = crops_first_seen(rows.iter().map(|r| r.crop.as_str()));
    let irrigated: Vec<&AdequacyRecord> = rows
        .iter()
        .copied()
        .filter(|r| r.status.is_irrigated())
        .collect();

    let years = distinct_years(irrigated.iter().map(|r| r.year));
    let crops: Vec<String> = crop_types
        .iter()
        .filter(|c| irrigated.iter().any(|r| &r.crop == *c))
        .cloned()
        .collect();

    // (year, crop) -> (area sum, eta values, eta90 values)
    let mut groups: BTreeMap<(i32, &str), (f64, Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for r in &irrigated {
        let e = groups.entry((r.year, r.crop.as_str())).or_default();
        e.0 += r.area;
        e.1.push(r.eta);
        e.2.push(r.eta90);
    }

    let mut area_rows = Vec::with_capacity(years.len());
    let mut adequacy_rows = Vec::with_capacity(years.len());
    let mut combined = BTreeMap::new();

    for &year in &years {
        let mut areas = Vec::with_capacity(crops.len());
        let mut cells = Vec::with_capacity(crops.len());
        for crop in &crops {
            let group = groups.get(&(year, crop.as_str()));
            let area = group.map(|g| g.0).unwrap_or(0.0);
            areas.push(area);
            cells.push(group.and_then(|(area, eta, eta90)| adequacy_cell(*area, eta, eta90)));
        }

        let score = weighted_mean(
            cells
                .iter()
                .zip(&areas)
                .filter_map(|(cell, area)| cell.map(|v| (v, *area))),
        );
        combined.insert(year, score);

        area_rows.push(MatrixRow {
            year,
            values: areas,
        });
        adequacy_rows.push(MatrixRow {
            year,
            values: cells,
        });
    }

    Some(AdequacySeason {
        crop_types,
        years,
        area: CropMatrix {
            crops: crops.clone(),
            rows: area_rows,
        },
        adequacy: CropMatrix {
            crops,
            rows: adequacy_rows,
        },
        combined,
    })
}

/// Blank when the area is not positive, there are no samples, or the mean
/// reference ET is zero or not finite. Deliberately unclamped.
fn adequacy_cell(area: f64, eta: &[f64], eta90: &[f64]) -> Option<f64> {
    if area <= 0.0 || eta.is_empty() || eta90.is_empty() {
        return None;
    }
    let mean_eta90 = average(eta90);
    if mean_eta90 == 0.0 || !mean_eta90.is_finite() {
        return None;
    }
    Some(1.0 - average(eta) / mean_eta90)
}
