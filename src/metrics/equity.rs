//! Equity: coefficient of variation of ETa (`sd / mean`) per year and
//! season over irrigated rows. Lower means more uniform distribution.

use crate::dimensions::{distinct_years, first_crop_id};
use crate::summary::{assemble, SeasonSummary};
use crate::types::{EquityRecord, Season, SeasonColumn};
use crate::util::{average, sample_stddev};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

const SEASONS: [(Season, SeasonColumn); 4] = [
    (Season::Annual, SeasonColumn::Annual),
    (Season::Kharif, SeasonColumn::Kharif),
    (Season::Rabi, SeasonColumn::Rabi),
    (Season::Zaid, SeasonColumn::Zaid),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityReport {
    #[serde(flatten)]
    pub seasons: SeasonSummary,
    /// Crop id the seasonal columns were restricted to, if any.
    pub crop_id: Option<u8>,
}

/// `crop_id` restricts the Kharif/Rabi/Zaid columns to one crop when the
/// data carries crop ids; without it the first id in the data is used.
/// The annual column never filters by crop.
pub fn compute(records: &[EquityRecord], crop_id: Option<u8>) -> EquityReport {
    let has_crop_ids = records.iter().any(|r| r.crop_id.is_some());
    let selected = if has_crop_ids {
        crop_id.or_else(|| first_crop_id(records.iter().map(|r| r.crop_id)))
    } else {
        None
    };

    let years = distinct_years(records.iter().map(|r| r.year));
    let mut columns: Vec<(SeasonColumn, BTreeMap<i32, Option<f64>>)> = Vec::new();
    for (season, column) in SEASONS {
        let filter = if season == Season::Annual { None } else { selected };
        let values = years
            .iter()
            .map(|&year| (year, equity_cell(records, year, season, filter)))
            .collect();
        columns.push((column, values));
    }

    let refs: Vec<(SeasonColumn, &BTreeMap<i32, Option<f64>>)> =
        columns.iter().map(|(c, v)| (*c, v)).collect();
    let seasons = assemble(&refs);

    info!(
        rows = records.len(),
        years = years.len(),
        crop_id = ?selected,
        "Equity computed"
    );
    EquityReport {
        seasons,
        crop_id: selected,
    }
}

/// Blank below two samples or when the mean is not positive.
fn equity_cell(
    records: &[EquityRecord],
    year: i32,
    season: Season,
    crop_id: Option<u8>,
) -> Option<f64> {
    let eta: Vec<f64> = records
        .iter()
        .filter(|r| r.year == year && r.season == season && r.status.is_irrigated())
        .filter(|r| crop_id.map_or(true, |id| r.crop_id == Some(id)))
        .map(|r| r.eta)
        .collect();
    let sd = sample_stddev(&eta)?;
    let mean = average(&eta);
    if mean > 0.0 {
        Some(sd / mean)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Status;

    fn rec(year: i32, season: Season, crop_id: Option<u8>, eta: f64) -> EquityRecord {
        EquityRecord {
            year,
            season,
            crop_id,
            status: Status::Irrigated,
            eta,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_coefficient_of_variation() {
        let records = vec![
            rec(2020, Season::Kharif, None, 100.0),
            rec(2020, Season::Kharif, None, 200.0),
            rec(2020, Season::Kharif, None, 300.0),
        ];
        let report = compute(&records, None);
        // sd = 100 (n - 1), mean = 200
        assert!(close(report.seasons.summary[0].kharif.unwrap(), 0.5));
        assert_eq!(report.crop_id, None);
    }

    #[test]
    fn test_single_sample_is_blank() {
        let records = vec![
            rec(2020, Season::Rabi, None, 100.0),
            rec(2021, Season::Rabi, None, 100.0),
            rec(2021, Season::Rabi, None, 300.0),
        ];
        let report = compute(&records, None);
        assert_eq!(report.seasons.summary.len(), 2);
        assert_eq!(report.seasons.summary[0].rabi, None);
        assert!(report.seasons.summary[1].rabi.is_some());
        // Only the valid year feeds the average.
        assert!(close(
            report.seasons.average.rabi,
            report.seasons.summary[1].rabi.unwrap()
        ));
        assert_eq!(report.seasons.average.zaid, 0.0);
    }

    #[test]
    fn test_non_positive_mean_is_blank() {
        let records = vec![
            rec(2020, Season::Zaid, None, -100.0),
            rec(2020, Season::Zaid, None, 50.0),
        ];
        let report = compute(&records, None);
        assert_eq!(report.seasons.summary[0].zaid, None);
    }

    #[test]
    fn test_crop_filter_applies_to_seasons_not_annual() {
        let records = vec![
            rec(2020, Season::Kharif, Some(2), 100.0),
            rec(2020, Season::Kharif, Some(2), 300.0),
            rec(2020, Season::Kharif, Some(5), 100.0),
            rec(2020, Season::Kharif, Some(5), 100.0),
            rec(2020, Season::Annual, Some(5), 100.0),
            rec(2020, Season::Annual, Some(2), 300.0),
        ];

        // Default picks the first crop id in the data.
        let report = compute(&records, None);
        assert_eq!(report.crop_id, Some(2));
        assert!(report.seasons.summary[0].kharif.unwrap() > 0.0);
        assert!(report.seasons.summary[0].annual.unwrap() > 0.0);

        let report = compute(&records, Some(5));
        assert_eq!(report.crop_id, Some(5));
        assert!(close(report.seasons.summary[0].kharif.unwrap(), 0.0));
        assert!(report.seasons.summary[0].annual.unwrap() > 0.0);
    }

    #[test]
    fn test_unirrigated_rows_ignored() {
        let mut other = rec(2020, Season::Kharif, None, 900.0);
        other.status = Status::Other;
        let records = vec![
            rec(2020, Season::Kharif, None, 100.0),
            rec(2020, Season::Kharif, None, 100.0),
            other,
        ];
        let report = compute(&records, None);
        assert!(close(report.seasons.summary[0].kharif.unwrap(), 0.0));
    }
}
