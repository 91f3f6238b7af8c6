//! Merges per-season year→value maps into one year-indexed summary table
//! with an average row.

use crate::types::SeasonColumn;
use crate::util::mean_present;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One year of a season summary. `None` renders blank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonSummaryRow {
    pub year: i32,
    pub kharif: Option<f64>,
    pub rabi: Option<f64>,
    pub zaid: Option<f64>,
    pub annual: Option<f64>,
}

impl SeasonSummaryRow {
    fn empty(year: i32) -> Self {
        SeasonSummaryRow {
            year,
            kharif: None,
            rabi: None,
            zaid: None,
            annual: None,
        }
    }

    pub fn get(&self, column: SeasonColumn) -> Option<f64> {
        match column {
            SeasonColumn::Kharif => self.kharif,
            SeasonColumn::Rabi => self.rabi,
            SeasonColumn::Zaid => self.zaid,
            SeasonColumn::Annual => self.annual,
        }
    }

    fn set(&mut self, column: SeasonColumn, value: Option<f64>) {
        match column {
            SeasonColumn::Kharif => self.kharif = value,
            SeasonColumn::Rabi => self.rabi = value,
            SeasonColumn::Zaid => self.zaid = value,
            SeasonColumn::Annual => self.annual = value,
        }
    }
}

/// Column means of a summary. An empty column averages to 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonAverages {
    pub kharif: f64,
    pub rabi: f64,
    pub zaid: f64,
    pub annual: f64,
}

impl SeasonAverages {
    pub fn get(&self, column: SeasonColumn) -> f64 {
        match column {
            SeasonColumn::Kharif => self.kharif,
            SeasonColumn::Rabi => self.rabi,
            SeasonColumn::Zaid => self.zaid,
            SeasonColumn::Annual => self.annual,
        }
    }

    fn set(&mut self, column: SeasonColumn, value: f64) {
        match column {
            SeasonColumn::Kharif => self.kharif = value,
            SeasonColumn::Rabi => self.rabi = value,
            SeasonColumn::Zaid => self.zaid = value,
            SeasonColumn::Annual => self.annual = value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonSummary {
    pub summary: Vec<SeasonSummaryRow>,
    pub average: SeasonAverages,
}

/// Builds the summary from the seasons that produced data. Years are the
/// union across seasons, ascending; a season without a value for a year
/// leaves that cell blank. Seasons missing from `columns` stay blank and
/// average to 0.
pub fn assemble(columns: &[(SeasonColumn, &BTreeMap<i32, Option<f64>>)]) -> SeasonSummary {
    let years: BTreeSet<i32> = columns
        .iter()
        .flat_map(|(_, values)| values.keys().copied())
        .collect();

    let summary: Vec<SeasonSummaryRow> = years
        .into_iter()
        .map(|year| {
            let mut row = SeasonSummaryRow::empty(year);
            for (column, values) in columns {
                row.set(*column, values.get(&year).copied().flatten());
            }
            row
        })
        .collect();

    let mut average = SeasonAverages::default();
    for column in SeasonColumn::ALL {
        let mean = mean_present(summary.iter().map(|r| r.get(column)));
        average.set(column, mean.unwrap_or(0.0));
    }

    SeasonSummary { summary, average }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_unions_years_and_averages() {
        let kharif = BTreeMap::from([(2019, Some(0.2)), (2020, Some(0.4))]);
        let rabi = BTreeMap::from([(2020, None), (2021, Some(0.3))]);
        let out = assemble(&[(SeasonColumn::Kharif, &kharif), (SeasonColumn::Rabi, &rabi)]);

        let years: Vec<i32> = out.summary.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2019, 2020, 2021]);
        assert_eq!(out.summary[0].rabi, None);
        assert_eq!(out.summary[2].kharif, None);
        assert!((out.average.kharif - 0.3).abs() < 1e-12);
        assert!((out.average.rabi - 0.3).abs() < 1e-12);
        // Seasons that never reported average to zero.
        assert_eq!(out.average.zaid, 0.0);
        assert_eq!(out.average.annual, 0.0);
    }

    #[test]
    fn test_assemble_all_blank_column_is_zero() {
        let zaid = BTreeMap::from([(2019, None), (2020, None)]);
        let out = assemble(&[(SeasonColumn::Zaid, &zaid)]);
        assert_eq!(out.summary.len(), 2);
        assert_eq!(out.average.zaid, 0.0);
    }

    #[test]
    fn test_assemble_nothing() {
        let out = assemble(&[]);
        assert!(out.summary.is_empty());
        assert_eq!(out.average, SeasonAverages::default());
    }
}
