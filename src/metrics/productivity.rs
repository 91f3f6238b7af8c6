//! Productivity: yield per unit of water, `TBP / (ETa * 10)`.
//!
//! Each season gets four year-by-crop tables (Area, ETa, TBP,
//! Productivity) plus an area-weighted productivity per year. This metric
//! uses season code 4 as its annual bucket.

use crate::dimensions::{crops_sorted, distinct_years};
use crate::summary::{assemble, SeasonSummary};
use crate::types::{CropMatrix, MatrixRow, ProductivityRecord, Season, SeasonColumn, SeasonTables};
use crate::util::{average, mean_present, weighted_mean};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

const SEASONS: [(Season, SeasonColumn); 4] = [
    (Season::Kharif, SeasonColumn::Kharif),
    (Season::Rabi, SeasonColumn::Rabi),
    (Season::Zaid, SeasonColumn::Zaid),
    (Season::FullYear, SeasonColumn::Annual),
];

/// A year-by-crop table with an `Average` column per year and an
/// `Average` row per crop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AveragedTable<T> {
    #[serde(flatten)]
    pub matrix: CropMatrix<T>,
    /// Lines up with `matrix.rows`.
    pub row_average: Vec<T>,
    /// Lines up with `matrix.crops`.
    pub column_average: Vec<T>,
    pub overall_average: T,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductivitySeason {
    pub years: Vec<i32>,
    pub crops: Vec<String>,
    pub area: AveragedTable<f64>,
    pub eta: AveragedTable<Option<f64>>,
    pub tbp: AveragedTable<Option<f64>>,
    /// The `row_average` column holds the weighted productivity of the year.
    pub productivity: AveragedTable<Option<f64>>,
    pub weighted_productivity: BTreeMap<i32, Option<f64>>,
    /// Plain mean of the yearly weighted values.
    pub average_weighted_productivity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductivityReport {
    #[serde(flatten)]
    pub seasons: SeasonSummary,
    pub season_tables: SeasonTables<ProductivitySeason>,
}

#[derive(Default)]
struct Cell {
    area: f64,
    eta: Vec<f64>,
    tbp: Vec<f64>,
    productivity: Vec<f64>,
}

pub fn compute(records: &[ProductivityRecord]) -> ProductivityReport {
    let mut season_tables = SeasonTables::default();
    for (season, column) in SEASONS {
        season_tables.set(column, season_tables_for(records, season));
    }

    let weighted: Vec<(SeasonColumn, &BTreeMap<i32, Option<f64>>)> = SeasonColumn::ALL
        .iter()
        .filter_map(|c| season_tables.get(*c).map(|s| (*c, &s.weighted_productivity)))
        .collect();
    let seasons = assemble(&weighted);

    info!(
        rows = records.len(),
        years = seasons.summary.len(),
        "Productivity computed"
    );
    ProductivityReport {
        seasons,
        season_tables,
    }
}

/// Tables of one season code, or `None` when no irrigated row has it.
pub fn season_tables_for(
    records: &[ProductivityRecord],
    season: Season,
) -> Option<ProductivitySeason> {
    let base: Vec<&ProductivityRecord> = records
        .iter()
        .filter(|r| r.season == season && r.status.is_irrigated())
        .collect();
    if base.is_empty() {
        debug!(season = season.code(), "No productivity rows for season");
        return None;
    }

    let years = distinct_years(base.iter().map(|r| r.year));
    let crops = crops_sorted(base.iter().map(|r| r.crop.as_str()));

    // Area sums every base row; the averages only use rows with area > 0.
    let mut cells: BTreeMap<(i32, &str), Cell> = BTreeMap::new();
    let mut weighted_pairs: BTreeMap<i32, Vec<(f64, f64)>> = BTreeMap::new();
    for r in &base {
        let cell = cells.entry((r.year, r.crop.as_str())).or_default();
        cell.area += r.area;
        if r.area > 0.0 {
            let p = r.productivity();
            cell.eta.push(r.eta);
            cell.tbp.push(r.tbp);
            cell.productivity.push(p);
            weighted_pairs.entry(r.year).or_default().push((p, r.area));
        }
    }

    let mut area_rows = Vec::with_capacity(years.len());
    let mut eta_rows = Vec::with_capacity(years.len());
    let mut tbp_rows = Vec::with_capacity(years.len());
    let mut prod_rows = Vec::with_capacity(years.len());
    let mut weighted_productivity = BTreeMap::new();

    for &year in &years {
        let mut areas = Vec::with_capacity(crops.len());
        let mut etas = Vec::with_capacity(crops.len());
        let mut tbps = Vec::with_capacity(crops.len());
        let mut prods = Vec::with_capacity(crops.len());
        for crop in &crops {
            match cells.get(&(year, crop.as_str())) {
                Some(cell) => {
                    areas.push(cell.area);
                    etas.push(mean_if_area(cell.area, &cell.eta));
                    tbps.push(mean_if_area(cell.area, &cell.tbp));
                    prods.push(mean_of(&cell.productivity));
                }
                None => {
                    areas.push(0.0);
                    etas.push(None);
                    tbps.push(None);
                    prods.push(None);
                }
            }
        }
        let weighted = weighted_pairs
            .get(&year)
            .and_then(|pairs| weighted_mean(pairs.iter().copied()));
        weighted_productivity.insert(year, weighted);

        area_rows.push(MatrixRow { year, values: areas });
        eta_rows.push(MatrixRow { year, values: etas });
        tbp_rows.push(MatrixRow { year, values: tbps });
        prod_rows.push(MatrixRow { year, values: prods });
    }

    let average_weighted_productivity = mean_present(weighted_productivity.values().copied());

    let area = area_table(CropMatrix {
        crops: crops.clone(),
        rows: area_rows,
    });
    let eta = optional_table(CropMatrix {
        crops: crops.clone(),
        rows: eta_rows,
    });
    let tbp = optional_table(CropMatrix {
        crops: crops.clone(),
        rows: tbp_rows,
    });

    let prod_matrix = CropMatrix {
        crops: crops.clone(),
        rows: prod_rows,
    };
    let productivity = AveragedTable {
        row_average: years.iter().map(|y| weighted_productivity[y]).collect(),
        column_average: column_means(&prod_matrix),
        overall_average: average_weighted_productivity,
        matrix: prod_matrix,
    };

    Some(ProductivitySeason {
        years,
        crops,
        area,
        eta,
        tbp,
        productivity,
        weighted_productivity,
        average_weighted_productivity,
    })
}

/// ETa and TBP are blank wherever the summed area is zero, even if raw
/// values exist.
fn mean_if_area(area: f64, values: &[f64]) -> Option<f64> {
    if area > 0.0 {
        mean_of(values)
    } else {
        None
    }
}

fn mean_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(average(values))
    }
}

fn area_table(matrix: CropMatrix<f64>) -> AveragedTable<f64> {
    let row_average: Vec<f64> = matrix.rows.iter().map(|r| average(&r.values)).collect();
    let column_average = (0..matrix.crops.len())
        .map(|i| average(&matrix.rows.iter().map(|r| r.values[i]).collect::<Vec<_>>()))
        .collect();
    let overall_average = average(&row_average);
    AveragedTable {
        matrix,
        row_average,
        column_average,
        overall_average,
    }
}

fn optional_table(matrix: CropMatrix<Option<f64>>) -> AveragedTable<Option<f64>> {
    let row_average: Vec<Option<f64>> = matrix
        .rows
        .iter()
        .map(|r| mean_present(r.values.iter().copied()))
        .collect();
    let column_average = column_means(&matrix);
    let overall_average = mean_present(row_average.iter().copied());
    AveragedTable {
        matrix,
        row_average,
        column_average,
        overall_average,
    }
}

fn column_means(matrix: &CropMatrix<Option<f64>>) -> Vec<Option<f64>> {
    (0..matrix.crops.len())
        .map(|i| mean_present(matrix.rows.iter().map(|r| r.values[i])))
        .collect()
}
