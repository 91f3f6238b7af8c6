//! Persistence and terminal previews for metric reports.
//!
//! Reports are written as a JSON envelope and, for the season metrics, a
//! summary CSV whose "no value" cells stay empty. Previews are markdown
//! tables rounded to each metric's display precision.

use crate::error::Result;
use crate::loader::LoadReport;
use crate::metrics::cropping_intensity::{CategoryTable, CroppingIntensityReport};
use crate::metrics::irrigation_utilization::UtilizationReport;
use crate::metrics::productivity::{AveragedTable, ProductivityReport};
use crate::metrics::MetricReport;
use crate::summary::{SeasonSummary, SeasonSummaryRow};
use crate::types::{CropMatrix, Metric, SeasonColumn};
use crate::util::{format_cell, format_number};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};
use tracing::debug;

/// What gets written to the JSON output file.
#[derive(Debug, Serialize)]
pub struct ReportEnvelope<'a> {
    pub generated_at: DateTime<Utc>,
    pub metric: Metric,
    pub source: String,
    pub rows: &'a LoadReport,
    pub result: &'a MetricReport,
}

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), rows = rows.len(), "Writing CSV");
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Writing JSON");
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Season summary of a report, when the metric has one.
pub fn season_summary(report: &MetricReport) -> Option<&SeasonSummary> {
    match report {
        MetricReport::Adequacy(r) => Some(&r.seasons),
        MetricReport::Productivity(r) => Some(&r.seasons),
        MetricReport::Equity(r) => Some(&r.seasons),
        MetricReport::CroppingIntensity(_) | MetricReport::IrrigationUtilization(_) => None,
    }
}

#[derive(Tabled, Clone)]
struct SummaryDisplay {
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "Kharif")]
    kharif: String,
    #[tabled(rename = "Rabi")]
    rabi: String,
    #[tabled(rename = "Zaid")]
    zaid: String,
    #[tabled(rename = "Annual")]
    annual: String,
}

impl SummaryDisplay {
    fn from_row(row: &SeasonSummaryRow, decimals: usize) -> Self {
        SummaryDisplay {
            year: row.year.to_string(),
            kharif: format_cell(row.kharif, decimals),
            rabi: format_cell(row.rabi, decimals),
            zaid: format_cell(row.zaid, decimals),
            annual: format_cell(row.annual, decimals),
        }
    }
}

fn preview_table_rows<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

/// Summary rows followed by the `AVERAGE` row.
pub fn render_summary(summary: &SeasonSummary, decimals: usize, max_rows: usize) -> String {
    let mut rows: Vec<SummaryDisplay> = summary
        .summary
        .iter()
        .take(max_rows)
        .map(|r| SummaryDisplay::from_row(r, decimals))
        .collect();
    let avg = |c: SeasonColumn| format_number(summary.average.get(c), decimals);
    rows.push(SummaryDisplay {
        year: "AVERAGE".to_string(),
        kharif: avg(SeasonColumn::Kharif),
        rabi: avg(SeasonColumn::Rabi),
        zaid: avg(SeasonColumn::Zaid),
        annual: avg(SeasonColumn::Annual),
    });
    preview_table_rows(&rows, rows.len())
}

fn render_grid(header: Vec<String>, body: Vec<Vec<String>>) -> String {
    if body.is_empty() {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(header);
    for record in body {
        builder.push_record(record);
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn render_matrix(
    matrix: &CropMatrix<Option<f64>>,
    decimals: usize,
    max_rows: usize,
) -> String {
    let mut header = vec!["Year".to_string()];
    header.extend(matrix.crops.iter().cloned());
    let body = matrix
        .rows
        .iter()
        .take(max_rows)
        .map(|r| {
            let mut record = vec![r.year.to_string()];
            record.extend(r.values.iter().map(|v| format_cell(*v, decimals)));
            record
        })
        .collect();
    render_grid(header, body)
}

fn render_averaged(table: &AveragedTable<Option<f64>>, decimals: usize, max_rows: usize) -> String {
    let mut header = vec!["Year".to_string()];
    header.extend(table.matrix.crops.iter().cloned());
    header.push("Average".to_string());
    let mut body: Vec<Vec<String>> = table
        .matrix
        .rows
        .iter()
        .zip(&table.row_average)
        .take(max_rows)
        .map(|(r, avg)| {
            let mut record = vec![r.year.to_string()];
            record.extend(r.values.iter().map(|v| format_cell(*v, decimals)));
            record.push(format_cell(*avg, decimals));
            record
        })
        .collect();
    if !body.is_empty() {
        let mut record = vec!["Average".to_string()];
        record.extend(table.column_average.iter().map(|v| format_cell(*v, decimals)));
        record.push(format_cell(table.overall_average, decimals));
        body.push(record);
    }
    render_grid(header, body)
}

fn render_categories(
    table: &CategoryTable,
    labels: &[String],
    decimals: usize,
    max_rows: usize,
) -> String {
    let mut header = vec!["Year".to_string()];
    header.extend(labels.iter().cloned());
    let mut body: Vec<Vec<String>> = table
        .data
        .iter()
        .take(max_rows)
        .map(|r| {
            let mut record = vec![r.year.to_string()];
            record.extend(r.values.iter().map(|v| format_number(*v, decimals)));
            record
        })
        .collect();
    if !body.is_empty() {
        let mut record = vec!["AVERAGE".to_string()];
        record.extend(table.average.iter().map(|v| format_number(*v, decimals)));
        body.push(record);
    }
    render_grid(header, body)
}

fn render_cropping(report: &CroppingIntensityReport, max_rows: usize) -> String {
    let labels: Vec<String> = report.crop_labels.values().map(|l| l.to_string()).collect();
    let mut out = String::new();
    out.push_str("Cropped Area by Crop ID\n\n");
    out.push_str(&render_categories(&report.cropped_area, &labels, 0, max_rows));
    out.push_str("\n\nCropped Area (normalized by CCA)\n\n");
    out.push_str(&render_categories(&report.normalized_area, &labels, 3, max_rows));
    out.push_str("\n\nCropping Intensity\n\n");
    let header = vec![
        "Year".to_string(),
        "Cropping Intensity".to_string(),
        "Total Cropped Area".to_string(),
    ];
    let mut body: Vec<Vec<String>> = report
        .intensity
        .data
        .iter()
        .take(max_rows)
        .map(|r| {
            vec![
                r.year.to_string(),
                format_number(r.cropping_intensity, 2),
                format_number(r.total_cropped_area, 0),
            ]
        })
        .collect();
    if !body.is_empty() {
        body.push(vec![
            "AVERAGE".to_string(),
            format_number(report.intensity.average.cropping_intensity, 2),
            format_number(report.intensity.average.total_cropped_area, 0),
        ]);
    }
    out.push_str(&render_grid(header, body));
    out
}

fn render_utilization(report: &UtilizationReport, max_rows: usize) -> String {
    let header = vec![
        "Year".to_string(),
        "Irrigated Area".to_string(),
        "Utilization Ratio".to_string(),
    ];
    let mut body: Vec<Vec<String>> = report
        .data
        .iter()
        .take(max_rows)
        .map(|r| {
            vec![
                r.year.to_string(),
                format_number(r.irrigated_area, 2),
                format_number(r.utilization_ratio, 4),
            ]
        })
        .collect();
    if !body.is_empty() {
        body.push(vec![
            "AVERAGE".to_string(),
            format_number(report.average.irrigated_area, 2),
            format_number(report.average.utilization_ratio, 4),
        ]);
    }
    render_grid(header, body)
}

fn render_productivity(report: &ProductivityReport, max_rows: usize) -> String {
    let mut out = render_summary(&report.seasons, 2, max_rows);
    for column in SeasonColumn::ALL {
        if let Some(season) = report.season_tables.get(column) {
            out.push_str(&format!("\n\nProductivity ({})\n\n", column.key()));
            out.push_str(&render_averaged(&season.productivity, 2, max_rows));
        }
    }
    out
}

/// Markdown preview of any report, at most `max_rows` years per table.
pub fn render_report(report: &MetricReport, max_rows: usize) -> String {
    match report {
        MetricReport::Adequacy(r) => {
            let mut out = render_summary(&r.seasons, 2, max_rows);
            for column in SeasonColumn::ALL {
                if let Some(season) = r.season_results.get(column) {
                    out.push_str(&format!("\n\nAdequacy by crop ({})\n\n", column.key()));
                    out.push_str(&render_matrix(&season.adequacy, 2, max_rows));
                }
            }
            out
        }
        MetricReport::Productivity(r) => render_productivity(r, max_rows),
        MetricReport::Equity(r) => render_summary(&r.seasons, 3, max_rows),
        MetricReport::CroppingIntensity(r) => render_cropping(r, max_rows),
        MetricReport::IrrigationUtilization(r) => render_utilization(r, max_rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::SeasonAverages;
    use crate::types::MatrixRow;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_summary() -> SeasonSummary {
        SeasonSummary {
            summary: vec![SeasonSummaryRow {
                year: 2020,
                kharif: Some(0.1234),
                rabi: None,
                zaid: None,
                annual: Some(0.5),
            }],
            average: SeasonAverages {
                kharif: 0.1234,
                rabi: 0.0,
                zaid: 0.0,
                annual: 0.5,
            },
        }
    }

    #[test]
    fn test_render_summary_blank_cells_and_average_row() {
        let out = render_summary(&sample_summary(), 2, 10);
        assert!(out.contains("| 2020"));
        assert!(out.contains("0.12"));
        assert!(out.contains("AVERAGE"));
        assert!(out.contains("Kharif"));
    }

    #[test]
    fn test_render_matrix() {
        let m = CropMatrix {
            crops: vec!["Rice".to_string()],
            rows: vec![MatrixRow {
                year: 2021,
                values: vec![Some(0.456)],
            }],
        };
        let out = render_matrix(&m, 2, 5);
        assert!(out.contains("Rice"));
        assert!(out.contains("0.46"));
        let empty: CropMatrix<Option<f64>> = CropMatrix {
            crops: vec![],
            rows: vec![],
        };
        assert_eq!(render_matrix(&empty, 2, 5), "(no rows)");
    }

    #[test]
    fn test_write_summary_csv_leaves_blanks() {
        let path = temp_path("ipa_stats_test_summary.csv");
        let _ = fs::remove_file(&path);

        write_csv(&path, &sample_summary().summary).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "year,kharif,rabi,zaid,annual");
        assert_eq!(lines[1], "2020,0.1234,,,0.5");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json_nulls() {
        let path = temp_path("ipa_stats_test_summary.json");
        let _ = fs::remove_file(&path);

        write_json(&path, &sample_summary()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["summary"][0]["rabi"].is_null());
        assert_eq!(value["average"]["rabi"], 0.0);

        fs::remove_file(&path).unwrap();
    }
}
