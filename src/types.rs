use serde::{Deserialize, Serialize};
use std::fmt;

pub const COL_YEAR: &str = "year";
pub const COL_SEASON: &str = "Season";
pub const COL_CROP_TYPE: &str = "Crop Type";
pub const COL_CROP_ID: &str = "CropID";
pub const COL_AREA: &str = "Area";
pub const COL_STATUS: &str = "status";
pub const COL_ETA: &str = "ETa";
pub const COL_ETA90: &str = "ETa90";
pub const COL_TBP: &str = "TBP";

/// One CSV row exactly as it appears in the upload. Every field is optional
/// so a file carrying only the columns of one metric still deserializes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawRow {
    #[serde(rename = "year")]
    pub year: Option<String>,
    #[serde(rename = "Season")]
    pub season: Option<String>,
    #[serde(rename = "Crop Type")]
    pub crop_type: Option<String>,
    #[serde(rename = "CropID")]
    pub crop_id: Option<String>,
    #[serde(rename = "Area")]
    pub area: Option<String>,
    #[serde(rename = "status")]
    pub status: Option<String>,
    #[serde(rename = "ETa")]
    pub eta: Option<String>,
    #[serde(rename = "ETa90")]
    pub eta90: Option<String>,
    #[serde(rename = "TBP")]
    pub tbp: Option<String>,
}

/// The five irrigation performance indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Adequacy,
    Productivity,
    Equity,
    CroppingIntensity,
    IrrigationUtilization,
}

impl Metric {
    /// Columns that must be present in the CSV header.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Metric::Adequacy => &[COL_YEAR, COL_SEASON, COL_AREA, COL_STATUS, COL_ETA, COL_ETA90],
            Metric::Productivity => &[COL_YEAR, COL_SEASON, COL_AREA, COL_STATUS, COL_ETA, COL_TBP],
            Metric::Equity => &[COL_YEAR, COL_SEASON, COL_AREA, COL_STATUS, COL_ETA],
            Metric::CroppingIntensity => &[COL_YEAR, COL_AREA, COL_CROP_ID],
            Metric::IrrigationUtilization => &[COL_YEAR, COL_AREA, COL_STATUS],
        }
    }

    /// Whether the metric additionally needs `Crop Type` or `CropID`.
    pub fn needs_crop_column(self) -> bool {
        matches!(
            self,
            Metric::Adequacy | Metric::Productivity | Metric::Equity
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Adequacy => "adequacy",
            Metric::Productivity => "productivity",
            Metric::Equity => "equity",
            Metric::CroppingIntensity => "cropping intensity",
            Metric::IrrigationUtilization => "irrigation utilization",
        };
        f.write_str(name)
    }
}

/// Season code as stored in the `Season` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Season {
    Annual,
    Kharif,
    Rabi,
    Zaid,
    /// Productivity files use code 4 for the whole-year bucket.
    FullYear,
}

impl Season {
    pub fn from_code(code: i64) -> Option<Season> {
        match code {
            0 => Some(Season::Annual),
            1 => Some(Season::Kharif),
            2 => Some(Season::Rabi),
            3 => Some(Season::Zaid),
            4 => Some(Season::FullYear),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Season::Annual => 0,
            Season::Kharif => 1,
            Season::Rabi => 2,
            Season::Zaid => 3,
            Season::FullYear => 4,
        }
    }
}

/// Output column of a season summary. Each metric decides which `Season`
/// feeds which column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonColumn {
    Kharif,
    Rabi,
    Zaid,
    Annual,
}

impl SeasonColumn {
    pub const ALL: [SeasonColumn; 4] = [
        SeasonColumn::Kharif,
        SeasonColumn::Rabi,
        SeasonColumn::Zaid,
        SeasonColumn::Annual,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SeasonColumn::Kharif => "kharif",
            SeasonColumn::Rabi => "rabi",
            SeasonColumn::Zaid => "zaid",
            SeasonColumn::Annual => "annual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Irrigated,
    Other,
}

impl Status {
    /// `IRRIGATED` in any letter case counts as irrigated; everything else,
    /// including a blank cell, does not.
    pub fn parse(s: Option<&str>) -> Status {
        match s {
            Some(v) if v.trim().eq_ignore_ascii_case("IRRIGATED") => Status::Irrigated,
            _ => Status::Other,
        }
    }

    pub fn is_irrigated(self) -> bool {
        self == Status::Irrigated
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdequacyRecord {
    pub year: i32,
    pub season: Season,
    pub crop: String,
    pub area: f64,
    pub status: Status,
    pub eta: f64,
    pub eta90: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductivityRecord {
    pub year: i32,
    pub season: Season,
    pub crop: String,
    pub area: f64,
    pub status: Status,
    pub eta: f64,
    pub tbp: f64,
}

impl ProductivityRecord {
    /// Yield per unit of water: `tbp / (eta * 10)`. A non-positive `eta`
    /// is bad input and yields 0 rather than a blank.
    pub fn productivity(&self) -> f64 {
        if self.eta > 0.0 {
            self.tbp / (self.eta * 10.0)
        } else {
            0.0
        }
    }
}

/// Equity only looks at ETa samples, so `Area` is checked in the header
/// but not carried per row.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityRecord {
    pub year: i32,
    pub season: Season,
    pub crop_id: Option<u8>,
    pub status: Status,
    pub eta: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CroppingRecord {
    pub year: i32,
    /// Always within `1..=8`; the loader drops other ids.
    pub crop_id: u8,
    pub area: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UtilizationRecord {
    pub year: i32,
    pub area: f64,
    pub status: Status,
}

/// A year-by-crop table. `values` of every row line up with `crops`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropMatrix<T> {
    pub crops: Vec<String>,
    pub rows: Vec<MatrixRow<T>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixRow<T> {
    pub year: i32,
    pub values: Vec<T>,
}

impl<T> CropMatrix<T> {
    pub fn row(&self, year: i32) -> Option<&MatrixRow<T>> {
        self.rows.iter().find(|r| r.year == year)
    }

    pub fn get(&self, year: i32, crop: &str) -> Option<&T> {
        let col = self.crops.iter().position(|c| c == crop)?;
        self.row(year).and_then(|r| r.values.get(col))
    }
}

/// Per-season results of one metric, keyed the way the dashboard expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonTables<T> {
    pub kharif: Option<T>,
    pub rabi: Option<T>,
    pub zaid: Option<T>,
    pub annual: Option<T>,
}

impl<T> Default for SeasonTables<T> {
    fn default() -> Self {
        SeasonTables {
            kharif: None,
            rabi: None,
            zaid: None,
            annual: None,
        }
    }
}

impl<T> SeasonTables<T> {
    pub fn get(&self, column: SeasonColumn) -> Option<&T> {
        match column {
            SeasonColumn::Kharif => self.kharif.as_ref(),
            SeasonColumn::Rabi => self.rabi.as_ref(),
            SeasonColumn::Zaid => self.zaid.as_ref(),
            SeasonColumn::Annual => self.annual.as_ref(),
        }
    }

    pub fn set(&mut self, column: SeasonColumn, value: Option<T>) {
        match column {
            SeasonColumn::Kharif => self.kharif = value,
            SeasonColumn::Rabi => self.rabi = value,
            SeasonColumn::Zaid => self.zaid = value,
            SeasonColumn::Annual => self.annual = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_codes() {
        assert_eq!(Season::from_code(0), Some(Season::Annual));
        assert_eq!(Season::from_code(4), Some(Season::FullYear));
        assert_eq!(Season::from_code(5), None);
        assert_eq!(Season::Zaid.code(), 3);
    }

    #[test]
    fn test_metric_contracts() {
        assert!(Metric::CroppingIntensity.required_columns().contains(&COL_CROP_ID));
        assert!(!Metric::CroppingIntensity.needs_crop_column());
        assert!(Metric::Equity.needs_crop_column());
        assert_eq!(Metric::CroppingIntensity.to_string(), "cropping intensity");
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(Status::parse(Some("IRRIGATED")), Status::Irrigated);
        assert_eq!(Status::parse(Some(" irrigated ")), Status::Irrigated);
        assert_eq!(Status::parse(Some("UNIRRIGATED")), Status::Other);
        assert_eq!(Status::parse(None), Status::Other);
    }

    #[test]
    fn test_productivity_guard() {
        let mut r = ProductivityRecord {
            year: 2020,
            season: Season::Kharif,
            crop: "Rice".into(),
            area: 1.0,
            status: Status::Irrigated,
            eta: 400.0,
            tbp: 8000.0,
        };
        assert!((r.productivity() - 2.0).abs() < 1e-12);
        r.eta = 0.0;
        assert_eq!(r.productivity(), 0.0);
    }

    #[test]
    fn test_matrix_lookup() {
        let m = CropMatrix {
            crops: vec!["Rice".to_string(), "Wheat".to_string()],
            rows: vec![MatrixRow {
                year: 2020,
                values: vec![Some(1.0), None],
            }],
        };
        assert_eq!(m.get(2020, "Rice"), Some(&Some(1.0)));
        assert_eq!(m.get(2020, "Wheat"), Some(&None));
        assert_eq!(m.get(2021, "Rice"), None);
        assert_eq!(m.get(2020, "Maize"), None);
    }
}
