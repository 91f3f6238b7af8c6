use crate::dimensions::is_crop_category;
use crate::error::{IpaError, Result};
use crate::types::{
    AdequacyRecord, CroppingRecord, EquityRecord, Metric, ProductivityRecord, RawRow, Season,
    Status, UtilizationRecord, COL_CROP_ID, COL_CROP_TYPE,
};
use crate::util::{parse_code, parse_f64_safe};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped_rows: usize,
}

#[derive(Debug, Clone)]
pub struct LoadedRecords<R> {
    pub records: Vec<R>,
    pub report: LoadReport,
}

/// A metric's fixed-shape record, built from a raw CSV row.
pub trait FromRawRow: Sized {
    const METRIC: Metric;

    /// `None` when a required value is missing or unparseable.
    fn from_raw(raw: RawRow) -> Option<Self>;
}

/// Checks the header against the metric's column contract.
pub fn validate_columns(headers: &StringRecord, metric: Metric) -> Result<()> {
    let has = |name: &str| headers.iter().any(|h| h == name);
    for column in metric.required_columns() {
        if !has(column) {
            return Err(IpaError::MissingColumn {
                column: column.to_string(),
                metric: metric.to_string(),
            });
        }
    }
    if metric.needs_crop_column() && !has(COL_CROP_TYPE) && !has(COL_CROP_ID) {
        return Err(IpaError::MissingCropColumn {
            metric: metric.to_string(),
        });
    }
    Ok(())
}

pub fn load_records<R: FromRawRow>(path: impl AsRef<Path>) -> Result<LoadedRecords<R>> {
    let path = path.as_ref();
    info!(path = %path.display(), metric = %R::METRIC, "Loading records");
    let file = std::fs::File::open(path)?;
    read_records(file)
}

/// Reads records from any CSV source. The header is validated before a
/// single row is read; rows with unusable values are skipped and counted.
pub fn read_records<R: FromRawRow, T: Read>(source: T) -> Result<LoadedRecords<R>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(source);
    let headers = rdr.headers()?.clone();
    validate_columns(&headers, R::METRIC)?;

    let mut total_rows = 0usize;
    let mut skipped_rows = 0usize;
    let mut records = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(row = total_rows, error = %e, "Row failed to deserialize");
                skipped_rows += 1;
                continue;
            }
        };
        match R::from_raw(row) {
            Some(record) => records.push(record),
            None => skipped_rows += 1,
        }
    }

    if skipped_rows > 0 {
        warn!(skipped_rows, total_rows, "Rows skipped due to parse/validation errors");
    }
    let report = LoadReport {
        total_rows,
        loaded_rows: records.len(),
        skipped_rows,
    };
    Ok(LoadedRecords { records, report })
}

fn year(raw: &RawRow) -> Option<i32> {
    parse_code(raw.year.as_deref()).and_then(|y| i32::try_from(y).ok())
}

fn season(raw: &RawRow) -> Option<Season> {
    parse_code(raw.season.as_deref()).and_then(Season::from_code)
}

fn crop_id(raw: &RawRow) -> Option<u8> {
    parse_code(raw.crop_id.as_deref()).and_then(|id| u8::try_from(id).ok())
}

/// `Crop Type` when present, otherwise the crop id as text.
fn crop_key(raw: &RawRow) -> Option<String> {
    match raw.crop_type.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => Some(c.to_string()),
        _ => crop_id(raw).map(|id| id.to_string()),
    }
}

fn status(raw: &RawRow) -> Status {
    Status::parse(raw.status.as_deref())
}

fn number(value: &Option<String>) -> Option<f64> {
    parse_f64_safe(value.as_deref())
}

impl FromRawRow for AdequacyRecord {
    const METRIC: Metric = Metric::Adequacy;

    fn from_raw(raw: RawRow) -> Option<Self> {
        Some(AdequacyRecord {
            year: year(&raw)?,
            season: season(&raw)?,
            crop: crop_key(&raw)?,
            area: number(&raw.area)?,
            status: status(&raw),
            eta: number(&raw.eta)?,
            eta90: number(&raw.eta90)?,
        })
    }
}

impl FromRawRow for ProductivityRecord {
    const METRIC: Metric = Metric::Productivity;

    fn from_raw(raw: RawRow) -> Option<Self> {
        Some(ProductivityRecord {
            year: year(&raw)?,
            season: season(&raw)?,
            crop: crop_key(&raw)?,
            area: number(&raw.area)?,
            status: status(&raw),
            eta: number(&raw.eta)?,
            tbp: number(&raw.tbp)?,
        })
    }
}

impl FromRawRow for EquityRecord {
    const METRIC: Metric = Metric::Equity;

    fn from_raw(raw: RawRow) -> Option<Self> {
        Some(EquityRecord {
            year: year(&raw)?,
            season: season(&raw)?,
            crop_id: crop_id(&raw),
            status: status(&raw),
            eta: number(&raw.eta)?,
        })
    }
}

impl FromRawRow for CroppingRecord {
    const METRIC: Metric = Metric::CroppingIntensity;

    fn from_raw(raw: RawRow) -> Option<Self> {
        let crop_id = crop_id(&raw).filter(|id| is_crop_category(*id))?;
        Some(CroppingRecord {
            year: year(&raw)?,
            crop_id,
            area: number(&raw.area)?,
        })
    }
}

impl FromRawRow for UtilizationRecord {
    const METRIC: Metric = Metric::IrrigationUtilization;

    fn from_raw(raw: RawRow) -> Option<Self> {
        Some(UtilizationRecord {
            year: year(&raw)?,
            area: number(&raw.area)?,
            status: status(&raw),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADEQUACY_CSV: &str = "\
year,Season,Crop Type,Area,status,ETa,ETa90
2019,1,Rice,100,IRRIGATED,400,500
2019.0,1,Cotton,\"1,200\",irrigated,450,500
2019,9,Rice,100,IRRIGATED,400,500
2019,1,Rice,n/a,IRRIGATED,400,500
";

    #[test]
    fn test_reads_and_skips_bad_rows() {
        let loaded: LoadedRecords<AdequacyRecord> = read_records(ADEQUACY_CSV.as_bytes()).unwrap();
        assert_eq!(loaded.report.total_rows, 4);
        assert_eq!(loaded.report.loaded_rows, 2);
        assert_eq!(loaded.report.skipped_rows, 2);
        let cotton = &loaded.records[1];
        assert_eq!(cotton.year, 2019);
        assert_eq!(cotton.area, 1200.0);
        assert_eq!(cotton.status, Status::Irrigated);
    }

    #[test]
    fn test_missing_column_is_named() {
        let csv = "year,Season,Crop Type,Area,status,ETa\n2019,1,Rice,1,IRRIGATED,4\n";
        let err = read_records::<AdequacyRecord, _>(csv.as_bytes()).unwrap_err();
        match err {
            IpaError::MissingColumn { column, .. } => assert_eq!(column, "ETa90"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_exponent_notation_is_loaded() {
        let csv = "\
year,Season,Crop Type,Area,status,ETa,ETa90
2019,1,Rice,100,IRRIGATED,4e2,5E2
2019,1,Wheat,1.0e2,IRRIGATED,400,500
";
        let loaded: LoadedRecords<AdequacyRecord> = read_records(csv.as_bytes()).unwrap();
        assert_eq!(loaded.report.loaded_rows, 2);
        assert_eq!(loaded.report.skipped_rows, 0);
        assert_eq!(loaded.records[0].eta, 400.0);
        assert_eq!(loaded.records[0].eta90, 500.0);
        assert_eq!(loaded.records[1].area, 100.0);
    }

    #[test]
    fn test_equity_rows_keep_blank_area() {
        let csv = "\
year,Season,CropID,Area,status,ETa
2020,1,1,,IRRIGATED,100
2020,1,1,10,IRRIGATED,200
2020,1,1,n/a,IRRIGATED,300
";
        let loaded: LoadedRecords<EquityRecord> = read_records(csv.as_bytes()).unwrap();
        assert_eq!(loaded.report.loaded_rows, 3);
        assert_eq!(loaded.report.skipped_rows, 0);
    }

    #[test]
    fn test_missing_crop_column() {
        let csv = "year,Season,Area,status,ETa\n2019,1,1,IRRIGATED,4\n";
        let err = read_records::<EquityRecord, _>(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IpaError::MissingCropColumn { .. }));
    }

    #[test]
    fn test_crop_id_stands_in_for_crop_type() {
        let csv = "year,Season,CropID,Area,status,ETa,TBP\n2019,4,3,10,IRRIGATED,400,8000\n";
        let loaded: LoadedRecords<ProductivityRecord> = read_records(csv.as_bytes()).unwrap();
        assert_eq!(loaded.records[0].crop, "3");
        assert_eq!(loaded.records[0].season, Season::FullYear);
    }

    #[test]
    fn test_cropping_rows_outside_categories_skipped() {
        let csv = "year,Area,CropID\n2019,10,1\n2019,10,9\n2019,10,\n";
        let loaded: LoadedRecords<CroppingRecord> = read_records(csv.as_bytes()).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.report.skipped_rows, 2);
    }

    #[test]
    fn test_header_whitespace_is_trimmed() {
        let csv = " year , Area , status \n2020,5,IRRIGATED\n";
        let loaded: LoadedRecords<UtilizationRecord> = read_records(csv.as_bytes()).unwrap();
        assert_eq!(loaded.records.len(), 1);
    }
}
