use thiserror::Error;

/// Errors raised at the boundary between a CSV file and the metric engine.
///
/// Cell-level problems (empty groups, zero denominators) are never errors;
/// they surface as `None` cells in the reports.
#[derive(Error, Debug)]
pub enum IpaError {
    #[error("Missing required column: {column} (needed by {metric})")]
    MissingColumn { column: String, metric: String },
    #[error("Missing crop column: {metric} needs either 'Crop Type' or 'CropID'")]
    MissingCropColumn { metric: String },
    #[error("A reference area (CCA) is required for {metric}")]
    MissingReferenceArea { metric: String },
    #[error("Reference area (CCA) must be positive, got {0}")]
    InvalidReferenceArea(f64),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type for `Result<T, IpaError>`.
pub type Result<T> = std::result::Result<T, IpaError>;
