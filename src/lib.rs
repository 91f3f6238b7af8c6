//! Irrigation performance indicators (adequacy, productivity, equity,
//! cropping intensity, irrigation utilization) computed from tabular
//! agronomic records.

pub mod config;
pub mod dimensions;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod output;
pub mod summary;
pub mod types;
pub mod util;

pub use error::{IpaError, Result};
