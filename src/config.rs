//! Runtime settings read from the environment (a `.env` file is loaded by
//! the binary before this runs).

use crate::util::parse_f64_safe;
use std::path::PathBuf;

pub const ENV_CCA: &str = "IPA_CCA";
pub const ENV_OUTPUT_DIR: &str = "IPA_OUTPUT_DIR";
pub const ENV_PREVIEW_ROWS: &str = "IPA_PREVIEW_ROWS";

const DEFAULT_PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Reference area used when `--cca` is not given.
    pub default_cca: Option<f64>,
    /// Directory that relative output paths are resolved against.
    pub output_dir: PathBuf,
    pub preview_rows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_cca: None,
            output_dir: PathBuf::from("."),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        Settings {
            default_cca: parse_f64_safe(lookup(ENV_CCA).as_deref()),
            output_dir: lookup(ENV_OUTPUT_DIR)
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            preview_rows: lookup(ENV_PREVIEW_ROWS)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.preview_rows),
        }
    }

    pub fn resolve_output(&self, path: &str) -> PathBuf {
        let p = PathBuf::from(path);
        if p.is_absolute() {
            p
        } else {
            self.output_dir.join(p)
        }
    }
}
