// Utility helpers for parsing and basic statistics.
//
// This module centralizes the "dirty" CSV/number handling so the metric
// modules can assume clean, typed values.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (commas, spaces, text).
///
/// - Trims whitespace.
/// - Strips thousands separators like `","` before parsing.
/// - Accepts exponent notation (`4e2`, `1.0E2`).
/// - Returns `None` for text (`n/a`), `NaN` and infinities.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an integer code (year, season, crop id). Spreadsheet exports often
/// write these as `2019.0`, so a float with no fractional part is accepted.
pub fn parse_code(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 {
        Some(f as i64)
    } else {
        None
    }
}

/// Arithmetic mean; returns 0 for an empty slice to avoid NaNs.
pub fn average(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Mean of the present values only. `None` when nothing is present.
pub fn mean_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    if present.is_empty() {
        None
    } else {
        Some(average(&present))
    }
}

/// Sample standard deviation (n - 1 denominator). `None` below two values.
pub fn sample_stddev(v: &[f64]) -> Option<f64> {
    if v.len() < 2 {
        return None;
    }
    let mean = average(v);
    let ss: f64 = v.iter().map(|x| (x - mean).powi(2)).sum();
    Some((ss / (v.len() - 1) as f64).sqrt())
}

/// `Σ(value × weight) / Σ(weight)` over `(value, weight)` pairs; `None`
/// when the weights do not sum to a positive number.
pub fn weighted_mean<I>(pairs: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (num, den) = pairs
        .into_iter()
        .fold((0.0, 0.0), |(n, d), (v, w)| (n + v * w, d + w));
    if den > 0.0 {
        Some(num / den)
    } else {
        None
    }
}

/// A reference area (CCA) that ratios can be taken against.
pub fn usable_reference_area(area: f64) -> bool {
    area > 0.0 && area.is_finite()
}

/// Ratio against the reference area, 0 when the reference is unusable.
pub fn ratio(value: f64, reference_area: f64) -> f64 {
    if usable_reference_area(reference_area) {
        value / reference_area
    } else {
        0.0
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed number of decimal places plus locale-aware thousands
    // separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

/// Render an optional cell; "no value" stays blank.
pub fn format_cell(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(n) => format_number(n, decimals),
        None => String::new(),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_f64_safe() {
        assert_eq!(parse_f64_safe(Some(" 1,234.5 ")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some("NaN")), None);
        assert_eq!(parse_f64_safe(Some("inf")), None);
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("4e2")), Some(400.0));
        assert_eq!(parse_f64_safe(Some("5E2")), Some(500.0));
        assert_eq!(parse_f64_safe(Some("1.0e2")), Some(100.0));
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn test_parse_code_accepts_integral_floats() {
        assert_eq!(parse_code(Some("2019")), Some(2019));
        assert_eq!(parse_code(Some("2019.0")), Some(2019));
        assert_eq!(parse_code(Some("2.5")), None);
        assert_eq!(parse_code(Some("x")), None);
    }

    #[test]
    fn test_mean_present_skips_none() {
        assert_eq!(mean_present(vec![Some(1.0), None, Some(3.0)]), Some(2.0));
        assert_eq!(mean_present(vec![None, None]), None);
    }

    #[test]
    fn test_sample_stddev() {
        assert_eq!(sample_stddev(&[5.0]), None);
        let sd = sample_stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.138089935299395).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_mean() {
        let v = weighted_mean(vec![(1.0, 1.0), (4.0, 3.0)]).unwrap();
        assert!((v - 3.25).abs() < 1e-12);
        assert_eq!(weighted_mean(vec![(1.0, 0.0)]), None);
        assert_eq!(weighted_mean(Vec::new()), None);
    }

    #[test]
    fn test_ratio_against_reference_area() {
        assert_eq!(ratio(1200.0, 1000.0), 1.2);
        assert_eq!(ratio(1200.0, 0.0), 0.0);
        assert_eq!(ratio(1200.0, -5.0), 0.0);
        assert_eq!(ratio(1200.0, f64::NAN), 0.0);
        assert!(!usable_reference_area(f64::INFINITY));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-0.5, 1), "-0.5");
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_cell(None, 2), "");
    }
}
