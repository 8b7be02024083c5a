//! Display formatting for indicator values.
//!
//! Absent values only become `N/A` (or zero in charts) here, never
//! earlier in the pipeline.

use crate::catalog::Indicator;

/// Placeholder for values that are not available.
pub const NOT_AVAILABLE: &str = "N/A";

/// Format a number with thousands separators and at most
/// `max_fraction_digits` decimals, trailing zeros trimmed.
pub fn group_thousands(value: f64, max_fraction_digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let formatted = format!("{:.*}", max_fraction_digits, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part.trim_end_matches('0')),
        None => (formatted.as_str(), ""),
    };

    let mut out = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    if value < 0.0 && !is_zero {
        out.push('-');
    }

    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }

    out
}

/// Plain number with up to two decimals.
pub fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) => group_thousands(v, 2),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Indicator-aware formatting used by the headline cards.
///
/// Population is shown in billions, density rounded to whole people.
pub fn format_value(value: Option<f64>, indicator: &str) -> String {
    let Some(v) = value else {
        return NOT_AVAILABLE.to_string();
    };

    match Indicator::from_code(indicator) {
        Some(Indicator::TotalPopulation) => format!("{}B", group_thousands(v / 1e9, 2)),
        Some(Indicator::PopulationDensity) => group_thousands(v.round(), 0),
        _ => group_thousands(v, 2),
    }
}

/// Year-over-year change in millions with an explicit sign.
pub fn format_change(delta: Option<f64>) -> String {
    match delta {
        Some(d) => {
            let sign = if d >= 0.0 { '+' } else { '-' };
            format!("{}{}M", sign, group_thousands((d / 1e6).abs(), 3))
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0, 2), "0");
        assert_eq!(group_thousands(999.0, 2), "999");
        assert_eq!(group_thousands(1000.0, 2), "1,000");
        assert_eq!(group_thousands(1_234_567.891, 2), "1,234,567.89");
        assert_eq!(group_thousands(72.5, 2), "72.5");
        assert_eq!(group_thousands(-1234.5, 1), "-1,234.5");
        assert_eq!(group_thousands(-0.001, 2), "0");
    }

    #[test]
    fn test_format_value_by_indicator() {
        assert_eq!(format_value(Some(7_951_150_000.0), "SP.POP.TOTL"), "7.95B");
        assert_eq!(format_value(Some(60.4), "EN.POP.DNST"), "60");
        assert_eq!(format_value(Some(71.33456), "SP.DYN.LE00.IN"), "71.33");
        assert_eq!(format_value(None, "SP.POP.TOTL"), "N/A");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(Some(1_412_175_000.0)), "1,412,175,000");
        assert_eq!(format_number(None), "N/A");
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(Some(66_000_000.0)), "+66M");
        assert_eq!(format_change(Some(-1_500_000.0)), "-1.5M");
        assert_eq!(format_change(Some(0.0)), "+0M");
        assert_eq!(format_change(None), "N/A");
    }
}
