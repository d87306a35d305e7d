//! Fixed-shape scientific notation shared by the text codecs.
//!
//! Several formats are column-positional, so an exponent rendered with the wrong
//! number of digits shifts every field after it. [`format_sci`] always renders the
//! mantissa with exactly `precision` decimals and the exponent with an explicit sign
//! and at least `exp_digits` digits.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches one integer or floating-point token, with `E`/`e`/`D`/`d` exponents.
pub const FLOAT_PATTERN: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[EeDd][-+]?\d+)?";

static FLOAT_TOKEN: OnceLock<Regex> = OnceLock::new();

fn float_regex() -> &'static Regex {
    FLOAT_TOKEN.get_or_init(|| Regex::new(FLOAT_PATTERN).expect("Invalid float regex pattern"))
}

/// Precision and exponent width of one text format's floating-point fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    pub precision: usize,
    pub exp_digits: usize,
}

impl NumberFormat {
    pub const fn new(precision: usize, exp_digits: usize) -> Self {
        Self {
            precision,
            exp_digits,
        }
    }

    pub fn format(self, value: f64) -> String {
        format_sci(value, self.precision, self.exp_digits)
    }

    /// `format` right-justified to `width` columns.
    pub fn format_width(self, value: f64, width: usize) -> String {
        format!("{:>width$}", self.format(value))
    }

    pub fn width(self) -> usize {
        sci_width(self.precision, self.exp_digits)
    }
}

/// Render `value` as `d.ddddE±xx`.
///
/// ```
/// use meshx_io::numeric::format_sci;
/// assert_eq!(format_sci(1234.56789, 9, 2), "1.234567890E+03");
/// assert_eq!(format_sci(-0.5, 4, 3), "-5.0000E-001");
/// ```
pub fn format_sci(value: f64, precision: usize, exp_digits: usize) -> String {
    let raw = format!("{value:.precision$e}");
    let Some((mantissa, exponent)) = raw.split_once('e') else {
        // NaN and infinities carry no exponent
        return raw;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!(
        "{mantissa}E{sign}{:0width$}",
        exponent.unsigned_abs(),
        width = exp_digits
    )
}

/// Widest string [`format_sci`] produces for the given shape, reached by negative
/// values whose exponent fits in `exp_digits` digits.
pub fn sci_width(precision: usize, exp_digits: usize) -> usize {
    // sign, leading digit, point, mantissa, 'E', exponent sign, exponent
    precision + exp_digits + 5
}

/// Parse one number in any of the notations the supported formats emit.
pub fn parse_sci(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.contains(['D', 'd']) {
        return text.replace(['D', 'd'], "E").parse().ok();
    }
    text.parse().ok()
}

/// Every numeric token in `text`, in order. Tokens that fail to convert are dropped.
pub fn scan_floats(text: &str) -> Vec<f64> {
    float_regex()
        .find_iter(text)
        .filter_map(|m| parse_sci(m.as_str()))
        .collect()
}

/// Parse a right-justified integer column `line[start..end]`; blank or short columns are `None`.
pub fn int_column(line: &str, start: usize, end: usize) -> Option<i64> {
    let end = end.min(line.len());
    if start >= end {
        return None;
    }
    line.get(start..end)?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_exponent_to_requested_width() {
        assert_eq!(format_sci(1234.56789, 9, 2), "1.234567890E+03");
        assert_eq!(format_sci(1234.56789, 9, 1), "1.234567890E+3");
        assert_eq!(format_sci(0.0, 9, 2), "0.000000000E+00");
        assert_eq!(format_sci(1.5e-7, 4, 3), "1.5000E-007");
        assert_eq!(format_sci(-2.0, 5, 1), "-2.00000E+0");
    }

    #[test]
    fn wide_exponent_is_not_truncated() {
        assert_eq!(format_sci(1.0e123, 2, 1), "1.00E+123");
    }

    #[test]
    fn negative_values_reach_the_reported_width() {
        for (precision, exp_digits) in [(9, 1), (9, 2), (9, 3), (4, 3), (5, 1)] {
            let negative = format_sci(-9.87654321e-5, precision, exp_digits);
            assert_eq!(negative.len(), sci_width(precision, exp_digits), "{negative}");
            let positive = format_sci(9.87654321e-5, precision, exp_digits);
            assert_eq!(positive.len(), sci_width(precision, exp_digits) - 1);
        }
    }

    #[test]
    fn decode_recovers_value_within_precision() {
        let samples = [1.0, -1.0, 3.14159265358979, -2.5e-12, 6.02214076e23, 1e-300, 0.1];
        for precision in [4, 5, 9] {
            for exp_digits in [1, 2, 3] {
                for x in samples {
                    let back = parse_sci(&format_sci(x, precision, exp_digits))
                        .expect("formatted value should parse");
                    let tolerance = 10f64.powi(-(precision as i32)) * x.abs();
                    assert!((back - x).abs() <= tolerance, "{x} -> {back}");
                }
            }
        }
    }

    #[test]
    fn parse_accepts_marker_and_sign_variants() {
        assert_eq!(parse_sci("1.5E+03"), Some(1500.0));
        assert_eq!(parse_sci("1.5e3"), Some(1500.0));
        assert_eq!(parse_sci(" -1.5E-3 "), Some(-0.0015));
        assert_eq!(parse_sci("2.5D+02"), Some(250.0));
        assert_eq!(parse_sci("2.5d2"), Some(250.0));
        assert_eq!(parse_sci("+7"), Some(7.0));
        assert_eq!(parse_sci(""), None);
        assert_eq!(parse_sci("X"), None);
    }

    #[test]
    fn scans_tokens_out_of_free_text() {
        let values = scan_floats("     I 12 X 1.0000E+000 Y -2.5000e-001 Z 3");
        assert_eq!(values, vec![12.0, 1.0, -0.25, 3.0]);
    }

    #[test]
    fn reads_fixed_integer_columns() {
        let line = " 2      17       5       2";
        assert_eq!(int_column(line, 2, 10), Some(17));
        assert_eq!(int_column(line, 10, 18), Some(5));
        assert_eq!(int_column(line, 18, 26), Some(2));
        assert_eq!(int_column(line, 26, 34), None);
    }

    #[test]
    fn number_format_justifies_to_column_width() {
        let format = NumberFormat::new(9, 1);
        assert_eq!(format.format_width(1.0, 16), "  1.000000000E+0");
        assert_eq!(format.width(), 15);
    }
}
