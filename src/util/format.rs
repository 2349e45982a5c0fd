//! Number formatting utilities.
//!
//! Tiles print with thousands separators and a fixed number of decimals:
//! credits with 2, job counts with 0, storage terabytes with 3.

/// Format a value with `,` thousands separators and exactly `decimals` decimals.
///
/// Non-finite values render as-is (`NaN`, `inf`).
#[must_use]
pub fn format_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // "-0.00" reads as noise on a tile
    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    let sign = if value.is_sign_negative() && !is_zero {
        "-"
    } else {
        ""
    };

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Credits tile value: thousands separators, 2 decimals.
#[must_use]
pub fn format_credits(value: f64) -> String {
    format_thousands(value, 2)
}

/// Jobs tile value: thousands separators, no decimals.
#[must_use]
pub fn format_jobs(value: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    format_thousands(value as f64, 0)
}

/// Storage tile value in TB: thousands separators, 3 decimals.
#[must_use]
pub fn format_storage_tb(value: f64) -> String {
    format_thousands(value, 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credits_use_two_decimals() {
        assert_eq!(format_credits(1234.5), "1,234.50");
        assert_eq!(format_credits(0.0), "0.00");
        assert_eq!(format_credits(1_234_567.891), "1,234,567.89");
    }

    #[test]
    fn jobs_have_no_decimals() {
        assert_eq!(format_jobs(1_234_567), "1,234,567");
        assert_eq!(format_jobs(999), "999");
        assert_eq!(format_jobs(1000), "1,000");
    }

    #[test]
    fn storage_uses_three_decimals() {
        assert_eq!(format_storage_tb(0.5), "0.500");
        assert_eq!(format_storage_tb(12_345.6789), "12,345.679");
    }

    #[test]
    fn negative_values_keep_sign() {
        assert_eq!(format_thousands(-1234.5, 1), "-1,234.5");
        assert_eq!(format_thousands(-0.001, 2), "0.00");
    }

    #[test]
    fn non_finite_passthrough() {
        assert_eq!(format_thousands(f64::NAN, 2), "NaN");
    }
}
