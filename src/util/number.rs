//! Number formatting with thousands separators

/// Format an integer with comma separators
///
/// ```
/// use streambench::util::number::format_number;
///
/// assert_eq!(format_number(5_400_000), "5,400,000");
/// assert_eq!(format_number(999), "999");
/// ```
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let mut count = 0;

    for c in s.chars().rev() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
        count += 1;
    }

    result.chars().rev().collect()
}

/// Format a non-negative decimal with `decimals` fraction digits, grouping
/// the integral part
///
/// Negative and non-finite inputs are formatted without grouping.
///
/// ```
/// use streambench::util::number::format_decimal;
///
/// assert_eq!(format_decimal(1234567.891, 2), "1,234,567.89");
/// assert_eq!(format_decimal(2.0, 3), "2.000");
/// ```
pub fn format_decimal(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value);
    if !value.is_finite() || value < 0.0 {
        return fixed;
    }

    match fixed.split_once('.') {
        Some((integral, fraction)) => match integral.parse::<u64>() {
            Ok(n) => format!("{}.{}", format_number(n), fraction),
            Err(_) => fixed,
        },
        None => match fixed.parse::<u64>() {
            Ok(n) => format_number(n),
            Err(_) => fixed,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(100_000), "100,000");
        assert_eq!(format_number(u64::MAX), "18,446,744,073,709,551,615");
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(500.0, 2), "500.00");
        assert_eq!(format_decimal(1_500.456, 2), "1,500.46");
        assert_eq!(format_decimal(0.0006, 3), "0.001");
        assert_eq!(format_decimal(12_345.0, 0), "12,345");
        assert_eq!(format_decimal(-1_234.5, 1), "-1234.5");
    }
}
