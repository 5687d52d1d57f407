/// Rounds `value` down to the closest multiple of `multiple`.
pub fn round_down_to_multiple(value: f64, multiple: f64) -> f64 {
    (value / multiple).floor() * multiple
}

/// Rounds `value` up to the closest multiple of `multiple`.
pub fn round_up_to_multiple(value: f64, multiple: f64) -> f64 {
    (value / multiple).ceil() * multiple
}

/// Rounds a (min, max) range outward to multiples of `multiple`.
///
/// A zero-width result is widened by 1 on each side.
///
/// ```
/// use lcmsplot::utils::rounded_range;
///
/// assert_eq!(rounded_range(3.0, 47.0, 10.0), (0.0, 50.0));
/// assert_eq!(rounded_range(412.3, 1288.0, 100.0), (400.0, 1300.0));
/// assert_eq!(rounded_range(200.0, 200.0, 100.0), (199.0, 201.0));
/// ```
pub fn rounded_range(min: f64, max: f64, multiple: f64) -> (f64, f64) {
    let lo = round_down_to_multiple(min, multiple);
    let hi = round_up_to_multiple(max, multiple);
    if lo == hi {
        (lo - 1.0, hi + 1.0)
    } else {
        (lo, hi)
    }
}

/// Median of the values, re-orders the slice in the process.
///
/// Returns None for an empty slice. Even-length inputs return the
/// mean of the two central values.
pub fn median_in_place(values: &mut [f64]) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    let (left, upper, _) = values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    let upper = *upper;
    if n % 2 == 1 {
        return Some(upper);
    }
    let lower = left.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((lower + upper) / 2.0)
}

/// Formats an integer with thousands separators, "1234567" -> "1,234,567".
pub fn format_count(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats an elution time (minutes) with precision scaled to its magnitude.
pub fn format_elution_time(minutes: f64) -> String {
    if minutes < 2.0 {
        format!("{:.2} minutes", minutes)
    } else if minutes < 10.0 {
        format!("{:.1} minutes", minutes)
    } else {
        format!("{:.0} minutes", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding() {
        assert_eq!(round_down_to_multiple(19.0, 10.0), 10.0);
        assert_eq!(round_up_to_multiple(11.0, 10.0), 20.0);
        assert_eq!(round_up_to_multiple(20.0, 10.0), 20.0);
        assert_eq!(rounded_range(10.0, 10.0, 10.0), (9.0, 11.0));
        assert_eq!(rounded_range(-5.0, 5.0, 10.0), (-10.0, 10.0));
    }

    #[test]
    fn test_median() {
        assert_eq!(median_in_place(&mut []), None);
        assert_eq!(median_in_place(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median_in_place(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median_in_place(&mut [7.0]), Some(7.0));
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_format_elution_time() {
        assert_eq!(format_elution_time(1.234), "1.23 minutes");
        assert_eq!(format_elution_time(5.57), "5.6 minutes");
        assert_eq!(format_elution_time(42.4), "42 minutes");
    }
}
