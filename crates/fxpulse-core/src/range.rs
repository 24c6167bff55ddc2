//! Session range as a percentage of the high/low midpoint.
//!
//! This is a cheap relative-range proxy, not an annualised volatility.

/// `(high - low) / ((high + low) / 2) * 100`.
///
/// Returns `0.0` unless both bounds are finite and strictly positive.
/// Bounds delivered in the wrong order still yield a non-negative range.
pub fn range_percent(high: f64, low: f64) -> f64 {
    let valid = high.is_finite() && low.is_finite() && high > 0.0 && low > 0.0;
    if !valid {
        return 0.0;
    }

    let midpoint = (high + low) / 2.0;
    if midpoint == 0.0 {
        return 0.0;
    }

    let value = (high - low).abs() / midpoint * 100.0;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
