//! Numeric helpers: canonical number strings for preference keys and the
//! few lossy casts the crate needs, kept in one place.

use num_traits::cast::cast;

/// Magnitudes at or above this switch to exponent notation.
const POSITIONAL_UPPER: f64 = 1e21;
/// Non-zero magnitudes below this switch to exponent notation.
const POSITIONAL_LOWER: f64 = 1e-6;

/// Render a number the way preference keys spell it.
///
/// Integral values carry no fractional part (`1`, not `1.0`), other values
/// use the shortest round-trip decimal (`0.5`), and very large or very small
/// magnitudes use exponent form with an explicit sign (`1e+21`, `1e-7`).
#[must_use]
pub fn canonical_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        let text = if value.is_sign_positive() {
            "Infinity"
        } else {
            "-Infinity"
        };
        return text.to_string();
    }
    // Covers -0.0 as well.
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if (POSITIONAL_LOWER..POSITIONAL_UPPER).contains(&magnitude) {
        format!("{value}")
    } else {
        exponent_form(value)
    }
}

fn exponent_form(value: f64) -> String {
    let raw = format!("{value:e}");
    match raw.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => raw,
    }
}

/// Share of `count` in `total` as a percentage, 0.0 for an empty total.
#[must_use]
pub fn share_pct(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let count = cast::<usize, f64>(count).unwrap_or(0.0);
    let total = cast::<usize, f64>(total).unwrap_or(1.0);
    count / total * 100.0
}
