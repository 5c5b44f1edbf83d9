/// Largest decimal precision that still leaves room in an `f64` mantissa.
/// Requests beyond this return the value unchanged.
const MAX_PLACES: u32 = 15;

/// Rounds `value` to `places` decimal places, ties to even.
///
/// The tie is decided on the exact stored value, not on `value * 10^places`:
/// the product can itself round onto `.5` (3.8349999... × 100 becomes 383.5).
pub fn round_half_even(value: f64, places: u32) -> f64 {
    if places > MAX_PLACES || !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(places as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }

    // Exact rounding error of the product: value * factor == scaled + residual.
    let residual = value.mul_add(factor, -scaled);
    let floor = scaled.floor();
    let frac = scaled - floor;

    let rounded = if frac > 0.5 {
        floor + 1.0
    } else if frac < 0.5 {
        floor
    } else if residual > 0.0 {
        floor + 1.0
    } else if residual < 0.0 {
        floor
    } else {
        scaled.round_ties_even()
    };
    rounded / factor
}
