/// Rounds to the nearest integer, resolving `.5` fractions towards positive infinity.
///
/// `2.5 -> 3`, `3.5 -> 4`, `-0.5 -> 0`, `-1.5 -> -1`. Unlike round-half-to-even it never
/// shifts the center of an even-sized feature map towards zero.
///
pub fn round_half_up(value: f64) -> f64 {
    if value.rem_euclid(1.0) == 0.5 {
        value.ceil()
    } else {
        value.round()
    }
}

pub fn round_half_up_all(values: &[f64]) -> Vec<f64> {
    values.iter().copied().map(round_half_up).collect()
}
