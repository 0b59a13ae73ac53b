/// Clamps every index into `[lower, upper]` and returns the clamped copy.
///
/// The upper bound is checked before the lower one, so for a degenerate range (`lower > upper`)
/// every value ends up equal to `lower`.
///
pub fn clamp_indices(index: &[i64], lower: i64, upper: i64) -> Vec<i64> {
    let mut res = index.to_vec();
    clamp_indices_in_place(&mut res, lower, upper);
    res
}

/// In-place version of [clamp_indices](clamp_indices)
///
pub fn clamp_indices_in_place(index: &mut [i64], lower: i64, upper: i64) {
    for idx in index.iter_mut() {
        if *idx > upper {
            *idx = upper;
        }
        if *idx < lower {
            *idx = lower;
        }
    }
}
