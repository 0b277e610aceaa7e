/// Floating point type used throughout system
pub type Real = f64;

/// Number of fixed steps of size `dt` needed to cover `span`.
///
/// Ratios within `1e-9` of an integer are snapped to it so that round-off in
/// `span / dt` never adds a spurious extra step.
pub fn steps_to_cover(span: Real, dt: Real) -> u64 {
    if span <= 0.0 || dt <= 0.0 {
        return 0;
    }
    let ratio = span / dt;
    let nearest = ratio.round();
    if (ratio - nearest).abs() <= 1e-9 * nearest.max(1.0) {
        nearest as u64
    } else {
        ratio.ceil() as u64
    }
}
