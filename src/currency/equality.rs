//! Near-equality comparison for values that differ only by rounding noise

/// Default relative tolerance for [`materially_equal`]
pub const MATERIAL_TOLERANCE: f64 = 1.0e-13;

/// True if `t` and `u` are equal, or differ by no more than
/// [`MATERIAL_TOLERANCE`] times the smaller magnitude
pub fn materially_equal(t: f64, u: f64) -> bool {
    materially_equal_within(t, u, MATERIAL_TOLERANCE)
}

/// [`materially_equal`] with an explicit relative tolerance
pub fn materially_equal_within(t: f64, u: f64, tolerance: f64) -> bool {
    t == u || (t - u).abs() <= tolerance * t.abs().min(u.abs())
}

/// `t - u`, or zero when the two are materially equal
pub fn material_difference(t: f64, u: f64) -> f64 {
    if materially_equal(t, u) {
        0.0
    } else {
        t - u
    }
}
