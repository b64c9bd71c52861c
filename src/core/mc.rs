//! Type definitions and constants.

pub type Float = f64;

pub mod consts {
    use super::Float;
    pub use std::f64::consts::*;
    /// Speed of light in vacuum in mm/ns.
    pub const SPEED_OF_LIGHT: Float = 299.792458;
    /// Tolerance used when deciding whether a point lies on a region surface.
    pub const BOUNDARY_EPSILON: Float = 1e-9;
}

/// Bisect `[0, size)` for the last index where `predicate` holds,
/// clamped so that `index + 1` is always valid.
pub fn find_interval<T>(size: usize, predicate: T) -> usize
where
T: Fn(usize) -> bool
{
    let mut first = 0;
    let mut len = size;
    while len > 0 {
        let half = len >> 1;
        let middle = first + half;
        // Bisect range based on value of _pred_ at _middle_
        if predicate(middle) {
            first = middle + 1;
            len -= half + 1;
        } else {
            len = half;
        }
    }
    num::clamp(first.saturating_sub(1), 0, size.saturating_sub(2))
}

/// Solve `a t^2 + b t + c = 0`, returning the roots in ascending order.
#[inline]
pub fn quadratic(a: Float, b: Float, c: Float) -> Option<(Float, Float)> {
    if a == 0.0 {
        if b == 0.0 {
            return None;
        }
        let t = -c / b;
        return Some((t, t));
    }
    // Find quadratic discriminant
    let discrim = b * b - 4.0 * a * c;
    if discrim < 0.0 { return None; }
    let root_discrim = discrim.sqrt();

    // Compute quadratic _t_ values
    let q = if b < 0.0 {
        -0.5 * (b - root_discrim)
    } else {
        -0.5 * (b + root_discrim)
    };
    if q == 0.0 {
        return Some((0.0, 0.0));
    }
    let mut t0 = q / a;
    let mut t1 = c / q;
    if t0 > t1 {
        std::mem::swap(&mut t0, &mut t1);
    }
    Some((t0, t1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_roots_are_ordered() {
        let (t0, t1) = quadratic(1.0, -3.0, 2.0).unwrap();
        assert!((t0 - 1.0).abs() < 1e-12);
        assert!((t1 - 2.0).abs() < 1e-12);
        assert!(quadratic(1.0, 0.0, 1.0).is_none());
    }

    #[test]
    fn find_interval_brackets_value() {
        let cdf = [0.0, 0.25, 0.5, 0.75, 1.0];
        assert_eq!(find_interval(cdf.len(), |i| cdf[i] <= 0.3), 1);
        assert_eq!(find_interval(cdf.len(), |i| cdf[i] <= 0.0), 0);
        assert_eq!(find_interval(cdf.len(), |i| cdf[i] <= 1.0), 3);
    }
}
