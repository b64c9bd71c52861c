use super::mc::Float;
use super::geometry::{Point3f, Vector3f};
use std::fmt;

/// Interface for the geometric part of a tissue region.
pub trait RegionShape: fmt::Debug + Send + Sync {
    /// Test if the point lies inside the region, its surface included.
    fn contains(&self, p: &Point3f) -> bool;

    /// Test if the point lies on the surface of the region to within
    /// [BOUNDARY_EPSILON](crate::core::mc::consts::BOUNDARY_EPSILON).
    fn on_boundary(&self, p: &Point3f) -> bool;

    /// Returns the parametric range `(t0, t1)` over which the infinite line
    /// `o + t d` lies inside the region, or None if it misses. `t0` may be
    /// negative and either end may be infinite.
    fn intersect_line(&self, o: &Point3f, d: &Vector3f) -> Option<(Float, Float)>;

    /// Outward unit normal of the surface point nearest to `p`.
    fn surface_normal(&self, p: &Point3f) -> Vector3f;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Distance along `d` from a point inside the region to its surface.
    fn distance_to_exit(&self, o: &Point3f, d: &Vector3f) -> Float {
        match self.intersect_line(o, d) {
            Some((_, t1)) => t1.max(0.0),
            None => 0.0
        }
    }

    /// Distance along `d` from a point outside the region to where the ray
    /// enters it, if it does so strictly ahead of `o`.
    fn distance_to_entry(&self, o: &Point3f, d: &Vector3f) -> Option<Float> {
        match self.intersect_line(o, d) {
            Some((t0, t1)) if t0 > 0.0 && t1 > t0 => Some(t0),
            _ => None
        }
    }
}
