use crate::core::region::RegionShape;
use crate::core::mc::{Float, quadratic, consts::BOUNDARY_EPSILON};
use crate::core::geometry::{Point3f, Vector3f};

/// Circular cylinder of infinite extent with its axis parallel to y,
/// passing through `center`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InfiniteCylinderRegion {
    pub center: Point3f,
    pub radius: Float
}

impl InfiniteCylinderRegion {
    pub fn new(center: Point3f, radius: Float) -> InfiniteCylinderRegion {
        InfiniteCylinderRegion { center, radius }
    }

    fn axial_distance(&self, p: &Point3f) -> Float {
        let x = p.x - self.center.x;
        let z = p.z - self.center.z;
        (x * x + z * z).sqrt()
    }
}

impl RegionShape for InfiniteCylinderRegion {
    fn contains(&self, p: &Point3f) -> bool {
        self.axial_distance(p) <= self.radius
    }

    fn on_boundary(&self, p: &Point3f) -> bool {
        (self.axial_distance(p) - self.radius).abs() < BOUNDARY_EPSILON
    }

    fn intersect_line(&self, o: &Point3f, d: &Vector3f) -> Option<(Float, Float)> {
        let ox = o.x - self.center.x;
        let oz = o.z - self.center.z;
        let a = d.x * d.x + d.z * d.z;
        let c = ox * ox + oz * oz - self.radius * self.radius;
        if a == 0.0 {
            return if c > 0.0 {
                None
            } else {
                Some((std::f64::NEG_INFINITY, std::f64::INFINITY))
            };
        }
        quadratic(a, 2.0 * (ox * d.x + oz * d.z), c)
    }

    fn surface_normal(&self, p: &Point3f) -> Vector3f {
        Vector3f::new(p.x - self.center.x, 0.0, p.z - self.center.z).normalize()
    }

    fn name(&self) -> &'static str {
        "InfiniteCylinder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_along_axis_never_exits() {
        let c = InfiniteCylinderRegion::new(Point3f::new(0.0, 0.0, 3.0), 1.0);
        let p = Point3f::new(0.0, 0.0, 3.0);
        assert!(c.distance_to_exit(&p, &Vector3f::new(0.0, 1.0, 0.0)).is_infinite());
        assert!((c.distance_to_exit(&p, &Vector3f::new(0.0, 0.0, 1.0)) - 1.0).abs() < 1e-12);
        assert!((c.distance_to_entry(&Point3f::new(0.0, 0.0, 0.0), &Vector3f::new(0.0, 0.0, 1.0)).unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(c.surface_normal(&Point3f::new(0.0, 9.0, 4.0)), Vector3f::new(0.0, 0.0, 1.0));
    }
}
