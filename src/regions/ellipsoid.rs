use crate::core::region::RegionShape;
use crate::core::mc::{Float, quadratic, consts::BOUNDARY_EPSILON};
use crate::core::geometry::{Point3f, Vector3f};

/// Axis aligned ellipsoid with semi-axes `dx`, `dy`, `dz`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EllipsoidRegion {
    pub center: Point3f,
    pub dx: Float,
    pub dy: Float,
    pub dz: Float
}

impl EllipsoidRegion {
    pub fn new(center: Point3f, dx: Float, dy: Float, dz: Float) -> EllipsoidRegion {
        EllipsoidRegion { center, dx, dy, dz }
    }

    pub fn sphere(center: Point3f, radius: Float) -> EllipsoidRegion {
        EllipsoidRegion::new(center, radius, radius, radius)
    }

    /// Implicit function, less than one inside.
    fn level(&self, p: &Point3f) -> Float {
        let x = (p.x - self.center.x) / self.dx;
        let y = (p.y - self.center.y) / self.dy;
        let z = (p.z - self.center.z) / self.dz;
        x * x + y * y + z * z
    }
}

impl RegionShape for EllipsoidRegion {
    fn contains(&self, p: &Point3f) -> bool {
        self.level(p) <= 1.0
    }

    fn on_boundary(&self, p: &Point3f) -> bool {
        (self.level(p) - 1.0).abs() < BOUNDARY_EPSILON
    }

    fn intersect_line(&self, o: &Point3f, d: &Vector3f) -> Option<(Float, Float)> {
        // Scale into the unit sphere; the line parameter is unchanged
        let ox = (o.x - self.center.x) / self.dx;
        let oy = (o.y - self.center.y) / self.dy;
        let oz = (o.z - self.center.z) / self.dz;
        let sx = d.x / self.dx;
        let sy = d.y / self.dy;
        let sz = d.z / self.dz;
        let a = sx * sx + sy * sy + sz * sz;
        let b = 2.0 * (ox * sx + oy * sy + oz * sz);
        let c = ox * ox + oy * oy + oz * oz - 1.0;
        quadratic(a, b, c)
    }

    fn surface_normal(&self, p: &Point3f) -> Vector3f {
        Vector3f::new(
            (p.x - self.center.x) / (self.dx * self.dx),
            (p.y - self.center.y) / (self.dy * self.dy),
            (p.z - self.center.z) / (self.dz * self.dz)
        ).normalize()
    }

    fn name(&self) -> &'static str {
        "Ellipsoid"
    }
}
