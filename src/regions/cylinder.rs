use crate::core::region::RegionShape;
use crate::core::mc::{Float, quadratic, consts::BOUNDARY_EPSILON};
use crate::core::geometry::{Point3f, Vector3f};

/// Finite right circular cylinder with its axis along z.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CylinderRegion {
    pub center: Point3f,
    pub radius: Float,
    pub height: Float
}

impl CylinderRegion {
    pub fn new(center: Point3f, radius: Float, height: Float) -> CylinderRegion {
        CylinderRegion { center, radius, height }
    }

    fn z_min(&self) -> Float {
        self.center.z - self.height / 2.0
    }

    fn z_max(&self) -> Float {
        self.center.z + self.height / 2.0
    }
}

impl RegionShape for CylinderRegion {
    fn contains(&self, p: &Point3f) -> bool {
        p.radial_distance(self.center.x, self.center.y) <= self.radius
            && p.z >= self.z_min() && p.z <= self.z_max()
    }

    fn on_boundary(&self, p: &Point3f) -> bool {
        let rho = p.radial_distance(self.center.x, self.center.y);
        let in_z = p.z >= self.z_min() - BOUNDARY_EPSILON && p.z <= self.z_max() + BOUNDARY_EPSILON;
        let on_side = (rho - self.radius).abs() < BOUNDARY_EPSILON && in_z;
        let on_cap = rho <= self.radius + BOUNDARY_EPSILON
            && ((p.z - self.z_min()).abs() < BOUNDARY_EPSILON || (p.z - self.z_max()).abs() < BOUNDARY_EPSILON);
        on_side || on_cap
    }

    fn intersect_line(&self, o: &Point3f, d: &Vector3f) -> Option<(Float, Float)> {
        // Lateral surface
        let ox = o.x - self.center.x;
        let oy = o.y - self.center.y;
        let a = d.x * d.x + d.y * d.y;
        let c = ox * ox + oy * oy - self.radius * self.radius;
        let (mut t0, mut t1) = if a == 0.0 {
            if c > 0.0 {
                return None;
            }
            (std::f64::NEG_INFINITY, std::f64::INFINITY)
        } else {
            quadratic(a, 2.0 * (ox * d.x + oy * d.y), c)?
        };
        // End caps
        if d.z == 0.0 {
            if o.z < self.z_min() || o.z > self.z_max() {
                return None;
            }
        } else {
            let mut tz0 = (self.z_min() - o.z) / d.z;
            let mut tz1 = (self.z_max() - o.z) / d.z;
            if tz0 > tz1 {
                std::mem::swap(&mut tz0, &mut tz1);
            }
            t0 = t0.max(tz0);
            t1 = t1.min(tz1);
        }
        if t0 > t1 {
            return None;
        }
        Some((t0, t1))
    }

    fn surface_normal(&self, p: &Point3f) -> Vector3f {
        let rho = p.radial_distance(self.center.x, self.center.y);
        let to_side = (rho - self.radius).abs();
        let to_bottom = (p.z - self.z_min()).abs();
        let to_top = (p.z - self.z_max()).abs();
        if to_side <= to_bottom && to_side <= to_top && rho > 0.0 {
            Vector3f::new((p.x - self.center.x) / rho, (p.y - self.center.y) / rho, 0.0)
        } else if to_bottom < to_top {
            Vector3f::new(0.0, 0.0, -1.0)
        } else {
            Vector3f::new(0.0, 0.0, 1.0)
        }
    }

    fn name(&self) -> &'static str {
        "Cylinder"
    }
}
