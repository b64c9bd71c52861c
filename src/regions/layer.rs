use crate::core::region::RegionShape;
use crate::core::mc::{Float, consts::BOUNDARY_EPSILON};
use crate::core::geometry::{Point3f, Vector3f};

/// Slab `z_min <= z < z_max`, unbounded in x and y. Either bound may be infinite.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerRegion {
    pub z_min: Float,
    pub z_max: Float
}

impl LayerRegion {
    pub fn new(z_min: Float, z_max: Float) -> LayerRegion {
        LayerRegion { z_min, z_max }
    }

    pub fn thickness(&self) -> Float {
        self.z_max - self.z_min
    }
}

impl RegionShape for LayerRegion {
    fn contains(&self, p: &Point3f) -> bool {
        p.z >= self.z_min && p.z < self.z_max
    }

    fn on_boundary(&self, p: &Point3f) -> bool {
        (p.z - self.z_min).abs() < BOUNDARY_EPSILON || (p.z - self.z_max).abs() < BOUNDARY_EPSILON
    }

    fn intersect_line(&self, o: &Point3f, d: &Vector3f) -> Option<(Float, Float)> {
        if d.z == 0.0 {
            if o.z >= self.z_min && o.z <= self.z_max {
                return Some((std::f64::NEG_INFINITY, std::f64::INFINITY));
            }
            return None;
        }
        let mut t0 = (self.z_min - o.z) / d.z;
        let mut t1 = (self.z_max - o.z) / d.z;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        Some((t0, t1))
    }

    fn surface_normal(&self, p: &Point3f) -> Vector3f {
        if (p.z - self.z_min).abs() <= (p.z - self.z_max).abs() {
            Vector3f::new(0.0, 0.0, -1.0)
        } else {
            Vector3f::new(0.0, 0.0, 1.0)
        }
    }

    fn name(&self) -> &'static str {
        "Layer"
    }
}
