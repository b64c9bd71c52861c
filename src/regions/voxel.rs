use crate::core::region::RegionShape;
use crate::core::mc::{Float, consts::BOUNDARY_EPSILON};
use crate::core::geometry::{Point3f, Vector3f, Bounds3f};

/// Axis aligned box region.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VoxelRegion {
    pub bounds: Bounds3f
}

impl VoxelRegion {
    pub fn new(x: (Float, Float), y: (Float, Float), z: (Float, Float)) -> VoxelRegion {
        VoxelRegion {
            bounds: Bounds3f::new(Point3f::new(x.0, y.0, z.0), Point3f::new(x.1, y.1, z.1))
        }
    }
}

impl RegionShape for VoxelRegion {
    fn contains(&self, p: &Point3f) -> bool {
        self.bounds.inside(p)
    }

    fn on_boundary(&self, p: &Point3f) -> bool {
        let grown = Bounds3f::new(
            self.bounds.min - Vector3f::new(BOUNDARY_EPSILON, BOUNDARY_EPSILON, BOUNDARY_EPSILON),
            self.bounds.max + Vector3f::new(BOUNDARY_EPSILON, BOUNDARY_EPSILON, BOUNDARY_EPSILON));
        if !grown.inside(p) {
            return false;
        }
        (0..3).any(|i| (p[i] - self.bounds.min[i]).abs() < BOUNDARY_EPSILON
            || (p[i] - self.bounds.max[i]).abs() < BOUNDARY_EPSILON)
    }

    fn intersect_line(&self, o: &Point3f, d: &Vector3f) -> Option<(Float, Float)> {
        self.bounds.intersect_line(o, d)
    }

    fn surface_normal(&self, p: &Point3f) -> Vector3f {
        let mut best = std::f64::INFINITY;
        let mut normal = Vector3f::new(0.0, 0.0, 1.0);
        for i in 0..3 {
            let to_min = (p[i] - self.bounds.min[i]).abs();
            let to_max = (p[i] - self.bounds.max[i]).abs();
            if to_min < best {
                best = to_min;
                normal = Vector3f::zero();
                normal[i] = -1.0;
            }
            if to_max < best {
                best = to_max;
                normal = Vector3f::zero();
                normal[i] = 1.0;
            }
        }
        normal
    }

    fn name(&self) -> &'static str {
        "Voxel"
    }
}
