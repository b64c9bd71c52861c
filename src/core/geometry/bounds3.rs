use super::{Point3f, Vector3f};
use crate::core::mc::Float;

/// An axis aligned bounding box.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
#[repr(C)]
pub struct Bounds3f {
    pub min: Point3f,
    pub max: Point3f
}

impl Bounds3f {
    pub fn new(a: Point3f, b: Point3f) -> Self {
        Bounds3f {
            min: a.min(&b),
            max: a.max(&b)
        }
    }

    /// The vector along the box diagonal.
    pub fn diagonal(&self) -> Vector3f {
        self.max - self.min
    }

    /// Test if a point is inside the box, boundary included.
    pub fn inside(&self, p: &Point3f) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    /// Slab test of a ray against the box. Returns the parametric range
    /// `(t0, t1)` of the overlap along the infinite line, which may start
    /// behind the origin.
    pub fn intersect_line(&self, o: &Point3f, d: &Vector3f) -> Option<(Float, Float)> {
        let mut t0 = std::f64::NEG_INFINITY;
        let mut t1 = std::f64::INFINITY;
        for i in 0..3 {
            if d[i] == 0.0 {
                // Parallel to the slab: either always inside or never
                if o[i] < self.min[i] || o[i] > self.max[i] {
                    return None;
                }
                continue;
            }
            // Update interval for _i_th bounding box slab
            let inv_ray_dir = 1.0 / d[i];
            let mut t_near = (self.min[i] - o[i]) * inv_ray_dir;
            let mut t_far = (self.max[i] - o[i]) * inv_ray_dir;

            // Update parametric interval from slab intersection $t$ values
            if t_near > t_far { std::mem::swap(&mut t_near, &mut t_far); }
            t0 = if t_near > t0 { t_near } else { t0 };
            t1 = if t_far < t1 { t_far } else { t1 };
            if t0 > t1 { return None; }
        }
        Some((t0, t1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slab_intersection() {
        let bb = Bounds3f::new(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0));
        let (t0, t1) = bb.intersect_line(&Point3f::new(0.0, 0.0, -5.0), &Vector3f::new(0.0, 0.0, 1.0)).unwrap();
        assert_eq!(t0, 4.0);
        assert_eq!(t1, 6.0);
        assert!(bb.intersect_line(&Point3f::new(2.0, 0.0, -5.0), &Vector3f::new(0.0, 0.0, 1.0)).is_none());
        assert!(bb.inside(&Point3f::new(1.0, 0.0, 0.0)));
    }
}
