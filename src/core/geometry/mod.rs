#[macro_use]
mod macros;

pub mod vector3;
pub use vector3::*;
pub mod point2;
pub use point2::*;
pub mod point3;
pub use point3::*;
pub mod bounds3;
pub use bounds3::*;

use crate::core::mc::{Float, consts::PI};

/// Calculate appropriate direction vector from two angles.
pub fn spherical_direction(sin_theta: Float, cos_theta: Float, phi: Float) -> Vector3f {
    Vector3f {
        x: sin_theta * phi.cos(),
        y: sin_theta * phi.sin(),
        z: cos_theta,
    }
}

/// Take three basis vectors representing the x, y, and z axes and
/// return the appropriate direction vector with respect to the
/// coordinate frame defined by them.
pub fn spherical_direction_vec3(
    sin_theta: Float,
    cos_theta: Float,
    phi: Float,
    x: &Vector3f,
    y: &Vector3f,
    z: &Vector3f,
) -> Vector3f {
    *x * (sin_theta * phi.cos()) + *y * (sin_theta * phi.sin()) + *z * cos_theta
}

/// Conversion of a direction to spherical angles. Note that
/// **spherical_theta()** assumes that the vector **v** has been
/// normalized before being passed in.
pub fn spherical_theta(v: &Vector3f) -> Float {
    num::clamp(v.z, -1.0, 1.0).acos()
}

/// Conversion of a direction to spherical angles.
pub fn spherical_phi(v: &Vector3f) -> Float {
    let p: Float = v.y.atan2(v.x);
    if p < 0.0 {
        p + 2.0 * PI
    } else {
        p
    }
}

/// Rotate a direction given in the frame whose z axis is `axis` into world
/// space. An `axis` of +z leaves the direction unchanged.
pub fn rotate_to_axis(local: &Vector3f, axis: &Vector3f) -> Vector3f {
    if axis.z > 1.0 - 1e-12 {
        return *local;
    }
    if axis.z < -1.0 + 1e-12 {
        return Vector3f::new(local.x, -local.y, -local.z);
    }
    let (u, v) = coordinate_system(axis);
    u * local.x + v * local.y + *axis * local.z
}
