//! Reflection and refraction at refractive-index interfaces.
use super::mc::Float;
use super::geometry::Vector3f;
use num::clamp;

/// Unpolarised Fresnel reflectance for light arriving with incidence cosine
/// `cos_theta_i` from a medium of index `eta_i` into a medium of index `eta_t`.
/// Returns 1 under total internal reflection.
pub fn fr_dielectric(cos_theta_i: Float, eta_i: Float, eta_t: Float) -> Float {
    let cos_theta_i = clamp(cos_theta_i.abs(), 0.0, 1.0);
    if eta_i == eta_t {
        return 0.0;
    }

    // Compute _cosThetaT_ using Snell's law
    let sin_theta_i = (1.0 - cos_theta_i * cos_theta_i).max(0.0).sqrt();
    let sin_theta_t = eta_i / eta_t * sin_theta_i;

    // Handle total internal reflection
    if sin_theta_t >= 1.0 {
        return 1.0;
    }
    let cos_theta_t = (1.0 - sin_theta_t * sin_theta_t).max(0.0).sqrt();
    let rparl = ((eta_t * cos_theta_i) - (eta_i * cos_theta_t)) /
        ((eta_t * cos_theta_i) + (eta_i * cos_theta_t));
    let rperp = ((eta_i * cos_theta_i) - (eta_t * cos_theta_t)) /
        ((eta_i * cos_theta_i) + (eta_t * cos_theta_t));
    clamp((rparl * rparl + rperp * rperp) / 2.0, 0.0, 1.0)
}

/// Mirror `d` about the plane with normal `n`.
#[inline]
pub fn reflect(d: &Vector3f, n: &Vector3f) -> Vector3f {
    *d - *n * (2.0 * d.dot(n))
}

/// Refract the travelling direction `d` through the interface with normal
/// `n` (either orientation). `eta` is `eta_i / eta_t`. Returns `None` under
/// total internal reflection.
pub fn refract(d: &Vector3f, n: &Vector3f, eta: Float) -> Option<Vector3f> {
    // Orient the normal against the direction of travel
    let n = if d.dot(n) > 0.0 { -*n } else { *n };
    let cos_theta_i = clamp(-d.dot(&n), 0.0, 1.0);
    let sin2_theta_i = (1.0 - cos_theta_i * cos_theta_i).max(0.0);
    let sin2_theta_t = eta * eta * sin2_theta_i;

    // Handle total internal reflection for transmission
    if sin2_theta_t >= 1.0 {
        return None;
    }
    let cos_theta_t = (1.0 - sin2_theta_t).sqrt();
    Some((*d * eta + n * (eta * cos_theta_i - cos_theta_t)).normalize())
}
