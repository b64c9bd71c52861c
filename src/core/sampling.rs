//! 1D sampling structures and canonical warping functions.

use super::rng::Rng;
use super::mc::{Float, find_interval, consts::PI};
use super::geometry::{Point2f, Vector3f};

/// Piecewise-constant 1D distribution with a precomputed CDF.
#[derive(Debug, Clone)]
pub struct Distribution1D  {
    /// Probability distribution function.
    pub func: Vec<Float>,
    /// Cumulative distribution function.
    pub cdf: Vec<Float>,
    /// The integral of the probability distribution function.
    pub func_int: Float
}

impl Distribution1D {
    /// Create a new Distribution1D by copying the passed values, calculating the cumulative distribution function for the values and storing the integral of the function.
    pub fn new(f: &[Float]) -> Distribution1D {
        let n = f.len();
        let mut cdf: Vec<Float> = Vec::with_capacity(n + 1);
        // Compute integral of step function at $x_i$
        cdf.push(0.0);
        for i in 1..n+1 {
            let next = cdf[i - 1] + f[i - 1] / n as Float;
            cdf.push(next);
        }

        // Transform step function integral into CDF
        let func_int = cdf[n];
        if func_int == 0.0 {
            for i in 1..n+1 { cdf[i] = i as Float / n as Float };
        } else {
            for i in 1..n+1 { cdf[i] /= func_int };
        }

        Distribution1D{
            func: f.to_vec(),
            cdf,
            func_int
        }
    }

    pub fn count(&self) -> usize {
        self.func.len()
    }

    /// Samples the distribution for the given random u and returns the value in the range [0,1)
    /// together with the offset of the segment the sample fell in.
    pub fn sample_continuous(&self, u: Float) -> (Float, usize) {
        // Find surrounding CDF segments and _offset_
        let offset = find_interval(self.cdf.len(), |i| self.cdf[i] <= u);
        // Compute offset along CDF segment
        let mut du = u - self.cdf[offset];
        if self.cdf[offset + 1] - self.cdf[offset] > 0.0 {
            du /= self.cdf[offset + 1] - self.cdf[offset];
        }

        // Return $x\in{}[0,1)$ corresponding to sample
        ((offset as Float + du) / self.count() as Float, offset)
    }

    /// Samples the CDF that surrounds the value u.
    pub fn sample_discrete(&self, u: Float) -> usize {
        find_interval(self.cdf.len(), |i| self.cdf[i] <= u)
    }
}

/// Sample a direction on the sphere uniformly with respect to solid angle.
pub fn uniform_sample_sphere(u: &Point2f) -> Vector3f {
    let z = 1.0 - 2.0 * u.x;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;
    Vector3f{
        x: r * phi.cos(),
        y: r * phi.sin(),
        z
    }
}

/// Direction uniform in solid angle with polar angle in `[theta_min, theta_max]`
/// and azimuth in `[phi_min, phi_max]`, about +z.
pub fn uniform_sample_polar_azimuthal(
    u: &Point2f,
    polar: (Float, Float),
    azimuthal: (Float, Float)
) -> Vector3f {
    let cos_min = polar.0.cos();
    let cos_max = polar.1.cos();
    let cos_theta = cos_min + u.x * (cos_max - cos_min);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = azimuthal.0 + u.y * (azimuthal.1 - azimuthal.0);
    Vector3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Lambertian direction about +z restricted to polar angles in `[theta_min, theta_max]`
/// and azimuth in `[phi_min, phi_max]`.
pub fn lambertian_sample_polar_azimuthal(
    u: &Point2f,
    polar: (Float, Float),
    azimuthal: (Float, Float)
) -> Vector3f {
    // cos^2 theta is uniform for a Lambertian emitter
    let c2_min = polar.0.cos() * polar.0.cos();
    let c2_max = polar.1.cos() * polar.1.cos();
    let cos_theta = (c2_min + u.x * (c2_max - c2_min)).max(0.0).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = azimuthal.0 + u.y * (azimuthal.1 - azimuthal.0);
    Vector3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Standard normal deviate via the Box-Muller transform.
pub fn sample_standard_normal(rng: &mut Rng) -> Float {
    let u1 = rng.uniform_open_float();
    let u2 = rng.uniform_float();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Gaussian deviate with the given full width at half maximum, truncated by
/// rejection to `[-limit, limit]`.
pub fn sample_truncated_gaussian(rng: &mut Rng, fwhm: Float, limit: Float) -> Float {
    if limit <= 0.0 || fwhm <= 0.0 {
        return 0.0;
    }
    let sigma = fwhm / (2.0 * (2.0 * (2.0 as Float).ln()).sqrt());
    loop {
        let x = sigma * sample_standard_normal(rng);
        if x.abs() <= limit {
            return x;
        }
    }
}
