//! Phase function sampling.

use super::mc::{Float, consts::PI};
use super::geometry::{Vector3f, coordinate_system, spherical_direction_vec3};
use super::rng::Rng;
use super::sampling::Distribution1D;
use std::sync::Arc;

/// Draws scattering angles for a collision.
pub trait PhaseFunction {
    /// Returns the cosine of the polar scattering angle and the azimuthal
    /// angle relative to the incoming direction.
    fn sample_angles(&self, rng: &mut Rng) -> (Float, Float);

    /// Sample a new unit direction for a photon travelling along `direction`.
    fn scatter(&self, direction: &Vector3f, rng: &mut Rng) -> Vector3f {
        let (cos_theta, phi) = self.sample_angles(rng);
        scatter_direction(direction, cos_theta, phi)
    }
}

/// Atomic reference counted `PhaseFunction`.
pub type ArcPhaseFunction = Arc<dyn PhaseFunction + Send + Sync>;

/// Selects the phase function of a region. The anisotropy of the
/// closed-form kinds comes from the region's optical properties.
#[derive(Clone)]
pub enum PhaseFunctionKind {
    HenyeyGreenstein,
    Bidirectional,
    Lookup(Arc<LookupPhaseFunction>)
}

impl PhaseFunctionKind {
    pub fn create(&self, g: Float) -> ArcPhaseFunction {
        match self {
            PhaseFunctionKind::HenyeyGreenstein => Arc::new(HenyeyGreenstein::new(g)),
            PhaseFunctionKind::Bidirectional => Arc::new(Bidirectional::new(g)),
            PhaseFunctionKind::Lookup(table) => table.clone()
        }
    }
}

impl Default for PhaseFunctionKind {
    fn default() -> PhaseFunctionKind {
        PhaseFunctionKind::HenyeyGreenstein
    }
}

impl std::fmt::Debug for PhaseFunctionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseFunctionKind::HenyeyGreenstein => write!(f, "HenyeyGreenstein"),
            PhaseFunctionKind::Bidirectional => write!(f, "Bidirectional"),
            PhaseFunctionKind::Lookup(table) => write!(f, "Lookup({} angles)", table.polar_angles.len())
        }
    }
}

/// Rotate `direction` by the polar angle `acos(cos_theta)` and azimuth `phi`
/// using an orthonormal basis built around it.
pub fn scatter_direction(direction: &Vector3f, cos_theta: Float, phi: Float) -> Vector3f {
    let cos_theta = num::clamp(cos_theta, -1.0, 1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let (u, v) = coordinate_system(direction);
    spherical_direction_vec3(sin_theta, cos_theta, phi, &u, &v, direction).normalize()
}

/// Henyey-Greenstein phase function.
#[derive(Debug, Copy, Clone)]
pub struct HenyeyGreenstein {
    pub g: Float
}

impl HenyeyGreenstein {
    pub fn new(g: Float) -> HenyeyGreenstein {
        HenyeyGreenstein { g }
    }

    /// Inverse CDF of the Henyey-Greenstein distribution in cos(theta).
    pub fn sample_cos_theta(&self, u: Float) -> Float {
        let g = self.g;
        if g.abs() < 1e-6 {
            return 1.0 - 2.0 * u;
        }
        let sqr_term = (1.0 - g * g) / (1.0 - g + 2.0 * g * u);
        num::clamp((1.0 + g * g - sqr_term * sqr_term) / (2.0 * g), -1.0, 1.0)
    }

    /// Phase function value per unit solid angle.
    pub fn evaluate(&self, cos_theta: Float) -> Float {
        let denom = 1.0 + self.g * self.g - 2.0 * self.g * cos_theta;
        (1.0 - self.g * self.g) / (4.0 * PI * denom * denom.sqrt())
    }
}

impl PhaseFunction for HenyeyGreenstein {
    fn sample_angles(&self, rng: &mut Rng) -> (Float, Float) {
        let cos_theta = self.sample_cos_theta(rng.uniform_float());
        (cos_theta, 2.0 * PI * rng.uniform_float())
    }
}

/// Scatters only forward or backward, forward with probability (1 + g) / 2.
#[derive(Debug, Copy, Clone)]
pub struct Bidirectional {
    pub g: Float
}

impl Bidirectional {
    pub fn new(g: Float) -> Bidirectional {
        Bidirectional { g }
    }
}

impl PhaseFunction for Bidirectional {
    fn sample_angles(&self, rng: &mut Rng) -> (Float, Float) {
        let cos_theta = if rng.uniform_float() < (1.0 + self.g) / 2.0 { 1.0 } else { -1.0 };
        (cos_theta, 0.0)
    }
}

/// Tabulated polar phase function sampled through its CDF.
#[derive(Debug, Clone)]
pub struct LookupPhaseFunction {
    /// Ascending polar angles in radians over `[0, pi]`.
    pub polar_angles: Vec<Float>,
    /// Phase function values per unit solid angle at `polar_angles`.
    pub values: Vec<Float>,
    distribution: Distribution1D
}

impl LookupPhaseFunction {
    /// Build the table. Returns `None` when the angles are not ascending or
    /// the table carries no scattering probability.
    pub fn new(polar_angles: Vec<Float>, values: Vec<Float>) -> Option<LookupPhaseFunction> {
        if polar_angles.len() < 2 || polar_angles.len() != values.len() {
            return None;
        }
        if polar_angles.windows(2).any(|w| w[1] <= w[0]) {
            return None;
        }
        let n = polar_angles.len() - 1;
        // Probability of each segment is the trapezoid of p(theta) sin(theta)
        let segment_mass: Vec<Float> = (0..n).map(|i| {
            let a = values[i] * polar_angles[i].sin();
            let b = values[i + 1] * polar_angles[i + 1].sin();
            0.5 * (a + b) * (polar_angles[i + 1] - polar_angles[i]) * n as Float
        }).collect();
        if segment_mass.iter().all(|m| *m <= 0.0) {
            return None;
        }
        Some(LookupPhaseFunction {
            distribution: Distribution1D::new(&segment_mass),
            polar_angles,
            values
        })
    }

    /// Tabulate a Henyey-Greenstein function on `count` evenly spaced angles.
    pub fn from_henyey_greenstein(g: Float, count: usize) -> Option<LookupPhaseFunction> {
        let hg = HenyeyGreenstein::new(g);
        let polar_angles: Vec<Float> = (0..count).map(|i| PI * i as Float / (count - 1) as Float).collect();
        let values = polar_angles.iter().map(|t| hg.evaluate(t.cos())).collect();
        LookupPhaseFunction::new(polar_angles, values)
    }

    /// Mean cosine of the tabulated distribution.
    pub fn mean_cosine(&self) -> Float {
        let n = self.polar_angles.len() - 1;
        let mut num = 0.0;
        let mut den = 0.0;
        for i in 0..n {
            let mid = 0.5 * (self.polar_angles[i] + self.polar_angles[i + 1]);
            let mass = self.distribution.func[i];
            num += mass * mid.cos();
            den += mass;
        }
        if den > 0.0 { num / den } else { 0.0 }
    }
}

impl PhaseFunction for LookupPhaseFunction {
    fn sample_angles(&self, rng: &mut Rng) -> (Float, Float) {
        let (x, offset) = self.distribution.sample_continuous(rng.uniform_float());
        let du = num::clamp(x * self.distribution.count() as Float - offset as Float, 0.0, 1.0);
        let theta = self.polar_angles[offset] + du * (self.polar_angles[offset + 1] - self.polar_angles[offset]);
        (theta.cos(), 2.0 * PI * rng.uniform_float())
    }
}
