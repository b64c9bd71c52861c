use super::mc::Float;
use std::fmt;

/// Bulk optical properties of a homogeneous region.
///
/// * `mua` - absorption coefficient (1/mm)
/// * `mus` - scattering coefficient (1/mm)
/// * `g` - scattering anisotropy, the mean cosine of the scattering angle
/// * `n` - refractive index
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OpticalProperties {
    pub mua: Float,
    pub mus: Float,
    pub g: Float,
    pub n: Float
}

impl OpticalProperties {
    pub fn new(mua: Float, mus: Float, g: Float, n: Float) -> OpticalProperties {
        OpticalProperties { mua, mus, g, n }
    }

    /// Non-absorbing, non-scattering medium with the given refractive index.
    pub fn ambient(n: Float) -> OpticalProperties {
        OpticalProperties { mua: 0.0, mus: 0.0, g: 0.0, n }
    }

    /// Extinction coefficient, mua + mus.
    #[inline]
    pub fn mu_t(&self) -> Float {
        self.mua + self.mus
    }

    /// Single scattering albedo, mus / mut. Zero for a void region.
    #[inline]
    pub fn albedo(&self) -> Float {
        let mu_t = self.mu_t();
        if mu_t > 0.0 { self.mus / mu_t } else { 0.0 }
    }

    /// Reduced scattering coefficient, mus (1 - g).
    #[inline]
    pub fn mus_prime(&self) -> Float {
        self.mus * (1.0 - self.g)
    }

    /// Check the physical domain of every property.
    pub fn is_valid(&self) -> bool {
        self.mua >= 0.0 && self.mus >= 0.0 && self.g >= -1.0 && self.g <= 1.0 && self.n > 0.0
            && self.mua.is_finite() && self.mus.is_finite() && self.n.is_finite()
    }
}

impl Default for OpticalProperties {
    fn default() -> OpticalProperties {
        OpticalProperties { mua: 0.01, mus: 1.0, g: 0.8, n: 1.4 }
    }
}

impl fmt::Display for OpticalProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ mua: {} mus: {} g: {} n: {} ]", self.mua, self.mus, self.g, self.n)
    }
}
