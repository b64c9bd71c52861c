//! Absorption weighting strategies.
use super::mc::Float;
use super::error::Error;
use super::optical_properties::OpticalProperties;
use super::photon::{Photon, PhotonState};
use super::rng::Rng;
use std::fmt;
use std::str::FromStr;

/// Floor applied to the coefficient that converts optical path into distance,
/// so that void regions (mus = 0) give a very long but finite free path.
pub const MIN_COEFFICIENT: Float = 1e-10;

/// How photon weight is reduced by absorption. Fixed for a whole run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AbsorptionWeightingType {
    /// Collisions absorb the whole photon with probability mua/mut.
    Analog,
    /// Collisions keep the albedo mus/mut of the weight.
    Discrete,
    /// Weight decays as exp(-mua s) along every step; free paths use mus.
    Continuous
}

impl AbsorptionWeightingType {
    /// Coefficient converting a dimensionless optical path into a distance.
    #[inline]
    pub fn step_coefficient(&self, ops: &OpticalProperties) -> Float {
        let mu = match self {
            AbsorptionWeightingType::Analog | AbsorptionWeightingType::Discrete => ops.mu_t(),
            AbsorptionWeightingType::Continuous => ops.mus
        };
        mu.max(MIN_COEFFICIENT)
    }

    /// Apply path attenuation for a step of length `distance`. Returns the
    /// weight absorbed along the step.
    #[inline]
    pub fn attenuate(&self, photon: &mut Photon, mua: Float, distance: Float) -> Float {
        match self {
            AbsorptionWeightingType::Continuous if mua > 0.0 => {
                let remaining = photon.weight * (-mua * distance).exp();
                let absorbed = photon.weight - remaining;
                photon.weight = remaining;
                absorbed
            }
            _ => 0.0
        }
    }

    /// Apply the collision update. Returns the weight absorbed by the collision.
    pub fn collide(&self, photon: &mut Photon, ops: &OpticalProperties, rng: &mut Rng) -> Float {
        let mut_ = ops.mu_t();
        if mut_ <= 0.0 {
            return 0.0;
        }
        match self {
            AbsorptionWeightingType::Analog => {
                if rng.uniform_float() < ops.mua / mut_ {
                    let absorbed = photon.weight;
                    photon.state = PhotonState::Absorbed;
                    absorbed
                } else {
                    0.0
                }
            }
            AbsorptionWeightingType::Discrete => {
                let absorbed = photon.weight * ops.mua / mut_;
                photon.weight -= absorbed;
                absorbed
            }
            AbsorptionWeightingType::Continuous => 0.0
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AbsorptionWeightingType::Analog => "Analog",
            AbsorptionWeightingType::Discrete => "Discrete",
            AbsorptionWeightingType::Continuous => "Continuous"
        }
    }
}

impl Default for AbsorptionWeightingType {
    fn default() -> AbsorptionWeightingType {
        AbsorptionWeightingType::Discrete
    }
}

impl fmt::Display for AbsorptionWeightingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AbsorptionWeightingType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Analog" => Ok(AbsorptionWeightingType::Analog),
            "Discrete" => Ok(AbsorptionWeightingType::Discrete),
            "Continuous" => Ok(AbsorptionWeightingType::Continuous),
            _ => Err(Error::Config(format!("unknown absorption weighting '{}'", s)))
        }
    }
}
