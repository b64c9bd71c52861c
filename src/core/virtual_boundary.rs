//! Detection surfaces.
use super::detector::DetectorInput;
use super::error::Error;
use std::fmt;
use std::str::FromStr;

/// The surfaces a photon can be detected on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VirtualBoundaryType {
    /// Top tissue surface, photons leaving into the top ambient medium.
    DiffuseReflectance,
    /// Bottom tissue surface of a finite slab.
    DiffuseTransmittance,
    /// Light reflected at launch before entering the tissue.
    SpecularReflectance,
    /// Any other surface of an ambient region, e.g. the side of a laterally bounded tissue.
    BoundingVolume,
    /// The tissue interior. Collision estimators register here.
    GenericVolume
}

impl VirtualBoundaryType {
    pub const ALL: [VirtualBoundaryType; 5] = [
        VirtualBoundaryType::DiffuseReflectance,
        VirtualBoundaryType::DiffuseTransmittance,
        VirtualBoundaryType::SpecularReflectance,
        VirtualBoundaryType::BoundingVolume,
        VirtualBoundaryType::GenericVolume
    ];

    /// Test if photons cross this boundary, as opposed to interacting inside a volume.
    pub fn is_surface(&self) -> bool {
        *self != VirtualBoundaryType::GenericVolume
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VirtualBoundaryType::DiffuseReflectance => "DiffuseReflectance",
            VirtualBoundaryType::DiffuseTransmittance => "DiffuseTransmittance",
            VirtualBoundaryType::SpecularReflectance => "SpecularReflectance",
            VirtualBoundaryType::BoundingVolume => "BoundingVolume",
            VirtualBoundaryType::GenericVolume => "GenericVolume"
        }
    }
}

impl fmt::Display for VirtualBoundaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VirtualBoundaryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VirtualBoundaryType::ALL.iter()
            .find(|t| t.as_str() == s)
            .cloned()
            .ok_or_else(|| Error::DatabaseFormat(format!("unknown virtual boundary type '{}'", s)))
    }
}

/// Configuration of one detection surface.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualBoundaryInput {
    pub boundary_type: VirtualBoundaryType,
    pub detectors: Vec<DetectorInput>,
    /// Persist every crossing to a photon database.
    pub write_database: bool
}

impl VirtualBoundaryInput {
    pub fn new(boundary_type: VirtualBoundaryType, detectors: Vec<DetectorInput>) -> VirtualBoundaryInput {
        VirtualBoundaryInput {
            boundary_type,
            detectors,
            write_database: false
        }
    }

    pub fn with_database(mut self) -> VirtualBoundaryInput {
        self.write_database = true;
        self
    }
}
