//! Photon sources.
//!
//! Every source is described by a [SourceInput] and built by
//! [create_source]. Sources draw all their randomness from the generator
//! passed to [SourceGenerator::get_next_photon], so a worker's photons are
//! reproducible from its seed and stream alone.

use crate::core::mc::{Float, consts::{PI, FRAC_PI_2}};
use crate::core::error::{Error, Result};
use crate::core::geometry::{Point2f, Point3f, Vector3f, rotate_to_axis};
use crate::core::photon::Photon;
use crate::core::rng::Rng;
use crate::core::sampling::{
    lambertian_sample_polar_azimuthal, sample_truncated_gaussian, uniform_sample_polar_azimuthal,
    uniform_sample_sphere
};
use crate::core::tissue::TissueModel;
use std::fmt;
use std::path::PathBuf;

pub mod point;
pub use point::*;
pub mod line;
pub use line::*;
pub mod planar;
pub use planar::*;
pub mod cuboidal;
pub use cuboidal::*;
pub mod fiber;
pub use fiber::*;
pub mod tubular;
pub use tubular::*;
pub mod spherical;
pub use spherical::*;
pub mod from_file;
pub use from_file::*;

/// Produces launch states.
pub trait SourceGenerator: Send + Sync + fmt::Debug {
    fn get_next_photon(&self, tissue: &TissueModel, rng: &mut Rng) -> Result<Photon>;

    /// Launch state of photon `index` of a run. Sources that replay recorded
    /// states override this to tie each index to one record.
    fn get_photon(&self, tissue: &TissueModel, _index: u64, rng: &mut Rng) -> Result<Photon> {
        self.get_next_photon(tissue, rng)
    }
}

pub type BoxSource = Box<dyn SourceGenerator>;

/// Spatial weighting of emission positions over a source's extent.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SourceProfile {
    Flat,
    /// Gaussian with the given full width at half maximum, truncated to the source.
    Gaussian { beam_diameter_fwhm: Float }
}

impl SourceProfile {
    /// Sample a coordinate in `[-half_extent, half_extent]`.
    pub fn sample(&self, half_extent: Float, rng: &mut Rng) -> Float {
        match *self {
            SourceProfile::Flat => half_extent * (2.0 * rng.uniform_float() - 1.0),
            SourceProfile::Gaussian { beam_diameter_fwhm } => {
                sample_truncated_gaussian(rng, beam_diameter_fwhm, half_extent)
            }
        }
    }
}

impl Default for SourceProfile {
    fn default() -> SourceProfile {
        SourceProfile::Flat
    }
}

/// Angular law of emitted directions, relative to an emission axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AngularDistribution {
    /// Uniform over the whole sphere, the axis is ignored.
    Isotropic,
    /// Along the axis.
    Directional,
    /// Cosine weighted about the axis.
    Lambertian,
    /// Uniform in solid angle within polar and azimuthal ranges about the axis, radians.
    Custom { polar: (Float, Float), azimuthal: (Float, Float) }
}

impl AngularDistribution {
    pub fn sample(&self, axis: &Vector3f, rng: &mut Rng) -> Vector3f {
        let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
        match *self {
            AngularDistribution::Isotropic => uniform_sample_sphere(&u),
            AngularDistribution::Directional => *axis,
            AngularDistribution::Lambertian => {
                rotate_to_axis(&lambertian_sample_polar_azimuthal(&u, (0.0, FRAC_PI_2), (0.0, 2.0 * PI)), axis)
            }
            AngularDistribution::Custom { polar, azimuthal } => {
                rotate_to_axis(&uniform_sample_polar_azimuthal(&u, polar, azimuthal), axis)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            AngularDistribution::Custom { polar, azimuthal } => {
                if polar.0 < 0.0 || polar.1 > PI || polar.0 > polar.1 || azimuthal.0 > azimuthal.1 {
                    Err(Error::Config(format!("invalid angular range {:?} {:?}", polar, azimuthal)))
                } else {
                    Ok(())
                }
            }
            _ => Ok(())
        }
    }
}

/// The closed set of sources. Lengths are in mm, angles in radians.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceInput {
    Point {
        position: Point3f,
        axis: Vector3f,
        angular: AngularDistribution
    },
    /// Segment along x through `center`, rotated by `rotation` about z.
    Line {
        center: Point3f,
        length: Float,
        rotation: Float,
        profile: SourceProfile,
        axis: Vector3f,
        angular: AngularDistribution
    },
    /// Rectangle in the plane z = center.z.
    Rectangular {
        center: Point3f,
        length_x: Float,
        width_y: Float,
        profile: SourceProfile,
        axis: Vector3f,
        angular: AngularDistribution
    },
    /// Disk or annulus in the plane z = center.z.
    Circular {
        center: Point3f,
        inner_radius: Float,
        outer_radius: Float,
        profile: SourceProfile,
        axis: Vector3f,
        angular: AngularDistribution
    },
    /// Emits from the surface of an axis aligned box about each face normal.
    Cuboidal {
        center: Point3f,
        length_x: Float,
        width_y: Float,
        height_z: Float,
        profile: SourceProfile,
        angular: AngularDistribution
    },
    /// Fiber along z emitting from its curved surface and its bottom (+z) face.
    CylindricalFiber {
        center: Point3f,
        radius: Float,
        height: Float,
        curved_surface_efficiency: Float,
        bottom_surface_efficiency: Float,
        profile: SourceProfile,
        angular: AngularDistribution
    },
    /// Tube along z emitting from its curved surface towards its axis.
    Tubular {
        center: Point3f,
        radius: Float,
        height: Float,
        profile: SourceProfile,
        angular: AngularDistribution
    },
    Spherical {
        center: Point3f,
        radius: Float,
        angular: AngularDistribution
    },
    /// Replays the records of a photon database as launch states.
    FromFile { path: PathBuf }
}

impl SourceInput {
    pub fn isotropic_point(position: Point3f) -> SourceInput {
        SourceInput::Point {
            position,
            axis: Vector3f::new(0.0, 0.0, 1.0),
            angular: AngularDistribution::Isotropic
        }
    }

    pub fn directional_point(position: Point3f, direction: Vector3f) -> SourceInput {
        SourceInput::Point {
            position,
            axis: direction,
            angular: AngularDistribution::Directional
        }
    }

    /// Pencil beam entering the tissue at the origin.
    pub fn pencil_beam() -> SourceInput {
        SourceInput::directional_point(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0))
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: Float| -> Result<()> {
            if v > 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(Error::Config(format!("source {} must be positive, got {}", name, v)))
            }
        };
        let unit = |axis: &Vector3f| -> Result<()> {
            if axis.is_unit(1e-6) {
                Ok(())
            } else {
                Err(Error::Config(format!("source axis {} is not a unit vector", axis)))
            }
        };
        match self {
            SourceInput::Point { axis, angular, .. } => {
                unit(axis)?;
                angular.validate()
            }
            SourceInput::Line { length, axis, angular, .. } => {
                positive("length", *length)?;
                unit(axis)?;
                angular.validate()
            }
            SourceInput::Rectangular { length_x, width_y, axis, angular, .. } => {
                positive("length", *length_x)?;
                positive("width", *width_y)?;
                unit(axis)?;
                angular.validate()
            }
            SourceInput::Circular { inner_radius, outer_radius, axis, angular, .. } => {
                positive("outer radius", *outer_radius)?;
                if *inner_radius < 0.0 || inner_radius >= outer_radius {
                    return Err(Error::Config(format!("invalid annulus [{}, {}]", inner_radius, outer_radius)));
                }
                unit(axis)?;
                angular.validate()
            }
            SourceInput::Cuboidal { length_x, width_y, height_z, angular, .. } => {
                positive("length", *length_x)?;
                positive("width", *width_y)?;
                positive("height", *height_z)?;
                angular.validate()
            }
            SourceInput::CylindricalFiber {
                radius, height, curved_surface_efficiency, bottom_surface_efficiency, angular, ..
            } => {
                positive("radius", *radius)?;
                if *height < 0.0 {
                    return Err(Error::Config(format!("fiber height must not be negative, got {}", height)));
                }
                let curved = *curved_surface_efficiency;
                let bottom = *bottom_surface_efficiency;
                if curved < 0.0 || curved > 1.0 || bottom < 0.0 || bottom > 1.0 || (curved * *height <= 0.0 && bottom <= 0.0) {
                    return Err(Error::Config(format!("fiber emits nothing with efficiencies {} and {}", curved, bottom)));
                }
                angular.validate()
            }
            SourceInput::Tubular { radius, height, angular, .. } => {
                positive("radius", *radius)?;
                positive("height", *height)?;
                angular.validate()
            }
            SourceInput::Spherical { radius, angular, .. } => {
                positive("radius", *radius)?;
                angular.validate()
            }
            SourceInput::FromFile { .. } => Ok(())
        }
    }
}

/// Build a source generator. Fails when the input is invalid or, for file
/// sources, when the database cannot be opened.
pub fn create_source(input: &SourceInput) -> Result<BoxSource> {
    input.validate()?;
    let source: BoxSource = match input.clone() {
        SourceInput::Point { position, axis, angular } => {
            Box::new(PointSource::new(position, axis, angular))
        }
        SourceInput::Line { center, length, rotation, profile, axis, angular } => {
            Box::new(LineSource::new(center, length, rotation, profile, axis, angular))
        }
        SourceInput::Rectangular { center, length_x, width_y, profile, axis, angular } => {
            Box::new(RectangularSource::new(center, length_x, width_y, profile, axis, angular))
        }
        SourceInput::Circular { center, inner_radius, outer_radius, profile, axis, angular } => {
            Box::new(CircularSource::new(center, inner_radius, outer_radius, profile, axis, angular))
        }
        SourceInput::Cuboidal { center, length_x, width_y, height_z, profile, angular } => {
            Box::new(CuboidalSource::new(center, length_x, width_y, height_z, profile, angular))
        }
        SourceInput::CylindricalFiber {
            center, radius, height, curved_surface_efficiency, bottom_surface_efficiency, profile, angular
        } => Box::new(CylindricalFiberSource::new(
            center, radius, height, curved_surface_efficiency, bottom_surface_efficiency, profile, angular)),
        SourceInput::Tubular { center, radius, height, profile, angular } => {
            Box::new(TubularSource::new(center, radius, height, profile, angular))
        }
        SourceInput::Spherical { center, radius, angular } => {
            Box::new(SphericalSource::new(center, radius, angular))
        }
        SourceInput::FromFile { path } => Box::new(FromFileSource::open(path)?)
    };
    Ok(source)
}

/// Unit weight photon at `position` in whichever region contains it.
pub fn launch_photon(tissue: &TissueModel, position: Point3f, direction: Vector3f) -> Result<Photon> {
    let region_index = tissue.get_region_index(&position)?;
    Ok(Photon::new(position, direction, 1.0, region_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::optical_properties::OpticalProperties;

    fn tissue() -> TissueModel {
        TissueModel::multi_layer(1.0, &[(OpticalProperties::default(), 100.0)], 1.0).unwrap()
    }

    #[test]
    fn every_kind_builds_and_launches() {
        let tissue = tissue();
        let mut rng = Rng::seeded(0, 0);
        let down = Vector3f::new(0.0, 0.0, 1.0);
        let inputs = vec![
            SourceInput::isotropic_point(Point3f::new(0.0, 0.0, 1.0)),
            SourceInput::pencil_beam(),
            SourceInput::Line { center: Point3f::new(0.0, 0.0, 1.0), length: 2.0, rotation: 0.3, profile: SourceProfile::Flat, axis: down, angular: AngularDistribution::Isotropic },
            SourceInput::Rectangular { center: Point3f::zero(), length_x: 2.0, width_y: 1.0, profile: SourceProfile::Flat, axis: down, angular: AngularDistribution::Lambertian },
            SourceInput::Circular { center: Point3f::zero(), inner_radius: 0.0, outer_radius: 1.0, profile: SourceProfile::Gaussian { beam_diameter_fwhm: 0.5 }, axis: down, angular: AngularDistribution::Directional },
            SourceInput::Cuboidal { center: Point3f::new(0.0, 0.0, 5.0), length_x: 1.0, width_y: 2.0, height_z: 3.0, profile: SourceProfile::Flat, angular: AngularDistribution::Lambertian },
            SourceInput::CylindricalFiber { center: Point3f::new(0.0, 0.0, 5.0), radius: 0.2, height: 2.0, curved_surface_efficiency: 1.0, bottom_surface_efficiency: 1.0, profile: SourceProfile::Flat, angular: AngularDistribution::Lambertian },
            SourceInput::Tubular { center: Point3f::new(0.0, 0.0, 5.0), radius: 1.0, height: 2.0, profile: SourceProfile::Flat, angular: AngularDistribution::Lambertian },
            SourceInput::Spherical { center: Point3f::new(0.0, 0.0, 5.0), radius: 1.0, angular: AngularDistribution::Lambertian },
        ];
        for input in &inputs {
            let source = create_source(input).unwrap();
            for _ in 0..100 {
                let p = source.get_next_photon(&tissue, &mut rng).unwrap();
                assert_eq!(p.weight, 1.0);
                assert!(p.direction.is_unit(1e-9), "{:?} gave {}", input, p.direction);
                assert_eq!(p.region_index, 1);
            }
        }
    }

    #[test]
    fn custom_angular_range_about_axis() {
        let mut rng = Rng::new(4);
        let axis = Vector3f::new(1.0, 0.0, 0.0);
        let angular = AngularDistribution::Custom { polar: (0.0, 0.1), azimuthal: (0.0, 2.0 * PI) };
        for _ in 0..1000 {
            let d = angular.sample(&axis, &mut rng);
            assert!(d.dot(&axis) >= (0.1 as Float).cos() - 1e-9);
        }
    }

    #[test]
    fn invalid_inputs_rejected() {
        let bad = SourceInput::Circular {
            center: Point3f::zero(), inner_radius: 2.0, outer_radius: 1.0,
            profile: SourceProfile::Flat, axis: Vector3f::new(0.0, 0.0, 1.0), angular: AngularDistribution::Lambertian
        };
        assert!(create_source(&bad).is_err());
        let bad = SourceInput::directional_point(Point3f::zero(), Vector3f::new(0.0, 0.0, 2.0));
        assert!(create_source(&bad).is_err());
        let bad = SourceInput::CylindricalFiber {
            center: Point3f::zero(), radius: 1.0, height: 1.0, curved_surface_efficiency: 0.0,
            bottom_surface_efficiency: 0.0, profile: SourceProfile::Flat, angular: AngularDistribution::Lambertian
        };
        assert!(create_source(&bad).is_err());
    }
}
