use super::{AngularDistribution, SourceGenerator, SourceProfile, launch_photon};
use crate::core::mc::{Float, consts::PI};
use crate::core::error::Result;
use crate::core::geometry::{Point3f, Vector3f};
use crate::core::photon::Photon;
use crate::core::rng::Rng;
use crate::core::tissue::TissueModel;

/// Emits from a rectangle in the plane z = center.z.
#[derive(Debug, Clone)]
pub struct RectangularSource {
    pub center: Point3f,
    pub length_x: Float,
    pub width_y: Float,
    pub profile: SourceProfile,
    pub axis: Vector3f,
    pub angular: AngularDistribution
}

impl RectangularSource {
    pub fn new(
        center: Point3f,
        length_x: Float,
        width_y: Float,
        profile: SourceProfile,
        axis: Vector3f,
        angular: AngularDistribution
    ) -> RectangularSource {
        RectangularSource { center, length_x, width_y, profile, axis, angular }
    }
}

impl SourceGenerator for RectangularSource {
    fn get_next_photon(&self, tissue: &TissueModel, rng: &mut Rng) -> Result<Photon> {
        let x = self.profile.sample(0.5 * self.length_x, rng);
        let y = self.profile.sample(0.5 * self.width_y, rng);
        let direction = self.angular.sample(&self.axis, rng);
        launch_photon(tissue, self.center + Vector3f::new(x, y, 0.0), direction)
    }
}

/// Emits from a disk or annulus in the plane z = center.z.
#[derive(Debug, Clone)]
pub struct CircularSource {
    pub center: Point3f,
    pub inner_radius: Float,
    pub outer_radius: Float,
    pub profile: SourceProfile,
    pub axis: Vector3f,
    pub angular: AngularDistribution
}

impl CircularSource {
    pub fn new(
        center: Point3f,
        inner_radius: Float,
        outer_radius: Float,
        profile: SourceProfile,
        axis: Vector3f,
        angular: AngularDistribution
    ) -> CircularSource {
        CircularSource { center, inner_radius, outer_radius, profile, axis, angular }
    }

    fn sample_offset(&self, rng: &mut Rng) -> (Float, Float) {
        match self.profile {
            SourceProfile::Flat => {
                let r2_min = self.inner_radius * self.inner_radius;
                let r2_max = self.outer_radius * self.outer_radius;
                let r = (r2_min + rng.uniform_float() * (r2_max - r2_min)).sqrt();
                let phi = 2.0 * PI * rng.uniform_float();
                (r * phi.cos(), r * phi.sin())
            }
            SourceProfile::Gaussian { .. } => loop {
                let x = self.profile.sample(self.outer_radius, rng);
                let y = self.profile.sample(self.outer_radius, rng);
                let r = (x * x + y * y).sqrt();
                if r >= self.inner_radius && r <= self.outer_radius {
                    return (x, y);
                }
            }
        }
    }
}

impl SourceGenerator for CircularSource {
    fn get_next_photon(&self, tissue: &TissueModel, rng: &mut Rng) -> Result<Photon> {
        let (x, y) = self.sample_offset(rng);
        let direction = self.angular.sample(&self.axis, rng);
        launch_photon(tissue, self.center + Vector3f::new(x, y, 0.0), direction)
    }
}
