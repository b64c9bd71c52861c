use super::{AngularDistribution, SourceGenerator, SourceProfile, launch_photon};
use crate::core::mc::{Float, consts::PI};
use crate::core::error::Result;
use crate::core::geometry::{Point3f, Vector3f};
use crate::core::photon::Photon;
use crate::core::rng::Rng;
use crate::core::tissue::TissueModel;

/// The curved wall of a tube along z, emitting towards the tube axis.
#[derive(Debug, Clone)]
pub struct TubularSource {
    pub center: Point3f,
    pub radius: Float,
    pub height: Float,
    pub profile: SourceProfile,
    pub angular: AngularDistribution
}

impl TubularSource {
    pub fn new(center: Point3f, radius: Float, height: Float, profile: SourceProfile, angular: AngularDistribution) -> TubularSource {
        TubularSource { center, radius, height, profile, angular }
    }
}

impl SourceGenerator for TubularSource {
    fn get_next_photon(&self, tissue: &TissueModel, rng: &mut Rng) -> Result<Photon> {
        let phi = 2.0 * PI * rng.uniform_float();
        let z = self.profile.sample(0.5 * self.height, rng);
        let inward = Vector3f::new(-phi.cos(), -phi.sin(), 0.0);
        let offset = Vector3f::new(self.radius * phi.cos(), self.radius * phi.sin(), z);
        let direction = self.angular.sample(&inward, rng);
        launch_photon(tissue, self.center + offset, direction)
    }
}
