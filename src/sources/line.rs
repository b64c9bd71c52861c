use super::{AngularDistribution, SourceGenerator, SourceProfile, launch_photon};
use crate::core::mc::Float;
use crate::core::error::Result;
use crate::core::geometry::{Point3f, Vector3f};
use crate::core::photon::Photon;
use crate::core::rng::Rng;
use crate::core::tissue::TissueModel;

/// Emits from a segment of the x axis through `center`, rotated about z.
#[derive(Debug, Clone)]
pub struct LineSource {
    pub center: Point3f,
    pub length: Float,
    pub rotation: Float,
    pub profile: SourceProfile,
    pub axis: Vector3f,
    pub angular: AngularDistribution
}

impl LineSource {
    pub fn new(
        center: Point3f,
        length: Float,
        rotation: Float,
        profile: SourceProfile,
        axis: Vector3f,
        angular: AngularDistribution
    ) -> LineSource {
        LineSource { center, length, rotation, profile, axis, angular }
    }
}

impl SourceGenerator for LineSource {
    fn get_next_photon(&self, tissue: &TissueModel, rng: &mut Rng) -> Result<Photon> {
        let t = self.profile.sample(0.5 * self.length, rng);
        let along = Vector3f::new(self.rotation.cos(), self.rotation.sin(), 0.0);
        let direction = self.angular.sample(&self.axis, rng);
        launch_photon(tissue, self.center + along * t, direction)
    }
}
