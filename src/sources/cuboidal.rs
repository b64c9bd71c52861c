use super::{AngularDistribution, SourceGenerator, SourceProfile, launch_photon};
use crate::core::mc::Float;
use crate::core::error::Result;
use crate::core::geometry::{Point3f, Vector3f};
use crate::core::photon::Photon;
use crate::core::rng::Rng;
use crate::core::sampling::Distribution1D;
use crate::core::tissue::TissueModel;

/// Emits from the six faces of an axis aligned box, each face chosen with
/// probability proportional to its area.
#[derive(Debug, Clone)]
pub struct CuboidalSource {
    pub center: Point3f,
    half: [Float; 3],
    pub profile: SourceProfile,
    pub angular: AngularDistribution,
    faces: Distribution1D
}

impl CuboidalSource {
    pub fn new(
        center: Point3f,
        length_x: Float,
        width_y: Float,
        height_z: Float,
        profile: SourceProfile,
        angular: AngularDistribution
    ) -> CuboidalSource {
        let yz = width_y * height_z;
        let xz = length_x * height_z;
        let xy = length_x * width_y;
        CuboidalSource {
            center,
            half: [0.5 * length_x, 0.5 * width_y, 0.5 * height_z],
            profile,
            angular,
            faces: Distribution1D::new(&[yz, yz, xz, xz, xy, xy])
        }
    }
}

impl SourceGenerator for CuboidalSource {
    fn get_next_photon(&self, tissue: &TissueModel, rng: &mut Rng) -> Result<Photon> {
        let face = self.faces.sample_discrete(rng.uniform_float());
        let axis = face / 2;
        let sign = if face % 2 == 0 { -1.0 } else { 1.0 };
        let mut offset = Vector3f::zero();
        let mut normal = Vector3f::zero();
        for i in 0..3 {
            if i == axis {
                offset[i] = sign * self.half[i];
                normal[i] = sign;
            } else {
                offset[i] = self.profile.sample(self.half[i], rng);
            }
        }
        let direction = self.angular.sample(&normal, rng);
        launch_photon(tissue, self.center + offset, direction)
    }
}
