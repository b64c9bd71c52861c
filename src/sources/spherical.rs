use super::{AngularDistribution, SourceGenerator, launch_photon};
use crate::core::mc::Float;
use crate::core::error::Result;
use crate::core::geometry::{Point2f, Point3f};
use crate::core::photon::Photon;
use crate::core::rng::Rng;
use crate::core::sampling::uniform_sample_sphere;
use crate::core::tissue::TissueModel;

/// Emits outward from the surface of a sphere.
#[derive(Debug, Clone)]
pub struct SphericalSource {
    pub center: Point3f,
    pub radius: Float,
    pub angular: AngularDistribution
}

impl SphericalSource {
    pub fn new(center: Point3f, radius: Float, angular: AngularDistribution) -> SphericalSource {
        SphericalSource { center, radius, angular }
    }
}

impl SourceGenerator for SphericalSource {
    fn get_next_photon(&self, tissue: &TissueModel, rng: &mut Rng) -> Result<Photon> {
        let normal = uniform_sample_sphere(&Point2f::new(rng.uniform_float(), rng.uniform_float()));
        let direction = self.angular.sample(&normal, rng);
        launch_photon(tissue, self.center + normal * self.radius, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::optical_properties::OpticalProperties;

    #[test]
    fn positions_on_sphere() {
        let tissue = TissueModel::semi_infinite(1.0, OpticalProperties::default()).unwrap();
        let center = Point3f::new(0.0, 0.0, 4.0);
        let source = SphericalSource::new(center, 1.5, AngularDistribution::Lambertian);
        let mut rng = Rng::new(6);
        for _ in 0..1000 {
            let p = source.get_next_photon(&tissue, &mut rng).unwrap();
            let o = p.position - center;
            assert!((o.length() - 1.5).abs() < 1e-10);
            assert!(p.direction.dot(&o) >= 0.0);
        }
    }
}
