use super::{AngularDistribution, SourceGenerator, launch_photon};
use crate::core::error::Result;
use crate::core::geometry::{Point3f, Vector3f};
use crate::core::photon::Photon;
use crate::core::rng::Rng;
use crate::core::tissue::TissueModel;

/// Emits every photon from one position.
#[derive(Debug, Clone)]
pub struct PointSource {
    pub position: Point3f,
    pub axis: Vector3f,
    pub angular: AngularDistribution
}

impl PointSource {
    pub fn new(position: Point3f, axis: Vector3f, angular: AngularDistribution) -> PointSource {
        PointSource { position, axis, angular }
    }
}

impl SourceGenerator for PointSource {
    fn get_next_photon(&self, tissue: &TissueModel, rng: &mut Rng) -> Result<Photon> {
        let direction = self.angular.sample(&self.axis, rng);
        launch_photon(tissue, self.position, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mc::Float;
    use crate::core::optical_properties::OpticalProperties;

    #[test]
    fn isotropic_directions_average_out() {
        let tissue = TissueModel::semi_infinite(1.0, OpticalProperties::default()).unwrap();
        let source = PointSource::new(Point3f::new(0.0, 0.0, 2.0), Vector3f::new(0.0, 0.0, 1.0), AngularDistribution::Isotropic);
        let mut rng = Rng::new(12);
        let n = 20_000;
        let mut mean_z = 0.0;
        for _ in 0..n {
            let p = source.get_next_photon(&tissue, &mut rng).unwrap();
            assert_eq!(p.position, source.position);
            mean_z += p.direction.z;
        }
        assert!((mean_z / n as Float).abs() < 0.02);
    }

    #[test]
    fn directional_follows_axis() {
        let tissue = TissueModel::semi_infinite(1.0, OpticalProperties::default()).unwrap();
        let axis = Vector3f::new(0.6, 0.0, 0.8);
        let source = PointSource::new(Point3f::zero(), axis, AngularDistribution::Directional);
        let p = source.get_next_photon(&tissue, &mut Rng::new(0)).unwrap();
        assert_eq!(p.direction, axis);
        assert_eq!(p.region_index, 1);
    }
}
