use super::{AngularDistribution, SourceGenerator, SourceProfile, launch_photon};
use crate::core::mc::{Float, consts::PI};
use crate::core::error::Result;
use crate::core::geometry::{Point3f, Vector3f};
use crate::core::photon::Photon;
use crate::core::rng::Rng;
use crate::core::tissue::TissueModel;

/// A cylindrical fiber tip along z. Photons leave the curved surface and the
/// bottom (+z) face, each with probability proportional to its area times its
/// emission efficiency.
#[derive(Debug, Clone)]
pub struct CylindricalFiberSource {
    pub center: Point3f,
    pub radius: Float,
    pub height: Float,
    pub profile: SourceProfile,
    pub angular: AngularDistribution,
    curved_probability: Float
}

impl CylindricalFiberSource {
    pub fn new(
        center: Point3f,
        radius: Float,
        height: Float,
        curved_surface_efficiency: Float,
        bottom_surface_efficiency: Float,
        profile: SourceProfile,
        angular: AngularDistribution
    ) -> CylindricalFiberSource {
        let curved = 2.0 * PI * radius * height * curved_surface_efficiency;
        let bottom = PI * radius * radius * bottom_surface_efficiency;
        CylindricalFiberSource {
            center,
            radius,
            height,
            profile,
            angular,
            curved_probability: curved / (curved + bottom)
        }
    }
}

impl SourceGenerator for CylindricalFiberSource {
    fn get_next_photon(&self, tissue: &TissueModel, rng: &mut Rng) -> Result<Photon> {
        let phi = 2.0 * PI * rng.uniform_float();
        let (offset, normal) = if rng.uniform_float() < self.curved_probability {
            let z = self.profile.sample(0.5 * self.height, rng);
            let normal = Vector3f::new(phi.cos(), phi.sin(), 0.0);
            (Vector3f::new(self.radius * phi.cos(), self.radius * phi.sin(), z), normal)
        } else {
            let r = self.radius * rng.uniform_float().sqrt();
            (Vector3f::new(r * phi.cos(), r * phi.sin(), 0.5 * self.height), Vector3f::new(0.0, 0.0, 1.0))
        };
        let direction = self.angular.sample(&normal, rng);
        launch_photon(tissue, self.center + offset, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::optical_properties::OpticalProperties;

    #[test]
    fn emits_from_curved_surface_and_bottom() {
        let tissue = TissueModel::semi_infinite(1.0, OpticalProperties::default()).unwrap();
        let center = Point3f::new(0.0, 0.0, 3.0);
        let source = CylindricalFiberSource::new(center, 0.5, 2.0, 1.0, 1.0, SourceProfile::Flat, AngularDistribution::Lambertian);
        let mut rng = Rng::new(3);
        let mut bottom = 0;
        let n = 10_000;
        for _ in 0..n {
            let p = source.get_next_photon(&tissue, &mut rng).unwrap();
            let rho = p.position.radial_distance(center.x, center.y);
            if (p.position.z - 4.0).abs() < 1e-10 && rho <= 0.5 + 1e-10 && p.direction.z >= 0.0 {
                bottom += 1;
            } else {
                assert!((rho - 0.5).abs() < 1e-10);
                assert!((p.position.z - 3.0).abs() <= 1.0 + 1e-10);
                assert!(p.direction.x * p.position.x + p.direction.y * p.position.y >= -1e-12);
            }
        }
        // bottom area pi/4 against curved area 2 pi
        let fraction = bottom as Float / n as Float;
        assert!((fraction - 0.25 / 2.25).abs() < 0.02);
    }
}
