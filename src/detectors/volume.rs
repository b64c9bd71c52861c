use crate::core::detector::{AbsorptionEvent, BinRange, Detector, DetectorInput, PhotonDeposits, Tally};
use crate::core::mc::Float;
use super::annulus_area;

/// Collision estimator over cylindrical rings around the z axis, rho major.
/// Tallies either absorbed weight or fluence (absorbed weight over `mua`).
#[derive(Debug, Clone)]
pub struct VolumeDetector {
    input: DetectorInput,
    rho: BinRange,
    z: BinRange,
    fluence: bool,
    tally: Tally,
    deposits: PhotonDeposits
}

impl VolumeDetector {
    pub fn absorption(input: DetectorInput, rho: BinRange, z: BinRange) -> VolumeDetector {
        VolumeDetector {
            input,
            rho,
            z,
            fluence: false,
            tally: Tally::new(rho.count * z.count),
            deposits: PhotonDeposits::new(rho.count * z.count)
        }
    }

    pub fn fluence(input: DetectorInput, rho: BinRange, z: BinRange) -> VolumeDetector {
        VolumeDetector {
            fluence: true,
            ..VolumeDetector::absorption(input, rho, z)
        }
    }
}

impl Detector for VolumeDetector {
    fn input(&self) -> &DetectorInput {
        &self.input
    }

    fn tally(&self) -> &Tally {
        &self.tally
    }

    fn tally_mut(&mut self) -> &mut Tally {
        &mut self.tally
    }

    fn tally_absorption(&mut self, event: &AbsorptionEvent) {
        let value = if self.fluence {
            if event.mua <= 0.0 {
                return;
            }
            event.weight / event.mua
        } else {
            event.weight
        };
        let rho = event.position.radial_distance(0.0, 0.0);
        if let (Some(ir), Some(iz)) = (self.rho.index(rho), self.z.index(event.position.z)) {
            self.deposits.add(ir * self.z.count + iz, value);
        }
    }

    fn end_photon(&mut self) {
        self.deposits.fold_into(&mut self.tally);
    }

    fn normalization(&self, bin: usize) -> Float {
        annulus_area(&self.rho, bin / self.z.count) * self.z.delta()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Point3f;

    #[test]
    fn fluence_divides_by_absorption() {
        let rho = BinRange::new(0.0, 1.0, 1);
        let z = BinRange::new(0.0, 1.0, 2);
        let mut d = VolumeDetector::fluence(DetectorInput::FluenceOfRhoAndZ { rho, z }, rho, z);
        d.tally_absorption(&AbsorptionEvent { position: Point3f::new(0.1, 0.0, 0.7), weight: 0.02, region_index: 1, mua: 0.1 });
        d.tally_absorption(&AbsorptionEvent { position: Point3f::new(0.1, 0.0, 0.7), weight: 0.02, region_index: 1, mua: 0.0 });
        assert_eq!(d.tally().sum[1], 0.0);
        d.end_photon();
        assert!((d.tally().sum[1] - 0.2).abs() < 1e-12);
        assert_eq!(d.tally().count, vec![0, 1]);
    }

    #[test]
    fn deposits_in_one_bin_form_one_sample() {
        let rho = BinRange::new(0.0, 2.0, 2);
        let z = BinRange::new(0.0, 1.0, 1);
        let mut d = VolumeDetector::absorption(DetectorInput::AOfRhoAndZ { rho, z }, rho, z);
        let at = |x: f64, weight: f64| AbsorptionEvent { position: Point3f::new(x, 0.0, 0.5), weight, region_index: 1, mua: 0.1 };
        d.tally_absorption(&at(0.5, 0.1));
        d.tally_absorption(&at(0.5, 0.3));
        d.tally_absorption(&at(1.5, 0.2));
        d.end_photon();
        d.tally_absorption(&at(0.5, 0.2));
        d.end_photon();

        let t = d.tally();
        assert_eq!(t.count, vec![2, 1]);
        assert!((t.sum[0] - 0.6).abs() < 1e-12);
        assert!((t.sum_sq[0] - (0.16 + 0.04)).abs() < 1e-12);
        assert!((t.sum_sq[1] - 0.04).abs() < 1e-12);

        // Two photons, bin 0 holds samples 0.4 and 0.2.
        let r = d.finalize(2);
        let norm = d.normalization(0);
        let m = 0.3 / norm;
        let s = 0.1 / (norm * norm);
        assert!((r.standard_error[0] - ((s - m * m) / 2.0).sqrt()).abs() < 1e-12);
        assert!(r.standard_error[0] > 0.0);
    }
}
