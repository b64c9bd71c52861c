use crate::core::detector::{AbsorptionEvent, Detector, DetectorInput, ExitEvent, PhotonDeposits, Tally};
use crate::core::virtual_boundary::VirtualBoundaryType;

/// Single bin detector integrating all weight reaching its boundary:
/// total diffuse reflectance, transmittance, specular reflectance or
/// total absorption.
#[derive(Debug, Clone)]
pub struct TotalDetector {
    input: DetectorInput,
    tally: Tally,
    absorbed: PhotonDeposits
}

impl TotalDetector {
    pub fn new(input: DetectorInput) -> TotalDetector {
        TotalDetector {
            input,
            tally: Tally::new(1),
            absorbed: PhotonDeposits::new(1)
        }
    }
}

impl Detector for TotalDetector {
    fn input(&self) -> &DetectorInput {
        &self.input
    }

    fn tally(&self) -> &Tally {
        &self.tally
    }

    fn tally_mut(&mut self) -> &mut Tally {
        &mut self.tally
    }

    fn tally_exit(&mut self, event: &ExitEvent) {
        if self.input.boundary_type().is_surface() {
            self.tally.add(0, event.weight);
        }
    }

    fn tally_absorption(&mut self, event: &AbsorptionEvent) {
        if self.input.boundary_type() == VirtualBoundaryType::GenericVolume {
            self.absorbed.add(0, event.weight);
        }
    }

    fn end_photon(&mut self) {
        self.absorbed.fold_into(&mut self.tally);
    }
}
