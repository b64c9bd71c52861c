use crate::core::detector::{BinRange, Detector, DetectorInput, ExitEvent, Tally};
use crate::core::mc::Float;
use super::annulus_area;

/// Differential Monte Carlo estimate of dR(rho) with respect to the
/// absorption or scattering coefficient of the perturbed regions. Only fed
/// by perturbation replays, which fill in the event's weight derivatives.
#[derive(Debug, Clone)]
pub struct DerivativeDetector {
    input: DetectorInput,
    rho: BinRange,
    scattering: bool,
    tally: Tally
}

impl DerivativeDetector {
    pub fn mua(input: DetectorInput, rho: BinRange) -> DerivativeDetector {
        DerivativeDetector {
            input,
            rho,
            scattering: false,
            tally: Tally::new(rho.count)
        }
    }

    pub fn mus(input: DetectorInput, rho: BinRange) -> DerivativeDetector {
        DerivativeDetector {
            scattering: true,
            ..DerivativeDetector::mua(input, rho)
        }
    }
}

impl Detector for DerivativeDetector {
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
        if let Some(i) = self.rho.index(event.rho()) {
            self.tally.add(i, if self.scattering { event.d_mus } else { event.d_mua });
        }
    }

    fn normalization(&self, bin: usize) -> Float {
        annulus_area(&self.rho, bin)
    }
}
