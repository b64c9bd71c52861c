use crate::core::detector::{BinRange, Detector, DetectorInput, ExitEvent, Tally};
use crate::core::mc::Float;
use super::annulus_area;

/// Exit weight binned by distance from the z axis, normalized per unit area.
#[derive(Debug, Clone)]
pub struct RadialDetector {
    input: DetectorInput,
    rho: BinRange,
    tally: Tally
}

impl RadialDetector {
    pub fn new(input: DetectorInput, rho: BinRange) -> RadialDetector {
        RadialDetector {
            input,
            rho,
            tally: Tally::new(rho.count)
        }
    }
}

impl Detector for RadialDetector {
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
            self.tally.add(i, event.weight);
        }
    }

    fn normalization(&self, bin: usize) -> Float {
        annulus_area(&self.rho, bin)
    }
}
