use crate::core::detector::{BinRange, Detector, DetectorInput, ExitEvent, Tally};
use crate::core::mc::{Float, consts::PI};
use num::Complex;

/// Spatial frequency domain reflectance. Every exiting photon contributes
/// `w * exp(-i 2 pi fx x)` to each frequency, where the frequencies are the
/// lower edges of the `fx` bins.
#[derive(Debug, Clone)]
pub struct FrequencyDetector {
    input: DetectorInput,
    fx: BinRange,
    tally: Tally
}

impl FrequencyDetector {
    pub fn new(input: DetectorInput, fx: BinRange) -> FrequencyDetector {
        FrequencyDetector {
            input,
            fx,
            tally: Tally::complex(fx.count)
        }
    }

    pub fn frequency(&self, i: usize) -> Float {
        self.fx.start + i as Float * self.fx.delta()
    }
}

impl Detector for FrequencyDetector {
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
        let x = event.position.x;
        for i in 0..self.fx.count {
            let phase = -2.0 * PI * self.frequency(i) * x;
            self.tally.add_complex(i, Complex::from_polar(&event.weight, &phase));
        }
    }
}
