use crate::core::detector::{BinRange, Detector, DetectorInput, ExitEvent, Tally};
use crate::core::mc::{Float, consts::PI};
use num::clamp;

/// Exit weight binned by the polar angle between the exit direction and the
/// surface normal, normalized per unit solid angle.
#[derive(Debug, Clone)]
pub struct AngleDetector {
    input: DetectorInput,
    angle: BinRange,
    tally: Tally
}

impl AngleDetector {
    pub fn new(input: DetectorInput, angle: BinRange) -> AngleDetector {
        AngleDetector {
            input,
            angle,
            tally: Tally::new(angle.count)
        }
    }
}

impl Detector for AngleDetector {
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
        let theta = clamp(event.direction.z.abs(), 0.0, 1.0).acos();
        if let Some(i) = self.angle.index(theta) {
            self.tally.add(i, event.weight);
        }
    }

    fn normalization(&self, bin: usize) -> Float {
        2.0 * PI * self.angle.midpoint(bin).sin() * self.angle.delta()
    }
}
