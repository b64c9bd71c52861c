use crate::core::detector::{BinRange, Detector, DetectorInput, ExitEvent, Tally};
use crate::core::mc::Float;

/// Reflectance on a Cartesian grid of the surface, x major.
#[derive(Debug, Clone)]
pub struct PlanarDetector {
    input: DetectorInput,
    x: BinRange,
    y: BinRange,
    tally: Tally
}

impl PlanarDetector {
    pub fn new(input: DetectorInput, x: BinRange, y: BinRange) -> PlanarDetector {
        PlanarDetector {
            input,
            x,
            y,
            tally: Tally::new(x.count * y.count)
        }
    }
}

impl Detector for PlanarDetector {
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
        if let (Some(ix), Some(iy)) = (self.x.index(event.position.x), self.y.index(event.position.y)) {
            self.tally.add(ix * self.y.count + iy, event.weight);
        }
    }

    fn normalization(&self, _bin: usize) -> Float {
        self.x.delta() * self.y.delta()
    }
}
