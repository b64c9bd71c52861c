use crate::core::detector::{BinRange, Detector, DetectorInput, ExitEvent, Tally};
use crate::core::mc::Float;
use super::annulus_area;

/// Time resolved reflectance binned by radial distance and time of flight.
/// Bins are laid out rho major, time minor.
#[derive(Debug, Clone)]
pub struct RhoTimeDetector {
    input: DetectorInput,
    rho: BinRange,
    time: BinRange,
    tally: Tally
}

impl RhoTimeDetector {
    pub fn new(input: DetectorInput, rho: BinRange, time: BinRange) -> RhoTimeDetector {
        RhoTimeDetector {
            input,
            rho,
            time,
            tally: Tally::new(rho.count * time.count)
        }
    }
}

impl Detector for RhoTimeDetector {
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
        if let (Some(ir), Some(it)) = (self.rho.index(event.rho()), self.time.index(event.total_time)) {
            self.tally.add(ir * self.time.count + it, event.weight);
        }
    }

    fn normalization(&self, bin: usize) -> Float {
        annulus_area(&self.rho, bin / self.time.count) * self.time.delta()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{Point3f, Vector3f};

    #[test]
    fn bins_by_rho_then_time() {
        let rho = BinRange::new(0.0, 2.0, 2);
        let time = BinRange::new(0.0, 1.0, 4);
        let mut d = RhoTimeDetector::new(DetectorInput::ROfRhoAndTime { rho, time }, rho, time);
        d.tally_exit(&ExitEvent::new(Point3f::new(1.5, 0.0, 0.0), Vector3f::new(0.0, 0.0, -1.0), 1.0, 0.6));
        d.tally_exit(&ExitEvent::new(Point3f::new(1.5, 0.0, 0.0), Vector3f::new(0.0, 0.0, -1.0), 1.0, 3.0));
        assert_eq!(d.tally().count[6], 1);
        assert_eq!(d.tally().count.iter().sum::<u64>(), 1);
        assert!((d.normalization(6) - annulus_area(&rho, 1) * 0.25).abs() < 1e-12);
    }
}
