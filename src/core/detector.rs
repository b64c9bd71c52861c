//! Statistical tallies attached to virtual boundaries.
use super::mc::Float;
use super::error::{Error, Result};
use super::geometry::{Point3f, Vector3f};
use super::photon::{Photon, PhotonExitRecord};
use super::virtual_boundary::{VirtualBoundaryInput, VirtualBoundaryType};
use crate::detectors::*;
use num::Complex;
use std::fmt;

/// A uniformly discretized axis with `count` bins spanning `[start, stop)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BinRange {
    pub start: Float,
    pub stop: Float,
    pub count: usize
}

impl BinRange {
    pub fn new(start: Float, stop: Float, count: usize) -> BinRange {
        BinRange { start, stop, count }
    }

    #[inline]
    pub fn delta(&self) -> Float {
        (self.stop - self.start) / self.count as Float
    }

    /// Bin holding `v`, `None` when `v` falls outside the axis.
    #[inline]
    pub fn index(&self, v: Float) -> Option<usize> {
        if !(v >= self.start && v < self.stop) {
            return None;
        }
        let i = ((v - self.start) / self.delta()) as usize;
        Some(i.min(self.count - 1))
    }

    pub fn midpoint(&self, i: usize) -> Float {
        self.start + (i as Float + 0.5) * self.delta()
    }

    pub fn is_valid(&self) -> bool {
        self.count > 0 && self.start.is_finite() && self.stop.is_finite() && self.stop > self.start
    }
}

impl fmt::Display for BinRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}) x {}", self.start, self.stop, self.count)
    }
}

/// The closed set of detectors, tagged with their bin axes.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorInput {
    RDiffuse,
    ROfRho { rho: BinRange },
    ROfAngle { angle: BinRange },
    ROfRhoAndTime { rho: BinRange, time: BinRange },
    ROfXAndY { x: BinRange, y: BinRange },
    /// Spatial frequency domain reflectance, frequencies in 1/mm.
    ROfFx { fx: BinRange },
    TDiffuse,
    TOfRho { rho: BinRange },
    TOfAngle { angle: BinRange },
    RSpecular,
    ATotal,
    AOfRhoAndZ { rho: BinRange, z: BinRange },
    FluenceOfRhoAndZ { rho: BinRange, z: BinRange },
    /// Derivative of R(rho) with respect to the absorption of the perturbed regions.
    DmcROfRhoDMua { rho: BinRange },
    /// Derivative of R(rho) with respect to the scattering of the perturbed regions.
    DmcROfRhoDMus { rho: BinRange }
}

impl DetectorInput {
    pub fn name(&self) -> &'static str {
        match self {
            DetectorInput::RDiffuse => "RDiffuse",
            DetectorInput::ROfRho { .. } => "ROfRho",
            DetectorInput::ROfAngle { .. } => "ROfAngle",
            DetectorInput::ROfRhoAndTime { .. } => "ROfRhoAndTime",
            DetectorInput::ROfXAndY { .. } => "ROfXAndY",
            DetectorInput::ROfFx { .. } => "ROfFx",
            DetectorInput::TDiffuse => "TDiffuse",
            DetectorInput::TOfRho { .. } => "TOfRho",
            DetectorInput::TOfAngle { .. } => "TOfAngle",
            DetectorInput::RSpecular => "RSpecular",
            DetectorInput::ATotal => "ATotal",
            DetectorInput::AOfRhoAndZ { .. } => "AOfRhoAndZ",
            DetectorInput::FluenceOfRhoAndZ { .. } => "FluenceOfRhoAndZ",
            DetectorInput::DmcROfRhoDMua { .. } => "DmcROfRhoDMua",
            DetectorInput::DmcROfRhoDMus { .. } => "DmcROfRhoDMus"
        }
    }

    /// The boundary this detector must be registered on.
    pub fn boundary_type(&self) -> VirtualBoundaryType {
        match self {
            DetectorInput::RDiffuse
            | DetectorInput::ROfRho { .. }
            | DetectorInput::ROfAngle { .. }
            | DetectorInput::ROfRhoAndTime { .. }
            | DetectorInput::ROfXAndY { .. }
            | DetectorInput::ROfFx { .. }
            | DetectorInput::DmcROfRhoDMua { .. }
            | DetectorInput::DmcROfRhoDMus { .. } => VirtualBoundaryType::DiffuseReflectance,
            DetectorInput::TDiffuse
            | DetectorInput::TOfRho { .. }
            | DetectorInput::TOfAngle { .. } => VirtualBoundaryType::DiffuseTransmittance,
            DetectorInput::RSpecular => VirtualBoundaryType::SpecularReflectance,
            DetectorInput::ATotal
            | DetectorInput::AOfRhoAndZ { .. }
            | DetectorInput::FluenceOfRhoAndZ { .. } => VirtualBoundaryType::GenericVolume
        }
    }

    pub fn axes(&self) -> Vec<BinRange> {
        match *self {
            DetectorInput::RDiffuse
            | DetectorInput::TDiffuse
            | DetectorInput::RSpecular
            | DetectorInput::ATotal => Vec::new(),
            DetectorInput::ROfRho { rho }
            | DetectorInput::TOfRho { rho }
            | DetectorInput::DmcROfRhoDMua { rho }
            | DetectorInput::DmcROfRhoDMus { rho } => vec![rho],
            DetectorInput::ROfAngle { angle } | DetectorInput::TOfAngle { angle } => vec![angle],
            DetectorInput::ROfRhoAndTime { rho, time } => vec![rho, time],
            DetectorInput::ROfXAndY { x, y } => vec![x, y],
            DetectorInput::ROfFx { fx } => vec![fx],
            DetectorInput::AOfRhoAndZ { rho, z }
            | DetectorInput::FluenceOfRhoAndZ { rho, z } => vec![rho, z]
        }
    }

    /// Total number of bins over all axes.
    pub fn bin_count(&self) -> usize {
        self.axes().iter().map(|a| a.count).product()
    }

    /// Derivative detectors only make sense when replaying a database.
    pub fn is_perturbation_only(&self) -> bool {
        match self {
            DetectorInput::DmcROfRhoDMua { .. } | DetectorInput::DmcROfRhoDMus { .. } => true,
            _ => false
        }
    }

    pub fn validate(&self) -> Result<()> {
        for axis in self.axes() {
            if !axis.is_valid() {
                return Err(Error::Config(format!("detector {} has invalid bin range {}", self.name(), axis)));
            }
        }
        match self {
            DetectorInput::ROfRho { rho } | DetectorInput::TOfRho { rho } if rho.start < 0.0 => {
                Err(Error::Config(format!("detector {} has negative radii", self.name())))
            }
            _ => Ok(())
        }
    }
}

/// A photon crossing a virtual boundary, as seen by the detectors.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ExitEvent {
    pub position: Point3f,
    pub direction: Vector3f,
    pub weight: Float,
    pub total_time: Float,
    /// Derivative of the weight with respect to the perturbed absorption.
    pub d_mua: Float,
    /// Derivative of the weight with respect to the perturbed scattering.
    pub d_mus: Float
}

impl ExitEvent {
    pub fn new(position: Point3f, direction: Vector3f, weight: Float, total_time: Float) -> ExitEvent {
        ExitEvent {
            position,
            direction,
            weight,
            total_time,
            d_mua: 0.0,
            d_mus: 0.0
        }
    }

    #[inline]
    pub fn rho(&self) -> Float {
        self.position.radial_distance(0.0, 0.0)
    }
}

impl<'a> From<&'a Photon> for ExitEvent {
    fn from(p: &'a Photon) -> ExitEvent {
        ExitEvent::new(p.position, p.direction, p.weight, p.total_time)
    }
}

impl<'a> From<&'a PhotonExitRecord> for ExitEvent {
    fn from(r: &'a PhotonExitRecord) -> ExitEvent {
        ExitEvent::new(r.position, r.direction, r.weight, r.total_time)
    }
}

/// Weight deposited inside the tissue by one interaction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AbsorptionEvent {
    pub position: Point3f,
    pub weight: Float,
    pub region_index: usize,
    pub mua: Float
}

/// Running first and second moments per bin.
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    pub sum: Vec<Float>,
    pub sum_sq: Vec<Float>,
    pub count: Vec<u64>,
    /// Imaginary parts, only present for complex valued detectors.
    pub imaginary: Option<(Vec<Float>, Vec<Float>)>
}

impl Tally {
    pub fn new(bins: usize) -> Tally {
        Tally {
            sum: vec![0.0; bins],
            sum_sq: vec![0.0; bins],
            count: vec![0; bins],
            imaginary: None
        }
    }

    pub fn complex(bins: usize) -> Tally {
        let mut tally = Tally::new(bins);
        tally.imaginary = Some((vec![0.0; bins], vec![0.0; bins]));
        tally
    }

    pub fn len(&self) -> usize {
        self.sum.len()
    }

    #[inline]
    pub fn add(&mut self, bin: usize, value: Float) {
        self.sum[bin] += value;
        self.sum_sq[bin] += value * value;
        self.count[bin] += 1;
    }

    #[inline]
    pub fn add_complex(&mut self, bin: usize, value: Complex<Float>) {
        self.add(bin, value.re);
        if let Some((sum, sum_sq)) = self.imaginary.as_mut() {
            sum[bin] += value.im;
            sum_sq[bin] += value.im * value.im;
        }
    }

    /// Element-wise accumulation of another tally over the same bins.
    pub fn merge(&mut self, other: &Tally) {
        debug_assert_eq!(self.len(), other.len());
        for i in 0..self.len() {
            self.sum[i] += other.sum[i];
            self.sum_sq[i] += other.sum_sq[i];
            self.count[i] += other.count[i];
        }
        if let (Some((sum, sum_sq)), Some((other_sum, other_sum_sq))) = (self.imaginary.as_mut(), other.imaginary.as_ref()) {
            for i in 0..sum.len() {
                sum[i] += other_sum[i];
                sum_sq[i] += other_sum_sq[i];
            }
        }
    }
}

/// Weight one photon has deposited so far, per bin. Folded into a [Tally]
/// when the walk ends so every photon is a single sample of each bin it
/// touched.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotonDeposits {
    pending: Vec<Float>,
    touched: Vec<usize>
}

impl PhotonDeposits {
    pub fn new(bins: usize) -> PhotonDeposits {
        PhotonDeposits {
            pending: vec![0.0; bins],
            touched: Vec::new()
        }
    }

    #[inline]
    pub fn add(&mut self, bin: usize, value: Float) {
        if value == 0.0 {
            return;
        }
        if self.pending[bin] == 0.0 {
            self.touched.push(bin);
        }
        self.pending[bin] += value;
    }

    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    pub fn fold_into(&mut self, tally: &mut Tally) {
        for bin in self.touched.drain(..) {
            tally.add(bin, self.pending[bin]);
            self.pending[bin] = 0.0;
        }
    }
}

/// Mean and standard error of one observable given its raw sums.
fn moments(sum: &[Float], sum_sq: &[Float], norms: &[Float], n: Float) -> (Vec<Float>, Vec<Float>, Vec<Float>) {
    let mut mean = Vec::with_capacity(sum.len());
    let mut second_moment = Vec::with_capacity(sum.len());
    let mut standard_error = Vec::with_capacity(sum.len());
    for i in 0..sum.len() {
        if n > 0.0 && norms[i] > 0.0 {
            let m = sum[i] / (n * norms[i]);
            let s = sum_sq[i] / (n * norms[i] * norms[i]);
            mean.push(m);
            second_moment.push(s);
            standard_error.push(((s - m * m).max(0.0) / n).sqrt());
        } else {
            mean.push(0.0);
            second_moment.push(0.0);
            standard_error.push(0.0);
        }
    }
    (mean, second_moment, standard_error)
}

/// Finalized statistics of one detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorResult {
    pub name: String,
    pub boundary_type: VirtualBoundaryType,
    pub axes: Vec<BinRange>,
    pub mean: Vec<Float>,
    pub second_moment: Vec<Float>,
    pub standard_error: Vec<Float>,
    pub mean_imaginary: Option<Vec<Float>>,
    pub standard_error_imaginary: Option<Vec<Float>>,
    /// Number of contributions per bin. Volume detectors count photons,
    /// surface detectors count crossings.
    pub tally_count: Vec<u64>,
    pub photon_count: u64
}

impl DetectorResult {
    /// Sum of the means, e.g. the total reflectance of a single bin detector.
    pub fn total(&self) -> Float {
        self.mean.iter().sum()
    }
}

/// A tally attached to a virtual boundary. Implementations decide which bin
/// an event falls in and how bins are normalized.
pub trait Detector: Send + fmt::Debug {
    fn input(&self) -> &DetectorInput;
    fn tally(&self) -> &Tally;
    fn tally_mut(&mut self) -> &mut Tally;

    fn tally_exit(&mut self, _event: &ExitEvent) {}

    fn tally_absorption(&mut self, _event: &AbsorptionEvent) {}

    /// The photon being tallied has terminated.
    fn end_photon(&mut self) {}

    /// Area, solid angle, time or volume measure of a bin.
    fn normalization(&self, _bin: usize) -> Float {
        1.0
    }

    fn name(&self) -> &str {
        self.input().name()
    }

    fn merge(&mut self, other: &dyn Detector) {
        self.tally_mut().merge(other.tally());
    }

    fn finalize(&self, photon_count: u64) -> DetectorResult {
        let tally = self.tally();
        let n = photon_count as Float;
        let norms: Vec<Float> = (0..tally.len()).map(|i| self.normalization(i)).collect();
        let (mean, second_moment, standard_error) = moments(&tally.sum, &tally.sum_sq, &norms, n);
        let (mean_imaginary, standard_error_imaginary) = match tally.imaginary.as_ref() {
            Some((sum, sum_sq)) => {
                let (m, _, se) = moments(sum, sum_sq, &norms, n);
                (Some(m), Some(se))
            }
            None => (None, None)
        };
        DetectorResult {
            name: String::from(self.name()),
            boundary_type: self.input().boundary_type(),
            axes: self.input().axes(),
            mean,
            second_moment,
            standard_error,
            mean_imaginary,
            standard_error_imaginary,
            tally_count: tally.count.clone(),
            photon_count
        }
    }
}

pub type BoxDetector = Box<dyn Detector>;

/// Build an empty detector for the given input.
pub fn create_detector(input: &DetectorInput) -> BoxDetector {
    match *input {
        DetectorInput::RDiffuse
        | DetectorInput::TDiffuse
        | DetectorInput::RSpecular
        | DetectorInput::ATotal => Box::new(TotalDetector::new(input.clone())),
        DetectorInput::ROfRho { rho } | DetectorInput::TOfRho { rho } => Box::new(RadialDetector::new(input.clone(), rho)),
        DetectorInput::ROfAngle { angle } | DetectorInput::TOfAngle { angle } => Box::new(AngleDetector::new(input.clone(), angle)),
        DetectorInput::ROfRhoAndTime { rho, time } => Box::new(RhoTimeDetector::new(input.clone(), rho, time)),
        DetectorInput::ROfXAndY { x, y } => Box::new(PlanarDetector::new(input.clone(), x, y)),
        DetectorInput::ROfFx { fx } => Box::new(FrequencyDetector::new(input.clone(), fx)),
        DetectorInput::AOfRhoAndZ { rho, z } => Box::new(VolumeDetector::absorption(input.clone(), rho, z)),
        DetectorInput::FluenceOfRhoAndZ { rho, z } => Box::new(VolumeDetector::fluence(input.clone(), rho, z)),
        DetectorInput::DmcROfRhoDMua { rho } => Box::new(DerivativeDetector::mua(input.clone(), rho)),
        DetectorInput::DmcROfRhoDMus { rho } => Box::new(DerivativeDetector::mus(input.clone(), rho))
    }
}

/// All detectors of a run, grouped by the boundary they listen on. Each
/// worker owns one set; sets are merged once the workers finish.
#[derive(Debug, Default)]
pub struct DetectorSet {
    boundaries: Vec<(VirtualBoundaryType, Vec<BoxDetector>)>
}

impl DetectorSet {
    pub fn new(inputs: &[VirtualBoundaryInput]) -> DetectorSet {
        let boundaries = inputs.iter()
            .map(|vb| (vb.boundary_type, vb.detectors.iter().map(create_detector).collect()))
            .collect();
        DetectorSet { boundaries }
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.iter().all(|(_, d)| d.is_empty())
    }

    pub fn has_volume_detectors(&self) -> bool {
        self.boundaries.iter().any(|(t, d)| *t == VirtualBoundaryType::GenericVolume && !d.is_empty())
    }

    pub fn tally_exit(&mut self, boundary_type: VirtualBoundaryType, event: &ExitEvent) {
        for (t, detectors) in self.boundaries.iter_mut() {
            if *t == boundary_type {
                for d in detectors.iter_mut() {
                    d.tally_exit(event);
                }
            }
        }
    }

    pub fn tally_absorption(&mut self, event: &AbsorptionEvent) {
        for (t, detectors) in self.boundaries.iter_mut() {
            if *t == VirtualBoundaryType::GenericVolume {
                for d in detectors.iter_mut() {
                    d.tally_absorption(event);
                }
            }
        }
    }

    pub fn end_photon(&mut self) {
        for (t, detectors) in self.boundaries.iter_mut() {
            if *t == VirtualBoundaryType::GenericVolume {
                for d in detectors.iter_mut() {
                    d.end_photon();
                }
            }
        }
    }

    /// Accumulate a set built from the same inputs.
    pub fn merge(&mut self, other: &DetectorSet) {
        for ((_, mine), (_, theirs)) in self.boundaries.iter_mut().zip(other.boundaries.iter()) {
            for (a, b) in mine.iter_mut().zip(theirs.iter()) {
                a.merge(b.as_ref());
            }
        }
    }

    pub fn finalize(&self, photon_count: u64) -> Vec<DetectorResult> {
        self.boundaries.iter()
            .flat_map(|(_, d)| d.iter())
            .map(|d| d.finalize(photon_count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mc::consts::PI;

    #[test]
    fn bin_range_indexing() {
        let r = BinRange::new(0.0, 10.0, 100);
        assert_eq!(r.index(0.0), Some(0));
        assert_eq!(r.index(0.15), Some(1));
        assert_eq!(r.index(9.999), Some(99));
        assert_eq!(r.index(10.0), None);
        assert_eq!(r.index(-0.1), None);
        assert_eq!(r.index(std::f64::NAN), None);
        assert!((r.midpoint(0) - 0.05).abs() < 1e-12);
        assert!(!BinRange::new(1.0, 1.0, 3).is_valid());
        assert!(!BinRange::new(0.0, 1.0, 0).is_valid());
    }

    #[test]
    fn radial_statistics() {
        let rho = BinRange::new(0.0, 2.0, 2);
        let mut d = create_detector(&DetectorInput::ROfRho { rho });
        d.tally_exit(&ExitEvent::new(Point3f::new(0.5, 0.0, 0.0), Vector3f::new(0.0, 0.0, -1.0), 0.5, 0.0));
        d.tally_exit(&ExitEvent::new(Point3f::new(0.0, 0.5, 0.0), Vector3f::new(0.0, 0.0, -1.0), 0.5, 0.0));
        d.tally_exit(&ExitEvent::new(Point3f::new(0.0, 5.0, 0.0), Vector3f::new(0.0, 0.0, -1.0), 0.5, 0.0));
        let r = d.finalize(4);
        let norm = 2.0 * PI * 0.5 * 1.0;
        assert!((r.mean[0] - 1.0 / (4.0 * norm)).abs() < 1e-12);
        assert_eq!(r.mean[1], 0.0);
        assert_eq!(r.tally_count, vec![2, 0]);
        let second = 0.5 / (4.0 * norm * norm);
        let se = ((second - r.mean[0] * r.mean[0]) / 4.0).sqrt();
        assert!((r.standard_error[0] - se).abs() < 1e-12);
    }

    #[test]
    fn sets_route_by_boundary_and_merge() {
        let inputs = vec![
            VirtualBoundaryInput::new(VirtualBoundaryType::DiffuseReflectance, vec![DetectorInput::RDiffuse]),
            VirtualBoundaryInput::new(VirtualBoundaryType::DiffuseTransmittance, vec![DetectorInput::TDiffuse]),
        ];
        let mut a = DetectorSet::new(&inputs);
        let mut b = DetectorSet::new(&inputs);
        let e = ExitEvent::new(Point3f::zero(), Vector3f::new(0.0, 0.0, -1.0), 0.25, 0.0);
        a.tally_exit(VirtualBoundaryType::DiffuseReflectance, &e);
        b.tally_exit(VirtualBoundaryType::DiffuseReflectance, &e);
        b.tally_exit(VirtualBoundaryType::DiffuseTransmittance, &e);
        a.merge(&b);
        let results = a.finalize(2);
        assert_eq!(results[0].name, "RDiffuse");
        assert!((results[0].mean[0] - 0.25).abs() < 1e-12);
        assert!((results[1].mean[0] - 0.125).abs() < 1e-12);
        assert!(!a.has_volume_detectors());
    }

    #[test]
    fn absorbed_weight_is_one_sample_per_photon() {
        let inputs = vec![VirtualBoundaryInput::new(VirtualBoundaryType::GenericVolume, vec![DetectorInput::ATotal])];
        let mut set = DetectorSet::new(&inputs);
        let absorb = |set: &mut DetectorSet, weight: Float| set.tally_absorption(&AbsorptionEvent {
            position: Point3f::zero(),
            weight,
            region_index: 1,
            mua: 0.1
        });
        absorb(&mut set, 0.2);
        absorb(&mut set, 0.3);
        set.end_photon();
        absorb(&mut set, 0.1);
        set.end_photon();
        set.end_photon();

        // Per photon totals are 0.5 and 0.1.
        let r = &set.finalize(3)[0];
        let mean: Float = 0.6 / 3.0;
        let second: Float = (0.25 + 0.01) / 3.0;
        assert!((r.mean[0] - mean).abs() < 1e-12);
        assert!((r.second_moment[0] - second).abs() < 1e-12);
        assert!((r.standard_error[0] - ((second - mean * mean) / 3.0).sqrt()).abs() < 1e-12);
        assert!(r.standard_error[0] > 0.0);
        assert_eq!(r.tally_count, vec![2]);
    }

    #[test]
    fn detector_validation() {
        assert!(DetectorInput::ROfRho { rho: BinRange::new(0.0, 10.0, 10) }.validate().is_ok());
        assert!(DetectorInput::ROfRho { rho: BinRange::new(-1.0, 10.0, 10) }.validate().is_err());
        assert!(DetectorInput::ROfXAndY { x: BinRange::new(0.0, 1.0, 0), y: BinRange::new(0.0, 1.0, 1) }.validate().is_err());
        assert_eq!(DetectorInput::AOfRhoAndZ { rho: BinRange::new(0.0, 1.0, 4), z: BinRange::new(0.0, 1.0, 5) }.bin_count(), 20);
        assert_eq!(DetectorInput::RDiffuse.bin_count(), 1);
        assert!(DetectorInput::DmcROfRhoDMua { rho: BinRange::new(0.0, 1.0, 4) }.is_perturbation_only());
    }
}
