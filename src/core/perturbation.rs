//! Perturbation Monte Carlo.
//!
//! A random walk recorded under one set of optical properties can stand in
//! for a walk under different absorption and scattering coefficients once
//! its weight is multiplied by the likelihood ratio of the two walks. For
//! every perturbed region `r` with `c` collisions and path length `L` the
//! ratio is `(mus'/mus)^c exp(-(mut' - mut) L)`. Replaying a database
//! recorded with collision info therefore yields the tallies of the
//! perturbed tissue without transporting any photon again.

use super::mc::Float;
use super::database::PhotonDatabaseReader;
use super::detector::{DetectorInput, DetectorResult, DetectorSet, ExitEvent};
use super::error::{Error, Result};
use super::optical_properties::OpticalProperties;
use super::photon::{PhotonExitRecord, PhotonHistory};
use super::tissue::TissueModel;
use super::virtual_boundary::VirtualBoundaryInput;

/// New optical properties for some regions of the recorded tissue.
#[derive(Debug, Clone, PartialEq)]
pub struct Perturbation {
    pub name: String,
    pub regions: Vec<(usize, OpticalProperties)>
}

impl Perturbation {
    pub fn new(name: &str, regions: Vec<(usize, OpticalProperties)>) -> Perturbation {
        Perturbation {
            name: String::from(name),
            regions
        }
    }
}

/// Reweighted weight of one record and its derivatives with respect to the
/// perturbed regions' absorption and scattering.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Reweighting {
    pub weight: Float,
    pub d_mua: Float,
    pub d_mus: Float
}

/// Tallies of one perturbation.
#[derive(Debug, Clone)]
pub struct PerturbationResult {
    pub name: String,
    pub results: Vec<DetectorResult>
}

pub struct PerturbationPostProcessor {
    reference: Vec<OpticalProperties>
}

impl PerturbationPostProcessor {
    /// Replays against the optical properties the database was recorded with.
    pub fn new(tissue: &TissueModel) -> PerturbationPostProcessor {
        PerturbationPostProcessor {
            reference: tissue.optical_properties()
        }
    }

    /// Only absorption and scattering may change: the walk geometry depends
    /// on the anisotropy and refractive index.
    pub fn validate(&self, perturbation: &Perturbation) -> Result<()> {
        for (region, ops) in &perturbation.regions {
            let reference = self.reference.get(*region).ok_or_else(|| Error::Perturbation(format!(
                "{} perturbs region {} of a {} region tissue", perturbation.name, region, self.reference.len())))?;
            if !ops.is_valid() {
                return Err(Error::Perturbation(format!("{} has invalid optical properties {}", perturbation.name, ops)));
            }
            if ops.g != reference.g || ops.n != reference.n {
                return Err(Error::Perturbation(format!(
                    "{} changes g or n of region {}, only mua and mus can be perturbed", perturbation.name, region)));
            }
        }
        Ok(())
    }

    /// Likelihood ratio reweighting of one recorded walk.
    pub fn reweight(&self, weight: Float, history: &PhotonHistory, perturbation: &Perturbation) -> Result<Reweighting> {
        if history.region_count() != self.reference.len() {
            return Err(Error::Perturbation(format!(
                "record holds {} regions, tissue has {}", history.region_count(), self.reference.len())));
        }
        let mut factor = 1.0;
        let mut d_mua = 0.0;
        let mut d_mus = 0.0;
        for (region, perturbed) in &perturbation.regions {
            let reference = &self.reference[*region];
            let collisions = history.collision_counts[*region] as Float;
            let path_length = history.path_lengths[*region];
            if collisions > 0.0 {
                if reference.mus <= 0.0 {
                    return Err(Error::Perturbation(format!("region {} recorded collisions without scattering", region)));
                }
                factor *= (perturbed.mus / reference.mus).powf(collisions);
            }
            factor *= (-(perturbed.mu_t() - reference.mu_t()) * path_length).exp();
            d_mua -= path_length;
            d_mus += if collisions > 0.0 { collisions / perturbed.mus - path_length } else { -path_length };
        }
        let weight = weight * factor;
        if weight == 0.0 {
            return Ok(Reweighting { weight, d_mua: 0.0, d_mus: 0.0 });
        }
        Ok(Reweighting {
            weight,
            d_mua: weight * d_mua,
            d_mus: weight * d_mus
        })
    }

    fn exit_event(&self, record: &PhotonExitRecord, perturbation: &Perturbation) -> Result<ExitEvent> {
        let history = record.history.as_ref()
            .ok_or_else(|| Error::Perturbation(String::from("database was recorded without collision info")))?;
        let r = self.reweight(record.weight, history, perturbation)?;
        let mut event = ExitEvent::from(record);
        event.weight = r.weight;
        event.d_mua = r.d_mua;
        event.d_mus = r.d_mus;
        Ok(event)
    }

    /// Replay a database once against every perturbation. `photon_count` is
    /// the number of photons launched by the recording run.
    pub fn run(
        &self,
        reader: PhotonDatabaseReader,
        perturbations: &[Perturbation],
        detectors: &[DetectorInput],
        photon_count: u64
    ) -> Result<Vec<PerturbationResult>> {
        let info = reader.info().clone();
        if !info.collision_info {
            return Err(Error::Perturbation(format!("{} was recorded without collision info", reader.path().display())));
        }
        if info.region_count != self.reference.len() {
            return Err(Error::Perturbation(format!(
                "database holds {} regions, tissue has {}", info.region_count, self.reference.len())));
        }
        for d in detectors {
            d.validate()?;
            if d.boundary_type() != info.virtual_boundary {
                return Err(Error::Perturbation(format!(
                    "detector {} cannot be fed from a {} database", d.name(), info.virtual_boundary)));
            }
        }
        for p in perturbations {
            self.validate(p)?;
        }

        let input = [VirtualBoundaryInput::new(info.virtual_boundary, detectors.to_vec())];
        let mut sets: Vec<DetectorSet> = perturbations.iter().map(|_| DetectorSet::new(&input)).collect();
        info!("Replaying {} records against {} perturbations", info.record_count, perturbations.len());
        for record in reader {
            let record = record?;
            for (perturbation, set) in perturbations.iter().zip(sets.iter_mut()) {
                let event = self.exit_event(&record, perturbation)?;
                set.tally_exit(info.virtual_boundary, &event);
            }
        }
        Ok(perturbations.iter()
            .zip(sets.iter())
            .map(|(p, set)| PerturbationResult {
                name: p.name.clone(),
                results: set.finalize(photon_count)
            })
            .collect())
    }
}
