//! Run configuration.
use super::mc::Float;
use super::absorption::AbsorptionWeightingType;
use super::error::{Error, Result};
use super::tissue::TissueModel;
use super::transport::RussianRoulette;
use super::virtual_boundary::{VirtualBoundaryInput, VirtualBoundaryType};
use crate::sources::SourceInput;
use hashbrown::HashSet;
use std::path::PathBuf;
use std::time::Instant;

/// Settings of one simulation run, passed explicitly to everything that needs them.
#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub seed: u64,
    pub photon_count: u64,
    /// Number of parallel workers. Results are reproducible for a fixed
    /// seed and worker count.
    pub worker_count: usize,
    pub absorption_weighting: AbsorptionWeightingType,
    pub russian_roulette: RussianRoulette,
    pub max_collisions: u64,
    /// mm
    pub max_path_length: Float,
    /// Keep per-region path lengths and collision counts so that databases
    /// can be replayed with perturbed optical properties.
    pub record_perturbation_info: bool,
    /// Where photon databases are written.
    pub output_directory: Option<PathBuf>,
    pub quiet: bool,
    /// Abort the run if it is still going at this instant.
    pub deadline: Option<Instant>
}

impl Default for SimulationOptions {
    fn default() -> SimulationOptions {
        SimulationOptions {
            seed: 0,
            photon_count: 1000,
            worker_count: 1,
            absorption_weighting: AbsorptionWeightingType::default(),
            russian_roulette: RussianRoulette::default(),
            max_collisions: 100_000,
            max_path_length: 1e6,
            record_perturbation_info: false,
            output_directory: None,
            quiet: false,
            deadline: None
        }
    }
}

impl SimulationOptions {
    pub fn validate(&self) -> Result<()> {
        if self.photon_count == 0 {
            return Err(Error::Config(String::from("photon count must be positive")));
        }
        if self.worker_count == 0 {
            return Err(Error::Config(String::from("worker count must be positive")));
        }
        let rr = &self.russian_roulette;
        if !(rr.weight_threshold >= 0.0 && rr.weight_threshold < 1.0) || !(rr.chance >= 1.0) {
            return Err(Error::Config(format!("invalid Russian roulette settings {:?}", rr)));
        }
        if self.max_collisions == 0 || !(self.max_path_length > 0.0) {
            return Err(Error::Config(String::from("photon limits must be positive")));
        }
        Ok(())
    }
}

/// Everything a forward simulation needs.
#[derive(Debug, Clone)]
pub struct SimulationInput {
    pub options: SimulationOptions,
    pub tissue: TissueModel,
    pub source: SourceInput,
    pub virtual_boundaries: Vec<VirtualBoundaryInput>
}

impl SimulationInput {
    pub fn new(
        options: SimulationOptions,
        tissue: TissueModel,
        source: SourceInput,
        virtual_boundaries: Vec<VirtualBoundaryInput>
    ) -> SimulationInput {
        SimulationInput { options, tissue, source, virtual_boundaries }
    }

    /// Reject inputs the engine cannot run.
    pub fn validate(&self) -> Result<()> {
        self.options.validate()?;
        self.source.validate()?;
        if self.tissue.regions().iter().all(|r| r.ambient) {
            return Err(Error::Config(String::from("tissue has no non-ambient region")));
        }
        let mut boundaries = HashSet::new();
        for vb in &self.virtual_boundaries {
            if !boundaries.insert(vb.boundary_type) {
                return Err(Error::Config(format!("virtual boundary {} listed twice", vb.boundary_type)));
            }
            if vb.write_database {
                if !vb.boundary_type.is_surface() {
                    return Err(Error::Config(format!("no photon database can be written for {}", vb.boundary_type)));
                }
                if self.options.output_directory.is_none() {
                    return Err(Error::Config(String::from("writing a photon database needs an output directory")));
                }
            }
            let mut names = HashSet::new();
            for d in &vb.detectors {
                d.validate()?;
                if d.boundary_type() != vb.boundary_type {
                    return Err(Error::Config(format!("detector {} belongs on {}, not {}",
                        d.name(), d.boundary_type(), vb.boundary_type)));
                }
                if d.is_perturbation_only() {
                    return Err(Error::Config(format!("detector {} is only available when replaying a database", d.name())));
                }
                if !names.insert(d.name()) {
                    return Err(Error::Config(format!("detector {} listed twice on {}", d.name(), vb.boundary_type)));
                }
            }
        }
        if self.virtual_boundaries.iter().any(|vb| vb.boundary_type == VirtualBoundaryType::GenericVolume)
            && self.options.absorption_weighting == AbsorptionWeightingType::Analog
        {
            warn!("Analog volume tallies only score absorbed photons");
        }
        Ok(())
    }
}
