//! Photon transport core: numerics, tissue description, the random walk and
//! everything that records its outcome.

pub mod mc;
pub mod rng;
#[macro_use]
pub mod geometry;
pub mod error;
pub mod sampling;

pub mod optical_properties;
pub mod phase_function;
pub mod fresnel;
pub mod photon;
pub mod region;
pub mod tissue;

pub mod virtual_boundary;
pub mod detector;
pub mod absorption;
pub mod transport;
pub mod database;

pub mod options;
pub mod stats_accumulator;
pub mod progress_reporter;
pub mod simulation;
pub mod perturbation;

pub use error::{Error, Result};
pub use simulation::{run_perturbation, run_simulation, SimulationOrchestrator, SimulationOutput};
