//! Runs a forward simulation.
//!
//! The photons of a run are split into contiguous ranges, one per worker.
//! Worker `i` draws from stream `i` of the run seed and tallies into its own
//! [DetectorSet]; the sets are merged in worker order once every worker is
//! done, so a run is reproducible for a fixed seed and worker count. Exit
//! records bound for photon databases are sent to a single writer thread.

use super::mc::Float;
use super::database::{database_file_name, DatabaseInfo, PhotonDatabaseReader, PhotonDatabaseWriter};
use super::detector::{AbsorptionEvent, DetectorInput, DetectorResult, DetectorSet, ExitEvent};
use super::error::{Error, Result};
use super::options::SimulationInput;
use super::perturbation::{Perturbation, PerturbationPostProcessor, PerturbationResult};
use super::photon::{Photon, PhotonExitRecord};
use super::progress_reporter::ProgressReporter;
use super::rng::Rng;
use super::stats_accumulator::TransportStats;
use super::tissue::TissueModel;
use super::transport::{PhotonTransportEngine, TransportEventSink};
use super::virtual_boundary::VirtualBoundaryType;
use crate::sources::{create_source, SourceGenerator};
use crossbeam_channel::{bounded, Receiver, Sender};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

const DATABASE_QUEUE_CAPACITY: usize = 4096;

type DatabaseMessage = (VirtualBoundaryType, PhotonExitRecord);

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    pub photon_count: u64,
    pub results: Vec<DetectorResult>,
    pub stats: TransportStats,
    pub databases: Vec<(PathBuf, DatabaseInfo)>
}

impl SimulationOutput {
    pub fn result(&self, name: &str) -> Option<&DetectorResult> {
        self.results.iter().find(|r| r.name == name)
    }

    pub fn database(&self, boundary: VirtualBoundaryType) -> Option<&Path> {
        self.databases.iter()
            .find(|(_, info)| info.virtual_boundary == boundary)
            .map(|(path, _)| path.as_path())
    }
}

struct WorkerOutput {
    detectors: DetectorSet,
    stats: TransportStats
}

/// Feeds the events of one worker's walks into its detectors and the
/// database queue.
struct WorkerSink<'a> {
    detectors: DetectorSet,
    database: Option<&'a Sender<DatabaseMessage>>,
    database_boundaries: &'a [VirtualBoundaryType]
}

impl<'a> TransportEventSink for WorkerSink<'a> {
    fn on_exit(&mut self, boundary: VirtualBoundaryType, photon: &Photon) -> Result<()> {
        self.detectors.tally_exit(boundary, &ExitEvent::from(photon));
        if let Some(sender) = self.database {
            if self.database_boundaries.contains(&boundary) {
                sender.send((boundary, photon.exit_record()))
                    .map_err(|_| Error::DatabaseFormat(String::from("photon database writer stopped")))?;
            }
        }
        Ok(())
    }

    fn on_absorption(&mut self, event: &AbsorptionEvent) {
        self.detectors.tally_absorption(event);
    }

    fn on_termination(&mut self, _photon: &Photon) {
        self.detectors.end_photon();
    }
}

pub struct SimulationOrchestrator<'a> {
    input: &'a SimulationInput,
    cancel: Arc<AtomicBool>,
    abort: AtomicBool
}

impl<'a> SimulationOrchestrator<'a> {
    pub fn new(input: &'a SimulationInput) -> SimulationOrchestrator<'a> {
        SimulationOrchestrator {
            input,
            cancel: Arc::new(AtomicBool::new(false)),
            abort: AtomicBool::new(false)
        }
    }

    /// Share a flag that stops the run between photons once set.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> SimulationOrchestrator<'a> {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn run(&self) -> Result<SimulationOutput> {
        let input = self.input;
        input.validate()?;
        let options = &input.options;
        let start = Instant::now();
        info!("Simulating {} photons on {} workers, seed {}, {} weighting",
            options.photon_count, options.worker_count, options.seed, options.absorption_weighting);

        let source = create_source(&input.source)?;
        let merged = DetectorSet::new(&input.virtual_boundaries);
        let engine = PhotonTransportEngine::new(&input.tissue, options)
            .with_absorption_tracking(merged.has_volume_detectors());

        let database_boundaries: Vec<VirtualBoundaryType> = input.virtual_boundaries.iter()
            .filter(|vb| vb.write_database)
            .map(|vb| vb.boundary_type)
            .collect();
        let (sender, writer) = if database_boundaries.is_empty() {
            (None, None)
        } else {
            let writers = self.create_databases(&database_boundaries)?;
            let (sender, receiver) = bounded(DATABASE_QUEUE_CAPACITY);
            (Some(sender), Some(spawn_database_writer(writers, receiver)))
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.worker_count)
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?;
        let reporter = ProgressReporter::new(options.photon_count, "Simulating", options.quiet);
        let worker_results: Vec<Result<WorkerOutput>> = pool.install(|| {
            (0..options.worker_count)
                .into_par_iter()
                .map(|worker| {
                    let result = self.run_worker(
                        worker, &engine, source.as_ref(), sender.as_ref(), &database_boundaries, &reporter);
                    if result.is_err() {
                        self.abort.store(true, Ordering::SeqCst);
                    }
                    result
                })
                .collect()
        });

        drop(sender);
        let databases = match writer {
            Some(handle) => handle.join()
                .map_err(|_| Error::DatabaseFormat(String::from("photon database writer panicked")))??,
            None => Vec::new()
        };

        let mut outputs = Vec::with_capacity(worker_results.len());
        let mut failure = None;
        for result in worker_results {
            match result {
                Ok(output) => outputs.push(output),
                // Workers stopped by another worker's failure report Cancelled.
                Err(Error::Cancelled) => { failure.get_or_insert(Error::Cancelled); }
                Err(e) => {
                    if failure.as_ref().map_or(true, |f| match f { Error::Cancelled => true, _ => false }) {
                        failure = Some(e);
                    }
                }
            }
        }
        if let Some(e) = failure {
            error!("Simulation failed: {}", e);
            return Err(e);
        }

        let mut merged = merged;
        let mut stats = TransportStats::new();
        for output in &outputs {
            merged.merge(&output.detectors);
            stats.merge(&output.stats);
        }
        if log_enabled!(log::Level::Debug) {
            let mut report = Vec::new();
            stats.print(&mut report)?;
            debug!("{}", String::from_utf8_lossy(&report));
        }
        info!("Simulation finished in {:.1}s", start.elapsed().as_millis() as Float / 1000.0);

        Ok(SimulationOutput {
            photon_count: options.photon_count,
            results: merged.finalize(options.photon_count),
            stats,
            databases
        })
    }

    fn create_databases(&self, boundaries: &[VirtualBoundaryType]) -> Result<Vec<PhotonDatabaseWriter>> {
        let options = &self.input.options;
        let directory = options.output_directory.as_ref()
            .ok_or_else(|| Error::Config(String::from("writing a photon database needs an output directory")))?;
        std::fs::create_dir_all(directory)?;
        boundaries.iter()
            .map(|b| PhotonDatabaseWriter::create(
                directory.join(database_file_name(*b)),
                *b,
                self.input.tissue.region_count(),
                options.record_perturbation_info))
            .collect()
    }

    fn should_stop(&self) -> bool {
        if self.cancel.load(Ordering::Relaxed) || self.abort.load(Ordering::Relaxed) {
            return true;
        }
        match self.input.options.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                if !self.abort.swap(true, Ordering::SeqCst) {
                    warn!("Simulation deadline reached");
                }
                true
            }
            _ => false
        }
    }

    fn run_worker(
        &self,
        worker: usize,
        engine: &PhotonTransportEngine,
        source: &dyn SourceGenerator,
        database: Option<&Sender<DatabaseMessage>>,
        database_boundaries: &[VirtualBoundaryType],
        reporter: &ProgressReporter
    ) -> Result<WorkerOutput> {
        let options = &self.input.options;
        let (first, last) = photon_range(options.photon_count, options.worker_count, worker);
        let mut rng = Rng::seeded(options.seed, worker as u64);
        let mut stats = TransportStats::new();
        let mut sink = WorkerSink {
            detectors: DetectorSet::new(&self.input.virtual_boundaries),
            database,
            database_boundaries
        };
        debug!("Worker {} simulating photons {}..{}", worker, first, last);

        for index in first..last {
            if self.should_stop() {
                return Err(Error::Cancelled);
            }
            let photon = source.get_photon(engine.tissue(), index, &mut rng)?;
            engine.transport(photon, &mut rng, &mut sink, &mut stats)?;
            reporter.update(1);
        }

        debug!("Worker {} finished {} photons", worker, last - first);
        Ok(WorkerOutput {
            detectors: sink.detectors,
            stats
        })
    }
}

/// Photons `[first, last)` handled by `worker`.
fn photon_range(photon_count: u64, worker_count: usize, worker: usize) -> (u64, u64) {
    let split = |i: usize| (photon_count as u128 * i as u128 / worker_count as u128) as u64;
    (split(worker), split(worker + 1))
}

fn spawn_database_writer(
    mut writers: Vec<PhotonDatabaseWriter>,
    receiver: Receiver<DatabaseMessage>
) -> thread::JoinHandle<Result<Vec<(PathBuf, DatabaseInfo)>>> {
    thread::spawn(move || {
        for (boundary, record) in receiver.iter() {
            if let Some(writer) = writers.iter_mut().find(|w| w.info().virtual_boundary == boundary) {
                writer.write(&record)?;
            }
        }
        writers.into_iter()
            .map(|w| {
                let path = w.path().to_path_buf();
                w.close().map(|info| (path, info))
            })
            .collect()
    })
}

/// Run a simulation to completion.
pub fn run_simulation(input: &SimulationInput) -> Result<SimulationOutput> {
    SimulationOrchestrator::new(input).run()
}

/// Replay a recorded database against perturbed optical properties.
/// `tissue` is the tissue the database was recorded in and `photon_count`
/// the number of photons that run launched.
pub fn run_perturbation<P: AsRef<Path>>(
    database: P,
    tissue: &TissueModel,
    perturbations: &[Perturbation],
    detectors: &[DetectorInput],
    photon_count: u64
) -> Result<Vec<PerturbationResult>> {
    let reader = PhotonDatabaseReader::open(database)?;
    PerturbationPostProcessor::new(tissue).run(reader, perturbations, detectors, photon_count)
}
