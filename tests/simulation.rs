use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use turbid::core::absorption::AbsorptionWeightingType;
use turbid::core::database::PhotonDatabaseReader;
use turbid::core::detector::{AbsorptionEvent, BinRange, DetectorInput, DetectorSet};
use turbid::core::error::{Error, Result};
use turbid::core::geometry::{Point3f, Vector3f};
use turbid::core::mc::Float;
use turbid::core::optical_properties::OpticalProperties;
use turbid::core::options::{SimulationInput, SimulationOptions};
use turbid::core::perturbation::Perturbation;
use turbid::core::photon::Photon;
use turbid::core::rng::Rng;
use turbid::core::simulation::{run_perturbation, run_simulation, SimulationOrchestrator, SimulationOutput};
use turbid::core::stats_accumulator::TransportStats;
use turbid::core::tissue::TissueModel;
use turbid::core::transport::{PhotonTransportEngine, RussianRoulette, TransportEventSink};
use turbid::core::virtual_boundary::{VirtualBoundaryInput, VirtualBoundaryType};
use turbid::sources::SourceInput;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn slab() -> TissueModel {
    TissueModel::multi_layer(1.0, &[(OpticalProperties::new(0.1, 10.0, 0.8, 1.4), 1.0)], 1.0).unwrap()
}

fn balance_boundaries() -> Vec<VirtualBoundaryInput> {
    vec![
        VirtualBoundaryInput::new(VirtualBoundaryType::DiffuseReflectance, vec![DetectorInput::RDiffuse]),
        VirtualBoundaryInput::new(VirtualBoundaryType::DiffuseTransmittance, vec![DetectorInput::TDiffuse]),
        VirtualBoundaryInput::new(VirtualBoundaryType::SpecularReflectance, vec![DetectorInput::RSpecular]),
        VirtualBoundaryInput::new(VirtualBoundaryType::GenericVolume, vec![DetectorInput::ATotal]),
    ]
}

fn total(output: &SimulationOutput, name: &str) -> Float {
    output.result(name).map(|r| r.total()).unwrap_or_else(|| panic!("missing result {}", name))
}

fn energy_balance(output: &SimulationOutput) -> Float {
    total(output, "RDiffuse") + total(output, "TDiffuse") + total(output, "RSpecular") + total(output, "ATotal")
}

#[test]
fn energy_is_conserved_in_every_weighting_mode() {
    init_logging();
    for weighting in &[AbsorptionWeightingType::Analog, AbsorptionWeightingType::Discrete, AbsorptionWeightingType::Continuous] {
        let options = SimulationOptions {
            seed: 7,
            photon_count: 500,
            worker_count: 2,
            absorption_weighting: *weighting,
            russian_roulette: RussianRoulette::disabled(),
            quiet: true,
            ..SimulationOptions::default()
        };
        let input = SimulationInput::new(options, slab(), SourceInput::pencil_beam(), balance_boundaries());
        let output = run_simulation(&input).unwrap();
        let balance = energy_balance(&output);
        assert!((balance - 1.0).abs() < 1e-9, "{} weighting balance {}", weighting, balance);
        assert_eq!(output.stats.counter("Photons/Launched"), 500);
    }
}

#[test]
fn russian_roulette_conserves_energy_on_average() {
    init_logging();
    let options = SimulationOptions {
        seed: 3,
        photon_count: 2000,
        worker_count: 2,
        russian_roulette: RussianRoulette::new(0.5, 2.0),
        quiet: true,
        ..SimulationOptions::default()
    };
    let input = SimulationInput::new(options, slab(), SourceInput::pencil_beam(), balance_boundaries());
    let output = run_simulation(&input).unwrap();
    assert!(output.stats.counter("Photons/Killed by Russian roulette") > 0);
    assert!((energy_balance(&output) - 1.0).abs() < 0.05);
}

#[test]
fn runs_are_reproducible_for_a_seed_and_worker_count() {
    init_logging();
    let run = |seed: u64| {
        let options = SimulationOptions { seed, photon_count: 300, worker_count: 3, quiet: true, ..SimulationOptions::default() };
        let boundaries = vec![VirtualBoundaryInput::new(VirtualBoundaryType::DiffuseReflectance, vec![
            DetectorInput::RDiffuse,
            DetectorInput::ROfRho { rho: BinRange::new(0.0, 5.0, 50) },
        ])];
        run_simulation(&SimulationInput::new(options, slab(), SourceInput::pencil_beam(), boundaries)).unwrap()
    };
    let a = run(11);
    let b = run(11);
    let c = run(12);
    assert_eq!(a.results, b.results);
    assert_ne!(a.result("ROfRho").unwrap().mean, c.result("ROfRho").unwrap().mean);
}

/// Tallies absorption through a detector set and keeps each photon's total.
struct AbsorptionRecorder {
    detectors: DetectorSet,
    current: Float,
    per_photon: Vec<Float>
}

impl TransportEventSink for AbsorptionRecorder {
    fn on_exit(&mut self, _boundary: VirtualBoundaryType, _photon: &Photon) -> Result<()> {
        Ok(())
    }

    fn on_absorption(&mut self, event: &AbsorptionEvent) {
        self.detectors.tally_absorption(event);
        self.current += event.weight;
    }

    fn on_termination(&mut self, _photon: &Photon) {
        self.detectors.end_photon();
        self.per_photon.push(self.current);
        self.current = 0.0;
    }
}

#[test]
fn absorption_standard_error_matches_per_photon_variance() {
    init_logging();
    let tissue = slab();
    let options = SimulationOptions { russian_roulette: RussianRoulette::disabled(), quiet: true, ..SimulationOptions::default() };
    let engine = PhotonTransportEngine::new(&tissue, &options).with_absorption_tracking(true);
    let inputs = vec![VirtualBoundaryInput::new(VirtualBoundaryType::GenericVolume, vec![DetectorInput::ATotal])];
    let mut sink = AbsorptionRecorder { detectors: DetectorSet::new(&inputs), current: 0.0, per_photon: Vec::new() };
    let mut rng = Rng::seeded(21, 0);
    let mut stats = TransportStats::new();
    let photons = 400;
    for _ in 0..photons {
        let photon = Photon::new(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0), 1.0, 1);
        engine.transport(photon, &mut rng, &mut sink, &mut stats).unwrap();
    }
    assert_eq!(sink.per_photon.len(), photons);

    let n = photons as Float;
    let mean = sink.per_photon.iter().sum::<Float>() / n;
    let second = sink.per_photon.iter().map(|x| x * x).sum::<Float>() / n;
    let se = ((second - mean * mean) / n).sqrt();

    let result = &sink.detectors.finalize(photons as u64)[0];
    assert!((result.mean[0] - mean).abs() < 1e-12);
    assert!(se > 0.0);
    assert!((result.standard_error[0] - se).abs() <= 1e-9 * se, "{} vs {}", result.standard_error[0], se);

    let options = SimulationOptions { seed: 4, photon_count: 400, worker_count: 2, quiet: true, ..SimulationOptions::default() };
    let output = run_simulation(&SimulationInput::new(options, slab(), SourceInput::pencil_beam(), balance_boundaries())).unwrap();
    let absorbed = output.result("ATotal").unwrap();
    assert!(absorbed.standard_error[0] > 0.0);
    assert!(absorbed.standard_error[0] < absorbed.mean[0]);
}

#[test]
fn semi_infinite_reflectance_falls_off_with_distance() {
    init_logging();
    let tissue = TissueModel::semi_infinite(1.0, OpticalProperties::new(0.01, 1.0, 0.8, 1.4)).unwrap();
    let options = SimulationOptions { seed: 1, photon_count: 5000, worker_count: 4, quiet: true, ..SimulationOptions::default() };
    let boundaries = vec![
        VirtualBoundaryInput::new(VirtualBoundaryType::DiffuseReflectance, vec![
            DetectorInput::RDiffuse,
            DetectorInput::ROfRho { rho: BinRange::new(0.0, 10.0, 100) },
        ]),
        VirtualBoundaryInput::new(VirtualBoundaryType::SpecularReflectance, vec![DetectorInput::RSpecular]),
    ];
    let output = run_simulation(&SimulationInput::new(options, tissue, SourceInput::pencil_beam(), boundaries)).unwrap();

    let rd = total(&output, "RDiffuse");
    assert!(rd > 0.25 && rd < 0.85, "diffuse reflectance {}", rd);
    let rsp = ((1.4 - 1.0) / (1.4 + 1.0) as Float).powi(2);
    assert!((total(&output, "RSpecular") - rsp).abs() < 1e-9);

    let r_of_rho = output.result("ROfRho").unwrap();
    let groups: Vec<Float> = r_of_rho.mean.chunks(10).map(|c| c.iter().sum::<Float>()).collect();
    assert!(groups[0] > groups[2]);
    assert!(groups[2] > groups[4]);
    assert!(r_of_rho.standard_error.iter().all(|e| e.is_finite() && *e >= 0.0));
}

/// Total diffuse reflectance of an isotropic point source buried at `depth`
/// in a semi-infinite medium, from the dipole diffusion approximation with
/// an extrapolated boundary.
fn dipole_reflectance(ops: &OpticalProperties, n_outside: Float, depth: Float) -> Float {
    let mus_prime = ops.mus * (1.0 - ops.g);
    let mu_t_prime = ops.mua + mus_prime;
    let mu_eff = (3.0 * ops.mua * mu_t_prime).sqrt();
    // Internal reflection parameter for the relative index.
    let n = ops.n / n_outside;
    let ri = -1.440 / (n * n) + 0.710 / n + 0.668 + 0.0636 * n;
    let a = (1.0 + ri) / (1.0 - ri);
    let zb = 2.0 * a / (3.0 * mu_t_prime);
    0.5 * ((-mu_eff * depth).exp() + (-mu_eff * (depth + 2.0 * zb)).exp())
}

#[test]
fn buried_isotropic_point_matches_diffusion_reflectance() {
    init_logging();
    let ops = OpticalProperties::new(0.01, 1.0, 0.8, 1.4);
    let tissue = TissueModel::semi_infinite(1.0, ops).unwrap();
    // One transport mean free path deep.
    let depth = 1.0 / (ops.mua + ops.mus * (1.0 - ops.g));
    let options = SimulationOptions { seed: 0, photon_count: 10_000, worker_count: 4, quiet: true, ..SimulationOptions::default() };
    let boundaries = vec![VirtualBoundaryInput::new(VirtualBoundaryType::DiffuseReflectance, vec![
        DetectorInput::RDiffuse,
        DetectorInput::ROfRho { rho: BinRange::new(0.0, 10.0, 100) },
    ])];
    let source = SourceInput::isotropic_point(Point3f::new(0.0, 0.0, depth));
    let output = run_simulation(&SimulationInput::new(options, tissue, source, boundaries)).unwrap();

    // About 0.41 for these properties. Diffusion is within a few percent of
    // Monte Carlo one transport mean free path deep; the band also covers
    // the statistical error of 10k photons.
    let expected = dipole_reflectance(&ops, 1.0, depth);
    let rd = total(&output, "RDiffuse");
    assert!((rd - expected).abs() < 0.15 * expected, "diffuse reflectance {} vs diffusion {}", rd, expected);
    let se = output.result("RDiffuse").unwrap().standard_error[0];
    assert!(se > 0.0 && se < 0.02);

    let r_of_rho = output.result("ROfRho").unwrap();
    let near: Float = r_of_rho.mean[..20].iter().sum::<Float>() / 20.0;
    let far: Float = r_of_rho.mean[80..].iter().sum::<Float>() / 20.0;
    assert!(near > 2.0 * far, "near {} far {}", near, far);
}

#[test]
fn isotropic_point_reflectance_decreases_with_radius() {
    init_logging();
    let ops = OpticalProperties::new(0.01, 1.0, 0.8, 1.4);
    let tissue = TissueModel::semi_infinite(1.0, ops).unwrap();
    let options = SimulationOptions { seed: 0, photon_count: 10_000, worker_count: 4, quiet: true, ..SimulationOptions::default() };
    let boundaries = vec![
        VirtualBoundaryInput::new(VirtualBoundaryType::DiffuseReflectance, vec![
            DetectorInput::RDiffuse,
            DetectorInput::ROfRho { rho: BinRange::new(0.0, 10.0, 100) },
        ]),
        VirtualBoundaryInput::new(VirtualBoundaryType::SpecularReflectance, vec![DetectorInput::RSpecular]),
    ];
    let source = SourceInput::isotropic_point(Point3f::zero());
    let output = run_simulation(&SimulationInput::new(options, tissue, source, boundaries)).unwrap();

    let r_of_rho = output.result("ROfRho").unwrap();
    let groups: Vec<Float> = r_of_rho.mean.chunks(10).map(|c| c.iter().sum::<Float>()).collect();
    for pair in groups[..5].windows(2) {
        assert!(pair[0] > pair[1], "{:?}", &groups[..5]);
    }

    // About 0.60. Diffusion is least accurate for a source on the surface,
    // so the band is 25%.
    let expected = dipole_reflectance(&ops, 1.0, 0.0);
    let reflectance = total(&output, "RDiffuse") + total(&output, "RSpecular");
    assert!((reflectance - expected).abs() < 0.25 * expected, "reflectance {} vs diffusion {}", reflectance, expected);
}

#[test]
fn perturbation_replay_matches_forward_run() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let rho = BinRange::new(0.0, 5.0, 25);
    let tissue = slab();
    let options = SimulationOptions {
        seed: 5,
        photon_count: 1000,
        worker_count: 1,
        record_perturbation_info: true,
        output_directory: Some(dir.path().to_path_buf()),
        quiet: true,
        ..SimulationOptions::default()
    };
    let boundaries = vec![VirtualBoundaryInput::new(VirtualBoundaryType::DiffuseReflectance, vec![
        DetectorInput::ROfRho { rho },
    ]).with_database()];
    let output = run_simulation(&SimulationInput::new(options, tissue.clone(), SourceInput::pencil_beam(), boundaries)).unwrap();

    let database = output.database(VirtualBoundaryType::DiffuseReflectance).unwrap().to_path_buf();
    let reader = PhotonDatabaseReader::open(&database).unwrap();
    assert_eq!(reader.info().record_count as i64,
        output.stats.counter("Photons/Exited through diffuse reflectance"));
    assert!(reader.info().collision_info);

    let reference = OpticalProperties::new(0.1, 10.0, 0.8, 1.4);
    let perturbations = vec![
        Perturbation::new("identity", vec![(1, reference)]),
        Perturbation::new("absorbing", vec![(1, OpticalProperties::new(0.5, 10.0, 0.8, 1.4))]),
    ];
    let detectors = vec![
        DetectorInput::ROfRho { rho },
        DetectorInput::DmcROfRhoDMua { rho },
    ];
    let replayed = run_perturbation(&database, &tissue, &perturbations, &detectors, output.photon_count).unwrap();
    assert_eq!(replayed.len(), 2);

    let forward = output.result("ROfRho").unwrap();
    let identity = &replayed[0].results[0];
    for (a, b) in forward.mean.iter().zip(identity.mean.iter()) {
        assert!((a - b).abs() <= 1e-12 * a.abs().max(1.0));
    }

    let absorbing = &replayed[1].results[0];
    assert!(absorbing.total() < identity.total());
    assert!(replayed[1].results[1].total() < 0.0);
}

#[test]
fn perturbing_anisotropy_is_rejected() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let options = SimulationOptions {
        photon_count: 50,
        record_perturbation_info: true,
        output_directory: Some(dir.path().to_path_buf()),
        quiet: true,
        ..SimulationOptions::default()
    };
    let boundaries = vec![VirtualBoundaryInput::new(VirtualBoundaryType::DiffuseReflectance, vec![DetectorInput::RDiffuse]).with_database()];
    let output = run_simulation(&SimulationInput::new(options, slab(), SourceInput::pencil_beam(), boundaries)).unwrap();
    let database = output.database(VirtualBoundaryType::DiffuseReflectance).unwrap();
    let perturbation = Perturbation::new("g", vec![(1, OpticalProperties::new(0.1, 10.0, 0.9, 1.4))]);
    match run_perturbation(database, &slab(), &[perturbation], &[DetectorInput::RDiffuse], 50) {
        Err(Error::Perturbation(_)) => {}
        other => panic!("expected a perturbation error, got {:?}", other.map(|r| r.len()))
    }
}

#[test]
fn cancelled_runs_stop() {
    init_logging();
    let options = SimulationOptions { photon_count: 100, quiet: true, ..SimulationOptions::default() };
    let input = SimulationInput::new(options, slab(), SourceInput::pencil_beam(), balance_boundaries());
    let cancel = Arc::new(AtomicBool::new(true));
    match SimulationOrchestrator::new(&input).with_cancel_flag(cancel).run() {
        Err(Error::Cancelled) => {}
        other => panic!("expected cancellation, got {:?}", other.map(|o| o.photon_count))
    }

    let mut late = input.clone();
    late.options.deadline = Some(Instant::now() - Duration::from_millis(1));
    match run_simulation(&late) {
        Err(Error::Cancelled) => {}
        other => panic!("expected cancellation, got {:?}", other.map(|o| o.photon_count))
    }
}
