use smallvec::smallvec;

use turbid::core::database::{sidecar_path, PhotonDatabaseReader, PhotonDatabaseWriter};
use turbid::core::detector::{BinRange, DetectorInput};
use turbid::core::geometry::{Point3f, Vector3f};
use turbid::core::optical_properties::OpticalProperties;
use turbid::core::options::{SimulationInput, SimulationOptions};
use turbid::core::photon::{PhotonExitRecord, PhotonHistory};
use turbid::core::simulation::run_simulation;
use turbid::core::tissue::TissueModel;
use turbid::core::virtual_boundary::{VirtualBoundaryInput, VirtualBoundaryType};
use turbid::sources::SourceInput;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn records() -> Vec<PhotonExitRecord> {
    vec![
        PhotonExitRecord {
            position: Point3f::new(1.5, -0.25, 0.0),
            direction: Vector3f::new(0.6, 0.0, -0.8),
            weight: 0.75,
            total_time: 0.125,
            history: Some(PhotonHistory {
                path_lengths: smallvec![0.0, 2.5, 0.0],
                collision_counts: smallvec![0, 17, 0]
            })
        },
        PhotonExitRecord {
            position: Point3f::new(-3.0, 2.0, 0.0),
            direction: Vector3f::new(0.0, 0.0, -1.0),
            weight: 0.0625,
            total_time: 1.5,
            history: Some(PhotonHistory {
                path_lengths: smallvec![0.0, 9.75, 0.0],
                collision_counts: smallvec![0, 64, 0]
            })
        },
    ]
}

#[test]
fn two_records_survive_a_round_trip() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("DiffuseReflectanceDatabase");
    let mut writer = PhotonDatabaseWriter::create(&path, VirtualBoundaryType::DiffuseReflectance, 3, true).unwrap();
    for r in &records() {
        writer.write(r).unwrap();
    }
    let info = writer.close().unwrap();
    assert_eq!(info.record_count, 2);
    assert!(sidecar_path(&path).exists());

    let reader = PhotonDatabaseReader::open(&path).unwrap();
    assert_eq!(reader.info(), &info);
    let read: Vec<PhotonExitRecord> = reader.collect::<Result<_, _>>().unwrap();
    assert_eq!(read, records());
}

#[test]
fn recorded_launch_states_drive_a_simulation() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("launch");
    let mut writer = PhotonDatabaseWriter::create(&path, VirtualBoundaryType::DiffuseReflectance, 3, false).unwrap();
    for x in &[0.0, 1.0, 2.0] {
        writer.write(&PhotonExitRecord {
            position: Point3f::new(*x, 0.0, 0.0),
            direction: Vector3f::new(0.0, 0.0, 1.0),
            weight: 0.5,
            total_time: 0.0,
            history: None
        }).unwrap();
    }
    writer.close().unwrap();

    let tissue = TissueModel::multi_layer(1.0, &[(OpticalProperties::new(0.1, 10.0, 0.8, 1.4), 2.0)], 1.0).unwrap();
    let options = SimulationOptions { photon_count: 30, quiet: true, ..SimulationOptions::default() };
    let boundaries = vec![VirtualBoundaryInput::new(VirtualBoundaryType::SpecularReflectance, vec![DetectorInput::RSpecular])];
    let output = run_simulation(&SimulationInput::new(options, tissue, SourceInput::FromFile { path }, boundaries)).unwrap();

    assert_eq!(output.stats.counter("Photons/Launched"), 30);
    // Every replayed photon enters at normal incidence with unit weight.
    let rsp = (0.4f64 / 2.4).powi(2);
    assert!((output.result("RSpecular").unwrap().total() - rsp).abs() < 1e-9);
}

#[test]
fn replayed_launches_are_reproducible_across_workers() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("launch");
    let mut writer = PhotonDatabaseWriter::create(&path, VirtualBoundaryType::DiffuseReflectance, 3, false).unwrap();
    for i in 0..8 {
        writer.write(&PhotonExitRecord {
            position: Point3f::new(0.5 * i as f64, 0.0, 0.0),
            direction: Vector3f::new(0.1 * i as f64, 0.0, 1.0),
            weight: 1.0,
            total_time: 0.0,
            history: None
        }).unwrap();
    }
    writer.close().unwrap();

    let tissue = TissueModel::multi_layer(1.0, &[(OpticalProperties::new(0.1, 10.0, 0.8, 1.4), 2.0)], 1.0).unwrap();
    let run = || {
        let options = SimulationOptions { seed: 9, photon_count: 400, worker_count: 4, quiet: true, ..SimulationOptions::default() };
        let boundaries = vec![VirtualBoundaryInput::new(VirtualBoundaryType::DiffuseReflectance, vec![
            DetectorInput::RDiffuse,
            DetectorInput::ROfRho { rho: BinRange::new(0.0, 6.0, 24) },
        ])];
        let source = SourceInput::FromFile { path: path.clone() };
        run_simulation(&SimulationInput::new(options, tissue.clone(), source, boundaries)).unwrap()
    };
    let first = run();
    for _ in 0..3 {
        assert_eq!(run().results, first.results);
    }
}
