//! End-to-end checks of complete simulation runs.

use nalgebra::{Point3, Vector3};
use pfmsim::core::models::trap::StiffnessBounds;
use pfmsim::core::tether::TetherModel;
use pfmsim::engine::config::{
    ExperimentConfig, ExperimentConfigBuilder, PedestalParams, ProbeParams, ProtocolConfig,
    SimulationConfigBuilder, TrapParams,
};
use pfmsim::engine::progress::ProgressReporter;
use pfmsim::workflows::simulate::{build_microscope, run};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::f64::consts::PI;

const NM: f64 = 1e-9;

fn stick_experiment(
    steps: u64,
    pulling_trap: Option<TrapParams>,
    protocol: ProtocolConfig,
) -> ExperimentConfig {
    ExperimentConfigBuilder::new()
        .probe(ProbeParams {
            radius: 500.0 * NM,
            charge: 1.0,
            position: Point3::new(1550.0 * NM, 0.0, 0.0),
            anchor_angles: Some((PI / 2.0, PI)),
        })
        .pedestal(PedestalParams {
            radius: 1000.0 * NM,
            jitter: 0.0,
            center: Point3::origin(),
            anchor_direction: None,
        })
        .tether(TetherModel::stick(50.0 * NM))
        .holding_trap(TrapParams {
            stiffness: Vector3::new(1e-5, 1e-5, 1e-6),
            center: Point3::new(1500.0 * NM, 0.0, 0.0),
        })
        .pulling_trap(pulling_trap)
        .protocol(protocol)
        .simulation(
            SimulationConfigBuilder::new()
                .dt(1e-7)
                .steps(steps)
                .force_step(1e-10)
                .seed(Some(2024))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

#[test]
fn stick_tethered_probe_never_overlaps_the_pedestal() {
    let config = stick_experiment(1000, None, ProtocolConfig::Static);
    let result = run(&config, &ProgressReporter::new()).unwrap();

    assert_eq!(result.trajectory.len(), 1000);
    for row in result.trajectory.rows() {
        let distance = Vector3::new(row[0], row[1], row[2]).norm();
        assert!(distance > 1500.0 * NM, "probe overlapped pedestal at {distance}");
    }
}

#[test]
fn force_ramp_turns_around_without_exceeding_high_bound() {
    let high = 3e-4;
    let dt = 1e-7;
    let protocol = ProtocolConfig::ForceRamp {
        bounds: StiffnessBounds::from_zero(Vector3::new(high, high, high / 10.0)),
        rate: high / (100.0 * dt),
    };
    let pulling_trap = TrapParams {
        stiffness: Vector3::zeros(),
        center: Point3::new(1600.0 * NM, 0.0, 0.0),
    };
    let config = stick_experiment(250, Some(pulling_trap), protocol);
    let result = run(&config, &ProgressReporter::new()).unwrap();

    let kx = result.trajectory.column("trap_kx").unwrap();
    assert_eq!(kx.len(), 250);
    assert!(kx.iter().all(|k| *k <= high * (1.0 + 1e-9)));
    let peak = kx
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();
    assert!(peak > 0 && peak < kx.len() - 1);
    assert!(kx[kx.len() - 1] < kx[peak]);
}

#[test]
fn free_diffusion_variance_matches_einstein_relation() {
    let dt = 1e-4;
    let steps = 10;
    let runs = 400;
    let config = ExperimentConfigBuilder::new()
        .probe(ProbeParams {
            radius: 500.0 * NM,
            charge: 0.0,
            position: Point3::new(10_000.0 * NM, 0.0, 0.0),
            anchor_angles: None,
        })
        .pedestal(PedestalParams {
            radius: 1000.0 * NM,
            jitter: 0.0,
            center: Point3::origin(),
            anchor_direction: None,
        })
        .tether(TetherModel::FreeString { length: 1e-3 })
        .holding_trap(TrapParams {
            stiffness: Vector3::zeros(),
            center: Point3::origin(),
        })
        .simulation(
            SimulationConfigBuilder::new()
                .dt(dt)
                .steps(steps)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let mut rng = StdRng::seed_from_u64(17);
    let mut sum_sq = 0.0;
    let mut samples = 0usize;
    let mut diffusion = 0.0;
    for _ in 0..runs {
        let mut microscope = build_microscope(&config);
        diffusion = microscope.probe().diffusion();
        let start = *microscope.probe().position();
        microscope
            .make_time_series_of_probe_motion(steps, dt, &mut rng, &ProgressReporter::new())
            .unwrap();
        let displacement = *microscope.probe().position() - start;
        sum_sq += displacement.norm_squared();
        samples += 3;
    }

    let variance = sum_sq / samples as f64;
    let expected = 2.0 * diffusion * dt * steps as f64;
    let relative_error = (variance - expected).abs() / expected;
    assert!(
        relative_error < 0.15,
        "variance {variance:e} deviates from 2Dt = {expected:e} by {relative_error:.3}"
    );
}
