use crate::core::assay::DoubleBeadAssay;
use crate::core::io::sequence::load_sequence;
use crate::core::models::pedestal::Pedestal;
use crate::core::models::probe::ProbeParticle;
use crate::core::models::sequence::StimulusSequence;
use crate::core::models::trap::OpticalTrap;
use crate::engine::config::{ExperimentConfig, ProtocolConfig, StimulusSource};
use crate::engine::error::EngineError;
use crate::engine::integrator::LangevinIntegrator;
use crate::engine::pfm::PhotonicForceMicroscope;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::trajectory::Trajectory;
use nalgebra::{Point3, Unit};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub trajectory: Trajectory,
    /// Seed the run was started from; replaying it reproduces the trajectory.
    pub seed: u64,
}

/// Assembles the driver for `config` in its initial state.
pub fn build_microscope(config: &ExperimentConfig) -> PhotonicForceMicroscope {
    let env = config.environment;
    let sim = &config.simulation;

    let mut probe = ProbeParticle::new(
        config.probe.radius,
        config.probe.charge,
        config.probe.position,
        &env,
    );
    if let Some((theta, phi)) = config.probe.anchor_angles {
        probe = probe.with_anchor_angles(theta, phi);
    }

    let mut pedestal = Pedestal::new(
        config.pedestal.radius,
        config.pedestal.jitter,
        config.pedestal.center,
    );
    if let Some(direction) = config.pedestal.anchor_direction {
        pedestal = pedestal.with_anchor_direction(Unit::new_normalize(direction));
    }

    let assay = DoubleBeadAssay::new(
        pedestal,
        config.tether.clone(),
        env,
        sim.force_step,
        sim.angle_step,
    );
    let holding_trap = OpticalTrap::new(config.holding_trap.stiffness, config.holding_trap.center);
    let pulling_trap = match &config.pulling_trap {
        Some(trap) => OpticalTrap::new(trap.stiffness, trap.center),
        None => OpticalTrap::disabled(config.holding_trap.center),
    };

    PhotonicForceMicroscope::new(
        probe,
        assay,
        holding_trap,
        pulling_trap,
        LangevinIntegrator::new(sim.max_rejections),
    )
    .with_substep_rule(sim.substep_rule)
    .with_progress_interval(sim.progress_interval)
}

fn resolve_sequence(source: &StimulusSource) -> Result<StimulusSequence, EngineError> {
    match source {
        StimulusSource::File {
            path,
            period,
            policy,
        } => Ok(load_sequence(path, *period, *policy)?),
        StimulusSource::Inline(sequence) => Ok(sequence.clone()),
    }
}

#[instrument(skip_all, name = "simulation_workflow")]
pub fn run(
    config: &ExperimentConfig,
    reporter: &ProgressReporter,
) -> Result<SimulationResult, EngineError> {
    reporter.report(Progress::PhaseStart { name: "Setup" });
    let sim = &config.simulation;
    let seed = sim.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut microscope = build_microscope(config);

    let sequence = match &config.protocol {
        ProtocolConfig::StimulusSequence { source, .. } => Some(resolve_sequence(source)?),
        _ => None,
    };
    reporter.report(Progress::PhaseFinish);

    info!(
        protocol = config.protocol.name(),
        tether = config.tether.name(),
        steps = sim.steps,
        dt = sim.dt,
        seed,
        "Starting PFM simulation."
    );

    reporter.report(Progress::PhaseStart { name: "Simulation" });
    let trajectory = match (&config.protocol, sequence) {
        (ProtocolConfig::ForceRamp { bounds, rate }, _) => microscope
            .make_time_series_of_probe_motion_with_force_ramp(
                sim.steps, sim.dt, *bounds, *rate, &mut rng, reporter,
            )?,
        (
            ProtocolConfig::StimulusSequence {
                bounds,
                low_pass_rate,
                ..
            },
            Some(sequence),
        ) => microscope.make_time_series_of_probe_motion_with_stimulus_sequence(
            sim.steps,
            sim.dt,
            *bounds,
            sequence,
            *low_pass_rate,
            &mut rng,
            reporter,
        )?,
        _ => microscope.make_time_series_of_probe_motion(sim.steps, sim.dt, &mut rng, reporter)?,
    };
    reporter.report(Progress::PhaseFinish);

    info!(rows = trajectory.len(), "Simulation finished.");
    Ok(SimulationResult { trajectory, seed })
}
