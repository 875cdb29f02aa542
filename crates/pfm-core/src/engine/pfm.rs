use super::config::{DEFAULT_PROGRESS_INTERVAL, SubstepRule};
use super::error::EngineError;
use super::integrator::{IntegratorError, LangevinIntegrator};
use super::progress::{Progress, ProgressReporter};
use super::trajectory::{Trajectory, TrajectoryLayout};
use crate::core::assay::DoubleBeadAssay;
use crate::core::models::probe::ProbeParticle;
use crate::core::models::sequence::StimulusSequence;
use crate::core::models::trap::{OpticalTrap, StiffnessBounds};
use nalgebra::{Point3, Vector2, Vector3};
use rand::Rng;
use tracing::{debug, info};

/// Bookkeeping for one driver step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub substeps: usize,
    pub rejections: usize,
}

/// Simulation driver for a probe bead held by two optical traps and tethered to a pedestal.
///
/// The holding trap keeps a fixed stiffness. Ramp and stimulus protocols drive the pulling
/// trap, whose x stiffness is recorded in driven trajectories. Use [`OpticalTrap::disabled`]
/// for a pulling trap that is switched off.
#[derive(Debug, Clone)]
pub struct PhotonicForceMicroscope {
    probe: ProbeParticle,
    assay: DoubleBeadAssay,
    holding_trap: OpticalTrap,
    pulling_trap: OpticalTrap,
    integrator: LangevinIntegrator,
    substep_rule: SubstepRule,
    progress_interval: u64,
}

impl PhotonicForceMicroscope {
    pub fn new(
        probe: ProbeParticle,
        assay: DoubleBeadAssay,
        holding_trap: OpticalTrap,
        pulling_trap: OpticalTrap,
        integrator: LangevinIntegrator,
    ) -> Self {
        Self {
            probe,
            assay,
            holding_trap,
            pulling_trap,
            integrator,
            substep_rule: SubstepRule::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_substep_rule(mut self, rule: SubstepRule) -> Self {
        self.substep_rule = rule;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    pub fn probe(&self) -> &ProbeParticle {
        &self.probe
    }

    pub fn assay(&self) -> &DoubleBeadAssay {
        &self.assay
    }

    pub fn holding_trap(&self) -> &OpticalTrap {
        &self.holding_trap
    }

    pub fn pulling_trap(&self) -> &OpticalTrap {
        &self.pulling_trap
    }

    pub fn pulling_trap_mut(&mut self) -> &mut OpticalTrap {
        &mut self.pulling_trap
    }

    /// Assay force plus both trap forces on the probe center.
    pub fn total_linear_forces(&self, pedestal_center: &Point3<f64>) -> Vector3<f64> {
        let dx = self.assay.force_step();
        let position = self.probe.position();
        self.assay.linear_forces(&self.probe, pedestal_center)
            + self.holding_trap.force(position, dx)
            + self.pulling_trap.force(position, dx)
    }

    /// Torques come from the assay alone; traps do not couple to rotation.
    pub fn total_rotational_torques(&self, pedestal_center: &Point3<f64>) -> Vector2<f64> {
        self.assay.rotational_torques(&self.probe, pedestal_center)
    }

    /// Advances the whole system by `dt`, subdividing the step when the force is stiff.
    ///
    /// With `drive_traps` set, the pulling trap's protocol is propagated alongside the probe.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        drive_traps: bool,
        rng: &mut R,
    ) -> Result<StepReport, IntegratorError> {
        let mut pedestal_center = self.assay.pedestal().sample_center(rng);
        let mut forces = self.total_linear_forces(&pedestal_center);

        let substeps = self.substep_rule.substeps(forces.x);
        if substeps > 1 {
            debug!(force_x = forces.x, substeps, "Subdividing step under stiff force.");
        }
        let h = dt / substeps as f64;

        let mut report = StepReport {
            substeps,
            rejections: 0,
        };
        for i in 0..substeps {
            if i > 0 {
                pedestal_center = self.assay.pedestal().sample_center(rng);
                forces = self.total_linear_forces(&pedestal_center);
            }
            report.rejections += self.substep(h, &forces, &pedestal_center, drive_traps, rng)?;
        }
        Ok(report)
    }

    fn substep<R: Rng + ?Sized>(
        &mut self,
        h: f64,
        forces: &Vector3<f64>,
        pedestal_center: &Point3<f64>,
        drive_traps: bool,
        rng: &mut R,
    ) -> Result<usize, IntegratorError> {
        let assay = &self.assay;
        let energy = |probe: &ProbeParticle| assay.energy(probe, pedestal_center);

        let mut rejections =
            self.integrator
                .propagate_position(&mut self.probe, h, forces, energy, rng)?;
        let torques = self.total_rotational_torques(pedestal_center);
        rejections += self
            .integrator
            .propagate_rotation(&mut self.probe, h, &torques, energy, rng)?;

        if self.assay.tether().has_internal_state() {
            let tension = self.assay.tether_tension(&self.probe, pedestal_center);
            self.assay.advance_tether(tension, h, rng);
        }
        if drive_traps {
            self.pulling_trap.propagate(h);
        }
        Ok(rejections)
    }

    fn run<R: Rng + ?Sized>(
        &mut self,
        steps: u64,
        dt: f64,
        layout: TrajectoryLayout,
        rng: &mut R,
        reporter: &ProgressReporter,
    ) -> Result<Trajectory, EngineError> {
        let drive_traps = layout == TrajectoryLayout::Driven;
        let mut trajectory =
            Trajectory::with_capacity(layout, usize::try_from(steps).unwrap_or(0));
        let mut total = StepReport::default();

        reporter.report(Progress::TaskStart { total_steps: steps });
        for i in 0..steps {
            trajectory.record(&self.probe, self.pulling_trap.stiffness().x);
            let report = self.step(dt, drive_traps, rng)?;
            total.substeps += report.substeps;
            total.rejections += report.rejections;
            if (i + 1) % self.progress_interval == 0 {
                reporter.report(Progress::TaskAdvance(self.progress_interval));
            }
        }
        let remainder = steps % self.progress_interval;
        if remainder > 0 {
            reporter.report(Progress::TaskAdvance(remainder));
        }
        reporter.report(Progress::TaskFinish);

        info!(
            steps,
            substeps = total.substeps,
            rejections = total.rejections,
            "Probe trajectory complete."
        );
        Ok(trajectory)
    }

    /// Free motion in fixed traps; records `[x, y, z]` per step.
    pub fn make_time_series_of_probe_motion<R: Rng + ?Sized>(
        &mut self,
        steps: u64,
        dt: f64,
        rng: &mut R,
        reporter: &ProgressReporter,
    ) -> Result<Trajectory, EngineError> {
        self.run(steps, dt, TrajectoryLayout::Position, rng, reporter)
    }

    /// Ramps the pulling trap between `bounds` at `rate` (N/m/s); records
    /// `[x, y, z, theta, phi, trap_kx]` per step.
    pub fn make_time_series_of_probe_motion_with_force_ramp<R: Rng + ?Sized>(
        &mut self,
        steps: u64,
        dt: f64,
        bounds: StiffnessBounds,
        rate: f64,
        rng: &mut R,
        reporter: &ProgressReporter,
    ) -> Result<Trajectory, EngineError> {
        self.pulling_trap.init_ramp(bounds, rate)?;
        self.run(steps, dt, TrajectoryLayout::Driven, rng, reporter)
    }

    /// Switches the pulling trap between the two `bounds` following `sequence`, optionally
    /// smoothed by a low-pass filter; records `[x, y, z, theta, phi, trap_kx]` per step.
    #[allow(clippy::too_many_arguments)]
    pub fn make_time_series_of_probe_motion_with_stimulus_sequence<R: Rng + ?Sized>(
        &mut self,
        steps: u64,
        dt: f64,
        bounds: StiffnessBounds,
        sequence: StimulusSequence,
        low_pass_rate: Option<f64>,
        rng: &mut R,
        reporter: &ProgressReporter,
    ) -> Result<Trajectory, EngineError> {
        self.pulling_trap
            .init_sequence(bounds, low_pass_rate, sequence)?;
        self.run(steps, dt, TrajectoryLayout::Driven, rng, reporter)
    }
}
