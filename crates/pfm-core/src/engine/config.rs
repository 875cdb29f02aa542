use crate::core::environment::Environment;
use crate::core::io::sequence::SamplePolicy;
use crate::core::models::sequence::StimulusSequence;
use crate::core::models::trap::StiffnessBounds;
use crate::core::tether::TetherModel;
use nalgebra::{Point3, Vector3};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_FORCE_STEP: f64 = 1e-9;
pub const DEFAULT_ANGLE_STEP: f64 = 2e-3;
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

fn require_positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            value,
            reason: "must be positive and finite",
        })
    }
}

/// Adaptive sub-stepping rule for stiff force regimes.
///
/// When `|F_x| / force_unit` exceeds `threshold`, a step is split into
/// `ceil(|F_x| / force_unit) * substeps_per_unit` equal sub-steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubstepRule {
    pub force_unit: f64,
    pub threshold: f64,
    pub substeps_per_unit: usize,
}

impl Default for SubstepRule {
    fn default() -> Self {
        Self {
            force_unit: 1e-12,
            threshold: 10.0,
            substeps_per_unit: 10,
        }
    }
}

impl SubstepRule {
    /// Number of sub-steps a step should be split into given the x component of the total force.
    pub fn substeps(&self, force_x: f64) -> usize {
        let units = force_x.abs() / self.force_unit;
        if units > self.threshold {
            (units.ceil() as usize).saturating_mul(self.substeps_per_unit).max(1)
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub dt: f64,
    pub steps: u64,
    pub force_step: f64,
    pub angle_step: f64,
    pub max_rejections: Option<usize>,
    pub substep_rule: SubstepRule,
    pub seed: Option<u64>,
    pub progress_interval: u64,
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    dt: Option<f64>,
    steps: Option<u64>,
    force_step: Option<f64>,
    angle_step: Option<f64>,
    max_rejections: Option<usize>,
    substep_rule: Option<SubstepRule>,
    seed: Option<u64>,
    progress_interval: Option<u64>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }
    pub fn steps(mut self, steps: u64) -> Self {
        self.steps = Some(steps);
        self
    }
    pub fn force_step(mut self, dx: f64) -> Self {
        self.force_step = Some(dx);
        self
    }
    pub fn angle_step(mut self, dtheta: f64) -> Self {
        self.angle_step = Some(dtheta);
        self
    }
    pub fn max_rejections(mut self, max: Option<usize>) -> Self {
        self.max_rejections = max;
        self
    }
    pub fn substep_rule(mut self, rule: SubstepRule) -> Self {
        self.substep_rule = Some(rule);
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
    pub fn progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let dt = require_positive("dt", self.dt.ok_or(ConfigError::MissingParameter("dt"))?)?;
        let steps = self.steps.ok_or(ConfigError::MissingParameter("steps"))?;
        let force_step = require_positive(
            "force_step",
            self.force_step.unwrap_or(DEFAULT_FORCE_STEP),
        )?;
        let angle_step = require_positive(
            "angle_step",
            self.angle_step.unwrap_or(DEFAULT_ANGLE_STEP),
        )?;

        let substep_rule = self.substep_rule.unwrap_or_default();
        require_positive("substep_rule.force_unit", substep_rule.force_unit)?;
        if substep_rule.substeps_per_unit == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "substep_rule.substeps_per_unit",
                value: 0.0,
                reason: "must be at least 1",
            });
        }

        let progress_interval = self.progress_interval.unwrap_or(DEFAULT_PROGRESS_INTERVAL);
        if progress_interval == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "progress_interval",
                value: 0.0,
                reason: "must be at least 1",
            });
        }

        Ok(SimulationConfig {
            dt,
            steps,
            force_step,
            angle_step,
            max_rejections: self.max_rejections,
            substep_rule,
            seed: self.seed,
            progress_interval,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeParams {
    pub radius: f64,
    pub charge: f64,
    pub position: Point3<f64>,
    /// Body-frame `(theta, phi)` of the tether attachment; `None` keeps the default.
    pub anchor_angles: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PedestalParams {
    pub radius: f64,
    pub jitter: f64,
    pub center: Point3<f64>,
    /// Direction from the pedestal center to its tether anchor; `None` means `+x`.
    pub anchor_direction: Option<Vector3<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrapParams {
    pub stiffness: Vector3<f64>,
    pub center: Point3<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StimulusSource {
    File {
        path: PathBuf,
        period: f64,
        policy: SamplePolicy,
    },
    Inline(StimulusSequence),
}

/// How the pulling trap's stiffness evolves during a run.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ProtocolConfig {
    #[default]
    Static,
    ForceRamp {
        bounds: StiffnessBounds,
        rate: f64,
    },
    StimulusSequence {
        bounds: StiffnessBounds,
        source: StimulusSource,
        low_pass_rate: Option<f64>,
    },
}

impl ProtocolConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::ForceRamp { .. } => "force-ramp",
            Self::StimulusSequence { .. } => "stimulus-sequence",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    pub environment: Environment,
    pub probe: ProbeParams,
    pub pedestal: PedestalParams,
    pub tether: TetherModel,
    pub holding_trap: TrapParams,
    /// Required by driven protocols; under [`ProtocolConfig::Static`] it acts as a second fixed trap.
    pub pulling_trap: Option<TrapParams>,
    pub protocol: ProtocolConfig,
    pub simulation: SimulationConfig,
}

#[derive(Default)]
pub struct ExperimentConfigBuilder {
    environment: Option<Environment>,
    probe: Option<ProbeParams>,
    pedestal: Option<PedestalParams>,
    tether: Option<TetherModel>,
    holding_trap: Option<TrapParams>,
    pulling_trap: Option<TrapParams>,
    protocol: Option<ProtocolConfig>,
    simulation: Option<SimulationConfig>,
}

impl ExperimentConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }
    pub fn probe(mut self, probe: ProbeParams) -> Self {
        self.probe = Some(probe);
        self
    }
    pub fn pedestal(mut self, pedestal: PedestalParams) -> Self {
        self.pedestal = Some(pedestal);
        self
    }
    pub fn tether(mut self, tether: TetherModel) -> Self {
        self.tether = Some(tether);
        self
    }
    pub fn holding_trap(mut self, trap: TrapParams) -> Self {
        self.holding_trap = Some(trap);
        self
    }
    pub fn pulling_trap(mut self, trap: Option<TrapParams>) -> Self {
        self.pulling_trap = trap;
        self
    }
    pub fn protocol(mut self, protocol: ProtocolConfig) -> Self {
        self.protocol = Some(protocol);
        self
    }
    pub fn simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = Some(simulation);
        self
    }

    pub fn build(self) -> Result<ExperimentConfig, ConfigError> {
        let probe = self.probe.ok_or(ConfigError::MissingParameter("probe"))?;
        require_positive("probe.radius", probe.radius)?;
        let pedestal = self
            .pedestal
            .ok_or(ConfigError::MissingParameter("pedestal"))?;
        require_positive("pedestal.radius", pedestal.radius)?;
        if !(pedestal.jitter.is_finite() && pedestal.jitter >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "pedestal.jitter",
                value: pedestal.jitter,
                reason: "must be non-negative and finite",
            });
        }
        if let Some(direction) = pedestal.anchor_direction {
            require_positive("pedestal.anchor_direction norm", direction.norm())?;
        }
        let environment = self.environment.unwrap_or_default();
        require_positive("environment.temperature", environment.temperature)?;
        require_positive("environment.viscosity", environment.viscosity)?;

        let tether = self.tether.ok_or(ConfigError::MissingParameter("tether"))?;
        let holding_trap = self
            .holding_trap
            .ok_or(ConfigError::MissingParameter("holding_trap"))?;
        let protocol = self.protocol.unwrap_or_default();
        if protocol != ProtocolConfig::Static && self.pulling_trap.is_none() {
            return Err(ConfigError::MissingParameter("pulling_trap"));
        }

        Ok(ExperimentConfig {
            environment,
            probe,
            pedestal,
            tether,
            holding_trap,
            pulling_trap: self.pulling_trap,
            protocol,
            simulation: self
                .simulation
                .ok_or(ConfigError::MissingParameter("simulation"))?,
        })
    }
}
