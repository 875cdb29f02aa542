use crate::cli::SimulateArgs;
use crate::error::{CliError, Result};
use nalgebra::{Point3, Vector3};
use pfmsim::core::environment::Environment;
use pfmsim::core::io::sequence::SamplePolicy;
use pfmsim::core::models::trap::StiffnessBounds;
use pfmsim::core::tether::folding::{FoldingParams, FoldingSwitch};
use pfmsim::core::tether::{
    DEFAULT_STICK_STIFFNESS, DEFAULT_UNFOLDER_STEP, DEFAULT_UNFOLDER_STIFFNESS,
    DEFAULT_UNFOLDING_FORCE, TetherModel, TwoStateParams,
};
use pfmsim::engine::config::{
    self as core_config, ExperimentConfigBuilder, SimulationConfigBuilder, SubstepRule,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Values used when neither the experiment file nor the command line sets them.
pub struct DefaultsConfig {
    pub dt: f64,
    pub steps: u64,
    pub force_step: f64,
    pub angle_step: f64,
    pub jitter: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            dt: 10e-6,
            steps: 4_000_000,
            force_step: core_config::DEFAULT_FORCE_STEP,
            angle_step: core_config::DEFAULT_ANGLE_STEP,
            jitter: 0.0,
        }
    }
}

#[derive(Debug)]
pub struct AppConfig {
    pub output_path: PathBuf,
    pub show_progress: bool,
    pub core_config: core_config::ExperimentConfig,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialEnvironment {
    boltzmann: Option<f64>,
    temperature: Option<f64>,
    viscosity: Option<f64>,
}

impl PartialEnvironment {
    fn resolve(&self) -> Environment {
        let defaults = Environment::default();
        Environment::new(
            self.boltzmann.unwrap_or(defaults.boltzmann),
            self.temperature.unwrap_or(defaults.temperature),
            self.viscosity.unwrap_or(defaults.viscosity),
        )
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialProbe {
    radius: f64,
    #[serde(default)]
    charge: f64,
    position: [f64; 3],
    anchor_angles: Option<[f64; 2]>,
}

impl From<PartialProbe> for core_config::ProbeParams {
    fn from(p: PartialProbe) -> Self {
        Self {
            radius: p.radius,
            charge: p.charge,
            position: Point3::from(p.position),
            anchor_angles: p.anchor_angles.map(|[theta, phi]| (theta, phi)),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialPedestal {
    radius: f64,
    jitter: Option<f64>,
    #[serde(default)]
    center: [f64; 3],
    anchor_direction: Option<[f64; 3]>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialTrap {
    stiffness: [f64; 3],
    center: [f64; 3],
}

impl From<PartialTrap> for core_config::TrapParams {
    fn from(p: PartialTrap) -> Self {
        Self {
            stiffness: Vector3::from(p.stiffness),
            center: Point3::from(p.center),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case",
    deny_unknown_fields
)]
enum PartialTether {
    FreeString {
        length: f64,
    },
    Stick {
        length: f64,
        stiffness: Option<f64>,
    },
    WormLikeChain {
        contour_length: f64,
        persistence_length: f64,
    },
    FixedStepUnfolder {
        first_minimum: f64,
        step: Option<f64>,
        stiffness: Option<f64>,
        unfolding_force: Option<f64>,
    },
    TwoState {
        first_minimum: f64,
        first_stiffness: f64,
        second_minimum: f64,
        second_stiffness: f64,
        breakpoint: f64,
    },
    FoldingTwoState {
        folded_length: f64,
        unfolded_length: f64,
        persistence_length: f64,
        folded_minimum: f64,
        unfolded_minimum: f64,
        folded_stiffness: f64,
        unfolded_stiffness: f64,
        breakpoint: f64,
        internal_drag: Option<f64>,
    },
    Dimer {
        first: Box<PartialTether>,
        second: Box<PartialTether>,
    },
}

impl PartialTether {
    fn into_model(self, env: &Environment) -> TetherModel {
        match self {
            Self::FreeString { length } => TetherModel::FreeString { length },
            Self::Stick { length, stiffness } => TetherModel::Stick {
                length,
                stiffness: stiffness.unwrap_or(DEFAULT_STICK_STIFFNESS),
            },
            Self::WormLikeChain {
                contour_length,
                persistence_length,
            } => TetherModel::WormLikeChain {
                contour_length,
                persistence_length,
            },
            Self::FixedStepUnfolder {
                first_minimum,
                step,
                stiffness,
                unfolding_force,
            } => TetherModel::FixedStepUnfolder {
                first_minimum,
                step: step.unwrap_or(DEFAULT_UNFOLDER_STEP),
                stiffness: stiffness.unwrap_or(DEFAULT_UNFOLDER_STIFFNESS),
                unfolding_force: unfolding_force.unwrap_or(DEFAULT_UNFOLDING_FORCE),
            },
            Self::TwoState {
                first_minimum,
                first_stiffness,
                second_minimum,
                second_stiffness,
                breakpoint,
            } => TetherModel::TwoState(TwoStateParams {
                first_minimum,
                first_stiffness,
                second_minimum,
                second_stiffness,
                breakpoint,
            }),
            Self::FoldingTwoState {
                folded_length,
                unfolded_length,
                persistence_length,
                folded_minimum,
                unfolded_minimum,
                folded_stiffness,
                unfolded_stiffness,
                breakpoint,
                internal_drag,
            } => TetherModel::FoldingTwoState(FoldingSwitch::new(FoldingParams {
                folded_length,
                unfolded_length,
                persistence_length,
                folded_minimum,
                unfolded_minimum,
                folded_stiffness,
                unfolded_stiffness,
                breakpoint,
                internal_drag: internal_drag
                    .unwrap_or_else(|| FoldingParams::default_internal_drag(env)),
            })),
            Self::Dimer { first, second } => {
                TetherModel::dimer(first.into_model(env), second.into_model(env))
            }
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case",
    deny_unknown_fields
)]
enum PartialProtocol {
    #[default]
    Static,
    ForceRamp {
        low: Option<[f64; 3]>,
        high: [f64; 3],
        rate: f64,
    },
    StimulusSequence {
        low: Option<[f64; 3]>,
        high: [f64; 3],
        file: PathBuf,
        period: f64,
        low_pass_rate: Option<f64>,
        #[serde(default)]
        lenient: bool,
    },
}

fn stiffness_bounds(low: Option<[f64; 3]>, high: [f64; 3]) -> StiffnessBounds {
    StiffnessBounds::new(
        low.map(Vector3::from).unwrap_or_else(Vector3::zeros),
        Vector3::from(high),
    )
}

impl PartialProtocol {
    /// Relative stimulus paths are taken relative to `base_dir`.
    fn into_protocol(self, base_dir: &Path) -> core_config::ProtocolConfig {
        match self {
            Self::Static => core_config::ProtocolConfig::Static,
            Self::ForceRamp { low, high, rate } => core_config::ProtocolConfig::ForceRamp {
                bounds: stiffness_bounds(low, high),
                rate,
            },
            Self::StimulusSequence {
                low,
                high,
                file,
                period,
                low_pass_rate,
                lenient,
            } => core_config::ProtocolConfig::StimulusSequence {
                bounds: stiffness_bounds(low, high),
                source: core_config::StimulusSource::File {
                    path: base_dir.join(file),
                    period,
                    policy: if lenient {
                        SamplePolicy::Lenient
                    } else {
                        SamplePolicy::Strict
                    },
                },
                low_pass_rate,
            },
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialSubstepping {
    force_unit: Option<f64>,
    threshold: Option<f64>,
    substeps_per_unit: Option<usize>,
}

impl PartialSubstepping {
    fn resolve(&self) -> SubstepRule {
        let defaults = SubstepRule::default();
        SubstepRule {
            force_unit: self.force_unit.unwrap_or(defaults.force_unit),
            threshold: self.threshold.unwrap_or(defaults.threshold),
            substeps_per_unit: self.substeps_per_unit.unwrap_or(defaults.substeps_per_unit),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialSimulation {
    dt: Option<f64>,
    steps: Option<u64>,
    force_step: Option<f64>,
    angle_step: Option<f64>,
    max_rejections: Option<usize>,
    seed: Option<u64>,
    progress_interval: Option<u64>,
    substepping: Option<PartialSubstepping>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialExperimentConfig {
    environment: Option<PartialEnvironment>,
    probe: Option<PartialProbe>,
    pedestal: Option<PartialPedestal>,
    tether: Option<PartialTether>,
    holding_trap: Option<PartialTrap>,
    pulling_trap: Option<PartialTrap>,
    protocol: Option<PartialProtocol>,
    simulation: Option<PartialSimulation>,
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid value for {}: '{}' ({} expected)",
            key,
            value,
            std::any::type_name::<T>()
        ))
    })
}

impl PartialExperimentConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading experiment configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(mut self, args: &SimulateArgs) -> Result<core_config::ExperimentConfig> {
        self.apply_set_values(&args.set_values)?;
        let defaults = DefaultsConfig::default();
        let base_dir = args.config.parent().unwrap_or(Path::new("."));

        let environment = self.environment.unwrap_or_default().resolve();

        let probe = self
            .probe
            .ok_or_else(|| CliError::Config("`probe` section is required.".to_string()))?;
        let pedestal = self
            .pedestal
            .ok_or_else(|| CliError::Config("`pedestal` section is required.".to_string()))?;
        let tether = self
            .tether
            .ok_or_else(|| CliError::Config("`tether` section is required.".to_string()))?;
        let holding_trap = self
            .holding_trap
            .ok_or_else(|| CliError::Config("`holding-trap` section is required.".to_string()))?;

        let sim = self.simulation.unwrap_or_default();
        let simulation = SimulationConfigBuilder::new()
            .dt(args.dt.or(sim.dt).unwrap_or(defaults.dt))
            .steps(args.steps.or(sim.steps).unwrap_or(defaults.steps))
            .force_step(sim.force_step.unwrap_or(defaults.force_step))
            .angle_step(sim.angle_step.unwrap_or(defaults.angle_step))
            .max_rejections(args.max_rejections.or(sim.max_rejections))
            .seed(args.seed.or(sim.seed))
            .progress_interval(
                sim.progress_interval
                    .unwrap_or(core_config::DEFAULT_PROGRESS_INTERVAL),
            )
            .substep_rule(sim.substepping.unwrap_or_default().resolve())
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        ExperimentConfigBuilder::new()
            .environment(environment)
            .probe(probe.into())
            .pedestal(core_config::PedestalParams {
                radius: pedestal.radius,
                jitter: pedestal.jitter.unwrap_or(defaults.jitter),
                center: Point3::from(pedestal.center),
                anchor_direction: pedestal.anchor_direction.map(Vector3::from),
            })
            .tether(tether.into_model(&environment))
            .holding_trap(holding_trap.into())
            .pulling_trap(self.pulling_trap.map(Into::into))
            .protocol(self.protocol.unwrap_or_default().into_protocol(base_dir))
            .simulation(simulation)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "environment.temperature" => {
                    self.environment
                        .get_or_insert_with(Default::default)
                        .temperature = Some(parse_value(key, value_str)?);
                }
                "environment.viscosity" => {
                    self.environment
                        .get_or_insert_with(Default::default)
                        .viscosity = Some(parse_value(key, value_str)?);
                }
                "pedestal.jitter" => {
                    self.pedestal
                        .as_mut()
                        .ok_or_else(|| {
                            CliError::Config(format!("Cannot set {}: no `pedestal` section.", key))
                        })?
                        .jitter = Some(parse_value(key, value_str)?);
                }
                "simulation.dt" => {
                    self.simulation.get_or_insert_with(Default::default).dt =
                        Some(parse_value(key, value_str)?);
                }
                "simulation.steps" => {
                    self.simulation.get_or_insert_with(Default::default).steps =
                        Some(parse_value(key, value_str)?);
                }
                "simulation.force-step" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .force_step = Some(parse_value(key, value_str)?);
                }
                "simulation.angle-step" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .angle_step = Some(parse_value(key, value_str)?);
                }
                "simulation.max-rejections" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .max_rejections = Some(parse_value(key, value_str)?);
                }
                "simulation.seed" => {
                    self.simulation.get_or_insert_with(Default::default).seed =
                        Some(parse_value(key, value_str)?);
                }
                "simulation.progress-interval" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .progress_interval = Some(parse_value(key, value_str)?);
                }
                "protocol.rate" => match self.protocol.as_mut() {
                    Some(PartialProtocol::ForceRamp { rate, .. }) => {
                        *rate = parse_value(key, value_str)?;
                    }
                    _ => {
                        return Err(CliError::Config(format!(
                            "{} applies only to a force-ramp protocol.",
                            key
                        )));
                    }
                },
                "protocol.period" => match self.protocol.as_mut() {
                    Some(PartialProtocol::StimulusSequence { period, .. }) => {
                        *period = parse_value(key, value_str)?;
                    }
                    _ => {
                        return Err(CliError::Config(format!(
                            "{} applies only to a stimulus-sequence protocol.",
                            key
                        )));
                    }
                },
                "protocol.file" => match self.protocol.as_mut() {
                    Some(PartialProtocol::StimulusSequence { file, .. }) => {
                        *file = PathBuf::from(value_str);
                    }
                    _ => {
                        return Err(CliError::Config(format!(
                            "{} applies only to a stimulus-sequence protocol.",
                            key
                        )));
                    }
                },
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

pub fn build_config(args: &SimulateArgs) -> Result<AppConfig> {
    let core_config = PartialExperimentConfig::from_file(&args.config)?.merge_with_cli(args)?;
    Ok(AppConfig {
        output_path: args.output.clone(),
        show_progress: !args.no_progress,
        core_config,
    })
}
