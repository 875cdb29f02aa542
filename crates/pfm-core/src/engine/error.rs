use thiserror::Error;

use super::config::ConfigError;
use super::integrator::IntegratorError;
use crate::core::io::sequence::SequenceLoadError;
use crate::core::io::trajectory::TrajectoryWriteError;
use crate::core::models::trap::TrapError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid trap protocol: {source}")]
    Trap {
        #[from]
        source: TrapError,
    },

    #[error("Failed to load stimulus sequence: {source}")]
    SequenceLoad {
        #[from]
        source: SequenceLoadError,
    },

    #[error("Integration failed: {source}")]
    Integrator {
        #[from]
        source: IntegratorError,
    },

    #[error("Failed to write trajectory: {source}")]
    TrajectoryWrite {
        #[from]
        source: TrajectoryWriteError,
    },
}
