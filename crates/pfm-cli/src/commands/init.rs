use crate::cli::InitArgs;
use crate::error::{CliError, Result};
use std::fs;
use tracing::info;

pub const EXPERIMENT_TEMPLATE: &str = include_str!("../../templates/experiment.toml");

pub fn run(args: InitArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        return Err(CliError::Config(format!(
            "'{}' already exists. Use --force to overwrite it.",
            args.output.display()
        )));
    }
    fs::write(&args.output, EXPERIMENT_TEMPLATE)?;
    info!("Wrote experiment template to {:?}", &args.output);
    println!("✓ Example experiment written to: {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::config::build_config;
    use clap::Parser;
    use pfmsim::engine::config::ProtocolConfig;

    #[test]
    fn template_is_a_complete_experiment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiment.toml");
        run(InitArgs {
            output: path.clone(),
            force: false,
        })
        .unwrap();

        let cli = Cli::parse_from([
            "pfmsim",
            "simulate",
            "-c",
            path.to_str().unwrap(),
            "-o",
            "out.csv",
        ]);
        let Commands::Simulate(args) = cli.command else {
            panic!("expected simulate subcommand");
        };
        let config = build_config(&args).unwrap().core_config;
        assert!(matches!(config.protocol, ProtocolConfig::ForceRamp { rate, .. } if rate == 1e-3));
        assert_eq!(config.simulation.steps, 4_000_000);
        assert!(config.pulling_trap.is_some());
    }

    #[test]
    fn existing_file_is_kept_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiment.toml");
        fs::write(&path, "keep me").unwrap();

        let err = run(InitArgs {
            output: path.clone(),
            force: false,
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");

        run(InitArgs {
            output: path.clone(),
            force: true,
        })
        .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), EXPERIMENT_TEMPLATE);
    }
}
