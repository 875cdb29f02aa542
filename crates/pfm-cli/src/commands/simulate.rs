use crate::cli::SimulateArgs;
use crate::config::{AppConfig, build_config};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use pfmsim::engine::progress::ProgressReporter;
use pfmsim::workflows;
use tracing::info;

pub fn run(args: SimulateArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let AppConfig {
        output_path,
        show_progress,
        core_config,
    } = build_config(&args)?;

    let progress_handler = if show_progress {
        CliProgressHandler::new()
    } else {
        CliProgressHandler::hidden()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Simulating {} steps of {:e} s ({} protocol, {} tether)...",
        core_config.simulation.steps,
        core_config.simulation.dt,
        core_config.protocol.name(),
        core_config.tether.name()
    );
    let result = workflows::simulate::run(&core_config, &reporter)?;

    info!("Writing {} rows to {:?}", result.trajectory.len(), &output_path);
    result.trajectory.write_csv_to_path(&output_path)?;

    println!(
        "✓ Trajectory ({} rows, seed {}) written to: {}",
        result.trajectory.len(),
        result.seed,
        output_path.display()
    );
    Ok(())
}
