use clap::Parser;
use othello_sim::config::Cli;
use othello_sim::io::load_samples;
use othello_sim::metrics;
use othello_sim::simulator::SimulationController;
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "simulation failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let resolved = cli.resolve()?;

    let service_samples: Vec<f64> = load_samples(&resolved.service_path)?;
    let branch_samples: Vec<u32> = load_samples(&resolved.branch_path)?;

    tracing::info!(
        hosts = resolved.sim.hosts,
        depth = resolved.sim.depth,
        runs = resolved.sim.runs,
        "starting simulation"
    );

    let results = SimulationController::run_all(&resolved.sim, &service_samples, &branch_samples);

    for r in &results {
        tracing::info!(run = r.run_index, completion_ns = r.completion_time.as_nanos(), "run complete");
    }

    metrics::write_results(&resolved.out_dir, &results)?;
    tracing::info!(out_dir = %resolved.out_dir.display(), "wrote results");
    Ok(())
}
