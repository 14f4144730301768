//! antgrid: ant foraging simulation on a shared grid
//!
//! Usage:
//!   antgrid 40 200 30                 → 40 ants, 200 food, 30 seconds, TUI
//!   antgrid 40 200 30 --headless      → log statistics to stderr instead
//!   antgrid --dump-config             → print the effective config as TOML

use anyhow::Context;
use antgrid::cli::Cli;
use antgrid::headless::HeadlessDisplay;
use antgrid_core::{run_observer, ObserverOptions, RunSummary, Simulation};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::path::Path;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.dump_config {
        print!("{}", cli.load_config().to_toml());
        return Ok(());
    }

    // Held until exit so buffered file logs get flushed.
    let _log_guard = init_tracing(&cli)?;

    let config = cli.load_config();
    let params = match cli.params(&config) {
        Ok(params) => params,
        Err(e) => Cli::command().error(ErrorKind::ValueValidation, e).exit(),
    };

    tracing::info!(
        ants = params.n_ants,
        food = params.n_food,
        seconds = params.run_for.as_secs(),
        headless = cli.headless,
        "antgrid starting"
    );

    let mut sim = Simulation::start(params, &config).context("failed to start simulation")?;
    let options = ObserverOptions {
        run_for: params.run_for,
        frame_delay: config.observer.frame_delay(),
    };

    let report = if cli.headless {
        run_observer(&sim, HeadlessDisplay::new(Duration::from_secs(1)), options)
            .context("observer failed")
    } else {
        antgrid_tui::run_tui(&sim, options)
    };

    // Agents must be joined whatever the observer did.
    let stopped = sim.shutdown().context("failed to stop agents");
    let report = report?;
    stopped?;

    let summary = RunSummary::new(&sim, &report);
    tracing::info!(
        frames = summary.frames,
        steps = summary.agent_steps,
        exit = ?summary.exit,
        "antgrid finished"
    );
    if cli.json_summary {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

fn init_tracing(cli: &Cli) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "antgrid=info,antgrid_core=info,antgrid_tui=info".into());

    if let Some(path) = &cli.log_file {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .with_context(|| format!("log file path has no file name: {}", path.display()))?;
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false),
            )
            .init();
        return Ok(Some(guard));
    }

    // The TUI owns the terminal; without a log file it stays silent.
    if cli.headless {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(None)
}
