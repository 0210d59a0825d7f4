// Entrypoint for the runner.
// - Keeps `main` small: load settings, set up logging, hand a shell to the
//   menu loop.
// - Returns `anyhow::Result` so setup failures print with their cause chain.

use std::path::PathBuf;

use bizflow_runner::{config::Settings, ui::Shell};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bizflow-runner", version, about = "Console runner for the BizFlow REST API")]
struct Args {
    /// Settings file (defaults to ./bizflow.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _ = dotenvy::dotenv();

    let settings = Settings::load(args.config.as_deref())?;

    let default_level = if settings.general.show_log_on_console { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Start the interactive menu. This call blocks until the user exits.
    let mut shell = Shell::new(settings)?;
    shell.run()?;
    Ok(())
}
