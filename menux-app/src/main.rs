mod app;
mod cli;
mod controller;

use app::App;
use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = cli.experiment_config()?;
    let app = App::new(config, cli.participant, cli.test_mode)?;
    app.run()
}
