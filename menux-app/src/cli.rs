use clap::Parser;
use menux_experiment::{ConfigurationError, ExperimentConfig};
use std::path::PathBuf;

/// Menu selection experiment: linear, radial and grid menus driven by a
/// press-drag-release gesture.
#[derive(Parser, Debug)]
#[command(name = "menux", version, about, long_about = None)]
pub struct Cli {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Participant id (random in 0..1000 when omitted)
    #[arg(short, long)]
    pub participant: Option<u32>,

    /// Scheduling seed, for reproducible trial orders
    #[arg(long)]
    pub seed: Option<u64>,

    /// Item pool table (`TASK,item/item/...` per line)
    #[arg(long)]
    pub pool: Option<PathBuf>,

    /// Result log (CSV, appended to)
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// TrueType font for labels
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Free-play menu without trials; keys 1/2/3 switch the shape
    #[arg(long)]
    pub test_mode: bool,
}

impl Cli {
    /// Config file (or defaults) with command line overrides applied.
    pub fn experiment_config(&self) -> Result<ExperimentConfig, ConfigurationError> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::load(path)?,
            None => ExperimentConfig::default(),
        };
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(pool) = &self.pool {
            config.pool_path = pool.clone();
        }
        if let Some(results) = &self.results {
            config.results_path = results.clone();
        }
        if self.font.is_some() {
            config.font_path = self.font.clone();
        }
        config.validate()?;
        Ok(config)
    }
}
