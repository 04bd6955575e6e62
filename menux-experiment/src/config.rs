use crate::error::ConfigurationError;
use crate::scheduler::TrialScheduler;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for one experiment run. Every field has a default, so a JSON
/// config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// How many times each prompted item is repeated.
    pub repeat_count: usize,
    /// Maximum number of items prompted per (menu, task) condition.
    pub item_count_cap: usize,
    /// Reshuffle the displayed order of items for every condition.
    pub shuffle_menu_items: bool,
    /// Fixed scheduling seed; random when absent.
    pub seed: Option<u64>,
    pub pool_path: PathBuf,
    pub results_path: PathBuf,
    pub font_path: Option<PathBuf>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            repeat_count: 3,
            item_count_cap: 4,
            shuffle_menu_items: false,
            seed: None,
            pool_path: PathBuf::from("assets/menuContents.csv"),
            results_path: PathBuf::from("results/TestResult.csv"),
            font_path: None,
        }
    }
}

impl ExperimentConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|source| ConfigurationError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.repeat_count == 0 {
            return Err(ConfigurationError::Invalid(
                "repeat_count must be at least 1".into(),
            ));
        }
        if self.item_count_cap == 0 {
            return Err(ConfigurationError::Invalid(
                "item_count_cap must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn scheduler(&self) -> TrialScheduler {
        TrialScheduler::new(self.repeat_count, self.item_count_cap)
            .with_shuffled_items(self.shuffle_menu_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ExperimentConfig =
            serde_json::from_str(r#"{ "repeat_count": 2, "seed": 9 }"#).unwrap();
        assert_eq!(config.repeat_count, 2);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.item_count_cap, 4);
        assert_eq!(config.pool_path, PathBuf::from("assets/menuContents.csv"));
    }

    #[test]
    fn rejects_zero_counts() {
        let config = ExperimentConfig {
            repeat_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ExperimentConfig {
            item_count_cap: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ repeat_count: ").unwrap();
        let err = ExperimentConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigurationError::Json { .. }));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = ExperimentConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigurationError::Io { .. }));
    }

    #[test]
    fn scheduler_mirrors_settings() {
        let config = ExperimentConfig {
            repeat_count: 2,
            item_count_cap: 5,
            shuffle_menu_items: true,
            ..Default::default()
        };
        let scheduler = config.scheduler();
        assert_eq!(scheduler.repeat_count, 2);
        assert_eq!(scheduler.item_count_cap, 5);
        assert!(scheduler.shuffle_menu_items);
    }
}
