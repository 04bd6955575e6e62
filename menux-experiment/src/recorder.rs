//! Result log: one CSV row per completed trial.

use crate::error::PersistenceError;
use menux_core::Trial;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const RESULT_HEADER: &str = "participant, trialNum, repeatNum, menu, task, startTime, \
taskDuration (millis), Start x, Start y, End x, End y, selected option, prompted option, \
all options";

/// Receives finished trials. Only complete trials may be written.
pub trait ResultRecorder {
    fn append(&mut self, trial: &Trial) -> Result<(), PersistenceError>;
}

/// The CSV row for a trial, without the trailing newline.
pub fn format_row(trial: &Trial) -> String {
    let start = trial.start_point();
    let end = trial.end_point();
    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        trial.participant(),
        trial.trial_number(),
        trial.repeat_number(),
        trial.menu(),
        trial.task(),
        trial.start_time_ms(),
        trial.duration_ms(),
        start.x,
        start.y,
        end.x,
        end.y,
        trial.selected_option(),
        trial.prompted_index(),
        trial.items().joined(),
    )
}

/// Append-only CSV file. The header is written once, when the file is
/// created.
#[derive(Debug, Clone)]
pub struct CsvResultLog {
    path: PathBuf,
}

impl CsvResultLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let log = Self { path: path.into() };
        log.ensure_header()?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the log. The next append starts a fresh file.
    pub fn clear(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "result log erased");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn ensure_header(&self) -> Result<(), PersistenceError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        writeln!(file, "{RESULT_HEADER}").map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), "created result log");
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ResultRecorder for CsvResultLog {
    fn append(&mut self, trial: &Trial) -> Result<(), PersistenceError> {
        if !trial.is_complete() {
            return Err(PersistenceError::Incomplete(trial.trial_number()));
        }
        self.ensure_header()?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        writeln!(file, "{}", format_row(trial)).map_err(|e| self.io_error(e))?;
        debug!(trial = trial.trial_number(), "result row written");
        Ok(())
    }
}

/// Keeps rows in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    pub rows: Vec<String>,
}

impl ResultRecorder for MemoryRecorder {
    fn append(&mut self, trial: &Trial) -> Result<(), PersistenceError> {
        if !trial.is_complete() {
            return Err(PersistenceError::Incomplete(trial.trial_number()));
        }
        self.rows.push(format_row(trial));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menux_core::{ItemList, MenuKind, Point, Stamp, TaskKind};

    fn finished() -> Trial {
        let mut trial = Trial::new(
            MenuKind::Linear,
            TaskKind::Linear,
            ItemList::from_slashed("1/2/4/8/16"),
            2,
            1,
            5,
            42,
        )
        .unwrap();
        trial
            .start(
                Point::new(100.0, 200.0),
                Stamp {
                    wall_ms: 1_000,
                    mono_ns: 0,
                },
            )
            .unwrap();
        trial
            .end(
                Point::new(120.5, 330.0),
                Some(2),
                Stamp {
                    wall_ms: 1_750,
                    mono_ns: 750_000_000,
                },
            )
            .unwrap();
        trial
    }

    #[test]
    fn row_layout() {
        assert_eq!(
            format_row(&finished()),
            "42,5,1,LINEAR,LINEAR,1000,750,100,200,120.5,330,2,2,1/2/4/8/16"
        );
    }

    #[test]
    fn header_has_fourteen_columns() {
        assert_eq!(RESULT_HEADER.split(", ").count(), 14);
        assert!(RESULT_HEADER.starts_with("participant, trialNum"));
        assert!(RESULT_HEADER.ends_with("prompted option, all options"));
    }

    #[test]
    fn incomplete_trial_is_refused() {
        let trial = Trial::new(
            MenuKind::Radial,
            TaskKind::Relative,
            ItemList::from_slashed("a/b"),
            0,
            0,
            3,
            1,
        )
        .unwrap();
        let mut memory = MemoryRecorder::default();
        assert!(matches!(
            memory.append(&trial),
            Err(PersistenceError::Incomplete(3))
        ));
        assert!(memory.rows.is_empty());
    }

    #[test]
    fn csv_writes_header_once_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("TestResult.csv");

        let mut log = CsvResultLog::open(&path).unwrap();
        log.append(&finished()).unwrap();
        // reopening an existing log must not repeat the header
        let mut log = CsvResultLog::open(&path).unwrap();
        log.append(&finished()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], RESULT_HEADER);
        assert_eq!(lines[1], format_row(&finished()));
    }

    #[test]
    fn clear_removes_file_and_append_recreates_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let mut log = CsvResultLog::open(&path).unwrap();
        log.append(&finished()).unwrap();

        log.clear().unwrap();
        assert!(!path.exists());
        log.clear().unwrap();

        log.append(&finished()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn unwritable_path_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // a directory sits where the file should be
        let mut log = CsvResultLog::open(dir.path()).unwrap();
        assert!(matches!(
            log.append(&finished()),
            Err(PersistenceError::Io { .. })
        ));
    }
}
