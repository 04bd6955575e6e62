use menux_core::{TaskKind, TrialError};
use std::path::PathBuf;

/// Problems with the experiment setup. Raised before any trial is scheduled.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("item pool for task {0} is empty")]
    EmptyPool(TaskKind),
    #[error("no item pool for task {0}")]
    MissingPool(TaskKind),
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("line {line}: task {task} is listed more than once")]
    DuplicateTask { line: usize, task: TaskKind },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
    #[error(transparent)]
    Trial(#[from] TrialError),
}

/// An input or lifecycle event that arrived out of order. The event is
/// dropped and nothing changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    #[error("press while a selection is already in progress")]
    PressWhileSelecting,
    #[error("move without a preceding press")]
    MoveWhileIdle,
    #[error("release without a preceding press")]
    ReleaseWhileIdle,
    #[error("reset without a selection in progress")]
    ResetWhileIdle,
    #[error("no trial is open")]
    NoCurrentTrial,
    #[error("trial {0} has not been completed")]
    TrialOpen(usize),
    #[error(transparent)]
    Trial(#[from] TrialError),
}

/// Writing a result row failed. The in-memory trial is left as it is.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("trial {0} is not complete; refusing to write a partial row")]
    Incomplete(usize),
    #[error("no trial to record")]
    NoTrial,
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
