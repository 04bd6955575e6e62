use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the items of a menu relate to one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskKind {
    /// Items with an obvious linear order.
    Linear,
    /// Items that naturally relate to each other.
    Relative,
    /// Unrelated items.
    Unclass,
}

impl TaskKind {
    pub const ALL: [TaskKind; 3] = [TaskKind::Linear, TaskKind::Relative, TaskKind::Unclass];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Linear => "LINEAR",
            TaskKind::Relative => "RELATIVE",
            TaskKind::Unclass => "UNCLASS",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task category `{0}`")]
pub struct UnknownTaskError(pub String);

impl FromStr for TaskKind {
    type Err = UnknownTaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskKind::ALL
            .into_iter()
            .find(|task| task.as_str() == s)
            .ok_or_else(|| UnknownTaskError(s.to_string()))
    }
}
