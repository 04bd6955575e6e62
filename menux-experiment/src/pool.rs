//! Item pools: which labels each task category offers.
//!
//! The source table has one line per task, `TASK,item/item/item`, e.g.
//! `LINEAR,1/2/4/8/16`.

use crate::error::ConfigurationError;
use menux_core::{ItemList, TaskKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Something that can produce the task → items mapping.
pub trait ItemPoolSource {
    fn load(&self) -> Result<ItemPools, ConfigurationError>;
}

/// Canonical item list per task category. Never mutated by scheduling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPools(BTreeMap<TaskKind, ItemList>);

impl ItemPools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(table: &str) -> Result<Self, ConfigurationError> {
        let mut pools = Self::new();
        for (index, raw) in table.lines().enumerate() {
            let line = index + 1;
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            let (name, list) = raw
                .split_once(',')
                .ok_or_else(|| ConfigurationError::Malformed {
                    line,
                    reason: "expected `TASK,item/item/...`".into(),
                })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigurationError::Malformed {
                    line,
                    reason: "missing task category".into(),
                });
            }
            let task: TaskKind = name
                .parse()
                .map_err(|e: menux_core::UnknownTaskError| ConfigurationError::Malformed {
                    line,
                    reason: e.to_string(),
                })?;

            let list = list.trim();
            if list.contains(',') {
                return Err(ConfigurationError::Malformed {
                    line,
                    reason: "expected exactly two columns".into(),
                });
            }
            if list.is_empty() {
                return Err(ConfigurationError::EmptyPool(task));
            }
            let items = ItemList::from_slashed(list);
            if items.iter().any(|label| label.trim().is_empty()) {
                return Err(ConfigurationError::Malformed {
                    line,
                    reason: format!("empty item label for task {task}"),
                });
            }

            if pools.0.insert(task, items).is_some() {
                return Err(ConfigurationError::DuplicateTask { line, task });
            }
        }
        debug!(tasks = pools.0.len(), "parsed item pools");
        Ok(pools)
    }

    pub fn insert(&mut self, task: TaskKind, items: ItemList) -> Option<ItemList> {
        self.0.insert(task, items)
    }

    pub fn get(&self, task: TaskKind) -> Option<&ItemList> {
        self.0.get(&task)
    }

    /// The pool for `task`, which must exist and be non-empty.
    pub fn require(&self, task: TaskKind) -> Result<&ItemList, ConfigurationError> {
        match self.0.get(&task) {
            None => Err(ConfigurationError::MissingPool(task)),
            Some(items) if items.is_empty() => Err(ConfigurationError::EmptyPool(task)),
            Some(items) => Ok(items),
        }
    }

    /// Every task category needs a non-empty pool before a session can run.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        TaskKind::ALL
            .into_iter()
            .try_for_each(|task| self.require(task).map(|_| ()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskKind, &ItemList)> {
        self.0.iter().map(|(task, items)| (*task, items))
    }
}

impl ItemPoolSource for ItemPools {
    fn load(&self) -> Result<ItemPools, ConfigurationError> {
        Ok(self.clone())
    }
}

/// Pool table read from disk.
#[derive(Debug, Clone)]
pub struct PoolFile {
    path: PathBuf,
}

impl PoolFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ItemPoolSource for PoolFile {
    fn load(&self) -> Result<ItemPools, ConfigurationError> {
        let table =
            std::fs::read_to_string(&self.path).map_err(|source| ConfigurationError::Io {
                path: self.path.clone(),
                source,
            })?;
        ItemPools::parse(&table)
    }
}
