use crate::errors::CoreError;
use crate::helpers::DELETION_DATE_FORMAT;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Command family exposed by the `transh` binary.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CommandKind {
    Put,
    List,
    Clear,
    Restore,
    Delete,
    Backup,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::List => "list",
            Self::Clear => "clear",
            Self::Restore => "restore",
            Self::Delete => "delete",
            Self::Backup => "backup",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of the user who performed an operation, stored as plain data.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub username: String,
    #[serde(default)]
    pub uid: String,
}

/// Lifecycle state carried by a log record.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    #[default]
    Held,
    Restored,
    Purged,
}

impl RecordState {
    /// Restored and purged records end a file's held lifecycle.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Held)
    }
}

/// One provenance record; a stream's last record is its current state.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TrashedFile {
    pub file_name: String,
    pub origin_path: PathBuf,
    pub target_path: PathBuf,
    pub operator: Operator,
    pub file_size: u64,
    #[serde(with = "deletion_date")]
    pub deletion_date: NaiveDateTime,
    #[serde(default)]
    pub state: RecordState,
}

impl TrashedFile {
    /// Name of the object inside the holding store, which also keys its log stream.
    pub fn held_name(&self) -> String {
        self.target_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn is_held(&self) -> bool {
        self.state == RecordState::Held
    }

    /// Copy of this record moved to `state` at `at`.
    pub fn transition(&self, state: RecordState, at: NaiveDateTime) -> Self {
        Self {
            deletion_date: at,
            state,
            ..self.clone()
        }
    }
}

mod deletion_date {
    use super::DELETION_DATE_FORMAT;
    use crate::helpers::parse_deletion_date;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(DELETION_DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_deletion_date(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid deletion date {raw:?}")))
    }
}

/// A single item of a batch operation that could not be completed.
#[derive(Debug)]
pub struct ItemFailure {
    pub item: String,
    pub error: CoreError,
}

/// Per-item results of put/restore/delete; failures never abort the batch.
#[derive(Debug)]
pub struct BatchReport<T> {
    pub succeeded: Vec<T>,
    pub failures: Vec<ItemFailure>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    pub fn record(&mut self, item: impl Into<String>, outcome: crate::Result<T>) {
        match outcome {
            Ok(value) => self.succeeded.push(value),
            Err(error) => self.fail(item, error),
        }
    }

    pub fn fail(&mut self, item: impl Into<String>, error: CoreError) {
        self.failures.push(ItemFailure {
            item: item.into(),
            error,
        });
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of emptying the holding area.
#[derive(Debug, Default)]
pub struct ClearReport {
    pub archive: PathBuf,
    pub purged: usize,
    pub streams_removed: usize,
    pub failures: Vec<ItemFailure>,
}

#[derive(Debug, Clone, Copy)]
pub enum ExitStatusLike {
    Ok,
    Error,
}

impl ExitStatusLike {
    pub fn as_code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Error => 1,
        }
    }
}
