use std::{io, path::PathBuf};

/// Error taxonomy shared by every component of the holding area.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    /// Directory-level I/O failure (layout creation, reading the log directory).
    #[error("I/O error while accessing {0}")]
    Io(PathBuf, #[source] io::Error),

    /// A path or held object does not exist.
    #[error("not found: {0}")]
    NotFound(PathBuf),

    /// Directories cannot be put into the holding area.
    #[error("{0} is a directory, only files are supported")]
    IsDirectory(PathBuf),

    /// Renaming a file into or out of the holding area failed.
    #[error("failed to move {from} to {to}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A restore would overwrite an existing path.
    #[error("destination already exists: {0}")]
    DestinationConflict(PathBuf),

    /// Appending to a provenance stream failed after all retries.
    #[error("failed to write log stream {0}")]
    WriteFailed(PathBuf, #[source] io::Error),

    /// The latest record of a stream could not be decoded.
    #[error("corrupt log record in {stream}: {reason}")]
    Corrupt { stream: String, reason: String },

    /// A stream exists but holds no records.
    #[error("log stream {0} is empty")]
    Empty(String),

    /// Restore or delete target has no held record.
    #[error("{0} is not in the trash")]
    NotInTrash(String),

    /// The archiver could not produce the archive.
    #[error("failed to archive {source_dir} into {destination}: {reason}")]
    ArchiveFailed {
        source_dir: PathBuf,
        destination: PathBuf,
        reason: String,
    },

    /// The log write failed and moving the file back failed too. The object
    /// stays in the holding store without a log entry.
    #[error("{origin} is orphaned at {held}: {cause}; rollback failed: {rollback}")]
    Orphaned {
        origin: PathBuf,
        held: PathBuf,
        cause: Box<CoreError>,
        rollback: Box<CoreError>,
    },

    /// The file was restored but neither the log write nor moving it back
    /// into the store succeeded, so its stream still reads held.
    #[error("{origin} was restored but {held} is still logged as held: {cause}; rollback failed: {rollback}")]
    Unrecorded {
        origin: PathBuf,
        held: String,
        cause: Box<CoreError>,
        rollback: Box<CoreError>,
    },

    /// Paths inside the holding area itself cannot be put.
    #[error("{0} is inside the trash")]
    InsideTrash(PathBuf),

    /// The user declined a confirmation gate.
    #[error("operation cancelled")]
    Cancelled,

    /// An operation was rejected due to argument issues.
    #[error("invalid command input: {0}")]
    InvalidInput(String),
}

impl CoreError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, error: io::Error) -> Self {
        Self::Io(path.into(), error)
    }

    pub fn move_failed(from: impl Into<PathBuf>, to: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::MoveFailed {
            from: from.into(),
            to: to.into(),
            source,
        }
    }

    pub fn corrupt(stream: impl Into<String>, reason: impl ToString) -> Self {
        Self::Corrupt {
            stream: stream.into(),
            reason: reason.to_string(),
        }
    }
}

/// Shared result alias for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
