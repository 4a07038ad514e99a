//! Holding-area trash manager.
//!
//! Files are moved into a holding directory instead of being deleted, and each
//! held file gets an append-only provenance stream whose last record is its
//! current state. Everything runs synchronously in one process; there is no
//! locking, so concurrent invocations against the same holding area are unsafe.

pub mod archive;
pub mod codec;
pub mod config;
pub mod confirm;
pub mod errors;
pub mod fs;
pub mod helpers;
pub mod log;
pub mod models;
pub mod resolver;
pub mod store;
pub mod trash;

pub use archive::{Archiver, TarGzArchiver};
pub use config::{RetryPolicy, TrashConfig};
pub use confirm::{Confirm, PromptConfirm};
pub use errors::{CoreError, Result};
pub use fs::{FileSystem, RealFileSystem};
pub use helpers::{
    is_affirmative,
    print_size,
    sanitize_user_path,
    DELETION_DATE_FORMAT,
    LOG_STREAM_SUFFIX,
};
pub use log::{ProvenanceLog, StreamId, Streams};
pub use models::{
    BatchReport,
    ClearReport,
    CommandKind,
    ExitStatusLike,
    ItemFailure,
    Operator,
    RecordState,
    TrashedFile,
};
pub use trash::Trash;

/// Re-export a small stable API surface for the command crate.
pub mod prelude {
    pub use crate::{
        archive::*,
        config::*,
        confirm::*,
        errors::{CoreError, Result},
        fs::{FileSystem, RealFileSystem},
        helpers::*,
        models::*,
        trash::*,
    };
}
