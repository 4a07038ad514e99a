//! Holding-area layout and tunables, passed explicitly into every component.

use crate::errors::CoreError;
use crate::fs::FileSystem;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Base directory of the holding area, relative to the home directory.
pub const TRASH_DIR: &str = ".local/share/Transh";
/// Store subdirectory holding the moved file bytes.
pub const FILES_DIR: &str = "fileInfos";
/// Subdirectory with one provenance stream per held file.
pub const LOGS_DIR: &str = "logs";
/// Default archive directory, relative to the home directory.
pub const DEFAULT_BACKUP_DIR: &str = ".local/share/backup";

/// Overrides the holding area base directory.
pub const TRASH_DIR_ENV: &str = "TRANSH_DIR";
/// Overrides the archive directory.
pub const BACKUP_DIR_ENV: &str = "TRASH_BACKUP_DIR";

/// Bounded retry for metadata appends.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based), growing linearly.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrashConfig {
    pub base_dir: PathBuf,
    pub files_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub retry: RetryPolicy,
}

impl TrashConfig {
    /// Layout rooted at `base_dir`, with archives going to `backup_dir`.
    pub fn new(base_dir: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            files_dir: base_dir.join(FILES_DIR),
            logs_dir: base_dir.join(LOGS_DIR),
            base_dir,
            backup_dir: backup_dir.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Default layout below a home directory.
    pub fn from_home(home: &Path) -> Self {
        Self::new(home.join(TRASH_DIR), home.join(DEFAULT_BACKUP_DIR))
    }

    /// Default layout below the current user's home, honouring
    /// `TRANSH_DIR` and `TRASH_BACKUP_DIR`.
    pub fn from_env() -> crate::Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| CoreError::invalid_input("cannot determine home directory"))?;
        let mut config = Self::from_home(&home);

        if let Some(base) = env::var_os(TRASH_DIR_ENV).filter(|v| !v.is_empty()) {
            let backup = config.backup_dir.clone();
            config = Self::new(PathBuf::from(base), backup);
        }
        if let Some(backup) = env::var_os(BACKUP_DIR_ENV).filter(|v| !v.is_empty()) {
            config.backup_dir = PathBuf::from(backup);
        }

        Ok(config)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Creates the base, store and log directories. Failure is fatal.
    pub fn ensure_layout(&self, fs: &dyn FileSystem) -> crate::Result<()> {
        for dir in [&self.base_dir, &self.files_dir, &self.logs_dir] {
            fs.create_dir_all(dir)?;
        }
        Ok(())
    }
}
