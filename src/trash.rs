//! Lifecycle orchestration: `External -> Held -> {Restored, Purged}`.
//!
//! Every mutation moves bytes through the [`HoldingStore`] first and records
//! the new state in the [`ProvenanceLog`] second. When the log write fails the
//! move is compensated; when compensation fails too the caller gets
//! [`CoreError::Orphaned`] (put) or [`CoreError::Unrecorded`] (restore).

use crate::archive::{Archiver, TarGzArchiver};
use crate::config::TrashConfig;
use crate::confirm::Confirm;
use crate::errors::CoreError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::helpers::{archive_file_name, local_seconds, sanitize_user_path, LOG_STREAM_SUFFIX};
use crate::log::{ProvenanceLog, StreamId};
use crate::models::{BatchReport, ClearReport, ItemFailure, Operator, RecordState, TrashedFile};
use crate::resolver::{current_operator, Resolver};
use crate::store::HoldingStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const CLEAR_PROMPT: &str = "Empty the trash? Everything is archived first. (y/n): ";

pub struct Trash {
    config: TrashConfig,
    fs: Arc<dyn FileSystem>,
    resolver: Resolver,
    store: HoldingStore,
    log: ProvenanceLog,
}

impl Trash {
    /// Opens the holding area on the real filesystem, creating its layout.
    pub fn open(config: TrashConfig) -> crate::Result<Self> {
        Self::with_parts(config, Arc::new(RealFileSystem), Arc::new(TarGzArchiver))
    }

    pub fn with_parts(
        config: TrashConfig,
        fs: Arc<dyn FileSystem>,
        archiver: Arc<dyn Archiver>,
    ) -> crate::Result<Self> {
        config.ensure_layout(fs.as_ref())?;

        Ok(Self {
            resolver: Resolver::new(fs.clone()),
            store: HoldingStore::new(fs.clone(), archiver, config.files_dir.clone()),
            log: ProvenanceLog::new(fs.clone(), config.logs_dir.clone(), config.retry),
            fs,
            config,
        })
    }

    pub fn config(&self) -> &TrashConfig {
        &self.config
    }

    pub fn log(&self) -> &ProvenanceLog {
        &self.log
    }

    /// Moves each path into the holding area, in order, continuing past failures.
    pub fn put<P: AsRef<Path>>(&self, paths: &[P]) -> BatchReport<TrashedFile> {
        let operator = current_operator();
        let mut report = BatchReport::default();
        for path in paths {
            let path = path.as_ref();
            let outcome = self.put_one(path, &operator);
            if let Err(err) = &outcome {
                warn!(path = %path.display(), "put failed: {err}");
            }
            report.record(sanitize_user_path(path), outcome);
        }
        if !report.is_clean() {
            info!(moved = report.succeeded.len(), failed = report.failures.len(), "put finished with failures");
        }
        report
    }

    fn put_one(&self, path: &Path, operator: &Operator) -> crate::Result<TrashedFile> {
        let resolved = self.resolver.resolve(path)?;
        if resolved.path.starts_with(&self.config.base_dir) {
            return Err(CoreError::InsideTrash(resolved.path));
        }

        let now = self.fs.now();
        let held_name = self.resolver.unique_held_name(&resolved.file_name, now, |candidate| {
            self.store.contains(candidate) || self.log.exists(&StreamId::for_held(candidate))
        });

        let held_path = self.store.commit(&resolved.path, &held_name)?;
        let record = TrashedFile {
            file_name: resolved.file_name,
            origin_path: resolved.path,
            target_path: held_path,
            operator: operator.clone(),
            file_size: resolved.size,
            deletion_date: local_seconds(now),
            state: RecordState::Held,
        };

        let stream = StreamId::for_held(&held_name);
        if let Err(cause) = self.log.append(&stream, &record) {
            return Err(self.roll_back_put(&record, &stream, cause));
        }

        info!(origin = %record.origin_path.display(), held = %held_name, "moved to trash");
        Ok(record)
    }

    fn roll_back_put(&self, record: &TrashedFile, stream: &StreamId, cause: CoreError) -> CoreError {
        error!(held = %record.target_path.display(), "log write failed after move: {cause}");

        if let Err(rollback) = self.store.release(&record.target_path, &record.origin_path) {
            error!(held = %record.target_path.display(), "rollback failed, object orphaned: {rollback}");
            return CoreError::Orphaned {
                origin: record.origin_path.clone(),
                held: record.target_path.clone(),
                cause: Box::new(cause),
                rollback: Box::new(rollback),
            };
        }

        // The stream name was unused before this put, so anything in it is a partial write.
        if self.log.exists(stream) {
            if let Err(err) = self.log.remove_stream(stream) {
                warn!(%stream, "failed to remove partial stream: {err}");
            }
        }

        warn!(origin = %record.origin_path.display(), "rolled back to original location");
        cause
    }

    /// Held files ordered by deletion date, then held name. Unreadable streams
    /// are reported as failures; an unreadable log directory is an error.
    pub fn list(&self) -> crate::Result<BatchReport<TrashedFile>> {
        let streams = self.log.list_streams()?;
        let mut report = BatchReport::default();

        for stream in &streams {
            match self.log.read_latest(stream) {
                Ok(record) if record.state.is_terminal() => {}
                Ok(record) => {
                    if self.fs.exists(&record.target_path) {
                        report.succeeded.push(record);
                    } else {
                        report.fail(stream.held_name(), CoreError::NotFound(record.target_path));
                    }
                }
                Err(err) => {
                    warn!(%stream, "skipping unreadable log stream: {err}");
                    report.fail(stream.held_name(), err);
                }
            }
        }

        report.succeeded.sort_by(|a, b| {
            a.deletion_date
                .cmp(&b.deletion_date)
                .then_with(|| a.held_name().cmp(&b.held_name()))
        });
        Ok(report)
    }

    /// Moves held files back to their recorded origin.
    pub fn restore<S: AsRef<str>>(&self, names: &[S]) -> BatchReport<TrashedFile> {
        self.for_each_held(names, |held_name, record| self.restore_one(held_name, record))
    }

    fn restore_one(&self, held_name: &str, record: TrashedFile) -> crate::Result<TrashedFile> {
        self.store.release(&record.target_path, &record.origin_path)?;

        let restored = record.transition(RecordState::Restored, local_seconds(self.fs.now()));
        if let Err(cause) = self.log.append(&StreamId::for_held(held_name), &restored) {
            error!(held = %held_name, "log write failed after restore: {cause}");
            if let Err(rollback) = self.store.commit(&record.origin_path, held_name) {
                error!(
                    held = %held_name,
                    origin = %record.origin_path.display(),
                    "file restored but log still marks it held: {rollback}"
                );
                return Err(CoreError::Unrecorded {
                    origin: record.origin_path,
                    held: held_name.to_string(),
                    cause: Box::new(cause),
                    rollback: Box::new(rollback),
                });
            }
            warn!(held = %held_name, "restore rolled back into the holding store");
            return Err(cause);
        }

        info!(held = %held_name, origin = %restored.origin_path.display(), "restored");
        Ok(restored)
    }

    /// Permanently removes held files.
    pub fn delete<S: AsRef<str>>(&self, names: &[S]) -> BatchReport<TrashedFile> {
        self.for_each_held(names, |held_name, record| {
            self.store.purge(&record.target_path)?;

            let purged = record.transition(RecordState::Purged, local_seconds(self.fs.now()));
            self.log.append(&StreamId::for_held(held_name), &purged)?;

            info!(held = %held_name, "deleted permanently");
            Ok(purged)
        })
    }

    fn for_each_held<S, F>(&self, names: &[S], mut action: F) -> BatchReport<TrashedFile>
    where
        S: AsRef<str>,
        F: FnMut(&str, TrashedFile) -> crate::Result<TrashedFile>,
    {
        let mut report = BatchReport::default();
        for name in names {
            let name = name.as_ref();
            let held_name = normalize_held_name(name);
            let outcome = self
                .held_record(name, &held_name)
                .and_then(|record| action(&held_name, record));
            if let Err(err) = &outcome {
                warn!(item = %name, "operation failed: {err}");
            }
            report.record(name, outcome);
        }
        if !report.is_clean() {
            info!(done = report.succeeded.len(), failed = report.failures.len(), "batch finished with failures");
        }
        report
    }

    fn held_record(&self, name: &str, held_name: &str) -> crate::Result<TrashedFile> {
        if held_name.is_empty() {
            return Err(CoreError::NotInTrash(name.to_string()));
        }

        match self.log.read_latest(&StreamId::for_held(held_name)) {
            Ok(record) if record.is_held() => Ok(record),
            Ok(record) => {
                debug!(held = %held_name, state = ?record.state, "latest record is terminal");
                Err(CoreError::NotInTrash(name.to_string()))
            }
            Err(CoreError::NotFound(_)) => Err(CoreError::NotInTrash(name.to_string())),
            Err(err) => Err(err),
        }
    }

    /// Archives the holding area, then empties it. Declining the gate touches nothing.
    pub fn clear(&self, confirm: &mut dyn Confirm) -> crate::Result<ClearReport> {
        if !confirm.confirm(CLEAR_PROMPT) {
            info!("clear cancelled");
            return Err(CoreError::Cancelled);
        }

        let archive = self.archive_into(&self.config.backup_dir)?;
        let mut report = ClearReport {
            archive,
            ..ClearReport::default()
        };

        for object in self.store.held_objects()? {
            match self.store.purge(&object) {
                Ok(()) => report.purged += 1,
                Err(error) => report.failures.push(ItemFailure {
                    item: object.display().to_string(),
                    error,
                }),
            }
        }

        for stream in &self.log.list_streams()? {
            match self.log.remove_stream(stream) {
                Ok(()) => report.streams_removed += 1,
                Err(error) => report.failures.push(ItemFailure {
                    item: stream.to_string(),
                    error,
                }),
            }
        }

        self.config.ensure_layout(self.fs.as_ref())?;
        info!(
            purged = report.purged,
            streams = report.streams_removed,
            failed = report.failures.len(),
            "trash cleared"
        );
        Ok(report)
    }

    /// Archives the holding area into `destination` (default: the backup
    /// directory) without removing anything.
    pub fn backup(&self, destination: Option<&Path>) -> crate::Result<PathBuf> {
        let dir = destination.unwrap_or(self.config.backup_dir.as_path());
        let archive = self.archive_into(dir)?;
        info!(archive = %archive.display(), "backup written");
        Ok(archive)
    }

    fn archive_into(&self, dir: &Path) -> crate::Result<PathBuf> {
        let now = self.fs.now();
        let mut sequence = 0;
        let mut archive = dir.join(archive_file_name(now, sequence));
        while self.fs.exists(&archive) {
            sequence += 1;
            archive = dir.join(archive_file_name(now, sequence));
        }
        self.store.archive_all(&self.config.base_dir, &archive)?;
        Ok(archive)
    }
}

/// Accepts a held name, its stream file name, or a path ending in either.
fn normalize_held_name(name: &str) -> String {
    let base = Path::new(name.trim())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.strip_suffix(LOG_STREAM_SUFFIX).map(str::to_string).unwrap_or(base)
}
