//! Append-only provenance streams, one file per held object.
//!
//! A stream is never rewritten: state changes append a new record and the
//! last record is authoritative. There is no locking, so two processes
//! appending to the same holding area can interleave records.

use crate::codec;
use crate::config::RetryPolicy;
use crate::errors::CoreError;
use crate::fs::{into_io, io_kind, FileSystem};
use crate::helpers::LOG_STREAM_SUFFIX;
use crate::models::TrashedFile;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// File name of a provenance stream: `<held name>.backup`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StreamId(String);

impl StreamId {
    pub fn for_held(held_name: &str) -> Self {
        Self(format!("{held_name}{LOG_STREAM_SUFFIX}"))
    }

    /// Accepts a stream file name; anything without the suffix is rejected.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        file_name
            .strip_suffix(LOG_STREAM_SUFFIX)
            .filter(|held| !held.is_empty())
            .map(|_| Self(file_name.to_string()))
    }

    pub fn held_name(&self) -> &str {
        self.0.strip_suffix(LOG_STREAM_SUFFIX).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of the streams present when it was taken, sorted by name.
#[derive(Debug, Clone, Default)]
pub struct Streams {
    ids: Vec<StreamId>,
}

impl Streams {
    /// Restartable: every call walks the same snapshot from the start.
    pub fn iter(&self) -> impl Iterator<Item = &StreamId> + '_ {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<'a> IntoIterator for &'a Streams {
    type Item = &'a StreamId;
    type IntoIter = std::slice::Iter<'a, StreamId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

pub struct ProvenanceLog {
    fs: Arc<dyn FileSystem>,
    logs_dir: PathBuf,
    retry: RetryPolicy,
}

impl ProvenanceLog {
    pub fn new(fs: Arc<dyn FileSystem>, logs_dir: impl Into<PathBuf>, retry: RetryPolicy) -> Self {
        Self {
            fs,
            logs_dir: logs_dir.into(),
            retry,
        }
    }

    pub fn stream_path(&self, stream: &StreamId) -> PathBuf {
        self.logs_dir.join(stream.as_str())
    }

    pub fn exists(&self, stream: &StreamId) -> bool {
        self.fs.exists(&self.stream_path(stream))
    }

    /// Appends one record as a line, retrying per the configured policy.
    pub fn append(&self, stream: &StreamId, record: &TrashedFile) -> crate::Result<()> {
        let path = self.stream_path(stream);
        let mut line = codec::encode(record)?;
        line.push('\n');

        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.fs.append(&path, line.as_bytes()) {
                Ok(()) => {
                    debug!(%stream, state = ?record.state, "appended log record");
                    return Ok(());
                }
                Err(err) if attempt < attempts => {
                    warn!(%stream, attempt, "log append failed, retrying: {err}");
                    thread::sleep(self.retry.delay(attempt));
                    attempt += 1;
                }
                Err(err) => return Err(CoreError::WriteFailed(path, into_io(err))),
            }
        }
    }

    /// The stream's current state: its last record.
    pub fn read_latest(&self, stream: &StreamId) -> crate::Result<TrashedFile> {
        let content = self.read_stream(stream)?;
        let line = content
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| CoreError::Empty(stream.to_string()))?;
        codec::decode(stream.as_str(), line)
    }

    /// Full history of a stream, oldest first.
    pub fn read_all(&self, stream: &StreamId) -> crate::Result<Vec<TrashedFile>> {
        let content = self.read_stream(stream)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| codec::decode(stream.as_str(), line))
            .collect()
    }

    /// Enumerates all streams. Failing to read the log directory is fatal.
    pub fn list_streams(&self) -> crate::Result<Streams> {
        let mut ids: Vec<StreamId> = self
            .fs
            .list_dir(&self.logs_dir)?
            .iter()
            .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
            .filter_map(StreamId::from_file_name)
            .collect();
        ids.sort();
        Ok(Streams { ids })
    }

    pub fn remove_stream(&self, stream: &StreamId) -> crate::Result<()> {
        let path = self.stream_path(stream);
        self.fs.remove_file(&path).map_err(|err| match io_kind(&err) {
            Some(io::ErrorKind::NotFound) => CoreError::NotFound(path.clone()),
            _ => err,
        })
    }

    fn read_stream(&self, stream: &StreamId) -> crate::Result<String> {
        let path = self.stream_path(stream);
        self.fs.read_to_string(&path).map_err(|err| match io_kind(&err) {
            Some(io::ErrorKind::NotFound) => CoreError::NotFound(path.clone()),
            _ => err,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::RealFileSystem;
    use crate::helpers::DELETION_DATE_FORMAT;
    use crate::models::{Operator, RecordState};
    use chrono::NaiveDateTime;
    use std::fs;
    use tempfile::TempDir;

    fn log() -> (TempDir, ProvenanceLog) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let logs = dir.path().join("logs");
        fs::create_dir_all(&logs).expect("mkdir");
        let log = ProvenanceLog::new(Arc::new(RealFileSystem), logs, RetryPolicy::none());
        (dir, log)
    }

    fn record(held: &str, state: RecordState) -> TrashedFile {
        TrashedFile {
            file_name: "a.txt".to_string(),
            origin_path: PathBuf::from("/work/a.txt"),
            target_path: PathBuf::from("/trash/fileInfos").join(held),
            operator: Operator {
                username: "me".to_string(),
                uid: "1000".to_string(),
            },
            file_size: 1,
            deletion_date: NaiveDateTime::parse_from_str("2025-08-29 17:35:30", DELETION_DATE_FORMAT)
                .expect("valid date"),
            state,
        }
    }

    #[test]
    fn stream_id_round_trips_held_name() {
        let id = StreamId::for_held("a.txt.20250829173530");
        assert_eq!(id.as_str(), "a.txt.20250829173530.backup");
        assert_eq!(id.held_name(), "a.txt.20250829173530");
        assert_eq!(StreamId::from_file_name(id.as_str()), Some(id));
        assert_eq!(StreamId::from_file_name("notes.txt"), None);
        assert_eq!(StreamId::from_file_name(".backup"), None);
    }

    #[test]
    fn latest_record_wins_in_multi_record_stream() {
        let (_dir, log) = log();
        let id = StreamId::for_held("a.txt.1");
        log.append(&id, &record("a.txt.1", RecordState::Held)).expect("append held");
        log.append(&id, &record("a.txt.1", RecordState::Restored)).expect("append restored");
        log.append(&id, &record("a.txt.1", RecordState::Held)).expect("append held again");

        assert_eq!(log.read_latest(&id).expect("latest").state, RecordState::Held);
        let history: Vec<_> = log.read_all(&id).expect("all").into_iter().map(|r| r.state).collect();
        assert_eq!(history, [RecordState::Held, RecordState::Restored, RecordState::Held]);
    }

    #[test]
    fn empty_missing_and_corrupt_streams() {
        let (_dir, log) = log();
        let empty = StreamId::for_held("empty");
        fs::write(log.stream_path(&empty), "\n\n").expect("write");
        assert!(matches!(log.read_latest(&empty), Err(CoreError::Empty(_))));

        assert!(matches!(
            log.read_latest(&StreamId::for_held("missing")),
            Err(CoreError::NotFound(_))
        ));

        let corrupt = StreamId::for_held("corrupt");
        log.append(&corrupt, &record("corrupt", RecordState::Held)).expect("append");
        fs::OpenOptions::new()
            .append(true)
            .open(log.stream_path(&corrupt))
            .and_then(|mut f| std::io::Write::write_all(&mut f, b"{truncated\n"))
            .expect("write garbage");
        assert!(matches!(log.read_latest(&corrupt), Err(CoreError::Corrupt { .. })));
    }

    #[test]
    fn list_streams_is_sorted_and_restartable() {
        let (_dir, log) = log();
        for held in ["b.1", "a.1", "c.1"] {
            log.append(&StreamId::for_held(held), &record(held, RecordState::Held))
                .expect("append");
        }
        fs::write(log.logs_dir.join("stray.txt"), "").expect("write stray");

        let streams = log.list_streams().expect("list");
        let first: Vec<_> = streams.iter().map(|s| s.held_name().to_string()).collect();
        let second: Vec<_> = streams.iter().map(|s| s.held_name().to_string()).collect();
        assert_eq!(first, ["a.1", "b.1", "c.1"]);
        assert_eq!(first, second);
    }

    #[test]
    fn remove_stream_deletes_file() {
        let (_dir, log) = log();
        let id = StreamId::for_held("gone.1");
        log.append(&id, &record("gone.1", RecordState::Held)).expect("append");
        log.remove_stream(&id).expect("remove");
        assert!(!log.exists(&id));
        assert!(matches!(log.remove_stream(&id), Err(CoreError::NotFound(_))));
    }
}
