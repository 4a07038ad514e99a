//! Physical placement of file bytes inside the holding directory.

use crate::archive::Archiver;
use crate::errors::CoreError;
use crate::fs::{into_io, io_kind, FileSystem};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub struct HoldingStore {
    fs: Arc<dyn FileSystem>,
    archiver: Arc<dyn Archiver>,
    files_dir: PathBuf,
}

impl HoldingStore {
    pub fn new(fs: Arc<dyn FileSystem>, archiver: Arc<dyn Archiver>, files_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            archiver,
            files_dir: files_dir.into(),
        }
    }

    pub fn held_path(&self, held_name: &str) -> PathBuf {
        self.files_dir.join(held_name)
    }

    pub fn contains(&self, held_name: &str) -> bool {
        self.fs.exists(&self.held_path(held_name))
    }

    /// Moves `absolute_path` into the store under `held_name`.
    pub fn commit(&self, absolute_path: &Path, held_name: &str) -> crate::Result<PathBuf> {
        let held_path = self.held_path(held_name);
        if self.fs.exists(&held_path) {
            return Err(CoreError::DestinationConflict(held_path));
        }

        self.fs
            .rename(absolute_path, &held_path)
            .map_err(|err| CoreError::move_failed(absolute_path, &held_path, into_io(err)))?;

        debug!(from = %absolute_path.display(), to = %held_path.display(), "committed to holding store");
        Ok(held_path)
    }

    /// Moves a held object to `destination`, creating missing parent directories.
    pub fn release(&self, held_path: &Path, destination: &Path) -> crate::Result<()> {
        if !self.fs.exists(held_path) {
            return Err(CoreError::NotFound(held_path.to_path_buf()));
        }
        if self.fs.exists(destination) {
            return Err(CoreError::DestinationConflict(destination.to_path_buf()));
        }

        if let Some(parent) = destination.parent() {
            self.fs
                .create_dir_all(parent)
                .map_err(|err| CoreError::move_failed(held_path, destination, into_io(err)))?;
        }

        self.fs
            .rename(held_path, destination)
            .map_err(|err| CoreError::move_failed(held_path, destination, into_io(err)))?;

        debug!(from = %held_path.display(), to = %destination.display(), "released from holding store");
        Ok(())
    }

    /// Permanently removes a held object.
    pub fn purge(&self, held_path: &Path) -> crate::Result<()> {
        self.fs.remove_file(held_path).map_err(|err| match io_kind(&err) {
            Some(io::ErrorKind::NotFound) => CoreError::NotFound(held_path.to_path_buf()),
            _ => err,
        })?;

        debug!(held = %held_path.display(), "purged");
        Ok(())
    }

    /// Every object currently in the store, including ones without a log entry.
    pub fn held_objects(&self) -> crate::Result<Vec<PathBuf>> {
        let mut objects = self.fs.list_dir(&self.files_dir)?;
        objects.sort();
        Ok(objects)
    }

    pub fn archive_all(&self, source_dir: &Path, destination_archive: &Path) -> crate::Result<()> {
        self.archiver.archive(source_dir, destination_archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::TarGzArchiver;
    use crate::fs::RealFileSystem;
    use std::fs;
    use tempfile::TempDir;

    fn store() -> (TempDir, HoldingStore) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let files = dir.path().join("fileInfos");
        fs::create_dir_all(&files).expect("mkdir");
        let store = HoldingStore::new(Arc::new(RealFileSystem), Arc::new(TarGzArchiver), files);
        (dir, store)
    }

    #[test]
    fn commit_then_release_moves_bytes_back() {
        let (dir, store) = store();
        let origin = dir.path().join("a.txt");
        fs::write(&origin, b"payload").expect("write");

        let held = store.commit(&origin, "a.txt.1").expect("commit");
        assert!(!origin.exists());
        assert_eq!(fs::read(&held).expect("read held"), b"payload");
        assert!(store.contains("a.txt.1"));

        store.release(&held, &origin).expect("release");
        assert_eq!(fs::read(&origin).expect("read origin"), b"payload");
        assert!(!held.exists());
    }

    #[test]
    fn commit_of_missing_file_is_move_failed() {
        let (dir, store) = store();
        let err = store.commit(&dir.path().join("nope"), "nope.1").unwrap_err();
        assert!(matches!(err, CoreError::MoveFailed { .. }));
    }

    #[test]
    fn commit_never_overwrites_held_object() {
        let (dir, store) = store();
        let origin = dir.path().join("a");
        fs::write(&origin, b"new").expect("write");
        fs::write(store.held_path("a.1"), b"old").expect("write held");

        assert!(matches!(store.commit(&origin, "a.1"), Err(CoreError::DestinationConflict(_))));
        assert!(origin.exists());
        assert_eq!(fs::read(store.held_path("a.1")).expect("read"), b"old");
    }

    #[test]
    fn release_creates_parents_and_refuses_conflicts() {
        let (dir, store) = store();
        let held = store.held_path("b.1");
        fs::write(&held, b"b").expect("write");

        let existing = dir.path().join("exists");
        fs::write(&existing, b"keep").expect("write");
        assert!(matches!(store.release(&held, &existing), Err(CoreError::DestinationConflict(_))));
        assert!(held.exists());

        let nested = dir.path().join("x").join("y").join("b");
        store.release(&held, &nested).expect("release");
        assert_eq!(fs::read(&nested).expect("read"), b"b");
    }

    #[test]
    fn purge_missing_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(store.purge(&store.held_path("ghost")), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn held_objects_are_sorted() {
        let (_dir, store) = store();
        for name in ["c", "a", "b"] {
            fs::write(store.held_path(name), b"").expect("write");
        }
        let names: Vec<_> = store
            .held_objects()
            .expect("list")
            .into_iter()
            .map(|p| p.file_name().expect("name").to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
