//! Archiving of the whole holding area.

use crate::errors::CoreError;
use flate2::{write::GzEncoder, Compression};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Capability that packs a directory tree into a single archive file.
///
/// Implementations must be atomic-or-failed: on error no archive is left at
/// `destination`.
pub trait Archiver: Send + Sync {
    fn archive(&self, source_dir: &Path, destination: &Path) -> crate::Result<()>;
}

/// Writes a gzip-compressed tarball in-process.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarGzArchiver;

impl Archiver for TarGzArchiver {
    fn archive(&self, source_dir: &Path, destination: &Path) -> crate::Result<()> {
        let failed = |reason: String| CoreError::ArchiveFailed {
            source_dir: source_dir.to_path_buf(),
            destination: destination.to_path_buf(),
            reason,
        };

        if destination.starts_with(source_dir) {
            return Err(failed("archive would be written inside the archived directory".to_string()));
        }
        if destination.exists() {
            return Err(failed("archive already exists".to_string()));
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|err| failed(err.to_string()))?;
        }

        let partial = partial_path(destination);
        debug!(source = %source_dir.display(), partial = %partial.display(), "writing archive");

        let written = write_tar_gz(source_dir, &partial).and_then(|()| fs::rename(&partial, destination));
        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_file(&partial) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(partial = %partial.display(), "failed to remove partial archive: {cleanup}");
                }
            }
            return Err(failed(err.to_string()));
        }

        Ok(())
    }
}

fn write_tar_gz(source_dir: &Path, target: &Path) -> io::Result<()> {
    let file = File::create(target)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut archive = tar::Builder::new(encoder);
    archive.follow_symlinks(false);
    archive.append_dir_all(".", source_dir)?;

    let encoder = archive.into_inner()?;
    let file = encoder.finish()?;
    file.sync_all()
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    destination.with_file_name(name)
}
