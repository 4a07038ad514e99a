//! Absolute paths, held names and operator identity.

use crate::errors::CoreError;
use crate::fs::{io_kind, FileSystem};
use crate::helpers::{build_unique_basename, compact_timestamp};
use crate::models::Operator;
use std::env;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// A file that passed the put preconditions.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Resolved {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}

#[derive(Clone)]
pub struct Resolver {
    fs: Arc<dyn FileSystem>,
}

impl Resolver {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Makes `path` absolute and checks it names an existing non-directory.
    ///
    /// The last component is not dereferenced, so a symlink is held as itself.
    pub fn resolve(&self, path: &Path) -> crate::Result<Resolved> {
        let absolute = absolutize(path)?;
        let metadata = self.fs.symlink_metadata(&absolute).map_err(|err| match io_kind(&err) {
            Some(io::ErrorKind::NotFound) => CoreError::NotFound(absolute.clone()),
            _ => err,
        })?;

        if metadata.is_dir() {
            return Err(CoreError::IsDirectory(absolute));
        }

        if absolute.to_str().is_none() {
            return Err(CoreError::invalid_input(format!(
                "{} is not valid UTF-8",
                absolute.display()
            )));
        }

        let file_name = absolute
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| CoreError::invalid_input(format!("{} has no file name", absolute.display())))?;

        Ok(Resolved {
            size: metadata.len(),
            file_name,
            path: absolute,
        })
    }

    /// `<base>.<YYYYmmddHHMMSS>`; two puts of the same base name within one
    /// second yield the same name, see [`Resolver::unique_held_name`].
    pub fn generate_held_name(&self, base_name: &str, now: SystemTime) -> String {
        build_unique_basename(base_name, &compact_timestamp(now))
    }

    /// Like [`Resolver::generate_held_name`], appending `.1`, `.2`, ... while
    /// `taken` reports the candidate as used.
    pub fn unique_held_name(&self, base_name: &str, now: SystemTime, taken: impl Fn(&str) -> bool) -> String {
        let held = self.generate_held_name(base_name, now);
        if !taken(&held) {
            return held;
        }

        (1u64..)
            .map(|n| format!("{held}.{n}"))
            .find(|candidate| !taken(candidate.as_str()))
            .unwrap_or(held)
    }
}

fn absolutize(path: &Path) -> crate::Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(CoreError::invalid_input("empty path"));
    }

    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = env::current_dir().map_err(|err| CoreError::io(".", err))?;
        cwd.join(path)
    };

    Ok(joined
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect())
}

/// Identity recorded in log records.
pub fn current_operator() -> Operator {
    let username = ["USER", "LOGNAME", "USERNAME"]
        .iter()
        .find_map(|key| env::var(key).ok().filter(|v| !v.is_empty()))
        .unwrap_or_default();

    Operator {
        username,
        uid: current_uid(),
    }
}

#[cfg(unix)]
fn current_uid() -> String {
    // SAFETY: geteuid has no preconditions and cannot fail.
    let uid = unsafe { libc::geteuid() };
    uid.to_string()
}

#[cfg(not(unix))]
fn current_uid() -> String {
    String::new()
}
