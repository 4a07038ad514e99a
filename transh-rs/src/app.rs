use std::io::{self, Write};

use thiserror::Error;
use tracing::debug;
use transh_core::{Confirm, CoreError, ExitStatusLike, Trash};

use crate::cli::Action;
use crate::render::{write_failures, write_listing};

pub const PUT_PROMPT: &str = "Move the files above to the trash? (y/n): ";

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("failed to write output")]
    Output(#[from] io::Error),
}

/// Executes one command. Per-item failures go to `err`; only fatal errors are returned.
pub fn run(
    action: Action,
    trash: &Trash,
    out: &mut impl Write,
    err: &mut impl Write,
    confirm: &mut dyn Confirm,
) -> Result<ExitStatusLike, Error> {
    debug!(command = %action.kind(), "running command");

    match action {
        Action::Put(paths) => {
            for path in &paths {
                writeln!(out, "{}", path.display())?;
            }
            if !confirm.confirm(PUT_PROMPT) {
                writeln!(out, "cancelled")?;
                return Ok(ExitStatusLike::Ok);
            }

            let report = trash.put(paths.as_slice());
            for record in &report.succeeded {
                writeln!(out, "trashed {} as {}", record.origin_path.display(), record.held_name())?;
            }
            write_failures(err, &report.failures)?;
        }
        Action::List => {
            let report = trash.list()?;
            write_listing(out, &report.succeeded)?;
            write_failures(err, &report.failures)?;
        }
        Action::Clear => match trash.clear(confirm) {
            Ok(report) => {
                writeln!(out, "archived to {}", report.archive.display())?;
                writeln!(
                    out,
                    "removed {} file(s) and {} log(s)",
                    report.purged, report.streams_removed
                )?;
                write_failures(err, &report.failures)?;
            }
            Err(CoreError::Cancelled) => writeln!(out, "cancelled")?,
            Err(other) => return Err(other.into()),
        },
        Action::Restore(names) => {
            let report = trash.restore(names.as_slice());
            for record in &report.succeeded {
                writeln!(out, "restored {}", record.origin_path.display())?;
            }
            write_failures(err, &report.failures)?;
        }
        Action::Delete(names) => {
            let report = trash.delete(names.as_slice());
            for record in &report.succeeded {
                writeln!(out, "deleted {}", record.held_name())?;
            }
            write_failures(err, &report.failures)?;
        }
        Action::Backup(destination) => {
            let archive = trash.backup(destination.as_deref())?;
            writeln!(out, "archived to {}", archive.display())?;
        }
    }

    Ok(ExitStatusLike::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use transh_core::TrashConfig;

    struct Run {
        out: String,
        err: String,
    }

    fn setup() -> (TempDir, Trash) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = TrashConfig::new(dir.path().join("Transh"), dir.path().join("backup"));
        let trash = Trash::open(config).expect("open");
        (dir, trash)
    }

    fn exec(trash: &Trash, action: Action, answer: bool) -> Run {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut confirm = |_: &str| answer;
        run(action, trash, &mut out, &mut err, &mut confirm).expect("run");
        Run {
            out: String::from_utf8(out).expect("utf8"),
            err: String::from_utf8(err).expect("utf8"),
        }
    }

    fn write(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, name).expect("write");
        path
    }

    #[test]
    fn declined_put_moves_nothing() {
        let (dir, trash) = setup();
        let path = write(&dir, "a.txt");

        let result = exec(&trash, Action::Put(vec![path.clone()]), false);
        assert!(result.out.ends_with("cancelled\n"));
        assert!(path.exists());
    }

    #[test]
    fn put_list_restore_through_commands() {
        let (dir, trash) = setup();
        let path = write(&dir, "a.txt");

        let put = exec(&trash, Action::Put(vec![path.clone()]), true);
        assert!(put.out.contains("trashed"));
        assert!(put.err.is_empty());

        let listed = exec(&trash, Action::List, false);
        assert!(listed.out.contains("a.txt."));
        assert!(listed.out.contains("1 file(s)"));

        let held = trash.list().expect("list").succeeded[0].held_name();
        let restored = exec(&trash, Action::Restore(vec![held]), false);
        assert!(restored.out.starts_with("restored "));
        assert!(path.exists());
        assert_eq!(exec(&trash, Action::List, false).out, "trash is empty\n");
    }

    #[test]
    fn per_item_failures_go_to_stderr() {
        let (_dir, trash) = setup();
        let result = exec(&trash, Action::Delete(vec!["ghost".to_string()]), false);
        assert!(result.out.is_empty());
        assert_eq!(result.err, "transh: ghost: ghost is not in the trash\n");
    }

    #[test]
    fn clear_reports_cancel_and_archive() {
        let (dir, trash) = setup();
        let path = write(&dir, "c.txt");
        exec(&trash, Action::Put(vec![path]), true);

        assert_eq!(exec(&trash, Action::Clear, false).out, "cancelled\n");
        let cleared = exec(&trash, Action::Clear, true);
        assert!(cleared.out.starts_with("archived to "));
        assert!(cleared.out.contains("removed 1 file(s) and 1 log(s)"));
    }

    #[test]
    fn backup_writes_archive() {
        let (dir, trash) = setup();
        let target = dir.path().join("bk");
        let result = exec(&trash, Action::Backup(Some(target.clone())), false);
        assert!(result.out.starts_with(&format!("archived to {}", target.display())));
    }
}
