use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::error::ErrorKind;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use transh_core::{ExitStatusLike, PromptConfirm, Trash, TrashConfig};

mod app;
mod cli;
mod render;

/// Log filter directives, e.g. `TRANSH_LOG=transh_core=debug`.
const LOG_ENV: &str = "TRANSH_LOG";

fn main() -> ExitCode {
    init_tracing();

    let action = match cli::parse(std::env::args_os()) {
        Ok(action) => action,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => exit_code(ExitStatusLike::Error),
            };
        }
    };

    let trash = match TrashConfig::from_env().and_then(Trash::open) {
        Ok(trash) => trash,
        Err(err) => {
            error!("failed to open trash: {err}");
            eprintln!("transh: {err}");
            return exit_code(ExitStatusLike::Error);
        }
    };

    let stdin = io::stdin();
    let mut confirm = PromptConfirm::new(stdin.lock(), io::stdout());
    let mut out = io::stdout().lock();
    let mut err = io::stderr().lock();

    match app::run(action, &trash, &mut out, &mut err, &mut confirm) {
        Ok(status) => {
            debug!("closing application");
            exit_code(status)
        }
        Err(fatal) => {
            error!("closing application with error: {fatal:?}");
            eprintln!("transh: {fatal}");
            exit_code(ExitStatusLike::Error)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(io::stderr().is_terminal())
                .with_writer(io::stderr),
        )
        .init();
}

fn exit_code(status: ExitStatusLike) -> ExitCode {
    ExitCode::from(status.as_code())
}
