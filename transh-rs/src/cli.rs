use std::ffi::OsString;
use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use transh_core::CommandKind;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Action {
    Put(Vec<PathBuf>),
    List,
    Clear,
    Restore(Vec<String>),
    Delete(Vec<String>),
    Backup(Option<PathBuf>),
}

impl Action {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Put(_) => CommandKind::Put,
            Self::List => CommandKind::List,
            Self::Clear => CommandKind::Clear,
            Self::Restore(_) => CommandKind::Restore,
            Self::Delete(_) => CommandKind::Delete,
            Self::Backup(_) => CommandKind::Backup,
        }
    }
}

pub fn cli() -> Command {
    Command::new("transh")
        .about("transh - move files into a holding area instead of deleting them")
        .version(env!("CARGO_PKG_VERSION"))
        .args([
            Arg::new("put")
                .short('p')
                .long("put")
                .num_args(1..)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("move the given files into the trash"),
            Arg::new("list")
                .short('l')
                .long("list")
                .action(ArgAction::SetTrue)
                .help("list files currently in the trash"),
            Arg::new("clear")
                .short('c')
                .long("clear")
                .action(ArgAction::SetTrue)
                .help("archive and empty the trash"),
            Arg::new("restore")
                .short('r')
                .long("restore")
                .num_args(1..)
                .value_name("HELD_NAME")
                .help("move held files back to where they came from"),
            Arg::new("delete")
                .short('d')
                .long("delete")
                .num_args(1..)
                .value_name("HELD_NAME")
                .help("permanently delete held files"),
            Arg::new("backup")
                .short('b')
                .long("backup")
                .num_args(0..=1)
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("archive the trash into DIR (default: the backup directory)"),
        ])
        .group(
            ArgGroup::new("command")
                .args(["put", "list", "clear", "restore", "delete", "backup"])
                .required(true),
        )
}

/// Parses process arguments. The bare word `restore` is accepted in place of `-r`.
pub fn parse<I, T>(args: I) -> Result<Action, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.get(1).is_some_and(|arg| arg == "restore") {
        args[1] = OsString::from("--restore");
    }

    let matches = cli().try_get_matches_from(args)?;
    Ok(map_matches(&matches))
}

fn map_matches(args: &ArgMatches) -> Action {
    if let Some(paths) = args.get_many::<PathBuf>("put") {
        Action::Put(paths.cloned().collect())
    } else if let Some(names) = args.get_many::<String>("restore") {
        Action::Restore(names.cloned().collect())
    } else if let Some(names) = args.get_many::<String>("delete") {
        Action::Delete(names.cloned().collect())
    } else if args.contains_id("backup") {
        Action::Backup(args.get_one::<PathBuf>("backup").cloned())
    } else if args.get_flag("clear") {
        Action::Clear
    } else {
        Action::List
    }
}
