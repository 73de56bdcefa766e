use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{CommandFactory, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::{Config, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(name = "yeah-build")]
#[command(author, version, about = "Build many projects from one configuration file", long_about = None)]
pub struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = DEFAULT_CONFIG_PATH,
        help = "Configuration file"
    )]
    pub config: PathBuf,

    #[arg(long, help = "Build every enabled project without the interactive view")]
    pub no_interactive: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Write an example configuration file")]
    Init {
        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
}

impl Cli {
    /// Parses the process arguments. An argument clap rejects (an unknown
    /// flag, an option missing its value) is dropped and the rest are parsed
    /// again, so valid flags around it still apply. `--help` and `--version`
    /// still exit.
    pub fn parse_lenient() -> Self {
        Self::parse_lenient_from(std::env::args_os())
    }

    pub fn parse_lenient_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();

        loop {
            match Self::try_parse_from(args.iter().cloned()) {
                Ok(cli) => return cli,
                Err(err)
                    if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) =>
                {
                    err.exit()
                }
                Err(err) => match rejected_index(&err, &args) {
                    Some(index) => {
                        args.remove(index);
                    }
                    None => return Self::default(),
                },
            }
        }
    }

    pub fn config_path(&self) -> PathBuf {
        Config::expand_path(&self.config.to_string_lossy())
    }
}

/// Position of the argument a parse error points at, never the program name.
fn rejected_index(err: &clap::Error, args: &[OsString]) -> Option<usize> {
    let rejected = [ContextKind::InvalidArg, ContextKind::InvalidSubcommand]
        .into_iter()
        .find_map(|kind| match err.get(kind) {
            Some(ContextValue::String(value)) => Some(value.clone()),
            _ => None,
        })?;

    // Options missing a value are reported as `--config <FILE>`.
    let flag = rejected.split_whitespace().next()?;
    let spellings = spellings(flag);

    args.iter()
        .enumerate()
        .skip(1)
        .rev()
        .find(|(_, arg)| {
            let arg = arg.to_string_lossy();
            spellings
                .iter()
                .any(|s| arg == s.as_str() || arg.starts_with(&format!("{}=", s)))
        })
        .map(|(index, _)| index)
}

/// Every way `flag` can be written on the command line.
fn spellings(flag: &str) -> Vec<String> {
    let mut names = vec![flag.to_string()];
    let command = Cli::command();

    for arg in command.get_arguments() {
        let long = arg.get_long().map(|l| format!("--{}", l));
        let short = arg.get_short().map(|c| format!("-{}", c));
        if long.as_deref() == Some(flag) || short.as_deref() == Some(flag) {
            names.extend(long.into_iter().chain(short).filter(|n| n != flag));
        }
    }

    names
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            no_interactive: false,
            command: None,
        }
    }
}
