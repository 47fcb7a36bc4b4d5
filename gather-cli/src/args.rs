use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::AppError;
use crate::manifest::MANIFEST_FILE_NAME;

// Styling borrowed from https://github.com/crate-ci/clap-cargo/blob/0378657ffdf2b67bcd6f1ab56e04a1322b92dd0e/src/style.rs
use anstyle::AnsiColor::*;
use anstyle::Effects;
use anstyle::Style;

const HEADER: Style = Green.on_default().effects(Effects::BOLD);
const USAGE: Style = Green.on_default().effects(Effects::BOLD);
const LITERAL: Style = Cyan.on_default().effects(Effects::BOLD);
const PLACEHOLDER: Style = Cyan.on_default();
const ERROR: Style = Red.on_default().effects(Effects::BOLD);
const VALID: Style = Cyan.on_default().effects(Effects::BOLD);
const INVALID: Style = Yellow.on_default().effects(Effects::BOLD);

const APP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(HEADER)
    .usage(USAGE)
    .literal(LITERAL)
    .placeholder(PLACEHOLDER)
    .error(ERROR)
    .valid(VALID)
    .invalid(INVALID);

const MANIFEST_ENV: &str = "GATHER_MANIFEST";

#[derive(Debug, Parser)]
#[command(name = "gather")]
#[command(version)]
#[command(about = "Gather git repositories, HTTP(S) resources and local paths into a destination")]
#[command(long_about = None)]
#[command(styles = APP_STYLING)]
#[command(term_width = 80)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level. `RUST_LOG` takes precedence when set.
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Gather a single source into a destination
    Get {
        /// Git remote, HTTP(S) URL or local path. Prefix with `git::`, `http::` or `file::` to
        /// force the transport.
        source: String,

        /// Where to put the gathered content
        destination: PathBuf,

        /// Fail if the destination already exists
        #[arg(long)]
        no_clobber: bool,

        /// Print the gathered metadata in this format instead of a summary
        #[arg(long, short = 'f', value_enum, value_name = "FORMAT")]
        format: Option<OutputFormat>,
    },
    /// Print the transport each input would be gathered with
    Classify {
        /// Inputs to classify
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Gather every source listed in a manifest
    Sync {
        /// Path to the manifest. If not given, check the `GATHER_MANIFEST` environment variable and
        /// then search for `Gather.toml` in the current and parent directories.
        #[arg(long, short = 'm', value_name = "PATH")]
        manifest: Option<PathBuf>,

        /// Directory that relative destinations are resolved against. Defaults to the current
        /// directory.
        #[arg(long, short = 'o', value_name = "PATH")]
        out_dir: Option<PathBuf>,

        /// Skip entries whose destination already exists, reporting them as failures
        #[arg(long)]
        no_clobber: bool,

        /// Print the gathered metadata in this format instead of a summary
        #[arg(long, short = 'f', value_enum, value_name = "FORMAT")]
        format: Option<OutputFormat>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Output in JSON format
    Json,
    /// Output in TOML format
    Toml,
}

/// Thin wrapper around log levels for clap
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    }
}

#[derive(Debug)]
pub struct ValidatedArgs {
    pub command: ValidatedCommand,
    pub log_level: LogLevel,
}

#[derive(Debug)]
pub enum ValidatedCommand {
    Get {
        source: String,
        destination: PathBuf,
        no_clobber: bool,
        format: Option<OutputFormat>,
    },
    Classify {
        inputs: Vec<String>,
    },
    Sync {
        manifest: PathBuf,
        out_dir: PathBuf,
        no_clobber: bool,
        format: Option<OutputFormat>,
    },
}

impl ValidatedArgs {
    fn detect_out_dir(arg: Option<PathBuf>) -> Result<PathBuf, AppError> {
        match arg {
            Some(dir) if !dir.is_dir() => Err(AppError::arg_validation(format!(
                "output directory does not exist: {}",
                dir.display()
            ))),
            Some(dir) => Ok(dir.canonicalize()?),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Detect the manifest, falling back to `GATHER_MANIFEST` then a `Gather.toml` in the current
    /// or a parent directory.
    fn detect_manifest(arg: Option<PathBuf>) -> Result<PathBuf, AppError> {
        if let Some(path) = arg.or_else(|| std::env::var_os(MANIFEST_ENV).map(PathBuf::from)) {
            return Ok(path);
        }
        let mut current_dir = std::env::current_dir()?;
        loop {
            let manifest = current_dir.join(MANIFEST_FILE_NAME);
            if manifest.is_file() {
                break Ok(manifest);
            }
            if !current_dir.pop() {
                return Err(AppError::arg_validation(format!(
                    "could not find '{MANIFEST_FILE_NAME}' in the current directory or any parent directory"
                )));
            }
        }
    }
}

impl TryFrom<Command> for ValidatedCommand {
    type Error = AppError;

    fn try_from(command: Command) -> Result<Self, Self::Error> {
        match command {
            Command::Get {
                source,
                destination,
                no_clobber,
                format,
            } => Ok(ValidatedCommand::Get {
                source,
                destination,
                no_clobber,
                format,
            }),
            Command::Classify { inputs } => Ok(ValidatedCommand::Classify { inputs }),
            Command::Sync {
                manifest,
                out_dir,
                no_clobber,
                format,
            } => Ok(ValidatedCommand::Sync {
                manifest: ValidatedArgs::detect_manifest(manifest)?,
                out_dir: ValidatedArgs::detect_out_dir(out_dir)?,
                no_clobber,
                format,
            }),
        }
    }
}

pub fn parse() -> Result<ValidatedArgs, AppError> {
    let args = Args::parse();
    Ok(ValidatedArgs {
        command: ValidatedCommand::try_from(args.command)?,
        log_level: args.log_level,
    })
}
