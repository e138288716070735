use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::args::Args;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Config file {0:?} does not exist")]
    ConfigNotFound(PathBuf),
    #[error("Invalid config path has no parent (should not happen)")]
    ConfigHasNoParent,
    #[error("--restart and --status can't be used together")]
    ConflictingModes,
}

/// What the app was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Create a new pipeline from the config file and run it.
    Run,
    /// Resume an existing pipeline.
    Restart(PathBuf),
    /// Report on an existing pipeline.
    Status(PathBuf),
}

/// Settings are like Args, except all the logic has
/// been applied so e.g. defaults are added in.
#[derive(Debug)]
pub struct Settings {
    pub mode: Mode,
    pub config: PathBuf,
    pub pipelines: PathBuf,
    pub precheck: bool,
    pub docker: bool,
    pub yes: bool,
    pub verbose: u8,
    pub dry_run: bool,
}

impl Settings {
    /// Get canonicalized parent dir of config file:
    pub fn config_parent_dir(&self) -> Result<&Path, Error> {
        let parent_dir = self.config.parent().ok_or(Error::ConfigHasNoParent)?;
        Ok(parent_dir)
    }
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let mode = match (args.restart, args.status) {
            (Some(_), Some(_)) => return Err(Error::ConflictingModes.into()),
            (Some(dir), None) => Mode::Restart(PathBuf::from(dir)),
            (None, Some(dir)) => Mode::Status(PathBuf::from(dir)),
            (None, None) => Mode::Run,
        };

        // only a new run reads the config file; restarts use the master config.
        let mut config = PathBuf::from(&args.config);
        if config.exists() {
            config = config.canonicalize()?;
        } else if mode == Mode::Run {
            return Err(Error::ConfigNotFound(config).into());
        }

        let mut pipelines = PathBuf::from(&args.pipelines);
        if pipelines.exists() {
            pipelines = pipelines.canonicalize()?;
        } else if pipelines.is_relative() {
            pipelines = std::env::current_dir()?.join(pipelines);
        }

        Ok(Self {
            mode,
            config,
            pipelines,
            precheck: args.precheck,
            docker: args.docker,
            yes: args.yes,
            verbose: args.verbose,
            dry_run: args.dry_run,
        })
    }
}
