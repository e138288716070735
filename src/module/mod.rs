use std::path::PathBuf;

use anyhow::Result;

use contract::{InputSpecs, ModuleId, OutputSpecs, Registry};
use mount::PathMapper;
use util::HashMap;

use crate::config::{Config, ModuleDecl};
use crate::fs::{Fs, ModuleDirs};
use crate::metadata::MetadataTable;
use crate::resolve::BoundInput;

/// Runs a shell command
mod command;
pub use command::Command;

/// Brings external sequence files into the pipeline
mod import;
pub use import::ImportSeqs;

/// Halts the pipeline
mod stop;
pub use stop::Stop;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown module type \"{0}\"")]
    UnknownModuleType(String),
    #[error("Module \"{module}\" requires property \"{key}\"")]
    MissingProperty { module: String, key: String },
    #[error("Module \"{module}\" refers to \"{label}\", which is not an earlier module")]
    UnknownLabel { module: String, label: String },
    #[error("Module \"{module}\" wants {wanted} threads, but only {available} are available")]
    TooManyThreads {
        module: String,
        wanted: u32,
        available: u32,
    },
    #[error("Module \"{0}\" command failed")]
    CommandFailed(String),
}

/// Everything a module can see while it runs.
pub struct ModuleEnv<'a> {
    pub label: &'a str,
    pub dirs: &'a ModuleDirs,
    pub config: &'a Config,
    pub fs: &'a Fs,
    pub mapper: &'a PathMapper,
    pub metadata: Option<&'a dyn MetadataTable>,
    pub inputs: &'a [BoundInput],
    pub registry: &'a Registry,
    pub verbose: bool,
}

impl ModuleEnv<'_> {
    pub fn input(&self, label: &str) -> Option<&BoundInput> {
        self.inputs.iter().find(|b| b.label() == label)
    }

    /// Paths bound to input `label`; empty if it's unbound.
    pub fn input_paths(&self, label: &str) -> Vec<PathBuf> {
        self.input(label).map(|b| b.paths()).unwrap_or_default()
    }
}

/// One step of a pipeline.
///
/// Modules declare their inputs and outputs up front, so the pipeline can
/// be wired together and checked before anything runs. `cleanup` runs after
/// every `execute`, whether or not it succeeded.
pub trait Module {
    fn type_name(&self) -> &'static str;

    fn inputs(&self) -> &InputSpecs;

    fn outputs(&self) -> &OutputSpecs;

    /// Fail early if the module can't possibly run: missing properties,
    /// unavailable resources, unacceptable inputs.
    fn check_dependencies(&self, env: &ModuleEnv) -> Result<()>;

    fn execute(&self, env: &ModuleEnv) -> Result<()>;

    fn cleanup(&self, _env: &ModuleEnv) -> Result<()> {
        Ok(())
    }

    /// A stop module halts the run once it's reached.
    fn is_stop(&self) -> bool {
        false
    }
}

/// Build the module declared by `decl`, at position `id`.
/// `earlier` maps the labels of modules before it to their ids.
pub fn create(
    decl: &ModuleDecl,
    id: ModuleId,
    config: &Config,
    earlier: &HashMap<String, ModuleId>,
) -> Result<Box<dyn Module>> {
    let module: Box<dyn Module> = match decl.ty.as_str() {
        Command::TYPE => Box::new(Command::new(&decl.label, id, config, earlier)?),
        ImportSeqs::TYPE => Box::new(ImportSeqs::new(&decl.label, id, config)?),
        Stop::TYPE => Box::new(Stop::default()),
        other => return Err(Error::UnknownModuleType(other.to_owned()).into()),
    };
    Ok(module)
}

/// `LOCKSTEP_INPUT_<LABEL>`, with anything but ascii alphanumerics replaced.
pub fn input_env_var(label: &str) -> String {
    let label: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("LOCKSTEP_INPUT_{label}")
}
