use std::path::PathBuf;

use anyhow::{Context, Result};

use contract::{DataKind, DataUnit, ModuleId, ModuleInput, Registry};
use util::IdVec;

use crate::context::ModuleEntry;
use crate::discover::Pipeline;
use crate::fs::{Fs, ModuleDirs, Status};
use crate::metadata::MetadataTable;

/// Where a bound input gets its data
mod source;
pub use source::{BoundInput, InputSource};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Module \"{module}\" has no source for required input \"{input}\"")]
    UnresolvedInput { module: String, input: String },
    #[error("Input \"{0}\" accepts a single source and is already bound")]
    AlreadyBound(String),
    #[error("Input \"{input}\" of module \"{module}\" is not ready: {pending}")]
    NotReady {
        module: String,
        input: String,
        pending: String,
    },
}

/// Finds a source for every input slot of a module.
///
/// Candidates are tried in this order, and the first stage that yields a
/// match supplies the binding. A slot accepting multiple sources takes all
/// of that stage's matches. A single slot takes the nearest earlier output,
/// but fails with `AlreadyBound` if external paths offer more than one file:
/// 1. outputs of earlier modules, nearest first;
/// 2. externally supplied paths;
/// 3. columns of the metadata table.
pub struct Resolver<'a> {
    modules: &'a IdVec<ModuleId, ModuleEntry>,
    external: &'a [PathBuf],
    metadata: Option<&'a dyn MetadataTable>,
    registry: &'a Registry,
    fs: &'a Fs,
}

impl<'a> Resolver<'a> {
    pub fn new(
        modules: &'a IdVec<ModuleId, ModuleEntry>,
        external: &'a [PathBuf],
        metadata: Option<&'a dyn MetadataTable>,
        registry: &'a Registry,
        fs: &'a Fs,
    ) -> Self {
        Self {
            modules,
            external,
            metadata,
            registry,
            fs,
        }
    }

    /// Bind every declared input of module `id`.
    pub fn resolve(&self, id: ModuleId) -> Result<Vec<BoundInput>> {
        let entry = self
            .modules
            .get(id)
            .ok_or_else(|| anyhow::anyhow!("no module with id {id}"))?;

        let mut bindings = Vec::with_capacity(entry.module.inputs().len());
        for input in entry.module.inputs() {
            let mut bound = BoundInput::new(input);
            let sources = self.find_sources(id, input)?;

            if sources.is_empty() {
                if input.is_required() {
                    return Err(Error::UnresolvedInput {
                        module: entry.label.clone(),
                        input: input.label().to_owned(),
                    }
                    .into());
                }
                log::info!(
                    "{}: optional input \"{}\" has no source; leaving it unbound",
                    entry.label,
                    input.label()
                );
            }

            // earlier modules already yield only the nearest match for a
            // single slot, so a second source here is a genuine conflict.
            for source in sources {
                log::debug!("{}: binding \"{}\" to {}", entry.label, input.label(), source);
                bound.bind(source).with_context(|| {
                    format!("while binding inputs of module \"{}\"", entry.label)
                })?;
            }
            bindings.push(bound);
        }
        Ok(bindings)
    }

    fn find_sources(&self, id: ModuleId, input: &ModuleInput) -> Result<Vec<InputSource>> {
        let from_modules = self.from_earlier_modules(id, input);
        if !from_modules.is_empty() {
            return Ok(from_modules);
        }
        let from_paths = self.from_external_paths(input)?;
        if !from_paths.is_empty() {
            return Ok(from_paths);
        }
        Ok(self.from_metadata(input))
    }

    fn from_earlier_modules(&self, id: ModuleId, input: &ModuleInput) -> Vec<InputSource> {
        let mut sources = Vec::with_capacity(2);
        for (earlier_id, earlier) in self.modules.before_rev(id) {
            for output in earlier.module.outputs() {
                let unit = output.template().at_dir(&earlier.dirs.output);
                if input.accepts(&unit) {
                    sources.push(InputSource::Module {
                        id: earlier_id,
                        output: output.label().to_owned(),
                        module_dir: earlier.dirs.root.clone(),
                        output_dir: earlier.dirs.output.clone(),
                    });
                    if !input.is_multiple() {
                        return sources;
                    }
                }
            }
        }
        sources
    }

    fn from_external_paths(&self, input: &ModuleInput) -> Result<Vec<InputSource>> {
        if self.external.is_empty() {
            return Ok(Vec::with_capacity(0));
        }
        let candidates = expand_paths(self.external, self.fs)?;
        let units = self.registry.classify(&candidates, input.template(), false)?;

        let mut sources = Vec::with_capacity(units.len());
        for unit in units.iter().filter(|u| input.accepts(u)) {
            for file in unit.files()? {
                sources.push(InputSource::Path(file));
            }
        }
        Ok(sources)
    }

    fn from_metadata(&self, input: &ModuleInput) -> Vec<InputSource> {
        let (DataKind::MetadataColumn(column), Some(table)) =
            (input.template().kind(), self.metadata)
        else {
            return Vec::with_capacity(0);
        };
        let unit = DataUnit::metadata_column(column.as_str(), table.file());
        if table.has_column(column) && input.accepts(&unit) {
            vec![InputSource::MetadataColumn {
                column: column.clone(),
                table: table.file().to_path_buf(),
            }]
        } else {
            Vec::with_capacity(0)
        }
    }
}

/// Turn the configured external paths into a flat list of candidates.
/// A plain directory contributes its entries; a directory holding a
/// previous pipeline contributes the outputs of its complete modules.
fn expand_paths(paths: &[PathBuf], fs: &Fs) -> Result<Vec<PathBuf>> {
    let mut expanded = Vec::with_capacity(paths.len() * 4);
    for path in paths {
        if !path.is_dir() {
            expanded.push(path.clone());
        } else if let Some(pipeline) = Pipeline::try_open(path) {
            log::debug!("using outputs of earlier pipeline {}", pipeline.name());
            for module in pipeline.modules()? {
                let output = ModuleDirs::at(module.dir).output;
                if module.status == Status::Complete && output.is_dir() {
                    expanded.append(&mut fs.list_dir(&output)?);
                }
            }
        } else {
            expanded.append(&mut fs.list_dir(path)?);
        }
    }
    Ok(expanded)
}

/// Check that every source bound to `bindings` is ready, right before
/// module `module` executes.
pub fn check_ready(module: &str, bindings: &[BoundInput], fs: &Fs) -> Result<(), Error> {
    for bound in bindings {
        if let Some(source) = bound.sources().iter().find(|s| !s.is_ready(fs)) {
            return Err(Error::NotReady {
                module: module.to_owned(),
                input: bound.label().to_owned(),
                pending: source.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
