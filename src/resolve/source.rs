use std::fmt;
use std::path::PathBuf;

use contract::{DataUnit, ModuleId, ModuleInput};

use crate::fs::Fs;

use super::Error;

/// A single provider of data for an input slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// The output `output` of an earlier module in this pipeline.
    Module {
        id: ModuleId,
        output: String,
        module_dir: PathBuf,
        output_dir: PathBuf,
    },
    /// A file supplied from outside the pipeline.
    Path(PathBuf),
    /// A column of the sample metadata table.
    MetadataColumn { column: String, table: PathBuf },
}

impl InputSource {
    /// Can a module consume this source right now?
    /// Checked against disk every call.
    pub fn is_ready(&self, fs: &Fs) -> bool {
        match self {
            Self::Module { module_dir, .. } => fs.status(module_dir).is_complete(),
            Self::Path(path) => fs.exists(path),
            Self::MetadataColumn { column, table } => {
                DataUnit::metadata_column(column.as_str(), table.as_path()).is_valid()
            }
        }
    }

    /// Paths a consuming module should read.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Module { output_dir, .. } => output_dir,
            Self::Path(path) => path,
            Self::MetadataColumn { table, .. } => table,
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module { id, output, .. } => write!(f, "output \"{output}\" of module {id}"),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::MetadataColumn { column, .. } => write!(f, "metadata column \"{column}\""),
        }
    }
}

/// An input slot together with the sources bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundInput {
    label: String,
    multiple: bool,
    sources: Vec<InputSource>,
}

impl BoundInput {
    pub fn new(input: &ModuleInput) -> Self {
        Self {
            label: input.label().to_owned(),
            multiple: input.is_multiple(),
            sources: Vec::with_capacity(1),
        }
    }

    pub fn bind(&mut self, source: InputSource) -> Result<(), Error> {
        if !self.multiple && !self.sources.is_empty() {
            return Err(Error::AlreadyBound(self.label.clone()));
        }
        self.sources.push(source);
        Ok(())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn sources(&self) -> &[InputSource] {
        &self.sources
    }

    pub fn is_bound(&self) -> bool {
        !self.sources.is_empty()
    }

    /// True if every bound source is ready; an unbound slot is trivially ready.
    pub fn is_ready(&self, fs: &Fs) -> bool {
        self.sources.iter().all(|s| s.is_ready(fs))
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|s| s.path().clone()).collect()
    }
}
