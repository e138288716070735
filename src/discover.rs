use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{self, Config};
use crate::fs::{scan_status, Status, MASTER_EXT, MASTER_PREFIX, MODULE_INDEX_DELIM};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{dir:?} is not a valid pipeline: {reason}")]
    InvalidPipeline { dir: PathBuf, reason: String },
}

fn invalid(dir: &Path, reason: impl Into<String>) -> Error {
    Error::InvalidPipeline {
        dir: dir.to_path_buf(),
        reason: reason.into(),
    }
}

/// One module directory found in a pipeline root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    pub index: usize,
    pub label: String,
    pub dir: PathBuf,
    pub status: Status,
}

/// An existing pipeline directory: a root holding exactly one
/// `MASTER_<id>.properties` file, plus `<index>_<label>` module dirs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    root: PathBuf,
    id: String,
    name: String,
    master_config: PathBuf,
}

impl Pipeline {
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            return Err(invalid(dir, "directory does not exist").into());
        }
        if !dir.is_dir() {
            return Err(invalid(dir, "not a directory").into());
        }
        let root = dir
            .canonicalize()
            .with_context(|| format!("resolving pipeline dir {:?}", dir))?;

        let mut masters = Vec::with_capacity(1);
        for entry in fs::read_dir(&root).with_context(|| format!("listing {:?}", root))? {
            let path = entry?.path();
            if let Some(id) = master_id(&path) {
                masters.push((id.to_owned(), path));
            }
        }
        let (id, master_config) = match masters.len() {
            0 => return Err(invalid(dir, "no master config file").into()),
            1 => masters.remove(0),
            n => return Err(invalid(dir, format!("{n} master config files")).into()),
        };

        let text = fs::read_to_string(&master_config)
            .with_context(|| format!("reading {:?}", master_config))?;
        let name = match Config::parse(&text) {
            Ok(config) => config.pipeline_name().map(str::to_owned),
            Err(e) => {
                log::warn!("unable to parse master config {:?}: {e:#}", master_config);
                scan_pipeline_name(&text)
            }
        }
        .unwrap_or_else(|| id.clone());

        log::debug!("opened pipeline {name} (id {id}) at {:?}", root);
        Ok(Self {
            root,
            id,
            name,
            master_config,
        })
    }

    /// `None` if `dir` isn't a valid pipeline, for callers scanning
    /// directories that may hold anything.
    pub fn try_open(dir: &Path) -> Option<Self> {
        match Self::open(dir) {
            Ok(p) => Some(p),
            Err(e) => {
                log::trace!("{e:#}");
                None
            }
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn master_config(&self) -> &Path {
        &self.master_config
    }

    pub fn status(&self) -> Status {
        scan_status(&self.root)
    }

    /// Was the last run of this pipeline a precheck?
    pub fn is_precheck(&self) -> bool {
        self.status().is_precheck_terminal()
    }

    /// Is `dir` a module directory directly under this pipeline's root?
    /// Its index must be below the number of entries in the root, which
    /// rules out stray directories that happen to start with a number.
    pub fn is_module_subdirectory(&self, dir: &Path) -> bool {
        let Ok(dir) = dir.canonicalize() else {
            return false;
        };
        if !dir.is_dir() || dir.parent() != Some(self.root.as_path()) {
            return false;
        }
        match parse_module_dir_name(&dir) {
            Some((index, _)) => index < self.count_entries(),
            None => false,
        }
    }

    /// Module directories, sorted by index, with their current status.
    pub fn modules(&self) -> Result<Vec<ModuleRecord>> {
        let num_entries = self.count_entries();
        let mut modules = Vec::with_capacity(num_entries);
        for entry in fs::read_dir(&self.root).with_context(|| format!("listing {:?}", self.root))? {
            let dir = entry?.path();
            if !dir.is_dir() {
                continue;
            }
            if let Some((index, label)) = parse_module_dir_name(&dir) {
                if index < num_entries {
                    modules.push(ModuleRecord {
                        index,
                        label: label.to_owned(),
                        status: scan_status(&dir),
                        dir,
                    });
                }
            }
        }
        modules.sort_by_key(|m| m.index);
        Ok(modules)
    }

    fn count_entries(&self) -> usize {
        fs::read_dir(&self.root).map(|it| it.count()).unwrap_or(0)
    }
}

fn master_id(path: &Path) -> Option<&str> {
    if !path.is_file() || path.extension()?.to_str()? != MASTER_EXT {
        return None;
    }
    let id = path.file_stem()?.to_str()?.strip_prefix(MASTER_PREFIX)?;
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Find `pipeline.name` in config text the parser rejected.
/// Accepts `=`, `:` or whitespace as the separator, like a properties file.
fn scan_pipeline_name(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let rest = line.trim_start().strip_prefix(config::PIPELINE_NAME)?;
        let first = rest.chars().next()?;
        if first != '=' && first != ':' && !first.is_whitespace() {
            return None;
        }
        let val = rest.trim_start_matches(|c: char| c == '=' || c == ':' || c.is_whitespace());
        let val = val.trim_end();
        (!val.is_empty()).then(|| val.to_owned())
    })
}

/// `03_trim` -> `(3, "trim")`
fn parse_module_dir_name(dir: &Path) -> Option<(usize, &str)> {
    let name = dir.file_name()?.to_str()?;
    let (index, label) = name.split_once(MODULE_INDEX_DELIM)?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((index.parse().ok()?, label))
}
