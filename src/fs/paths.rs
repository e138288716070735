use std::path::{Path, PathBuf};

use super::Fs;

/// Master config file name: MASTER_<id>.properties
pub const MASTER_PREFIX: &str = "MASTER_";
pub const MASTER_EXT: &str = "properties";

/// Separates a module's index from its label in its directory name.
pub const MODULE_INDEX_DELIM: char = '_';

const OUTPUT_DIR: &str = "output";
const LOG_DIR: &str = "log";
const TEMP_DIR: &str = "temp";

/// The directories owned by one module.
/// These never change for the life of a pipeline, so status markers
/// and outputs can always be found again on restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDirs {
    /// $PIPELINE/01_label
    pub root: PathBuf,
    /// $PIPELINE/01_label/output
    pub output: PathBuf,
    /// $PIPELINE/01_label/log
    pub log: PathBuf,
    /// $PIPELINE/01_label/temp
    pub temp: PathBuf,
}

impl ModuleDirs {
    /// Dirs for a module directory that already exists (or will).
    pub fn at(root: PathBuf) -> Self {
        Self {
            output: root.join(OUTPUT_DIR),
            log: root.join(LOG_DIR),
            temp: root.join(TEMP_DIR),
            root,
        }
    }
}

/// Utility fns for making common types of paths.
impl Fs {
    /// $PIPELINE/MASTER_<id>.properties
    pub fn master_config(&self, id: &str) -> PathBuf {
        self.root.join(master_file_name(id))
    }

    /// $PIPELINE/<index>_<label>, index zero-padded to two digits.
    pub fn module_dirs(&self, index: usize, label: &str) -> ModuleDirs {
        ModuleDirs::at(self.root.join(module_dir_name(index, label)))
    }

    /// $DIR/<marker>
    pub fn marker(&self, dir: &Path, marker: &str) -> PathBuf {
        parts2(dir, marker)
    }

    /// $PIPELINE/01_label/log/stdout.txt
    pub fn stdout(&self, dirs: &ModuleDirs) -> PathBuf {
        parts2(&dirs.log, "stdout.txt")
    }

    /// $PIPELINE/01_label/log/stderr.txt
    pub fn stderr(&self, dirs: &ModuleDirs) -> PathBuf {
        parts2(&dirs.log, "stderr.txt")
    }
}

fn master_file_name(id: &str) -> String {
    format!("{MASTER_PREFIX}{id}.{MASTER_EXT}")
}

fn module_dir_name(index: usize, label: &str) -> String {
    format!("{index:02}{MODULE_INDEX_DELIM}{label}")
}

fn parts2<T, U>(p1: T, p2: U) -> PathBuf
where
    T: AsRef<Path>,
    U: AsRef<Path>,
{
    let mut buf = PathBuf::with_capacity(128);
    buf.push(p1);
    buf.push(p2);
    buf
}
