use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use syntax::ast::Item;
use util::{HashMap, HashSet};

use crate::fs::Fs;

/// Name of the pipeline; also its directory name.
pub const PIPELINE_NAME: &str = "pipeline.name";
/// Comma-separated external input paths.
pub const INPUT_PATHS: &str = "input.paths";
/// Tab-separated sample metadata table.
pub const METADATA_FILE: &str = "metadata.file";
pub const DOCKER_ENABLED: &str = "docker.enabled";
pub const DOCKER_RUNTIME: &str = "docker.runtime";
pub const DOCKER_CONTAINER_ID: &str = "docker.containerId";
pub const DOCKER_PIPELINE_MOUNT: &str = "docker.pipelineMount";

/// Properties that hold host paths, relative to the config file's dir.
const PATH_PROPERTIES: [&str; 2] = [INPUT_PATHS, METADATA_FILE];

const LIST_DELIM: char = ',';

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Module label \"{0}\" is used more than once")]
    DuplicateLabel(String),
    #[error("Property \"{key}\" has value \"{val}\"; expected {expected}")]
    InvalidValue {
        key: String,
        val: String,
        expected: &'static str,
    },
    #[error("Pipeline config declares no modules")]
    NoModules,
}

/// A `#Module Type [AS label]` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDecl {
    pub ty: String,
    /// Defaults to the type name.
    pub label: String,
}

/// Parsed pipeline config: module directives plus a flat property table.
///
/// Later assignments to the same key win. Key order is kept so the
/// master config snapshot reads like the file it came from.
#[derive(Debug, Clone, Default)]
pub struct Config {
    props: HashMap<String, String>,
    order: Vec<String>,
    modules: Vec<ModuleDecl>,
}

impl Config {
    /// Read and parse the config file at `path`.
    pub fn load(fs: &Fs, path: &Path) -> Result<Self> {
        let mut text = String::with_capacity(0);
        fs.read_to_buf(path, &mut text)
            .with_context(|| format!("while reading config file {:?}", path))?;
        Self::parse(&text).with_context(|| format!("while parsing config file {:?}", path))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let items = syntax::parse(text)?;
        let mut config = Self::default();
        let mut labels = HashSet::default();
        for item in items {
            match item {
                Item::Module { ty, label } => {
                    let label = label.unwrap_or(ty);
                    if !labels.insert(label.to_owned()) {
                        return Err(Error::DuplicateLabel(label.to_owned()).into());
                    }
                    config.modules.push(ModuleDecl {
                        ty: ty.to_owned(),
                        label: label.to_owned(),
                    });
                }
                Item::Property { key, val } => config.set(key, val),
            }
        }
        log::debug!(
            "config has {} modules and {} properties",
            config.modules.len(),
            config.order.len()
        );
        Ok(config)
    }

    pub fn modules(&self) -> &[ModuleDecl] {
        &self.modules
    }

    pub fn ensure_has_modules(&self) -> Result<(), Error> {
        if self.modules.is_empty() {
            Err(Error::NoModules)
        } else {
            Ok(())
        }
    }

    pub fn set(&mut self, key: &str, val: &str) {
        if self.props.insert(key.to_owned(), val.to_owned()).is_none() {
            self.order.push(key.to_owned());
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(|s| s.as_str())
    }

    /// Look up `<label>.<key>`.
    pub fn get_module_str(&self, label: &str, key: &str) -> Option<&str> {
        self.get_str(&format!("{label}.{key}"))
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, Error> {
        match self.get_str(key) {
            None => Ok(None),
            Some(val) => match val.to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Ok(Some(true)),
                "false" | "no" | "n" | "0" => Ok(Some(false)),
                _ => Err(self.invalid(key, val, "true or false")),
            },
        }
    }

    pub fn get_u32(&self, key: &str) -> Result<Option<u32>, Error> {
        match self.get_str(key) {
            None => Ok(None),
            Some(val) => val
                .parse()
                .map(Some)
                .map_err(|_| self.invalid(key, val, "a non-negative integer")),
        }
    }

    /// Comma-separated values, trimmed, empty entries dropped.
    pub fn get_list(&self, key: &str) -> Vec<&str> {
        match self.get_str(key) {
            None => Vec::with_capacity(0),
            Some(val) => val
                .split(LIST_DELIM)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get_str(key).map(PathBuf::from)
    }

    pub fn pipeline_name(&self) -> Option<&str> {
        self.get_str(PIPELINE_NAME)
    }

    /// Rewrite relative path properties as paths under `base`.
    pub fn absolutize_paths(&mut self, base: &Path) {
        for key in PATH_PROPERTIES {
            let Some(val) = self.get_str(key) else {
                continue;
            };
            let joined: Vec<String> = val
                .split(LIST_DELIM)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|p| {
                    let p = Path::new(p);
                    if p.is_absolute() {
                        p.display().to_string()
                    } else {
                        base.join(p).display().to_string()
                    }
                })
                .collect();
            let joined = joined.join(&LIST_DELIM.to_string());
            self.set(key, &joined);
        }
    }

    /// Serialize as a config file that parses back to an equal `Config`.
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(64 * (self.modules.len() + self.order.len()));
        for m in &self.modules {
            if m.label == m.ty {
                let _ = writeln!(text, "{} {}", syntax::MODULE_DIRECTIVE, m.ty);
            } else {
                let _ = writeln!(
                    text,
                    "{} {} {} {}",
                    syntax::MODULE_DIRECTIVE,
                    m.ty,
                    syntax::LABEL_KEYWORD,
                    m.label
                );
            }
        }
        for key in &self.order {
            if let Some(val) = self.props.get(key) {
                let _ = writeln!(text, "{key}={val}");
            }
        }
        text
    }

    fn invalid(&self, key: &str, val: &str, expected: &'static str) -> Error {
        Error::InvalidValue {
            key: key.to_owned(),
            val: val.to_owned(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "\
# demo pipeline
pipeline.name=demo
input.paths = reads, /abs/other
#Module ImportSeqs AS import
import.seqKind: fastq
#Module Command AS count
count.command=wc -l $LOCKSTEP_INPUT_INPUT > counts.tsv
count.numThreads=4
check.min_threads=false
";

    #[test]
    fn test_parse_config() -> Result<()> {
        let config = Config::parse(TEXT)?;
        assert_eq!(
            config.modules(),
            &[
                ModuleDecl {
                    ty: "ImportSeqs".into(),
                    label: "import".into()
                },
                ModuleDecl {
                    ty: "Command".into(),
                    label: "count".into()
                },
            ]
        );
        assert_eq!(config.pipeline_name(), Some("demo"));
        assert_eq!(config.get_module_str("import", "seqKind"), Some("fastq"));
        assert_eq!(config.get_u32("count.numThreads")?, Some(4));
        assert_eq!(config.get_bool("check.min_threads")?, Some(false));
        assert_eq!(config.get_list(INPUT_PATHS), ["reads", "/abs/other"]);
        Ok(())
    }

    #[test]
    fn test_duplicate_labels() {
        let err = Config::parse("#Module Stop\n#Module Stop\n").unwrap_err();
        assert!(matches!(err.downcast_ref(), Some(Error::DuplicateLabel(l)) if l == "Stop"));
        assert!(Config::parse("#Module Stop\n#Module Stop AS stop2\n").is_ok());
    }

    #[test]
    fn test_bad_values() -> Result<()> {
        let config = Config::parse("a=maybe\nb=-3\n")?;
        assert!(config.get_bool("a").is_err());
        assert!(config.get_u32("b").is_err());
        assert_eq!(config.get_bool("missing")?, None);
        Ok(())
    }

    #[test]
    fn test_absolutize_paths() -> Result<()> {
        let mut config = Config::parse(TEXT)?;
        config.absolutize_paths(Path::new("/work"));
        assert_eq!(config.get_list(INPUT_PATHS), ["/work/reads", "/abs/other"]);
        Ok(())
    }

    #[test]
    fn test_to_text_reparses() -> Result<()> {
        let config = Config::parse(TEXT)?;
        let again = Config::parse(&config.to_text())?;
        assert_eq!(again.modules(), config.modules());
        assert_eq!(again.order, config.order);
        assert_eq!(again.props, config.props);
        Ok(())
    }
}
