use std::path::{Path, PathBuf};
use std::fs;

use anyhow::{Context, Result};

use util::PathEncodingError;

/// Utility fns
mod ops;

/// Defines fns for creating common paths in a pipeline directory
mod paths;
pub use paths::{ModuleDirs, MASTER_EXT, MASTER_PREFIX, MODULE_INDEX_DELIM};

/// Status marker files
mod status;
pub use status::{scan_status, Status};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Path is neither file nor dir: {0}")]
    UnknownPathType(String),
    #[error("Pipeline directory \"{0}\" is not a directory")]
    NotDirectory(String),
    #[error("Can't perform IO operation: \"{0}\" is not whitelisted")]
    NotWhitelisted(String),
}

/// All file operations in the crate should go through this struct.
///
/// All destructive operations check that the path in question is a child of the
/// single whitelisted prefix (the pipeline root), otherwise they will not be performed.
/// Commands run by modules can break this rule; it is up to the user
/// to make sure that they don't have unintended consequences.
#[derive(Debug)]
pub struct Fs {
    /// The pipeline directory we are allowed to modify
    root: PathBuf,
    /// if true, prevents all destructive operations
    dry_run: bool,
}

impl Fs {
    /// Create a new `Fs` rooted at the given pipeline directory.
    pub fn new(root: &Path, dry_run: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            dry_run,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check whether the pipeline dir exists, and create it if not.
    pub fn ensure_root_exists(&mut self) -> Result<()> {
        if !self.root.exists() {
            if self.dry_run {
                log::info!("Dry run. Not creating pipeline directory {:?}", self.root);
                return Ok(());
            }
            log::info!("Pipeline directory {:?} doesn't exist. Creating.", self.root);
            fs::create_dir_all(&self.root).context("creating pipeline directory")?;
        } else if !self.root.is_dir() {
            return Err(Error::NotDirectory(
                self.root.to_str().ok_or(PathEncodingError)?.to_string(),
            )
            .into());
        } else {
            log::debug!("Pipeline directory {:?} already exists.", self.root);
        }

        self.root = self.root.canonicalize()?;
        Ok(())
    }

    /// Check if path exists on disk.
    pub fn exists<T: AsRef<Path>>(&self, path: T) -> bool {
        let path = path.as_ref();
        path.exists() || path.is_symlink()
    }

    /// Create a directory (uses `std::fs::create_dir_all`, so an entire tree of dirs can be created).
    pub fn create_dir<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::create_dir_all(path).with_context(|| format!("creating dir {:?}", path))?;
        Ok(())
    }

    /// Create a file, and return a writable `File` handle.
    pub fn create_file<T: AsRef<Path>>(&self, path: T) -> Result<fs::File> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        let f = fs::File::create(path).with_context(|| format!("creating file {:?}", path))?;
        Ok(f)
    }

    /// Write entire str to a file.
    pub fn write_file<T: AsRef<Path>>(&self, path: T, text: &str) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::write(path, text).with_context(|| format!("writing file {:?}", path))?;
        Ok(())
    }

    /// Delete a file.
    pub fn delete_file<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::remove_file(path).with_context(|| format!("deleting file {:?}", path))?;
        Ok(())
    }

    /// Recursively delete a directory.
    pub fn delete_dir<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::remove_dir_all(path).with_context(|| format!("deleting dir {:?}", path))?;
        Ok(())
    }

    /// Copy `src` to `tgt`, recursively if `src` is a directory.
    /// Only `tgt` has to be inside the pipeline dir.
    pub fn copy<T: AsRef<Path>, U: AsRef<Path>>(&self, src: T, tgt: U) -> Result<()> {
        let (src, tgt) = (src.as_ref(), tgt.as_ref());
        self.check_whitelist(tgt)?;
        ops::copy(src, tgt).with_context(|| format!("copying {:?} to {:?}", src, tgt))?;
        Ok(())
    }

    /// Read entire file into a String.
    pub fn read_to_buf<T: AsRef<Path>>(&self, path: T, strbuf: &mut String) -> Result<()> {
        use std::io::Read;
        let path = path.as_ref();
        strbuf.clear();
        let cap = fs::metadata(path)?.len() as usize;
        if cap > strbuf.len() {
            strbuf.reserve(cap - strbuf.len());
        }
        let mut f = fs::File::open(path)?;
        f.read_to_string(strbuf)?;
        Ok(())
    }

    /// List the paths in a directory, sorted by name.
    /// Reading needs no whitelist; any directory can be listed.
    pub fn list_dir<T: AsRef<Path>>(&self, path: T) -> Result<Vec<PathBuf>> {
        let path = path.as_ref();
        let mut entries = Vec::with_capacity(16);
        for entry in fs::read_dir(path).with_context(|| format!("listing {:?}", path))? {
            entries.push(entry?.path());
        }
        entries.sort();
        Ok(entries)
    }

    fn is_whitelisted<T: AsRef<Path>>(&self, path: T) -> bool {
        path.as_ref().starts_with(&self.root)
    }

    fn check_whitelist(&self, path: &Path) -> Result<()> {
        if self.dry_run || !self.is_whitelisted(path) {
            Err(Error::NotWhitelisted(path.to_str().ok_or(PathEncodingError)?.to_owned()).into())
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_whitelist() -> Result<()> {
        let dir = tempdir()?;
        let mut fs = Fs::new(&dir.path().join("pipe"), false);
        fs.ensure_root_exists()?;

        fs.write_file(fs.root().join("inside"), "ok")?;
        let outside = dir.path().join("outside");
        let err = fs.write_file(&outside, "nope").unwrap_err();
        assert!(matches!(err.downcast_ref(), Some(Error::NotWhitelisted(_))));
        assert!(!outside.exists());
        Ok(())
    }

    #[test]
    fn test_dry_run_blocks_writes() -> Result<()> {
        let dir = tempdir()?;
        let fs = Fs::new(dir.path(), true);
        assert!(fs.write_file(fs.root().join("x"), "x").is_err());
        assert!(fs.create_dir(fs.root().join("d")).is_err());
        assert!(!fs.root().join("x").exists());
        Ok(())
    }

    #[test]
    fn test_list_dir_sorted() -> Result<()> {
        let dir = tempdir()?;
        let mut fs = Fs::new(dir.path(), false);
        fs.ensure_root_exists()?;
        for name in ["b", "c", "a"] {
            fs.write_file(fs.root().join(name), "")?;
        }
        let names: Vec<_> = fs
            .list_dir(fs.root())?
            .iter()
            .map(|p| p.file_name().unwrap().to_owned())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
        Ok(())
    }
}
