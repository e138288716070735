use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Sample metadata, one row per sample, one column per attribute.
pub trait MetadataTable {
    /// Is `column` currently in the table's header?
    fn has_column(&self, column: &str) -> bool;
    /// Sample ids, from the first column.
    fn sample_ids(&self) -> Result<Vec<String>>;
    fn file(&self) -> &Path;
}

/// A tab-separated metadata file. Nothing is cached: every call re-reads
/// the file, so columns added by earlier modules are seen.
#[derive(Debug, Clone)]
pub struct TsvMetadata {
    file: PathBuf,
}

impl TsvMetadata {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }
}

impl MetadataTable for TsvMetadata {
    fn has_column(&self, column: &str) -> bool {
        match contract::read_header(&self.file) {
            Ok(header) => header.iter().any(|h| h == column),
            Err(e) => {
                log::debug!("can't read metadata header from {:?}: {e}", self.file);
                false
            }
        }
    }

    fn sample_ids(&self) -> Result<Vec<String>> {
        let f = std::fs::File::open(&self.file)
            .with_context(|| format!("opening metadata file {:?}", self.file))?;
        let mut ids = Vec::with_capacity(64);
        // first line is the header:
        for line in BufReader::new(f).lines().skip(1) {
            let line = line?;
            if let Some(id) = line.split('\t').next().map(str::trim) {
                if !id.is_empty() && !id.starts_with('#') {
                    ids.push(id.to_owned());
                }
            }
        }
        Ok(ids)
    }

    fn file(&self) -> &Path {
        &self.file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rereads_on_demand() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("meta.tsv");
        std::fs::write(&path, "SampleID\tAge\ns1\t3\ns2\t5\n")?;

        let table = TsvMetadata::new(&path);
        assert!(table.has_column("Age"));
        assert!(!table.has_column("BodySite"));
        assert_eq!(table.sample_ids()?, ["s1", "s2"]);

        std::fs::write(&path, "SampleID\tAge\tBodySite\ns1\t3\tgut\n\n")?;
        assert!(table.has_column("BodySite"));
        assert_eq!(table.sample_ids()?, ["s1"]);
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let table = TsvMetadata::new("/no/such/meta.tsv");
        assert!(!table.has_column("SampleID"));
        assert!(table.sample_ids().is_err());
    }
}
