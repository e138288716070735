use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::{DataKind, Error, ModuleId};

// sample_R1.fastq.gz, sample_1.fq, sample_R2_001.fastq ...
static MATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)_R?([12])(_001)?\.(fastq|fq|fasta|fa|fna)(\.gz)?$")
        .expect("valid mate pattern")
});

/// Where a unit's data lives, if anywhere yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backing {
    /// The producing step hasn't run; nothing to inspect.
    Pending,
    /// A directory holding (possibly many) instances of this kind.
    Dir(PathBuf),
    /// A concrete set of files making up exactly one instance.
    Files(Vec<PathBuf>),
    /// The metadata table a column unit lives in.
    Table(PathBuf),
}

/// A typed description of a data product, which may not exist yet.
///
/// Constructors never touch the filesystem. Anything that needs the data
/// (`files`, `iterate`, `is_valid`) looks at disk at call time, so a unit
/// built before its producer runs gives correct answers afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUnit {
    kind: DataKind,
    description: String,
    producer: Option<ModuleId>,
    backing: Backing,
}

impl DataUnit {
    /// A template for data that doesn't exist yet.
    pub fn template(kind: DataKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            producer: None,
            backing: Backing::Pending,
        }
    }

    /// A unit for a column of the metadata table at `table`.
    pub fn metadata_column(column: impl Into<String>, table: impl Into<PathBuf>) -> Self {
        let column = column.into();
        let description = format!("metadata column \"{column}\"");
        Self {
            kind: DataKind::MetadataColumn(column),
            description,
            producer: None,
            backing: Backing::Table(table.into()),
        }
    }

    pub fn produced_by(mut self, module: ModuleId) -> Self {
        self.producer = Some(module);
        self
    }

    /// Same unit, now backed by the directory its producer writes to.
    pub fn at_dir(&self, dir: impl Into<PathBuf>) -> Self {
        Self {
            backing: Backing::Dir(dir.into()),
            ..self.clone()
        }
    }

    /// Same kind and provenance, backed by exactly these files.
    pub fn with_files(&self, files: Vec<PathBuf>) -> Self {
        Self {
            backing: Backing::Files(files),
            ..self.clone()
        }
    }

    pub fn kind(&self) -> &DataKind {
        &self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn producer(&self) -> Option<ModuleId> {
        self.producer
    }

    pub fn backing(&self) -> &Backing {
        &self.backing
    }

    /// Can the backing data be inspected?
    pub fn is_ready(&self) -> bool {
        !matches!(self.backing, Backing::Pending)
    }

    pub fn is_iterable(&self) -> bool {
        self.kind.is_iterable()
    }

    /// True if `path`'s file name passes this unit's name filter.
    pub fn accepts_name(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| self.kind.matches_name(name))
            .unwrap_or(false)
    }

    /// The files backing this unit.
    ///
    /// An iterable unit backed by a whole directory must be iterated first,
    /// since the directory may hold many instances and unrelated files.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        match &self.backing {
            Backing::Pending => Err(Error::NotReady(self.description.clone()).into()),
            Backing::Dir(_) if self.is_iterable() => {
                Err(Error::MustIterate(self.description.clone()).into())
            }
            Backing::Dir(dir) => self.matching_files(dir),
            Backing::Files(files) => Ok(files.clone()),
            Backing::Table(table) => Ok(vec![table.clone()]),
        }
    }

    /// Split this unit into the instances it stands for.
    ///
    /// Non-iterable kinds just yield themselves. Iterable kinds backed by a
    /// directory yield one unit per matching file, or per mate pair for paired
    /// sequence kinds; files that fail the name filter are ignored.
    pub fn iterate(&self) -> Result<Vec<DataUnit>> {
        if !self.is_ready() {
            return Err(Error::NotReady(self.description.clone()).into());
        }
        let dir = match &self.backing {
            Backing::Dir(dir) if self.is_iterable() => dir,
            _ => return Ok(vec![self.clone()]),
        };
        let files = self.matching_files(dir)?;
        if self.kind.is_paired() {
            self.group_pairs(files)
        } else {
            Ok(files.into_iter().map(|f| self.with_files(vec![f])).collect())
        }
    }

    /// Re-derives validity from the current state of disk. Never fails;
    /// any problem reading the data means "not valid".
    pub fn is_valid(&self) -> bool {
        match &self.backing {
            Backing::Pending => false,
            Backing::Dir(dir) => dir.is_dir(),
            Backing::Files(files) => {
                !files.is_empty() && files.iter().all(|f| f.is_file() && self.accepts_name(f))
            }
            Backing::Table(table) => match &self.kind {
                DataKind::MetadataColumn(col) => read_header(table)
                    .map(|header| header.iter().any(|h| h == col))
                    .unwrap_or(false),
                _ => false,
            },
        }
    }

    fn matching_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::with_capacity(16);
        let entries =
            fs::read_dir(dir).with_context(|| format!("while listing {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && self.accepts_name(&path) {
                files.push(path);
            } else {
                log::trace!("ignoring {:?} while listing {}", path, self.description);
            }
        }
        files.sort();
        Ok(files)
    }

    fn group_pairs(&self, files: Vec<PathBuf>) -> Result<Vec<DataUnit>> {
        let mut pairs: BTreeMap<String, [Option<PathBuf>; 2]> = BTreeMap::new();
        for file in files {
            let name = file.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            let Some(caps) = MATE.captures(name) else {
                return Err(Error::UnpairedRead(file.display().to_string()).into());
            };
            let stem = caps[1].to_owned();
            let mate = if &caps[2] == "1" { 0 } else { 1 };
            pairs.entry(stem).or_default()[mate] = Some(file);
        }

        let mut units = Vec::with_capacity(pairs.len());
        for (_, pair) in pairs {
            match pair {
                [Some(fw), Some(rv)] => units.push(self.with_files(vec![fw, rv])),
                [Some(lone), None] | [None, Some(lone)] => {
                    return Err(Error::UnpairedRead(lone.display().to_string()).into())
                }
                [None, None] => unreachable!("pair entries are created with one mate"),
            }
        }
        Ok(units)
    }
}

/// Read the column names from the first line of a tab-separated table.
pub fn read_header(table: &Path) -> io::Result<Vec<String>> {
    let mut line = String::with_capacity(256);
    BufReader::new(fs::File::open(table)?).read_line(&mut line)?;
    Ok(line
        .trim_end_matches(['\r', '\n'])
        .split('\t')
        .map(|h| h.trim().to_owned())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "x").unwrap();
        path
    }

    #[test]
    fn test_template_is_not_ready() {
        let unit = DataUnit::template(DataKind::fastq(false), "reads");
        assert!(!unit.is_ready());
        assert!(!unit.is_valid());
        assert!(unit.files().is_err());
        assert!(unit.iterate().is_err());
    }

    #[test]
    fn test_iterable_dir_must_iterate() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), "a.fastq");
        let unit = DataUnit::template(DataKind::fastq(false), "reads").at_dir(dir.path());
        assert!(unit.is_ready());
        let err = unit.files().unwrap_err();
        assert!(matches!(err.downcast_ref(), Some(Error::MustIterate(_))));
        Ok(())
    }

    #[test]
    fn test_non_iterable_iterates_to_itself() -> Result<()> {
        let dir = tempdir()?;
        let report = touch(dir.path(), "summary.html");
        let unit = DataUnit::template(DataKind::Report, "report").with_files(vec![report]);
        assert_eq!(unit.iterate()?, vec![unit.clone()]);
        Ok(())
    }

    #[test]
    fn test_iterate_ignores_irrelevant_files() -> Result<()> {
        let dir = tempdir()?;
        let a = touch(dir.path(), "a.fastq");
        let b = touch(dir.path(), "b.fq.gz");
        touch(dir.path(), "notes.txt");
        fs::create_dir(dir.path().join("sub.fastq"))?;

        let unit = DataUnit::template(DataKind::fastq(false), "reads").at_dir(dir.path());
        let units = unit.iterate()?;
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].files()?, vec![a]);
        assert_eq!(units[1].files()?, vec![b]);
        Ok(())
    }

    #[test]
    fn test_iterate_groups_pairs() -> Result<()> {
        let dir = tempdir()?;
        let r1 = touch(dir.path(), "s1_R1.fastq");
        let r2 = touch(dir.path(), "s1_R2.fastq");
        let m1 = touch(dir.path(), "s2_1.fq.gz");
        let m2 = touch(dir.path(), "s2_2.fq.gz");

        let unit = DataUnit::template(DataKind::fastq(true), "pairs").at_dir(dir.path());
        let units = unit.iterate()?;
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].files()?, vec![r1, r2]);
        assert_eq!(units[1].files()?, vec![m1, m2]);
        Ok(())
    }

    #[test]
    fn test_iterate_rejects_lone_mate() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), "s1_R1.fastq");
        let unit = DataUnit::template(DataKind::fastq(true), "pairs").at_dir(dir.path());
        let err = unit.iterate().unwrap_err();
        assert!(matches!(err.downcast_ref(), Some(Error::UnpairedRead(_))));
        Ok(())
    }

    #[test]
    fn test_is_valid_rederives_from_disk() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("late.fastq");
        let unit = DataUnit::template(DataKind::fastq(false), "reads").with_files(vec![path.clone()]);
        assert!(!unit.is_valid());
        fs::write(&path, "@r\nACGT\n+\nIIII\n")?;
        assert!(unit.is_valid());
        Ok(())
    }

    #[test]
    fn test_metadata_column_validity() -> Result<()> {
        let dir = tempdir()?;
        let table = dir.path().join("meta.tsv");
        let unit = DataUnit::metadata_column("BodySite", &table);
        assert!(!unit.is_valid());

        fs::write(&table, "SampleID\tAge\n")?;
        assert!(!unit.is_valid());

        fs::write(&table, "SampleID\tAge\tBodySite\ns1\t3\tgut\n")?;
        assert!(unit.is_valid());
        Ok(())
    }
}
