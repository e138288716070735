use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::Error;

static FASTQ: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(fastq|fq)(\.gz)?$").expect("valid fastq pattern"));
static FASTA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(fasta|fa|fna)(\.gz)?$").expect("valid fasta pattern"));
static TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(tsv|csv)$").expect("valid table pattern"));
static REPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(html|pdf|md)$").expect("valid report pattern"));
// anything that isn't a hidden file:
static ANY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^.]").expect("valid any pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqFormat {
    Fasta,
    Fastq,
}

/// A kind of data product. Closed on purpose: every kind a module can
/// declare is listed here, along with how its files are recognized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// Sequence files, one (or one pair, if `paired`) per sample.
    SeqFiles { format: SeqFormat, paired: bool },
    /// Tab- or comma-separated count tables, usually one per sample or taxonomy level.
    CountTable,
    /// Human-readable reports.
    Report,
    /// A named column of the sample metadata table.
    MetadataColumn(String),
    /// Any non-hidden file.
    AnyFile,
}

/// Field-less discriminant of [`DataKind`]; used as a registry key and for
/// exact-type filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindTag {
    SeqFiles,
    CountTable,
    Report,
    MetadataColumn,
    AnyFile,
}

impl DataKind {
    pub fn fastq(paired: bool) -> Self {
        Self::SeqFiles {
            format: SeqFormat::Fastq,
            paired,
        }
    }

    pub fn fasta() -> Self {
        Self::SeqFiles {
            format: SeqFormat::Fasta,
            paired: false,
        }
    }

    pub fn tag(&self) -> KindTag {
        match self {
            Self::SeqFiles { .. } => KindTag::SeqFiles,
            Self::CountTable => KindTag::CountTable,
            Self::Report => KindTag::Report,
            Self::MetadataColumn(_) => KindTag::MetadataColumn,
            Self::AnyFile => KindTag::AnyFile,
        }
    }

    /// Can one declared output manifest as many instances (e.g. one per sample)?
    pub fn is_iterable(&self) -> bool {
        matches!(self, Self::SeqFiles { .. } | Self::CountTable)
    }

    pub fn is_paired(&self) -> bool {
        matches!(self, Self::SeqFiles { paired: true, .. })
    }

    /// Name filter: does a file with this name belong to this kind?
    /// Metadata columns are never backed by their own files.
    pub fn matches_name(&self, file_name: &str) -> bool {
        match self {
            Self::SeqFiles {
                format: SeqFormat::Fastq,
                ..
            } => FASTQ.is_match(file_name),
            Self::SeqFiles {
                format: SeqFormat::Fasta,
                ..
            } => FASTA.is_match(file_name),
            Self::CountTable => TABLE.is_match(file_name),
            Self::Report => REPORT.is_match(file_name),
            Self::MetadataColumn(_) => false,
            Self::AnyFile => ANY.is_match(file_name),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::SeqFiles { format, paired } => {
                let format = match format {
                    SeqFormat::Fasta => "fasta",
                    SeqFormat::Fastq => "fastq",
                };
                if *paired {
                    format!("paired {format} sequence files")
                } else {
                    format!("{format} sequence files")
                }
            }
            Self::CountTable => "count tables".to_owned(),
            Self::Report => "reports".to_owned(),
            Self::MetadataColumn(col) => format!("metadata column \"{col}\""),
            Self::AnyFile => "files".to_owned(),
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Parses the names used in config files:
/// `fastq`, `fastq-paired`, `fasta`, `table`, `report`, `any`, `metadata:<column>`.
impl FromStr for DataKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(col) = s.strip_prefix("metadata:") {
            if col.is_empty() {
                return Err(Error::UnknownKind(s.to_owned()));
            }
            return Ok(Self::MetadataColumn(col.to_owned()));
        }
        match s.to_ascii_lowercase().as_str() {
            "fastq" => Ok(Self::fastq(false)),
            "fastq-paired" => Ok(Self::fastq(true)),
            "fasta" => Ok(Self::fasta()),
            "table" => Ok(Self::CountTable),
            "report" => Ok(Self::Report),
            "any" => Ok(Self::AnyFile),
            _ => Err(Error::UnknownKind(s.to_owned())),
        }
    }
}
