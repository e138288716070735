use std::fmt;

use crate::{DataKind, DataUnit, KindTag, ModuleId, SeqFormat};

/// Decides whether a unit is acceptable for an input slot.
#[derive(Clone)]
pub enum DataFilter {
    /// Any unit whose kind has this tag.
    Kind(KindTag),
    /// Units of exactly this kind (format and pairing included).
    Exact(DataKind),
    /// Only units produced by one particular module.
    ProducedBy(ModuleId),
    /// Arbitrary predicate; `name` is for log messages.
    Custom {
        name: &'static str,
        pred: fn(&DataUnit) -> bool,
    },
    /// Every inner filter must accept.
    All(Vec<DataFilter>),
}

impl DataFilter {
    pub fn accepts(&self, unit: &DataUnit) -> bool {
        match self {
            Self::Kind(tag) => unit.kind().tag() == *tag,
            Self::Exact(kind) => unit.kind() == kind,
            Self::ProducedBy(id) => unit.producer() == Some(*id),
            Self::Custom { pred, .. } => pred(unit),
            Self::All(filters) => filters.iter().all(|f| f.accepts(unit)),
        }
    }

    pub fn is_fastq() -> Self {
        Self::Custom {
            name: "is_fastq",
            pred: |u| {
                matches!(
                    u.kind(),
                    DataKind::SeqFiles {
                        format: SeqFormat::Fastq,
                        ..
                    }
                )
            },
        }
    }

    pub fn is_fasta() -> Self {
        Self::Custom {
            name: "is_fasta",
            pred: |u| {
                matches!(
                    u.kind(),
                    DataKind::SeqFiles {
                        format: SeqFormat::Fasta,
                        ..
                    }
                )
            },
        }
    }

    pub fn is_paired() -> Self {
        Self::Custom {
            name: "is_paired",
            pred: |u| u.kind().is_paired(),
        }
    }

    /// Restrict this filter to units made by `module`.
    pub fn and_produced_by(self, module: ModuleId) -> Self {
        match self {
            Self::All(mut filters) => {
                filters.push(Self::ProducedBy(module));
                Self::All(filters)
            }
            other => Self::All(vec![other, Self::ProducedBy(module)]),
        }
    }
}

impl fmt::Debug for DataFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for DataFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kind(tag) => write!(f, "kind {tag:?}"),
            Self::Exact(kind) => write!(f, "exactly {kind}"),
            Self::ProducedBy(id) => write!(f, "produced by module {id}"),
            Self::Custom { name, .. } => write!(f, "{name}"),
            Self::All(filters) => {
                let parts: Vec<String> = filters.iter().map(|f| f.to_string()).collect();
                write!(f, "({})", parts.join(" and "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_vs_exact() {
        let paired = DataUnit::template(DataKind::fastq(true), "pairs");
        assert!(DataFilter::Kind(KindTag::SeqFiles).accepts(&paired));
        assert!(!DataFilter::Exact(DataKind::fastq(false)).accepts(&paired));
        assert!(DataFilter::Exact(DataKind::fastq(true)).accepts(&paired));
        assert!(!DataFilter::Kind(KindTag::CountTable).accepts(&paired));
    }

    #[test]
    fn test_produced_by() {
        let unit = DataUnit::template(DataKind::CountTable, "counts").produced_by(ModuleId::from(3));
        assert!(DataFilter::ProducedBy(ModuleId::from(3)).accepts(&unit));
        assert!(!DataFilter::ProducedBy(ModuleId::from(2)).accepts(&unit));

        let orphan = DataUnit::template(DataKind::CountTable, "counts");
        assert!(!DataFilter::ProducedBy(ModuleId::from(3)).accepts(&orphan));
    }

    #[test]
    fn test_custom_and_all() {
        let fq = DataUnit::template(DataKind::fastq(false), "reads").produced_by(ModuleId::from(1));
        let fa = DataUnit::template(DataKind::fasta(), "contigs");
        assert!(DataFilter::is_fastq().accepts(&fq));
        assert!(!DataFilter::is_fastq().accepts(&fa));
        assert!(DataFilter::is_fasta().accepts(&fa));

        let filter = DataFilter::is_fastq().and_produced_by(ModuleId::from(1));
        assert!(filter.accepts(&fq));
        assert_eq!(filter.to_string(), "(is_fastq and produced by module 1)");
        let filter = DataFilter::is_fastq().and_produced_by(ModuleId::from(0));
        assert!(!filter.accepts(&fq));
    }
}
