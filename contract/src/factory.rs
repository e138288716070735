use std::path::PathBuf;

use anyhow::Result;

use util::HashMap;

use crate::{DataUnit, Error, KindTag};

/// Turns candidate paths into concrete units shaped like a template.
pub type Classifier = fn(&[PathBuf], &DataUnit, bool) -> Result<Vec<DataUnit>>;

/// Classify `paths` against `template`'s name filter.
///
/// Directories are skipped. Every accepted path yields one new unit of the
/// template's kind, backed by just that path. A path that fails the filter is
/// dropped, unless `strict` is set, in which case the whole classification
/// fails and nothing is returned.
pub fn classify(paths: &[PathBuf], template: &DataUnit, strict: bool) -> Result<Vec<DataUnit>> {
    let mut units = Vec::with_capacity(paths.len());
    for path in paths {
        if path.is_dir() {
            log::trace!("skipping directory {:?}", path);
            continue;
        }
        if template.accepts_name(path) {
            units.push(template.with_files(vec![path.clone()]));
        } else if strict {
            return Err(Error::InputRejected {
                path: path.display().to_string(),
                kind: template.kind().describe(),
            }
            .into());
        } else {
            log::debug!("{:?} is not {}; excluding", path, template.kind());
        }
    }
    Ok(units)
}

// metadata columns live in the metadata table, never in loose files:
fn classify_column(paths: &[PathBuf], template: &DataUnit, strict: bool) -> Result<Vec<DataUnit>> {
    match paths.iter().find(|p| !p.is_dir()) {
        Some(path) if strict => Err(Error::InputRejected {
            path: path.display().to_string(),
            kind: template.kind().describe(),
        }
        .into()),
        _ => Ok(Vec::with_capacity(0)),
    }
}

/// Maps each kind to the classifier that builds its units.
pub struct Registry {
    classifiers: HashMap<KindTag, Classifier>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut classifiers: HashMap<KindTag, Classifier> = HashMap::default();
        classifiers.insert(KindTag::SeqFiles, classify);
        classifiers.insert(KindTag::CountTable, classify);
        classifiers.insert(KindTag::Report, classify);
        classifiers.insert(KindTag::AnyFile, classify);
        classifiers.insert(KindTag::MetadataColumn, classify_column);
        Self { classifiers }
    }
}

impl Registry {
    /// Replace the classifier used for `tag`.
    pub fn register(&mut self, tag: KindTag, classifier: Classifier) {
        self.classifiers.insert(tag, classifier);
    }

    /// Classify `paths` with whichever classifier is registered for the
    /// template's kind (the generic name filter if none is).
    pub fn classify(
        &self,
        paths: &[PathBuf],
        template: &DataUnit,
        strict: bool,
    ) -> Result<Vec<DataUnit>> {
        let classifier = self
            .classifiers
            .get(&template.kind().tag())
            .copied()
            .unwrap_or(classify);
        classifier(paths, template, strict)
    }
}
