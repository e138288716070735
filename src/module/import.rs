use anyhow::{Context, Result};

use contract::{
    DataFilter, DataKind, DataUnit, InputSpecs, ModuleId, ModuleInput, ModuleOutput, OutputSpecs,
};

use crate::config::Config;

use super::{Module, ModuleEnv};

const SEQ_KIND: &str = "seqKind";
const STRICT: &str = "strict";
const SEQS_LABEL: &str = "seqs";

/// Copies externally supplied sequence files into the pipeline.
///
/// Its input accepts any file from outside the pipeline; in strict mode
/// (the default) every one of them must look like `<label>.seqKind`
/// (default `fastq`), otherwise the module fails before anything is copied.
pub struct ImportSeqs {
    template: DataUnit,
    strict: bool,
    inputs: InputSpecs,
    outputs: OutputSpecs,
}

impl ImportSeqs {
    pub const TYPE: &'static str = "ImportSeqs";

    pub fn new(label: &str, id: ModuleId, config: &Config) -> Result<Self> {
        let kind: DataKind = config
            .get_module_str(label, SEQ_KIND)
            .unwrap_or("fastq")
            .parse()
            .with_context(|| format!("while reading {label}.{SEQ_KIND}"))?;
        let strict = config
            .get_bool(&format!("{label}.{STRICT}"))?
            .unwrap_or(true);

        let external = DataFilter::Custom {
            name: "is_external",
            pred: |u| u.producer().is_none(),
        };
        let input = ModuleInput::new(
            SEQS_LABEL,
            "sequence files to import",
            DataUnit::template(DataKind::AnyFile, "external files"),
        )
        .with_filter(DataFilter::All(vec![
            DataFilter::Kind(DataKind::AnyFile.tag()),
            external,
        ]))
        .multiple();

        let template = DataUnit::template(kind, format!("sequences imported by {label}"));
        let output = ModuleOutput::new(SEQS_LABEL, "imported sequence files", template.clone(), id);

        Ok(Self {
            template,
            strict,
            inputs: [input].into_iter().collect(),
            outputs: [output].into_iter().collect(),
        })
    }

    /// The bound files that are sequences of our kind.
    fn classify(&self, env: &ModuleEnv) -> Result<Vec<DataUnit>> {
        let paths = env.input_paths(SEQS_LABEL);
        env.registry
            .classify(&paths, &self.template, self.strict)
            .with_context(|| format!("while classifying inputs of {}", env.label))
    }
}

impl Module for ImportSeqs {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn inputs(&self) -> &InputSpecs {
        &self.inputs
    }

    fn outputs(&self) -> &OutputSpecs {
        &self.outputs
    }

    fn check_dependencies(&self, env: &ModuleEnv) -> Result<()> {
        let units = self.classify(env)?;
        log::info!("{}: {} sequence files to import", env.label, units.len());
        Ok(())
    }

    fn execute(&self, env: &ModuleEnv) -> Result<()> {
        env.fs.create_dir(&env.dirs.output)?;
        for unit in self.classify(env)? {
            for file in unit.files()? {
                let Some(name) = file.file_name() else {
                    continue;
                };
                env.fs.copy(&file, env.dirs.output.join(name))?;
            }
        }

        // catches unpaired mates in paired kinds:
        let imported = self.template.at_dir(&env.dirs.output).iterate()?;
        log::info!("{}: imported {} samples", env.label, imported.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_only_external_files() -> Result<()> {
        let m = ImportSeqs::new("import", ModuleId::from(0), &Config::default())?;
        let input = m.inputs().get(SEQS_LABEL).unwrap();
        assert!(input.is_multiple());

        let external = DataUnit::template(DataKind::AnyFile, "f");
        assert!(input.accepts(&external));
        assert!(!input.accepts(&external.clone().produced_by(ModuleId::from(3))));

        let output = m.outputs().get(SEQS_LABEL).unwrap();
        assert_eq!(output.template().kind(), &DataKind::fastq(false));
        Ok(())
    }

    #[test]
    fn test_seq_kind_property() -> Result<()> {
        let config = Config::parse("import.seqKind=fastq-paired\nimport.strict=false\n")?;
        let m = ImportSeqs::new("import", ModuleId::from(0), &config)?;
        assert!(m.template.kind().is_paired());
        assert!(!m.strict);
        Ok(())
    }
}
