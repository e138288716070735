use crate::{DataFilter, DataUnit, ModuleId};

/// One declared input slot of a module.
#[derive(Debug, Clone)]
pub struct ModuleInput {
    label: String,
    description: String,
    template: DataUnit,
    filter: DataFilter,
    required: bool,
    multiple: bool,
}

impl ModuleInput {
    /// A required, single-source input accepting any unit of the template's kind.
    pub fn new(label: impl Into<String>, description: impl Into<String>, template: DataUnit) -> Self {
        let filter = DataFilter::Kind(template.kind().tag());
        Self {
            label: label.into(),
            description: description.into(),
            template,
            filter,
            required: true,
            multiple: false,
        }
    }

    pub fn with_filter(mut self, filter: DataFilter) -> Self {
        self.filter = filter;
        self
    }

    /// The module can run with this slot left unbound.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// The slot may be fed by more than one source.
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn template(&self) -> &DataUnit {
        &self.template
    }

    pub fn filter(&self) -> &DataFilter {
        &self.filter
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// Does the output unit `candidate` satisfy this slot?
    pub fn accepts(&self, candidate: &DataUnit) -> bool {
        self.filter.accepts(candidate)
    }
}

/// One declared output of a module. The template is stamped with its producer.
#[derive(Debug, Clone)]
pub struct ModuleOutput {
    label: String,
    description: String,
    template: DataUnit,
    producer: ModuleId,
}

impl ModuleOutput {
    pub fn new(
        label: impl Into<String>,
        description: impl Into<String>,
        template: DataUnit,
        producer: ModuleId,
    ) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            template: template.produced_by(producer),
            producer,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn template(&self) -> &DataUnit {
        &self.template
    }

    pub fn producer(&self) -> ModuleId {
        self.producer
    }
}

/// A module's inputs, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct InputSpecs(Vec<ModuleInput>);

impl InputSpecs {
    pub fn with_capacity(cap: usize) -> Self {
        Self(Vec::with_capacity(cap))
    }

    pub fn push(&mut self, input: ModuleInput) {
        self.0.push(input);
    }

    pub fn get(&self, label: &str) -> Option<&ModuleInput> {
        self.0.iter().find(|i| i.label == label)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModuleInput> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ModuleInput> for InputSpecs {
    fn from_iter<T: IntoIterator<Item = ModuleInput>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a InputSpecs {
    type Item = &'a ModuleInput;
    type IntoIter = std::slice::Iter<'a, ModuleInput>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A module's outputs, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct OutputSpecs(Vec<ModuleOutput>);

impl OutputSpecs {
    pub fn with_capacity(cap: usize) -> Self {
        Self(Vec::with_capacity(cap))
    }

    pub fn push(&mut self, output: ModuleOutput) {
        self.0.push(output);
    }

    pub fn get(&self, label: &str) -> Option<&ModuleOutput> {
        self.0.iter().find(|o| o.label == label)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModuleOutput> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ModuleOutput> for OutputSpecs {
    fn from_iter<T: IntoIterator<Item = ModuleOutput>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a OutputSpecs {
    type Item = &'a ModuleOutput;
    type IntoIter = std::slice::Iter<'a, ModuleOutput>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
