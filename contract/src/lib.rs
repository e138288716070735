//! Data contracts between pipeline modules.
//!
//! A module declares the *kind* of data it needs ([`ModuleInput`]) and the kind
//! it produces ([`ModuleOutput`]) without naming a specific producer.
//! Both carry a [`DataUnit`] template, which describes data that may not exist yet.
//! Once a producer finishes, its output template can be pointed at a directory
//! and iterated or classified into concrete units.

/// Closed set of data kinds, with their name filters
mod kind;
pub use kind::{DataKind, KindTag, SeqFormat};

/// The `DataUnit` record and its backing state
mod unit;
pub use unit::{read_header, Backing, DataUnit};

/// Turning sets of paths into concrete units
mod factory;
pub use factory::{classify, Classifier, Registry};

/// Predicates deciding whether a unit fits an input slot
mod filter;
pub use filter::DataFilter;

/// Input and output contract records
mod specs;
pub use specs::{InputSpecs, ModuleInput, ModuleOutput, OutputSpecs};

util::typed_id!(
    /// Position of a module in the pipeline's execution order.
    ModuleId,
    u16
);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Input rejected: \"{path}\" is not a valid {kind}")]
    InputRejected { path: String, kind: String },
    #[error("Data is not ready yet: {0}")]
    NotReady(String),
    #[error("{0} is iterable; iterate it before accessing its files")]
    MustIterate(String),
    #[error("Paired read has no mate: \"{0}\"")]
    UnpairedRead(String),
    #[error("Unknown data kind: \"{0}\"")]
    UnknownKind(String),
}
