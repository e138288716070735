mod id_vec;
pub use id_vec::IdVec;

mod timer;
pub use timer::Timer;

#[macro_use]
mod id;

#[derive(thiserror::Error, Debug)]
#[error("Filesystem path is not valid UTF-8")]
pub struct PathEncodingError;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Index {val} is larger than the maximum of {max}")]
pub struct IdOverflow {
    pub val: usize,
    pub max: usize,
}

pub type Hasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;
pub type HashMap<K, V> = std::collections::HashMap<K, V, Hasher>;
pub type HashSet<T> = std::collections::HashSet<T, Hasher>;
