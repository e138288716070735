use std::marker::PhantomData;

/// Vec wrapper that uses typed indexes.
///
/// Ids are handed out in push order, so an id's position doubles as its
/// ordering relative to every other entry.
#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub struct IdVec<K, V> {
    vec: Vec<V>,
    _phantom: PhantomData<K>,
}

impl<K, V> Default for IdVec<K, V> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<K, V> IdVec<K, V> {
    fn new(vec: Vec<V>) -> Self {
        Self {
            vec,
            _phantom: PhantomData,
        }
    }

    /// Create a new `IdVec` with the given capacity.
    pub fn with_capacity(cap: usize) -> Self {
        Self::new(Vec::with_capacity(cap))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Iterate through immutable references to values
    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.vec.iter()
    }

    /// Iterate through mutable references to values
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, V> {
        self.vec.iter_mut()
    }
}

impl<K: Into<usize>, V> IdVec<K, V> {
    /// Get the value with id `k`, if it exists.
    #[inline]
    pub fn get(&self, k: K) -> Option<&V> {
        self.vec.get(k.into())
    }

    /// Get a mutable reference to the value with id `k`, if it exists.
    #[inline]
    pub fn get_mut(&mut self, k: K) -> Option<&mut V> {
        self.vec.get_mut(k.into())
    }
}

impl<K: From<usize>, V> IdVec<K, V> {
    /// Push `v` into the underlying vec, and return an id that can be used to retrieve it later.
    #[inline]
    pub fn push(&mut self, v: V) -> K {
        let id = self.vec.len().into();
        self.vec.push(v);
        id
    }

    /// Iterate through (id, value) pairs in id order.
    pub fn enumerate(&self) -> impl DoubleEndedIterator<Item = (K, &V)> + '_ {
        self.vec.iter().enumerate().map(|(i, v)| (i.into(), v))
    }
}

impl<K: From<usize> + Into<usize>, V> IdVec<K, V> {
    /// Iterate through the entries that come before `k`, nearest first.
    pub fn before_rev(&self, k: K) -> impl Iterator<Item = (K, &V)> + '_ {
        let end = k.into().min(self.vec.len());
        self.vec[..end]
            .iter()
            .enumerate()
            .rev()
            .map(|(i, v)| (i.into(), v))
    }
}
