//! Key/value element stored by the map and multimap.

use crate::equality::Equality;
use core::hash::{Hash, Hasher};

/// A key with its value. Hashes by key alone so that every entry of a key
/// starts probing from the same slot; `PartialEq` compares both halves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pair<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> Pair<K, V> {
    pub const fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    pub fn into_tuple(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> From<(K, V)> for Pair<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self { key, value }
    }
}

impl<K: Hash, V> Hash for Pair<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Compares pairs by key only: the unique-key map's predicate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ByKey;

impl<K: PartialEq, V> Equality<Pair<K, V>> for ByKey {
    #[inline]
    fn equal(&self, a: &Pair<K, V>, b: &Pair<K, V>) -> bool {
        a.key == b.key
    }
}
