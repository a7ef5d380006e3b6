//! HotMultiMap: a key may hold several values. Entries are `Pair<K, V>` slots
//! compared on both halves, so `(k, v)` is stored at most once.

use crate::equality::DefaultEq;
use crate::hot_set::{Bucket, InsertError};
use crate::load::{DefaultLoad, LoadPolicy};
use crate::pair::Pair;
use crate::probe::{Forward, Probe};
use crate::raw_set::{self, infallible, Probed, RawSet};
use crate::reentrancy::DebugReentrancy;
use crate::tombstone::{DefaultValue, PairTombstone, Tombstone};
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use hashbrown::{Equivalent, TryReserveError};

/// Open-addressing multimap.
///
/// Free slots hold the whole tombstone pair, so both `GK` and `GV` matter:
/// only the exact pair they produce is reserved.
pub struct HotMultiMap<
    K,
    V,
    GK,
    GV = DefaultValue,
    S = DefaultHashBuilder,
    L = DefaultLoad,
    P = Forward,
> {
    raw: RawSet<Pair<K, V>, PairTombstone<GK, GV>, DefaultEq, S, L, P>,
    reentrancy: DebugReentrancy,
}

impl<K, V, GK, GV> HotMultiMap<K, V, GK, GV>
where
    GK: Tombstone<K> + Default,
    GV: Tombstone<V> + Default,
{
    pub fn new() -> Self {
        Self::with_tombstone(GK::default(), GV::default())
    }
}

impl<K, V, GK, GV> HotMultiMap<K, V, GK, GV>
where
    GK: Tombstone<K>,
    GV: Tombstone<V>,
{
    pub fn with_tombstone(key: GK, value: GV) -> Self {
        Self::from_raw(RawSet::new(
            PairTombstone::new(key, value),
            DefaultEq,
            DefaultHashBuilder::default(),
            DefaultLoad,
            Forward,
        ))
    }
}

impl<K, V, GK, GV> HotMultiMap<K, V, GK, GV>
where
    K: Hash + Eq,
    V: PartialEq,
    GK: Tombstone<K>,
    GV: Tombstone<V>,
{
    pub fn with_capacity_and_tombstone(capacity: usize, key: GK, value: GV) -> Self {
        Self::with_parts(
            capacity,
            key,
            value,
            DefaultHashBuilder::default(),
            DefaultLoad,
            Forward,
        )
    }
}

impl<K, V, GK, GV, S, L, P> HotMultiMap<K, V, GK, GV, S, L, P> {
    fn from_raw(raw: RawSet<Pair<K, V>, PairTombstone<GK, GV>, DefaultEq, S, L, P>) -> Self {
        Self {
            raw,
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Number of `(key, value)` entries.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.raw.threshold()
    }

    pub fn reserved(&self) -> usize {
        self.raw.reserved()
    }

    pub fn tombstone(&self) -> (&K, &V) {
        let t = self.raw.tombstone();
        (&t.key, &t.value)
    }
}

impl<K, V, GK, GV, S, L, P> HotMultiMap<K, V, GK, GV, S, L, P>
where
    K: PartialEq,
    V: PartialEq,
{
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.raw.iter(),
        }
    }

    pub fn get_at(&self, bucket: Bucket) -> Option<(&K, &V)> {
        let _g = self.reentrancy.enter();
        self.raw
            .get_at(bucket.index())
            .map(|p| (&p.key, &p.value))
    }
}

impl<K, V, GK, GV, S, L, P> HotMultiMap<K, V, GK, GV, S, L, P>
where
    GK: Tombstone<K>,
    GV: Tombstone<V>,
{
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.raw.clear();
    }
}

impl<K, V, GK, GV, S, L, P> HotMultiMap<K, V, GK, GV, S, L, P>
where
    K: Hash + Eq,
    V: PartialEq,
    GK: Tombstone<K>,
    GV: Tombstone<V>,
    S: BuildHasher,
    L: LoadPolicy,
    P: Probe,
{
    pub fn with_parts(capacity: usize, key: GK, value: GV, hasher: S, load: L, probe: P) -> Self {
        let mut map = Self::from_raw(RawSet::new(
            PairTombstone::new(key, value),
            DefaultEq,
            hasher,
            load,
            probe,
        ));
        if capacity > 0 {
            map.reserve(capacity);
        }
        map
    }

    fn index_of<Q>(&self, key: &Q, value: &V) -> Option<usize>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let hash = self.raw.hash_of(key);
        let hit = self
            .raw
            .locate(hash, |slot| key.equivalent(&slot.key) && slot.value == *value);
        match hit {
            Probed::Found(i) => Some(i),
            _ => None,
        }
    }

    fn any_of<Q>(&self, key: &Q) -> Option<usize>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let hash = self.raw.hash_of(key);
        match self.raw.locate(hash, |slot| key.equivalent(&slot.key)) {
            Probed::Found(i) => Some(i),
            _ => None,
        }
    }

    /// Adds `(key, value)`. Returns `false` when that exact pair was already
    /// stored.
    ///
    /// # Panics
    ///
    /// On capacity overflow; aborts if the allocator fails.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        infallible(self.try_insert(key, value))
    }

    /// On allocation failure the multimap is unchanged and the pair comes
    /// back in the error.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<bool, InsertError<(K, V)>> {
        let _g = self.reentrancy.enter();
        match self.raw.upsert(Pair::new(key, value)) {
            Ok((_, old)) => Ok(old.is_none()),
            Err(e) => Err(InsertError {
                error: e.error,
                value: e.value.into_tuple(),
            }),
        }
    }

    pub fn contains<Q>(&self, key: &Q, value: &V) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let _g = self.reentrancy.enter();
        self.index_of(key, value).is_some()
    }

    /// Position of the exact pair `(key, value)`.
    pub fn find<Q>(&self, key: &Q, value: &V) -> Option<Bucket>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let _g = self.reentrancy.enter();
        self.index_of(key, value).map(Bucket::new)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let _g = self.reentrancy.enter();
        self.any_of(key).is_some()
    }

    /// Number of values stored under `key`.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let _g = self.reentrancy.enter();
        let mut n = 0;
        self.raw.scan(self.raw.hash_of(key), |_, slot| {
            if key.equivalent(&slot.key) {
                n += 1;
            }
        });
        n
    }

    /// Values stored under `key`, in probe order.
    pub fn get_all<Q>(&self, key: &Q) -> Vec<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let _g = self.reentrancy.enter();
        let mut hits = Vec::new();
        self.raw.scan(self.raw.hash_of(key), |i, slot| {
            if key.equivalent(&slot.key) {
                hits.push(i);
            }
        });
        hits.into_iter().map(|i| &self.raw.slot(i).value).collect()
    }

    /// Removes the exact pair `(key, value)`. Returns whether it was stored.
    pub fn remove<Q>(&mut self, key: &Q, value: &V) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let _g = self.reentrancy.enter();
        match self.index_of(key, value) {
            Some(i) => {
                self.raw.remove_slot(i);
                true
            }
            None => false,
        }
    }

    /// Removes every value stored under `key` and returns how many there were.
    pub fn remove_all<Q>(&mut self, key: &Q) -> usize
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let _g = self.reentrancy.enter();
        let mut removed = 0;
        while let Some(i) = self.any_of(key) {
            self.raw.remove_slot(i);
            removed += 1;
        }
        removed
    }

    pub fn reserve(&mut self, additional: usize) {
        infallible(self.try_reserve(additional))
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let _g = self.reentrancy.enter();
        self.raw.try_reserve(additional)
    }

    pub fn shrink_to_fit(&mut self) {
        let _g = self.reentrancy.enter();
        self.raw.shrink_to_fit();
    }
}

impl<K, V, GK, GV, S, L, P> Default for HotMultiMap<K, V, GK, GV, S, L, P>
where
    GK: Tombstone<K> + Default,
    GV: Tombstone<V> + Default,
    S: Default,
    L: Default,
    P: Default,
{
    fn default() -> Self {
        Self::from_raw(RawSet::new(
            PairTombstone::default(),
            DefaultEq,
            S::default(),
            L::default(),
            P::default(),
        ))
    }
}

impl<K, V, GK, GV, S, L, P> Clone for HotMultiMap<K, V, GK, GV, S, L, P>
where
    K: Clone,
    V: Clone,
    GK: Clone,
    GV: Clone,
    S: Clone,
    L: Clone,
    P: Clone,
{
    fn clone(&self) -> Self {
        let _g = self.reentrancy.enter();
        Self::from_raw(self.raw.clone())
    }
}

impl<K, V, GK, GV, S, L, P> fmt::Debug for HotMultiMap<K, V, GK, GV, S, L, P>
where
    K: fmt::Debug + PartialEq,
    V: fmt::Debug + PartialEq,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<K, V, GK, GV, S, L, P> Extend<(K, V)> for HotMultiMap<K, V, GK, GV, S, L, P>
where
    K: Hash + Eq,
    V: PartialEq,
    GK: Tombstone<K>,
    GV: Tombstone<V>,
    S: BuildHasher,
    L: LoadPolicy,
    P: Probe,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, GK, GV, S, L, P> FromIterator<(K, V)> for HotMultiMap<K, V, GK, GV, S, L, P>
where
    K: Hash + Eq,
    V: PartialEq,
    GK: Tombstone<K> + Default,
    GV: Tombstone<V> + Default,
    S: BuildHasher + Default,
    L: LoadPolicy + Default,
    P: Probe + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

/// Iterator over `(&K, &V)` in bucket order. A key with several values
/// appears once per value.
pub struct Iter<'a, K, V> {
    inner: raw_set::Iter<'a, Pair<K, V>, DefaultEq>,
}

impl<'a, K: PartialEq, V: PartialEq> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|p| (&p.key, &p.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: PartialEq, V: PartialEq> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V, GK, GV, S, L, P> IntoIterator for &'a HotMultiMap<K, V, GK, GV, S, L, P>
where
    K: PartialEq,
    V: PartialEq,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
