//! HotMap: unique-key map. Entries are `Pair<K, V>` slots compared by key.

use crate::hot_set::{Bucket, InsertError};
use crate::load::{DefaultLoad, LoadPolicy};
use crate::pair::{ByKey, Pair};
use crate::probe::{Forward, Probe};
use crate::raw_set::{self, infallible, Probed, RawSet};
use crate::reentrancy::DebugReentrancy;
use crate::tombstone::{DefaultValue, PairTombstone, Tombstone};
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use hashbrown::{Equivalent, TryReserveError};

/// Open-addressing map with unique keys.
///
/// `GK` produces the tombstone key, which must never be inserted. `GV` fills
/// the value half of free slots and is never compared.
pub struct HotMap<K, V, GK, GV = DefaultValue, S = DefaultHashBuilder, L = DefaultLoad, P = Forward>
{
    raw: RawSet<Pair<K, V>, PairTombstone<GK, GV>, ByKey, S, L, P>,
    reentrancy: DebugReentrancy,
}

impl<K, V, GK, GV> HotMap<K, V, GK, GV>
where
    GK: Tombstone<K> + Default,
    GV: Tombstone<V> + Default,
{
    pub fn new() -> Self {
        Self::with_tombstone(GK::default(), GV::default())
    }
}

impl<K, V, GK, GV> HotMap<K, V, GK, GV>
where
    K: Hash + Eq,
    GK: Tombstone<K> + Default,
    GV: Tombstone<V> + Default,
{
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_tombstone(capacity, GK::default(), GV::default())
    }
}

impl<K, V, GK, GV> HotMap<K, V, GK, GV>
where
    GK: Tombstone<K>,
    GV: Tombstone<V>,
{
    pub fn with_tombstone(key: GK, value: GV) -> Self {
        Self::from_raw(RawSet::new(
            PairTombstone::new(key, value),
            ByKey,
            DefaultHashBuilder::default(),
            DefaultLoad,
            Forward,
        ))
    }
}

impl<K, V, GK, GV> HotMap<K, V, GK, GV>
where
    K: Hash + Eq,
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

impl<K, V, GK, GV, S, L, P> HotMap<K, V, GK, GV, S, L, P> {
    fn from_raw(raw: RawSet<Pair<K, V>, PairTombstone<GK, GV>, ByKey, S, L, P>) -> Self {
        Self {
            raw,
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Entries the map holds before a new key grows it.
    pub fn capacity(&self) -> usize {
        self.raw.threshold()
    }

    pub fn reserved(&self) -> usize {
        self.raw.reserved()
    }

    /// The key marking free slots.
    pub fn tombstone_key(&self) -> &K {
        &self.raw.tombstone().key
    }

    pub fn hasher(&self) -> &S {
        self.raw.hasher()
    }
}

impl<K, V, GK, GV, S, L, P> HotMap<K, V, GK, GV, S, L, P>
where
    K: PartialEq,
{
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.raw.iter(),
        }
    }

    /// Values are mutable; keys are not, since moving a key would break its
    /// probe run.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.raw.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.iter_mut().map(|(_, v)| v)
    }

    /// Entry stored at `bucket`, if the slot holds one.
    pub fn get_at(&self, bucket: Bucket) -> Option<(&K, &V)> {
        let _g = self.reentrancy.enter();
        self.raw
            .get_at(bucket.index())
            .map(|p| (&p.key, &p.value))
    }
}

impl<K, V, GK, GV, S, L, P> HotMap<K, V, GK, GV, S, L, P>
where
    GK: Tombstone<K>,
    GV: Tombstone<V>,
{
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.raw.clear();
    }
}

impl<K, V, GK, GV, S, L, P> HotMap<K, V, GK, GV, S, L, P>
where
    K: Hash + Eq,
    GK: Tombstone<K>,
    GV: Tombstone<V>,
    S: BuildHasher,
    L: LoadPolicy,
    P: Probe,
{
    pub fn with_parts(capacity: usize, key: GK, value: GV, hasher: S, load: L, probe: P) -> Self {
        let mut map = Self::from_raw(RawSet::new(
            PairTombstone::new(key, value),
            ByKey,
            hasher,
            load,
            probe,
        ));
        if capacity > 0 {
            map.reserve(capacity);
        }
        map
    }

    fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let hash = self.raw.hash_of(key);
        match self.raw.locate(hash, |slot| key.equivalent(&slot.key)) {
            Probed::Found(i) => Some(i),
            _ => None,
        }
    }

    /// Inserts or updates `key`. Returns the previous value of the key.
    ///
    /// # Panics
    ///
    /// On capacity overflow; aborts if the allocator fails.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        infallible(self.try_insert(key, value))
    }

    /// Like [`insert`](HotMap::insert), reporting allocation failure. On
    /// error the map is unchanged and the pair is handed back in the error.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, InsertError<(K, V)>> {
        let _g = self.reentrancy.enter();
        match self.raw.upsert(Pair::new(key, value)) {
            Ok((_, old)) => Ok(old.map(|p| p.value)),
            Err(e) => Err(InsertError {
                error: e.error,
                value: e.value.into_tuple(),
            }),
        }
    }

    /// Position of `key`, usable with [`get_at`](HotMap::get_at) until the
    /// next growth or removal.
    pub fn find<Q>(&self, key: &Q) -> Option<Bucket>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let _g = self.reentrancy.enter();
        self.index_of(key).map(Bucket::new)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let _g = self.reentrancy.enter();
        let p = self.raw.slot(self.index_of(key)?);
        Some((&p.key, &p.value))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let _g = self.reentrancy.enter();
        let i = self.index_of(key)?;
        Some(&mut self.raw.slot_mut(i).value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let _g = self.reentrancy.enter();
        self.index_of(key).is_some()
    }

    /// Removes `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let _g = self.reentrancy.enter();
        let i = self.index_of(key)?;
        Some(self.raw.remove_slot(i).into_tuple())
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

impl<K, V, GK, GV, S, L, P> Default for HotMap<K, V, GK, GV, S, L, P>
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
            ByKey,
            S::default(),
            L::default(),
            P::default(),
        ))
    }
}

impl<K, V, GK, GV, S, L, P> Clone for HotMap<K, V, GK, GV, S, L, P>
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

impl<K, V, GK, GV, S, L, P> fmt::Debug for HotMap<K, V, GK, GV, S, L, P>
where
    K: fmt::Debug + PartialEq,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, GK, GV, S, L, P> Extend<(K, V)> for HotMap<K, V, GK, GV, S, L, P>
where
    K: Hash + Eq,
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

impl<K, V, GK, GV, S, L, P> FromIterator<(K, V)> for HotMap<K, V, GK, GV, S, L, P>
where
    K: Hash + Eq,
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

/// Iterator over `(&K, &V)` in bucket order.
pub struct Iter<'a, K, V> {
    inner: raw_set::Iter<'a, Pair<K, V>, ByKey>,
}

impl<'a, K: PartialEq, V> Iterator for Iter<'a, K, V> {
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

impl<K: PartialEq, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

/// Iterator over `(&K, &mut V)` in bucket order.
pub struct IterMut<'a, K, V> {
    inner: raw_set::IterMut<'a, Pair<K, V>, ByKey>,
}

impl<'a, K: PartialEq, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|p| (&p.key, &mut p.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: PartialEq, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<'a, K: PartialEq, V, GK, GV, S, L, P> IntoIterator for &'a HotMap<K, V, GK, GV, S, L, P> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K: PartialEq, V, GK, GV, S, L, P> IntoIterator
    for &'a mut HotMap<K, V, GK, GV, S, L, P>
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
