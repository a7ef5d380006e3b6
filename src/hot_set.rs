//! HotSet: public open-addressing hash set with a debug reentrancy guard.

use crate::equality::{DefaultEq, Equality};
use crate::load::{DefaultLoad, LoadPolicy};
use crate::probe::{Forward, Probe};
use crate::raw_set::{infallible, Probed, RawSet};
use crate::reentrancy::DebugReentrancy;
use crate::tombstone::{DynamicValue, Tombstone};
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use hashbrown::TryReserveError;

pub use crate::raw_set::{InsertError, IntoIter, Iter};

/// Position of an element inside a container's buffer.
///
/// Any growth or erase may move elements, after which an old `Bucket` can
/// resolve to nothing or to a different element.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Bucket(usize);

impl Bucket {
    pub(crate) fn new(index: usize) -> Self {
        Bucket(index)
    }

    /// Slot index in the buffer.
    pub fn index(&self) -> usize {
        self.0
    }

    pub fn get<'a, T, G, E, S, L, P>(&self, set: &'a HotSet<T, G, E, S, L, P>) -> Option<&'a T>
    where
        E: Equality<T>,
    {
        set.get_at(*self)
    }
}

/// Open-addressing hash set.
///
/// - `G` produces the tombstone that marks free slots.
/// - `E` compares elements, and decides whether a slot holds the tombstone.
/// - `S` hashes elements.
/// - `L` decides when to grow and by how much.
/// - `P` is the order in which slots are probed.
///
/// Inserting a value equal to the tombstone is a logic error; the element
/// becomes indistinguishable from a free slot.
pub struct HotSet<T, G, E = DefaultEq, S = DefaultHashBuilder, L = DefaultLoad, P = Forward> {
    raw: RawSet<T, G, E, S, L, P>,
    reentrancy: DebugReentrancy,
}

impl<T, G> HotSet<T, G>
where
    G: Tombstone<T> + Default,
{
    /// Empty set. Nothing is allocated until the first insert.
    pub fn new() -> Self {
        Self::with_tombstone(G::default())
    }
}

impl<T, G> HotSet<T, G>
where
    T: Hash + PartialEq,
    G: Tombstone<T> + Default,
{
    /// Set that holds `capacity` elements before it first grows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_tombstone(capacity, G::default())
    }
}

impl<T, G> HotSet<T, G>
where
    G: Tombstone<T>,
{
    pub fn with_tombstone(tomb: G) -> Self {
        Self::from_raw(RawSet::new(
            tomb,
            DefaultEq,
            DefaultHashBuilder::default(),
            DefaultLoad,
            Forward,
        ))
    }
}

impl<T, G> HotSet<T, G>
where
    T: Hash + PartialEq,
    G: Tombstone<T>,
{
    pub fn with_capacity_and_tombstone(capacity: usize, tomb: G) -> Self {
        Self::with_parts(
            capacity,
            tomb,
            DefaultEq,
            DefaultHashBuilder::default(),
            DefaultLoad,
            Forward,
        )
    }
}

impl<T, G, E, S, L, P> HotSet<T, G, E, S, L, P> {
    fn from_raw(raw: RawSet<T, G, E, S, L, P>) -> Self {
        Self {
            raw,
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Elements the set holds before the next new element grows it.
    pub fn capacity(&self) -> usize {
        self.raw.threshold()
    }

    /// Slots in the backing buffer: zero or a power of two.
    pub fn reserved(&self) -> usize {
        self.raw.reserved()
    }

    /// The value marking free slots.
    pub fn tombstone(&self) -> &T {
        self.raw.tombstone()
    }

    pub fn tombstone_generator(&self) -> &G {
        self.raw.generator()
    }

    pub fn hasher(&self) -> &S {
        self.raw.hasher()
    }
}

impl<T, G, E, S, L, P> HotSet<T, G, E, S, L, P>
where
    E: Equality<T>,
{
    /// Whether `value` reads as a free slot.
    pub fn is_tombstone(&self, value: &T) -> bool {
        self.raw.is_tombstone(value)
    }

    /// The element at `bucket`, if that slot holds one.
    pub fn get_at(&self, bucket: Bucket) -> Option<&T> {
        let _g = self.reentrancy.enter();
        self.raw.get_at(bucket.0)
    }

    /// Live elements in bucket order.
    pub fn iter(&self) -> Iter<'_, T, E> {
        self.raw.iter()
    }
}

impl<T, G, E, S, L, P> HotSet<T, G, E, S, L, P>
where
    G: Tombstone<T>,
{
    /// Drops every element and tombstones every slot. Keeps the buffer.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.raw.clear();
    }
}

impl<T, G, E, S, L, P> HotSet<T, G, E, S, L, P>
where
    T: Hash,
    G: Tombstone<T>,
    E: Equality<T>,
    S: BuildHasher,
    L: LoadPolicy,
    P: Probe,
{
    /// Set built from explicit collaborators, sized for `capacity` elements.
    ///
    /// # Panics
    ///
    /// On capacity overflow; aborts if the allocator fails.
    pub fn with_parts(capacity: usize, tomb: G, eq: E, hasher: S, load: L, probe: P) -> Self {
        let mut set = Self::from_raw(RawSet::new(tomb, eq, hasher, load, probe));
        if capacity > 0 {
            set.reserve(capacity);
        }
        set
    }

    pub fn find(&self, value: &T) -> Option<Bucket> {
        let _g = self.reentrancy.enter();
        match self.raw.locate_value(value) {
            Probed::Found(i) => Some(Bucket(i)),
            _ => None,
        }
    }

    /// The stored element equal to `value`.
    pub fn get(&self, value: &T) -> Option<&T> {
        let _g = self.reentrancy.enter();
        match self.raw.locate_value(value) {
            Probed::Found(i) => Some(self.raw.slot(i)),
            _ => None,
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        let _g = self.reentrancy.enter();
        matches!(self.raw.locate_value(value), Probed::Found(_))
    }

    /// Inserts `value`, overwriting an equal element in place.
    ///
    /// Returns where the element now lives and whether it was new. Growth
    /// happens only when a new element would exceed [`capacity`].
    ///
    /// # Panics
    ///
    /// On capacity overflow; aborts if the allocator fails.
    ///
    /// [`capacity`]: HotSet::capacity
    pub fn insert(&mut self, value: T) -> (Bucket, bool) {
        infallible(self.try_insert(value))
    }

    /// Like [`insert`](HotSet::insert), reporting allocation failure. On
    /// error the set is unchanged and `value` is handed back in the error.
    pub fn try_insert(&mut self, value: T) -> Result<(Bucket, bool), InsertError<T>> {
        let _g = self.reentrancy.enter();
        let (i, old) = self.raw.upsert(value)?;
        Ok((Bucket(i), old.is_none()))
    }

    /// Inserts `value` and returns the equal element it replaced, if any.
    pub fn replace(&mut self, value: T) -> Option<T> {
        let _g = self.reentrancy.enter();
        infallible(self.raw.upsert(value)).1
    }

    /// Makes room for `additional` more elements without further growth.
    pub fn reserve(&mut self, additional: usize) {
        infallible(self.try_reserve(additional))
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let _g = self.reentrancy.enter();
        self.raw.try_reserve(additional)
    }

    /// Rehashes into the smallest buffer the load policy allows for the
    /// current elements. An empty set releases its buffer.
    pub fn shrink_to_fit(&mut self) {
        let _g = self.reentrancy.enter();
        self.raw.shrink_to_fit();
    }

    /// Removes the element equal to `value`. Returns whether one was there.
    pub fn erase(&mut self, value: &T) -> bool {
        self.take(value).is_some()
    }

    /// Removes and returns the element equal to `value`.
    pub fn take(&mut self, value: &T) -> Option<T> {
        let _g = self.reentrancy.enter();
        match self.raw.locate_value(value) {
            Probed::Found(i) => Some(self.raw.remove_slot(i)),
            _ => None,
        }
    }

    /// Removes the element at `bucket`, if the slot holds one.
    pub fn erase_at(&mut self, bucket: Bucket) -> Option<T> {
        let _g = self.reentrancy.enter();
        self.raw.get_at(bucket.0)?;
        Some(self.raw.remove_slot(bucket.0))
    }
}

impl<T, E, S, L, P> HotSet<T, DynamicValue<T>, E, S, L, P>
where
    T: Hash + Clone,
    E: Equality<T>,
    S: BuildHasher,
    L: LoadPolicy,
    P: Probe,
{
    /// Switches the tombstone to `tombstone`.
    ///
    /// A live element equal to the new tombstone is erased first and
    /// returned. Every free slot is then rewritten to the new value, so no
    /// slot keeps reading as free under the old one, and the old value
    /// becomes an ordinary element.
    pub fn change_tombstone(&mut self, tombstone: T) -> Option<T> {
        let _g = self.reentrancy.enter();
        self.raw.change_tombstone(tombstone)
    }
}

impl<T, G, E, S, L, P> Default for HotSet<T, G, E, S, L, P>
where
    G: Tombstone<T> + Default,
    E: Default,
    S: Default,
    L: Default,
    P: Default,
{
    fn default() -> Self {
        Self::from_raw(RawSet::new(
            G::default(),
            E::default(),
            S::default(),
            L::default(),
            P::default(),
        ))
    }
}

impl<T, G, E, S, L, P> Clone for HotSet<T, G, E, S, L, P>
where
    T: Clone,
    G: Clone,
    E: Clone,
    S: Clone,
    L: Clone,
    P: Clone,
{
    fn clone(&self) -> Self {
        let _g = self.reentrancy.enter();
        Self::from_raw(self.raw.clone())
    }
}

impl<T, G, E, S, L, P> fmt::Debug for HotSet<T, G, E, S, L, P>
where
    T: fmt::Debug,
    E: Equality<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, G, E, S, L, P> Extend<T> for HotSet<T, G, E, S, L, P>
where
    T: Hash,
    G: Tombstone<T>,
    E: Equality<T>,
    S: BuildHasher,
    L: LoadPolicy,
    P: Probe,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T, G, E, S, L, P> FromIterator<T> for HotSet<T, G, E, S, L, P>
where
    T: Hash,
    G: Tombstone<T> + Default,
    E: Equality<T> + Default,
    S: BuildHasher + Default,
    L: LoadPolicy + Default,
    P: Probe + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<'a, T, G, E, S, L, P> IntoIterator for &'a HotSet<T, G, E, S, L, P>
where
    E: Equality<T>,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, G, E, S, L, P> IntoIterator for HotSet<T, G, E, S, L, P>
where
    E: Equality<T>,
{
    type Item = T;
    type IntoIter = IntoIter<T, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.raw.into_values()
    }
}
