//! RawSet: the open-addressing table shared by every container. Elements
//! live directly in one buffer of slots; a slot is free when it compares
//! equal to the tombstone.
//!
//! Nothing here guards against reentrancy; the public containers wrap a
//! `RawSet` together with their own `DebugReentrancy`.

use crate::equality::Equality;
use crate::load::LoadPolicy;
use crate::probe::Probe;
use crate::tombstone::{DynamicValue, Tombstone};
use core::alloc::Layout;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::mem;
use hashbrown::TryReserveError;

/// Outcome of probing for an element.
pub(crate) enum Probed {
    Found(usize),
    /// Not present; the index is the first free slot of its probe sequence.
    Vacant(usize),
    /// Not present and no free slot was seen: the buffer is empty or full.
    Exhausted,
}

/// A rejected insert: the growth error and the element that did not fit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertError<T> {
    pub error: TryReserveError,
    pub value: T,
}

impl<T> From<InsertError<T>> for TryReserveError {
    fn from(e: InsertError<T>) -> Self {
        e.error
    }
}

/// Aborts on allocation failure and panics on capacity overflow, the way the
/// std collections treat their infallible growth paths.
pub(crate) fn infallible<R, X>(result: Result<R, X>) -> R
where
    X: Into<TryReserveError>,
{
    let result: Result<R, TryReserveError> = result.map_err(Into::into);
    match result {
        Ok(r) => r,
        Err(TryReserveError::CapacityOverflow) => panic!("hot-set: capacity overflow"),
        Err(TryReserveError::AllocError { layout }) => std::alloc::handle_alloc_error(layout),
    }
}

#[derive(Clone)]
pub(crate) struct RawSet<T, G, E, S, L, P> {
    slots: Vec<T>,
    occupied: usize,
    threshold: usize,
    vacant: T,
    tomb: G,
    eq: E,
    hasher: S,
    load: L,
    probe: P,
}

impl<T, G, E, S, L, P> RawSet<T, G, E, S, L, P> {
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.occupied
    }

    #[inline]
    pub(crate) fn threshold(&self) -> usize {
        self.threshold
    }

    #[inline]
    pub(crate) fn reserved(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn tombstone(&self) -> &T {
        &self.vacant
    }

    pub(crate) fn generator(&self) -> &G {
        &self.tomb
    }

    pub(crate) fn hasher(&self) -> &S {
        &self.hasher
    }

    pub(crate) fn slot(&self, index: usize) -> &T {
        &self.slots[index]
    }

    /// Mutable access for adapters that only touch the parts of an element
    /// the hash and equality ignore.
    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut T {
        &mut self.slots[index]
    }

    #[inline]
    fn debug_check(&self) {
        debug_assert!(self.occupied <= self.threshold);
        debug_assert!(self.threshold <= self.slots.len());
        debug_assert!(self.slots.is_empty() || self.slots.len().is_power_of_two());
    }
}

impl<T, G, E, S, L, P> RawSet<T, G, E, S, L, P>
where
    E: Equality<T>,
{
    /// Whether `value` reads as a free slot.
    #[inline]
    pub(crate) fn is_tombstone(&self, value: &T) -> bool {
        self.eq.equal(&self.vacant, value)
    }

    /// The element in slot `index`, if it holds one.
    pub(crate) fn get_at(&self, index: usize) -> Option<&T> {
        self.slots
            .get(index)
            .filter(|slot| !self.is_tombstone(slot))
    }

    pub(crate) fn iter(&self) -> Iter<'_, T, E> {
        Iter {
            slots: self.slots.iter(),
            vacant: &self.vacant,
            eq: &self.eq,
            remaining: self.occupied,
        }
    }

    pub(crate) fn iter_mut(&mut self) -> IterMut<'_, T, E> {
        IterMut {
            slots: self.slots.iter_mut(),
            vacant: &self.vacant,
            eq: &self.eq,
            remaining: self.occupied,
        }
    }

    pub(crate) fn into_values(self) -> IntoIter<T, E> {
        IntoIter {
            slots: self.slots.into_iter(),
            vacant: self.vacant,
            eq: self.eq,
            remaining: self.occupied,
        }
    }
}

impl<T, G, E, S, L, P> RawSet<T, G, E, S, L, P>
where
    G: Tombstone<T>,
{
    /// Uninitialized table: no buffer, zero capacity.
    pub(crate) fn new(tomb: G, eq: E, hasher: S, load: L, probe: P) -> Self {
        Self {
            slots: Vec::new(),
            occupied: 0,
            threshold: 0,
            vacant: tomb.tombstone(),
            tomb,
            eq,
            hasher,
            load,
            probe,
        }
    }

    /// Drops every element and tombstones every slot. Keeps the buffer.
    pub(crate) fn clear(&mut self) {
        let tomb = &self.tomb;
        for slot in self.slots.iter_mut() {
            *slot = tomb.tombstone();
        }
        self.occupied = 0;
    }

    /// A buffer of `len` tombstones, allocated fallibly.
    fn filled(&self, len: usize) -> Result<Vec<T>, TryReserveError> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(len)
            .map_err(|_| match Layout::array::<T>(len) {
                Ok(layout) => TryReserveError::AllocError { layout },
                Err(_) => TryReserveError::CapacityOverflow,
            })?;
        slots.resize_with(len, || self.tomb.tombstone());
        Ok(slots)
    }
}

impl<T, G, E, S, L, P> RawSet<T, G, E, S, L, P>
where
    T: Hash,
    G: Tombstone<T>,
    E: Equality<T>,
    S: BuildHasher,
    L: LoadPolicy,
    P: Probe,
{
    #[inline]
    pub(crate) fn hash_of<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    #[inline]
    fn home(&self, hash: u64) -> usize {
        debug_assert!(!self.slots.is_empty());
        (hash as usize) & (self.slots.len() - 1)
    }

    /// Probes from the home slot of `hash` until a slot is free or
    /// `is_match` accepts it.
    pub(crate) fn locate<F>(&self, hash: u64, mut is_match: F) -> Probed
    where
        F: FnMut(&T) -> bool,
    {
        if self.slots.is_empty() {
            return Probed::Exhausted;
        }
        let mut found = false;
        let hit = self.probe.probe(self.slots.len(), self.home(hash), |i| {
            let slot = &self.slots[i];
            if self.is_tombstone(slot) {
                true
            } else if is_match(slot) {
                found = true;
                true
            } else {
                false
            }
        });
        match hit {
            Some(i) if found => Probed::Found(i),
            Some(i) => Probed::Vacant(i),
            None => Probed::Exhausted,
        }
    }

    /// Probes for an element equal to `value` under the set's predicate.
    pub(crate) fn locate_value(&self, value: &T) -> Probed {
        let hash = self.hash_of(value);
        self.locate(hash, |slot| self.eq.equal(value, slot))
    }

    /// Calls `f` on every live slot of the probe sequence of `hash`, up to
    /// the first free slot.
    pub(crate) fn scan<F>(&self, hash: u64, mut f: F)
    where
        F: FnMut(usize, &T),
    {
        if self.slots.is_empty() {
            return;
        }
        self.probe.probe(self.slots.len(), self.home(hash), |i| {
            let slot = &self.slots[i];
            if self.is_tombstone(slot) {
                return true;
            }
            f(i, slot);
            false
        });
    }

    /// First free slot of the probe sequence of `hash`. No equality checks:
    /// used only for elements known to be absent.
    fn free_slot(&self, hash: u64) -> usize {
        self.probe
            .probe(self.slots.len(), self.home(hash), |i| {
                self.is_tombstone(&self.slots[i])
            })
            .expect("buffer below its load threshold has a free slot")
    }

    /// Inserts `value`, overwriting an equal element in place. Returns the
    /// slot of `value` and the element it overwrote.
    ///
    /// Growth happens only when a new element would exceed the threshold. On
    /// error nothing has changed and `value` comes back inside the error.
    pub(crate) fn upsert(&mut self, value: T) -> Result<(usize, Option<T>), InsertError<T>> {
        let hash = self.hash_of(&value);
        let index = match self.locate(hash, |slot| self.eq.equal(&value, slot)) {
            Probed::Found(i) => return Ok((i, Some(mem::replace(&mut self.slots[i], value)))),
            Probed::Vacant(i) if self.occupied < self.threshold => i,
            _ => match self.grow() {
                Ok(()) => self.free_slot(hash),
                Err(error) => return Err(InsertError { error, value }),
            },
        };
        self.slots[index] = value;
        self.occupied += 1;
        self.debug_check();
        Ok((index, None))
    }

    /// Moves to the next buffer size that has room for one more element.
    fn grow(&mut self) -> Result<(), TryReserveError> {
        let mut slots = self.slots.len();
        loop {
            slots = self
                .load
                .grown_slots(slots)
                .ok_or(TryReserveError::CapacityOverflow)?;
            if self.load.occupancy(slots) > self.occupied {
                break;
            }
        }
        self.rehash(slots)
    }

    /// Migrates every live element into a fresh buffer of `len` slots. The
    /// new buffer is allocated before the old one is touched.
    fn rehash(&mut self, len: usize) -> Result<(), TryReserveError> {
        debug_assert!(len.is_power_of_two());
        debug_assert!(self.load.occupancy(len) >= self.occupied);
        let fresh = self.filled(len)?;
        let old = mem::replace(&mut self.slots, fresh);
        self.threshold = self.load.occupancy(len).min(len);
        for value in old {
            if self.is_tombstone(&value) {
                continue;
            }
            let i = self.free_slot(self.hash_of(&value));
            self.slots[i] = value;
        }
        self.debug_check();
        Ok(())
    }

    /// Makes room for `additional` more elements without further growth.
    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let wanted = self
            .occupied
            .checked_add(additional)
            .ok_or(TryReserveError::CapacityOverflow)?;
        if wanted <= self.threshold {
            return Ok(());
        }
        let slots = self
            .load
            .required_slots(wanted)
            .ok_or(TryReserveError::CapacityOverflow)?;
        if slots > self.slots.len() {
            self.rehash(slots)?;
        }
        Ok(())
    }

    /// Rehashes into the smallest buffer the load policy allows for the
    /// current elements. An empty table releases its buffer.
    pub(crate) fn shrink_to_fit(&mut self) {
        if self.occupied == 0 {
            self.slots = Vec::new();
            self.threshold = 0;
            return;
        }
        if let Some(slots) = self.load.required_slots(self.occupied) {
            if slots < self.slots.len() {
                infallible(self.rehash(slots));
            }
        }
    }

    /// Vacates slot `index` and repairs the probe runs that crossed it. The
    /// structure is consistent again before the element is handed back.
    pub(crate) fn remove_slot(&mut self, index: usize) -> T {
        let vacant = self.tomb.tombstone();
        let value = mem::replace(&mut self.slots[index], vacant);
        self.occupied -= 1;
        if self.probe.forward_only() {
            self.repair_forward(index);
        } else {
            self.repair_run(index);
        }
        self.debug_check();
        value
    }

    /// Partial rehash for forward probing: every element after the vacancy,
    /// up to the next free slot, is lifted and re-placed from its own home.
    /// Nothing past that free slot can have probed through the vacancy.
    fn repair_forward(&mut self, vacancy: usize) {
        let mask = self.slots.len() - 1;
        let mut i = vacancy;
        for _ in 1..self.slots.len() {
            i = (i + 1) & mask;
            if self.is_tombstone(&self.slots[i]) {
                break;
            }
            let vacant = self.tomb.tombstone();
            let value = mem::replace(&mut self.slots[i], vacant);
            let to = self.free_slot(self.hash_of(&value));
            self.slots[to] = value;
        }
    }

    /// Partial rehash for every other strategy: the whole occupied run around
    /// the vacancy is lifted, then each element is re-placed from its own
    /// home.
    fn repair_run(&mut self, vacancy: usize) {
        let len = self.slots.len();
        let mask = len - 1;
        let mut lifted = Vec::new();
        let mut i = vacancy;
        for _ in 1..len {
            i = (i + 1) & mask;
            if self.is_tombstone(&self.slots[i]) {
                break;
            }
            let vacant = self.tomb.tombstone();
            lifted.push(mem::replace(&mut self.slots[i], vacant));
        }
        // Lifted slots read as free, so this walk cannot wrap into them.
        let mut i = vacancy;
        for _ in 1..len {
            i = i.wrapping_sub(1) & mask;
            if self.is_tombstone(&self.slots[i]) {
                break;
            }
            let vacant = self.tomb.tombstone();
            lifted.push(mem::replace(&mut self.slots[i], vacant));
        }
        for value in lifted {
            let to = self.free_slot(self.hash_of(&value));
            self.slots[to] = value;
        }
    }
}

impl<T, E, S, L, P> RawSet<T, DynamicValue<T>, E, S, L, P>
where
    T: Hash + Clone,
    E: Equality<T>,
    S: BuildHasher,
    L: LoadPolicy,
    P: Probe,
{
    /// Evicts a live element equal to `tombstone`, then rewrites every free
    /// slot to the new value and swaps the generator.
    pub(crate) fn change_tombstone(&mut self, tombstone: T) -> Option<T> {
        let evicted = match self.locate_value(&tombstone) {
            Probed::Found(i) => Some(self.remove_slot(i)),
            _ => None,
        };
        for slot in self.slots.iter_mut() {
            if self.eq.equal(&self.vacant, slot) {
                *slot = tombstone.clone();
            }
        }
        self.tomb.set(tombstone.clone());
        self.vacant = tombstone;
        self.debug_check();
        evicted
    }
}

/// Iterator over the live elements of a set, in bucket order.
pub struct Iter<'a, T, E> {
    slots: core::slice::Iter<'a, T>,
    vacant: &'a T,
    eq: &'a E,
    remaining: usize,
}

impl<T, E> Clone for Iter<'_, T, E> {
    fn clone(&self) -> Self {
        Iter {
            slots: self.slots.clone(),
            vacant: self.vacant,
            eq: self.eq,
            remaining: self.remaining,
        }
    }
}

impl<'a, T, E: Equality<T>> Iterator for Iter<'a, T, E> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (vacant, eq) = (self.vacant, self.eq);
        let next = self.slots.find(|slot| !eq.equal(vacant, slot))?;
        self.remaining -= 1;
        Some(next)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, E: Equality<T>> ExactSizeIterator for Iter<'_, T, E> {}
impl<T, E: Equality<T>> FusedIterator for Iter<'_, T, E> {}

/// Mutable iteration for the map adapters; never exposed for whole elements.
pub(crate) struct IterMut<'a, T, E> {
    slots: core::slice::IterMut<'a, T>,
    vacant: &'a T,
    eq: &'a E,
    remaining: usize,
}

impl<'a, T, E: Equality<T>> Iterator for IterMut<'a, T, E> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (vacant, eq) = (self.vacant, self.eq);
        let next = self.slots.find(|slot| !eq.equal(vacant, slot))?;
        self.remaining -= 1;
        Some(next)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Owning iterator over the live elements of a set.
pub struct IntoIter<T, E> {
    slots: std::vec::IntoIter<T>,
    vacant: T,
    eq: E,
    remaining: usize,
}

impl<T, E: Equality<T>> Iterator for IntoIter<T, E> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        let (vacant, eq) = (&self.vacant, &self.eq);
        let next = self.slots.find(|slot| !eq.equal(vacant, slot))?;
        self.remaining -= 1;
        Some(next)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, E: Equality<T>> ExactSizeIterator for IntoIter<T, E> {}
impl<T, E: Equality<T>> FusedIterator for IntoIter<T, E> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equality::DefaultEq;
    use crate::load::DefaultLoad;
    use crate::probe::{Forward, Nearest};
    use crate::tombstone::ConstI32;
    use core::hash::Hasher;
    use std::collections::BTreeSet;

    /// Hashes an integer to itself, so home slots are predictable.
    #[derive(Clone, Default)]
    struct IdentityBuildHasher;
    struct IdentityHasher(u64);
    impl BuildHasher for IdentityBuildHasher {
        type Hasher = IdentityHasher;
        fn build_hasher(&self) -> Self::Hasher {
            IdentityHasher(0)
        }
    }
    impl Hasher for IdentityHasher {
        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = (self.0 << 8) | u64::from(b);
            }
        }
        fn write_i32(&mut self, i: i32) {
            self.0 = i as u32 as u64;
        }
        fn finish(&self) -> u64 {
            self.0
        }
    }

    type Raw<P> = RawSet<i32, ConstI32<-1>, DefaultEq, IdentityBuildHasher, DefaultLoad, P>;

    fn raw<P: Probe>(probe: P, values: &[i32]) -> Raw<P> {
        let mut r = RawSet::new(ConstI32::<-1>, DefaultEq, IdentityBuildHasher, DefaultLoad, probe);
        for &v in values {
            infallible(r.upsert(v));
        }
        r
    }

    fn index_of<P: Probe>(r: &Raw<P>, v: i32) -> Option<usize> {
        match r.locate_value(&v) {
            Probed::Found(i) => Some(i),
            _ => None,
        }
    }

    fn erase<P: Probe>(r: &mut Raw<P>, v: i32) -> bool {
        match index_of(r, v) {
            Some(i) => {
                r.remove_slot(i);
                true
            }
            None => false,
        }
    }

    #[test]
    fn empty_table_probes_nothing() {
        let r = raw(Forward, &[]);
        assert!(matches!(r.locate_value(&3), Probed::Exhausted));
        let mut seen = 0;
        r.scan(3, |_, _| seen += 1);
        assert_eq!(seen, 0);
    }

    #[test]
    fn first_upsert_allocates_minimum_buffer() {
        let r = raw(Forward, &[7]);
        assert_eq!(r.reserved(), 32);
        assert_eq!(r.threshold(), 20);
        assert_eq!(index_of(&r, 7), Some(7));
    }

    #[test]
    fn forward_erase_pulls_back_displaced_elements() {
        // 1, 33 and 65 share home slot 1; 2 is displaced behind them.
        let mut r = raw(Forward, &[1, 33, 65, 2]);
        assert_eq!(index_of(&r, 1), Some(1));
        assert_eq!(index_of(&r, 33), Some(2));
        assert_eq!(index_of(&r, 65), Some(3));
        assert_eq!(index_of(&r, 2), Some(4));

        assert!(erase(&mut r, 33));
        assert_eq!(index_of(&r, 65), Some(2));
        assert_eq!(index_of(&r, 2), Some(3));
        assert!(r.is_tombstone(r.slot(4)));
        assert_eq!(index_of(&r, 1), Some(1));
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn forward_erase_repairs_across_the_wrap() {
        // Home 31 for all three; two of them wrap to slots 0 and 1.
        let mut r = raw(Forward, &[31, 63, 95]);
        assert_eq!(index_of(&r, 95), Some(1));
        assert!(erase(&mut r, 31));
        assert_eq!(index_of(&r, 63), Some(31));
        assert_eq!(index_of(&r, 95), Some(0));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn forward_erase_stops_at_run_boundary() {
        // 10 sits alone after a free slot; the repair walk must not reach it.
        let mut r = raw(Forward, &[1, 33, 10]);
        assert!(erase(&mut r, 1));
        assert_eq!(index_of(&r, 33), Some(1));
        assert_eq!(index_of(&r, 10), Some(10));
    }

    #[test]
    fn nearest_erase_repairs_elements_before_the_vacancy() {
        // Home 5 for every value: slots 5, 6, 4, 7 in nearest order.
        let mut r = raw(Nearest, &[5, 37, 69, 101]);
        assert_eq!(index_of(&r, 69), Some(4));
        assert_eq!(index_of(&r, 101), Some(7));
        assert!(erase(&mut r, 5));
        for v in [37, 69, 101] {
            assert!(index_of(&r, v).is_some(), "lost {v}");
        }
        assert_eq!(index_of(&r, 5), None);
        let occupied: BTreeSet<usize> = [37, 69, 101]
            .iter()
            .filter_map(|&v| index_of(&r, v))
            .collect();
        assert_eq!(occupied, BTreeSet::from([4, 5, 6]));
    }

    /// Linear probing downwards: `start, start - 1, .., 0, len - 1, ..`.
    struct Backward;
    impl Probe for Backward {
        fn probe<F>(&self, len: usize, start: usize, mut hit: F) -> Option<usize>
        where
            F: FnMut(usize) -> bool,
        {
            if len == 0 {
                return None;
            }
            (0..=start).rev().chain((start + 1..len).rev()).find(|&i| hit(i))
        }
    }

    #[test]
    fn custom_strategy_gets_whole_run_repair() {
        // 37 shares home 5 and lands below it at slot 4.
        let mut r = raw(Backward, &[5, 37]);
        assert_eq!(index_of(&r, 37), Some(4));
        assert!(erase(&mut r, 5));
        assert_eq!(index_of(&r, 37), Some(5));
        assert_eq!(r.len(), 1);

        // Same across the wrap: 32 shares home 0 and lands at slot 31.
        let mut r = raw(Backward, &[0, 32, 64]);
        assert_eq!(index_of(&r, 32), Some(31));
        assert_eq!(index_of(&r, 64), Some(30));
        assert!(erase(&mut r, 0));
        for v in [32, 64] {
            assert!(index_of(&r, v).is_some(), "lost {v}");
        }
        assert_eq!(index_of(&r, 0), None);
    }

    #[test]
    fn scan_visits_the_probe_run() {
        let r = raw(Forward, &[1, 33, 65, 4]);
        let mut seen = Vec::new();
        r.scan(1, |i, v| seen.push((i, *v)));
        assert_eq!(seen, vec![(1, 1), (2, 33), (3, 65), (4, 4)]);
    }

    #[test]
    fn growth_keeps_every_element() {
        let values: Vec<i32> = (0..21).map(|i| i * 32).collect();
        let r = raw(Forward, &values);
        assert_eq!(r.reserved(), 64);
        assert_eq!(r.threshold(), 40);
        for v in values {
            assert!(index_of(&r, v).is_some());
        }
    }
}
