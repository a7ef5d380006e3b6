use hot_set::tombstone::{ConstChar, ConstI32, ConstU64};
use hot_set::{
    DefaultEq, DefaultHashBuilder, DefaultLoad, DynamicValue, Forward, HotSet, InsertError,
    LoadPolicy, Nearest, TryReserveError,
};
use std::cell::Cell;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

type IntSet = HotSet<i32, ConstI32<-1>>;

#[test]
fn grows_only_past_the_threshold() {
    let mut s = IntSet::new();
    for i in 0..20 {
        s.insert(i);
    }
    assert_eq!(s.reserved(), 32);
    assert_eq!(s.capacity(), 20);
    s.insert(20);
    assert_eq!(s.reserved(), 64);
    assert_eq!(s.capacity(), 40);
    assert_eq!(s.len(), 21);
    for i in 0..=20 {
        assert!(s.contains(&i));
    }
}

#[test]
fn erasing_every_other_element_keeps_the_rest_reachable() {
    let mut s = IntSet::new();
    for i in 0..1000 {
        s.insert(i);
    }
    for i in (0..1000).step_by(2) {
        assert!(s.erase(&i));
    }
    assert_eq!(s.len(), 500);
    for i in 0..1000 {
        assert_eq!(s.contains(&i), i % 2 == 1, "value {i}");
    }
    // Reinsert the erased half; nothing is duplicated.
    for i in (0..1000).step_by(2) {
        let (_, added) = s.insert(i);
        assert!(added);
    }
    assert_eq!(s.len(), 1000);
    assert_eq!(s.iter().count(), 1000);
}

#[test]
fn nearest_probing_behaves_like_forward() {
    let mut fwd: HotSet<u64, ConstU64<{ u64::MAX }>> = HotSet::new();
    let mut near: HotSet<u64, ConstU64<{ u64::MAX }>, DefaultEq, DefaultHashBuilder, DefaultLoad, Nearest> =
        HotSet::with_parts(
            0,
            ConstU64::<{ u64::MAX }>,
            DefaultEq,
            DefaultHashBuilder::default(),
            DefaultLoad,
            Nearest,
        );
    for i in 0..3000u64 {
        fwd.insert(i * 7);
        near.insert(i * 7);
    }
    for i in (0..3000u64).filter(|i| i % 3 == 0) {
        assert_eq!(fwd.erase(&(i * 7)), near.erase(&(i * 7)));
    }
    let a: BTreeSet<u64> = fwd.iter().copied().collect();
    let b: BTreeSet<u64> = near.iter().copied().collect();
    assert_eq!(a, b);
    assert_eq!(fwd.len(), 2000);
}

#[test]
fn copies_are_independent() {
    let mut a = IntSet::new();
    a.extend([1, 2, 3]);
    let mut b = a.clone();
    b.insert(4);
    b.erase(&1);
    assert!(a.contains(&1));
    assert!(!a.contains(&4));
    assert!(!b.contains(&1));
    assert!(b.contains(&4));
    assert_eq!(a.len(), 3);
    assert_eq!(b.len(), 3);
}

#[test]
fn runtime_tombstone_for_strings() {
    let mut s: HotSet<String, DynamicValue<String>> =
        HotSet::with_tombstone(DynamicValue::new(String::new()));
    for w in ["alpha", "beta", "gamma"] {
        s.insert(w.to_string());
    }
    assert!(s.contains(&"beta".to_string()));
    assert!(s.is_tombstone(&String::new()));
    assert_eq!(s.change_tombstone("beta".to_string()), Some("beta".to_string()));
    assert!(!s.contains(&"beta".to_string()));
    s.insert(String::new());
    assert!(s.contains(&String::new()));
    assert_eq!(s.len(), 3);
}

#[test]
fn char_tombstone() {
    let s: HotSet<char, ConstChar<'\0'>> = "hello world".chars().collect();
    assert_eq!(s.len(), 8);
    assert!(s.contains(&'w'));
    assert!(!s.contains(&'z'));
}

#[test]
fn with_capacity_avoids_growth() {
    let mut s = IntSet::with_capacity(500);
    let reserved = s.reserved();
    assert!(s.capacity() >= 500);
    for i in 0..500 {
        s.insert(i);
    }
    assert_eq!(s.reserved(), reserved);
}

#[test]
fn reserve_overflow_is_reported() {
    let mut s = IntSet::new();
    s.insert(1);
    assert_eq!(
        s.try_reserve(usize::MAX),
        Err(TryReserveError::CapacityOverflow)
    );
    assert!(s.contains(&1));
    assert_eq!(s.reserved(), 32);
}

// One 32-slot buffer holding 16 elements, and no way to grow past it.
#[derive(Clone, Copy, Default)]
struct NoGrowth;

impl LoadPolicy for NoGrowth {
    fn occupancy(&self, slots: usize) -> usize {
        slots / 2
    }
    fn required_slots(&self, elements: usize) -> Option<usize> {
        (elements <= 16).then_some(if elements == 0 { 0 } else { 32 })
    }
    fn grown_slots(&self, slots: usize) -> Option<usize> {
        (slots == 0).then_some(32)
    }
}

#[test]
fn failed_insert_hands_the_element_back() {
    let mut s: HotSet<String, DynamicValue<String>, DefaultEq, DefaultHashBuilder, NoGrowth> =
        HotSet::with_parts(
            0,
            DynamicValue::new(String::new()),
            DefaultEq,
            DefaultHashBuilder::default(),
            NoGrowth,
            Forward,
        );
    for i in 0..16 {
        assert!(s.try_insert(i.to_string()).is_ok());
    }
    assert_eq!(s.len(), s.capacity());
    let err = s.try_insert("late".to_string()).unwrap_err();
    assert_eq!(
        err,
        InsertError {
            error: TryReserveError::CapacityOverflow,
            value: "late".to_string(),
        }
    );
    assert_eq!(s.len(), 16);
    assert_eq!(s.reserved(), 32);
    assert!(!s.contains(&"late".to_string()));
    // A present element is overwritten in place and needs no room.
    assert_eq!(s.try_insert("3".to_string()).map(|(_, added)| added), Ok(false));
}

#[test]
fn into_iter_yields_owned_elements() {
    let s: HotSet<String, DynamicValue<String>> = {
        let mut s = HotSet::with_tombstone(DynamicValue::new(String::new()));
        s.insert("x".to_string());
        s.insert("y".to_string());
        s
    };
    let mut owned: Vec<String> = s.into_iter().collect();
    owned.sort();
    assert_eq!(owned, ["x", "y"]);
}

#[test]
fn sets_are_send() {
    fn assert_send<T: Send>() {}
    assert_send::<IntSet>();
    assert_send::<HotSet<String, DynamicValue<String>, DefaultEq, DefaultHashBuilder, DefaultLoad, Forward>>();
}

type Loopback = HotSet<Reentrant, DynamicValue<Reentrant>>;

// Element whose `Hash` reaches back into the set it is looked up in and
// records whether the set held its id.
#[derive(Clone, Debug)]
struct Reentrant {
    id: i32,
    set: Cell<*const Loopback>,
    seen: Cell<Option<bool>>,
}

impl Reentrant {
    fn new(id: i32) -> Self {
        Self {
            id,
            set: Cell::new(std::ptr::null()),
            seen: Cell::new(None),
        }
    }
}

impl PartialEq for Reentrant {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for Reentrant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let set = self.set.get();
        if !set.is_null() {
            // SAFETY: the test keeps the set alive for the whole lookup.
            let found = unsafe { (*set).contains(&Reentrant::new(self.id)) };
            self.seen.set(Some(found));
        }
        self.id.hash(state);
    }
}

#[cfg(debug_assertions)]
#[test]
fn reentrancy_from_hash_panics_in_debug() {
    let mut s: Loopback = HotSet::with_tombstone(DynamicValue::new(Reentrant::new(-1)));
    s.insert(Reentrant::new(1));
    let probe = Reentrant::new(1);
    probe.set.set(&s as *const Loopback);
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = s.contains(&probe);
    }));
    assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    // The guard is released by unwinding; the set stays usable.
    probe.set.set(std::ptr::null());
    assert!(s.contains(&probe));
}

#[test]
fn callbacks_outside_a_lookup_may_use_the_set() {
    let mut s: Loopback = HotSet::with_tombstone(DynamicValue::new(Reentrant::new(-1)));
    s.insert(Reentrant::new(1));
    let probe = Reentrant::new(1);
    let stranger = Reentrant::new(2);
    probe.set.set(&s as *const Loopback);
    stranger.set.set(&s as *const Loopback);
    // Hashing directly is not inside any guarded section.
    let mut h = std::collections::hash_map::DefaultHasher::new();
    probe.hash(&mut h);
    stranger.hash(&mut h);
    assert_eq!(probe.seen.get(), Some(true));
    assert_eq!(stranger.seen.get(), Some(false));
    // The set is still usable once the callbacks are detached.
    probe.set.set(std::ptr::null());
    assert!(s.contains(&probe));
    assert!(!s.contains(&Reentrant::new(2)));
}
