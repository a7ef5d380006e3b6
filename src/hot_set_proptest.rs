#![cfg(test)]

// Property tests for HotSet kept inside the crate so they can pair the set
// with test-only hashers and probe strategies.

use crate::equality::DefaultEq;
use crate::hot_set::HotSet;
use crate::load::DefaultLoad;
use crate::probe::{Forward, Nearest, Probe};
use crate::tombstone::ConstI32;
use hashbrown::hash_map::DefaultHashBuilder;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::hash::{BuildHasher, Hasher};

type Tomb = ConstI32<{ i32::MIN }>;
type Sut<S, P> = HotSet<i32, Tomb, DefaultEq, S, DefaultLoad, P>;

#[derive(Clone, Debug)]
enum Op {
    Insert(i32),
    Replace(i32),
    Erase(i32),
    Take(i32),
    EraseAt(i32),
    Contains(i32),
    Reserve(usize),
    Shrink,
    Clear,
    Iterate,
    CloneCheck,
}

// Small value range so inserts, hits and erases of the same value interleave.
fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let v = -64i32..64;
    let op = prop_oneof![
        8 => v.clone().prop_map(Op::Insert),
        2 => v.clone().prop_map(Op::Replace),
        5 => v.clone().prop_map(Op::Erase),
        2 => v.clone().prop_map(Op::Take),
        2 => v.clone().prop_map(Op::EraseAt),
        4 => v.prop_map(Op::Contains),
        1 => (0usize..200).prop_map(Op::Reserve),
        1 => Just(Op::Shrink),
        1 => Just(Op::Clear),
        1 => Just(Op::Iterate),
        1 => Just(Op::CloneCheck),
    ];
    proptest::collection::vec(op, 1..300)
}

// State-machine equivalence against std::collections::HashSet.
// Invariants checked after every op:
// - `len` matches the model; `len <= capacity <= reserved`.
// - `reserved` is zero or a power of two no smaller than 32.
// - Every model element is found, and its bucket resolves back to it.
fn run_state_machine<S, P>(mut sut: Sut<S, P>, ops: Vec<Op>) -> Result<(), TestCaseError>
where
    S: BuildHasher + Clone,
    P: Probe + Clone,
{
    let mut model: HashSet<i32> = HashSet::new();
    for op in ops {
        match op {
            Op::Insert(v) => {
                let (b, added) = sut.insert(v);
                prop_assert_eq!(added, model.insert(v));
                prop_assert_eq!(b.get(&sut), Some(&v));
            }
            Op::Replace(v) => {
                let old = sut.replace(v);
                let had = !model.insert(v);
                prop_assert_eq!(old, had.then_some(v));
            }
            Op::Erase(v) => {
                prop_assert_eq!(sut.erase(&v), model.remove(&v));
            }
            Op::Take(v) => {
                prop_assert_eq!(sut.take(&v), model.take(&v));
            }
            Op::EraseAt(v) => match sut.find(&v) {
                Some(b) => {
                    prop_assert!(model.remove(&v));
                    prop_assert_eq!(sut.erase_at(b), Some(v));
                }
                None => prop_assert!(!model.contains(&v)),
            },
            Op::Contains(v) => {
                prop_assert_eq!(sut.contains(&v), model.contains(&v));
                prop_assert_eq!(sut.get(&v).copied(), model.get(&v).copied());
            }
            Op::Reserve(n) => {
                sut.reserve(n);
                prop_assert!(sut.capacity() >= model.len() + n);
            }
            Op::Shrink => sut.shrink_to_fit(),
            Op::Clear => {
                sut.clear();
                model.clear();
            }
            Op::Iterate => {
                let seen: Vec<i32> = sut.iter().copied().collect();
                let unique: BTreeSet<i32> = seen.iter().copied().collect();
                prop_assert_eq!(seen.len(), unique.len(), "iter yields each element once");
                let expected: BTreeSet<i32> = model.iter().copied().collect();
                prop_assert_eq!(unique, expected);
            }
            Op::CloneCheck => {
                let mut copy = sut.clone();
                copy.insert(i32::MAX);
                prop_assert!(!sut.contains(&i32::MAX));
                prop_assert_eq!(copy.len(), model.len() + 1);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.len() <= sut.capacity());
        prop_assert!(sut.capacity() <= sut.reserved());
        let reserved = sut.reserved();
        prop_assert!(reserved == 0 || (reserved.is_power_of_two() && reserved >= 32));
        for v in &model {
            let b = sut.find(v);
            prop_assert!(b.is_some(), "lost element {}", v);
            prop_assert_eq!(b.and_then(|b| b.get(&sut)), Some(v));
        }
    }
    Ok(())
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Few distinct homes: long runs that wrap around the buffer end.
#[derive(Clone, Default)]
struct CoarseBuildHasher;
struct CoarseHasher(u64);
impl BuildHasher for CoarseBuildHasher {
    type Hasher = CoarseHasher;
    fn build_hasher(&self) -> Self::Hasher {
        CoarseHasher(0)
    }
}
impl Hasher for CoarseHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(u64::from(b));
        }
    }
    fn finish(&self) -> u64 {
        // Homes 0, 29, 30, 31 in a 32-slot buffer.
        [0, 29, 30, 31][(self.0 % 4) as usize]
    }
}

// Downward linear probing: a strategy that keeps the default erase repair.
#[derive(Clone, Default)]
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

fn sut<S: BuildHasher, P: Probe>(hasher: S, probe: P) -> Sut<S, P> {
    HotSet::with_parts(0, Tomb::default(), DefaultEq, hasher, DefaultLoad, probe)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        run_state_machine(sut(DefaultHashBuilder::default(), Forward), ops)?;
    }

    #[test]
    fn prop_state_machine_with_collisions(ops in arb_ops()) {
        run_state_machine(sut(ConstBuildHasher, Forward), ops)?;
    }

    #[test]
    fn prop_state_machine_with_wrapping_runs(ops in arb_ops()) {
        run_state_machine(sut(CoarseBuildHasher, Forward), ops)?;
    }

    #[test]
    fn prop_state_machine_nearest(ops in arb_ops()) {
        run_state_machine(sut(DefaultHashBuilder::default(), Nearest), ops)?;
    }

    #[test]
    fn prop_state_machine_nearest_with_collisions(ops in arb_ops()) {
        run_state_machine(sut(CoarseBuildHasher, Nearest), ops)?;
    }

    #[test]
    fn prop_state_machine_backward_with_wrapping_runs(ops in arb_ops()) {
        run_state_machine(sut(CoarseBuildHasher, Backward), ops)?;
    }
}
