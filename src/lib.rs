//! hot-set: open-addressing hash containers that keep elements inline in one
//! buffer and mark free slots with a reserved tombstone value instead of
//! per-slot metadata.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a cache-friendly set for small, cheap-to-compare elements, with a
//!   map and a multimap sharing the same table.
//! - Layers:
//!   - RawSet<T, ...>: the table. Slot addressing, probing, growth, and
//!     erase with an immediate partial rehash of the disturbed probe run.
//!     No reentrancy tracking.
//!   - HotSet<T, ...>: public set over RawSet plus a debug-only reentrancy
//!     guard around every entry point.
//!   - HotMap<K, V, ...> / HotMultiMap<K, V, ...>: the same table storing
//!     `Pair<K, V>`; the map compares keys only, the multimap the whole pair.
//! - Collaborators are type parameters: tombstone generator, equality,
//!   hasher, load policy, probe strategy.
//!
//! Constraints
//! - A slot is free exactly when it compares equal to the tombstone under the
//!   container's equality. Inserting the tombstone itself is a logic error
//!   and is not checked.
//! - Buffer length is zero or a power of two, at least 32 once allocated.
//! - `len() <= capacity() <= reserved()` at all times.
//! - No tombstone debt: after erase, every remaining element is reachable
//!   from its home slot without crossing a free slot.
//! - Single-threaded: the containers are `Send` when their parts are, never
//!   `Sync` (the reentrancy guard uses a `Cell`).
//!
//! Reentrancy policy
//! - Every public method opens a guarded section before calling user `Hash`
//!   or `Eq` code. In debug builds, calling back into the same container from
//!   those callbacks panics instead of observing a half-repaired probe run.
//!   Release builds skip the check.
//!
//! Failure semantics
//! - `try_reserve` reports `TryReserveError` and `try_insert` reports
//!   `InsertError`, which carries the rejected element back. On error the
//!   container is unchanged. The infallible forms panic on capacity
//!   overflow and abort on allocator failure.
//!
//! Non-goals
//! - No concurrent access.
//! - No iterator or `Bucket` stability across growth or erase.
//! - No protection against inserting the tombstone value.

pub mod equality;
pub mod hot_map;
pub mod hot_multimap;
pub mod hot_set;
mod hot_set_proptest;
pub mod load;
pub mod pair;
pub mod probe;
mod raw_set;
mod reentrancy;
pub mod tombstone;

// Public surface
pub use equality::{DefaultEq, Equality};
pub use hashbrown::hash_map::DefaultHashBuilder;
pub use hashbrown::TryReserveError;
pub use hot_map::HotMap;
pub use hot_multimap::HotMultiMap;
pub use hot_set::{Bucket, HotSet, InsertError};
pub use load::{DefaultLoad, LoadPolicy};
pub use pair::{ByKey, Pair};
pub use probe::{Forward, Nearest, Probe};
pub use tombstone::{DefaultValue, DynamicValue, PairTombstone, Tombstone};
