//! Tombstone generators: the reserved value that marks a slot as free.
//!
//! A container asks its generator for the tombstone when it fills a new
//! buffer and when it vacates a slot. The value must never be inserted as a
//! live element; nothing checks this.

use crate::pair::Pair;

/// Produces the reserved "free slot" value.
pub trait Tombstone<T> {
    fn tombstone(&self) -> T;
}

macro_rules! const_tombstones {
    ($($name:ident: $t:ty),* $(,)?) => {$(
        #[doc = concat!("Tombstone fixed at compile time to the `", stringify!($t), "` constant `V`.")]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $name<const V: $t>;

        impl<const V: $t> Tombstone<$t> for $name<V> {
            #[inline]
            fn tombstone(&self) -> $t {
                V
            }
        }
    )*};
}

const_tombstones!(
    ConstI8: i8,
    ConstI16: i16,
    ConstI32: i32,
    ConstI64: i64,
    ConstI128: i128,
    ConstIsize: isize,
    ConstU8: u8,
    ConstU16: u16,
    ConstU32: u32,
    ConstU64: u64,
    ConstU128: u128,
    ConstUsize: usize,
    ConstChar: char,
);

/// Tombstone held at runtime. A `HotSet` built on it can switch to another
/// value with `change_tombstone`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DynamicValue<T> {
    value: T,
}

impl<T> DynamicValue<T> {
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub(crate) fn set(&mut self, value: T) -> T {
        core::mem::replace(&mut self.value, value)
    }
}

impl<T: Clone> Tombstone<T> for DynamicValue<T> {
    #[inline]
    fn tombstone(&self) -> T {
        self.value.clone()
    }
}

/// `T::default()`. Mostly useful for the value half of a map tombstone,
/// where a key-only comparison never looks at it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DefaultValue;

impl<T: Default> Tombstone<T> for DefaultValue {
    #[inline]
    fn tombstone(&self) -> T {
        T::default()
    }
}

/// Builds a [`Pair`] tombstone from a key generator and a value generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PairTombstone<GK, GV = DefaultValue> {
    pub key: GK,
    pub value: GV,
}

impl<GK, GV> PairTombstone<GK, GV> {
    pub const fn new(key: GK, value: GV) -> Self {
        Self { key, value }
    }
}

impl<K, V, GK, GV> Tombstone<Pair<K, V>> for PairTombstone<GK, GV>
where
    GK: Tombstone<K>,
    GV: Tombstone<V>,
{
    #[inline]
    fn tombstone(&self) -> Pair<K, V> {
        Pair::new(self.key.tombstone(), self.value.tombstone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_generators_yield_their_parameter() {
        assert_eq!(ConstI32::<-1>.tombstone(), -1);
        assert_eq!(ConstU64::<{ u64::MAX }>.tombstone(), u64::MAX);
        assert_eq!(ConstChar::<'\0'>.tombstone(), '\0');
    }

    #[test]
    fn dynamic_value_can_be_swapped() {
        let mut g = DynamicValue::new(String::from("gone"));
        assert_eq!(g.tombstone(), "gone");
        assert_eq!(g.set(String::new()), "gone");
        assert_eq!(g.get(), "");
        assert_eq!(g.tombstone(), "");
    }

    #[test]
    fn pair_tombstone_combines_halves() {
        let g = PairTombstone::new(ConstI32::<-1>, DefaultValue);
        let t: Pair<i32, Option<&str>> = g.tombstone();
        assert_eq!(t, Pair::new(-1, None));

        let g = PairTombstone::new(DynamicValue::new(0u8), DynamicValue::new('x'));
        assert_eq!(g.tombstone(), Pair::new(0u8, 'x'));
    }
}
