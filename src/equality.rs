//! Equality predicates. The container decides both "is this the element I
//! am looking for" and "is this slot free" through the same predicate.

/// Element comparison injected into a container.
///
/// Must agree with the container's hasher: elements that compare equal must
/// hash equally.
pub trait Equality<T: ?Sized> {
    fn equal(&self, a: &T, b: &T) -> bool;
}

/// `PartialEq` comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultEq;

impl<T: ?Sized + PartialEq> Equality<T> for DefaultEq {
    #[inline]
    fn equal(&self, a: &T, b: &T) -> bool {
        a == b
    }
}
