//! Load policies: how full a buffer may get and how large the next one is.

/// Smallest buffer the containers ever allocate.
pub const MIN_SLOTS: usize = 32;

/// Sizing contract between the core container and its buffer.
///
/// Every slot count handed out must be a power of two; the core derives the
/// home slot of a hash with a bit mask.
pub trait LoadPolicy {
    /// How many live elements `slots` slots may hold before growth.
    fn occupancy(&self, slots: usize) -> usize;

    /// Slots needed so that `elements` fit without growth. `None` on overflow.
    fn required_slots(&self, elements: usize) -> Option<usize>;

    /// Slot count that replaces a full buffer of `slots` slots. Strictly
    /// larger, never below [`MIN_SLOTS`]. `None` on overflow.
    fn grown_slots(&self, slots: usize) -> Option<usize>;
}

/// Caps the load factor at 62.5% and doubles on growth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultLoad;

impl LoadPolicy for DefaultLoad {
    #[inline]
    fn occupancy(&self, slots: usize) -> usize {
        let half = slots >> 1;
        half + (half >> 2)
    }

    fn required_slots(&self, elements: usize) -> Option<usize> {
        if elements == 0 {
            return Some(0);
        }
        // Fewer slots than elements never fit, so at most one doubling remains.
        let mut slots = elements.checked_next_power_of_two()?.max(MIN_SLOTS);
        while self.occupancy(slots) < elements {
            slots = slots.checked_mul(2)?;
        }
        Some(slots)
    }

    #[inline]
    fn grown_slots(&self, slots: usize) -> Option<usize> {
        Some(slots.checked_mul(2)?.max(MIN_SLOTS))
    }
}
