//! Probe strategies: the order in which slots are visited after a collision.

/// Visits slot indices of a buffer of `len` slots, beginning at `start`.
///
/// `probe` returns the first index for which `hit` returns true, or `None`
/// once every slot has been visited. Each slot is visited at most once, so a
/// probe over a buffer that holds at least one tombstone always terminates
/// with a hit in a single pass.
///
/// The slots visited before any given slot must form a contiguous window
/// (wrapping) that contains `start`. Erase relies on this: everything that
/// probed through a vacated slot sits in the same occupied run.
pub trait Probe {
    fn probe<F>(&self, len: usize, start: usize, hit: F) -> Option<usize>
    where
        F: FnMut(usize) -> bool;

    /// Whether elements only ever sit at or after their home slot. Erase
    /// then repairs just the slots after a vacancy; otherwise it lifts and
    /// re-places the whole occupied run around it.
    fn forward_only(&self) -> bool {
        false
    }
}

/// Linear probing: `start, start + 1, .., len - 1, 0, .., start - 1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Forward;

impl Probe for Forward {
    #[inline]
    fn probe<F>(&self, len: usize, start: usize, mut hit: F) -> Option<usize>
    where
        F: FnMut(usize) -> bool,
    {
        debug_assert!(start < len || len == 0);
        (start..len).chain(0..start).find(|&i| hit(i))
    }

    #[inline]
    fn forward_only(&self) -> bool {
        true
    }
}

/// Visits slots by increasing distance from `start`, alternating sides:
/// `start, start + 1, start - 1, start + 2, start - 2, ..`, wrapping at both
/// ends of the buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Nearest;

impl Probe for Nearest {
    fn probe<F>(&self, len: usize, start: usize, mut hit: F) -> Option<usize>
    where
        F: FnMut(usize) -> bool,
    {
        if len == 0 {
            return None;
        }
        debug_assert!(start < len);
        if hit(start) {
            return Some(start);
        }
        for d in 1..=len / 2 {
            let ahead = if d < len - start {
                start + d
            } else {
                d - (len - start)
            };
            if hit(ahead) {
                return Some(ahead);
            }
            // With an even length the farthest slot is reached from both sides.
            if len - d != d {
                let behind = if d <= start { start - d } else { start + (len - d) };
                if hit(behind) {
                    return Some(behind);
                }
            }
        }
        None
    }
}
