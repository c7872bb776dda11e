//! Array storage and the allocation registry.
//!
//! Arrays live in an arena of slots owned by the engine.  A [`Value::Array`]
//! carries only an [`ArrayHandle`]; the matrix itself is reached through
//! [`ArrayRegistry::get`].  Each slot is released exactly once: either by
//! [`ArrayRegistry::redefine_array`] when a variable is rebound, by a sweep of
//! unowned temporaries, or by [`ArrayRegistry::clear`] at teardown.
//!
//! Slots are generation-tagged so a stale handle to a released array can never
//! alias a newer allocation that reused the slot.
//!
//! [`Value::Array`]: crate::script::value::Value::Array

use std::collections::HashSet;

// ── Array ─────────────────────────────────────────────────────────────────────

/// A dense row-major matrix of `f64`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

/// Largest element count an array built from user input may have.
pub const MAX_ELEMENTS: usize = 1 << 26;

impl Array {
    /// A zero-filled `rows` × `cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Array {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Like [`Array::zeros`], but `None` when `rows * cols` overflows or
    /// exceeds [`MAX_ELEMENTS`].
    pub fn try_zeros(rows: usize, cols: usize) -> Option<Self> {
        match rows.checked_mul(cols) {
            Some(n) if n <= MAX_ELEMENTS => Some(Array::zeros(rows, cols)),
            _ => None,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col).copied()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut f64> {
        if row < self.rows && col < self.cols {
            self.data.get_mut(row * self.cols + col)
        } else {
            None
        }
    }

    pub fn same_shape(&self, other: &Array) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    pub fn transpose(&self) -> Array {
        let mut out = Array::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                if let (Some(v), Some(slot)) = (self.get(r, c), out.get_mut(c, r)) {
                    *slot = v;
                }
            }
        }
        out
    }
}

// ── ArrayHandle ───────────────────────────────────────────────────────────────

/// Ownership token for an array held in an [`ArrayRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayHandle {
    index: u32,
    generation: u32,
}

// ── ArrayRegistry ─────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Slot {
    generation: u32,
    array: Option<Array>,
}

/// Arena of every array created through the engine.
#[derive(Debug, Default)]
pub struct ArrayRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    /// Total number of releases performed; lets tests prove nothing is
    /// released twice.
    released: usize,
}

impl ArrayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate and register a zero-filled `rows` × `cols` array.
    pub fn make_array(&mut self, rows: usize, cols: usize) -> ArrayHandle {
        self.insert(Array::zeros(rows, cols))
    }

    /// Register a deep copy of `from`.
    pub fn make_array_copy(&mut self, from: &Array) -> ArrayHandle {
        self.insert(from.clone())
    }

    /// Register an array built elsewhere (builtins build results directly).
    pub fn insert(&mut self, array: Array) -> ArrayHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.array = Some(array);
            tracing::trace!(index, generation = slot.generation, "array slot reused");
            return ArrayHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            array: Some(array),
        });
        tracing::trace!(index, "array slot allocated");
        ArrayHandle {
            index,
            generation: 0,
        }
    }

    /// Detach `handle` from the registry and release it now.
    ///
    /// Called exactly once, when the variable holding `handle` is about to be
    /// rebound.  An unregistered handle is a programming error: it panics in
    /// debug builds and is ignored in release builds.
    pub fn redefine_array(&mut self, handle: ArrayHandle) {
        let released = self.release(handle);
        debug_assert!(released, "redefine_array on unregistered handle {handle:?}");
    }

    /// Release `handle` if it is still registered.  Returns `false` for stale
    /// or foreign handles.
    pub(crate) fn release(&mut self, handle: ArrayHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return false;
        };
        if slot.generation != handle.generation || slot.array.is_none() {
            return false;
        }
        slot.array = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        self.released += 1;
        true
    }

    pub fn contains(&self, handle: ArrayHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: ArrayHandle) -> Option<&Array> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.array.as_ref())
    }

    pub fn get_mut(&mut self, handle: ArrayHandle) -> Option<&mut Array> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.array.as_mut())
    }

    /// Release every registered array not in `owned`.
    ///
    /// Temporaries produced while evaluating an expression are dropped here
    /// once the expression's result has been written out.
    pub fn sweep(&mut self, owned: &HashSet<ArrayHandle>) -> usize {
        let stale: Vec<ArrayHandle> = self
            .handles()
            .filter(|h| !owned.contains(h))
            .collect();
        for h in &stale {
            self.release(*h);
        }
        stale.len()
    }

    /// Handles of every live array.
    pub fn handles(&self) -> impl Iterator<Item = ArrayHandle> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.array.as_ref().map(|_| ArrayHandle {
                index: i as u32,
                generation: s.generation,
            })
        })
    }

    /// Number of live (registered, unreleased) arrays.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Total releases performed over the registry's lifetime.
    pub fn release_count(&self) -> usize {
        self.released
    }

    /// Release every array still registered, exactly once, then forget them.
    pub fn clear(&mut self) {
        let handles: Vec<ArrayHandle> = self.handles().collect();
        for h in handles {
            self.release(h);
        }
        self.slots.clear();
        self.free.clear();
        debug_assert_eq!(self.live, 0);
    }
}

impl Drop for ArrayRegistry {
    fn drop(&mut self) {
        if !self.is_empty() {
            tracing::trace!(live = self.live, "releasing arrays at teardown");
        }
        self.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_zeros_rejects_oversized_shapes() {
        assert!(Array::try_zeros(1 << 33, 1 << 31).is_none());
        assert!(Array::try_zeros(usize::MAX, 2).is_none());
        assert!(Array::try_zeros(MAX_ELEMENTS, 2).is_none());
        let a = Array::try_zeros(4, 0).unwrap();
        assert!(a.data.is_empty());
    }

    #[test]
    fn make_array_is_zeroed_and_registered() {
        let mut reg = ArrayRegistry::new();
        let h = reg.make_array(2, 3);
        let a = reg.get(h).unwrap();
        assert_eq!((a.rows, a.cols), (2, 3));
        assert!(a.data.iter().all(|&x| x == 0.0));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn copy_is_deep() {
        let mut reg = ArrayRegistry::new();
        let h = reg.make_array(1, 2);
        *reg.get_mut(h).unwrap().get_mut(0, 1).unwrap() = 5.0;
        let src = reg.get(h).unwrap().clone();
        let c = reg.make_array_copy(&src);
        *reg.get_mut(c).unwrap().get_mut(0, 1).unwrap() = 9.0;
        assert_eq!(reg.get(h).unwrap().get(0, 1), Some(5.0));
        assert_eq!(reg.get(c).unwrap().get(0, 1), Some(9.0));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn redefine_then_clear_releases_once() {
        let mut reg = ArrayRegistry::new();
        let h = reg.make_array(2, 3);
        reg.redefine_array(h);
        assert!(!reg.contains(h));
        assert_eq!(reg.len(), 0);
        assert_eq!(reg.release_count(), 1);
        reg.clear();
        assert_eq!(reg.release_count(), 1);
    }

    #[test]
    fn stale_handle_does_not_alias_reused_slot() {
        let mut reg = ArrayRegistry::new();
        let old = reg.make_array(1, 1);
        reg.redefine_array(old);
        let new = reg.make_array(4, 4);
        assert!(reg.get(old).is_none());
        assert_eq!(reg.get(new).unwrap().rows, 4);
        assert!(!reg.release(old));
        assert!(reg.contains(new));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "unregistered")]
    fn redefine_unregistered_panics_in_debug() {
        let mut reg = ArrayRegistry::new();
        let h = reg.make_array(1, 1);
        reg.redefine_array(h);
        reg.redefine_array(h);
    }

    #[test]
    fn sweep_keeps_owned() {
        let mut reg = ArrayRegistry::new();
        let keep = reg.make_array(1, 1);
        let _tmp1 = reg.make_array(1, 1);
        let _tmp2 = reg.make_array(2, 2);
        let owned: HashSet<_> = [keep].into_iter().collect();
        assert_eq!(reg.sweep(&owned), 2);
        assert_eq!(reg.len(), 1);
        assert!(reg.contains(keep));
    }

    #[test]
    fn out_of_range_get_is_none() {
        let a = Array::zeros(2, 2);
        assert_eq!(a.get(2, 0), None);
        assert_eq!(a.get(0, 2), None);
        assert_eq!(a.get(1, 1), Some(0.0));
    }

    #[test]
    fn transpose_shape() {
        let mut a = Array::zeros(2, 3);
        *a.get_mut(0, 2).unwrap() = 7.0;
        let t = a.transpose();
        assert_eq!((t.rows, t.cols), (3, 2));
        assert_eq!(t.get(2, 0), Some(7.0));
    }
}
