//! Correlation result container.
//!
//! Holds the correlation value at every relative offset between a main signal
//! of length `M` and a sub signal of length `S`. Slot `i` corresponds to the
//! signed offset `i - (S - 1)`: slot 0 is the sub fully preceding the main,
//! the last slot is the sub starting on the last main block.

use image::RgbImage;
use once_cell::sync::OnceCell;

use super::render::render_correlation;
use super::types::Peak;

/// Cached maximum of the correlation buffer.
///
/// Transitions at most once from `Uncomputed` to `Cached`, either through a
/// scan in [`CorrelationResult::max`] or through [`CorrelationResult::set_max`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxState {
    /// No maximum known yet.
    Uncomputed,
    /// Maximum value and its (smallest) index.
    Cached(Peak),
}

/// Correlation values for all offsets between two envelopes.
///
/// The maximum lives in a write-once cell; the scan runs outside it, so no
/// caller holds a lock while the buffer is searched.
#[derive(Debug, Clone)]
pub struct CorrelationResult {
    main_size: usize,
    sub_size: usize,
    values: Vec<i64>,
    max: OnceCell<Peak>,
}

impl CorrelationResult {
    /// Allocate a zeroed result for a main of `main_size` and a sub of
    /// `sub_size` values.
    ///
    /// The buffer has `main_size + sub_size - 1` slots, or none if either
    /// side is empty.
    pub fn new(main_size: usize, sub_size: usize) -> Self {
        let size = if main_size == 0 || sub_size == 0 {
            0
        } else {
            main_size + sub_size - 1
        };
        Self {
            main_size,
            sub_size,
            values: vec![0; size],
            max: OnceCell::new(),
        }
    }

    /// Number of slots in the buffer.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Length of the main signal.
    pub fn main_size(&self) -> usize {
        self.main_size
    }

    /// Length of the sub signal.
    pub fn sub_size(&self) -> usize {
        self.sub_size
    }

    /// Correlation value at every slot.
    pub fn correlation_vector(&self) -> &[i64] {
        &self.values
    }

    /// Mutable access for the fill step of a correlator.
    ///
    /// Resets the cached maximum, since the buffer may change.
    pub fn correlation_vector_mut(&mut self) -> &mut [i64] {
        self.max.take();
        &mut self.values
    }

    /// Current state of the maximum cache.
    pub fn max_state(&self) -> MaxState {
        match self.max.get() {
            Some(peak) => MaxState::Cached(*peak),
            None => MaxState::Uncomputed,
        }
    }

    /// Signed offset of slot `index`.
    pub fn offset_at(&self, index: usize) -> i64 {
        index as i64 - (self.sub_size as i64 - 1)
    }

    /// Slot index of a signed offset, if it lies inside the buffer.
    pub fn index_of(&self, offset: i64) -> Option<usize> {
        let index = offset + self.sub_size as i64 - 1;
        if index < 0 || index as usize >= self.values.len() {
            None
        } else {
            Some(index as usize)
        }
    }

    /// Maximum value and its index, computed once and cached.
    ///
    /// Ties resolve to the smallest index. Returns `None` for an empty
    /// buffer.
    pub fn peak(&self) -> Option<Peak> {
        if let Some(peak) = self.max.get() {
            return Some(*peak);
        }
        let peak = scan_peak(&self.values)?;
        // A racing scan of the same buffer finds the same peak.
        Some(*self.max.get_or_init(|| peak))
    }

    /// Maximum correlation value, or `None` for an empty buffer.
    pub fn max(&self) -> Option<i64> {
        self.peak().map(|p| p.value)
    }

    /// Index of the maximum value, or `None` for an empty buffer.
    pub fn max_index(&self) -> Option<usize> {
        self.peak().map(|p| p.index)
    }

    /// Record a maximum already known from the fill loop.
    ///
    /// Must equal what a scan would find (smallest index on ties); checked in
    /// debug builds.
    pub fn set_max(&mut self, peak: Peak) {
        debug_assert_eq!(
            scan_peak(&self.values),
            Some(peak),
            "set_max disagrees with buffer contents"
        );
        self.max = OnceCell::with_value(peak);
    }

    /// Largest absolute value in the buffer (0 when empty).
    pub fn max_abs(&self) -> u64 {
        self.values
            .iter()
            .map(|v| v.unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    /// Render the buffer as a bar plot `size()` pixels wide.
    ///
    /// See [`render_correlation`].
    pub fn to_image(&self, height: u32) -> RgbImage {
        render_correlation(self, height)
    }
}

/// Find the maximum value; ties keep the smallest index.
fn scan_peak(values: &[i64]) -> Option<Peak> {
    let mut iter = values.iter().enumerate();
    let (_, &first) = iter.next()?;
    let mut peak = Peak {
        value: first,
        index: 0,
    };
    for (index, &value) in iter {
        if value > peak.value {
            peak = Peak { value, index };
        }
    }
    Some(peak)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_from(main: usize, sub: usize, values: &[i64]) -> CorrelationResult {
        let mut result = CorrelationResult::new(main, sub);
        result.correlation_vector_mut().copy_from_slice(values);
        result
    }

    #[test]
    fn size_is_main_plus_sub_minus_one() {
        assert_eq!(CorrelationResult::new(5, 3).size(), 7);
        assert_eq!(CorrelationResult::new(1, 1).size(), 1);
        assert_eq!(CorrelationResult::new(0, 3).size(), 0);
        assert_eq!(CorrelationResult::new(4, 0).size(), 0);
    }

    #[test]
    fn offsets_map_to_slots() {
        let result = CorrelationResult::new(7, 3);
        assert_eq!(result.offset_at(0), -2);
        assert_eq!(result.offset_at(4), 2);
        assert_eq!(result.offset_at(8), 6);
        assert_eq!(result.index_of(-2), Some(0));
        assert_eq!(result.index_of(6), Some(8));
        assert_eq!(result.index_of(7), None);
        assert_eq!(result.index_of(-3), None);
    }

    #[test]
    fn empty_result_has_no_peak() {
        let result = CorrelationResult::new(0, 0);
        assert_eq!(result.max(), None);
        assert_eq!(result.max_index(), None);
        assert_eq!(result.max_state(), MaxState::Uncomputed);
    }

    #[test]
    fn max_is_cached_after_first_call() {
        let result = result_from(3, 2, &[1, 9, 3, 9]);
        assert_eq!(result.max_state(), MaxState::Uncomputed);
        let first = result.peak();
        assert_eq!(
            result.max_state(),
            MaxState::Cached(Peak { value: 9, index: 1 })
        );
        assert_eq!(result.peak(), first);
        assert_eq!(first, scan_peak(result.correlation_vector()));
    }

    #[test]
    fn ties_pick_smallest_index() {
        let result = result_from(3, 3, &[0, 5, 2, 5, 5]);
        assert_eq!(result.max_index(), Some(1));
    }

    #[test]
    fn set_max_matches_scan() {
        let mut result = result_from(2, 2, &[-3, 7, 2]);
        let scanned = result.peak();
        result.set_max(Peak { value: 7, index: 1 });
        assert_eq!(result.peak(), scanned);
        assert_eq!(result.max(), Some(7));
    }

    #[test]
    fn all_negative_buffer_has_negative_max() {
        let result = result_from(2, 2, &[-5, -1, -1]);
        assert_eq!(result.max(), Some(-1));
        assert_eq!(result.max_index(), Some(1));
        assert_eq!(result.max_abs(), 5);
    }

    #[test]
    fn mutation_resets_cache() {
        let mut result = result_from(2, 1, &[1, 2]);
        assert_eq!(result.max_index(), Some(1));
        result.correlation_vector_mut()[0] = 10;
        assert_eq!(result.max_index(), Some(0));
    }

    #[test]
    fn concurrent_readers_agree_on_peak() {
        let result = result_from(3, 3, &[2, 8, 1, 8, 0]);
        let peaks: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| result.peak())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(peaks.iter().all(|p| *p == Some(Peak { value: 8, index: 1 })));
        assert_eq!(
            result.max_state(),
            MaxState::Cached(Peak { value: 8, index: 1 })
        );
    }

    #[test]
    fn clone_keeps_cache() {
        let result = result_from(2, 1, &[4, 2]);
        result.peak();
        let copy = result.clone();
        assert!(matches!(copy.max_state(), MaxState::Cached(_)));
        assert_eq!(copy.correlation_vector(), result.correlation_vector());
    }
}
