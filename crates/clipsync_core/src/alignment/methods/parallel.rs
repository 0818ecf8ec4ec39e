//! Rayon-parallel brute-force correlation.

use rayon::prelude::*;

use crate::alignment::correlation::CorrelationResult;
use crate::alignment::types::Peak;

use super::{slot_value, CorrelationMethod};

/// Brute-force cross-correlation with slots computed on the rayon pool.
///
/// Each slot is still summed sequentially, so the output is bit-identical to
/// [`super::Direct`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Parallel;

impl CorrelationMethod for Parallel {
    fn name(&self) -> &str {
        "Parallel"
    }

    fn description(&self) -> &str {
        "Time-domain cross-correlation split across worker threads"
    }

    fn correlate(&self, main: &[i64], sub: &[i64]) -> CorrelationResult {
        let mut result = CorrelationResult::new(main.len(), sub.len());
        if result.is_empty() {
            return result;
        }

        let peak = result
            .correlation_vector_mut()
            .par_iter_mut()
            .enumerate()
            .map(|(index, slot)| {
                *slot = slot_value(main, sub, index);
                Peak {
                    value: *slot,
                    index,
                }
            })
            .reduce_with(higher_peak);

        if let Some(peak) = peak {
            result.set_max(peak);
        }
        result
    }
}

/// Larger value wins; equal values keep the smaller index.
fn higher_peak(a: Peak, b: Peak) -> Peak {
    if b.value > a.value || (b.value == a.value && b.index < a.index) {
        b
    } else {
        a
    }
}
