//! Sequential brute-force correlation.

use crate::alignment::correlation::CorrelationResult;
use crate::alignment::types::Peak;

use super::{slot_value, CorrelationMethod};

/// Brute-force cross-correlation, one slot after another.
///
/// O(M·S); intended for envelope resolution, not raw samples. The maximum
/// is tracked during the fill and handed to the result, so no second scan is
/// needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Direct;

impl CorrelationMethod for Direct {
    fn name(&self) -> &str {
        "Direct"
    }

    fn description(&self) -> &str {
        "Sequential time-domain cross-correlation"
    }

    fn correlate(&self, main: &[i64], sub: &[i64]) -> CorrelationResult {
        let mut result = CorrelationResult::new(main.len(), sub.len());
        if result.is_empty() {
            return result;
        }

        let mut peak: Option<Peak> = None;
        for (index, slot) in result.correlation_vector_mut().iter_mut().enumerate() {
            let value = slot_value(main, sub, index);
            *slot = value;
            // Strict comparison keeps the smallest index on ties.
            if peak.map_or(true, |p| value > p.value) {
                peak = Some(Peak { value, index });
            }
        }

        if let Some(peak) = peak {
            result.set_max(peak);
        }
        result
    }
}
