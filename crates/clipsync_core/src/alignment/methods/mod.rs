//! Correlation methods.
//!
//! This module defines the `CorrelationMethod` trait and its implementations.
//! Every method computes the same discrete cross-correlation restricted to
//! the overlap of the two signals (no wraparound, no padding):
//!
//! ```text
//! value[i] = sum over t of main[t] * sub[t - d],   d = i - (S - 1)
//! ```
//!
//! accumulated in 64-bit integers. Implementations differ only in how the
//! O(M·S) work is scheduled; their outputs are identical.

mod direct;
mod parallel;

pub use direct::Direct;
pub use parallel::Parallel;

use serde::{Deserialize, Serialize};

use crate::alignment::correlation::CorrelationResult;
use crate::alignment::types::{AlignError, AlignResult, Envelope};

/// Trait for correlation methods.
pub trait CorrelationMethod: Send + Sync {
    /// Name of this correlation method.
    fn name(&self) -> &str;

    /// Short description of the method.
    fn description(&self) -> &str;

    /// Correlate `sub` against `main` at every relative offset.
    ///
    /// Returns a buffer of `main.len() + sub.len() - 1` slots (empty if
    /// either side is empty) with the maximum already cached.
    fn correlate(&self, main: &[i64], sub: &[i64]) -> CorrelationResult;
}

/// Selectable correlation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    /// Sequential brute force.
    #[default]
    Direct,
    /// Brute force split across the rayon pool.
    Parallel,
}

impl std::fmt::Display for MethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodKind::Direct => write!(f, "direct"),
            MethodKind::Parallel => write!(f, "parallel"),
        }
    }
}

/// Factory for creating correlation methods by name.
pub fn create_method(name: &str) -> Option<Box<dyn CorrelationMethod>> {
    match name.to_lowercase().as_str() {
        "direct" | "brute-force" | "naive" => Some(Box::new(Direct)),
        "parallel" | "rayon" => Some(Box::new(Parallel)),
        _ => None,
    }
}

/// Create the method for a [`MethodKind`].
pub fn create_from_enum(kind: MethodKind) -> Box<dyn CorrelationMethod> {
    match kind {
        MethodKind::Direct => Box::new(Direct),
        MethodKind::Parallel => Box::new(Parallel),
    }
}

/// Get a list of available correlation method names.
pub fn available_methods() -> Vec<&'static str> {
    vec!["direct", "parallel"]
}

/// Correlate two envelopes.
///
/// Both envelopes must share one block size so they are on the same time
/// scale. With `remove_dc` each envelope's mean is subtracted first, except
/// for a flat envelope: centering would reduce it to zeros.
///
/// # Errors
/// `AlignError::InvalidInput` if the block sizes differ.
pub fn correlate_envelopes(
    main: &Envelope,
    sub: &Envelope,
    method: &dyn CorrelationMethod,
    remove_dc: bool,
) -> AlignResult<CorrelationResult> {
    if main.block_size() != sub.block_size() {
        return Err(AlignError::InvalidInput(format!(
            "Envelope block size mismatch: {} vs {}",
            main.block_size(),
            sub.block_size()
        )));
    }

    let result = if remove_dc {
        method.correlate(&without_dc(main), &without_dc(sub))
    } else {
        method.correlate(main.values(), sub.values())
    };
    Ok(result)
}

fn without_dc(envelope: &Envelope) -> Vec<i64> {
    let flat = envelope.values().windows(2).all(|w| w[0] == w[1]);
    if flat {
        envelope.values().to_vec()
    } else {
        envelope.centered()
    }
}

/// Correlation value of slot `index`.
///
/// Only the overlapping region contributes: `t` runs over
/// `max(0, d)..min(M, S + d)`.
pub(crate) fn slot_value(main: &[i64], sub: &[i64], index: usize) -> i64 {
    let d = index as i64 - (sub.len() as i64 - 1);
    let start = d.max(0) as usize;
    let end = (sub.len() as i64 + d).min(main.len() as i64) as usize;

    let mut sum: i64 = 0;
    for t in start..end {
        sum += main[t] * sub[(t as i64 - d) as usize];
    }
    sum
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_creates_direct() {
        let method = create_method("direct").unwrap();
        assert_eq!(method.name(), "Direct");
    }

    #[test]
    fn factory_creates_aliases() {
        assert!(create_method("naive").is_some());
        assert!(create_method("Rayon").is_some());
    }

    #[test]
    fn factory_returns_none_for_unknown() {
        assert!(create_method("fft").is_none());
    }

    #[test]
    fn enum_factory_matches_names() {
        assert_eq!(create_from_enum(MethodKind::Direct).name(), "Direct");
        assert_eq!(create_from_enum(MethodKind::Parallel).name(), "Parallel");
        assert_eq!(available_methods().len(), 2);
    }

    #[test]
    fn slot_value_matches_reference() {
        let main = [3, -1, 4, 1, 5];
        let sub = [9, 2, -6, 5, 3];
        let expected = reference::correlate(&main, &sub);
        for (i, &want) in expected.iter().enumerate() {
            assert_eq!(slot_value(&main, &sub, i), want, "slot {}", i);
        }
    }

    #[test]
    fn mismatched_block_sizes_are_rejected() {
        let main = Envelope::from_values(vec![1, 2, 3], 256).unwrap();
        let sub = Envelope::from_values(vec![1, 2], 512).unwrap();
        assert!(correlate_envelopes(&main, &sub, &Direct, false).is_err());
    }

    #[test]
    fn dc_removal_correlates_centered_values() {
        let main = Envelope::from_values(vec![10, 10, 20, 10], 1).unwrap();
        let sub = Envelope::from_values(vec![20, 10], 1).unwrap();
        let result = correlate_envelopes(&main, &sub, &Direct, true).unwrap();
        let expected = reference::correlate(&main.centered(), &sub.centered());
        assert_eq!(result.correlation_vector(), expected.as_slice());
    }

    #[test]
    fn flat_envelope_keeps_its_level_under_dc_removal() {
        let main = Envelope::from_values(vec![0, 0, 5, 5, 5, 0, 0], 1).unwrap();
        let sub = Envelope::from_values(vec![5, 5, 5], 1).unwrap();
        let result = correlate_envelopes(&main, &sub, &Direct, true).unwrap();
        assert_eq!(
            result.correlation_vector(),
            &[-10, -20, -5, 20, 45, 20, -5, -20, -10]
        );
        assert_eq!(result.offset_at(result.max_index().unwrap()), 2);
    }

    #[test]
    fn silent_envelope_stays_silent_under_dc_removal() {
        let main = Envelope::from_values(vec![1, 9, 4], 1).unwrap();
        let sub = Envelope::from_values(vec![0, 0], 1).unwrap();
        let result = correlate_envelopes(&main, &sub, &Direct, true).unwrap();
        assert!(result.correlation_vector().iter().all(|&v| v == 0));
    }
}
