//! Alignment selection.
//!
//! Turns a correlation result into a signed offset and a confidence score.
//! Confidence is the peak value divided by a baseline statistic of the
//! whole buffer; the baseline and the acceptance threshold are the tunable
//! knobs of the engine.

use serde::{Deserialize, Serialize};

use super::correlation::CorrelationResult;
use super::types::{AlignmentDecision, DecisionStatus, NoCorrelationReason, Peak};

/// Baseline statistic the peak is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Baseline {
    /// Mean absolute value over the whole buffer.
    #[default]
    MeanAbs,
    /// Median absolute value over the whole buffer.
    MedianAbs,
    /// Largest value outside the peak's exclusion radius.
    SecondPeak,
}

impl std::fmt::Display for Baseline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Baseline::MeanAbs => write!(f, "mean-abs"),
            Baseline::MedianAbs => write!(f, "median-abs"),
            Baseline::SecondPeak => write!(f, "second-peak"),
        }
    }
}

/// Configuration for the alignment selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorConfig {
    /// Baseline statistic.
    pub baseline: Baseline,
    /// Minimum peak-to-baseline ratio for an accepted decision.
    pub confidence_threshold: f64,
    /// [Second Peak] Slots on each side of the peak ignored when searching
    /// for the runner-up.
    pub exclusion_radius: usize,
    /// Refine the offset with parabolic interpolation.
    pub interpolate: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            baseline: Baseline::MeanAbs,
            confidence_threshold: 2.0,
            exclusion_radius: 2,
            interpolate: true,
        }
    }
}

/// Picks the offset from correlation results.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlignmentSelector {
    config: SelectorConfig,
}

impl AlignmentSelector {
    /// Create a selector with the given configuration.
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// Selector configuration.
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Produce a decision from one result built at `block_size` samples per
    /// slot.
    pub fn select(&self, result: &CorrelationResult, block_size: usize) -> AlignmentDecision {
        let Some(peak) = result.peak() else {
            return no_correlation(NoCorrelationReason::EmptyInput, block_size);
        };

        let baseline = baseline_value(result.correlation_vector(), peak, &self.config);
        if baseline <= 0.0 {
            return no_correlation(NoCorrelationReason::ZeroBaseline, block_size);
        }
        if peak.value <= 0 {
            return no_correlation(NoCorrelationReason::NonPositivePeak, block_size);
        }

        let confidence = peak.value as f64 / baseline;
        let offset_blocks = result.offset_at(peak.index);
        let offset_samples = offset_blocks * block_size as i64;

        let delta = if self.config.interpolate {
            parabolic_delta(result.correlation_vector(), peak.index)
        } else {
            0.0
        };
        let fitted_offset_samples = (offset_blocks as f64 + delta) * block_size as f64;

        let status = if confidence >= self.config.confidence_threshold {
            DecisionStatus::Accepted
        } else {
            tracing::warn!(
                "Alignment at {} samples below confidence threshold ({:.2} < {:.2})",
                offset_samples,
                confidence,
                self.config.confidence_threshold
            );
            DecisionStatus::LowConfidence
        };

        tracing::debug!(
            "Peak {} at slot {} (offset {} blocks, {} samples), baseline {:.2}, confidence {:.2}",
            peak.value,
            peak.index,
            offset_blocks,
            offset_samples,
            baseline,
            confidence
        );

        AlignmentDecision {
            offset_blocks,
            offset_samples,
            fitted_offset_samples,
            confidence: Some(confidence),
            block_size,
            status,
        }
    }

    /// Pick the most confident decision among several results.
    ///
    /// Each entry is a result with the block size it was built at. Decisions
    /// with an offset beat those without; among those, the highest confidence
    /// wins and ties keep the earlier entry.
    pub fn select_best(&self, results: &[(&CorrelationResult, usize)]) -> AlignmentDecision {
        let mut best: Option<AlignmentDecision> = None;
        for (result, block_size) in results {
            let decision = self.select(result, *block_size);
            best = match best {
                None => Some(decision),
                Some(current) if better(&decision, &current) => Some(decision),
                keep => keep,
            };
        }
        best.unwrap_or_else(|| {
            AlignmentDecision::no_correlation(NoCorrelationReason::EmptyInput, 0)
        })
    }
}

fn better(candidate: &AlignmentDecision, current: &AlignmentDecision) -> bool {
    match (candidate.has_offset(), current.has_offset()) {
        (true, false) => true,
        (false, _) => false,
        (true, true) => candidate.confidence.unwrap_or(0.0) > current.confidence.unwrap_or(0.0),
    }
}

fn no_correlation(reason: NoCorrelationReason, block_size: usize) -> AlignmentDecision {
    tracing::warn!("No usable correlation: {}", reason);
    AlignmentDecision::no_correlation(reason, block_size)
}

/// Compute the configured baseline over `values`.
fn baseline_value(values: &[i64], peak: Peak, config: &SelectorConfig) -> f64 {
    match config.baseline {
        Baseline::MeanAbs => {
            let sum: f64 = values.iter().map(|v| v.unsigned_abs() as f64).sum();
            sum / values.len() as f64
        }
        Baseline::MedianAbs => {
            let mut abs: Vec<u64> = values.iter().map(|v| v.unsigned_abs()).collect();
            abs.sort_unstable();
            let mid = abs.len() / 2;
            if abs.len() % 2 == 0 {
                (abs[mid - 1] as f64 + abs[mid] as f64) / 2.0
            } else {
                abs[mid] as f64
            }
        }
        Baseline::SecondPeak => {
            let lo = peak.index.saturating_sub(config.exclusion_radius);
            let hi = peak.index.saturating_add(config.exclusion_radius);
            values
                .iter()
                .enumerate()
                .filter(|(i, _)| *i < lo || *i > hi)
                .map(|(_, &v)| v)
                .max()
                .map_or(0.0, |v| v.max(0) as f64)
        }
    }
}

/// Sub-slot position of the true peak from a parabola through the peak and
/// its two neighbours.
///
/// Returns 0 at the buffer edges or for a flat neighbourhood; clamped to
/// [-1, 1].
fn parabolic_delta(values: &[i64], index: usize) -> f64 {
    if index == 0 || index + 1 >= values.len() {
        return 0.0;
    }

    let y0 = values[index - 1] as f64;
    let y1 = values[index] as f64;
    let y2 = values[index + 1] as f64;

    // y = ax^2 + bx + c through x = -1, 0, 1; vertex at -b / 2a.
    let a = (y0 + y2) / 2.0 - y1;
    let b = (y2 - y0) / 2.0;

    if a.abs() < 1e-10 {
        return 0.0;
    }
    (-b / (2.0 * a)).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::methods::{CorrelationMethod, Direct};

    fn filled(main: usize, sub: usize, values: &[i64]) -> CorrelationResult {
        let mut result = CorrelationResult::new(main, sub);
        result.correlation_vector_mut().copy_from_slice(values);
        result
    }

    #[test]
    fn run_of_fives_gives_offset_two() {
        let result = Direct.correlate(&[0, 0, 5, 5, 5, 0, 0], &[5, 5, 5]);
        let decision = AlignmentSelector::default().select(&result, 1);

        assert_eq!(decision.offset_blocks, 2);
        assert_eq!(decision.offset_samples, 2);
        assert!(decision.is_valid());
        // peak 75, mean |v| 225 / 9 = 25
        assert!((decision.confidence.unwrap() - 3.0).abs() < 1e-9);
        // Symmetric neighbourhood: interpolation does not move the peak.
        assert!((decision.fitted_offset_samples - 2.0).abs() < 1e-9);
    }

    #[test]
    fn offset_scales_by_block_size() {
        let result = Direct.correlate(&[0, 0, 5, 5, 5, 0, 0], &[5, 5, 5]);
        let decision = AlignmentSelector::default().select(&result, 1024);
        assert_eq!(decision.offset_blocks, 2);
        assert_eq!(decision.offset_samples, 2048);
        assert_eq!(decision.block_size, 1024);
    }

    #[test]
    fn all_zero_sub_is_invalid_regardless_of_threshold() {
        let result = Direct.correlate(&[3, 1, 4, 1, 5], &[0, 0, 0]);
        let selector = AlignmentSelector::new(SelectorConfig {
            confidence_threshold: 0.0,
            ..Default::default()
        });
        let decision = selector.select(&result, 1);
        assert!(!decision.is_valid());
        assert_eq!(
            decision.status,
            DecisionStatus::NoCorrelation(NoCorrelationReason::ZeroBaseline)
        );
        assert_eq!(decision.confidence, None);
    }

    #[test]
    fn empty_result_is_invalid() {
        let result = Direct.correlate(&[], &[1, 2, 3]);
        let decision = AlignmentSelector::default().select(&result, 512);
        assert_eq!(
            decision.status,
            DecisionStatus::NoCorrelation(NoCorrelationReason::EmptyInput)
        );
        assert!(!decision.has_offset());
    }

    #[test]
    fn negative_peak_is_invalid() {
        let result = filled(2, 2, &[-5, -1, -3]);
        let decision = AlignmentSelector::default().select(&result, 1);
        assert_eq!(
            decision.status,
            DecisionStatus::NoCorrelation(NoCorrelationReason::NonPositivePeak)
        );
    }

    #[test]
    fn low_confidence_keeps_offset() {
        // Flat-ish buffer: peak 12, mean |v| 10.
        let result = filled(3, 3, &[8, 10, 12, 10, 10]);
        let decision = AlignmentSelector::default().select(&result, 1);
        assert_eq!(decision.status, DecisionStatus::LowConfidence);
        assert!(decision.has_offset());
        assert!(!decision.is_valid());
        assert_eq!(decision.offset_blocks, 0);
    }

    #[test]
    fn threshold_is_configurable() {
        let result = filled(3, 3, &[8, 10, 12, 10, 10]);
        let selector = AlignmentSelector::new(SelectorConfig {
            confidence_threshold: 1.1,
            ..Default::default()
        });
        assert!(selector.select(&result, 1).is_valid());
    }

    #[test]
    fn median_baseline() {
        let result = filled(3, 3, &[1, 2, 40, 4, 5]);
        let selector = AlignmentSelector::new(SelectorConfig {
            baseline: Baseline::MedianAbs,
            ..Default::default()
        });
        let decision = selector.select(&result, 1);
        assert!((decision.confidence.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn second_peak_baseline_skips_neighbourhood() {
        let result = filled(5, 5, &[1, 2, 9, 50, 9, 2, 10, 1, 0]);
        let selector = AlignmentSelector::new(SelectorConfig {
            baseline: Baseline::SecondPeak,
            exclusion_radius: 1,
            ..Default::default()
        });
        let decision = selector.select(&result, 1);
        assert!((decision.confidence.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn interpolation_moves_toward_heavier_neighbour() {
        let result = filled(3, 3, &[0, 60, 100, 80, 0]);
        let decision = AlignmentSelector::default().select(&result, 10);
        assert_eq!(decision.offset_samples, 0);
        assert!(decision.fitted_offset_samples > 0.0);
        assert!(decision.fitted_offset_samples < 10.0);
    }

    #[test]
    fn interpolation_can_be_disabled() {
        let result = filled(3, 3, &[0, 60, 100, 80, 0]);
        let selector = AlignmentSelector::new(SelectorConfig {
            interpolate: false,
            ..Default::default()
        });
        let decision = selector.select(&result, 10);
        assert_eq!(decision.fitted_offset_samples, 0.0);
    }

    #[test]
    fn parabolic_delta_at_edges_is_zero() {
        assert_eq!(parabolic_delta(&[5, 3, 1], 0), 0.0);
        assert_eq!(parabolic_delta(&[1, 3, 5], 2), 0.0);
        assert_eq!(parabolic_delta(&[4, 4, 4], 1), 0.0);
    }

    #[test]
    fn select_best_prefers_confident_result() {
        let weak = filled(3, 3, &[8, 10, 12, 10, 10]);
        let strong = Direct.correlate(&[0, 0, 5, 5, 5, 0, 0], &[5, 5, 5]);
        let empty = CorrelationResult::new(0, 0);
        let decision =
            AlignmentSelector::default().select_best(&[(&empty, 4), (&weak, 4), (&strong, 2)]);
        assert_eq!(decision.block_size, 2);
        assert_eq!(decision.offset_samples, 4);
    }

    #[test]
    fn select_best_of_nothing_is_empty_input() {
        let decision = AlignmentSelector::default().select_best(&[]);
        assert_eq!(
            decision.status,
            DecisionStatus::NoCorrelation(NoCorrelationReason::EmptyInput)
        );
    }
}
