//! Core types for audio alignment.

use serde::{Deserialize, Serialize};

use super::envelope::EnvelopeStatistic;

/// Block-reduced magnitude representation of a sample buffer.
///
/// One value per `block_size` samples of the source; the last value may
/// summarize a shorter trailing block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// One magnitude per block.
    pub(crate) values: Vec<i64>,
    /// Samples per block.
    pub(crate) block_size: usize,
    /// Number of source samples the envelope was built from.
    pub(crate) sample_count: usize,
    /// Statistic used to summarize each block.
    pub(crate) statistic: EnvelopeStatistic,
}

impl Envelope {
    /// Build an envelope from already-reduced values.
    ///
    /// Used for block-equivalent inputs (block size 1) and in tests.
    ///
    /// # Errors
    /// `AlignError::InvalidInput` if `block_size` is zero or any value is
    /// negative.
    pub fn from_values(values: Vec<i64>, block_size: usize) -> AlignResult<Self> {
        if block_size == 0 {
            return Err(AlignError::InvalidInput(
                "envelope block size must be at least 1".to_string(),
            ));
        }
        if let Some(pos) = values.iter().position(|&v| v < 0) {
            return Err(AlignError::InvalidInput(format!(
                "envelope value {} at block {} is negative",
                values[pos], pos
            )));
        }
        let sample_count = values.len() * block_size;
        Ok(Self {
            values,
            block_size,
            sample_count,
            statistic: EnvelopeStatistic::default(),
        })
    }

    /// Get the number of blocks.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the envelope is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Per-block values.
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Samples per block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of source samples covered.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Statistic used to build this envelope.
    pub fn statistic(&self) -> EnvelopeStatistic {
        self.statistic
    }

    /// Largest block value, or `None` for an empty envelope.
    pub fn max(&self) -> Option<i64> {
        self.values.iter().copied().max()
    }

    /// Integer mean of the block values (0 for an empty envelope).
    pub fn mean(&self) -> i64 {
        if self.values.is_empty() {
            return 0;
        }
        let sum: i64 = self.values.iter().sum();
        sum / self.values.len() as i64
    }

    /// Mean-removed copy of the values.
    ///
    /// The result is signed; it is what the correlator consumes when DC
    /// removal is enabled.
    pub fn centered(&self) -> Vec<i64> {
        let mean = self.mean();
        self.values.iter().map(|v| v - mean).collect()
    }

    /// Copy of the blocks in `start..end` (clamped to the envelope).
    pub fn slice(&self, start: usize, end: usize) -> Envelope {
        let end = end.min(self.values.len());
        let start = start.min(end);
        Envelope {
            values: self.values[start..end].to_vec(),
            block_size: self.block_size,
            sample_count: (end - start) * self.block_size,
            statistic: self.statistic,
        }
    }
}

/// Maximum of a correlation buffer: value and slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peak {
    /// Correlation value at the peak.
    pub value: i64,
    /// Slot index of the peak in the correlation buffer.
    pub index: usize,
}

/// Why no offset could be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoCorrelationReason {
    /// One of the inputs was empty, so the correlation buffer is empty.
    EmptyInput,
    /// The baseline statistic is zero; the peak-to-baseline ratio is undefined.
    ZeroBaseline,
    /// The largest correlation value is not positive.
    NonPositivePeak,
}

impl std::fmt::Display for NoCorrelationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoCorrelationReason::EmptyInput => write!(f, "empty input"),
            NoCorrelationReason::ZeroBaseline => write!(f, "zero baseline"),
            NoCorrelationReason::NonPositivePeak => write!(f, "no positive peak"),
        }
    }
}

/// Outcome class of an alignment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    /// Offset found and confidence meets the threshold.
    Accepted,
    /// Offset found but confidence is below the threshold.
    LowConfidence,
    /// No usable correlation.
    NoCorrelation(NoCorrelationReason),
}

/// Final recommendation for a clip pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentDecision {
    /// Offset in envelope blocks (positive = sub starts after main).
    pub offset_blocks: i64,
    /// Offset in samples (`offset_blocks * block_size`).
    pub offset_samples: i64,
    /// Interpolated offset in samples.
    pub fitted_offset_samples: f64,
    /// Peak-to-baseline ratio, `None` when it is undefined.
    pub confidence: Option<f64>,
    /// Block size the offset was measured at.
    pub block_size: usize,
    /// Outcome class.
    pub status: DecisionStatus,
}

impl AlignmentDecision {
    /// Create a decision carrying no offset.
    pub fn no_correlation(reason: NoCorrelationReason, block_size: usize) -> Self {
        Self {
            offset_blocks: 0,
            offset_samples: 0,
            fitted_offset_samples: 0.0,
            confidence: None,
            block_size,
            status: DecisionStatus::NoCorrelation(reason),
        }
    }

    /// Whether the offset can be applied automatically.
    pub fn is_valid(&self) -> bool {
        self.status == DecisionStatus::Accepted
    }

    /// Whether an offset was measured at all (accepted or not).
    pub fn has_offset(&self) -> bool {
        !matches!(self.status, DecisionStatus::NoCorrelation(_))
    }

    /// Offset in seconds for a given sample rate.
    pub fn offset_secs(&self, sample_rate: u32) -> Option<f64> {
        if !self.has_offset() || sample_rate == 0 {
            return None;
        }
        Some(self.fitted_offset_samples / sample_rate as f64)
    }
}

/// Error types for alignment operations.
#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    /// Configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input buffers are unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Type alias for alignment results.
pub type AlignResult<T> = Result<T, AlignError>;
