//! Envelope extraction.
//!
//! Reduces a mono PCM buffer to one magnitude per fixed-size block so the
//! quadratic correlation runs at block resolution instead of sample
//! resolution. Extraction is a single O(N) pass with O(N / B) output.
//!
//! The default statistic is [`EnvelopeStatistic::MeanAbs`]: the integer mean
//! of `|x|` over the samples actually present in the block, rounded half up.
//! A trailing partial block is divided by its real length, never padded.

use serde::{Deserialize, Serialize};

use super::types::{AlignError, AlignResult, Envelope};

/// Per-block summary statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvelopeStatistic {
    /// Mean absolute value.
    #[default]
    MeanAbs,
    /// Root mean square.
    Rms,
    /// Largest absolute value.
    Peak,
}

impl std::fmt::Display for EnvelopeStatistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvelopeStatistic::MeanAbs => write!(f, "mean-abs"),
            EnvelopeStatistic::Rms => write!(f, "rms"),
            EnvelopeStatistic::Peak => write!(f, "peak"),
        }
    }
}

impl EnvelopeStatistic {
    /// Summarize one block. `block` is never empty.
    ///
    /// Magnitudes are taken unsigned so `i64::MIN` is well defined; results
    /// beyond `i64::MAX` saturate.
    fn summarize(&self, block: &[i64]) -> i64 {
        let n = block.len() as u128;
        let magnitude = match self {
            EnvelopeStatistic::MeanAbs => {
                let sum: u128 = block.iter().map(|x| x.unsigned_abs() as u128).sum();
                (sum + n / 2) / n
            }
            EnvelopeStatistic::Rms => {
                let sum_sq: u128 = block
                    .iter()
                    .map(|&x| {
                        let a = x.unsigned_abs() as u128;
                        a * a
                    })
                    .sum();
                ((sum_sq as f64) / n as f64).sqrt().round() as u128
            }
            EnvelopeStatistic::Peak => {
                block.iter().map(|x| x.unsigned_abs()).max().unwrap_or(0) as u128
            }
        };
        magnitude.min(i64::MAX as u128) as i64
    }
}

/// Sample range of the source buffer to extract from.
///
/// Mirrors a clip's in-point and duration: only `offset..offset + length`
/// contributes to the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnvelopeWindow {
    /// First sample to include.
    pub offset: usize,
    /// Number of samples to include (`None` = to the end).
    pub length: Option<usize>,
}

impl EnvelopeWindow {
    /// Resolve against a buffer of `len` samples, clamping to its bounds.
    fn resolve(&self, len: usize) -> (usize, usize) {
        let start = self.offset.min(len);
        let end = match self.length {
            Some(l) => start.saturating_add(l).min(len),
            None => len,
        };
        (start, end)
    }
}

/// Configuration for envelope extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeConfig {
    /// Samples per envelope block.
    pub block_size: usize,
    /// Per-block statistic.
    pub statistic: EnvelopeStatistic,
    /// Optional sub-range of the buffer.
    pub window: Option<EnvelopeWindow>,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            block_size: 1024,
            statistic: EnvelopeStatistic::MeanAbs,
            window: None,
        }
    }
}

impl EnvelopeConfig {
    /// Config with the given block size and default statistic.
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            block_size,
            ..Default::default()
        }
    }
}

/// Extract a magnitude envelope from a mono sample buffer.
///
/// Output length is `ceil(N / block_size)` where `N` is the number of
/// samples inside the window. An empty buffer (or an empty window) yields an
/// empty envelope.
///
/// # Errors
/// `AlignError::InvalidConfig` if `block_size` is zero.
pub fn extract_envelope<S>(samples: &[S], config: &EnvelopeConfig) -> AlignResult<Envelope>
where
    S: Copy + Into<i64>,
{
    if config.block_size == 0 {
        return Err(AlignError::InvalidConfig(
            "envelope block size must be at least 1".to_string(),
        ));
    }

    let (start, end) = config
        .window
        .map(|w| w.resolve(samples.len()))
        .unwrap_or((0, samples.len()));
    let samples = &samples[start..end];

    let block_size = config.block_size;
    let mut values = Vec::with_capacity(samples.len().div_ceil(block_size));
    let mut block = Vec::with_capacity(block_size.min(samples.len()));

    for chunk in samples.chunks(block_size) {
        block.clear();
        block.extend(chunk.iter().map(|&s| s.into()));
        values.push(config.statistic.summarize(&block));
    }

    Ok(Envelope {
        values,
        block_size,
        sample_count: samples.len(),
        statistic: config.statistic,
    })
}
