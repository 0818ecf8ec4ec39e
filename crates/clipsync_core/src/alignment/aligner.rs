//! Per-request alignment pipeline.
//!
//! extract envelopes → correlate → select. Each call is a pure function of
//! its inputs and the configuration; an `Aligner` holds no mutable state and
//! can be shared across threads.

use rayon::prelude::*;

use super::correlation::CorrelationResult;
use super::envelope::{extract_envelope, EnvelopeConfig, EnvelopeStatistic};
use super::methods::{correlate_envelopes, create_from_enum, CorrelationMethod, MethodKind};
use super::selector::{AlignmentSelector, SelectorConfig};
use super::types::{AlignError, AlignResult, AlignmentDecision, Envelope};
use crate::config::AlignmentSettings;

/// Second, finer pass around the coarse estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefineConfig {
    /// Fine block size in samples (must be smaller than the coarse one).
    pub block_size: usize,
    /// Fine blocks searched on each side of the coarse estimate.
    pub margin_blocks: usize,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            block_size: 64,
            margin_blocks: 64,
        }
    }
}

/// Configuration for an alignment request.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentConfig {
    /// Envelope block size in samples.
    pub block_size: usize,
    /// Per-block envelope statistic.
    pub statistic: EnvelopeStatistic,
    /// Subtract each envelope's mean before correlating.
    pub remove_dc: bool,
    /// Correlation method.
    pub method: MethodKind,
    /// Selection policy.
    pub selector: SelectorConfig,
    /// Optional coarse-to-fine refinement.
    pub refine: Option<RefineConfig>,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            block_size: 1024,
            statistic: EnvelopeStatistic::MeanAbs,
            remove_dc: true,
            method: MethodKind::Direct,
            selector: SelectorConfig::default(),
            refine: None,
        }
    }
}

impl AlignmentConfig {
    /// Check that the configuration is usable.
    pub fn validate(&self) -> AlignResult<()> {
        if self.block_size == 0 {
            return Err(AlignError::InvalidConfig(
                "block_size must be at least 1".to_string(),
            ));
        }
        let threshold = self.selector.confidence_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(AlignError::InvalidConfig(format!(
                "confidence_threshold must be a non-negative number, got {}",
                threshold
            )));
        }
        if let Some(refine) = &self.refine {
            if refine.block_size == 0 || refine.block_size >= self.block_size {
                return Err(AlignError::InvalidConfig(format!(
                    "refine block_size must be between 1 and {} (exclusive), got {}",
                    self.block_size, refine.block_size
                )));
            }
        }
        Ok(())
    }

    fn envelope_config(&self, block_size: usize) -> EnvelopeConfig {
        EnvelopeConfig {
            block_size,
            statistic: self.statistic,
            window: None,
        }
    }
}

impl From<&AlignmentSettings> for AlignmentConfig {
    fn from(settings: &AlignmentSettings) -> Self {
        Self {
            block_size: settings.block_size,
            statistic: settings.statistic,
            remove_dc: settings.remove_dc,
            method: settings.method,
            selector: SelectorConfig {
                baseline: settings.baseline,
                confidence_threshold: settings.confidence_threshold,
                exclusion_radius: settings.exclusion_radius,
                interpolate: settings.interpolate,
            },
            refine: settings.refine_block_size.map(|block_size| RefineConfig {
                block_size,
                margin_blocks: settings.refine_margin_blocks,
            }),
        }
    }
}

/// Output of one alignment request.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Recommended offset and confidence.
    pub decision: AlignmentDecision,
    /// Full-range correlation at the coarse block size.
    pub correlation: CorrelationResult,
    /// Windowed correlation from the refinement pass, if one ran.
    pub refined: Option<CorrelationResult>,
}

/// Aligns sub clips against a main clip.
pub struct Aligner {
    config: AlignmentConfig,
    method: Box<dyn CorrelationMethod>,
    selector: AlignmentSelector,
}

impl std::fmt::Debug for Aligner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aligner")
            .field("config", &self.config)
            .field("method", &self.method.name())
            .finish()
    }
}

impl Aligner {
    /// Create an aligner after validating the configuration.
    pub fn new(config: AlignmentConfig) -> AlignResult<Self> {
        config.validate()?;
        let method = create_from_enum(config.method);
        let selector = AlignmentSelector::new(config.selector);
        Ok(Self {
            config,
            method,
            selector,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Align `sub` against `main`.
    ///
    /// A positive offset means `sub` starts that many samples after `main`.
    /// Empty inputs produce a `NoCorrelation` decision, not an error.
    pub fn align<S>(&self, main: &[S], sub: &[S]) -> AlignResult<Alignment>
    where
        S: Copy + Into<i64>,
    {
        let main_env = extract_envelope(main, &self.config.envelope_config(self.config.block_size))?;
        self.align_against(main, &main_env, sub)
    }

    /// Align each of `subs` independently against the same `main`.
    ///
    /// Pairs run in parallel on the rayon pool; the main envelope is built
    /// once. Output order matches `subs`.
    pub fn align_many<S>(&self, main: &[S], subs: &[&[S]]) -> AlignResult<Vec<Alignment>>
    where
        S: Copy + Into<i64> + Sync,
    {
        let main_env = extract_envelope(main, &self.config.envelope_config(self.config.block_size))?;
        tracing::info!("Aligning {} clips against main ({} blocks)", subs.len(), main_env.len());

        subs.par_iter()
            .map(|sub| self.align_against(main, &main_env, sub))
            .collect()
    }

    fn align_against<S>(&self, main: &[S], main_env: &Envelope, sub: &[S]) -> AlignResult<Alignment>
    where
        S: Copy + Into<i64>,
    {
        let block_size = self.config.block_size;
        let sub_env = extract_envelope(sub, &self.config.envelope_config(block_size))?;

        tracing::debug!(
            "Envelopes: main {} blocks, sub {} blocks (block size {}, {})",
            main_env.len(),
            sub_env.len(),
            block_size,
            self.config.statistic
        );

        let correlation =
            correlate_envelopes(main_env, &sub_env, self.method.as_ref(), self.config.remove_dc)?;
        tracing::debug!("{} correlation: {} slots", self.method.name(), correlation.size());

        let coarse = self.selector.select(&correlation, block_size);

        let (decision, refined) = match self.config.refine {
            Some(refine) if coarse.has_offset() => {
                let (fine, fine_corr) = self.refine(main, sub, &coarse, &refine)?;
                match fine {
                    Some(fine) => (fine, Some(fine_corr)),
                    None => (coarse, Some(fine_corr)),
                }
            }
            _ => (coarse, None),
        };

        Ok(Alignment {
            decision,
            correlation,
            refined,
        })
    }

    /// Correlate at the fine block size in a window around `coarse`.
    ///
    /// Returns the shifted fine decision if it found an offset, plus the
    /// windowed correlation.
    fn refine<S>(
        &self,
        main: &[S],
        sub: &[S],
        coarse: &AlignmentDecision,
        refine: &RefineConfig,
    ) -> AlignResult<(Option<AlignmentDecision>, CorrelationResult)>
    where
        S: Copy + Into<i64>,
    {
        let fine_block = refine.block_size;
        let main_fine = extract_envelope(main, &self.config.envelope_config(fine_block))?;
        let sub_fine = extract_envelope(sub, &self.config.envelope_config(fine_block))?;

        let center = coarse.offset_samples.div_euclid(fine_block as i64);
        let margin = refine.margin_blocks as i64;
        let start = (center - margin).max(0);
        let end = (center + sub_fine.len() as i64 + margin).max(0);
        let window = main_fine.slice(start as usize, end as usize);

        tracing::trace!(
            "Refining around block {} at block size {}: main window {}..{}",
            center,
            fine_block,
            start,
            end
        );

        let correlation =
            correlate_envelopes(&window, &sub_fine, self.method.as_ref(), self.config.remove_dc)?;
        let mut fine = self.selector.select(&correlation, fine_block);
        if !fine.has_offset() {
            tracing::trace!("Refinement found no offset; keeping coarse estimate");
            return Ok((None, correlation));
        }

        fine.offset_blocks += start;
        fine.offset_samples += start * fine_block as i64;
        fine.fitted_offset_samples += (start * fine_block as i64) as f64;

        tracing::trace!(
            "Refined offset {} -> {} samples",
            coarse.offset_samples,
            fine.offset_samples
        );
        Ok((Some(fine), correlation))
    }
}
