//! Audio alignment between two independently recorded clips.
//!
//! # Architecture
//!
//! The pipeline consists of pure functions composed by [`Aligner`]:
//!
//! 1. **Envelope Extraction** (`envelope`): Reduce each mono PCM buffer to one
//!    magnitude per fixed-size block.
//!
//! 2. **Correlation** (`methods`): Brute-force discrete cross-correlation of
//!    the two envelopes over every relative offset, accumulated in 64 bits.
//!
//! 3. **Correlation Result** (`correlation`): The buffer of values per offset
//!    with a once-computed (or explicitly set) maximum.
//!
//! 4. **Selection** (`selector`): Map the peak back to a signed sample offset
//!    and score it against a baseline.
//!
//! 5. **Rendering** (`render`): Optional raster plots for operator review.
//!
//! # Usage
//!
//! ```no_run
//! use clipsync_core::alignment::{Aligner, AlignmentConfig};
//!
//! let camera: Vec<i16> = vec![0; 48_000];
//! let recorder: Vec<i16> = vec![0; 24_000];
//!
//! let aligner = Aligner::new(AlignmentConfig::default())?;
//! let alignment = aligner.align(&camera, &recorder)?;
//!
//! if alignment.decision.is_valid() {
//!     println!("recorder starts {} samples into camera", alignment.decision.offset_samples);
//! }
//! let plot = alignment.correlation.to_image(200);
//! # Ok::<(), clipsync_core::alignment::AlignError>(())
//! ```

mod aligner;
mod correlation;
mod envelope;
pub mod methods;
mod render;
mod selector;
pub mod types;

// Re-export main types from types module
pub use types::{
    AlignError, AlignResult, AlignmentDecision, DecisionStatus, Envelope, NoCorrelationReason,
    Peak,
};

// Re-export the pipeline
pub use aligner::{Aligner, Alignment, AlignmentConfig, RefineConfig};

// Re-export envelope extraction
pub use envelope::{extract_envelope, EnvelopeConfig, EnvelopeStatistic, EnvelopeWindow};

// Re-export correlation container
pub use correlation::{CorrelationResult, MaxState};

// Re-export method trait, implementations, and factory functions
pub use methods::{
    available_methods, correlate_envelopes, create_from_enum, create_method, CorrelationMethod,
    Direct, MethodKind, Parallel,
};

// Re-export selection
pub use selector::{AlignmentSelector, Baseline, SelectorConfig};

// Re-export rendering
pub use render::{render_correlation, render_envelope};
