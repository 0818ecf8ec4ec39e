//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::alignment::{Baseline, EnvelopeStatistic, MethodKind};
use crate::logging::LogLevel;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Alignment engine knobs.
    #[serde(default)]
    pub alignment: AlignmentSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Alignment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentSettings {
    /// Envelope block size in samples. Larger is faster but coarser.
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Per-block envelope statistic.
    #[serde(default)]
    pub statistic: EnvelopeStatistic,

    /// Subtract envelope means before correlating.
    #[serde(default = "default_true")]
    pub remove_dc: bool,

    /// Correlation method.
    #[serde(default)]
    pub method: MethodKind,

    /// Baseline statistic for the confidence ratio.
    #[serde(default)]
    pub baseline: Baseline,

    /// Minimum peak-to-baseline ratio to accept an offset.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// [Second Peak] Slots around the peak ignored for the runner-up.
    #[serde(default = "default_exclusion_radius")]
    pub exclusion_radius: usize,

    /// Parabolic sub-block interpolation of the peak.
    #[serde(default = "default_true")]
    pub interpolate: bool,

    /// Fine block size for a second pass (unset = no refinement).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refine_block_size: Option<usize>,

    /// Fine blocks searched on each side of the coarse estimate.
    #[serde(default = "default_refine_margin")]
    pub refine_margin_blocks: usize,
}

fn default_block_size() -> usize {
    1024
}

fn default_confidence_threshold() -> f64 {
    2.0
}

fn default_exclusion_radius() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_refine_margin() -> usize {
    64
}

impl Default for AlignmentSettings {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            statistic: EnvelopeStatistic::default(),
            remove_dc: true,
            method: MethodKind::default(),
            baseline: Baseline::default(),
            confidence_threshold: default_confidence_threshold(),
            exclusion_radius: default_exclusion_radius(),
            interpolate: true,
            refine_block_size: None,
            refine_margin_blocks: default_refine_margin(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set.
    #[serde(default)]
    pub level: LogLevel,

    /// Include the module target in log lines.
    #[serde(default = "default_true")]
    pub show_target: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            show_target: true,
        }
    }
}

/// Configuration sections for section-level updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Alignment,
    Logging,
}

impl ConfigSection {
    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Alignment => "alignment",
            ConfigSection::Logging => "logging",
        }
    }

    /// All sections, in file order.
    pub fn all() -> [ConfigSection; 2] {
        [ConfigSection::Alignment, ConfigSection::Logging]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[alignment]"));
        assert!(toml.contains("[logging]"));
        assert!(toml.contains("block_size = 1024"));
        assert!(toml.contains("statistic = \"mean-abs\""));
    }

    #[test]
    fn settings_round_trip() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.alignment.block_size, settings.alignment.block_size);
        assert_eq!(parsed.logging.level, settings.logging.level);
    }

    #[test]
    fn partial_section_gets_defaults() {
        let parsed: Settings =
            toml::from_str("[alignment]\nbaseline = \"second-peak\"\nrefine_block_size = 32\n")
                .unwrap();
        assert_eq!(parsed.alignment.baseline, Baseline::SecondPeak);
        assert_eq!(parsed.alignment.refine_block_size, Some(32));
        assert_eq!(parsed.alignment.block_size, 1024);
        assert!(parsed.alignment.interpolate);
        assert_eq!(parsed.logging.level, LogLevel::Info);
    }

    #[test]
    fn table_names_match_sections() {
        let names: Vec<_> = ConfigSection::all().iter().map(|s| s.table_name()).collect();
        assert_eq!(names, vec!["alignment", "logging"]);
    }
}
