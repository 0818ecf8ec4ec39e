mod cli;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use clipsync_core::alignment::{Aligner, AlignmentConfig, AlignmentDecision, MethodKind, RefineConfig};
use clipsync_core::config::{ConfigManager, Settings};
use clipsync_core::logging;

use cli::Cli;

/// One line of the JSON report.
#[derive(Serialize)]
struct ClipReport {
    clip: PathBuf,
    #[serde(flatten)]
    decision: AlignmentDecision,
    offset_secs: Option<f64>,
    correlation_slots: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => {
            let mut manager = ConfigManager::new(path);
            manager
                .load_or_create()
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            manager.settings().clone()
        }
        None => Settings::default(),
    };

    let mut log_settings = settings.logging.clone();
    if let Some(level) = cli.log_level {
        log_settings.level = level;
    }
    logging::init_from_settings(&log_settings);

    let config = build_config(&cli, &settings);
    let aligner = Aligner::new(config).context("Invalid alignment settings")?;

    let reports = align_files(&cli, &aligner)?;
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

/// Align every sub file against the main file and build the report.
fn align_files(cli: &Cli, aligner: &Aligner) -> Result<Vec<ClipReport>> {
    let main_samples = read_pcm(&cli.main)?;
    let subs = cli
        .subs
        .iter()
        .map(|p| read_pcm(p))
        .collect::<Result<Vec<_>>>()?;
    let sub_slices: Vec<&[i16]> = subs.iter().map(|s| s.as_slice()).collect();

    let alignments = aligner.align_many(main_samples.as_slice(), sub_slices.as_slice())?;

    let mut reports = Vec::with_capacity(alignments.len());
    for (index, (path, alignment)) in cli.subs.iter().zip(&alignments).enumerate() {
        if let Some(image_path) = &cli.image {
            let target = numbered_path(image_path, index, cli.subs.len());
            alignment
                .correlation
                .to_image(cli.height)
                .save(&target)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            tracing::info!("Wrote correlation plot to {}", target.display());
        }

        reports.push(ClipReport {
            clip: path.clone(),
            decision: alignment.decision.clone(),
            offset_secs: cli
                .sample_rate
                .and_then(|rate| alignment.decision.offset_secs(rate)),
            correlation_slots: alignment.correlation.size(),
        });
    }
    Ok(reports)
}

/// Config file values with command-line overrides applied.
fn build_config(cli: &Cli, settings: &Settings) -> AlignmentConfig {
    let mut config = AlignmentConfig::from(&settings.alignment);
    if let Some(block_size) = cli.block_size {
        config.block_size = block_size;
    }
    if let Some(threshold) = cli.threshold {
        config.selector.confidence_threshold = threshold;
    }
    if let Some(baseline) = cli.baseline {
        config.selector.baseline = baseline.into();
    }
    if let Some(block_size) = cli.refine {
        config.refine = Some(RefineConfig {
            block_size,
            margin_blocks: settings.alignment.refine_margin_blocks,
        });
    }
    if cli.parallel {
        config.method = MethodKind::Parallel;
    }
    config
}

/// Read raw signed 16-bit little-endian mono PCM.
///
/// An empty file is not an error; it aligns to a `no_correlation` decision.
fn read_pcm(path: &Path) -> Result<Vec<i16>> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if bytes.len() % 2 != 0 {
        tracing::warn!("{} has an odd byte count; ignoring the last byte", path.display());
    }
    let samples: Vec<i16> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    tracing::debug!("Read {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// `plot.png` for a single clip, `plot-0.png`, `plot-1.png`, ... for several.
fn numbered_path(path: &Path, index: usize, count: usize) -> PathBuf {
    if count <= 1 {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "correlation".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}-{}", stem, index),
    };
    path.with_file_name(name)
}
