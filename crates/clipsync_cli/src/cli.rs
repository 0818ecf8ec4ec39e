use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clipsync_core::alignment::Baseline;
use clipsync_core::logging::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "clipsync",
    version,
    about = "Find the time offset of audio clips against a main recording"
)]
pub struct Cli {
    /// Main recording (raw signed 16-bit little-endian mono PCM)
    pub main: PathBuf,

    /// One or more clips to align against the main recording (same format)
    #[arg(required = true)]
    pub subs: Vec<PathBuf>,

    /// TOML config file; created with defaults if missing
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Envelope block size in samples (overrides config)
    #[arg(short, long)]
    pub block_size: Option<usize>,

    /// Minimum peak/baseline ratio for an accepted offset (overrides config)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Baseline used for the confidence score (overrides config)
    #[arg(long, value_enum)]
    pub baseline: Option<BaselineArg>,

    /// Fine block size for a second pass around the coarse offset
    #[arg(long)]
    pub refine: Option<usize>,

    /// Spread the correlation of each clip across threads
    #[arg(long)]
    pub parallel: bool,

    /// Sample rate of the inputs, used to report offsets in seconds
    #[arg(short = 'r', long)]
    pub sample_rate: Option<u32>,

    /// Write a bar plot of each correlation buffer to this PNG path
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Height of the correlation plot in pixels
    #[arg(long, default_value_t = 200)]
    pub height: u32,

    /// Log level when RUST_LOG is not set (overrides config)
    #[arg(long)]
    pub log_level: Option<LogLevel>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum BaselineArg {
    MeanAbs,
    MedianAbs,
    SecondPeak,
}

impl From<BaselineArg> for Baseline {
    fn from(arg: BaselineArg) -> Self {
        match arg {
            BaselineArg::MeanAbs => Baseline::MeanAbs,
            BaselineArg::MedianAbs => Baseline::MedianAbs,
            BaselineArg::SecondPeak => Baseline::SecondPeak,
        }
    }
}
