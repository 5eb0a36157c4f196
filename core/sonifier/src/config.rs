use std::{path::PathBuf, time::Duration};

use clap::Parser;
use demux::{FrameLayout, Gain};

use crate::constants::{
    CHANNEL_MAX, POLL_HZ, POLL_HZ_MAX, POLL_HZ_MIN, SAMPLE_RATE, SAMPLE_RATE_MAX, SAMPLE_RATE_MIN,
    SOURCE_FLAG,
};

/// Where converted audio goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// The system default playback device.
    Device,
    /// A 16-bit mono WAV file.
    Wav(PathBuf),
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct SonifierConfig {
    /// Executable producing the multiplexed stream on its stdout.
    pub source: PathBuf,
    pub source_args: Vec<String>,
    pub sample_rate: u32,
    pub poll_hz: u32,
    pub initial_channel: usize,
    pub initial_gain: Gain,
    /// `false` pins the gain at unity and ignores gain changes.
    pub gain_control: bool,
    pub output: OutputTarget,
}

impl SonifierConfig {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            source_args: vec![SOURCE_FLAG.to_owned()],
            sample_rate: SAMPLE_RATE,
            poll_hz: POLL_HZ,
            initial_channel: 0,
            initial_gain: Gain::UNITY,
            gain_control: true,
            output: OutputTarget::Device,
        }
    }

    pub fn layout(&self) -> FrameLayout {
        FrameLayout::default()
    }

    /// Upper bound on one poll wait.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(1000 / self.poll_hz.max(1)))
    }

    /// Most frames the source can produce between two polls. Never zero.
    pub fn frames_per_poll(&self) -> usize {
        (self.sample_rate / self.poll_hz.max(1)).max(1) as usize
    }

    /// Size of the raw read buffer in bytes.
    pub fn raw_buffer_len(&self) -> usize {
        self.layout().bytes_for(self.frames_per_poll())
    }
}

/// Play one channel of a multiplexed sample stream as audio.
#[derive(Debug, Parser)]
#[command(
    name = "sonifier",
    version,
    after_help = "Operator commands are read from stdin, one per line: start, stop, \
                  channel <N>, gain <G>, status, quit.\n\
                  End of stdin shuts the program down; keep stdin open when \
                  launching from another process."
)]
pub struct Cli {
    /// Path to the executable producing the sample stream
    pub source: PathBuf,

    /// Initial global channel number
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u16).range(0..=CHANNEL_MAX as i64))]
    pub channel: u16,

    /// Initial digital gain (clamped to 1.0..=10.0)
    #[arg(long, default_value_t = 1.0, value_parser = parse_gain)]
    pub gain: f64,

    /// Run without gain control; samples are only format-converted
    #[arg(long)]
    pub fixed_gain: bool,

    /// Sample rate of the stream and of the audio output
    #[arg(
        long,
        default_value_t = SAMPLE_RATE,
        value_parser = clap::value_parser!(u32).range(i64::from(SAMPLE_RATE_MIN)..=i64::from(SAMPLE_RATE_MAX))
    )]
    pub sample_rate: u32,

    /// Source polling frequency in Hz
    #[arg(
        long,
        default_value_t = POLL_HZ,
        value_parser = clap::value_parser!(u32).range(i64::from(POLL_HZ_MIN)..=i64::from(POLL_HZ_MAX))
    )]
    pub poll_hz: u32,

    /// Flag passed to the source executable
    #[arg(long, default_value = SOURCE_FLAG, allow_hyphen_values = true)]
    pub source_flag: String,

    /// Write audio to this WAV file instead of the default output device
    #[arg(long, value_name = "PATH")]
    pub wav: Option<PathBuf>,
}

fn parse_gain(value: &str) -> Result<f64, String> {
    let gain: f64 = value.parse().map_err(|e| format!("{e}"))?;
    Gain::new(gain)
        .map(Gain::value)
        .ok_or_else(|| format!("gain must be a finite number, got {value}"))
}

impl Cli {
    pub fn into_config(self) -> SonifierConfig {
        let mut config = SonifierConfig::new(self.source);
        config.source_args = vec![self.source_flag];
        config.sample_rate = self.sample_rate;
        config.poll_hz = self.poll_hz;
        config.initial_channel = usize::from(self.channel);
        config.gain_control = !self.fixed_gain;
        config.initial_gain = if config.gain_control {
            Gain::new(self.gain).unwrap_or_default()
        } else {
            Gain::UNITY
        };
        config.output = self.wav.map_or(OutputTarget::Device, OutputTarget::Wav);
        config
    }
}
