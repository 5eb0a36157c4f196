use std::time::Duration;

/// Rate of the produced stream and of the audio output, in Hz.
pub const SAMPLE_RATE: u32 = 30_000;
pub const SAMPLE_RATE_MIN: u32 = 1_000;
pub const SAMPLE_RATE_MAX: u32 = 192_000;

/// How often the source output is polled, in Hz.
pub const POLL_HZ: u32 = 20;
pub const POLL_HZ_MIN: u32 = 2;
pub const POLL_HZ_MAX: u32 = 60;

/// Highest selectable global channel (32 groups of 32 channels).
pub const CHANNEL_MAX: usize = 1023;

/// Flag passed to the source executable so it emits subsampled frames.
pub const SOURCE_FLAG: &str = "-A";

/// Capacity of the operator event queue.
pub const CONTROL_QUEUE_CAPACITY: usize = 64;

/// Sleep between attempts while the audio ring is full.
pub const SINK_BACKOFF: Duration = Duration::from_micros(500);

/// A blocked sink write fails after this long without progress.
pub const SINK_STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Extra time granted to `drain` on top of the queued audio.
pub const SINK_DRAIN_GRACE: Duration = Duration::from_secs(1);
