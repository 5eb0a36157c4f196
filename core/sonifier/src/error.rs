use std::io;

use demux::ShortRead;

/// Failures while bringing up the stream source.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// The child process could not be created
    #[error("failed to spawn \"{command}\": {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The child's stdout could not be switched to non-blocking mode
    #[error("failed to set subprocess stdout nonblocking: {0}")]
    StreamConfig(#[source] nix::errno::Errno),
}

/// Failures of the audio output.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("failed to open audio output: {0}")]
    Open(String),

    #[error("audio write failed: {0}")]
    Write(String),

    #[error("audio drain failed: {0}")]
    Drain(String),
}

/// Conditions that end the whole program.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Readiness reported something other than data, hang-up or error
    #[error("unknown event {0} on subprocess stdout")]
    UnknownReadinessEvent(String),

    #[error("failed to start control surface: {0}")]
    Surface(#[source] io::Error),
}

impl PipelineError {
    pub const fn exit_code(&self) -> u8 {
        1
    }
}

/// What one poll/consume cycle did. None of these stop the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The wait timed out without data.
    Idle,
    /// This many samples went to the sink.
    Delivered(usize),
    /// Too few bytes for one frame; nothing was written.
    ShortRead(ShortRead),
    /// The read itself failed; retried on the next poll.
    ReadError,
    /// The source hung up or signalled an error; streaming stopped.
    SessionEnded,
}
