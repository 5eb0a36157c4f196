use std::{fmt, io, time::Duration};

use log::warn;
use nix::poll::{PollFd, PollTimeout, poll};
use uuid::Uuid;

use crate::error::SourceError;

pub mod process;

pub use process::ProcessSource;

/// Identifies one start..stop run of the source in the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl From<Uuid> for SessionId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of waiting on the source's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Timeout,
    Readable,
    HangUp,
    Error,
    /// Anything else the poll reported, rendered for diagnostics.
    Unknown(String),
}

/// A producer of raw multiplexed frames.
///
/// The event loop only calls `stop`, `wait` and `read` while a session is
/// running, and only calls `start` while none is.
pub trait StreamSource {
    /// Launches the producer with a non-blocking output.
    fn start(&mut self) -> Result<SessionId, SourceError>;

    /// Forcefully terminates the producer. No-op when nothing runs.
    fn stop(&mut self);

    /// Blocks for at most `timeout` until the output is readable, hangs up
    /// or fails.
    fn wait(&mut self, timeout: Duration) -> Readiness;

    /// One non-blocking read of whatever is available.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Waits `timeout` without watching any descriptor.
    fn idle_wait(&mut self, timeout: Duration) {
        sleep_on_poll(timeout);
    }
}

pub(crate) fn poll_timeout(timeout: Duration) -> PollTimeout {
    u16::try_from(timeout.as_millis()).map_or(PollTimeout::MAX, PollTimeout::from)
}

/// Uses the readiness primitive with no descriptors as a timer.
pub fn sleep_on_poll(timeout: Duration) {
    let mut none: [PollFd<'_>; 0] = [];
    if let Err(e) = poll(&mut none, poll_timeout(timeout)) {
        if e != nix::errno::Errno::EINTR {
            warn!("idle poll failed: {e}");
        }
    }
}
