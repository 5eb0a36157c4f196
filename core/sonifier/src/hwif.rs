//! Outbound command channel to the hardware-interface controller.
//!
//! Requests are single text lines on stderr; stderr carries nothing else.

use std::{
    fmt,
    io::{self, Write as _},
};

use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwifRequest {
    StartStreaming,
    StopStreaming,
    /// Route the subsample stream to this group (chip).
    SetGroup(usize),
}

impl fmt::Display for HwifRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartStreaming => f.write_str("hwif_req: startStreaming_subsamples"),
            Self::StopStreaming => f.write_str("hwif_req: stopStreaming"),
            Self::SetGroup(group) => write!(f, "hwif_req: setSubsamples_byChip, {group}"),
        }
    }
}

pub trait HwifChannel {
    fn send(&mut self, request: HwifRequest);
}

/// Writes requests to any line-oriented writer.
#[derive(Debug)]
pub struct LineChannel<W> {
    out: W,
}

impl<W: io::Write> LineChannel<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl LineChannel<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: io::Write> HwifChannel for LineChannel<W> {
    fn send(&mut self, request: HwifRequest) {
        if let Err(e) = writeln!(self.out, "{request}").and_then(|()| self.out.flush()) {
            warn!("failed to send \"{request}\": {e}");
        }
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingChannel {
    pub sent: Vec<HwifRequest>,
}

#[cfg(test)]
impl HwifChannel for RecordingChannel {
    fn send(&mut self, request: HwifRequest) {
        self.sent.push(request);
    }
}
