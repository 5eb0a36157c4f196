use demux::{ChannelSelection, Gain};

pub mod command;
pub mod terminal;

pub use command::{ControlEvent, ControlEventConsumer, ControlEventProducer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Streaming,
}

/// Operator-controlled state shared between the surface callbacks and the
/// per-cycle pipeline. Both run on the event loop's thread.
#[derive(Debug, Clone)]
pub struct ControlState {
    selection: ChannelSelection,
    gain: Gain,
    gain_control: bool,
    playback: PlaybackState,
    /// Set once, never cleared.
    shutdown: bool,
}

impl ControlState {
    pub fn new(channel: usize, gain: Gain, gain_control: bool) -> Self {
        Self {
            selection: ChannelSelection::new(channel),
            gain: if gain_control { gain } else { Gain::UNITY },
            gain_control,
            playback: PlaybackState::Idle,
            shutdown: false,
        }
    }

    pub const fn selection(&self) -> ChannelSelection {
        self.selection
    }

    pub const fn gain(&self) -> Gain {
        self.gain
    }

    pub const fn gain_control(&self) -> bool {
        self.gain_control
    }

    pub const fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub const fn is_streaming(&self) -> bool {
        matches!(self.playback, PlaybackState::Streaming)
    }

    pub const fn shutdown_requested(&self) -> bool {
        self.shutdown
    }

    /// Returns the new group when the selection moved to another one.
    pub fn select_channel(&mut self, channel: usize) -> Option<usize> {
        self.selection.select(channel)
    }

    /// Returns `false` when gain control is disabled.
    pub fn set_gain(&mut self, gain: Gain) -> bool {
        if self.gain_control {
            self.gain = gain;
        }
        self.gain_control
    }

    pub fn set_playback(&mut self, playback: PlaybackState) {
        self.playback = playback;
    }

    pub fn request_shutdown(&mut self) {
        self.shutdown = true;
    }
}
