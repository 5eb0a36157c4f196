//! Frame decoding and single-channel extraction for multiplexed
//! offset-binary sample streams.

pub mod convert;
pub mod gain;
pub mod layout;
pub mod selection;

pub use convert::{SampleConverter, offset_binary_to_signed};
pub use gain::Gain;
pub use layout::{FrameLayout, ShortRead};
pub use selection::ChannelSelection;

/// Channels multiplexed onto one hardware group (chip).
pub const GROUP_SIZE: usize = 32;

/// Width in bytes of one raw sample.
pub const BYTES_PER_SAMPLE: usize = 2;
