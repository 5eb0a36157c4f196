use crate::{BYTES_PER_SAMPLE, GROUP_SIZE};

/// Raised when a read is too small to hold even one whole frame.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("short read of {bytes} bytes (one frame is {frame_width} bytes)")]
pub struct ShortRead {
    pub bytes: usize,
    pub frame_width: usize,
}

/// Shape of one interleaved frame: one little-endian sample for each of
/// the [`GROUP_SIZE`] channels of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameLayout;

impl FrameLayout {
    #[expect(clippy::unused_self)]
    pub const fn channels(&self) -> usize {
        GROUP_SIZE
    }

    /// Bytes occupied by one frame.
    #[expect(clippy::unused_self)]
    pub const fn frame_width(&self) -> usize {
        GROUP_SIZE * BYTES_PER_SAMPLE
    }

    /// Bytes needed to hold `frames` whole frames.
    pub const fn bytes_for(&self, frames: usize) -> usize {
        frames * self.frame_width()
    }

    /// Number of whole frames contained in `byte_count` bytes.
    ///
    /// A trailing partial frame is dropped. Fewer bytes than one frame
    /// yields [`ShortRead`].
    pub fn frame_count(&self, byte_count: usize) -> Result<usize, ShortRead> {
        let frame_width = self.frame_width();
        if byte_count < frame_width {
            return Err(ShortRead {
                bytes: byte_count,
                frame_width,
            });
        }
        Ok(byte_count / frame_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_frame_is_sixty_four_bytes() {
        let layout = FrameLayout::default();
        assert_eq!(layout.channels(), 32);
        assert_eq!(layout.frame_width(), 64);
    }

    #[test]
    fn test_whole_frames_are_counted() {
        let layout = FrameLayout::default();
        assert_eq!(layout.frame_count(64), Ok(1));
        assert_eq!(layout.frame_count(640), Ok(10));
    }

    #[test]
    fn test_partial_trailing_frame_is_dropped() {
        let layout = FrameLayout::default();
        assert_eq!(layout.frame_count(64 * 3 + 63), Ok(3));
    }

    #[test]
    fn test_read_below_one_frame_is_short() {
        let layout = FrameLayout::default();
        let err = layout.frame_count(63).unwrap_err();
        assert_eq!(err.bytes, 63);
        assert_eq!(err.frame_width, 64);
        assert!(layout.frame_count(0).is_err());
        assert_eq!(
            err.to_string(),
            "short read of 63 bytes (one frame is 64 bytes)"
        );
    }

    #[test]
    fn test_bytes_for_poll_interval() {
        // 30 kHz at 20 Hz polling -> 1500 frames per poll
        let layout = FrameLayout::default();
        assert_eq!(layout.bytes_for(1500), 96_000);
    }
}
