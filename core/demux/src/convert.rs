use crate::{BYTES_PER_SAMPLE, ChannelSelection, FrameLayout, Gain};

/// Converts one offset-binary sample to signed PCM, scaling by `gain`.
///
/// Out-of-range results saturate at the `i16` bounds; in-range results
/// truncate toward zero.
pub fn offset_binary_to_signed(raw: u16, gain: f64) -> i16 {
    let centered = i32::from(raw) - (1 << 15);
    let scaled = gain * f64::from(centered);
    scaled.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

/// Pulls the selected channel out of a batch of raw frames.
///
/// The output buffer is allocated once and overwritten on every call;
/// nothing carries over between batches.
#[derive(Debug)]
pub struct SampleConverter {
    layout: FrameLayout,
    samples: Vec<i16>,
}

impl SampleConverter {
    pub fn with_capacity(layout: FrameLayout, max_frames: usize) -> Self {
        Self {
            layout,
            samples: Vec::with_capacity(max_frames),
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    /// Converts the first `frame_count` frames of `raw`, one output
    /// sample per frame, and returns the converted samples.
    ///
    /// `frame_count` is bounded by the whole frames actually present in
    /// `raw` and by the buffer capacity.
    pub fn convert(
        &mut self,
        raw: &[u8],
        frame_count: usize,
        selection: ChannelSelection,
        gain: Gain,
    ) -> &[i16] {
        let width = self.layout.frame_width();
        let frames = frame_count
            .min(raw.len() / width)
            .min(self.samples.capacity());
        let start = selection.offset() * BYTES_PER_SAMPLE;
        debug_assert!(start + BYTES_PER_SAMPLE <= width);
        let gain = gain.value();

        self.samples.clear();
        self.samples.extend(raw.chunks_exact(width).take(frames).map(|frame| {
            let sample = u16::from_le_bytes([frame[start], frame[start + 1]]);
            offset_binary_to_signed(sample, gain)
        }));
        &self.samples
    }
}
