use std::fmt;

use cpal::{
    BufferSize, OutputCallbackInfo, Sample as _, SampleFormat, SampleRate, StreamConfig,
    traits::{DeviceTrait as _, HostTrait as _, StreamTrait as _},
};
use log::{debug, error, info};
use rtrb::Consumer;

use crate::{
    device_manager::{
        AudioSink,
        queue::{SampleQueue, StreamFault},
    },
    error::SinkError,
};

/// Sample formats the output callback can convert to.
const PLAYABLE_FORMATS: [SampleFormat; 3] =
    [SampleFormat::I16, SampleFormat::F32, SampleFormat::U16];

/// Plays samples on the default output device.
///
/// `write` feeds a ring buffer that the device callback drains; it only
/// returns once every sample is queued. The callback plays silence on
/// underrun.
pub struct CpalAudioSink {
    stream: Option<cpal::Stream>,
    queue: SampleQueue,
    sample_rate: u32,
}

impl fmt::Debug for CpalAudioSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CpalAudioSink")
            .field("open", &self.stream.is_some())
            .field("capacity", &self.queue.capacity())
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

impl CpalAudioSink {
    pub fn open(sample_rate: u32) -> Result<Self, SinkError> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| SinkError::Open("no default output device".to_owned()))?;

        let format = choose_sample_format(&device, sample_rate)?;
        let config = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Default,
        };

        // half a second of audio
        let (queue, consumer) = SampleQueue::new(sample_rate as usize / 2, sample_rate);
        let fault = queue.fault();

        let stream = match format {
            SampleFormat::F32 => build_output_stream::<f32>(&device, &config, consumer, fault)?,
            SampleFormat::I16 => build_output_stream::<i16>(&device, &config, consumer, fault)?,
            SampleFormat::U16 => build_output_stream::<u16>(&device, &config, consumer, fault)?,
            format => {
                return Err(SinkError::Open(format!(
                    "unsupported sample format '{format}'"
                )));
            }
        };

        stream
            .play()
            .map_err(|e| SinkError::Open(e.to_string()))?;

        info!(
            "audio output on \"{}\": {sample_rate} Hz mono, device format {format}",
            device.name().unwrap_or_else(|_| "unknown".to_owned()),
        );

        Ok(Self {
            stream: Some(stream),
            queue,
            sample_rate,
        })
    }

    fn ensure_open(&self) -> Result<(), String> {
        if self.stream.is_none() {
            return Err("output is closed".to_owned());
        }
        Ok(())
    }
}

/// Finds a format the device accepts for mono output at `sample_rate`,
/// preferring the device's default format.
fn choose_sample_format(
    device: &cpal::Device,
    sample_rate: u32,
) -> Result<SampleFormat, SinkError> {
    let wanted = SampleRate(sample_rate);
    let candidates: Vec<SampleFormat> = device
        .supported_output_configs()
        .map_err(|e| SinkError::Open(e.to_string()))?
        .filter(|range| {
            range.channels() == 1
                && range.min_sample_rate() <= wanted
                && wanted <= range.max_sample_rate()
        })
        .map(|range| range.sample_format())
        .collect();
    let preferred = device
        .default_output_config()
        .ok()
        .map(|config| config.sample_format());

    pick_format(&candidates, preferred).ok_or_else(|| {
        SinkError::Open(format!(
            "device has no 1-channel output at {sample_rate} Hz in i16, f32 or u16"
        ))
    })
}

fn pick_format(
    candidates: &[SampleFormat],
    preferred: Option<SampleFormat>,
) -> Option<SampleFormat> {
    let playable = |format: &SampleFormat| PLAYABLE_FORMATS.contains(format);
    preferred
        .filter(|format| playable(format) && candidates.contains(format))
        .or_else(|| {
            PLAYABLE_FORMATS
                .iter()
                .copied()
                .find(|format| candidates.contains(format))
        })
}

/// Fills every channel of each output frame with the next queued sample,
/// or with silence when the queue has run dry.
fn fill_frames<T>(data: &mut [T], channels: usize, consumer: &mut Consumer<i16>)
where
    T: cpal::Sample + cpal::FromSample<i16>,
{
    for frame in data.chunks_mut(channels.max(1)) {
        let value = consumer
            .pop()
            .map_or(T::EQUILIBRIUM, |sample| sample.to_sample::<T>());
        frame.fill(value);
    }
}

fn build_output_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut consumer: Consumer<i16>,
    fault: StreamFault,
) -> Result<cpal::Stream, SinkError>
where
    T: cpal::SizedSample + cpal::FromSample<i16>,
{
    let error_cb = move |err: cpal::StreamError| {
        error!("audio stream error: {err}");
        if let Ok(mut slot) = fault.lock() {
            slot.get_or_insert_with(|| err.to_string());
        }
    };

    let channels = usize::from(config.channels);
    let data_cb = move |data: &mut [T], _: &OutputCallbackInfo| {
        fill_frames(data, channels, &mut consumer);
    };

    device
        .build_output_stream(config, data_cb, error_cb, None)
        .map_err(|e| SinkError::Open(e.to_string()))
}

impl AudioSink for CpalAudioSink {
    fn write(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        self.ensure_open().map_err(SinkError::Write)?;
        self.queue.push_all(samples)
    }

    fn drain(&mut self) -> Result<(), SinkError> {
        self.ensure_open().map_err(SinkError::Drain)?;
        self.queue.drain()
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                debug!("failed to pause audio stream on close: {e}");
            }
            info!("audio output closed");
        }
    }
}

impl Drop for CpalAudioSink {
    fn drop(&mut self) {
        self.close();
    }
}
