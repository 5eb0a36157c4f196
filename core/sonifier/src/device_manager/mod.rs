use crate::{
    config::{OutputTarget, SonifierConfig},
    error::SinkError,
};

pub mod cpal_dm;
pub mod queue;
pub mod wav;

/// Blocking consumer of signed 16-bit mono samples.
pub trait AudioSink {
    /// Blocks until every sample has been accepted.
    fn write(&mut self, samples: &[i16]) -> Result<(), SinkError>;

    /// Waits until previously written audio has been played or stored.
    fn drain(&mut self) -> Result<(), SinkError>;

    /// Releases the output. Safe to call more than once.
    fn close(&mut self);
}

impl<T: AudioSink + ?Sized> AudioSink for Box<T> {
    fn write(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        (**self).write(samples)
    }

    fn drain(&mut self) -> Result<(), SinkError> {
        (**self).drain()
    }

    fn close(&mut self) {
        (**self).close();
    }
}

/// Opens the sink selected by `config`.
pub fn open_sink(config: &SonifierConfig) -> Result<Box<dyn AudioSink>, SinkError> {
    Ok(match &config.output {
        OutputTarget::Device => Box::new(cpal_dm::CpalAudioSink::open(config.sample_rate)?),
        OutputTarget::Wav(path) => Box::new(wav::WavSink::create(path, config.sample_rate)?),
    })
}
