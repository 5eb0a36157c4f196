use std::{
    fmt,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use hound::{SampleFormat, WavSpec, WavWriter};
use log::{info, warn};

use crate::{device_manager::AudioSink, error::SinkError};

/// Records the converted channel to a 16-bit mono WAV file.
pub struct WavSink {
    path: PathBuf,
    writer: Option<WavWriter<BufWriter<File>>>,
}

impl fmt::Debug for WavSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WavSink")
            .field("path", &self.path)
            .field("open", &self.writer.is_some())
            .finish_non_exhaustive()
    }
}

impl WavSink {
    pub fn create(path: impl AsRef<Path>, sample_rate: u32) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(&path, spec)
            .map_err(|e| SinkError::Open(format!("{}: {e}", path.display())))?;
        info!("recording audio to {} at {sample_rate} Hz", path.display());
        Ok(Self {
            path,
            writer: Some(writer),
        })
    }

    fn writer(&mut self) -> Result<&mut WavWriter<BufWriter<File>>, String> {
        self.writer
            .as_mut()
            .ok_or_else(|| format!("{} is closed", self.path.display()))
    }
}

impl AudioSink for WavSink {
    fn write(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        let writer = self.writer().map_err(SinkError::Write)?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| SinkError::Write(e.to_string()))?;
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), SinkError> {
        self.writer()
            .map_err(SinkError::Drain)?
            .flush()
            .map_err(|e| SinkError::Drain(e.to_string()))
    }

    fn close(&mut self) {
        if let Some(writer) = self.writer.take() {
            match writer.finalize() {
                Ok(()) => info!("closed {}", self.path.display()),
                Err(e) => warn!("failed to finalize {}: {e}", self.path.display()),
            }
        }
    }
}

impl Drop for WavSink {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use hound::WavReader;

    use super::*;

    #[test]
    fn test_written_samples_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channel.wav");

        let mut sink = WavSink::create(&path, 30_000).unwrap();
        sink.write(&[200, -32768, 32767]).unwrap();
        sink.write(&[]).unwrap();
        sink.write(&[-1]).unwrap();
        sink.drain().unwrap();
        sink.close();

        let reader = WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 30_000);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.into_samples().map(Result::unwrap).collect();
        assert_eq!(samples, vec![200, -32768, 32767, -1]);
    }

    #[test]
    fn test_closed_sink_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = WavSink::create(dir.path().join("a.wav"), 8000).unwrap();
        sink.close();
        sink.close();
        assert!(matches!(sink.write(&[1]), Err(SinkError::Write(_))));
        assert!(matches!(sink.drain(), Err(SinkError::Drain(_))));
    }

    #[test]
    fn test_debug_reports_open_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = WavSink::create(dir.path().join("d.wav"), 8000).unwrap();
        assert!(format!("{sink:?}").contains("open: true"));
        sink.close();
        assert!(format!("{sink:?}").contains("open: false"));
    }

    #[test]
    fn test_unwritable_path_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("a.wav");
        assert!(matches!(
            WavSink::create(path, 8000),
            Err(SinkError::Open(_))
        ));
    }
}
