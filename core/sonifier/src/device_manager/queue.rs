use std::{
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use log::debug;
use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    constants::{SINK_BACKOFF, SINK_DRAIN_GRACE, SINK_STALL_TIMEOUT},
    error::SinkError,
};

/// First error reported by the consuming side, if any.
pub type StreamFault = Arc<Mutex<Option<String>>>;

/// Producer half of the ring a realtime callback plays from.
///
/// `push_all` blocks until every sample is queued, giving up when the
/// consumer makes no progress for the stall timeout.
#[derive(Debug)]
pub struct SampleQueue {
    producer: Producer<i16>,
    capacity: usize,
    sample_rate: u32,
    fault: StreamFault,
    stall_timeout: Duration,
    drain_grace: Duration,
}

impl SampleQueue {
    pub fn new(capacity: usize, sample_rate: u32) -> (Self, Consumer<i16>) {
        let capacity = capacity.max(1);
        let (producer, consumer) = RingBuffer::new(capacity);
        let queue = Self {
            producer,
            capacity,
            sample_rate: sample_rate.max(1),
            fault: StreamFault::default(),
            stall_timeout: SINK_STALL_TIMEOUT,
            drain_grace: SINK_DRAIN_GRACE,
        };
        (queue, consumer)
    }

    /// Handle the consuming side uses to report a failure.
    pub fn fault(&self) -> StreamFault {
        Arc::clone(&self.fault)
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples written but not yet taken by the consumer.
    pub fn queued(&self) -> usize {
        self.capacity - self.producer.slots()
    }

    fn check(&self) -> Result<(), String> {
        if self.producer.is_abandoned() {
            return Err("audio callback is gone".to_owned());
        }
        match self.fault.lock() {
            Ok(fault) => fault.clone().map_or(Ok(()), Err),
            Err(_) => Err("audio error state is poisoned".to_owned()),
        }
    }

    pub fn push_all(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        let mut remaining = samples;
        let mut last_progress = Instant::now();

        while !remaining.is_empty() {
            self.check().map_err(SinkError::Write)?;

            let n = remaining.len().min(self.producer.slots());
            if n == 0 {
                if last_progress.elapsed() > self.stall_timeout {
                    return Err(SinkError::Write(
                        "audio device stopped consuming samples".to_owned(),
                    ));
                }
                thread::sleep(SINK_BACKOFF);
                continue;
            }

            let chunk = self
                .producer
                .write_chunk_uninit(n)
                .map_err(|e| SinkError::Write(e.to_string()))?;
            chunk.fill_from_iter(remaining[..n].iter().copied());
            remaining = &remaining[n..];
            last_progress = Instant::now();
        }
        Ok(())
    }

    /// Waits until the consumer has taken everything, for at most the
    /// duration of the queued audio plus a grace period.
    pub fn drain(&mut self) -> Result<(), SinkError> {
        let queued_audio =
            Duration::from_secs_f64(self.queued() as f64 / f64::from(self.sample_rate));
        let limit = queued_audio + self.drain_grace;
        let deadline = Instant::now() + limit;
        debug!("draining {} queued samples", self.queued());

        while self.queued() > 0 {
            self.check().map_err(SinkError::Drain)?;
            if Instant::now() > deadline {
                return Err(SinkError::Drain(format!(
                    "{} samples still queued after {limit:?}",
                    self.queued()
                )));
            }
            thread::sleep(SINK_BACKOFF);
        }
        Ok(())
    }
}
