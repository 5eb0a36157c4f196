//! The single-threaded scheduler tying operator input, the stream source
//! and the audio sink together.
//!
//! Each cycle drains all queued operator events, waits at most one poll
//! interval for source output, and pushes whatever arrived through
//! decode, convert and a blocking sink write. Nothing else suspends, so
//! a cycle's work bounds how quickly operator input is seen.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use demux::{FrameLayout, Gain, SampleConverter};
use log::{debug, error, info, warn};

use crate::{
    config::SonifierConfig,
    constants::CHANNEL_MAX,
    control::{ControlEvent, ControlEventConsumer, ControlState, PlaybackState},
    device_manager::AudioSink,
    error::{CycleOutcome, PipelineError},
    hwif::{HwifChannel, HwifRequest},
    source::{Readiness, SessionId, StreamSource},
};

pub mod state;

pub use state::LoopPhase;

pub struct EventLoop<S, K, C> {
    source: S,
    sink: K,
    hwif: C,
    events: ControlEventConsumer,
    /// Raised from outside the loop (signals) to request shutdown.
    interrupt: Option<Arc<AtomicBool>>,
    state: ControlState,
    session: Option<SessionId>,
    terminated: bool,
    layout: FrameLayout,
    poll_interval: Duration,
    raw: Vec<u8>,
    converter: SampleConverter,
}

impl<S, K, C> EventLoop<S, K, C>
where
    S: StreamSource,
    K: AudioSink,
    C: HwifChannel,
{
    pub fn new(
        config: &SonifierConfig,
        source: S,
        sink: K,
        hwif: C,
        events: ControlEventConsumer,
    ) -> Self {
        let layout = config.layout();
        Self {
            source,
            sink,
            hwif,
            events,
            interrupt: None,
            state: ControlState::new(
                config.initial_channel.min(CHANNEL_MAX),
                config.initial_gain,
                config.gain_control,
            ),
            session: None,
            terminated: false,
            layout,
            poll_interval: config.poll_interval(),
            raw: vec![0; config.raw_buffer_len()],
            converter: SampleConverter::with_capacity(layout, config.frames_per_poll()),
        }
    }

    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    pub const fn state(&self) -> &ControlState {
        &self.state
    }

    pub const fn phase(&self) -> LoopPhase {
        if self.terminated {
            LoopPhase::Terminated
        } else if self.state.shutdown_requested() {
            LoopPhase::ShuttingDown
        } else if self.state.is_streaming() {
            LoopPhase::Streaming
        } else {
            LoopPhase::Idle
        }
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    pub const fn sink(&self) -> &K {
        &self.sink
    }

    pub const fn hwif(&self) -> &C {
        &self.hwif
    }

    /// Runs until shutdown is requested or a fatal error occurs. The sink
    /// is closed on every path; it is drained only on a clean shutdown.
    pub fn run(&mut self) -> Result<(), PipelineError> {
        self.hwif
            .send(HwifRequest::SetGroup(self.state.selection().group()));
        let result = self.run_cycles();
        self.finish(result)
    }

    fn run_cycles(&mut self) -> Result<(), PipelineError> {
        while !self.state.shutdown_requested() {
            self.drain_events()?;
            if self.state.shutdown_requested() {
                break;
            }
            self.cycle()?;
        }
        Ok(())
    }

    fn finish(&mut self, result: Result<(), PipelineError>) -> Result<(), PipelineError> {
        self.state.request_shutdown();
        self.stop_streaming("shutdown");

        let result = result.and_then(|()| {
            self.sink.drain().map_err(|e| {
                error!("{e}");
                PipelineError::from(e)
            })
        });
        self.sink.close();
        self.terminated = true;
        result
    }

    /// Applies every queued operator event without blocking.
    pub fn drain_events(&mut self) -> Result<(), PipelineError> {
        let interrupted = self
            .interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed));
        if interrupted && !self.state.shutdown_requested() {
            info!("interrupted");
            self.on_shutdown_requested();
        }

        while let Ok(event) = self.events.pop() {
            self.process_event(event)?;
        }
        Ok(())
    }

    pub fn process_event(&mut self, event: ControlEvent) -> Result<(), PipelineError> {
        if self.state.shutdown_requested() {
            debug!("ignoring {event:?} during shutdown");
            return Ok(());
        }

        match event {
            ControlEvent::Start => self.on_start_requested()?,
            ControlEvent::Stop => self.on_stop_requested(),
            ControlEvent::SetChannel(channel) => self.on_channel_changed(channel),
            ControlEvent::SetGain(gain) => self.on_gain_changed(gain),
            ControlEvent::Status => self.report_status(),
            ControlEvent::Shutdown => self.on_shutdown_requested(),
        }
        Ok(())
    }

    pub fn on_start_requested(&mut self) -> Result<(), PipelineError> {
        if self.state.is_streaming() {
            debug!("start requested while already streaming");
            return Ok(());
        }

        self.hwif.send(HwifRequest::StartStreaming);
        let session = self.source.start()?;
        info!("streaming session {session} started");
        self.session = Some(session);
        self.state.set_playback(PlaybackState::Streaming);
        Ok(())
    }

    pub fn on_stop_requested(&mut self) {
        self.stop_streaming("stop requested");
    }

    pub fn on_channel_changed(&mut self, channel: usize) {
        if channel > CHANNEL_MAX {
            warn!("channel {channel} is out of range 0..={CHANNEL_MAX}");
            return;
        }
        if let Some(group) = self.state.select_channel(channel) {
            self.hwif.send(HwifRequest::SetGroup(group));
        }
        let selection = self.state.selection();
        debug!(
            "channel {channel} selected (group {}, offset {})",
            selection.group(),
            selection.offset()
        );
    }

    pub fn on_gain_changed(&mut self, gain: f64) {
        let Some(gain) = Gain::new(gain) else {
            warn!("ignoring non-finite gain {gain}");
            return;
        };
        if self.state.set_gain(gain) {
            debug!("gain set to {:.1}", gain.value());
        } else {
            debug!("gain control disabled, ignoring gain {:.1}", gain.value());
        }
    }

    pub fn on_shutdown_requested(&mut self) {
        info!("shutdown requested");
        self.state.request_shutdown();
    }

    fn report_status(&self) {
        let selection = self.state.selection();
        info!(
            "{:?}: channel {} (group {}, offset {}), gain {:.1}{}",
            self.state.playback(),
            selection.global(),
            selection.group(),
            selection.offset(),
            self.state.gain().value(),
            self.session
                .as_ref()
                .map(|session| format!(", session {session}"))
                .unwrap_or_default()
        );
    }

    fn stop_streaming(&mut self, reason: &str) {
        if !self.state.is_streaming() {
            return;
        }
        self.state.set_playback(PlaybackState::Idle);
        self.hwif.send(HwifRequest::StopStreaming);
        self.source.stop();
        match self.session.take() {
            Some(session) => info!("streaming session {session} ended: {reason}"),
            None => info!("streaming ended: {reason}"),
        }
    }

    /// One bounded wait on the source plus whatever processing it enables.
    pub fn cycle(&mut self) -> Result<CycleOutcome, PipelineError> {
        if !self.state.is_streaming() {
            self.source.idle_wait(self.poll_interval);
            return Ok(CycleOutcome::Idle);
        }

        match self.source.wait(self.poll_interval) {
            Readiness::Timeout => Ok(CycleOutcome::Idle),
            Readiness::Readable => self.consume(),
            Readiness::HangUp => {
                warn!("received hang-up on subprocess stdout");
                self.stop_streaming("hang-up");
                Ok(CycleOutcome::SessionEnded)
            }
            Readiness::Error => {
                warn!("received error on subprocess stdout");
                self.stop_streaming("stream error");
                Ok(CycleOutcome::SessionEnded)
            }
            Readiness::Unknown(events) => {
                error!("unknown event {events} on subprocess stdout, exiting");
                Err(PipelineError::UnknownReadinessEvent(events))
            }
        }
    }

    fn consume(&mut self) -> Result<CycleOutcome, PipelineError> {
        let bytes = match self.source.read(&mut self.raw) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("read error on subprocess stdout: {e}");
                return Ok(CycleOutcome::ReadError);
            }
        };

        let frames = match self.layout.frame_count(bytes) {
            Ok(frames) => frames,
            Err(short) => {
                warn!("{short} from subprocess stdout");
                return Ok(CycleOutcome::ShortRead(short));
            }
        };

        let samples = self.converter.convert(
            &self.raw[..bytes],
            frames,
            self.state.selection(),
            self.state.gain(),
        );
        self.sink.write(samples).map_err(|e| {
            error!("{e}");
            PipelineError::from(e)
        })?;
        Ok(CycleOutcome::Delivered(samples.len()))
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, io};

    use rtrb::{Producer, RingBuffer};
    use uuid::Uuid;

    use super::*;
    use crate::{
        error::{SinkError, SourceError},
        hwif::RecordingChannel,
    };

    #[derive(Debug)]
    enum Step {
        Data(Vec<u8>),
        ReadFailure,
        HangUp,
        Error,
        Unknown,
    }

    #[derive(Debug, Default)]
    struct FakeSource {
        steps: VecDeque<Step>,
        pending: Option<Step>,
        running: bool,
        starts: usize,
        stops: usize,
        waits: usize,
        idle_waits: usize,
        fail_start: bool,
        /// Raised once the script is used up so `run` can finish.
        exhausted: Option<Arc<AtomicBool>>,
    }

    impl FakeSource {
        fn signal_if_exhausted(&self) {
            if self.steps.is_empty() {
                if let Some(flag) = &self.exhausted {
                    flag.store(true, Ordering::Relaxed);
                }
            }
        }
    }

    impl StreamSource for FakeSource {
        fn start(&mut self) -> Result<SessionId, SourceError> {
            if self.fail_start {
                return Err(SourceError::Spawn {
                    command: "fake -A".to_owned(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                });
            }
            self.starts += 1;
            self.running = true;
            Ok(SessionId::from(Uuid::new_v4()))
        }

        fn stop(&mut self) {
            self.stops += 1;
            self.running = false;
        }

        fn wait(&mut self, _timeout: Duration) -> Readiness {
            assert!(self.running, "waited on a stopped source");
            self.waits += 1;
            let Some(step) = self.steps.pop_front() else {
                self.signal_if_exhausted();
                return Readiness::Timeout;
            };
            match step {
                Step::Data(_) | Step::ReadFailure => {
                    self.pending = Some(step);
                    Readiness::Readable
                }
                Step::HangUp => Readiness::HangUp,
                Step::Error => Readiness::Error,
                Step::Unknown => Readiness::Unknown("POLLNVAL".to_owned()),
            }
        }

        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.pending.take() {
                Some(Step::Data(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                _ => Err(io::Error::from(io::ErrorKind::WouldBlock)),
            }
        }

        fn idle_wait(&mut self, _timeout: Duration) {
            self.idle_waits += 1;
            self.signal_if_exhausted();
        }
    }

    #[derive(Debug, Default)]
    struct FakeSink {
        writes: Vec<Vec<i16>>,
        drains: usize,
        closes: usize,
        fail_write: bool,
        fail_drain: bool,
    }

    impl AudioSink for FakeSink {
        fn write(&mut self, samples: &[i16]) -> Result<(), SinkError> {
            if self.fail_write {
                return Err(SinkError::Write("device unplugged".to_owned()));
            }
            self.writes.push(samples.to_vec());
            Ok(())
        }

        fn drain(&mut self) -> Result<(), SinkError> {
            self.drains += 1;
            if self.fail_drain {
                return Err(SinkError::Drain("timed out".to_owned()));
            }
            Ok(())
        }

        fn close(&mut self) {
            self.closes += 1;
        }
    }

    type TestLoop = EventLoop<FakeSource, FakeSink, RecordingChannel>;

    fn create_loop(config: &SonifierConfig, source: FakeSource) -> (TestLoop, Producer<ControlEvent>) {
        let (producer, consumer) = RingBuffer::new(32);
        let event_loop = EventLoop::new(
            config,
            source,
            FakeSink::default(),
            RecordingChannel::default(),
            consumer,
        );
        (event_loop, producer)
    }

    fn config(channel: usize, gain: f64) -> SonifierConfig {
        let mut config = SonifierConfig::new("fake");
        config.initial_channel = channel;
        config.initial_gain = Gain::new(gain).unwrap();
        config
    }

    /// `count` frames with `value` at `offset` and midscale elsewhere.
    fn frames(count: usize, offset: usize, value: u16) -> Vec<u8> {
        let mut raw = Vec::new();
        for _ in 0..count {
            for channel in 0..demux::GROUP_SIZE {
                let sample: u16 = if channel == offset { value } else { 32768 };
                raw.extend_from_slice(&sample.to_le_bytes());
            }
        }
        raw
    }

    fn scripted(steps: Vec<Step>) -> FakeSource {
        FakeSource {
            steps: steps.into(),
            ..FakeSource::default()
        }
    }

    fn streaming_loop(channel: usize, gain: f64, steps: Vec<Step>) -> TestLoop {
        let (mut event_loop, _) = create_loop(&config(channel, gain), scripted(steps));
        event_loop.on_start_requested().unwrap();
        event_loop
    }

    #[test]
    fn test_channel_forty_gain_two_scenario() {
        let (mut event_loop, mut producer) =
            create_loop(&config(40, 2.0), scripted(vec![Step::Data(frames(1, 8, 32768 + 100))]));
        producer.push(ControlEvent::Start).unwrap();

        event_loop.drain_events().unwrap();
        assert_eq!(event_loop.phase(), LoopPhase::Streaming);
        assert_eq!(event_loop.cycle().unwrap(), CycleOutcome::Delivered(1));
        assert_eq!(event_loop.sink().writes, vec![vec![200]]);
    }

    #[test]
    fn test_extremes_saturate_at_maximum_gain() {
        let mut event_loop = streaming_loop(
            3,
            10.0,
            vec![Step::Data(frames(1, 3, 0)), Step::Data(frames(1, 3, 65535))],
        );
        event_loop.cycle().unwrap();
        event_loop.cycle().unwrap();
        assert_eq!(event_loop.sink().writes, vec![vec![-32768], vec![32767]]);
    }

    #[test]
    fn test_partial_trailing_frame_is_dropped() {
        let mut raw = frames(2, 0, 32768 + 1);
        raw.extend_from_slice(&[0xaa; 10]);
        let mut event_loop = streaming_loop(0, 1.0, vec![Step::Data(raw)]);

        assert_eq!(event_loop.cycle().unwrap(), CycleOutcome::Delivered(2));
        assert_eq!(event_loop.sink().writes, vec![vec![1, 1]]);
    }

    #[test]
    fn test_start_is_idempotent() {
        let (mut event_loop, mut producer) = create_loop(&config(0, 1.0), FakeSource::default());
        producer.push(ControlEvent::Start).unwrap();
        producer.push(ControlEvent::Start).unwrap();

        event_loop.drain_events().unwrap();
        assert_eq!(event_loop.source().starts, 1);
        assert_eq!(event_loop.hwif().sent, vec![HwifRequest::StartStreaming]);
    }

    #[test]
    fn test_stop_while_idle_does_nothing() {
        let (mut event_loop, mut producer) = create_loop(&config(0, 1.0), FakeSource::default());
        producer.push(ControlEvent::Stop).unwrap();

        event_loop.drain_events().unwrap();
        assert_eq!(event_loop.source().stops, 0);
        assert!(event_loop.hwif().sent.is_empty());
    }

    #[test]
    fn test_stop_then_restart() {
        let (mut event_loop, mut producer) = create_loop(&config(0, 1.0), FakeSource::default());
        for event in [ControlEvent::Start, ControlEvent::Stop, ControlEvent::Stop, ControlEvent::Start] {
            producer.push(event).unwrap();
        }

        event_loop.drain_events().unwrap();
        assert_eq!(event_loop.source().starts, 2);
        assert_eq!(event_loop.source().stops, 1);
        assert_eq!(
            event_loop.hwif().sent,
            vec![
                HwifRequest::StartStreaming,
                HwifRequest::StopStreaming,
                HwifRequest::StartStreaming,
            ]
        );
    }

    #[test]
    fn test_group_change_notifies_exactly_once() {
        let (mut event_loop, mut producer) = create_loop(&config(0, 1.0), FakeSource::default());
        for channel in [5, 40, 41, 63, 2000, 64, 0] {
            producer.push(ControlEvent::SetChannel(channel)).unwrap();
        }

        event_loop.drain_events().unwrap();
        assert_eq!(
            event_loop.hwif().sent,
            vec![
                HwifRequest::SetGroup(1),
                HwifRequest::SetGroup(2),
                HwifRequest::SetGroup(0),
            ]
        );
        assert_eq!(event_loop.state().selection().global(), 0);
    }

    #[test]
    fn test_channel_change_applies_to_next_batch() {
        let mut raw = Vec::new();
        for channel in 0..demux::GROUP_SIZE {
            raw.extend_from_slice(&(32768 + channel as u16).to_le_bytes());
        }
        let mut event_loop =
            streaming_loop(1, 1.0, vec![Step::Data(raw.clone()), Step::Data(raw)]);

        event_loop.cycle().unwrap();
        event_loop.on_channel_changed(33);
        event_loop.cycle().unwrap();
        assert_eq!(event_loop.sink().writes, vec![vec![1], vec![1]]);

        event_loop.on_channel_changed(7);
        assert_eq!(event_loop.state().selection().offset(), 7);
    }

    #[test]
    fn test_gain_change_applies_to_next_batch() {
        let mut event_loop = streaming_loop(
            0,
            1.0,
            vec![
                Step::Data(frames(1, 0, 32768 + 100)),
                Step::Data(frames(1, 0, 32768 + 100)),
            ],
        );
        event_loop.cycle().unwrap();
        event_loop.on_gain_changed(3.0);
        event_loop.on_gain_changed(f64::NAN);
        event_loop.cycle().unwrap();
        assert_eq!(event_loop.sink().writes, vec![vec![100], vec![300]]);
    }

    #[test]
    fn test_fixed_gain_variant_ignores_gain_changes() {
        let mut config = config(0, 1.0);
        config.gain_control = false;
        let (mut event_loop, _) =
            create_loop(&config, scripted(vec![Step::Data(frames(1, 0, 32768 + 100))]));
        event_loop.on_start_requested().unwrap();

        event_loop.on_gain_changed(5.0);
        event_loop.cycle().unwrap();
        assert_eq!(event_loop.sink().writes, vec![vec![100]]);
    }

    #[test]
    fn test_slow_sample_rate_still_reads_whole_frames() {
        let mut config = config(0, 1.0);
        config.sample_rate = 10;
        let (mut event_loop, _) = create_loop(
            &config,
            scripted(vec![Step::Data(frames(1, 0, 32768 + 9))]),
        );
        event_loop.on_start_requested().unwrap();

        assert_eq!(event_loop.cycle().unwrap(), CycleOutcome::Delivered(1));
        assert_eq!(event_loop.sink().writes, vec![vec![9]]);
    }

    #[test]
    fn test_short_read_writes_nothing() {
        let mut event_loop = streaming_loop(0, 1.0, vec![Step::Data(vec![0; 63])]);

        let outcome = event_loop.cycle().unwrap();
        assert!(matches!(outcome, CycleOutcome::ShortRead(short) if short.bytes == 63));
        assert!(event_loop.sink().writes.is_empty());
        assert_eq!(event_loop.phase(), LoopPhase::Streaming);
    }

    #[test]
    fn test_read_error_is_retried_next_cycle() {
        let mut event_loop = streaming_loop(
            0,
            1.0,
            vec![Step::ReadFailure, Step::Data(frames(1, 0, 32768))],
        );

        assert_eq!(event_loop.cycle().unwrap(), CycleOutcome::ReadError);
        assert_eq!(event_loop.phase(), LoopPhase::Streaming);
        assert_eq!(event_loop.cycle().unwrap(), CycleOutcome::Delivered(1));
    }

    #[test]
    fn test_hangup_ends_session_but_not_program() {
        let mut event_loop = streaming_loop(0, 1.0, vec![Step::HangUp]);

        assert_eq!(event_loop.cycle().unwrap(), CycleOutcome::SessionEnded);
        assert_eq!(event_loop.phase(), LoopPhase::Idle);
        assert_eq!(event_loop.source().stops, 1);
        assert_eq!(
            event_loop.hwif().sent.last(),
            Some(&HwifRequest::StopStreaming)
        );

        event_loop.on_start_requested().unwrap();
        assert_eq!(event_loop.source().starts, 2);
    }

    #[test]
    fn test_stream_error_ends_session() {
        let mut event_loop = streaming_loop(0, 1.0, vec![Step::Error]);

        assert_eq!(event_loop.cycle().unwrap(), CycleOutcome::SessionEnded);
        assert_eq!(event_loop.state().playback(), PlaybackState::Idle);
    }

    #[test]
    fn test_unknown_readiness_is_fatal() {
        let mut event_loop = streaming_loop(0, 1.0, vec![Step::Unknown]);
        assert!(matches!(
            event_loop.cycle(),
            Err(PipelineError::UnknownReadinessEvent(_))
        ));
    }

    #[test]
    fn test_sink_write_failure_is_fatal() {
        let mut event_loop = streaming_loop(0, 1.0, vec![Step::Data(frames(1, 0, 0))]);
        event_loop.sink.fail_write = true;
        assert!(matches!(
            event_loop.cycle(),
            Err(PipelineError::Sink(SinkError::Write(_)))
        ));
    }

    #[test]
    fn test_idle_cycle_does_not_watch_the_source() {
        let (mut event_loop, _) = create_loop(&config(0, 1.0), FakeSource::default());

        assert_eq!(event_loop.cycle().unwrap(), CycleOutcome::Idle);
        assert_eq!(event_loop.source().idle_waits, 1);
        assert_eq!(event_loop.source().waits, 0);
    }

    #[test]
    fn test_run_streams_until_interrupted() {
        let interrupt = Arc::new(AtomicBool::new(false));
        let source = FakeSource {
            exhausted: Some(Arc::clone(&interrupt)),
            ..scripted(vec![
                Step::Data(frames(3, 0, 32768 + 1)),
                Step::Data(frames(2, 0, 32768 - 1)),
            ])
        };
        let (event_loop, mut producer) = create_loop(&config(0, 1.0), source);
        let mut event_loop = event_loop.with_interrupt(interrupt);
        producer.push(ControlEvent::Start).unwrap();

        event_loop.run().unwrap();

        assert_eq!(event_loop.phase(), LoopPhase::Terminated);
        assert_eq!(event_loop.sink().writes, vec![vec![1, 1, 1], vec![-1, -1]]);
        assert_eq!(event_loop.sink().drains, 1);
        assert_eq!(event_loop.sink().closes, 1);
        assert_eq!(event_loop.source().stops, 1);
        assert_eq!(
            event_loop.hwif().sent,
            vec![
                HwifRequest::SetGroup(0),
                HwifRequest::StartStreaming,
                HwifRequest::StopStreaming,
            ]
        );
    }

    #[test]
    fn test_run_reports_initial_group_and_honours_shutdown_event() {
        let (mut event_loop, mut producer) = create_loop(&config(70, 1.0), FakeSource::default());
        producer.push(ControlEvent::Shutdown).unwrap();
        producer.push(ControlEvent::Start).unwrap();

        event_loop.run().unwrap();

        assert_eq!(event_loop.source().starts, 0);
        assert_eq!(event_loop.hwif().sent, vec![HwifRequest::SetGroup(2)]);
        assert_eq!(event_loop.sink().closes, 1);
    }

    #[test]
    fn test_spawn_failure_terminates_and_closes_sink() {
        let source = FakeSource {
            fail_start: true,
            ..FakeSource::default()
        };
        let (mut event_loop, mut producer) = create_loop(&config(0, 1.0), source);
        producer.push(ControlEvent::Start).unwrap();

        let err = event_loop.run().unwrap_err();
        assert!(matches!(err, PipelineError::Source(SourceError::Spawn { .. })));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(event_loop.phase(), LoopPhase::Terminated);
        assert_eq!(event_loop.sink().drains, 0);
        assert_eq!(event_loop.sink().closes, 1);
    }

    #[test]
    fn test_write_failure_stops_source_and_closes_sink() {
        let (mut event_loop, mut producer) =
            create_loop(&config(0, 1.0), scripted(vec![Step::Data(frames(1, 0, 0))]));
        event_loop.sink.fail_write = true;
        producer.push(ControlEvent::Start).unwrap();

        assert!(event_loop.run().is_err());
        assert_eq!(event_loop.source().stops, 1);
        assert_eq!(event_loop.sink().drains, 0);
        assert_eq!(event_loop.sink().closes, 1);
    }

    #[test]
    fn test_drain_failure_is_reported_after_closing() {
        let (mut event_loop, mut producer) = create_loop(&config(0, 1.0), FakeSource::default());
        event_loop.sink.fail_drain = true;
        producer.push(ControlEvent::Shutdown).unwrap();

        assert!(matches!(
            event_loop.run(),
            Err(PipelineError::Sink(SinkError::Drain(_)))
        ));
        assert_eq!(event_loop.sink().closes, 1);
    }
}
