use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoachError;
use crate::events::CoachEvent;
use crate::landmark::LandmarkFrame;
use crate::session::WorkoutSession;

/// One frame as delivered by a pose provider. `landmarks` is `None` when
/// the provider lost the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    pub timestamp_ms: u64,
    #[serde(default)]
    pub landmarks: Option<LandmarkFrame>,
}

impl FrameSample {
    pub fn tracked(timestamp_ms: u64, frame: LandmarkFrame) -> Self {
        Self {
            timestamp_ms,
            landmarks: Some(frame),
        }
    }

    pub fn lost(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            landmarks: None,
        }
    }
}

/// What one runner step produced
#[derive(Clone, Debug, PartialEq)]
pub enum RunnerEvent {
    Frame(FrameSample),
    /// Nothing arrived within one tick
    Idle,
    /// The source hung up; no more frames will come
    Finished,
}

/// Source of landmark frames (camera pipeline, file replay, etc.)
pub trait FrameSource: Send + 'static {
    /// Block for up to `timeout` waiting for a frame.
    fn recv_timeout(&self, timeout: Duration) -> Result<FrameSample, RecvTimeoutError>;
}

/// Frames pushed from another thread over a channel
pub struct ChannelFrameSource {
    rx: Receiver<FrameSample>,
}

impl ChannelFrameSource {
    pub fn new(rx: Receiver<FrameSample>) -> Self {
        Self { rx }
    }
}

impl FrameSource for ChannelFrameSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<FrameSample, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Replays recorded samples from a background thread, then hangs up
pub fn spawn_replay(samples: Vec<FrameSample>) -> ChannelFrameSource {
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        for sample in samples {
            if tx.send(sample).is_err() {
                break;
            }
        }
    });

    ChannelFrameSource::new(rx)
}

/// Reads newline-delimited JSON frame samples. Blank lines are skipped.
pub fn read_jsonl(path: &Path) -> Result<Vec<FrameSample>, CoachError> {
    let reader = BufReader::new(File::open(path)?);
    let mut samples = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let sample = serde_json::from_str(&line).map_err(|source| CoachError::FrameDecode {
            line: idx + 1,
            source,
        })?;
        samples.push(sample);
    }

    log::info!("read {} frames from {}", samples.len(), path.display());
    Ok(samples)
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Pulls frames from a source and feeds them to a session one at a time
pub struct Runner<S: FrameSource, T: Ticker> {
    source: S,
    ticker: T,
}

impl<S: FrameSource, T: Ticker> Runner<S, T> {
    pub fn new(source: S, ticker: T) -> Self {
        Self { source, ticker }
    }

    /// Blocks up to one tick interval for the next frame
    pub fn step(&self) -> RunnerEvent {
        match self.source.recv_timeout(self.ticker.interval()) {
            Ok(sample) => RunnerEvent::Frame(sample),
            Err(RecvTimeoutError::Timeout) => RunnerEvent::Idle,
            Err(RecvTimeoutError::Disconnected) => RunnerEvent::Finished,
        }
    }

    /// Runs until the source hangs up. Returns the number of frames processed.
    pub fn drive(&self, session: &mut WorkoutSession) -> usize {
        self.drive_with(session, |_, _| {})
    }

    /// Like [`Runner::drive`], handing every sample and its events to `on_frame`
    pub fn drive_with<F>(&self, session: &mut WorkoutSession, mut on_frame: F) -> usize
    where
        F: FnMut(&FrameSample, &[CoachEvent]),
    {
        let mut frames = 0;
        loop {
            match self.step() {
                RunnerEvent::Frame(sample) => {
                    let events =
                        session.process_frame(sample.landmarks.as_ref(), sample.timestamp_ms);
                    on_frame(&sample, &events);
                    frames += 1;
                }
                RunnerEvent::Idle => log::trace!("no frame within {:?}", self.ticker.interval()),
                RunnerEvent::Finished => break,
            }
        }
        log::debug!("frame source finished after {frames} frames");
        frames
    }
}
