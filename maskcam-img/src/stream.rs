//! Input and output stream handles.
//!
//! A [`MediaStream`] stands for the participant's camera stream: its audio
//! tracks are carried over untouched onto the composited [`OutputStream`].
//! Video frames flow out over a small bounded channel; when the consumer
//! falls behind, the oldest queued frame makes room for the newest.

use crate::compositor::{Playback, VideoSource};
use crate::pipeline::Frame;
use flume::{Receiver, Sender, TrySendError};
use image::RgbaImage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::trace;
use web_time::Instant;

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    pub id: String,
    pub label: String,
}

impl AudioTrack {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> AudioTrack {
        AudioTrack {
            id: id.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaStream {
    id: u64,
    audio_tracks: Vec<AudioTrack>,
}

impl MediaStream {
    pub fn new(audio_tracks: Vec<AudioTrack>) -> MediaStream {
        MediaStream {
            id: next_id(),
            audio_tracks,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn audio_tracks(&self) -> &[AudioTrack] {
        &self.audio_tracks
    }
}

/// One composited frame.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub image: Arc<RgbaImage>,
    /// Time since the stream was created.
    pub timestamp: Duration,
    pub sequence: u64,
}

/// Receiving end of a composited stream. Clones share the same frames and
/// the same stream id.
#[derive(Debug, Clone)]
pub struct OutputStream {
    id: u64,
    audio_tracks: Vec<AudioTrack>,
    fps: u32,
    frames: Receiver<VideoFrame>,
}

impl OutputStream {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn audio_tracks(&self) -> &[AudioTrack] {
        &self.audio_tracks
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn try_recv(&self) -> Option<VideoFrame> {
        self.frames.try_recv().ok()
    }

    /// `None` once the compositor has shut down and the queue is drained.
    pub async fn recv(&self) -> Option<VideoFrame> {
        self.frames.recv_async().await.ok()
    }

    pub fn frames(&self) -> &Receiver<VideoFrame> {
        &self.frames
    }
}

/// Sending end held by the compositor.
pub struct OutputSink {
    tx: Sender<VideoFrame>,
    // kept to evict the oldest frame when the queue is full
    rx: Receiver<VideoFrame>,
    started: Instant,
    sequence: u64,
    dropped: u64,
}

impl OutputSink {
    /// Queue a frame without waiting, evicting the oldest queued frame if
    /// the queue is full. `false` once every stream handle is gone.
    pub fn publish(&mut self, image: RgbaImage) -> bool {
        if self.tx.receiver_count() <= 1 {
            return false;
        }
        let frame = VideoFrame {
            image: Arc::new(image),
            timestamp: self.started.elapsed(),
            sequence: self.sequence,
        };
        self.sequence += 1;

        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                if let Ok(stale) = self.rx.try_recv() {
                    self.dropped += 1;
                    trace!(
                        "Output queue full, dropped frame {} ({} total)",
                        stale.sequence, self.dropped
                    );
                }
                if self.tx.try_send(frame).is_err() {
                    self.dropped += 1;
                }
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Create a connected sink and stream. The stream carries `audio_tracks`
/// unchanged.
pub fn output_channel(
    audio_tracks: Vec<AudioTrack>,
    fps: u32,
    capacity: usize,
) -> (OutputSink, OutputStream) {
    let (tx, rx) = flume::bounded(capacity.max(1));
    let sink = OutputSink {
        tx,
        rx: rx.clone(),
        started: Instant::now(),
        sequence: 0,
        dropped: 0,
    };
    let stream = OutputStream {
        id: next_id(),
        audio_tracks,
        fps,
        frames: rx,
    };
    (sink, stream)
}

#[derive(Debug)]
struct LiveState {
    frame: Option<Frame>,
    playback: Playback,
}

/// A [`VideoSource`] fed by pushing frames, e.g. from a capture thread.
#[derive(Debug, Clone)]
pub struct LiveSource {
    state: Arc<RwLock<LiveState>>,
}

impl Default for LiveSource {
    fn default() -> Self {
        LiveSource::new()
    }
}

impl LiveSource {
    pub fn new() -> LiveSource {
        LiveSource {
            state: Arc::new(RwLock::new(LiveState {
                frame: None,
                playback: Playback::Playing,
            })),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, LiveState> {
        match self.state.write() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, LiveState> {
        match self.state.read() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn push(&self, frame: RgbaImage) {
        self.write().frame = Some(Arc::new(frame));
    }

    pub fn set_playback(&self, playback: Playback) {
        self.write().playback = playback;
    }

    pub fn close(&self) {
        let mut state = self.write();
        state.playback = Playback::Closed;
        state.frame = None;
    }
}

impl VideoSource for LiveSource {
    fn playback(&self) -> Playback {
        self.read().playback
    }

    fn latest_frame(&self) -> Option<Frame> {
        self.read().frame.clone()
    }
}
