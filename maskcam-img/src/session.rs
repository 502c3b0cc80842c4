//! An effect session: one camera stream in, one composited stream out.
//!
//! Two tasks run independently. The render task composites at the output
//! frame rate for the whole life of the session. The detection task only
//! runs while a mask is enabled; it is the single writer of the tracking
//! state, which it publishes on a watch channel the renderer reads.

use crate::assets::AssetCache;
use crate::compositor::{Compositor, EffectSettings, Playback, SharedSettings, VideoSource};
use crate::error::SessionError;
use crate::filter::LookFilter;
use crate::masks::{MaskRegistry, MaskSettings};
use crate::pipeline::{
    BackendChain, DEFAULT_MISS_THRESHOLD, DEFAULT_PROBE_TIMEOUT, SMOOTHING, Stabilizer, TrackedBox,
    Tracker, TrackingState, TrackingStatus,
};
use crate::stream::{MediaStream, OutputStream, output_channel};
use crate::task::RepeatingTask;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{Instrument, debug, debug_span, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct EffectConfig {
    pub detection_interval: Duration,
    pub render_interval: Duration,
    /// Output frame rate cap.
    pub fps: u32,
    /// Consecutive misses before the status reads `no-face`.
    pub miss_threshold: u32,
    /// Weight of the previous box when smoothing.
    pub smoothing: f32,
    pub probe_timeout: Duration,
    /// Base path overlay images are resolved against.
    pub asset_base: String,
    pub output_capacity: usize,
}

impl Default for EffectConfig {
    fn default() -> Self {
        EffectConfig {
            detection_interval: Duration::from_millis(200),
            render_interval: Duration::from_millis(33),
            fps: 30,
            miss_threshold: DEFAULT_MISS_THRESHOLD,
            smoothing: SMOOTHING,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            asset_base: String::new(),
            output_capacity: 2,
        }
    }
}

impl EffectConfig {
    pub fn asset_cache(&self) -> AssetCache {
        AssetCache::new(self.asset_base.clone())
    }

    fn frame_period(&self) -> Duration {
        self.render_interval
            .max(Duration::from_secs(1) / self.fps.max(1))
    }
}

struct TrackerSlot {
    tracker: Tracker,
    /// Bumped whenever detection is stopped, so a tick that raced the stop
    /// cannot publish stale state.
    generation: u64,
}

#[derive(Clone)]
struct DetectionLoop {
    chain: Arc<BackendChain>,
    source: Arc<dyn VideoSource>,
    slot: Arc<Mutex<TrackerSlot>>,
    status: Arc<watch::Sender<TrackingState>>,
}

impl DetectionLoop {
    async fn tick(self, generation: u64) -> ControlFlow<()> {
        match self.source.playback() {
            Playback::Playing => {}
            Playback::Paused | Playback::Ended => return ControlFlow::Continue(()),
            Playback::Closed => return ControlFlow::Break(()),
        }
        let Some(frame) = self.source.latest_frame() else {
            return ControlFlow::Continue(());
        };

        if !self.chain.is_initialized() {
            self.publish(generation, |t| t.set_loading())?;
        }
        if !self.chain.init().await {
            self.publish(generation, |t| t.on_fallback())?;
            info!("No detection backend available, tracking the default box");
            return ControlFlow::Break(());
        }

        let detection = self.chain.detect(frame).await;
        self.publish(generation, |t| match detection {
            Some(d) => t.on_detection(d),
            None => t.on_miss(),
        })
    }

    fn publish(
        &self,
        generation: u64,
        update: impl FnOnce(&mut Tracker) -> &TrackingState,
    ) -> ControlFlow<()> {
        let mut slot = lock(&self.slot);
        if slot.generation != generation {
            return ControlFlow::Break(());
        }
        let state = update(&mut slot.tracker).clone();

        let previous = self.status.borrow().status;
        if previous != state.status {
            info!("Tracking status {previous} -> {}", state.status);
        }
        self.status.send_replace(state);
        ControlFlow::Continue(())
    }
}

fn lock(slot: &Mutex<TrackerSlot>) -> MutexGuard<'_, TrackerSlot> {
    match slot.lock() {
        Ok(s) => s,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub struct EffectSession {
    detector: DetectionLoop,
    settings: SharedSettings,
    status_rx: watch::Receiver<TrackingState>,
    output: OutputStream,
    render: RepeatingTask,
    detection: Option<RepeatingTask>,
    detection_interval: Duration,
}

impl EffectSession {
    /// Start compositing `source` into a new output stream that carries the
    /// audio tracks of `input`. Must be called from within a tokio runtime.
    pub fn start(
        input: Option<&MediaStream>,
        source: Arc<dyn VideoSource>,
        chain: BackendChain,
        assets: Arc<AssetCache>,
        config: EffectConfig,
    ) -> Result<EffectSession, SessionError> {
        let input = input.ok_or(SessionError::NoInputStream)?;
        assets.preload(MaskRegistry::overlays());

        let chain = Arc::new(chain.with_probe_timeout(config.probe_timeout));
        let (status, status_rx) = watch::channel(TrackingState::default());
        let (sink, output) = output_channel(
            input.audio_tracks().to_vec(),
            config.fps,
            config.output_capacity,
        );
        let settings = SharedSettings::default();

        let mut compositor = Compositor::new(
            source.clone(),
            settings.clone(),
            status_rx.clone(),
            assets,
            sink,
        );
        let render = RepeatingTask::start("render", config.frame_period(), move || {
            std::future::ready(compositor.tick())
        });

        let tracker = Tracker::new(Stabilizer::new(config.smoothing), config.miss_threshold);
        info!(
            "Started effect session for stream {} ({} audio tracks) at {} fps",
            input.id(),
            input.audio_tracks().len(),
            config.fps
        );

        Ok(EffectSession {
            detector: DetectionLoop {
                chain,
                source,
                slot: Arc::new(Mutex::new(TrackerSlot {
                    tracker,
                    generation: 0,
                })),
                status: Arc::new(status),
            },
            settings,
            status_rx,
            output,
            render,
            detection: None,
            detection_interval: config.detection_interval,
        })
    }

    fn settings_mut(&self) -> RwLockWriteGuard<'_, EffectSettings> {
        match self.settings.write() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn start_detection(&mut self) {
        if self.detection.is_some() {
            return;
        }
        let generation = lock(&self.detector.slot).generation;
        let detector = self.detector.clone();
        self.detection = Some(RepeatingTask::start(
            "detection",
            self.detection_interval,
            move || {
                let detector = detector.clone();
                detector
                    .tick(generation)
                    .instrument(debug_span!("detection_tick"))
            },
        ));
        debug!("Detection started");
    }

    fn stop_detection(&mut self) {
        if let Some(mut task) = self.detection.take() {
            task.stop();
        }
        let mut slot = lock(&self.detector.slot);
        slot.generation += 1;
        slot.tracker.reset();
        self.detector.status.send_replace(TrackingState::default());
        debug!("Detection stopped");
    }

    /// Activate a mask. Unknown ids are refused and change nothing.
    pub fn enable_filter(&mut self, id: &str) -> bool {
        let Some(mask) = MaskRegistry::lookup(id) else {
            warn!("Unknown mask {id}");
            return false;
        };
        {
            let mut settings = self.settings_mut();
            settings.mask = Some(id.to_string());
            settings.mask_settings = None;
        }
        self.start_detection();
        info!("Enabled mask {}", mask.name);
        true
    }

    /// Swap the active mask in place. Tracking and the output stream carry
    /// on untouched; the new mask draws from the next frame.
    pub fn switch_filter(&mut self, id: &str) -> bool {
        if self.current_mask().is_none() {
            return self.enable_filter(id);
        }
        let Some(mask) = MaskRegistry::lookup(id) else {
            warn!("Unknown mask {id}");
            return false;
        };
        {
            let mut settings = self.settings_mut();
            settings.mask = Some(id.to_string());
            settings.mask_settings = None;
        }
        info!("Switched to mask {}", mask.name);
        true
    }

    /// Remove the mask and stop tracking. At most one more masked frame
    /// may still go out.
    pub fn disable_filter(&mut self) {
        {
            let mut settings = self.settings_mut();
            settings.mask = None;
            settings.mask_settings = None;
        }
        self.stop_detection();
        info!("Disabled mask");
    }

    pub fn set_filter(&self, filter: Option<LookFilter>) {
        self.settings_mut().filter = filter;
    }

    pub fn set_beauty_smooth(&self, on: bool) {
        self.settings_mut().beauty_smooth = on;
    }

    pub fn set_beauty_brighten(&self, on: bool) {
        self.settings_mut().beauty_brighten = on;
    }

    /// Override the active mask's settings until the mask changes.
    pub fn set_mask_settings(&self, settings: MaskSettings) {
        self.settings_mut().mask_settings = Some(settings);
    }

    pub fn settings(&self) -> EffectSettings {
        match self.settings.read() {
            Ok(s) => s.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn status(&self) -> TrackingStatus {
        self.status_rx.borrow().status
    }

    pub fn watch_status(&self) -> watch::Receiver<TrackingState> {
        self.status_rx.clone()
    }

    pub fn tracked_box(&self) -> Option<TrackedBox> {
        self.status_rx.borrow().tracked
    }

    pub fn output_stream(&self) -> OutputStream {
        self.output.clone()
    }

    pub fn current_mask(&self) -> Option<String> {
        self.settings().mask
    }

    pub fn is_rendering(&self) -> bool {
        self.render.is_running()
    }

    pub fn shutdown(mut self) {
        self.stop_detection();
        self.render.stop();
        info!("Effect session stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::tests::gray_frame;
    use crate::pipeline::{DEFAULT_BOX, DetectionBackend, MockBackend};
    use crate::shapes::Rect;
    use crate::stream::{AudioTrack, LiveSource};
    use std::sync::atomic::Ordering;

    const FACE: Rect = Rect::new(25., 20., 50., 55.);

    struct Harness {
        source: LiveSource,
        backend: Arc<MockBackend>,
        session: EffectSession,
    }

    fn harness(backend: MockBackend) -> Harness {
        let source = LiveSource::new();
        source.push(gray_frame(400, 400));
        let backend = Arc::new(backend);
        let chain = BackendChain::new(vec![backend.clone() as Arc<dyn DetectionBackend>]);
        let input = MediaStream::new(vec![AudioTrack::new("mic", "Microphone")]);
        let session = EffectSession::start(
            Some(&input),
            Arc::new(source.clone()),
            chain,
            Arc::new(AssetCache::new("/nonexistent")),
            EffectConfig::default(),
        )
        .unwrap();
        Harness {
            source,
            backend,
            session,
        }
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// First frame rendered after the queue is drained.
    async fn fresh_frame(out: &OutputStream) -> Arc<image::RgbaImage> {
        while out.try_recv().is_some() {}
        out.recv().await.unwrap().image
    }

    #[tokio::test(start_paused = true)]
    async fn test_requires_input_stream() {
        let result = EffectSession::start(
            None,
            Arc::new(LiveSource::new()),
            BackendChain::default(),
            Arc::new(AssetCache::new("/nonexistent")),
            EffectConfig::default(),
        );
        assert!(matches!(result, Err(SessionError::NoInputStream)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_output_carries_audio() {
        let h = harness(MockBackend::new("mock", Some(FACE)));
        let out = h.session.output_stream();
        assert_eq!(out.audio_tracks(), [AudioTrack::new("mic", "Microphone")]);
        assert_eq!(out.fps(), 30);

        let frame = out.recv().await.unwrap();
        assert_eq!(frame.image.dimensions(), (400, 400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cold_start_falls_back() {
        let slow = MockBackend {
            delay: Duration::from_secs(5),
            ..MockBackend::new("slow", None)
        };
        let mut h = harness(slow);
        assert_eq!(h.session.status(), TrackingStatus::Idle);

        assert!(h.session.enable_filter("cat_morph"));
        sleep_ms(500).await;
        assert_eq!(h.session.status(), TrackingStatus::Loading);

        sleep_ms(700).await;
        assert_eq!(h.session.status(), TrackingStatus::Fallback);
        assert_eq!(h.session.tracked_box().unwrap().rect, DEFAULT_BOX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_backend_falls_back() {
        let broken = MockBackend {
            ready: false,
            ..MockBackend::new("broken", None)
        };
        let mut h = harness(broken);
        h.session.enable_filter("animal_morph");
        sleep_ms(50).await;
        assert_eq!(h.session.status(), TrackingStatus::Fallback);
        assert_eq!(h.backend.detects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stable_tracking() -> anyhow::Result<()> {
        let mut h = harness(MockBackend::new("mock", Some(FACE)));
        h.session.enable_filter("neon_wireframe");
        sleep_ms(2_050).await;

        assert_eq!(h.session.status(), TrackingStatus::Tracking);
        assert!(h.backend.detects.load(Ordering::SeqCst) >= 10);
        let tracked = h.session.tracked_box().ok_or(anyhow::anyhow!("no box"))?;
        let px = tracked.rect.to_px(400., 400.);
        assert!((px.x - 100.).abs() < 4. && (px.y - 80.).abs() < 4.);
        assert!((px.w - 200.).abs() < 4. && (px.h - 220.).abs() < 4.);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_face_keeps_box() {
        let mut h = harness(MockBackend::new("empty", None));
        h.session.enable_filter("pixel_face");
        sleep_ms(2_050).await;
        assert_eq!(h.session.status(), TrackingStatus::NoFace);
        assert_eq!(h.session.tracked_box().unwrap().rect, DEFAULT_BOX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_switch_keeps_stream() {
        let mut h = harness(MockBackend::new("mock", Some(FACE)));
        let before = h.session.output_stream().id();
        assert!(h.session.enable_filter("he_man"));
        sleep_ms(300).await;
        let out = h.session.output_stream();
        let he_man = fresh_frame(&out).await;
        assert_ne!(*he_man, gray_frame(400, 400));

        assert!(h.session.switch_filter("jem"));
        assert_eq!(h.session.current_mask().as_deref(), Some("jem"));
        assert_eq!(h.session.output_stream().id(), before);
        assert_eq!(h.session.status(), TrackingStatus::Tracking);

        let jem = fresh_frame(&out).await;
        assert_ne!(jem, he_man);
        assert_ne!(*jem, gray_frame(400, 400));

        assert!(!h.session.switch_filter("batman"));
        assert_eq!(h.session.current_mask().as_deref(), Some("jem"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_disable_reenable() {
        let mut h = harness(MockBackend::new("mock", Some(FACE)));
        assert!(!h.session.enable_filter("batman"));
        assert!(h.session.current_mask().is_none());

        let out = h.session.output_stream();
        h.session.enable_filter("cat_morph");
        sleep_ms(50).await;
        assert_eq!(h.session.status(), TrackingStatus::Tracking);
        // one detection in, the box is snapped to it
        let first = fresh_frame(&out).await;
        assert_ne!(*first, gray_frame(400, 400));
        sleep_ms(400).await;

        h.session.disable_filter();
        assert_eq!(h.session.status(), TrackingStatus::Idle);
        assert!(h.session.tracked_box().is_none());
        let detects = h.backend.detects.load(Ordering::SeqCst);
        sleep_ms(1_000).await;
        assert_eq!(h.backend.detects.load(Ordering::SeqCst), detects);
        assert_eq!(*fresh_frame(&out).await, gray_frame(400, 400));

        h.session.enable_filter("cat_morph");
        sleep_ms(50).await;
        assert_eq!(h.session.status(), TrackingStatus::Tracking);
        assert_eq!(h.session.tracked_box().unwrap().misses, 0);
        assert_eq!(fresh_frame(&out).await, first);
        // the chain was probed once for the whole session
        assert_eq!(h.backend.inits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settings_without_restart() {
        let h = harness(MockBackend::new("mock", Some(FACE)));
        let out = h.session.output_stream();
        h.session.set_filter(Some(LookFilter::Bw));
        h.session.set_beauty_smooth(true);
        h.session.set_mask_settings(MaskSettings::Legend(crate::masks::LegendSettings::new(
            0.5, 0.5,
        )));

        let settings = h.session.settings();
        assert_eq!(
            settings.graph(),
            "grayscale(1) blur(0.5px) contrast(1.05)"
        );
        assert_eq!(h.session.output_stream().id(), out.id());
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_closed_ends_session() {
        let h = harness(MockBackend::new("mock", Some(FACE)));
        let out = h.session.output_stream();
        h.source.close();
        sleep_ms(100).await;
        assert!(!h.session.is_rendering());
        while out.try_recv().is_some() {}
        assert!(out.recv().await.is_none());
    }
}
