//! The render side of an effect session.
//!
//! Each tick pulls the newest camera frame, runs it through the active
//! filter graph, lets the active mask draw on top using the latest
//! published tracking state, and queues the result on the output stream.
//! The tick never waits on detection: it reads whatever the detection task
//! last wrote to the watch channel.

use crate::assets::AssetCache;
use crate::error::RenderFault;
use crate::filter::{FilterGraph, LookFilter, filter_graph};
use crate::landmarks::LandmarkSet;
use crate::masks::{MaskRegistry, MaskRenderer, MaskSettings, RenderContext, renderer_for};
use crate::pipeline::{Frame, TrackingState};
use crate::stream::OutputSink;
use crate::surface::Surface;
use std::ops::ControlFlow;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tracing::{Level, debug, info, span, trace, warn};
use web_time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Playback {
    Playing,
    Paused,
    Ended,
    /// The source is gone for good.
    Closed,
}

/// Where frames come from. Implementations must be cheap to poll: the
/// compositor and the detection task both ask for the latest frame on every
/// tick.
pub trait VideoSource: Send + Sync {
    fn playback(&self) -> Playback;

    fn latest_frame(&self) -> Option<Frame>;

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.latest_frame().map(|f| f.dimensions())
    }
}

/// Everything the user can change while a session runs. Read once per tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectSettings {
    pub filter: Option<LookFilter>,
    pub beauty_smooth: bool,
    pub beauty_brighten: bool,
    /// Mask id as selected; may be an alias.
    pub mask: Option<String>,
    /// Replaces the catalog defaults of the active mask.
    pub mask_settings: Option<MaskSettings>,
}

impl EffectSettings {
    pub fn graph(&self) -> String {
        filter_graph(self.filter, self.beauty_smooth, self.beauty_brighten)
    }
}

pub type SharedSettings = Arc<RwLock<EffectSettings>>;

pub struct Compositor {
    surface: Surface,
    source: Arc<dyn VideoSource>,
    settings: SharedSettings,
    tracking: watch::Receiver<TrackingState>,
    assets: Arc<AssetCache>,
    sink: OutputSink,
    graph: (String, FilterGraph),
    epoch: Instant,
    faults: u64,
}

impl Compositor {
    pub fn new(
        source: Arc<dyn VideoSource>,
        settings: SharedSettings,
        tracking: watch::Receiver<TrackingState>,
        assets: Arc<AssetCache>,
        sink: OutputSink,
    ) -> Compositor {
        Compositor {
            surface: Surface::new(0, 0),
            source,
            settings,
            tracking,
            assets,
            sink,
            graph: ("none".to_string(), FilterGraph::default()),
            epoch: Instant::now(),
            faults: 0,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Renderer faults caught so far.
    pub fn faults(&self) -> u64 {
        self.faults
    }

    /// Render and publish one frame. Breaks once the source is closed or
    /// nobody is listening to the output anymore.
    pub fn tick(&mut self) -> ControlFlow<()> {
        match self.source.playback() {
            Playback::Playing => {}
            Playback::Paused | Playback::Ended => return ControlFlow::Continue(()),
            Playback::Closed => {
                info!("Video source closed, stopping compositor");
                return ControlFlow::Break(());
            }
        }
        let Some(frame) = self.source.latest_frame() else {
            return ControlFlow::Continue(());
        };

        let span = span!(Level::DEBUG, "composite_frame");
        let _guard = span.enter();
        let start = Instant::now();

        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return ControlFlow::Continue(());
        }
        if self.surface.dimensions() != (width, height) {
            debug!("Resizing surface to {width}x{height}");
            self.surface.resize(width, height);
        }

        let settings = match self.settings.read() {
            Ok(s) => s.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        self.surface.draw_frame(&frame);
        self.refresh_graph(&settings);
        self.graph.1.apply(self.surface.image_mut());

        if let Some(id) = settings.mask.as_deref() {
            self.draw_mask(id, settings.mask_settings.as_ref(), width, height);
        }

        trace!("Composited frame in {:?}", start.elapsed());
        if self.sink.publish(self.surface.snapshot()) {
            ControlFlow::Continue(())
        } else {
            info!("Output stream dropped, stopping compositor");
            ControlFlow::Break(())
        }
    }

    /// Reparse the filter graph only when its string changes.
    fn refresh_graph(&mut self, settings: &EffectSettings) {
        let wanted = settings.graph();
        if self.graph.0 == wanted {
            return;
        }
        let graph = wanted.parse::<FilterGraph>().unwrap_or_else(|e| {
            warn!("Ignoring filter graph `{wanted}`: {e}");
            FilterGraph::default()
        });
        debug!("Filter graph is now `{graph}`");
        self.graph = (wanted, graph);
    }

    fn draw_mask(&mut self, id: &str, overrides: Option<&MaskSettings>, width: u32, height: u32) {
        // unknown ids draw nothing
        let Some(descriptor) = MaskRegistry::lookup(id) else {
            return;
        };
        let landmarks = match &self.tracking.borrow().landmarks {
            Some(lm) => lm.clone(),
            None => return,
        };
        let settings = overrides.copied().unwrap_or(descriptor.settings);
        self.render_guarded(renderer_for(descriptor.kind), &landmarks, &settings, width, height);
    }

    /// Run a renderer with panics contained. A faulting renderer loses its
    /// draw for this frame and the surface state is reset.
    fn render_guarded(
        &mut self,
        renderer: &dyn MaskRenderer,
        landmarks: &LandmarkSet,
        settings: &MaskSettings,
        width: u32,
        height: u32,
    ) {
        let time = self.epoch.elapsed().as_secs_f64();
        let surface = &mut self.surface;
        let assets = self.assets.as_ref();
        let result = catch_unwind(AssertUnwindSafe(|| {
            surface.save();
            let mut ctx = RenderContext {
                surface: &mut *surface,
                assets,
                time,
            };
            renderer.render(&mut ctx, landmarks, width, height, settings);
            surface.restore();
        }));

        if let Err(panic) = result {
            self.surface.reset_state();
            self.faults += 1;
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            let fault = RenderFault {
                renderer: renderer.kind().as_str(),
                reason,
            };
            warn!("{fault}, skipping mask for this frame");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::masks::RendererKind;
    use crate::pipeline::TrackingStatus;
    use crate::shapes::Rect;
    use crate::stream::{LiveSource, OutputStream, output_channel};
    use crate::surface::rgb;
    use image::RgbaImage;

    pub fn gray_frame(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, rgb(120, 120, 120))
    }

    struct Fixture {
        source: LiveSource,
        settings: SharedSettings,
        tracking: watch::Sender<TrackingState>,
        stream: OutputStream,
        compositor: Compositor,
    }

    fn fixture() -> Fixture {
        let source = LiveSource::new();
        source.push(gray_frame(80, 60));
        let settings = SharedSettings::default();
        let (tracking, rx) = watch::channel(TrackingState::default());
        let (sink, stream) = output_channel(Vec::new(), 30, 4);
        let compositor = Compositor::new(
            Arc::new(source.clone()),
            settings.clone(),
            rx,
            Arc::new(AssetCache::new("/nonexistent")),
            sink,
        );
        Fixture {
            source,
            settings,
            tracking,
            stream,
            compositor,
        }
    }

    fn tracked(rect: Rect) -> TrackingState {
        TrackingState {
            status: TrackingStatus::Tracking,
            tracked: None,
            landmarks: Some(Arc::new(LandmarkSet::from_box(&rect))),
        }
    }

    #[test]
    fn test_passthrough() {
        let mut f = fixture();
        assert!(f.compositor.tick().is_continue());
        let frame = f.stream.try_recv().unwrap();
        assert_eq!(*frame.image, gray_frame(80, 60));
        assert_eq!(f.compositor.surface().dimensions(), (80, 60));
    }

    #[test]
    fn test_paused_and_closed() {
        let mut f = fixture();
        f.source.set_playback(Playback::Paused);
        assert!(f.compositor.tick().is_continue());
        assert!(f.stream.try_recv().is_none());

        f.source.close();
        assert!(f.compositor.tick().is_break());
    }

    #[test]
    fn test_resizes_with_source() {
        let mut f = fixture();
        f.compositor.tick();
        f.source.push(gray_frame(32, 24));
        f.compositor.tick();
        assert_eq!(f.compositor.surface().dimensions(), (32, 24));
    }

    #[test]
    fn test_filter_applied() {
        let mut f = fixture();
        f.settings.write().unwrap().filter = Some(LookFilter::Sepia);
        f.compositor.tick();
        let px = *f.stream.try_recv().unwrap().image.get_pixel(10, 10);
        assert!(px[0] > px[2], "{px:?}");
    }

    #[test]
    fn test_mask_draws_on_tracked_face() {
        let mut f = fixture();
        f.tracking.send_replace(tracked(Rect::new(20., 10., 60., 80.)));
        f.settings.write().unwrap().mask = Some("neon_wireframe".into());
        f.compositor.tick();
        let img = f.stream.try_recv().unwrap().image;
        assert_ne!(*img, gray_frame(80, 60));
    }

    #[test]
    fn test_unknown_mask_draws_nothing() {
        let mut f = fixture();
        f.tracking.send_replace(tracked(Rect::new(20., 10., 60., 80.)));
        f.settings.write().unwrap().mask = Some("batman".into());
        assert!(f.compositor.tick().is_continue());
        assert_eq!(*f.stream.try_recv().unwrap().image, gray_frame(80, 60));
    }

    #[test]
    fn test_no_landmarks_draws_nothing() {
        let mut f = fixture();
        f.settings.write().unwrap().mask = Some("pixel_face".into());
        f.compositor.tick();
        assert_eq!(*f.stream.try_recv().unwrap().image, gray_frame(80, 60));
    }

    #[test]
    fn test_stops_without_listeners() {
        let mut f = fixture();
        drop(f.stream);
        assert!(f.compositor.tick().is_break());
    }

    #[test]
    fn test_graph_cached() {
        let mut f = fixture();
        f.settings.write().unwrap().beauty_brighten = true;
        f.compositor.tick();
        let cached = f.compositor.graph.clone();
        f.compositor.tick();
        assert_eq!(f.compositor.graph, cached);
        assert_eq!(cached.0, "brightness(1.15) saturate(1.05)");
    }

    struct Faulty;

    impl MaskRenderer for Faulty {
        fn kind(&self) -> RendererKind {
            RendererKind::NeonWireframe
        }

        fn render(
            &self,
            ctx: &mut RenderContext<'_>,
            _landmarks: &LandmarkSet,
            _width: u32,
            _height: u32,
            _settings: &MaskSettings,
        ) {
            ctx.surface.save();
            ctx.surface.set_alpha(0.1);
            panic!("bad geometry");
        }
    }

    #[test]
    fn test_renderer_panic_contained() {
        let mut f = fixture();
        f.compositor.tick();
        let lm = LandmarkSet::from_box(&Rect::new(20., 10., 60., 80.));
        let settings = MaskSettings::Neon(crate::masks::NeonSettings::DEFAULT);
        f.compositor.render_guarded(&Faulty, &lm, &settings, 80, 60);

        assert_eq!(f.compositor.faults(), 1);
        assert_eq!(f.compositor.surface().alpha(), 1.);

        // the next frame still goes out
        f.stream.try_recv().unwrap();
        assert!(f.compositor.tick().is_continue());
        assert!(f.stream.try_recv().is_some());
    }
}
