#![warn(unused_extern_crates)]
use anyhow::Result;
use clap::{Args, Parser};
use maskcam_img::masks::catalog;
use maskcam_img::pipeline::{FaceDetector, FaceLandmarker};
use maskcam_img::stream::LiveSource;
use maskcam_img::{
    BackendChain, DetectionBackend, EffectConfig, EffectSession, LookFilter, MediaStream,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info, span, trace, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use video::{Destination, OutputVideoStream, spawn_camera};

mod video;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CmdArgs {
    /// Camera index. Uses the last camera found if unset
    #[arg(long)]
    camera: Option<u32>,

    /// Target frame rate
    #[arg(long, default_value = "30")]
    fps: u32,

    /// Delay (ms) between face detection runs
    #[arg(long, default_value = "200")]
    detection_interval_ms: u64,

    /// Mask to apply on start, e.g. neon_wireframe or cat_morph
    #[arg(short, long)]
    mask: Option<String>,

    /// Color filter: normal, sepia, bw, neon, vintage or blur
    #[arg(short, long)]
    filter: Option<LookFilter>,

    /// Soften skin
    #[arg(long)]
    smooth: bool,

    /// Brighten the picture
    #[arg(long)]
    brighten: bool,

    /// Base directory mask overlay images are resolved against
    #[arg(long, default_value = "")]
    assets: String,

    /// Face detection model (BlazeFace short range)
    #[arg(long, value_name = "FILE", default_value = "models/face_detection_short_range.onnx")]
    detector_model: PathBuf,

    /// Face mesh model, used when the detector is unavailable
    #[arg(long, value_name = "FILE", default_value = "models/face_landmark.onnx")]
    landmark_model: PathBuf,

    /// Print available masks and exit
    #[arg(long)]
    list_masks: bool,

    #[command(flatten)]
    out: Out,
}

#[derive(Args, Debug)]
#[group(multiple = false)]
struct Out {
    /// Loopback device to write to. Displays in window if unset
    #[arg(group = "dest", short, long)]
    device: Option<String>,

    /// Video file to record to instead of displaying
    #[arg(group = "dest", short, long)]
    output: Option<PathBuf>,
}

impl Out {
    fn destination(&self) -> Destination {
        match (&self.device, &self.output) {
            (Some(d), _) => Destination::Device(d.clone()),
            (_, Some(p)) => Destination::File(p.clone()),
            _ => Destination::Preview,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env();
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(filter)
        .init();

    let args = CmdArgs::parse();

    if args.list_masks {
        for m in catalog() {
            println!("{:<16} {:<16} {:?}/{:?}", m.id, m.name, m.category, m.tier);
        }
        return Ok(());
    }

    let source = LiveSource::new();
    let (width, height) = spawn_camera(args.camera, args.fps, source.clone())?;
    info!("Capturing {width}x{height} at {} fps", args.fps);
    let mut output_stream = OutputVideoStream::new(width, height, args.fps, &args.out.destination())?;

    let chain = BackendChain::new(vec![
        Arc::new(FaceDetector::new(args.detector_model.clone())) as Arc<dyn DetectionBackend>,
        Arc::new(FaceLandmarker::new(args.landmark_model.clone())),
    ]);
    let config = EffectConfig {
        fps: args.fps,
        detection_interval: Duration::from_millis(args.detection_interval_ms),
        asset_base: args.assets.clone(),
        ..EffectConfig::default()
    };
    let assets = Arc::new(config.asset_cache());

    // the camera carries no audio
    let input = MediaStream::new(Vec::new());
    let mut session = EffectSession::start(
        Some(&input),
        Arc::new(source.clone()),
        chain,
        assets,
        config,
    )?;
    session.set_filter(args.filter);
    session.set_beauty_smooth(args.smooth);
    session.set_beauty_brighten(args.brighten);
    if let Some(mask) = &args.mask {
        if !session.enable_filter(mask) {
            warn!("Unknown mask {mask}, see --list-masks");
        }
    }

    let frames = session.output_stream();
    while let Some(frame) = frames.recv().await {
        let span = span!(Level::DEBUG, "write_frame");
        let _guard = span.enter();
        match output_stream.write_frame(&frame.image) {
            Ok(_) => trace!("Rendered frame {}", frame.sequence),
            Err(e) => {
                error!("Failed to render frame: {e:?}");
                break;
            }
        }
    }

    source.close();
    session.shutdown();

    Ok(())
}
