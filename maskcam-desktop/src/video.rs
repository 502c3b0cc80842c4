use anyhow::{Result, anyhow};
use image::{EncodableLayout, RgbaImage};
use maskcam_img::stream::LiveSource;
use maskcam_img::{Playback, VideoSource};
use nokhwa::{
    Camera, nokhwa_initialize,
    pixel_format::RgbAFormat,
    query,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use tracing::{Level, debug, error, info, span};

/// Open a camera on its own thread and push decoded frames into `source`
/// until the camera fails or the source is closed. Returns the capture
/// resolution once the stream is open.
pub fn spawn_camera(index: Option<u32>, fps: u32, source: LiveSource) -> Result<(u32, u32)> {
    let (ready_tx, ready_rx) = flume::bounded::<Result<(u32, u32)>>(1);

    thread::Builder::new()
        .name("camera".into())
        .spawn(move || {
            let mut camera = match open_camera(index, fps) {
                Ok(camera) => camera,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let resolution = camera.resolution();
            let _ = ready_tx.send(Ok((resolution.width(), resolution.height())));

            loop {
                let span = span!(Level::DEBUG, "capture_frame");
                let _guard = span.enter();

                let frame = match camera.frame() {
                    Ok(frame) => frame,
                    Err(e) => {
                        error!("Failed to pull frame from webcam: {e:?}");
                        break;
                    }
                };
                let img: RgbaImage = match frame.decode_image::<RgbAFormat>() {
                    Ok(img) => img,
                    Err(e) => {
                        error!("Failed to decode webcam frame: {e:?}");
                        continue;
                    }
                };
                if source.playback() == Playback::Closed {
                    break;
                }
                source.push(img);
            }

            source.close();
            if let Err(e) = camera.stop_stream() {
                error!("Failed to stop camera: {e:?}");
            }
        })?;

    ready_rx
        .recv()
        .map_err(|_| anyhow!("Camera thread exited before opening a stream"))?
}

fn open_camera(index: Option<u32>, fps: u32) -> Result<Camera> {
    nokhwa_initialize(|granted| {
        debug!("User said {}", granted);
    });

    let cameras = query(ApiBackend::Auto)?;
    cameras
        .iter()
        .for_each(|cam| debug!("Found camera: {:?}", cam));

    let index = match index {
        Some(i) => CameraIndex::Index(i),
        None => cameras
            .last()
            .map(|cam| cam.index().clone())
            .ok_or_else(|| anyhow!("No camera found"))?,
    };
    info!("Opening camera {index:?}");

    let mut camera = Camera::new(
        index,
        RequestedFormat::new::<RgbAFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
    )?;
    camera.set_frame_rate(fps)?;
    camera.open_stream()?;
    Ok(camera)
}

/// Where composited frames go.
#[derive(Debug, Clone)]
pub enum Destination {
    /// ffplay window.
    Preview,
    /// v4l2 loopback device name under /dev.
    Device(String),
    /// Encoded video file.
    File(PathBuf),
}

/// An ffplay/ffmpeg child fed raw RGBA frames on stdin. The child is killed
/// on drop.
pub struct OutputVideoStream {
    output_proc: std::process::Child,
}

impl Drop for OutputVideoStream {
    fn drop(&mut self) {
        if let Err(e) = self.output_proc.kill() {
            error!("Failed to stop output process {e:?}");
        }
    }
}

impl OutputVideoStream {
    pub fn new(width: u32, height: u32, fps: u32, dest: &Destination) -> Result<Self> {
        let size = format!("{width}x{height}");
        let rate = fps.to_string();
        let raw_input = [
            "-f", "rawvideo", "-pix_fmt", "rgba", "-s", &size, "-r", &rate, "-i", "-",
        ];

        let mut command = match dest {
            Destination::Device(d) => {
                let mut command = Command::new("ffmpeg");
                command.args(raw_input).args([
                    "-map",
                    "0:v",
                    "-preset",
                    "fast",
                    "-vf",
                    "format=yuv420p",
                    "-f",
                    "v4l2",
                    &format!("/dev/{d}"),
                ]);
                command
            }
            Destination::File(path) => {
                let mut command = Command::new("ffmpeg");
                command
                    .args(["-y"])
                    .args(raw_input)
                    .args(["-c:v", "libx264", "-preset", "fast", "-pix_fmt", "yuv420p"])
                    .arg(path);
                command
            }
            Destination::Preview => {
                let mut command = Command::new("ffplay");
                command.args([
                    "-f",
                    "rawvideo",
                    "-pixel_format",
                    "rgba",
                    "-video_size",
                    &size,
                    "-fflags",
                    "nobuffer",
                    "-flags",
                    "low_delay",
                    "-",
                ]);
                command
            }
        };
        let output_proc = command
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()?;

        Ok(Self { output_proc })
    }

    pub fn write_frame(&mut self, img: &RgbaImage) -> Result<()> {
        if let Some(stdin) = self.output_proc.stdin.as_mut() {
            stdin.write_all(img.as_bytes())?;
        }

        Ok(())
    }
}
