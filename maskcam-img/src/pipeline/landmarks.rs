use super::model::{InputRange, ModelSlot, image_to_tensor, run_flat};
use super::{Detection, DetectionBackend, Frame, sigmoid_stable};
use crate::error::DetectionError;
use crate::landmarks::{FACE_OVAL, Landmark, LandmarkSet};
use crate::shapes::Rect;
use futures::FutureExt;
use futures::future::BoxFuture;
use image::imageops;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{Level, debug, span, warn};

const HEIGHT: u32 = 192;
const WIDTH: u32 = 192;
const MESH_POINTS: usize = 468;
const MIN_PRESENCE: f32 = 0.5;
// share of the shorter frame side searched before any face is found
const SEARCH_FRACTION: f32 = 0.8;
const ROI_PAD: f32 = 1.5;

/// The heavy backend: full face mesh. Runs on a square region around the
/// last face, or the middle of the frame when there is none.
pub struct FaceLandmarker {
    model: ModelSlot,
    roi: Mutex<Option<Rect>>,
}

impl FaceLandmarker {
    pub fn new(path: impl Into<PathBuf>) -> FaceLandmarker {
        FaceLandmarker {
            model: ModelSlot::new(path),
            roi: Mutex::new(None),
        }
    }

    fn next_roi(&self, width: u32, height: u32) -> Rect {
        let last = self.roi.lock().ok().and_then(|roi| *roi);
        last.map(|r| r.clamp(width as f32, height as f32))
            .filter(|r| !r.is_degenerate())
            .unwrap_or_else(|| search_region(width, height))
    }

    async fn run(&self, frame: Frame) -> Result<Option<Detection>, DetectionError> {
        let model = self
            .model
            .get()
            .ok_or(DetectionError::NotReady("face landmarker"))?;
        let (width, height) = frame.dimensions();
        let roi = self.next_roi(width, height);

        let det = tokio::task::spawn_blocking(move || {
            let span = span!(Level::DEBUG, "face_landmarker");
            let _guard = span.enter();

            debug!("Landmark region: {roi:?}");
            let crop = imageops::crop_imm(
                frame.as_ref(),
                roi.x as u32,
                roi.y as u32,
                (roi.w as u32).max(1),
                (roi.h as u32).max(1),
            )
            .to_image();
            let input = image_to_tensor(&crop, WIDTH, HEIGHT, InputRange::ZeroToOne);

            let model_span = span!(Level::DEBUG, "face_landmarker:model_run");
            let model_guard = model_span.enter();
            let outputs = {
                let model = model
                    .lock()
                    .map_err(|_| anyhow::anyhow!("face landmarker lock poisoned"))?;
                run_flat(&model, input)?
            };
            drop(model_guard);

            extract_results(&outputs, roi, width, height)
        })
        .await
        .map_err(anyhow::Error::from)??;

        if let Ok(mut last) = self.roi.lock() {
            *last = det.as_ref().map(|d| track_region(d, width, height));
        }

        Ok(det)
    }
}

impl DetectionBackend for FaceLandmarker {
    fn name(&self) -> &'static str {
        "face-mesh"
    }

    fn init(&self) -> BoxFuture<'_, bool> {
        async move {
            match self.model.load().await {
                Ok(_) => true,
                Err(e) => {
                    warn!("Face landmarker unavailable: {e}");
                    false
                }
            }
        }
        .boxed()
    }

    fn detect(&self, frame: Frame) -> BoxFuture<'_, Option<Detection>> {
        async move {
            match self.run(frame).await {
                Ok(det) => det,
                Err(e) => {
                    warn!("Face landmarking failed: {e}");
                    None
                }
            }
        }
        .boxed()
    }
}

fn search_region(width: u32, height: u32) -> Rect {
    let side = width.min(height) as f32 * SEARCH_FRACTION;
    Rect::from_center(
        crate::shapes::Point::new(width as f32 / 2., height as f32 / 2.),
        side,
        side,
    )
}

/// Square region around a found face for the next run.
fn track_region(det: &Detection, width: u32, height: u32) -> Rect {
    let px = det.bounds_px(width, height);
    let side = px.w.max(px.h) * ROI_PAD;
    Rect::from_center(px.center(), side, side)
}

/// Map mesh output from model input pixels back onto the frame.
fn extract_results(
    outputs: &[(usize, Vec<f32>)],
    roi: Rect,
    width: u32,
    height: u32,
) -> Result<Option<Detection>, DetectionError> {
    let mesh = outputs
        .iter()
        .map(|(_, v)| v)
        .find(|v| v.len() >= MESH_POINTS * 3 && v.len() % 3 == 0)
        .ok_or_else(|| DetectionError::MalformedOutput("missing mesh output".into()))?;
    let presence = outputs
        .iter()
        .map(|(_, v)| v)
        .find(|v| v.len() == 1)
        .and_then(|v| v.first().copied())
        .map(sigmoid_stable)
        .unwrap_or(1.);

    if presence < MIN_PRESENCE {
        return Ok(None);
    }

    let x_scale = roi.w / WIDTH as f32;
    let y_scale = roi.h / HEIGHT as f32;
    let points = mesh
        .chunks_exact(3)
        .take(MESH_POINTS)
        .map(|p| Landmark {
            x: (roi.x + p[0] * x_scale) / width as f32,
            y: (roi.y + p[1] * y_scale) / height as f32,
            z: p[2] / WIDTH as f32,
        })
        .collect();
    let landmarks = LandmarkSet::dense(points);

    let mut oval = LandmarkSet::empty();
    for idx in FACE_OVAL {
        if let Some(l) = landmarks.get(idx) {
            oval.set(idx, l);
        }
    }
    let Some(bounds) = oval.bounds_pct().filter(|b| !b.is_degenerate()) else {
        return Ok(None);
    };

    Ok(Some(Detection {
        bounds,
        landmarks,
        confidence: presence,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{CHIN, FOREHEAD, LEFT_CHEEK, RIGHT_CHEEK};
    use std::sync::Arc;

    // a mesh with the oval anchors spanning the middle half of the input
    fn mesh_outputs(logit: f32) -> Vec<(usize, Vec<f32>)> {
        let mut mesh = vec![96.; MESH_POINTS * 3];
        let mut put = |idx: usize, x: f32, y: f32| {
            mesh[idx * 3] = x;
            mesh[idx * 3 + 1] = y;
        };
        put(FOREHEAD, 96., 48.);
        put(CHIN, 96., 144.);
        put(LEFT_CHEEK, 48., 96.);
        put(RIGHT_CHEEK, 144., 96.);
        vec![(MESH_POINTS * 3, mesh), (1, vec![logit])]
    }

    #[test]
    fn test_maps_into_frame() {
        let roi = Rect::new(100., 50., 192., 192.);
        let det = extract_results(&mesh_outputs(5.), roi, 400, 400)
            .unwrap()
            .unwrap();

        let chin = det.landmarks.get(CHIN).unwrap();
        assert!((chin.x - 196. / 400.).abs() < 1e-5);
        assert!((chin.y - 194. / 400.).abs() < 1e-5);
        assert!((det.bounds.x - 148. / 4.).abs() < 1e-3);
        assert!((det.bounds.w - 24.).abs() < 1e-3);
        assert_eq!(det.landmarks.present_count(), MESH_POINTS);
    }

    #[test]
    fn test_low_presence_is_no_face() {
        let roi = Rect::new(0., 0., 192., 192.);
        assert!(
            extract_results(&mesh_outputs(-5.), roi, 192, 192)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_missing_mesh_is_malformed() {
        let roi = Rect::new(0., 0., 192., 192.);
        let err = extract_results(&[(1, vec![3.])], roi, 192, 192).unwrap_err();
        assert!(matches!(err, DetectionError::MalformedOutput(_)));
    }

    #[test]
    fn test_regions() {
        let r = search_region(640, 480);
        assert_eq!(r.center().x, 320.);
        assert_eq!(r.w, 384.);

        let det = Detection::from_box(Rect::new(25., 25., 50., 50.), 1.);
        let r = track_region(&det, 400, 200);
        assert_eq!(r.w, 300.);
        assert_eq!(r.h, 300.);
        assert_eq!(r.center().x, 200.);
    }

    #[tokio::test]
    async fn test_missing_model_is_unavailable() {
        let landmarker = FaceLandmarker::new("/nonexistent/face_landmark.onnx");
        assert!(!landmarker.init().await);
        assert!(
            landmarker
                .detect(Arc::new(image::RgbaImage::new(8, 8)))
                .await
                .is_none()
        );
    }
}
