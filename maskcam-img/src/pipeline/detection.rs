use super::model::{InputRange, ModelSlot, image_to_tensor, run_flat};
use super::{Detection, DetectionBackend, Frame, sigmoid_stable};
use crate::error::DetectionError;
use crate::landmarks::{
    LEFT_EYE, LIPS_OUTER, Landmark, LandmarkSet, LOWER_LIP, NOSE_TIP, RIGHT_EYE, UPPER_LIP,
};
use crate::shapes::{Point, Rect};
use anchors::{NUM_ANCHORS, gen_anchors};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, span, trace, warn};

mod anchors;

const WIDTH: u32 = 128;
const HEIGHT: u32 = 128;
const REGRESSOR_LEN: usize = 16;
const MIN_SCORE: f32 = 0.5;
const MAX_OVERLAP_PCT: f32 = 30.;

/// The fast backend: BlazeFace short range. Reports a box plus six
/// keypoints; the rest of the face is synthesized from the box.
pub struct FaceDetector {
    model: ModelSlot,
    anchors: Arc<Vec<Point>>,
}

/// A raw candidate in normalized [0, 1] frame coordinates.
#[derive(Debug, Clone)]
struct Candidate {
    bounds: Rect,
    // right eye, left eye, nose tip, mouth, right ear, left ear
    keypoints: [Point; 6],
    score: f32,
}

impl FaceDetector {
    /*
    Input: 128x128 RGB in [-1, 1]
    Output:
    - classificators: 896 logits
    - regressors: 896 x 16; center offset, size, then six keypoints, all
      in input pixels relative to the anchor for that row
     */
    pub fn new(path: impl Into<PathBuf>) -> FaceDetector {
        FaceDetector {
            model: ModelSlot::new(path),
            anchors: Arc::new(gen_anchors()),
        }
    }

    async fn run(&self, frame: Frame) -> Result<Option<Detection>, DetectionError> {
        let model = self
            .model
            .get()
            .ok_or(DetectionError::NotReady("face detector"))?;
        let anchors = self.anchors.clone();

        tokio::task::spawn_blocking(move || {
            let span = span!(Level::DEBUG, "face_detector");
            let _guard = span.enter();

            let input = image_to_tensor(&frame, WIDTH, HEIGHT, InputRange::NegOneToOne);
            let outputs = {
                let model = model
                    .lock()
                    .map_err(|_| anyhow::anyhow!("face detector lock poisoned"))?;
                run_flat(&model, input)?
            };

            let faces = extract_results(&outputs, &anchors)?;
            trace!("Detected {} faces", faces.len());

            Ok(faces.into_iter().next().map(to_detection))
        })
        .await
        .map_err(anyhow::Error::from)?
    }
}

impl DetectionBackend for FaceDetector {
    fn name(&self) -> &'static str {
        "blazeface"
    }

    fn init(&self) -> BoxFuture<'_, bool> {
        async move {
            match self.model.load().await {
                Ok(_) => true,
                Err(e) => {
                    warn!("Face detector unavailable: {e}");
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
                    warn!("Face detection failed: {e}");
                    None
                }
            }
        }
        .boxed()
    }
}

/// Decode raw outputs into candidates, best first.
fn extract_results(
    outputs: &[(usize, Vec<f32>)],
    anchors: &[Point],
) -> Result<Vec<Candidate>, DetectionError> {
    let regressors = outputs
        .iter()
        .find(|(last, _)| *last == REGRESSOR_LEN)
        .map(|(_, v)| v)
        .ok_or_else(|| DetectionError::MalformedOutput("missing regressors".into()))?;
    let scores = outputs
        .iter()
        .find(|(last, _)| *last == 1)
        .map(|(_, v)| v)
        .ok_or_else(|| DetectionError::MalformedOutput("missing classificators".into()))?;

    if regressors.len() != NUM_ANCHORS * REGRESSOR_LEN || scores.len() != NUM_ANCHORS {
        return Err(DetectionError::MalformedOutput(format!(
            "expected {NUM_ANCHORS} rows, got {} regressors and {} scores",
            regressors.len() / REGRESSOR_LEN,
            scores.len()
        )));
    }

    let mut results: Vec<Candidate> = Vec::new();
    for (row_idx, res) in regressors.chunks_exact(REGRESSOR_LEN).enumerate() {
        let score = sigmoid_stable(scores[row_idx].clamp(-100., 100.));
        if score <= MIN_SCORE {
            continue;
        }

        let anchor = anchors[row_idx];
        let at = |dx: f32, dy: f32| {
            Point::new(dx / WIDTH as f32 + anchor.x, dy / HEIGHT as f32 + anchor.y)
        };
        let bounds = Rect::from_center(
            at(res[0], res[1]),
            res[2] / WIDTH as f32,
            res[3] / HEIGHT as f32,
        );
        if bounds.is_degenerate() {
            continue;
        }

        match results
            .iter()
            .position(|d| d.bounds.overlap_pct(&bounds) > MAX_OVERLAP_PCT)
        {
            Some(i) if results[i].score > score => continue,
            Some(i) => {
                results.swap_remove(i);
            }
            None => {}
        }

        let keypoints = std::array::from_fn(|k| at(res[4 + k * 2], res[5 + k * 2]));
        results.push(Candidate {
            bounds,
            keypoints,
            score,
        });
    }

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(results)
}

fn to_detection(face: Candidate) -> Detection {
    let bounds = Rect::new(
        face.bounds.x * 100.,
        face.bounds.y * 100.,
        face.bounds.w * 100.,
        face.bounds.h * 100.,
    );
    let mut landmarks = LandmarkSet::from_box(&bounds);

    let [r_eye, l_eye, nose, mouth, ..] = face.keypoints;
    move_feature(&mut landmarks, &RIGHT_EYE, r_eye);
    move_feature(&mut landmarks, &LEFT_EYE, l_eye);
    move_feature(&mut landmarks, &LIPS_OUTER, mouth);
    if let (Some(upper), Some(lower)) = (landmarks.get(UPPER_LIP), landmarks.get(LOWER_LIP)) {
        let gap = (lower.y - upper.y) / 2.;
        landmarks.set(UPPER_LIP, Landmark::new(mouth.x, mouth.y - gap));
        landmarks.set(LOWER_LIP, Landmark::new(mouth.x, mouth.y + gap));
    }
    landmarks.set(NOSE_TIP, Landmark::new(nose.x, nose.y));

    Detection {
        bounds,
        landmarks,
        confidence: face.score,
    }
}

/// Translate a synthesized contour so its centroid sits on a keypoint.
fn move_feature(lm: &mut LandmarkSet, idxs: &[usize], to: Point) {
    let pts: Vec<Landmark> = idxs.iter().filter_map(|i| lm.get(*i)).collect();
    if pts.is_empty() {
        return;
    }
    let n = pts.len() as f32;
    let dx = to.x - pts.iter().map(|p| p.x).sum::<f32>() / n;
    let dy = to.y - pts.iter().map(|p| p.y).sum::<f32>() / n;

    for idx in idxs {
        if let Some(p) = lm.get(*idx) {
            lm.set(*idx, Landmark::new(p.x + dx, p.y + dy));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::eye_centers;

    fn outputs_with(rows: &[(usize, [f32; REGRESSOR_LEN], f32)]) -> Vec<(usize, Vec<f32>)> {
        let mut reg = vec![0.; NUM_ANCHORS * REGRESSOR_LEN];
        let mut cls = vec![-10.; NUM_ANCHORS];
        for (row, r, logit) in rows {
            reg[row * REGRESSOR_LEN..(row + 1) * REGRESSOR_LEN].copy_from_slice(r);
            cls[*row] = *logit;
        }
        vec![(REGRESSOR_LEN, reg), (1, cls)]
    }

    fn face_row(dx: f32, size: f32) -> [f32; REGRESSOR_LEN] {
        let mut r = [0.; REGRESSOR_LEN];
        r[0] = dx;
        r[2] = size;
        r[3] = size;
        r[4] = -10.;
        r[5] = -8.;
        r[6] = 10.;
        r[7] = -8.;
        r[11] = 12.;
        r
    }

    #[test]
    fn test_no_faces() {
        let anchors = gen_anchors();
        let faces = extract_results(&outputs_with(&[]), &anchors).unwrap();
        assert!(faces.is_empty());
    }

    #[test]
    fn test_decodes_relative_to_anchor() {
        let anchors = gen_anchors();
        // anchor 512 centers at (1/16, 1/16)
        let faces = extract_results(&outputs_with(&[(512, face_row(0., 64.), 5.)]), &anchors)
            .unwrap();
        assert_eq!(faces.len(), 1);
        let c = faces[0].bounds.center();
        assert!((c.x - 0.0625).abs() < 1e-5);
        assert!((faces[0].bounds.w - 0.5).abs() < 1e-5);
        assert!(faces[0].score > 0.99);
    }

    #[test]
    fn test_overlapping_candidates_keep_best() {
        let anchors = gen_anchors();
        let outputs = outputs_with(&[
            (700, face_row(0., 48.), 2.),
            (701, face_row(1., 48.), 4.),
            (0, face_row(0., 8.), 1.),
        ]);
        let faces = extract_results(&outputs, &anchors).unwrap();
        assert_eq!(faces.len(), 2);
        assert!(faces[0].score > faces[1].score);
        assert!((faces[0].score - sigmoid_stable(4.)).abs() < 1e-6);
    }

    #[test]
    fn test_malformed_outputs() {
        let anchors = gen_anchors();
        let err = extract_results(&[(REGRESSOR_LEN, vec![0.; 16])], &anchors).unwrap_err();
        assert!(matches!(err, DetectionError::MalformedOutput(_)));

        let err = extract_results(&[(REGRESSOR_LEN, vec![0.; 16]), (1, vec![0.])], &anchors)
            .unwrap_err();
        assert!(matches!(err, DetectionError::MalformedOutput(_)));
    }

    #[test]
    fn test_detection_places_keypoints() {
        let anchors = gen_anchors();
        let faces = extract_results(&outputs_with(&[(700, face_row(0., 48.), 3.)]), &anchors)
            .unwrap();
        let face = faces[0].clone();
        let det = to_detection(face.clone());

        assert!((det.bounds.w - face.bounds.w * 100.).abs() < 1e-3);
        let nose = det.landmarks.get(NOSE_TIP).unwrap();
        assert!((nose.x - face.keypoints[2].x).abs() < 1e-6);

        let (right, left) = eye_centers(&det.landmarks, 1000, 1000).unwrap();
        assert!((right.x / 1000. - face.keypoints[0].x).abs() < 1e-3);
        assert!((left.x / 1000. - face.keypoints[1].x).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_missing_model_is_unavailable() {
        let detector = FaceDetector::new("/nonexistent/blazeface.onnx");
        assert!(!detector.init().await);
        let frame = Arc::new(image::RgbaImage::new(8, 8));
        assert!(detector.detect(frame).await.is_none());
    }
}
