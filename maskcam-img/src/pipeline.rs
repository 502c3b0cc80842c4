use crate::landmarks::LandmarkSet;
use crate::shapes::Rect;
use futures::future::BoxFuture;
use image::RgbaImage;
use std::fmt;
use std::sync::Arc;

mod chain;
mod detection;
mod landmarks;
mod model;
pub mod stabilizer;
mod tracker;

pub use chain::{BackendChain, DEFAULT_PROBE_TIMEOUT};
#[cfg(test)]
pub(crate) use chain::tests::MockBackend;
pub use detection::FaceDetector;
pub use landmarks::FaceLandmarker;
pub use stabilizer::{DEFAULT_BOX, SMOOTHING, Stabilizer};
pub use tracker::{DEFAULT_MISS_THRESHOLD, Tracker, TrackingState};

pub type Frame = Arc<RgbaImage>;

/// One face found in a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Percentage-of-frame units.
    pub bounds: Rect,
    pub landmarks: LandmarkSet,
    pub confidence: f32,
}

impl Detection {
    /// A box-only detection; landmarks are synthesized from the box.
    pub fn from_box(bounds: Rect, confidence: f32) -> Detection {
        Detection {
            bounds,
            landmarks: LandmarkSet::from_box(&bounds),
            confidence,
        }
    }

    pub fn bounds_px(&self, width: u32, height: u32) -> Rect {
        self.bounds.to_px(width as f32, height as f32)
    }
}

/// A face tracking provider. Neither call may fail: backends log their own
/// errors and report `false` / `None`.
pub trait DetectionBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Prepare the backend (load models etc). `true` when usable.
    fn init(&self) -> BoxFuture<'_, bool>;

    fn detect(&self, frame: Frame) -> BoxFuture<'_, Option<Detection>>;
}

/// The stabilized face rectangle renderers draw against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedBox {
    /// Percentage-of-frame units.
    pub rect: Rect,
    pub misses: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrackingStatus {
    #[default]
    Idle,
    Loading,
    Tracking,
    NoFace,
    Fallback,
}

impl TrackingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingStatus::Idle => "idle",
            TrackingStatus::Loading => "loading",
            TrackingStatus::Tracking => "tracking",
            TrackingStatus::NoFace => "no-face",
            TrackingStatus::Fallback => "fallback",
        }
    }
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn sigmoid_stable(x: f32) -> f32 {
    if x >= 0. {
        1. / (1. + (-x).exp())
    } else {
        x.exp() / (1. + x.exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_stable() {
        assert_eq!(sigmoid_stable(0.), 0.5);
        assert!(sigmoid_stable(100.) > 0.999);
        assert!(sigmoid_stable(-100.) < 0.001);
        assert!(!sigmoid_stable(-1000.).is_nan());
    }

    #[test]
    fn test_status_names() {
        assert_eq!(TrackingStatus::NoFace.to_string(), "no-face");
        assert_eq!(TrackingStatus::default(), TrackingStatus::Idle);
    }
}
