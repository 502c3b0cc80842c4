use super::stabilizer::{DEFAULT_BOX, Stabilizer};
use super::{Detection, TrackedBox, TrackingStatus};
use crate::landmarks::LandmarkSet;
use std::sync::Arc;

pub const DEFAULT_MISS_THRESHOLD: u32 = 5;

/// What renderers see: the stable box, landmarks mapped onto it, and the
/// tracking status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingState {
    pub status: TrackingStatus,
    pub tracked: Option<TrackedBox>,
    pub landmarks: Option<Arc<LandmarkSet>>,
}

/// Turns a stream of detection results into published tracking state.
#[derive(Debug, Clone)]
pub struct Tracker {
    stabilizer: Stabilizer,
    miss_threshold: u32,
    state: TrackingState,
}

impl Default for Tracker {
    fn default() -> Self {
        Tracker::new(Stabilizer::default(), DEFAULT_MISS_THRESHOLD)
    }
}

impl Tracker {
    pub fn new(stabilizer: Stabilizer, miss_threshold: u32) -> Tracker {
        Tracker {
            stabilizer,
            miss_threshold: miss_threshold.max(1),
            state: TrackingState::default(),
        }
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn set_loading(&mut self) -> &TrackingState {
        self.state.status = TrackingStatus::Loading;
        &self.state
    }

    pub fn on_detection(&mut self, det: Detection) -> &TrackingState {
        let tracked = self.stabilizer.hit(det.bounds);
        let landmarks = det.landmarks.reproject(&det.bounds, &tracked.rect);

        self.state = TrackingState {
            status: TrackingStatus::Tracking,
            tracked: Some(tracked),
            landmarks: Some(Arc::new(landmarks)),
        };
        &self.state
    }

    /// The last box and landmarks stay published; the status only changes
    /// once misses reach the threshold.
    pub fn on_miss(&mut self) -> &TrackingState {
        let tracked = self.stabilizer.miss();
        if self.state.landmarks.is_none() {
            self.state.landmarks = Some(Arc::new(LandmarkSet::from_box(&tracked.rect)));
        }
        self.state.tracked = Some(tracked);
        if tracked.misses >= self.miss_threshold {
            self.state.status = TrackingStatus::NoFace;
        }
        &self.state
    }

    /// No backend is usable: publish the fixed centered box.
    pub fn on_fallback(&mut self) -> &TrackingState {
        self.stabilizer.reset();
        self.state = TrackingState {
            status: TrackingStatus::Fallback,
            tracked: Some(TrackedBox {
                rect: DEFAULT_BOX,
                misses: 0,
            }),
            landmarks: Some(Arc::new(LandmarkSet::from_box(&DEFAULT_BOX))),
        };
        &self.state
    }

    pub fn reset(&mut self) {
        self.stabilizer.reset();
        self.state = TrackingState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::CHIN;
    use crate::shapes::Rect;

    #[test]
    fn test_hit_then_misses() {
        let mut t = Tracker::default();
        t.set_loading();

        let raw = Rect::new(30., 20., 40., 50.);
        let state = t.on_detection(Detection::from_box(raw, 1.)).clone();
        assert_eq!(state.status, TrackingStatus::Tracking);
        assert_eq!(state.tracked.unwrap().rect, raw);

        for i in 1..DEFAULT_MISS_THRESHOLD {
            let s = t.on_miss();
            assert_eq!(s.status, TrackingStatus::Tracking, "miss {i}");
            assert_eq!(s.tracked.unwrap().rect, raw);
        }

        let s = t.on_miss();
        assert_eq!(s.status, TrackingStatus::NoFace);
        assert_eq!(s.tracked.unwrap().rect, raw);
        assert_eq!(s.landmarks, state.landmarks);

        let s = t.on_detection(Detection::from_box(raw, 1.));
        assert_eq!(s.status, TrackingStatus::Tracking);
        assert_eq!(s.tracked.unwrap().misses, 0);
    }

    #[test]
    fn test_misses_while_loading_seed_default_box() {
        let mut t = Tracker::default();
        t.set_loading();
        let s = t.on_miss();
        assert_eq!(s.status, TrackingStatus::Loading);
        assert_eq!(s.tracked.unwrap().rect, DEFAULT_BOX);
        assert!(s.landmarks.is_some());
    }

    #[test]
    fn test_landmarks_follow_stable_box() {
        let mut t = Tracker::default();
        t.on_detection(Detection::from_box(Rect::new(0., 0., 50., 50.), 1.));
        let s = t.on_detection(Detection::from_box(Rect::new(50., 50., 50., 50.), 1.));

        let stable = s.tracked.unwrap().rect;
        assert!((stable.x - 7.5).abs() < 1e-4);
        let chin = s.landmarks.as_ref().unwrap().get(CHIN).unwrap();
        assert!((chin.y * 100. - stable.bottom()).abs() < 1e-3);
    }

    #[test]
    fn test_fallback_and_reset() {
        let mut t = Tracker::default();
        let s = t.on_fallback();
        assert_eq!(s.status, TrackingStatus::Fallback);
        assert_eq!(s.tracked.unwrap().rect, DEFAULT_BOX);

        t.reset();
        assert_eq!(t.state(), &TrackingState::default());
    }
}
