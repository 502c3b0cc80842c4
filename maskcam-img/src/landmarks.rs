use crate::shapes::{Point, Rect};
use std::f32::consts::PI;

/// Number of points in a refined face mesh (468 mesh + 10 iris).
pub const MESH_LEN: usize = 478;

pub const FOREHEAD: usize = 10;
pub const FOREHEAD_CENTER: usize = 151;
pub const BROW_CENTER: usize = 9;
pub const CHIN: usize = 152;
pub const NOSE_TIP: usize = 1;
pub const LEFT_CHEEK: usize = 234;
pub const RIGHT_CHEEK: usize = 454;
pub const LEFT_EAR_TOP: usize = 127;
pub const RIGHT_EAR_TOP: usize = 356;
pub const UPPER_LIP: usize = 13;
pub const LOWER_LIP: usize = 14;
pub const MOUTH_LEFT: usize = 61;
pub const MOUTH_RIGHT: usize = 291;
pub const RIGHT_EYE_OUTER: usize = 33;
pub const RIGHT_EYE_INNER: usize = 133;
pub const LEFT_EYE_OUTER: usize = 263;
pub const LEFT_EYE_INNER: usize = 362;
pub const RIGHT_EYE_TOP: usize = 159;
pub const RIGHT_EYE_BOTTOM: usize = 145;
pub const LEFT_EYE_TOP: usize = 386;
pub const LEFT_EYE_BOTTOM: usize = 374;

pub const FACE_OVAL: [usize; 36] = [
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
];

pub const LEFT_EYE: [usize; 16] = [
    362, 382, 381, 380, 374, 373, 390, 249, 263, 466, 388, 387, 386, 385, 384, 398,
];

pub const RIGHT_EYE: [usize; 16] = [
    33, 7, 163, 144, 145, 153, 154, 155, 133, 173, 157, 158, 159, 160, 161, 246,
];

pub const LIPS_OUTER: [usize; 20] = [
    61, 146, 91, 181, 84, 17, 314, 405, 321, 375, 291, 409, 270, 269, 267, 0, 37, 39, 40, 185,
];

pub const RIGHT_BROW: [usize; 5] = [70, 63, 105, 66, 107];
pub const LEFT_BROW: [usize; 5] = [296, 334, 293, 300, 276];
pub const NOSE_BRIDGE: [usize; 5] = [6, 8, 9, 10, 151];

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Landmark {
        Landmark { x, y, z: 0. }
    }

    pub fn to_px(&self, width: f32, height: f32) -> Point {
        Point::new(self.x * width, self.y * height)
    }
}

/// Face landmarks normalized to [0,1] of the frame, addressed by face
/// mesh index. Light backends only fill in a handful of indices.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Option<Landmark>>,
}

impl Default for LandmarkSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl LandmarkSet {
    pub fn empty() -> LandmarkSet {
        LandmarkSet {
            points: vec![None; MESH_LEN],
        }
    }

    /// Build from a full model output, one landmark per mesh index.
    pub fn dense(points: Vec<Landmark>) -> LandmarkSet {
        LandmarkSet {
            points: points.into_iter().map(Some).collect(),
        }
    }

    pub fn get(&self, idx: usize) -> Option<Landmark> {
        self.points.get(idx).copied().flatten()
    }

    pub fn set(&mut self, idx: usize, lm: Landmark) {
        if idx >= self.points.len() {
            self.points.resize(idx + 1, None);
        }
        self.points[idx] = Some(lm);
    }

    pub fn remove(&mut self, idx: usize) {
        if let Some(slot) = self.points.get_mut(idx) {
            *slot = None;
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }

    pub fn present(&self) -> impl Iterator<Item = (usize, Landmark)> + '_ {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|p| (i, p)))
    }

    pub fn present_count(&self) -> usize {
        self.present().count()
    }

    /// Pixel position of a single landmark.
    pub fn px(&self, idx: usize, width: f32, height: f32) -> Option<Point> {
        self.get(idx).map(|l| l.to_px(width, height))
    }

    /// Pixel positions of the given indices, skipping the missing ones.
    pub fn contour(&self, idxs: &[usize], width: f32, height: f32) -> Vec<Point> {
        idxs.iter()
            .filter_map(|i| self.px(*i, width, height))
            .collect()
    }

    /// Synthesize a sparse face from a bounding box in percentage units.
    /// Used by backends that only report a box so renderers still find the
    /// anchors they need.
    pub fn from_box(bounds: &Rect) -> LandmarkSet {
        let mut set = LandmarkSet::empty();
        let x0 = bounds.x / 100.;
        let y0 = bounds.y / 100.;
        let w = bounds.w / 100.;
        let h = bounds.h / 100.;
        let mut put = |idx: usize, u: f32, v: f32| set.set(idx, Landmark::new(x0 + u * w, y0 + v * h));

        for (i, idx) in FACE_OVAL.iter().enumerate() {
            let theta = -PI / 2. + 2. * PI * i as f32 / FACE_OVAL.len() as f32;
            put(*idx, 0.5 + 0.5 * theta.cos(), 0.5 + 0.5 * theta.sin());
        }
        put(LEFT_CHEEK, 0., 0.5);
        put(RIGHT_CHEEK, 1., 0.5);
        ring(&RIGHT_EYE, (0.325, 0.4), (0.075, 0.03), &mut put);
        ring(&LEFT_EYE, (0.675, 0.4), (0.075, 0.03), &mut put);
        ring(&LIPS_OUTER, (0.5, 0.78), (0.14, 0.05), &mut put);

        for (i, idx) in RIGHT_BROW.iter().enumerate() {
            let t = i as f32 / 4.;
            put(*idx, 0.18 + 0.24 * t, 0.3 - 0.03 * (PI * t).sin());
        }
        for (i, idx) in LEFT_BROW.iter().enumerate() {
            let t = i as f32 / 4.;
            put(*idx, 0.58 + 0.24 * t, 0.3 - 0.03 * (PI * t).sin());
        }

        put(FOREHEAD_CENTER, 0.5, 0.12);
        put(BROW_CENTER, 0.5, 0.3);
        put(8, 0.5, 0.34);
        put(6, 0.5, 0.4);
        put(197, 0.5, 0.46);
        put(195, 0.5, 0.5);
        put(5, 0.5, 0.55);
        put(NOSE_TIP, 0.5, 0.6);
        put(UPPER_LIP, 0.5, 0.76);
        put(LOWER_LIP, 0.5, 0.8);

        set
    }

    /// Map landmarks observed inside `from` onto `to` (both percentage
    /// rects). Lets renderers draw raw mesh detail on the smoothed box.
    pub fn reproject(&self, from: &Rect, to: &Rect) -> LandmarkSet {
        if from.is_degenerate() || from == to {
            return self.clone();
        }

        let sx = to.w / from.w;
        let sy = to.h / from.h;
        let points = self
            .points
            .iter()
            .map(|p| {
                p.map(|l| Landmark {
                    x: to.x / 100. + (l.x - from.x / 100.) * sx,
                    y: to.y / 100. + (l.y - from.y / 100.) * sy,
                    z: l.z,
                })
            })
            .collect();

        LandmarkSet { points }
    }

    /// Bounding box of all present landmarks in percentage units.
    pub fn bounds_pct(&self) -> Option<Rect> {
        let mut iter = self.present();
        let (_, first) = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for (_, l) in iter {
            min_x = min_x.min(l.x);
            min_y = min_y.min(l.y);
            max_x = max_x.max(l.x);
            max_y = max_y.max(l.y);
        }

        Some(Rect::new(
            min_x * 100.,
            min_y * 100.,
            (max_x - min_x) * 100.,
            (max_y - min_y) * 100.,
        ))
    }
}

/// Place a closed contour on an ellipse starting at its leftmost point and
/// running along the lower half first, the way the mesh orders eye and lip
/// contours.
fn ring(idxs: &[usize], center: (f32, f32), radius: (f32, f32), put: &mut impl FnMut(usize, f32, f32)) {
    let n = idxs.len() as f32;
    for (i, idx) in idxs.iter().enumerate() {
        let theta = PI - 2. * PI * i as f32 / n;
        put(
            *idx,
            center.0 + radius.0 * theta.cos(),
            center.1 + radius.1 * theta.sin(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_box_places_anchors_inside_box() {
        let bounds = Rect::new(25., 12., 50., 55.);
        let set = LandmarkSet::from_box(&bounds);

        let forehead = set.get(FOREHEAD).unwrap();
        assert!((forehead.x - 0.5).abs() < 1e-4);
        assert!((forehead.y - 0.12).abs() < 1e-4);

        let chin = set.get(CHIN).unwrap();
        assert!((chin.y - 0.67).abs() < 1e-4);

        let left = set.get(LEFT_CHEEK).unwrap();
        let right = set.get(RIGHT_CHEEK).unwrap();
        assert!(left.x < right.x);
        assert!((left.x - 0.25).abs() < 1e-3);
        assert!((right.x - 0.75).abs() < 1e-3);

        for (_, l) in set.present() {
            assert!(l.x >= 0.25 - 1e-4 && l.x <= 0.75 + 1e-4);
            assert!(l.y >= 0.12 - 1e-4 && l.y <= 0.67 + 1e-4);
        }
    }

    #[test]
    fn test_from_box_eye_order() {
        let set = LandmarkSet::from_box(&Rect::new(0., 0., 100., 100.));
        // outer corner of the right eye sits left of its inner corner
        assert!(set.get(RIGHT_EYE_OUTER).unwrap().x < set.get(RIGHT_EYE_INNER).unwrap().x);
        assert!(set.get(LEFT_EYE_INNER).unwrap().x < set.get(LEFT_EYE_OUTER).unwrap().x);
        // lower lid is below the upper lid
        assert!(set.get(RIGHT_EYE_BOTTOM).unwrap().y > set.get(RIGHT_EYE_TOP).unwrap().y);
        assert!(set.get(LOWER_LIP).unwrap().y > set.get(UPPER_LIP).unwrap().y);
    }

    #[test]
    fn test_reproject() {
        let mut set = LandmarkSet::empty();
        set.set(NOSE_TIP, Landmark::new(0.5, 0.5));
        set.set(FOREHEAD, Landmark::new(0.4, 0.4));

        let from = Rect::new(40., 40., 20., 20.);
        let to = Rect::new(10., 10., 40., 40.);
        let moved = set.reproject(&from, &to);

        let nose = moved.get(NOSE_TIP).unwrap();
        assert!((nose.x - 0.3).abs() < 1e-5);
        assert!((nose.y - 0.3).abs() < 1e-5);
        let top = moved.get(FOREHEAD).unwrap();
        assert!((top.x - 0.1).abs() < 1e-5);
        assert!(moved.get(CHIN).is_none());
    }

    #[test]
    fn test_sparse_access() {
        let mut set = LandmarkSet::empty();
        assert!(set.is_empty());
        assert!(set.get(10_000).is_none());
        set.set(FOREHEAD, Landmark::new(0.1, 0.2));
        assert_eq!(set.present_count(), 1);
        assert_eq!(set.contour(&FACE_OVAL, 100., 100.).len(), 1);
        set.remove(FOREHEAD);
        assert!(set.bounds_pct().is_none());
    }
}
