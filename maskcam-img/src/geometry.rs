//! Face metrics derived from a landmark set in pixel space.
//!
//! Every function tolerates sparse input: a missing landmark makes the
//! result `None` (or is substituted from the face box) instead of panicking.

use crate::landmarks::{self, LandmarkSet};
use crate::shapes::{Point, Polygon, Rect};

/// Anchor points of a face. `left`/`right` are image sides, so `left_eye`
/// is the eye nearer x=0 (mesh index 33).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBounds {
    pub width: f32,
    pub height: f32,
    pub center: Point,
    pub forehead: Point,
    pub forehead_center: Point,
    pub chin: Point,
    pub left_cheek: Point,
    pub right_cheek: Point,
    pub nose_tip: Point,
    pub left_eye: Point,
    pub right_eye: Point,
    pub left_eye_inner: Point,
    pub right_eye_inner: Point,
    pub upper_lip: Point,
    pub lower_lip: Point,
}

impl FaceBounds {
    /// Requires forehead, chin and both cheeks. Finer anchors fall back to
    /// typical proportions of the face box when missing.
    pub fn from_landmarks(lm: &LandmarkSet, width: u32, height: u32) -> Option<FaceBounds> {
        let (w, h) = (width as f32, height as f32);
        let forehead = lm.px(landmarks::FOREHEAD, w, h)?;
        let chin = lm.px(landmarks::CHIN, w, h)?;
        let left_cheek = lm.px(landmarks::LEFT_CHEEK, w, h)?;
        let right_cheek = lm.px(landmarks::RIGHT_CHEEK, w, h)?;

        let face_width = (right_cheek.x - left_cheek.x).abs();
        let face_height = (chin.y - forehead.y).abs();
        let center = Point::new(
            (left_cheek.x + right_cheek.x) / 2.,
            (forehead.y + chin.y) / 2.,
        );
        let left = center.x - face_width / 2.;
        let top = forehead.y.min(chin.y);
        let at = |u: f32, v: f32| Point::new(left + u * face_width, top + v * face_height);
        let or = |idx: usize, fallback: Point| lm.px(idx, w, h).unwrap_or(fallback);

        Some(FaceBounds {
            width: face_width,
            height: face_height,
            center,
            forehead,
            forehead_center: or(landmarks::FOREHEAD_CENTER, at(0.5, 0.12)),
            chin,
            left_cheek,
            right_cheek,
            nose_tip: or(landmarks::NOSE_TIP, at(0.5, 0.6)),
            left_eye: or(landmarks::RIGHT_EYE_OUTER, at(0.25, 0.4)),
            right_eye: or(landmarks::LEFT_EYE_OUTER, at(0.75, 0.4)),
            left_eye_inner: or(landmarks::RIGHT_EYE_INNER, at(0.4, 0.4)),
            right_eye_inner: or(landmarks::LEFT_EYE_INNER, at(0.6, 0.4)),
            upper_lip: or(landmarks::UPPER_LIP, at(0.5, 0.76)),
            lower_lip: or(landmarks::LOWER_LIP, at(0.5, 0.8)),
        })
    }

    /// Midpoint between the two outer eye corners.
    pub fn eye_line_center(&self) -> Point {
        self.left_eye.midpoint(&self.right_eye)
    }

    pub fn mouth_center(&self) -> Point {
        self.upper_lip.midpoint(&self.lower_lip)
    }

    pub fn eye_distance(&self) -> f32 {
        self.left_eye.distance(&self.right_eye)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.center, self.width, self.height)
    }
}

/// Distance between the cheeks, the reference size most renderers scale by.
pub fn face_scale(lm: &LandmarkSet, width: u32, height: u32) -> Option<f32> {
    let (w, h) = (width as f32, height as f32);
    let l = lm.px(landmarks::LEFT_CHEEK, w, h)?;
    let r = lm.px(landmarks::RIGHT_CHEEK, w, h)?;
    Some(l.distance(&r))
}

/// Centroid of whichever contour points are present.
pub fn eye_center(lm: &LandmarkSet, eye: &[usize], width: u32, height: u32) -> Option<Point> {
    Polygon::new(lm.contour(eye, width as f32, height as f32)).centroid()
}

/// Roll of the face from the line through both eye centers, in radians.
/// Zero for an upright face.
pub fn face_angle(lm: &LandmarkSet, width: u32, height: u32) -> Option<f32> {
    let le = eye_center(lm, &landmarks::LEFT_EYE, width, height)?;
    let re = eye_center(lm, &landmarks::RIGHT_EYE, width, height)?;
    Some((le.y - re.y).atan2(le.x - re.x))
}

/// Image-left and image-right eye centers.
pub fn eye_centers(lm: &LandmarkSet, width: u32, height: u32) -> Option<(Point, Point)> {
    let re = eye_center(lm, &landmarks::RIGHT_EYE, width, height)?;
    let le = eye_center(lm, &landmarks::LEFT_EYE, width, height)?;
    Some((re, le))
}

pub fn contour(lm: &LandmarkSet, idxs: &[usize], width: u32, height: u32) -> Polygon {
    Polygon::new(lm.contour(idxs, width as f32, height as f32))
}

/// Pixel bounding box of a contour. Needs at least three points to be a
/// usable region.
pub fn contour_bounds(lm: &LandmarkSet, idxs: &[usize], width: u32, height: u32) -> Option<Rect> {
    let poly = contour(lm, idxs, width, height);
    if poly.len() < 3 {
        return None;
    }
    poly.bounds()
}

pub fn point(lm: &LandmarkSet, idx: usize, width: u32, height: u32) -> Option<Point> {
    lm.px(idx, width as f32, height as f32)
}

pub fn distance(lm: &LandmarkSet, a: usize, b: usize, width: u32, height: u32) -> Option<f32> {
    Some(point(lm, a, width, height)?.distance(&point(lm, b, width, height)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Landmark;

    fn face() -> LandmarkSet {
        LandmarkSet::from_box(&Rect::new(25., 25., 50., 50.))
    }

    #[test]
    fn test_face_bounds() {
        let b = FaceBounds::from_landmarks(&face(), 200, 100).unwrap();
        assert!((b.width - 100.).abs() < 0.01);
        assert!((b.height - 50.).abs() < 0.01);
        assert!((b.center.x - 100.).abs() < 0.01);
        assert!((b.center.y - 50.).abs() < 0.01);
        assert!(b.left_eye.x < b.right_eye.x);
        assert!(b.forehead.y < b.nose_tip.y && b.nose_tip.y < b.chin.y);
    }

    #[test]
    fn test_upright_face_has_no_roll() {
        let angle = face_angle(&face(), 640, 480).unwrap();
        assert!(angle.abs() < 1e-4);
    }

    #[test]
    fn test_tilted_face_roll() {
        let mut lm = LandmarkSet::empty();
        for i in landmarks::RIGHT_EYE {
            lm.set(i, Landmark::new(0.3, 0.3));
        }
        for i in landmarks::LEFT_EYE {
            lm.set(i, Landmark::new(0.5, 0.5));
        }
        let angle = face_angle(&lm, 100, 100).unwrap();
        assert!((angle - std::f32::consts::FRAC_PI_4).abs() < 1e-4);
    }

    #[test]
    fn test_face_scale() {
        let scale = face_scale(&face(), 400, 400).unwrap();
        assert!((scale - 200.).abs() < 0.01);
    }

    #[test]
    fn test_every_missing_index_is_tolerated() {
        let full = face();
        let idxs: Vec<usize> = full.present().map(|(i, _)| i).collect();
        for idx in idxs {
            let mut lm = full.clone();
            lm.remove(idx);
            let _ = FaceBounds::from_landmarks(&lm, 640, 480);
            let _ = face_scale(&lm, 640, 480);
            let _ = face_angle(&lm, 640, 480);
            let _ = eye_centers(&lm, 640, 480);
            let _ = contour_bounds(&lm, &landmarks::FACE_OVAL, 640, 480);
        }
    }

    #[test]
    fn test_core_anchor_missing_declines() {
        let mut lm = face();
        lm.remove(landmarks::CHIN);
        assert!(FaceBounds::from_landmarks(&lm, 640, 480).is_none());

        let mut lm = face();
        lm.remove(landmarks::NOSE_TIP);
        let b = FaceBounds::from_landmarks(&lm, 640, 480).unwrap();
        assert!(b.nose_tip.x > 0.);
    }

    #[test]
    fn test_empty_set() {
        let lm = LandmarkSet::empty();
        assert!(FaceBounds::from_landmarks(&lm, 640, 480).is_none());
        assert!(face_angle(&lm, 640, 480).is_none());
        assert!(contour_bounds(&lm, &landmarks::FACE_OVAL, 640, 480).is_none());
    }
}
