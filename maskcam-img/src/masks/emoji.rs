use super::catalog::{EmojiPosition, EmojiSettings};
use super::{MaskRenderer, MaskSettings, RenderContext, RendererKind};
use crate::landmarks::{
    self, BROW_CENTER, LEFT_EYE_BOTTOM, LEFT_EYE_TOP, LOWER_LIP, LandmarkSet, MOUTH_LEFT,
    MOUTH_RIGHT, NOSE_TIP, RIGHT_EYE_BOTTOM, RIGHT_EYE_TOP, UPPER_LIP,
};
use crate::shapes::Point;
use crate::surface::{Color, Paint, Surface, rgb, rgba, stop};
use kurbo::{Arc, Vec2};
use std::f64::consts::PI;

const FACE: Color = rgb(255, 204, 77);
const FACE_EDGE: Color = rgb(230, 160, 40);
const FEATURE: Color = rgb(90, 55, 20);
const BROW_TOP: usize = 70;
const BROW_INNER: usize = 107;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expression {
    Neutral,
    Happy,
    Surprise,
    Sad,
    Angry,
    Kiss,
    Wink,
}

/// Read the expression from mouth shape, eye openness and brow height.
/// Works in normalized units; anything the landmarks can't show is
/// neutral.
pub fn classify_expression(lm: &LandmarkSet) -> Expression {
    let (Some(ml), Some(mr), Some(top), Some(bottom)) = (
        lm.get(MOUTH_LEFT),
        lm.get(MOUTH_RIGHT),
        lm.get(UPPER_LIP),
        lm.get(LOWER_LIP),
    ) else {
        return Expression::Neutral;
    };

    let mouth_width = (mr.x - ml.x).abs();
    let mouth_height = (bottom.y - top.y).abs();
    let mouth_ratio = if mouth_width > 0. {
        mouth_height / mouth_width
    } else {
        0.
    };
    // negative when the corners sit above the lip center
    let curve = (ml.y + mr.y) / 2. - (top.y + bottom.y) / 2.;

    let openness = |a: usize, b: usize| match (lm.get(a), lm.get(b)) {
        (Some(a), Some(b)) => (a.y - b.y).abs(),
        _ => 0.,
    };
    let left_open = openness(RIGHT_EYE_TOP, RIGHT_EYE_BOTTOM);
    let right_open = openness(LEFT_EYE_TOP, LEFT_EYE_BOTTOM);

    if left_open > 0. && right_open > 0. {
        let ratio = left_open / right_open;
        if !(0.3..=3.).contains(&ratio) {
            return Expression::Wink;
        }
    }

    if mouth_ratio < 0.3 && mouth_width < 0.03 {
        return Expression::Kiss;
    }

    if let (Some(b1), Some(b2), Some(bridge)) =
        (lm.get(BROW_TOP), lm.get(BROW_INNER), lm.get(BROW_CENTER))
    {
        let brow_height = (b1.y + b2.y) / 2. - bridge.y;
        if brow_height < -0.02 && mouth_ratio > 0.8 {
            return Expression::Surprise;
        }
    }

    if curve < -0.01 && mouth_width > 0.04 {
        return Expression::Happy;
    }
    if curve > 0.01 {
        return Expression::Sad;
    }
    if mouth_width < 0.03 && left_open < 0.015 && right_open < 0.015 {
        return Expression::Angry;
    }

    Expression::Neutral
}

/// Procedural emoji face floating over the head, following the wearer's
/// expression.
pub struct EmojiTracker;

impl MaskRenderer for EmojiTracker {
    fn kind(&self) -> RendererKind {
        RendererKind::EmojiTracker
    }

    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    ) {
        let s = settings.emoji();
        let size = s.size.fraction() * width as f32;
        let center = placement(landmarks, &s, width, height, size);
        let expression = classify_expression(landmarks);

        let surface = &mut *ctx.surface;
        surface.save();
        if s.background {
            surface.set_alpha(s.opacity * 0.3);
            surface.fill_circle(center, size * 0.6, rgb(255, 255, 255));
        }
        surface.set_alpha(s.opacity);
        draw_emoji(surface, center, size / 2., expression);
        surface.restore();
    }
}

fn placement(lm: &LandmarkSet, s: &EmojiSettings, width: u32, height: u32, size: f32) -> Point {
    let (w, h) = (width as f32, height as f32);
    let found = match s.position {
        EmojiPosition::Forehead => lm.px(BROW_CENTER, w, h).map(|p| p.offset(0., -size * 0.8)),
        EmojiPosition::AboveEyes => lm
            .px(landmarks::RIGHT_EYE_OUTER, w, h)
            .zip(lm.px(landmarks::LEFT_EYE_INNER, w, h))
            .map(|(a, b)| Point::new((a.x + b.x) / 2., a.y.min(b.y) - size * 0.6)),
        EmojiPosition::Nose => lm.px(NOSE_TIP, w, h).map(|p| p.offset(0., -size * 0.3)),
    };

    found.unwrap_or(Point::new(w / 2., size))
}

fn arc(center: Point, r: f32, start: f64, sweep: f64) -> Arc {
    Arc {
        center: center.into(),
        radii: Vec2::new(r as f64, r as f64),
        start_angle: start,
        sweep_angle: sweep,
        x_rotation: 0.,
    }
}

fn draw_emoji(surface: &mut Surface, c: Point, r: f32, expression: Expression) {
    // drop shadow
    surface.fill_circle(c.offset(r * 0.06, r * 0.06), r, rgba(0, 0, 0, 128));
    surface.fill_circle(
        c,
        r,
        Paint::radial(
            c.offset(-r * 0.3, -r * 0.3),
            0.,
            r as f64 * 1.4,
            &[stop(0., rgb(255, 230, 120)), stop(1., FACE)],
        ),
    );
    surface.stroke_circle(c, r, FACE_EDGE, (r * 0.05).max(1.));

    let line = (r * 0.08).max(1.);
    let eye_y = c.y - r * 0.25;
    let le = Point::new(c.x - r * 0.35, eye_y);
    let re = Point::new(c.x + r * 0.35, eye_y);
    let mouth = Point::new(c.x, c.y + r * 0.35);

    match expression {
        Expression::Neutral => {
            surface.fill_ellipse(le, r * 0.1, r * 0.15, 0., FEATURE);
            surface.fill_ellipse(re, r * 0.1, r * 0.15, 0., FEATURE);
            surface.line(mouth.offset(-r * 0.3, 0.), mouth.offset(r * 0.3, 0.), FEATURE, line);
        }
        Expression::Happy => {
            // smiling eyes are upward arcs
            surface.stroke(&arc(le, r * 0.13, PI, PI), FEATURE, line as f64);
            surface.stroke(&arc(re, r * 0.13, PI, PI), FEATURE, line as f64);
            surface.fill(&arc(c.offset(0., r * 0.1), r * 0.5, 0., PI), FEATURE);
            surface.fill_ellipse(mouth.offset(0., r * 0.18), r * 0.2, r * 0.08, 0., rgb(230, 90, 90));
        }
        Expression::Surprise => {
            surface.fill_circle(le, r * 0.14, FEATURE);
            surface.fill_circle(re, r * 0.14, FEATURE);
            surface.fill_ellipse(mouth.offset(0., r * 0.05), r * 0.16, r * 0.22, 0., FEATURE);
        }
        Expression::Sad => {
            surface.fill_ellipse(le, r * 0.1, r * 0.13, 0., FEATURE);
            surface.fill_ellipse(re, r * 0.1, r * 0.13, 0., FEATURE);
            surface.stroke(&arc(mouth.offset(0., r * 0.2), r * 0.3, PI * 1.2, PI * 0.6), FEATURE, line as f64);
            // tear
            let t = le.offset(-r * 0.05, r * 0.3);
            surface.fill_ellipse(t, r * 0.07, r * 0.12, 0., rgb(90, 170, 255));
        }
        Expression::Angry => {
            surface.fill_circle(c, r, rgba(255, 60, 30, 90));
            surface.fill_ellipse(le, r * 0.09, r * 0.1, 0., FEATURE);
            surface.fill_ellipse(re, r * 0.09, r * 0.1, 0., FEATURE);
            surface.line(le.offset(-r * 0.18, -r * 0.25), le.offset(r * 0.15, -r * 0.1), FEATURE, line);
            surface.line(re.offset(r * 0.18, -r * 0.25), re.offset(-r * 0.15, -r * 0.1), FEATURE, line);
            surface.stroke(&arc(mouth.offset(0., r * 0.15), r * 0.22, PI * 1.25, PI * 0.5), FEATURE, line as f64);
        }
        Expression::Kiss => {
            surface.fill_ellipse(le, r * 0.1, r * 0.15, 0., FEATURE);
            surface.stroke(&arc(re, r * 0.13, PI, PI), FEATURE, line as f64);
            surface.stroke(&arc(mouth.offset(0., -r * 0.05), r * 0.08, -PI / 2., PI), FEATURE, line as f64);
            surface.stroke(&arc(mouth.offset(0., r * 0.11), r * 0.08, -PI / 2., PI), FEATURE, line as f64);
            heart(surface, Point::new(c.x + r * 0.75, c.y + r * 0.55), r * 0.22, rgb(240, 60, 90));
        }
        Expression::Wink => {
            surface.fill_ellipse(le, r * 0.1, r * 0.15, 0., FEATURE);
            surface.line(re.offset(-r * 0.13, 0.), re.offset(r * 0.13, 0.), FEATURE, line);
            surface.stroke(&arc(c.offset(0., r * 0.05), r * 0.45, PI * 0.2, PI * 0.6), FEATURE, line as f64);
        }
    }
}

fn heart(surface: &mut Surface, c: Point, size: f32, color: Color) {
    let lobe = size * 0.5;
    surface.fill_circle(c.offset(-lobe * 0.5, 0.), lobe * 0.55, color);
    surface.fill_circle(c.offset(lobe * 0.5, 0.), lobe * 0.55, color);
    surface.fill_polygon(
        &[
            c.offset(-size * 0.52, lobe * 0.15),
            c.offset(size * 0.52, lobe * 0.15),
            c.offset(0., size * 0.7),
        ],
        color,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Landmark;

    fn face(mouth_w: f32, mouth_h: f32, corner_dy: f32, left_eye: f32, right_eye: f32) -> LandmarkSet {
        let mut lm = LandmarkSet::empty();
        let mouth_y = 0.7;
        lm.set(MOUTH_LEFT, Landmark::new(0.5 - mouth_w / 2., mouth_y + corner_dy));
        lm.set(MOUTH_RIGHT, Landmark::new(0.5 + mouth_w / 2., mouth_y + corner_dy));
        lm.set(UPPER_LIP, Landmark::new(0.5, mouth_y - mouth_h / 2.));
        lm.set(LOWER_LIP, Landmark::new(0.5, mouth_y + mouth_h / 2.));
        lm.set(RIGHT_EYE_TOP, Landmark::new(0.4, 0.4 - left_eye / 2.));
        lm.set(RIGHT_EYE_BOTTOM, Landmark::new(0.4, 0.4 + left_eye / 2.));
        lm.set(LEFT_EYE_TOP, Landmark::new(0.6, 0.4 - right_eye / 2.));
        lm.set(LEFT_EYE_BOTTOM, Landmark::new(0.6, 0.4 + right_eye / 2.));
        lm.set(BROW_TOP, Landmark::new(0.4, 0.35));
        lm.set(BROW_INNER, Landmark::new(0.45, 0.35));
        lm.set(BROW_CENTER, Landmark::new(0.5, 0.35));
        lm
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify_expression(&face(0.1, 0.02, 0., 0.03, 0.03)), Expression::Neutral);
        assert_eq!(classify_expression(&face(0.1, 0.02, -0.03, 0.03, 0.03)), Expression::Happy);
        assert_eq!(classify_expression(&face(0.1, 0.02, 0.03, 0.03, 0.03)), Expression::Sad);
        assert_eq!(classify_expression(&face(0.1, 0.02, 0., 0.03, 0.005)), Expression::Wink);
        assert_eq!(classify_expression(&face(0.02, 0.004, 0., 0.03, 0.03)), Expression::Kiss);
        assert_eq!(classify_expression(&face(0.025, 0.02, 0., 0.01, 0.01)), Expression::Angry);

        let mut surprised = face(0.06, 0.06, 0., 0.03, 0.03);
        surprised.set(BROW_TOP, Landmark::new(0.4, 0.3));
        surprised.set(BROW_INNER, Landmark::new(0.45, 0.3));
        assert_eq!(classify_expression(&surprised), Expression::Surprise);
    }

    #[test]
    fn test_classify_sparse() {
        assert_eq!(classify_expression(&LandmarkSet::empty()), Expression::Neutral);
    }

    #[test]
    fn test_placement_fallback() {
        let s = EmojiSettings::DEFAULT;
        let p = placement(&LandmarkSet::empty(), &s, 200, 100, 32.);
        assert_eq!(p, Point::new(100., 32.));

        let mut lm = LandmarkSet::empty();
        lm.set(NOSE_TIP, Landmark::new(0.5, 0.5));
        let nose = EmojiSettings {
            position: EmojiPosition::Nose,
            ..s
        };
        let p = placement(&lm, &nose, 200, 100, 20.);
        assert!((p.y - 44.).abs() < 1e-4);
    }
}
