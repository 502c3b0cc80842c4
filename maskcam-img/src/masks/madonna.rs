use super::catalog::MADONNA;
use super::common::{diamond, pulse, sparkle};
use super::{MaskRenderer, MaskSettings, RenderContext, RendererKind};
use crate::geometry::{FaceBounds, point};
use crate::landmarks::{LandmarkSet, MOUTH_LEFT, MOUTH_RIGHT};
use crate::shapes::Point;
use crate::surface::{BLACK, Color, Paint, Surface, rgb, rgba, stop};
use kurbo::{Arc, BezPath, RoundedRect, Vec2};
use std::f32::consts::PI;

const GOLD: Color = rgb(255, 215, 0);
const HOT_PINK: Color = rgb(255, 105, 180);
const LIGHT_PINK: Color = rgb(255, 182, 193);
const WHITE: Color = rgb(255, 255, 255);
const CURL_STEPS: usize = 63;

// (x offset, y offset, size)
const CURLS: [(f32, f32, f32); 6] = [
    (-0.3, -0.1, 0.8),
    (-0.1, -0.15, 0.6),
    (0.1, -0.15, 0.7),
    (0.3, -0.1, 0.8),
    (-0.4, 0.05, 0.5),
    (0.4, 0.05, 0.5),
];

// (x, y, size, color, diamond)
const SPARKLES: [(f32, f32, f32, Color, bool); 6] = [
    (0.15, 0.15, 0.02, GOLD, true),
    (0.85, 0.2, 0.015, HOT_PINK, false),
    (0.1, 0.45, 0.018, rgb(0, 255, 255), true),
    (0.9, 0.5, 0.016, GOLD, false),
    (0.2, 0.8, 0.017, HOT_PINK, true),
    (0.8, 0.85, 0.019, rgb(0, 255, 255), false),
];

/// Material Girl: neon frame, curls, lace bow, cross earrings, beauty
/// mark and bold lips.
pub struct Madonna;

impl MaskRenderer for Madonna {
    fn kind(&self) -> RendererKind {
        RendererKind::Madonna
    }

    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    ) {
        let s = settings.legend_or(MADONNA);
        let Some(fb) = FaceBounds::from_landmarks(landmarks, width, height) else {
            return;
        };
        let (w, h) = (width as f32, height as f32);
        let t = ctx.time;
        let surface = &mut *ctx.surface;
        surface.save();

        neon_frame(surface, w, h, s.intensity, s.glow, t);
        curls(surface, &fb, s.intensity, t);
        bow(surface, fb.forehead_center.offset(0., -h * 0.12), w, h, s.intensity);
        earrings(surface, &fb, w, h, s.intensity, t);

        // beauty mark
        let mark = fb.left_cheek.lerp(&fb.nose_tip, 0.3).offset(w * 0.02, -h * 0.01);
        let size = w * 0.008;
        surface.set_alpha(s.intensity);
        surface.set_glow(BLACK, 3.);
        surface.fill_circle(mark, size, rgb(45, 27, 27));
        surface.clear_glow();
        surface.set_alpha(s.intensity * 0.5);
        surface.fill_circle(mark.offset(-size * 0.3, -size * 0.3), size * 0.3, rgb(139, 69, 19));

        let mouth_w = match (
            point(landmarks, MOUTH_LEFT, width, height),
            point(landmarks, MOUTH_RIGHT, width, height),
        ) {
            (Some(l), Some(r)) => (r.x - l.x).abs(),
            _ => fb.width * 0.35,
        };
        makeup(surface, &fb, w, h, mouth_w, s.intensity, s.detail);

        for (i, (x, y, size, color, is_diamond)) in SPARKLES.into_iter().enumerate() {
            let twinkle = pulse(t, 4., i as f64 * 0.7);
            let r = size * w * (0.6 + twinkle * 0.8);
            let at = Point::new(x * w, y * h);
            surface.set_alpha(s.intensity * twinkle * 0.8);
            surface.set_glow(color, r * 2.);
            if is_diamond {
                diamond(surface, at, r, color);
            } else {
                sparkle(surface, at, r, color);
            }
        }
        surface.clear_glow();

        choker(surface, fb.chin, w, h, s.intensity);
        surface.restore();
    }
}

fn neon_frame(surface: &mut Surface, w: f32, h: f32, intensity: f32, glow: f32, time: f64) {
    let t = time * 3.;
    let thick = w * 0.03;
    let phase = (t.sin() * 0.5 + 0.5) as f32;
    let color = rgb(
        (255. * (0.8 + phase * 0.2)) as u8,
        (20. * (0.5 + (t * 1.3).sin() * 0.5)) as u8,
        (147. * (0.7 + (t * 0.8).cos() * 0.3)) as u8,
    );
    let frame = RoundedRect::new(
        (thick / 2.) as f64,
        (thick / 2.) as f64,
        (w - thick / 2.) as f64,
        (h - thick / 2.) as f64,
        (thick * 2.) as f64,
    );

    surface.set_alpha(intensity * 0.6 * glow);
    surface.set_glow(color, 25. * glow);
    surface.stroke(&frame, color, thick as f64);

    surface.set_alpha(intensity * 0.3 * glow);
    surface.set_glow(color, 10.);
    surface.stroke(&frame, WHITE, (thick * 0.3) as f64);

    surface.set_alpha(intensity * (0.8 + (t * 2.).sin() as f32 * 0.3));
    surface.set_glow(HOT_PINK, 15.);
    for (x, y) in [(thick, thick), (w - thick, thick), (thick, h - thick), (w - thick, h - thick)] {
        surface.fill_circle(Point::new(x, y), thick * 0.4, HOT_PINK);
    }
    surface.clear_glow();
}

fn curls(surface: &mut Surface, fb: &FaceBounds, intensity: f32, time: f64) {
    let c = fb.forehead_center;
    let hw = fb.width * 1.1;

    surface.set_alpha(intensity * 0.8);
    surface.set_glow(rgb(255, 228, 181), 12.);
    let fill = Paint::linear(
        c.offset(-hw / 2., -fb.height * 0.3),
        c.offset(hw / 2., fb.height * 0.3),
        &[
            stop(0., rgb(245, 222, 179)),
            stop(0.3, rgb(255, 228, 181)),
            stop(0.7, rgb(255, 255, 153)),
            stop(1., rgb(240, 230, 140)),
        ],
    );
    let crown = c.offset(0., -fb.height * 0.12);
    surface.fill_ellipse(crown, hw * 0.6, fb.height * 0.22, 0., fill);
    surface.stroke_ellipse(crown, hw * 0.6, fb.height * 0.22, 0., rgb(218, 165, 32), 2.);
    surface.clear_glow();

    surface.set_alpha(intensity * 0.6);
    let mut spiral = [Point::default(); CURL_STEPS];
    for (i, (dx, dy, size)) in CURLS.into_iter().enumerate() {
        let at = Point::new(c.x + dx * hw, c.y + dy * fb.height * 2.);
        let r0 = size * fb.width * 0.1;
        let sway = (time * 2. + i as f64).sin() as f32 * 0.3;
        for (j, p) in spiral.iter_mut().enumerate() {
            let a = j as f32 * 0.2;
            let r = r0 * (1. - a / (PI * 4.)).max(0.);
            *p = Point::new(at.x + (a + sway).cos() * r, at.y + (a + sway).sin() * r);
        }
        surface.stroke_polyline(&spiral, false, rgb(222, 184, 135), 4.);
    }
}

fn bow(surface: &mut Surface, c: Point, w: f32, h: f32, intensity: f32) {
    let bw = w * 0.15;
    let bh = h * 0.08;

    surface.set_alpha(intensity * 0.9);
    surface.set_glow(HOT_PINK, 8.);
    let band = Arc {
        center: c.offset(0., h * 0.15).into(),
        radii: Vec2::new((w * 0.3) as f64, (w * 0.3) as f64),
        start_angle: -std::f64::consts::PI * 0.8,
        sweep_angle: std::f64::consts::PI * 0.6,
        x_rotation: 0.,
    };
    surface.stroke(&band, WHITE, 6.);

    for (dx, rot) in [(-0.3, -0.3), (0.3, 0.3)] {
        let lobe = c.offset(bw * dx, 0.);
        surface.fill_ellipse(lobe, bw * 0.4, bh, rot, WHITE);
        surface.stroke_ellipse(lobe, bw * 0.4, bh, rot, LIGHT_PINK, 2.);
    }
    surface.fill_ellipse(c, bw * 0.2, bh * 0.6, 0., LIGHT_PINK);
    surface.clear_glow();

    // lace
    surface.set_alpha(intensity * 0.6);
    for i in -2..=2 {
        let x = c.x + i as f32 * bw * 0.2;
        surface.stroke_circle(Point::new(x, c.y - bh * 0.3), bh * 0.1, LIGHT_PINK, 1.);
        surface.stroke_circle(Point::new(x, c.y + bh * 0.3), bh * 0.1, LIGHT_PINK, 1.);
    }

    surface.set_alpha(intensity * 0.7);
    for side in [-1., 1.] {
        let mut tail = BezPath::new();
        tail.move_to(c.offset(side * bw * 0.5, bh * 0.3));
        tail.quad_to(c.offset(side * bw * 0.8, bh * 1.5), c.offset(side * bw * 0.6, bh * 2.));
        surface.stroke(&tail, WHITE, 4.);
    }
}

fn earrings(surface: &mut Surface, fb: &FaceBounds, w: f32, h: f32, intensity: f32, time: f64) {
    let size = w * 0.035;
    let spots = [
        fb.left_cheek.offset(-w * 0.08, h * 0.04),
        fb.right_cheek.offset(w * 0.08, h * 0.04),
    ];
    for (i, ear) in spots.into_iter().enumerate() {
        let sway = pulse(time, 5., i as f64 * std::f64::consts::PI) * 2. - 1.;
        let c = ear.offset(sway * size * 0.3, 0.);

        surface.set_alpha(intensity);
        surface.set_glow(GOLD, 10.);
        cross(surface, c, size, GOLD, rgb(218, 165, 32));
        surface.set_alpha(intensity * 0.8);
        surface.set_glow(HOT_PINK, 8.);
        surface.fill_circle(c, size * 0.25, HOT_PINK);
        surface.clear_glow();

        surface.set_alpha(intensity * 0.7);
        surface.line(Point::new(c.x, ear.y - h * 0.02), Point::new(c.x, c.y - size), rgb(192, 192, 192), 2.);
    }
}

fn cross(surface: &mut Surface, c: Point, size: f32, fill: Color, edge: Color) {
    let r = (size * 0.1) as f64;
    let bars = [
        RoundedRect::new(
            (c.x - size * 0.15) as f64,
            (c.y - size) as f64,
            (c.x + size * 0.15) as f64,
            (c.y + size) as f64,
            r,
        ),
        RoundedRect::new(
            (c.x - size * 0.8) as f64,
            (c.y - size * 0.15) as f64,
            (c.x + size * 0.8) as f64,
            (c.y + size * 0.15) as f64,
            r,
        ),
    ];
    for bar in &bars {
        surface.fill(bar, fill);
        surface.stroke(bar, edge, 1.);
    }
}

fn makeup(surface: &mut Surface, fb: &FaceBounds, w: f32, h: f32, mouth_w: f32, intensity: f32, bold: f32) {
    surface.set_alpha(intensity * 0.7);
    for eye in [fb.left_eye, fb.right_eye_inner] {
        let shadow = Paint::radial(
            eye,
            (w * 0.01) as f64,
            (w * 0.06) as f64,
            &[stop(0., rgba(0, 191, 255, 204)), stop(1., rgba(0, 191, 255, 0))],
        );
        surface.fill_ellipse(eye.offset(0., -h * 0.025), w * 0.05, h * 0.035, 0., shadow);
    }

    surface.set_alpha(intensity * 0.8);
    for (eye, dir) in [(fb.left_eye, -1.), (fb.right_eye_inner, 1.)] {
        surface.line(
            eye.offset(dir * w * 0.03, 0.),
            eye.offset(dir * w * 0.04, -h * 0.015),
            BLACK,
            3.,
        );
    }

    let lips = fb.upper_lip.offset(0., h * 0.01);
    let lw = mouth_w * 1.2;
    let lh = ((fb.lower_lip.y - fb.upper_lip.y).abs() * 1.5).max(h * 0.01);
    surface.set_alpha(intensity * bold);
    surface.set_glow(HOT_PINK, 8.);
    surface.fill_ellipse(lips, lw / 2., lh / 2., 0., rgb(220, 20, 60));
    surface.clear_glow();
    surface.stroke_ellipse(lips, lw / 2., lh / 2., 0., rgb(139, 0, 0), 2.);
    surface.set_alpha(intensity * bold * 0.6);
    surface.fill_ellipse(lips.offset(-lw * 0.15, -lh * 0.15), lw * 0.2, lh * 0.15, 0., LIGHT_PINK);
}

fn choker(surface: &mut Surface, chin: Point, w: f32, h: f32, intensity: f32) {
    let y = chin.y + h * 0.08;
    surface.set_alpha(intensity * 0.5);
    surface.set_glow(HOT_PINK, 5.);
    surface.stroke_ellipse(Point::new(chin.x, y), w * 0.3, h * 0.02, 0., BLACK, 8.);
    surface.clear_glow();

    surface.set_alpha(intensity * 0.8);
    cross(surface, Point::new(chin.x, y + h * 0.03), w * 0.015, rgb(192, 192, 192), rgb(128, 128, 128));
}
