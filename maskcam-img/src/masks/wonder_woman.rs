use super::catalog::WONDER_WOMAN;
use super::common::{aura, pulse, star};
use super::{MaskRenderer, MaskSettings, RenderContext, RendererKind};
use crate::geometry::FaceBounds;
use crate::landmarks::LandmarkSet;
use crate::shapes::Point;
use crate::surface::{BLACK, Color, Paint, Surface, rgb, rgba, stop};
use kurbo::BezPath;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

const GOLD: Color = rgb(255, 215, 0);
const GOLDENROD: Color = rgb(218, 165, 32);
const CRIMSON: Color = rgb(220, 20, 60);
const STEEL: Color = rgb(70, 130, 180);
const LASSO_SEGMENTS: usize = 32;

const SPARKLES: [(f32, f32, Color, f64); 6] = [
    (0.2, 0.2, GOLD, 0.),
    (0.8, 0.25, CRIMSON, 1.),
    (0.15, 0.6, STEEL, 2.),
    (0.85, 0.65, GOLD, 3.),
    (0.3, 0.85, CRIMSON, 4.),
    (0.7, 0.9, STEEL, 5.),
];

/// Lasso of truth around the frame, star tiara, bracelets and eagle
/// emblem.
pub struct WonderWoman;

impl MaskRenderer for WonderWoman {
    fn kind(&self) -> RendererKind {
        RendererKind::WonderWoman
    }

    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    ) {
        let s = settings.legend_or(WONDER_WOMAN);
        let Some(fb) = FaceBounds::from_landmarks(landmarks, width, height) else {
            return;
        };
        let (w, h) = (width as f32, height as f32);
        let t = ctx.time;
        let c = fb.forehead_center;
        let surface = &mut *ctx.surface;
        surface.save();

        lasso(surface, w, h, s.intensity, s.glow, t);

        surface.set_alpha(s.intensity * 0.3 * s.detail);
        aura(
            surface,
            c,
            w * 0.05,
            w * 0.4,
            &[
                stop(0., rgba(255, 215, 0, 153)),
                stop(0.3, rgba(220, 20, 60, 102)),
                stop(0.6, rgba(0, 100, 200, 77)),
                stop(1., rgba(255, 215, 0, 0)),
            ],
        );
        surface.set_alpha(s.intensity * 0.2 * pulse(t, 4., 0.));
        aura(
            surface,
            c,
            w * 0.1,
            w * 0.3,
            &[stop(0., rgba(255, 255, 255, 204)), stop(1., rgba(255, 255, 255, 0))],
        );

        hair(surface, &fb, w, h, s.intensity, t);
        tiara(surface, &fb, h, s.intensity);
        bracelets(surface, &fb, w, h, s.intensity, t);

        // blue shadow and red liner
        let (ew, eh) = (w * 0.05, h * 0.03);
        for eye in [fb.left_eye, fb.right_eye_inner] {
            surface.set_alpha(s.intensity * 0.5);
            surface.fill_ellipse(eye.offset(0., -h * 0.02), ew, eh, 0., rgba(0, 100, 200, 102));
            surface.set_alpha(s.intensity * 0.6);
            surface.line(eye.offset(-ew, 0.), eye.offset(ew, 0.), CRIMSON, 2.);
        }

        eagle(surface, c.offset(0., h * 0.03), w * 0.04, s.intensity);

        for (x, y, color, phase) in SPARKLES {
            let twinkle = pulse(t, 4., phase);
            let size = w * 0.02 * (0.5 + twinkle * 0.7);
            surface.set_alpha(s.intensity * twinkle * 0.8);
            surface.set_glow(color, size);
            surface.fill_polygon(&star(Point::new(x * w, y * h), size, size * 0.5, 5, -FRAC_PI_2), color);
        }

        surface.set_alpha(s.intensity * 0.3);
        surface.set_glow(rgb(255, 255, 255), 10.);
        for i in 0..8 {
            let a = i as f32 * PI / 4. + t as f32 * 2.;
            let (sin, cos) = a.sin_cos();
            surface.line(
                c.offset(cos * w * 0.15, sin * w * 0.15),
                c.offset(cos * w * 0.25, sin * w * 0.25),
                rgb(255, 255, 255),
                2.,
            );
        }

        surface.restore();
    }
}

fn lasso(surface: &mut Surface, w: f32, h: f32, intensity: f32, glow: f32, time: f64) {
    let t = time as f32 * 3.;
    let beat = pulse(time, 3., 0.);
    let radius = w.min(h) * 0.45;
    let c = Point::new(w / 2., h / 2.);

    let mut rope = [Point::default(); LASSO_SEGMENTS];
    for (i, p) in rope.iter_mut().enumerate() {
        let a = i as f32 * TAU / LASSO_SEGMENTS as f32 + t * 0.5;
        let r = radius * (1. + (a * 4. + t * 2.).sin() * 0.02);
        *p = Point::new(c.x + a.cos() * r, c.y + a.sin() * r);
    }
    surface.set_alpha(intensity * 0.4 * glow);
    surface.set_glow(GOLD, 20. * glow);
    surface.stroke_polyline(&rope, true, GOLD, 6. * (1. + beat * 0.5));
    surface.clear_glow();

    surface.set_alpha(intensity * 0.2 * beat);
    aura(
        surface,
        c,
        radius * 0.8,
        radius * 1.1,
        &[stop(0., rgba(255, 215, 0, 0)), stop(1., rgba(255, 215, 0, 77))],
    );
}

fn hair(surface: &mut Surface, fb: &FaceBounds, w: f32, h: f32, intensity: f32, time: f64) {
    let c = fb.forehead_center;
    let hw = fb.width * 0.9;
    let hh = fb.height * 0.9;
    let fill = Paint::linear(
        c.offset(-hw / 2., -hh / 2.),
        c.offset(hw / 2., hh / 2.),
        &[
            stop(0., rgb(28, 28, 28)),
            stop(0.5, rgb(45, 45, 45)),
            stop(1., rgb(15, 15, 15)),
        ],
    );

    surface.set_alpha(intensity * 0.7);
    surface.set_glow(STEEL, 8.);
    for side in [-1., 1.] {
        let mass = Point::new(c.x + side * hw * 0.62, c.y + hh * 0.35);
        surface.fill_ellipse(mass, hw * 0.22, hh * 0.75, side * 0.08, fill.clone());
        surface.stroke_ellipse(mass, hw * 0.22, hh * 0.75, side * 0.08, BLACK, 2.);
    }
    let crown = c.offset(0., -hh * 0.12);
    surface.fill_ellipse(crown, hw * 0.7, hh * 0.2, 0., fill);
    surface.clear_glow();

    surface.set_alpha(intensity * 0.4);
    for i in 0..5 {
        let dx = (i as f32 - 2.) * hw * 0.2;
        let wave = (time * 2. + i as f64).sin() as f32 * h * 0.02;
        let mut strand = BezPath::new();
        strand.move_to(Point::new(crown.x + dx, crown.y - hh * 0.15));
        strand.quad_to(
            Point::new(crown.x + dx + w * 0.02, crown.y + wave),
            Point::new(crown.x + dx * 1.3, crown.y + hh * 0.15),
        );
        surface.stroke(&strand, STEEL, 4.);
    }
}

fn tiara(surface: &mut Surface, fb: &FaceBounds, h: f32, intensity: f32) {
    let c = fb.forehead_center.offset(0., -h * 0.08);
    let tw = fb.width * 0.8 * 1.1;
    let th = h * 0.06;
    let star_size = th * 0.8;

    surface.set_alpha(intensity);
    surface.set_glow(GOLD, 15.);
    let band = c.offset(0., th * 0.2);
    surface.fill_ellipse(band, tw * 0.6, th * 0.4, 0., GOLD);
    surface.stroke_ellipse(band, tw * 0.6, th * 0.4, 0., GOLDENROD, 2.);

    let points = star(c.offset(0., -th * 0.3), star_size, star_size * 0.5, 5, -FRAC_PI_2);
    surface.fill_polygon(&points, GOLD);
    surface.stroke_polyline(&points, true, rgb(184, 134, 11), 2.);

    surface.set_glow(CRIMSON, 10.);
    surface.fill_circle(c.offset(0., -th * 0.3), star_size * 0.25, CRIMSON);
    surface.clear_glow();

    surface.set_alpha(intensity * 0.8);
    surface.fill_circle(c.offset(-star_size * 0.2, -th * 0.5), star_size * 0.1, rgb(255, 255, 255));

    surface.set_alpha(intensity * 0.7);
    for side in [-1., 1.] {
        let jewel = c.offset(side * tw * 0.35, 0.);
        surface.fill_ellipse(jewel, th * 0.3, th * 0.5, 0., GOLD);
        surface.stroke_ellipse(jewel, th * 0.3, th * 0.5, 0., GOLDENROD, 1.);
    }
}

fn bracelets(surface: &mut Surface, fb: &FaceBounds, w: f32, h: f32, intensity: f32, time: f64) {
    let (bw, bh) = (w * 0.06, h * 0.08);
    let spots = [
        fb.left_cheek.offset(-w * 0.1, h * 0.15),
        fb.right_cheek.offset(w * 0.1, h * 0.15),
    ];

    for (i, pos) in spots.into_iter().enumerate() {
        surface.set_alpha(intensity * 0.8);
        surface.set_glow(rgb(255, 255, 255), 10.);
        surface.fill_ellipse(pos, bw, bh, 0., rgb(192, 192, 192));
        surface.stroke_ellipse(pos, bw, bh, 0., rgb(128, 128, 128), 2.);
        surface.clear_glow();

        surface.set_alpha(intensity * 0.6);
        for j in -1..=1 {
            let y = pos.y + j as f32 * bh * 0.3;
            surface.line(
                Point::new(pos.x - bw * 0.6, y),
                Point::new(pos.x + bw * 0.6, y),
                CRIMSON,
                3.,
            );
        }

        surface.set_alpha(intensity * pulse(time, 5., i as f64 * PI as f64) * 0.7);
        surface.set_glow(rgb(255, 255, 255), 15.);
        for j in 0..3 {
            let a = j as f32 * TAU / 3. + time as f32 * 5.;
            let p = Point::new(pos.x + a.cos() * bw * 1.2, pos.y + a.sin() * bh * 1.2);
            surface.fill_circle(p, w * 0.008, rgb(255, 255, 255));
        }
        surface.clear_glow();
    }
}

fn eagle(surface: &mut Surface, c: Point, size: f32, intensity: f32) {
    surface.set_alpha(intensity * 0.6);
    surface.set_glow(GOLD, 8.);
    for (dx, rot) in [(-0.6, -0.3), (0.6, 0.3)] {
        let wing = c.offset(size * dx, 0.);
        surface.fill_ellipse(wing, size * 0.8, size * 0.3, rot, GOLD);
        surface.stroke_ellipse(wing, size * 0.8, size * 0.3, rot, GOLDENROD, 1.);
    }
    surface.fill_ellipse(c, size * 0.4, size * 0.6, 0., GOLD);
    surface.stroke_ellipse(c, size * 0.4, size * 0.6, 0., GOLDENROD, 1.);
    surface.clear_glow();

    surface.set_alpha(intensity * 0.8);
    surface.fill_circle(c.offset(0., -size * 0.2), size * 0.15, rgb(184, 134, 11));
}
