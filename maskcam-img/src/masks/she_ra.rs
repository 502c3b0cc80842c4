use super::catalog::SHE_RA;
use super::common::{aura, pulse};
use super::{MaskRenderer, MaskSettings, RenderContext, RendererKind};
use crate::geometry::FaceBounds;
use crate::landmarks::LandmarkSet;
use crate::shapes::Point;
use crate::surface::{Color, Paint, Surface, rgb, rgba, stop};
use kurbo::BezPath;
use std::f32::consts::{PI, TAU};

const GOLD: Color = rgb(255, 215, 0);
const GOLDENROD: Color = rgb(218, 165, 32);
const HAIR_FLOW: f32 = 1.2;

// (x, y, size, color, phase) in frame units
const SPARKLES: [(f32, f32, f32, Color, f64); 8] = [
    (0.2, 0.1, 0.02, GOLD, 0.),
    (0.8, 0.15, 0.015, rgb(255, 105, 180), 1.),
    (0.1, 0.4, 0.018, rgb(135, 206, 235), 2.),
    (0.9, 0.45, 0.016, GOLD, 3.),
    (0.3, 0.7, 0.014, rgb(255, 105, 180), 4.),
    (0.7, 0.75, 0.017, rgb(135, 206, 235), 5.),
    (0.15, 0.85, 0.015, GOLD, 6.),
    (0.85, 0.8, 0.019, rgb(255, 105, 180), 7.),
];

/// Princess of Power: flowing golden hair, tiara with a pulsing gem,
/// sparkles and magic swirls.
pub struct SheRa;

impl MaskRenderer for SheRa {
    fn kind(&self) -> RendererKind {
        RendererKind::SheRa
    }

    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    ) {
        let s = settings.legend_or(SHE_RA);
        let Some(fb) = FaceBounds::from_landmarks(landmarks, width, height) else {
            return;
        };
        let (w, h) = (width as f32, height as f32);
        let t = ctx.time;
        let c = fb.forehead_center;
        let surface = &mut *ctx.surface;
        surface.save();

        surface.set_alpha(s.intensity * 0.3 * s.glow);
        aura(
            surface,
            c,
            w * 0.05,
            w * 0.5,
            &[
                stop(0., rgba(255, 215, 0, 153)),
                stop(0.3, rgba(255, 182, 193, 102)),
                stop(0.6, rgba(135, 206, 250, 77)),
                stop(1., rgba(255, 215, 0, 0)),
            ],
        );
        surface.set_alpha(s.intensity * 0.2 * pulse(t, 2., 0.));
        aura(
            surface,
            c,
            w * 0.1,
            w * 0.3,
            &[stop(0., rgba(255, 215, 0, 204)), stop(1., rgba(255, 215, 0, 0))],
        );

        hair(surface, &fb, h, s.intensity, t);
        tiara(surface, &fb, h, s.intensity);
        gem(surface, c.offset(0., -h * 0.08), w * 0.025, s.intensity, pulse(t, 5., 0.));

        for (x, y, size, color, phase) in SPARKLES {
            let twinkle = pulse(t, 4., phase);
            let r = size * w * (0.8 + twinkle * 0.4) * s.detail;
            surface.set_alpha(s.intensity * s.detail.min(1.) * twinkle);
            surface.set_glow(color, r * 2.);
            surface.fill_polygon(&burst(Point::new(x * w, y * h), r), color);
        }
        surface.clear_glow();

        // heroic markings beside the eyes
        surface.set_alpha(s.intensity * 0.6);
        surface.set_glow(GOLD, 5.);
        let eye_y = (fb.left_eye.y + fb.right_eye_inner.y) / 2.;
        for (eye, side) in [(fb.left_eye, -1.), (fb.right_eye, 1.)] {
            let mut mark = BezPath::new();
            mark.move_to(Point::new(eye.x + side * w * 0.03, eye_y - h * 0.01));
            mark.quad_to(
                Point::new(eye.x + side * w * 0.05, eye_y + h * 0.02),
                Point::new(eye.x + side * w * 0.02, eye_y + h * 0.03),
            );
            surface.stroke(&mark, GOLDENROD, 2.);
        }

        surface.set_alpha(s.intensity * 0.4);
        surface.set_glow(GOLD, 10.);
        for i in 0..3 {
            let swirl = swirl(c, w * (0.25 + i as f32 * 0.1), t as f32 * 2. + i as f32 * TAU / 3.);
            surface.stroke_polyline(&swirl, true, GOLD, 3.);
        }

        surface.restore();
    }
}

fn hair(surface: &mut Surface, fb: &FaceBounds, h: f32, intensity: f32, time: f64) {
    let c = fb.forehead_center;
    let hw = fb.width * 0.75 * HAIR_FLOW;
    let fill = Paint::linear(
        Point::new(0., c.y - h * 0.2),
        Point::new(0., c.y + h * 0.3),
        &[
            stop(0., GOLD),
            stop(0.3, rgb(255, 165, 0)),
            stop(0.7, rgb(255, 255, 153)),
            stop(1., rgb(240, 230, 140)),
        ],
    );

    surface.set_alpha(intensity * 0.8);
    surface.set_glow(GOLD, 15.);
    for side in [-1., 1.] {
        let mass = Point::new(c.x + side * hw * 0.85, c.y + fb.height * 0.35);
        surface.fill_ellipse(mass, hw * 0.3, fb.height * 0.7, side * 0.1, fill.clone());
        surface.stroke_ellipse(mass, hw * 0.3, fb.height * 0.7, side * 0.1, GOLDENROD, 2.);
    }
    surface.fill_ellipse(c.offset(0., -fb.height * 0.1), hw * 0.8, fb.height * 0.18, 0., fill);

    // (x offset, y offset, curve, length)
    let strands = [
        (-0.3, -0.05, 0.8, 0.4),
        (-0.15, -0.08, 0.6, 0.45),
        (0., -0.1, 0.4, 0.5),
        (0.15, -0.08, -0.6, 0.45),
        (0.3, -0.05, -0.8, 0.4),
    ];
    for (i, (dx, dy, curve, len)) in strands.into_iter().enumerate() {
        let start = Point::new(c.x + dx * hw * 2., c.y + dy * h);
        let sway = (time * 3. + i as f64).sin() as f32;
        let end = Point::new(start.x + curve * fb.width * 0.25 * sway, start.y + len * fb.height);
        let mid = Point::new(start.x + curve * fb.width * 0.12, start.y + len * fb.height * 0.5);
        let mut strand = BezPath::new();
        strand.move_to(start);
        strand.quad_to(mid, end);
        surface.stroke(&strand, GOLD, (8. * HAIR_FLOW) as f64);
    }
    surface.clear_glow();
}

fn tiara(surface: &mut Surface, fb: &FaceBounds, h: f32, intensity: f32) {
    let c = fb.forehead_center.offset(0., -h * 0.08);
    let tw = fb.width * 0.8 * 1.2;
    let th = h * 0.06;

    surface.set_alpha(intensity);
    surface.set_glow(GOLD, 20.);
    let band = c.offset(0., th * 0.3);
    surface.fill_ellipse(band, tw * 0.6, th * 0.3, 0., GOLD);
    surface.stroke_ellipse(band, tw * 0.6, th * 0.3, 0., GOLDENROD, 2.);
    for (x, peak) in [(0., 1.5), (-0.4, 1.), (0.4, 1.), (-0.7, 0.7), (0.7, 0.7)] {
        let px = c.x + x * tw * 0.5;
        let point = [
            Point::new(px - tw * 0.05, c.y),
            Point::new(px, c.y - th * peak),
            Point::new(px + tw * 0.05, c.y),
        ];
        surface.fill_polygon(&point, GOLD);
        surface.stroke_polyline(&point, true, GOLDENROD, 2.);
    }
    surface.clear_glow();

    surface.set_alpha(intensity * 0.8);
    for i in -2..=2 {
        let x = c.x + i as f32 * tw * 0.15;
        surface.stroke_circle(Point::new(x, c.y), th * 0.15, rgb(255, 165, 0), 1.);
    }
}

fn gem(surface: &mut Surface, c: Point, size: f32, intensity: f32, glow: f32) {
    let royal = rgb(65, 105, 225);
    surface.set_alpha(intensity);
    surface.set_glow(royal, 20. * (1. + glow));
    surface.fill_ellipse(c, size, size * 0.8, 0., royal);
    surface.clear_glow();

    surface.set_alpha(intensity * (0.8 + glow * 0.3));
    surface.fill_ellipse(c.offset(-size * 0.2, -size * 0.2), size * 0.5, size * 0.4, 0., rgb(230, 230, 250));
    surface.set_alpha(intensity * (0.9 + glow * 0.1));
    surface.fill_ellipse(c, size * 0.3, size * 0.2, 0., rgb(255, 255, 255));

    surface.set_alpha(intensity * 0.6 * glow);
    for i in 0..8 {
        let a = i as f32 * PI / 4.;
        let (sin, cos) = a.sin_cos();
        surface.line(
            c.offset(cos * size * 1.2, sin * size * 1.2),
            c.offset(cos * size * 2., sin * size * 2.),
            rgb(135, 206, 235),
            2.,
        );
    }
}

fn burst(c: Point, r: f32) -> [Point; 8] {
    [
        c.offset(0., -r),
        c.offset(r * 0.3, -r * 0.3),
        c.offset(r, 0.),
        c.offset(r * 0.3, r * 0.3),
        c.offset(0., r),
        c.offset(-r * 0.3, r * 0.3),
        c.offset(-r, 0.),
        c.offset(-r * 0.3, -r * 0.3),
    ]
}

fn swirl(c: Point, radius: f32, offset: f32) -> Vec<Point> {
    (0..63)
        .map(|i| {
            let a = i as f32 * 0.1;
            Point::new(
                c.x + (a + offset).cos() * radius * (1. + (a * 3.).sin() * 0.3),
                c.y + (a + offset).sin() * radius * (1. + (a * 3.).cos() * 0.3),
            )
        })
        .collect()
}
