use super::catalog::FREDDIE_MERCURY;
use super::common::{aura, pulse, sparkle};
use super::{MaskRenderer, MaskSettings, RenderContext, RendererKind};
use crate::geometry::{FaceBounds, point};
use crate::landmarks::{LandmarkSet, MOUTH_LEFT, MOUTH_RIGHT};
use crate::shapes::Point;
use crate::surface::{Color, Paint, Surface, rgb, rgba, stop};
use kurbo::RoundedRect;

const JEWELS: [Color; 5] = [
    rgb(255, 0, 0),
    rgb(0, 255, 0),
    rgb(0, 0, 255),
    rgb(255, 0, 255),
    rgb(255, 255, 0),
];
const SPARKLES: [(f32, f32, Color); 6] = [
    (0.3, 0.2, rgb(255, 215, 0)),
    (0.7, 0.2, rgb(255, 105, 180)),
    (0.2, 0.5, rgb(147, 112, 219)),
    (0.8, 0.5, rgb(0, 255, 255)),
    (0.4, 0.8, rgb(255, 69, 0)),
    (0.6, 0.8, rgb(255, 215, 0)),
];

/// Mustache, royal crown, stage microphone and spotlights.
pub struct FreddieMercury;

impl MaskRenderer for FreddieMercury {
    fn kind(&self) -> RendererKind {
        RendererKind::FreddieMercury
    }

    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    ) {
        let s = settings.legend_or(FREDDIE_MERCURY);
        let Some(fb) = FaceBounds::from_landmarks(landmarks, width, height) else {
            return;
        };
        let (w, h) = (width as f32, height as f32);
        let surface = &mut *ctx.surface;
        surface.save();

        surface.set_alpha(s.intensity * 0.3);
        aura(
            surface,
            fb.forehead_center,
            w * 0.1,
            w * 0.5,
            &[
                stop(0., rgba(147, 51, 234, 153)),
                stop(0.5, rgba(168, 85, 247, 102)),
                stop(1., rgba(147, 51, 234, 0)),
            ],
        );

        let mouth_w = match (
            point(landmarks, MOUTH_LEFT, width, height),
            point(landmarks, MOUTH_RIGHT, width, height),
        ) {
            (Some(l), Some(r)) => (r.x - l.x).abs(),
            _ => fb.width * 0.35,
        };
        surface.set_alpha(s.intensity);
        mustache(surface, fb.upper_lip.offset(0., -h * 0.02), mouth_w * s.detail, h * 0.025);

        surface.set_alpha(s.intensity * 0.8);
        crown(surface, fb.forehead_center.offset(0., -h * 0.1), w * 0.25, h * 0.08, s.glow);

        surface.set_alpha(s.intensity * 0.9);
        microphone(surface, Point::new(w * 0.75, h * 0.6), w * 0.08, h * 0.15);

        surface.set_alpha(s.intensity * 0.4);
        for (x, y, color) in [
            (0.2, 0.1, rgb(255, 215, 0)),
            (0.8, 0.1, rgb(255, 105, 180)),
            (0.5, 0.05, rgb(147, 112, 219)),
        ] {
            aura(
                surface,
                Point::new(w * x, h * y),
                0.,
                w * 0.3,
                &[stop(0., with(color, 96)), stop(1., with(color, 0))],
            );
        }

        surface.set_glow(rgb(255, 255, 255), 10.);
        for (i, (x, y, color)) in SPARKLES.iter().enumerate() {
            let twinkle = pulse(ctx.time, 3., i as f64);
            surface.set_alpha(s.intensity * (0.5 + 0.3 * twinkle));
            sparkle(surface, Point::new(x * w, y * h), w * 0.015, *color);
        }

        surface.restore();
    }
}

fn with(c: Color, a: u8) -> Color {
    rgba(c[0], c[1], c[2], a)
}

fn mustache(surface: &mut Surface, c: Point, width: f32, height: f32) {
    let hair = rgb(45, 27, 27);
    surface.set_glow(rgb(0, 0, 0), 5.);
    surface.fill_ellipse(c.offset(0., -height * 0.3), width * 0.7, height, 0., hair);
    surface.fill_ellipse(c.offset(-width * 0.4, 0.), width * 0.3, height * 0.8, -0.3, hair);
    surface.fill_ellipse(c.offset(width * 0.4, 0.), width * 0.3, height * 0.8, 0.3, hair);
    surface.clear_glow();

    for i in -3..=3 {
        let x = c.x + i as f32 * width * 0.1;
        surface.line(
            Point::new(x, c.y - height * 0.5),
            Point::new(x, c.y + height * 0.3),
            rgb(74, 74, 74),
            1.,
        );
    }
}

fn crown(surface: &mut Surface, c: Point, width: f32, height: f32, glow: f32) {
    let mut outline = vec![Point::new(c.x - width * 0.5, c.y + height * 0.3)];
    for i in 0..5 {
        let x = c.x - width * 0.5 + i as f32 * width * 0.25;
        let peak = if i == 2 { height * 1.5 } else { height };
        outline.push(Point::new(x, c.y - peak));
        outline.push(Point::new(x + width * 0.125, c.y + height * 0.3));
    }

    surface.set_glow(rgb(255, 215, 0), 20. * glow);
    surface.fill_polygon(&outline, rgb(255, 215, 0));
    surface.clear_glow();
    surface.stroke_polyline(&outline, true, rgb(255, 165, 0), 3.);

    for (i, jewel) in JEWELS.iter().enumerate() {
        let x = c.x - width * 0.4 + i as f32 * width * 0.2;
        let y = c.y - if i == 2 { height * 1.2 } else { height * 0.7 };
        surface.set_glow(*jewel, 15.);
        surface.fill_circle(Point::new(x, y), width * 0.04, *jewel);
    }
    surface.clear_glow();
}

fn microphone(surface: &mut Surface, c: Point, width: f32, height: f32) {
    let chrome = Paint::linear(
        c,
        c.offset(width, height),
        &[
            stop(0., rgb(192, 192, 192)),
            stop(0.5, rgb(229, 231, 235)),
            stop(1., rgb(156, 163, 175)),
        ],
    );
    let edge = rgb(55, 65, 81);

    let head = c.offset(0., -height * 0.3);
    surface.fill_ellipse(head, width * 0.6, height * 0.3, 0., chrome.clone());
    surface.stroke_ellipse(head, width * 0.6, height * 0.3, 0., edge, 2.);

    let handle = RoundedRect::new(
        (c.x - width * 0.2) as f64,
        (c.y - height * 0.1) as f64,
        (c.x + width * 0.2) as f64,
        (c.y + height * 0.7) as f64,
        (width * 0.1) as f64,
    );
    surface.fill(&handle, chrome);
    surface.stroke(&handle, edge, 2.);

    for i in 0..5 {
        let y = c.y - height * 0.4 + i as f32 * height * 0.15;
        surface.line(
            Point::new(c.x - width * 0.4, y),
            Point::new(c.x + width * 0.4, y),
            rgb(107, 114, 128),
            1.,
        );
    }

    // the hand holding it
    let hand = c.offset(0., height * 0.3);
    surface.fill_ellipse(hand, width * 0.8, height * 0.4, 0., rgb(210, 180, 140));
    surface.stroke_ellipse(hand, width * 0.8, height * 0.4, 0., rgb(160, 82, 45), 2.);
}
