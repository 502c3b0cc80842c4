use super::catalog::JEM;
use super::common::{aura, diamond, overlay, pulse, seeded};
use super::{MaskRenderer, MaskSettings, RenderContext, RendererKind};
use crate::geometry::FaceBounds;
use crate::landmarks::LandmarkSet;
use crate::shapes::Point;
use crate::surface::{Color, Paint, Surface, rgb, rgba, stop};
use std::f64::consts::TAU;

const DEEP_PINK: Color = rgb(255, 20, 147);
const GLITTER: [Color; 5] = [
    rgb(255, 105, 180),
    rgb(0, 255, 255),
    rgb(255, 255, 255),
    rgb(255, 215, 0),
    DEEP_PINK,
];

/// Truly outrageous: holographic aura, star overlay, 80s makeup, glitter
/// and scan lines.
pub struct Jem;

impl MaskRenderer for Jem {
    fn kind(&self) -> RendererKind {
        RendererKind::Jem
    }

    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    ) {
        let s = settings.legend_or(JEM);
        let Some(fb) = FaceBounds::from_landmarks(landmarks, width, height) else {
            return;
        };
        let (w, h) = (width as f32, height as f32);
        let t = ctx.time;

        ctx.surface.save();
        hologram(ctx.surface, &fb, s.intensity, s.glow, t);
        ctx.surface.restore();

        if let Some(path) = self.kind().overlay() {
            let size = fb.width * 2.6;
            let at = fb.center.offset(0., -fb.height * 0.05);
            overlay(ctx, path, at, size, size, s.intensity * 0.9);
        }

        let surface = &mut *ctx.surface;
        surface.save();
        makeup(surface, &fb, s.intensity);
        glitter(surface, w, h, s.intensity, s.detail, t);
        scan_lines(surface, w, h, s.intensity, t);
        surface.restore();
    }
}

fn hologram(surface: &mut Surface, fb: &FaceBounds, intensity: f32, glow: f32, time: f64) {
    let t = time * 3.;
    let shift = pulse(t, 1., 0.);
    let r = 255. * (0.8 + shift * 0.2);
    let g = 105. * (0.5 + shift * 0.5);
    let b = 255. * (0.6 + (t * 1.2).sin() as f32 * 0.4);

    surface.set_alpha(intensity * 0.35 * glow);
    aura(
        surface,
        fb.center,
        fb.width * 0.05,
        fb.width * 1.5,
        &[
            stop(0., rgba(r as u8, g as u8, b as u8, 128)),
            stop(0.5, rgba((r * 0.6) as u8, g as u8, (b * 1.1).min(255.) as u8, 51)),
            stop(1., rgba(255, 20, 147, 0)),
        ],
    );
}

fn makeup(surface: &mut Surface, fb: &FaceBounds, intensity: f32) {
    let fw = fb.width;
    surface.set_alpha(intensity * 0.5);
    for eye in [fb.left_eye, fb.right_eye] {
        let shadow = Paint::radial(
            eye,
            (fw * 0.01) as f64,
            (fw * 0.08) as f64,
            &[stop(0., rgba(255, 20, 147, 128)), stop(1., rgba(255, 20, 147, 0))],
        );
        surface.fill_ellipse(eye.offset(0., -fw * 0.03), fw * 0.06, fw * 0.04, 0., shadow);
    }

    // wings point away from the nose
    surface.set_alpha(intensity * 0.65);
    let dir = if fb.left_eye.x <= fb.right_eye.x { 1. } else { -1. };
    for (eye, side) in [(fb.left_eye, -dir), (fb.right_eye, dir)] {
        surface.line(
            eye.offset(side * fw * 0.04, 0.),
            eye.offset(side * fw * 0.07, -fw * 0.025),
            DEEP_PINK,
            2.5,
        );
    }
}

fn glitter(surface: &mut Surface, w: f32, h: f32, intensity: f32, density: f32, time: f64) {
    let count = (18. * density).max(0.).floor() as usize;
    let t = time * 3.;
    for i in 0..count {
        let at = Point::new(
            (seeded(i, 1.) * 0.8 + 0.1) * w,
            (seeded(i, 7.) * 0.8 + 0.1) * h,
        );
        let phase = (i as f64 * 1234.5678 * 17.) % TAU;
        let twinkle = pulse(t, 1., phase);
        let size = (seeded(i, 13.) * 0.007 + 0.004) * w * (0.5 + twinkle * 0.8);
        let color = GLITTER[i % GLITTER.len()];

        surface.set_alpha(intensity * density * twinkle * 0.7);
        surface.set_glow(color, size * 3.);
        diamond(surface, at, size, color);
    }
    surface.clear_glow();
}

fn scan_lines(surface: &mut Surface, w: f32, h: f32, intensity: f32, time: f64) {
    let t = time * 10.;
    let spacing = h * 0.05;
    if spacing <= 0. {
        return;
    }
    let offset = (t as f32 * h * 0.02).rem_euclid(spacing * 2.);
    let mut y = offset - spacing;
    while y < h + spacing {
        surface.set_alpha(intensity * 0.15 * (1. + (t + y as f64 * 0.01).sin() as f32));
        surface.line(Point::new(0., y), Point::new(w, y), rgb(0, 255, 255), 1.);
        y += spacing;
    }
}
