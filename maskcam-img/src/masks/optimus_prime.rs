use super::catalog::OPTIMUS_PRIME;
use super::common::{overlay, pulse};
use super::{MaskRenderer, MaskSettings, RenderContext, RendererKind};
use crate::geometry::FaceBounds;
use crate::landmarks::LandmarkSet;
use crate::shapes::Point;
use crate::surface::{Color, Surface, rgb};
use std::f32::consts::TAU;

const BLUE: Color = rgb(59, 130, 246);
const RED: Color = rgb(220, 38, 38);

/// Helmet overlay with glowing eyes and orbiting energy particles.
pub struct OptimusPrime;

impl MaskRenderer for OptimusPrime {
    fn kind(&self) -> RendererKind {
        RendererKind::OptimusPrime
    }

    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    ) {
        let s = settings.legend_or(OPTIMUS_PRIME);
        let Some(fb) = FaceBounds::from_landmarks(landmarks, width, height) else {
            return;
        };
        let w = width as f32;

        if let Some(path) = self.kind().overlay() {
            let size = fb.width * 2.2;
            let at = fb.center.offset(0., -fb.height * 0.05);
            overlay(ctx, path, at, size, size, s.intensity * 0.95);
        }

        let t = ctx.time;
        let surface = &mut *ctx.surface;
        surface.save();
        eyes(surface, &fb, w, s.intensity, s.glow, t);
        energy(surface, &fb, w, s.intensity, s.detail, t);
        surface.restore();
    }
}

fn eyes(surface: &mut Surface, fb: &FaceBounds, w: f32, intensity: f32, glow: f32, time: f64) {
    let size = w * 0.022 * glow;
    let beat = pulse(time, 4., 0.);
    for eye in [fb.left_eye, fb.right_eye] {
        surface.set_alpha(intensity * 0.7 * (0.8 + beat * 0.2));
        surface.set_glow(BLUE, 25. * glow);
        surface.fill_ellipse(eye, size, size * 0.7, 0., rgb(96, 165, 250));

        surface.set_alpha(intensity * 0.9);
        surface.set_glow(BLUE, 8.);
        surface.fill_ellipse(eye, size * 0.45, size * 0.35, 0., rgb(219, 234, 254));
    }
    surface.clear_glow();
}

fn energy(surface: &mut Surface, fb: &FaceBounds, w: f32, intensity: f32, detail: f32, time: f64) {
    let t = time * 2.;
    let size = w * 0.006 * detail;
    if size <= 0. {
        return;
    }
    for i in 0..6 {
        let angle = i as f32 * TAU / 6. + t as f32;
        let dist = fb.width * (0.8 + (t + i as f64 * 0.7).sin() as f32 * 0.1);
        let at = Point::new(
            fb.center.x + angle.cos() * dist,
            fb.center.y + angle.sin() * dist,
        );
        let color = if i % 2 == 0 { BLUE } else { RED };
        surface.set_alpha(intensity * 0.5 * pulse(t, 2., i as f64));
        surface.set_glow(color, 8.);
        surface.fill_circle(at, size, color);
    }
    surface.clear_glow();
}
