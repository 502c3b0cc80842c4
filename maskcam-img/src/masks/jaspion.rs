use super::catalog::JASPION;
use super::common::{aura, overlay};
use super::{MaskRenderer, MaskSettings, RenderContext, RendererKind};
use crate::geometry::FaceBounds;
use crate::landmarks::LandmarkSet;
use crate::shapes::Point;
use crate::surface::{Color, Surface, rgb, rgba, stop};
use std::f32::consts::PI;

const SKY: Color = rgb(0, 191, 255);
const FLAME: Color = rgb(255, 69, 0);

/// Tokusatsu helmet overlay with a sweeping visor beam and orbiting
/// particles.
pub struct Jaspion;

impl MaskRenderer for Jaspion {
    fn kind(&self) -> RendererKind {
        RendererKind::Jaspion
    }

    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    ) {
        let s = settings.legend_or(JASPION);
        let Some(fb) = FaceBounds::from_landmarks(landmarks, width, height) else {
            return;
        };
        let w = width as f32;
        let t = ctx.time;

        ctx.surface.save();
        ctx.surface.set_alpha(s.intensity * 0.28 * s.detail);
        aura(
            ctx.surface,
            fb.center,
            fb.width * 0.1,
            fb.width * 1.4,
            &[
                stop(0., rgba(192, 192, 192, 128)),
                stop(0.3, rgba(0, 123, 255, 77)),
                stop(0.7, rgba(255, 69, 0, 51)),
                stop(1., rgba(192, 192, 192, 0)),
            ],
        );
        ctx.surface.restore();

        if let Some(path) = self.kind().overlay() {
            let size = fb.width * 2.3;
            let at = fb.center.offset(0., -fb.height * 0.02);
            overlay(ctx, path, at, size, size, s.intensity * 0.95);
        }

        let surface = &mut *ctx.surface;
        surface.save();
        visor(surface, &fb, w, s.intensity * s.glow, t);
        particles(surface, &fb, w, s.intensity, t);
        surface.restore();
    }
}

/// Horizontal offset of the visor beam from the eye line center.
fn beam_offset(time: f64, visor_width: f32) -> f32 {
    (time * 5.).sin() as f32 * visor_width * 0.35
}

fn visor(surface: &mut Surface, fb: &FaceBounds, w: f32, strength: f32, time: f64) {
    let c = fb.left_eye.midpoint(&fb.right_eye);
    let visor_w = (fb.right_eye.x - fb.left_eye.x).abs() * 1.5;
    let x = c.x + beam_offset(time, visor_w);

    surface.set_alpha(strength * 0.75);
    surface.set_glow(FLAME, 15.);
    surface.line(
        Point::new(x, c.y - w * 0.025),
        Point::new(x, c.y + w * 0.025),
        FLAME,
        2.5,
    );

    surface.set_alpha(strength * 0.4);
    surface.set_glow(SKY, 10.);
    surface.stroke_ellipse(c, visor_w * 0.55, w * 0.03, 0., SKY, 1.5);
    surface.clear_glow();
}

fn particles(surface: &mut Surface, fb: &FaceBounds, w: f32, intensity: f32, time: f64) {
    let t = time * 3.;
    surface.set_alpha(intensity * 0.55);
    for i in 0..6 {
        let color = if i % 2 == 0 { SKY } else { FLAME };
        let dist = fb.width * (0.85 + (t + i as f64).sin() as f32 * 0.08);
        let angle = i as f32 * PI / 3. + (t * 0.5) as f32;
        let at = Point::new(
            fb.center.x + angle.cos() * dist,
            fb.center.y + angle.sin() * dist,
        );
        surface.set_glow(color, 8.);
        surface.fill_circle(at, w * 0.007, color);
    }
    surface.clear_glow();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beam_sweeps_within_visor() {
        let offsets: Vec<f32> = (0..40).map(|i| beam_offset(i as f64 * 0.05, 100.)).collect();
        assert!(offsets.iter().all(|o| o.abs() <= 35.));
        assert!(offsets.iter().any(|o| *o > 30.));
        assert!(offsets.iter().any(|o| *o < -30.));
    }
}
