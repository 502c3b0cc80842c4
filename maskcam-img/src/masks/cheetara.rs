use super::catalog::CHEETARA;
use super::common::{aura, overlay, pulse};
use super::{MaskRenderer, MaskSettings, RenderContext, RendererKind};
use crate::geometry::FaceBounds;
use crate::landmarks::LandmarkSet;
use crate::shapes::Point;
use crate::surface::{BLACK, Color, Surface, WHITE, rgb, rgba, stop};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

const GOLD: Color = rgb(255, 215, 0);
const ORANGE: Color = rgb(255, 140, 0);
const RED_ORANGE: Color = rgb(255, 69, 0);

// (x, y, color) in frame fractions
const PAWS: [(f32, f32, Color); 6] = [
    (0.2, 0.3, GOLD),
    (0.8, 0.35, ORANGE),
    (0.15, 0.65, GOLD),
    (0.85, 0.7, RED_ORANGE),
    (0.3, 0.88, GOLD),
    (0.7, 0.85, ORANGE),
];

/// ThunderCats aura, ear overlay, golden cat eyes, speed lines and paw
/// sparkles.
pub struct Cheetara;

impl MaskRenderer for Cheetara {
    fn kind(&self) -> RendererKind {
        RendererKind::Cheetara
    }

    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    ) {
        let s = settings.legend_or(CHEETARA);
        let Some(fb) = FaceBounds::from_landmarks(landmarks, width, height) else {
            return;
        };
        let (w, h) = (width as f32, height as f32);
        let t = ctx.time;

        let glow = pulse(t, 3., 0.);
        ctx.surface.save();
        ctx.surface.set_alpha(s.intensity * 0.35);
        aura(
            ctx.surface,
            fb.center,
            fb.width * 0.05,
            fb.width * 1.4,
            &[
                stop(0., rgba(255, 140, 0, ((0.5 + glow * 0.2) * 255.) as u8)),
                stop(0.3, rgba(255, 69, 0, 77)),
                stop(0.6, rgba(255, 215, 0, 51)),
                stop(1., rgba(255, 140, 0, 0)),
            ],
        );
        ctx.surface.restore();

        if let Some(path) = self.kind().overlay() {
            let size = fb.width * 2.3;
            let at = fb.center.offset(0., -fb.height * 0.02);
            overlay(ctx, path, at, size, size, s.intensity * 0.9);
        }

        let surface = &mut *ctx.surface;
        surface.save();
        cat_eyes(surface, &fb, w, s.intensity * s.glow);
        speed_lines(surface, w, h, s.intensity, t);
        paws(surface, w, h, s.intensity * s.detail, t);
        surface.restore();
    }
}

fn cat_eyes(surface: &mut Surface, fb: &FaceBounds, w: f32, strength: f32) {
    let ew = w * 0.035;
    let eh = w * 0.022;
    let outward = if fb.left_eye.x <= fb.right_eye.x { 1. } else { -1. };

    for (eye, dir) in [(fb.left_eye, -outward), (fb.right_eye, outward)] {
        surface.set_alpha(strength * 0.85);
        surface.set_glow(GOLD, 10.);
        surface.fill_ellipse(eye, ew, eh, 0., GOLD);
        surface.stroke_ellipse(eye, ew, eh, 0., ORANGE, 2.);

        // slit pupil
        surface.set_alpha(strength * 0.9);
        surface.set_glow(GOLD, 3.);
        surface.fill_ellipse(eye, ew * 0.12, eh * 0.8, 0., BLACK);
        surface.clear_glow();

        surface.set_alpha(strength * 0.7);
        surface.fill_ellipse(eye.offset(-ew * 0.3, -eh * 0.3), ew * 0.18, eh * 0.18, 0., WHITE);

        surface.set_alpha(strength * 0.8);
        surface.line(
            eye.offset(dir * ew, 0.),
            eye.offset(dir * ew * 1.5, -eh * 0.5),
            rgb(139, 69, 19),
            2.5,
        );
    }
}

fn speed_lines(surface: &mut Surface, w: f32, h: f32, intensity: f32, time: f64) {
    let t = (time * 10.) as f32;
    let len = w * 0.25;
    surface.set_glow(GOLD, 8.);
    for i in 0..7 {
        let y = h / 8. * (i + 1) as f32;
        let x = (t * w * 0.08 + i as f32 * w * 0.2).rem_euclid(w * 1.5) - w * 0.25;
        if x <= -w * 0.2 || x >= w * 1.2 {
            continue;
        }
        surface.set_alpha(intensity * 0.4 * (1. - x.abs() / (w * 0.6)).max(0.));
        surface.line(Point::new(x, y), Point::new(x + len, y), GOLD, 2.5);
    }
    surface.clear_glow();
}

fn paws(surface: &mut Surface, w: f32, h: f32, strength: f32, time: f64) {
    for (i, (x, y, color)) in PAWS.into_iter().enumerate() {
        let twinkle = pulse(time, 5., i as f64);
        let size = w * 0.012 * (0.5 + twinkle * 0.7);
        let pad = Point::new(x * w, y * h);

        surface.set_alpha(strength * twinkle * 0.6);
        surface.set_glow(color, size * 2.);
        surface.fill_ellipse(pad, size * 0.6, size * 0.8, 0., color);
        for j in 0..4 {
            let angle = j as f32 * FRAC_PI_2 - FRAC_PI_4;
            let toe = pad.offset(angle.cos() * size * 0.5, angle.sin() * size * 0.5 - size * 0.6);
            surface.fill_ellipse(toe, size * 0.2, size * 0.3, 0., color);
        }
    }
    surface.clear_glow();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetCache;
    use crate::shapes::Rect;

    #[test]
    fn test_golden_eyes_with_slit() {
        let assets = AssetCache::new("/nonexistent");
        let mut surface = Surface::new(400, 400);
        let lm = LandmarkSet::from_box(&Rect::new(20., 15., 60., 70.));
        let fb = FaceBounds::from_landmarks(&lm, 400, 400).unwrap();
        let mut ctx = RenderContext {
            surface: &mut surface,
            assets: &assets,
            time: 0.,
        };
        let settings = MaskSettings::Legend(CHEETARA);
        Cheetara.render(&mut ctx, &lm, 400, 400, &settings);

        let eye = fb.right_eye;
        let iris = *surface.image().get_pixel(eye.x as u32 + 8, eye.y as u32);
        assert!(iris[0] > 200 && iris[1] > 150 && iris[2] < 100, "{iris:?}");
        let pupil = *surface.image().get_pixel(eye.x as u32, eye.y as u32);
        assert!(pupil[0] < iris[0], "{pupil:?}");
    }

    #[test]
    fn test_speed_lines_wrap() {
        let mut surface = Surface::new(100, 80);
        speed_lines(&mut surface, 100., 80., 1., 123.4);
        let lit = surface.image().pixels().filter(|p| p[3] > 0).count();
        assert!(lit > 0);
    }
}
