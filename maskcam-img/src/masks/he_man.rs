use super::catalog::HE_MAN;
use super::common::{aura, hair_strands};
use super::{MaskRenderer, MaskSettings, RenderContext, RendererKind};
use crate::geometry::FaceBounds;
use crate::landmarks::LandmarkSet;
use crate::shapes::Point;
use crate::surface::{rgb, rgba, stop};
use kurbo::BezPath;

const GOLD: image::Rgba<u8> = rgb(255, 215, 0);
const LEATHER: image::Rgba<u8> = rgb(139, 69, 19);

/// Golden crown, blond hair, strong jaw and a power aura.
pub struct HeMan;

impl MaskRenderer for HeMan {
    fn kind(&self) -> RendererKind {
        RendererKind::HeMan
    }

    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    ) {
        let s = settings.legend_or(HE_MAN);
        let Some(fb) = FaceBounds::from_landmarks(landmarks, width, height) else {
            return;
        };
        let (w, h) = (width as f32, height as f32);
        let surface = &mut *ctx.surface;
        surface.save();

        // power aura
        surface.set_alpha(s.intensity * 0.4 * s.glow.min(2.));
        aura(
            surface,
            fb.forehead_center,
            w * 0.1,
            w * 0.4 * s.glow.max(0.5),
            &[
                stop(0., rgba(255, 215, 0, 153)),
                stop(0.5, rgba(255, 165, 0, 77)),
                stop(1., rgba(255, 215, 0, 0)),
            ],
        );

        surface.set_alpha(s.intensity * 0.7);
        surface.set_glow(rgb(255, 165, 0), 15.);
        hair_strands(surface, &fb, 9, 1., GOLD, 8.);
        surface.clear_glow();

        // crown
        surface.set_alpha(s.intensity);
        let temples = fb.width * 0.8;
        let crown_w = temples * s.detail;
        let crown_h = h * 0.06;
        let c = fb.forehead_center.offset(0., -h * 0.08);
        surface.set_glow(rgb(255, 165, 0), 20.);
        surface.fill_ellipse(c, crown_w * 0.6, crown_h * 0.4, 0., GOLD);
        for i in -2..=2 {
            let x = c.x + i as f32 * crown_w * 0.15;
            let spike = if i == 0 { crown_h * 1.5 } else { crown_h };
            surface.line(
                Point::new(x, c.y + crown_h * 0.2),
                Point::new(x, c.y - spike),
                GOLD,
                4.,
            );
        }
        surface.clear_glow();
        surface.fill_circle(c.offset(0., -crown_h * 0.5), crown_h * 0.3, rgb(255, 69, 0));

        // jaw line
        surface.set_alpha(s.intensity * 0.6);
        surface.set_glow(rgb(101, 67, 33), 8.);
        let jaw_l = fb.left_cheek.lerp(&fb.chin, 0.55);
        let jaw_r = fb.right_cheek.lerp(&fb.chin, 0.55);
        let mut jaw = BezPath::new();
        jaw.move_to(jaw_l);
        jaw.quad_to(fb.chin.offset(0., h * 0.02), jaw_r);
        surface.stroke(&jaw, LEATHER, 3.);
        surface.clear_glow();
        surface.fill_ellipse(
            fb.chin.offset(0., -h * 0.01),
            w * 0.03,
            h * 0.02,
            0.,
            rgba(139, 69, 19, 77),
        );

        // war paint
        surface.set_alpha(s.intensity * 0.5);
        for cheek in [fb.left_cheek, fb.right_cheek] {
            let anchor = cheek.lerp(&fb.nose_tip, 0.3);
            for i in 0..3 {
                let y = anchor.y + (i as f32 - 1.) * h * 0.015;
                surface.line(
                    Point::new(anchor.x - w * 0.02, y),
                    Point::new(anchor.x + w * 0.02, y),
                    LEATHER,
                    2.,
                );
            }
        }

        surface.restore();
    }
}
