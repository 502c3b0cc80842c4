use super::common::smooth_skin;
use super::{MaskRenderer, MaskSettings, RenderContext, RendererKind};
use crate::geometry::{FaceBounds, contour_bounds, eye_centers};
use crate::landmarks::{LandmarkSet, RIGHT_EYE};
use crate::surface::rgb;

/// Oversized glossy eyes, a minimal nose and blush on smoothed skin.
pub struct AnimeStyle;

impl MaskRenderer for AnimeStyle {
    fn kind(&self) -> RendererKind {
        RendererKind::AnimeStyle
    }

    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    ) {
        let s = settings.anime();
        let Some(fb) = FaceBounds::from_landmarks(landmarks, width, height) else {
            return;
        };
        let (w, h) = (width as f32, height as f32);
        let (left, right) = eye_centers(landmarks, width, height)
            .unwrap_or((fb.left_eye, fb.right_eye));

        let surface = &mut *ctx.surface;
        smooth_skin(surface, landmarks, width, height, s.skin_smooth);

        let base = contour_bounds(landmarks, &RIGHT_EYE, width, height)
            .map(|r| r.w / 2.)
            .unwrap_or(fb.eye_distance() * 0.12);
        let eye_w = base * s.eye_size;
        let eye_h = eye_w * 0.8;

        surface.save();
        surface.set_alpha(s.intensity);
        for eye in [left, right] {
            surface.fill_ellipse(eye, eye_w, eye_h, 0., rgb(255, 255, 255));
            surface.stroke_ellipse(eye, eye_w, eye_h, 0., rgb(45, 55, 72), 3.);
            surface.fill_ellipse(eye, eye_w * 0.6, eye_h * 0.7, 0., rgb(74, 144, 226));
            surface.fill_ellipse(eye, eye_w * 0.25, eye_h * 0.3, 0., rgb(26, 32, 44));
        }

        surface.set_alpha(s.intensity * 0.6);
        let n = fb.nose_tip;
        surface.line(
            n.offset(-w * 0.008, 0.),
            n.offset(w * 0.008, h * 0.015),
            rgb(209, 163, 163),
            2.,
        );

        surface.set_alpha(s.intensity * 0.9);
        let glint = w * 0.015;
        for eye in [left, right] {
            surface.fill_circle(eye.offset(-glint, -glint), glint, rgb(255, 255, 255));
            surface.fill_circle(eye.offset(glint * 0.5, -glint * 0.5), glint * 0.4, rgb(255, 255, 255));
        }

        surface.set_alpha(s.intensity * 0.4);
        let blush = w * 0.04;
        let color = rgb(255, 159, 181);
        for (cheek, toward) in [(fb.left_cheek, 1.), (fb.right_cheek, -1.)] {
            let c = cheek.lerp(&fb.nose_tip, 0.35).offset(toward * w * 0.02, h * 0.01);
            surface.fill_ellipse(c, blush, blush * 0.6, 0., color);
        }
        surface.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetCache;
    use crate::masks::AnimeSettings;
    use crate::shapes::Rect;
    use crate::surface::Surface;
    use image::RgbaImage;

    #[test]
    fn test_eyes_are_white() {
        let lm = LandmarkSet::from_box(&Rect::new(20., 20., 60., 60.));
        let assets = AssetCache::new("");
        let mut surface = Surface::from_image(RgbaImage::from_pixel(200, 200, rgb(0, 0, 0)));
        let settings = MaskSettings::Anime(AnimeSettings {
            eye_size: 2.,
            skin_smooth: 0.,
            intensity: 1.,
        });
        let mut ctx = RenderContext {
            surface: &mut surface,
            assets: &assets,
            time: 0.,
        };
        AnimeStyle.render(&mut ctx, &lm, 200, 200, &settings);

        // sclera between iris and outline, right of the left eye center
        let (left, _) = eye_centers(&lm, 200, 200).unwrap();
        let eye_w = contour_bounds(&lm, &RIGHT_EYE, 200, 200).unwrap().w;
        let p = surface.image().get_pixel((left.x + eye_w * 0.8) as u32, left.y as u32);
        assert!(p[0] > 200 && p[1] > 200 && p[2] > 200, "{p:?}");
    }
}
