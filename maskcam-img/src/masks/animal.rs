use super::catalog::{Animal, AnimalSettings};
use super::{MaskRenderer, MaskSettings, RenderContext, RendererKind};
use crate::geometry::FaceBounds;
use crate::landmarks::LandmarkSet;
use crate::shapes::Point;
use crate::surface::{BLACK, Surface, rgb};

/// Cartoon ears, nose and whiskers of a cat, dog, fox or owl.
pub struct AnimalMorph;

impl MaskRenderer for AnimalMorph {
    fn kind(&self) -> RendererKind {
        RendererKind::AnimalMorph
    }

    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    ) {
        let s = settings.animal();
        let Some(fb) = FaceBounds::from_landmarks(landmarks, width, height) else {
            return;
        };
        let w = width as f32;

        let surface = &mut *ctx.surface;
        surface.save();
        surface.set_alpha(s.intensity);
        match s.animal {
            Animal::Cat => cat(surface, &fb, &s, w),
            Animal::Dog => dog(surface, &fb, &s, w, ctx.time),
            Animal::Fox => fox(surface, &fb, &s, w),
            Animal::Owl => owl(surface, &fb, w),
        }
        surface.restore();
    }
}

fn eye_span(fb: &FaceBounds) -> f32 {
    (fb.left_eye.x - fb.right_eye_inner.x).abs()
}

fn cat(surface: &mut Surface, fb: &FaceBounds, s: &AnimalSettings, w: f32) {
    if s.ears {
        let size = eye_span(fb) * 0.8;
        let offset = eye_span(fb) * 0.7;
        let f = fb.forehead;
        for side in [-1., 1.] {
            let base = f.offset(side * offset, 0.);
            surface.fill_polygon(
                &[
                    base.offset(0., -size * 0.3),
                    base.offset(side * size * 0.6, -size),
                    base.offset(-side * size * 0.3, -size * 0.8),
                ],
                rgb(255, 107, 157),
            );
            surface.fill_polygon(
                &[
                    base.offset(0., -size * 0.4),
                    base.offset(side * size * 0.3, -size * 0.8),
                    base.offset(-side * size * 0.15, -size * 0.6),
                ],
                rgb(255, 179, 217),
            );
        }
    }

    if s.nose {
        let n = fb.nose_tip;
        let size = w * 0.015;
        surface.fill_polygon(
            &[
                n.offset(0., -size),
                n.offset(-size, size),
                n.offset(size, size),
            ],
            rgb(255, 107, 157),
        );
        surface.fill_circle(n.offset(-size * 0.3, -size * 0.2), size * 0.3, rgb(255, 204, 221));
    }

    if s.whiskers {
        let n = fb.nose_tip;
        let len = w * 0.12;
        let gap = fb.height * 0.04;
        for side in [-1., 1.] {
            for i in 0..3 {
                let angle = (i as f32 - 1.) * 0.3;
                let start = n.offset(side * w * 0.03, (i as f32 - 1.) * gap);
                let end = start.offset(side * angle.cos() * len, angle.sin() * len * 0.3);
                surface.line(start, end, rgb(51, 51, 51), 2.);
            }
        }
    }
}

fn dog(surface: &mut Surface, fb: &FaceBounds, s: &AnimalSettings, w: f32, time: f64) {
    if s.ears {
        let span = eye_span(fb);
        let f = fb.forehead;
        for side in [-1., 1.] {
            // floppy ears hang beside the temples
            let c = Point::new(f.x + side * span * 0.9, f.y + span * 0.45);
            surface.fill_ellipse(c, span * 0.22, span * 0.5, side * 0.25, rgb(139, 69, 19));
            surface.fill_ellipse(
                c.offset(0., span * 0.05),
                span * 0.12,
                span * 0.35,
                side * 0.25,
                rgb(160, 95, 45),
            );
        }
    }

    if s.nose {
        surface.fill_circle(fb.nose_tip, w * 0.02, BLACK);
        surface.fill_circle(fb.nose_tip.offset(-w * 0.006, -w * 0.006), w * 0.005, rgb(90, 90, 90));
    }

    // panting for half a second every four
    if time.rem_euclid(4.) < 0.5 {
        let c = fb.upper_lip.offset(0., fb.height * 0.08);
        surface.fill_ellipse(c, w * 0.02, fb.height * 0.08, 0., rgb(255, 105, 180));
    }
}

fn fox(surface: &mut Surface, fb: &FaceBounds, s: &AnimalSettings, w: f32) {
    if s.ears {
        let size = eye_span(fb) * 0.6;
        let f = fb.forehead;
        for side in [-1., 1.] {
            surface.fill_polygon(
                &[
                    f.offset(side * size, 0.),
                    f.offset(side * size * 0.3, -size),
                    f.offset(side * size * 1.3, -size * 0.6),
                ],
                rgb(255, 102, 0),
            );
            surface.fill_polygon(
                &[
                    f.offset(side * size * 0.95, -size * 0.15),
                    f.offset(side * size * 0.5, -size * 0.75),
                    f.offset(side * size * 1.1, -size * 0.55),
                ],
                rgb(255, 235, 215),
            );
        }
    }

    if s.nose {
        surface.fill_circle(fb.nose_tip, w * 0.015, BLACK);
    }
}

fn owl(surface: &mut Surface, fb: &FaceBounds, w: f32) {
    let size = w * 0.06;
    for eye in [fb.left_eye, fb.right_eye_inner] {
        surface.fill_circle(eye, size * 1.15, rgb(139, 90, 43));
        surface.fill_circle(eye, size, rgb(255, 215, 0));
        surface.fill_circle(eye, size * 0.4, BLACK);
        surface.fill_circle(eye.offset(-size * 0.12, -size * 0.12), size * 0.1, rgb(255, 255, 255));
    }

    let n = fb.nose_tip;
    let beak = w * 0.02;
    surface.fill_polygon(
        &[
            n.offset(0., -beak),
            n.offset(-beak * 0.6, beak * 0.8),
            n.offset(beak * 0.6, beak * 0.8),
        ],
        rgb(255, 165, 0),
    );

    // feather tufts
    let f = fb.forehead;
    let span = eye_span(fb);
    for side in [-1., 1.] {
        let base = f.offset(side * span * 0.6, 0.);
        let tip = base.offset(side * span * 0.3, -span * 0.5);
        let tuft = [
            base.offset(-span * 0.12, 0.),
            tip,
            base.offset(span * 0.12, 0.),
            base.offset(0., span * 0.06),
        ];
        surface.fill_polygon(&tuft, rgb(120, 80, 40));
    }
}
