use super::catalog::KNIGHT_RIDER;
use super::common::{aura, seeded};
use super::{MaskRenderer, MaskSettings, RenderContext, RendererKind};
use crate::geometry::FaceBounds;
use crate::landmarks::LandmarkSet;
use crate::shapes::Point;
use crate::surface::{BLACK, Paint, Surface, rgb, rgba, stop};
use kurbo::{BezPath, RoundedRect};

const HAIR_VOLUME: f32 = 1.2;

/// 80s hair, leather collar, aviators and the KITT scanner bar.
pub struct KnightRider;

impl MaskRenderer for KnightRider {
    fn kind(&self) -> RendererKind {
        RendererKind::KnightRider
    }

    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    ) {
        let s = settings.legend_or(KNIGHT_RIDER);
        let Some(fb) = FaceBounds::from_landmarks(landmarks, width, height) else {
            return;
        };
        let (w, h) = (width as f32, height as f32);
        let surface = &mut *ctx.surface;
        surface.save();

        hair(surface, &fb, w, h, s.intensity);

        surface.set_alpha(s.intensity * 0.9);
        collar(surface, &fb, h, s.glow);

        let offset = scanner_offset(ctx.time, s.detail);
        scanner(surface, &fb, w, h, s.intensity, offset);

        surface.set_alpha(s.intensity * 0.3);
        aura(
            surface,
            fb.forehead_center,
            w * 0.1,
            w * 0.4,
            &[
                stop(0., rgba(255, 20, 147, 77)),
                stop(0.5, rgba(0, 191, 255, 51)),
                stop(1., rgba(255, 20, 147, 0)),
            ],
        );

        aviators(surface, &fb, s.intensity);
        surface.restore();
    }
}

/// Scanner position in [-1, 1] of its travel.
fn scanner_offset(time: f64, speed: f32) -> f32 {
    (time * 3. * speed as f64).sin() as f32
}

fn hair(surface: &mut Surface, fb: &FaceBounds, w: f32, h: f32, intensity: f32) {
    let c = fb.forehead_center;
    let hw = w * 0.4 * HAIR_VOLUME * (fb.width / (w * 0.4)).min(1.);
    let hh = h * 0.35 * HAIR_VOLUME * (fb.height / (h * 0.5)).min(1.);
    let fill = rgb(139, 69, 19);
    let edge = rgb(101, 67, 33);

    surface.set_alpha(intensity * 0.8);
    surface.set_glow(rgb(45, 27, 27), 10.);
    let top = c.offset(0., -hh * 0.45);
    surface.fill_ellipse(top, hw * 0.6, hh * 0.5, 0., fill);
    surface.stroke_ellipse(top, hw * 0.6, hh * 0.5, 0., edge, 3.);

    surface.set_alpha(intensity * 0.6);
    for side in [-1., 1.] {
        let sweep = Point::new(c.x + side * hw * 0.55, c.y);
        surface.fill_ellipse(sweep, hw * 0.22, hh * 0.45, side * 0.3, fill);
        surface.stroke_ellipse(sweep, hw * 0.22, hh * 0.45, side * 0.3, edge, 3.);
    }
    surface.clear_glow();

    surface.set_alpha(intensity * 0.4);
    for i in -5i32..=5 {
        let start = Point::new(c.x + i as f32 * hw * 0.09, top.y - hh * 0.35);
        let end = Point::new(
            start.x + (seeded(i.unsigned_abs() as usize + 1, 7.) - 0.5) * w * 0.05,
            c.y - h * 0.02,
        );
        let mut strand = BezPath::new();
        strand.move_to(start);
        strand.quad_to(
            Point::new(start.x + i as f32 * w * 0.01, top.y),
            end,
        );
        surface.stroke(&strand, rgb(160, 82, 45), 2.);
    }
}

fn collar(surface: &mut Surface, fb: &FaceBounds, h: f32, shine: f32) {
    let c = fb.chin.offset(0., h * 0.1);
    let cw = fb.width * 0.8 * 1.3;
    let ch = h * 0.15;

    let outline = [
        c.offset(-cw * 0.5, ch),
        c.offset(-cw * 0.3, -ch * 0.2),
        c.offset(-cw * 0.1, -ch * 0.5),
        c.offset(0., -ch * 0.3),
        c.offset(cw * 0.1, -ch * 0.5),
        c.offset(cw * 0.3, -ch * 0.2),
        c.offset(cw * 0.5, ch),
    ];
    let leather = Paint::linear(
        c.offset(-cw / 2., 0.),
        c.offset(cw / 2., ch),
        &[
            stop(0., rgb(45, 27, 27)),
            stop(0.3, rgb(74, 44, 42)),
            stop(0.7, rgb(26, 26, 26)),
            stop(1., rgb(15, 15, 15)),
        ],
    );

    surface.set_glow(BLACK, 15. * shine);
    surface.fill_polygon(&outline, leather);
    surface.clear_glow();
    surface.stroke_polyline(&outline, true, BLACK, 3.);

    // stitching
    let alpha = surface.alpha();
    surface.save();
    surface.set_alpha(alpha * 0.66);
    surface.set_dash(3., 2.);
    surface.line(
        c.offset(-cw * 0.25, -ch * 0.3),
        c.offset(cw * 0.25, -ch * 0.3),
        rgb(139, 69, 19),
        1.,
    );
    surface.restore();
}

fn scanner(surface: &mut Surface, fb: &FaceBounds, w: f32, h: f32, intensity: f32, offset: f32) {
    let eyes = fb.left_eye.midpoint(&fb.right_eye_inner);
    let sw = (fb.right_eye_inner.x - fb.left_eye.x).abs() * 1.4;
    let sh = h * 0.02;
    let x = eyes.x + offset * sw * 0.4;

    surface.set_alpha(intensity);
    let bar = rounded(eyes.x - sw / 2., eyes.y - sh / 2., sw, sh);
    surface.fill(&bar, rgba(51, 51, 51, 204));
    surface.stroke(&bar, rgb(51, 51, 51), 1.);

    surface.set_alpha(intensity * 0.9);
    surface.set_glow(rgb(255, 0, 0), 20.);
    let beam = Paint::linear(
        Point::new(x - w * 0.05, eyes.y),
        Point::new(x + w * 0.05, eyes.y),
        &[
            stop(0., rgba(255, 0, 0, 0)),
            stop(0.5, rgb(255, 0, 0)),
            stop(1., rgba(255, 0, 0, 0)),
        ],
    );
    surface.fill(&rounded(x - w * 0.05, eyes.y - sh / 2., w * 0.1, sh), beam);
    surface.clear_glow();

    surface.set_alpha(intensity * 0.7);
    for i in 0..3 {
        let lx = x - w * 0.03 + i as f32 * w * 0.02;
        surface.line(
            Point::new(lx, eyes.y - sh * 0.3),
            Point::new(lx, eyes.y + sh * 0.3),
            rgb(255, 68, 68),
            1.,
        );
    }
}

fn rounded(x: f32, y: f32, w: f32, h: f32) -> RoundedRect {
    RoundedRect::new(
        x as f64,
        y as f64,
        (x + w) as f64,
        (y + h) as f64,
        (h / 2.) as f64,
    )
}

fn aviators(surface: &mut Surface, fb: &FaceBounds, intensity: f32) {
    let (l, r) = (fb.left_eye, fb.right_eye_inner);
    let ew = (r.x - l.x).abs() * 0.7;
    let eh = ew * 0.6;

    surface.set_alpha(intensity * 0.6);
    for eye in [l, r] {
        surface.fill_ellipse(eye, ew * 0.3, eh * 0.3, 0., rgba(75, 85, 99, 179));
        surface.stroke_ellipse(eye, ew * 0.3, eh * 0.3, 0., rgb(55, 65, 81), 2.);
    }
    surface.line(l.offset(ew * 0.25, 0.), r.offset(-ew * 0.25, 0.), rgb(107, 114, 128), 3.);

    surface.set_alpha(intensity * 0.4);
    let reflection = Paint::linear(
        Point::new(0., l.y - eh * 0.2),
        Point::new(0., l.y + eh * 0.2),
        &[stop(0., rgba(135, 206, 235, 128)), stop(1., rgba(255, 255, 255, 77))],
    );
    for eye in [l, r] {
        surface.fill_ellipse(eye, ew * 0.25, eh * 0.25, 0., reflection.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Rect;

    #[test]
    fn test_hair_stays_above_chin() {
        let mut surface = Surface::new(200, 200);
        let lm = LandmarkSet::from_box(&Rect::new(30., 30., 40., 50.));
        let fb = FaceBounds::from_landmarks(&lm, 200, 200).unwrap();
        hair(&mut surface, &fb, 200., 200., 1.);

        let img = surface.snapshot();
        let c = fb.forehead_center;
        assert!(img.get_pixel(c.x as u32, c.y as u32)[3] > 0);
        let below = (fb.chin.y as u32 + 20).min(199);
        assert!((0..200).all(|x| img.get_pixel(x, below)[3] == 0));
    }

    #[test]
    fn test_scanner_sweeps() {
        assert_eq!(scanner_offset(0., 1.), 0.);
        let a = scanner_offset(0.3, 1.);
        let b = scanner_offset(0.3, 2.);
        assert!(a > 0. && b > a);
        for i in 0..100 {
            assert!(scanner_offset(i as f64 * 0.1, 1.).abs() <= 1.);
        }
    }
}
