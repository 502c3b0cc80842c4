//! Drawing helpers shared by the renderers.

use super::RenderContext;
use crate::geometry::{FaceBounds, contour};
use crate::landmarks::{FACE_OVAL, LandmarkSet};
use crate::shapes::{Point, Polygon, Rect};
use crate::surface::{Color, Paint, Stop, Surface, WHITE};
use imageproc::filter::gaussian_blur_f32;
use std::f32::consts::PI;

/// Oscillates in [0, 1] with `time` in seconds.
pub fn pulse(time: f64, speed: f64, phase: f64) -> f32 {
    (((time * speed + phase).sin() + 1.) / 2.) as f32
}

/// Stable pseudo random value in [0, 1) for element `i`; `k` picks an
/// independent channel.
pub fn seeded(i: usize, k: f64) -> f32 {
    (i as f64 * 1234.5678 * k).fract() as f32
}

/// Points of a star polygon, alternating outer and inner radius. The first
/// point sits at `rotation` radians.
pub fn star(center: Point, outer: f32, inner: f32, points: usize, rotation: f32) -> Vec<Point> {
    let n = points.max(2) * 2;
    (0..n)
        .map(|i| {
            let angle = rotation + i as f32 * PI / points.max(2) as f32;
            let r = if i % 2 == 0 { outer } else { inner };
            Point::new(center.x + angle.cos() * r, center.y + angle.sin() * r)
        })
        .collect()
}

/// Eight point twinkle.
pub fn sparkle(surface: &mut Surface, center: Point, size: f32, color: Color) {
    if size > 0. {
        surface.fill_polygon(&star(center, size, size * 0.5, 4, 0.), color);
    }
}

/// Four point diamond glint.
pub fn diamond(surface: &mut Surface, center: Point, size: f32, color: Color) {
    let pts = [
        Point::new(center.x, center.y - size),
        Point::new(center.x + size * 0.7, center.y),
        Point::new(center.x, center.y + size),
        Point::new(center.x - size * 0.7, center.y),
    ];
    surface.fill_polygon(&pts, color);
}

/// Radial gradient wash over the whole frame.
pub fn aura(surface: &mut Surface, center: Point, inner: f32, outer: f32, stops: &[Stop]) {
    if outer > inner {
        surface.fill_all(Paint::radial(center, inner as f64, outer as f64, stops));
    }
}

/// Draw a cached overlay centered on `center`. Returns `false` (drawing
/// nothing) while the image is still loading or failed.
pub fn overlay(
    ctx: &mut RenderContext<'_>,
    path: &str,
    center: Point,
    width: f32,
    height: f32,
    alpha: f32,
) -> bool {
    let Some(img) = ctx.assets.get(path) else {
        return false;
    };

    ctx.surface.save();
    ctx.surface.set_alpha(alpha);
    ctx.surface
        .draw_image(&img, Rect::from_center(center, width, height));
    ctx.surface.restore();
    true
}

/// Quadratic strands fanned over the top of the head.
pub fn hair_strands(
    surface: &mut Surface,
    fb: &FaceBounds,
    count: usize,
    volume: f32,
    paint: impl Into<Paint>,
    width: f32,
) {
    let paint = paint.into();
    let top = fb.forehead;
    let span = fb.width * 0.6 * volume;

    for i in 0..count {
        let t = if count > 1 {
            i as f32 / (count - 1) as f32
        } else {
            0.5
        };
        // roots along the hairline, tips falling past the temples
        let angle = PI + t * PI;
        let root = Point::new(
            top.x + angle.cos() * span * 0.8,
            top.y - angle.sin().abs() * fb.height * 0.08 + fb.height * 0.04,
        );
        let side = if t < 0.5 { -1. } else { 1. };
        let tip = Point::new(
            root.x + side * fb.width * (0.1 + 0.25 * (t - 0.5).abs()),
            root.y + fb.height * (0.15 + 0.5 * (t - 0.5).abs()) * volume,
        );
        let ctrl = Point::new(
            (root.x + tip.x) / 2. + side * fb.width * 0.05 * (1. + seeded(i, 3.)),
            root.y - fb.height * 0.08,
        );

        let mut path = kurbo::BezPath::new();
        path.move_to(root);
        path.quad_to(ctrl, tip);
        surface.stroke(&path, paint.clone(), width as f64);
    }
}

/// Face oval in pixels, `None` when too few points are present.
pub fn face_oval(lm: &LandmarkSet, width: u32, height: u32) -> Option<Polygon> {
    let oval = contour(lm, &FACE_OVAL, width, height);
    (oval.len() >= 3).then_some(oval)
}

/// Blur the face region and blend it back inside the oval.
pub fn smooth_skin(surface: &mut Surface, lm: &LandmarkSet, width: u32, height: u32, strength: f32) {
    let strength = strength.clamp(0., 1.);
    if strength <= 0. {
        return;
    }
    let Some(oval) = face_oval(lm, width, height) else {
        return;
    };
    let Some(bounds) = oval.bounds() else {
        return;
    };
    let Some((placed, region)) = surface.region(bounds.pad(4.)) else {
        return;
    };

    let blurred = gaussian_blur_f32(&region, 1. + 3. * strength);

    surface.save();
    surface.reset_transform();
    surface.clip(&oval.to_path(true));
    surface.set_alpha(strength);
    surface.draw_image(&blurred, placed);
    surface.restore();
}

/// Wash the face oval toward white.
pub fn brighten_face(surface: &mut Surface, lm: &LandmarkSet, width: u32, height: u32, amount: f32) {
    let amount = amount.clamp(0., 1.);
    if amount <= 0. {
        return;
    }
    let Some(oval) = face_oval(lm, width, height) else {
        return;
    };

    surface.save();
    surface.reset_transform();
    surface.clip(&oval.to_path(true));
    surface.set_alpha(amount * 0.5);
    surface.fill_all(WHITE);
    surface.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetCache;
    use crate::surface::rgb;
    use image::RgbaImage;

    #[test]
    fn test_seeded_is_stable() {
        assert_eq!(seeded(3, 7.), seeded(3, 7.));
        assert_ne!(seeded(3, 7.), seeded(4, 7.));
        for i in 0..50 {
            let v = seeded(i, 13.);
            assert!((0. ..1.).contains(&v));
        }
    }

    #[test]
    fn test_pulse_range() {
        for i in 0..100 {
            let p = pulse(i as f64 * 0.37, 3., 1.);
            assert!((0. ..=1.).contains(&p));
        }
    }

    #[test]
    fn test_star() {
        let pts = star(Point::new(0., 0.), 10., 5., 5, 0.);
        assert_eq!(pts.len(), 10);
        assert!((pts[0].x - 10.).abs() < 1e-4);
        assert!((pts[1].distance(&Point::new(0., 0.)) - 5.).abs() < 1e-4);
    }

    #[test]
    fn test_overlay_skipped_until_ready() {
        let assets = AssetCache::new("/nonexistent");
        assets.insert("/masks/x.png", RgbaImage::from_pixel(2, 2, rgb(255, 0, 0)));
        let mut surface = Surface::new(20, 20);
        let mut ctx = RenderContext {
            surface: &mut surface,
            assets: &assets,
            time: 0.,
        };
        assert!(!overlay(&mut ctx, "/masks/missing.png", Point::new(10., 10.), 8., 8., 1.));

        assert!(overlay(&mut ctx, "/masks/x.png", Point::new(10., 10.), 8., 8., 1.));
        assert_eq!(surface.image().get_pixel(10, 10), &rgb(255, 0, 0));
        assert_eq!(surface.image().get_pixel(1, 1)[3], 0);
    }

    #[test]
    fn test_beauty_stays_inside_oval() {
        let lm = LandmarkSet::from_box(&Rect::new(25., 25., 50., 50.));
        let base = RgbaImage::from_fn(40, 40, |x, _| if x % 2 == 0 { rgb(0, 0, 0) } else { rgb(200, 100, 50) });

        let mut surface = Surface::from_image(base.clone());
        brighten_face(&mut surface, &lm, 40, 40, 1.);
        assert_eq!(surface.image().get_pixel(1, 1), base.get_pixel(1, 1));
        assert_ne!(surface.image().get_pixel(20, 20), base.get_pixel(20, 20));

        let mut surface = Surface::from_image(base.clone());
        smooth_skin(&mut surface, &lm, 40, 40, 1.);
        assert_eq!(surface.image().get_pixel(1, 38), base.get_pixel(1, 38));
        assert_ne!(surface.image().get_pixel(20, 20), base.get_pixel(20, 20));
    }

    #[test]
    fn test_beauty_without_landmarks() {
        let mut surface = Surface::new(10, 10);
        smooth_skin(&mut surface, &LandmarkSet::empty(), 10, 10, 1.);
        brighten_face(&mut surface, &LandmarkSet::empty(), 10, 10, 1.);
        assert!(surface.image().pixels().all(|p| p[3] == 0));
    }
}
