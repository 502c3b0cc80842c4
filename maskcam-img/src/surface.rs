//! Raster drawing surface the compositor owns and renderers draw on.
//!
//! Vector drawing is recorded into a `vello_cpu` render context and
//! composited over the frame on `flush`. Anything that reads or writes
//! pixels directly flushes first, so draws and pixel access interleave in
//! call order.

use image::{GenericImageView, Rgba, RgbaImage, imageops};
use kurbo::{Affine, BezPath, PathEl, Shape};
use std::sync::Arc;
use vello_cpu::peniko::color::PremulRgba8;
use vello_cpu::peniko::ImageSampler;
use vello_cpu::{ImageSource, Pixmap, RenderContext, kurbo as vk};

pub mod paint;

pub use paint::{BLACK, Color, Paint, Stop, TRANSPARENT, WHITE, hsla, rgb, rgba, stop, with_alpha};

use crate::shapes::{Point, Rect};

const TOLERANCE: f64 = 0.1;
// (spread, strength) of the halo passes drawn under a glowing shape
const GLOW_PASSES: [(f64, f32); 2] = [(1.0, 0.12), (0.5, 0.22)];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub color: Color,
    pub radius: f32,
}

#[derive(Debug, Clone)]
struct DrawState {
    transform: Affine,
    alpha: f32,
    glow: Option<Glow>,
    dash: Option<(f64, f64)>,
    // device space, outermost first
    clips: Vec<Arc<vk::BezPath>>,
}

impl Default for DrawState {
    fn default() -> Self {
        DrawState {
            transform: Affine::IDENTITY,
            alpha: 1.,
            glow: None,
            dash: None,
            clips: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Fill,
    Stroke(f64),
}

pub struct Surface {
    image: RgbaImage,
    ctx: RenderContext,
    layer: Pixmap,
    state: DrawState,
    stack: Vec<DrawState>,
    // clip layers currently pushed on `ctx`
    open: Vec<Arc<vk::BezPath>>,
    dirty: bool,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Surface {
        Surface::from_image(RgbaImage::new(width, height))
    }

    pub fn from_image(image: RgbaImage) -> Surface {
        let (w, h) = canvas_size(image.width(), image.height());
        Surface {
            image,
            ctx: RenderContext::new(w, h),
            layer: Pixmap::new(w, h),
            state: DrawState::default(),
            stack: Vec::new(),
            open: Vec::new(),
            dirty: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Reallocate the backing image. Contents and drawing state are reset.
    pub fn resize(&mut self, width: u32, height: u32) {
        *self = Surface::new(width, height);
    }

    pub fn image(&mut self) -> &RgbaImage {
        self.flush();
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        self.flush();
        &mut self.image
    }

    pub fn snapshot(&mut self) -> RgbaImage {
        self.flush();
        self.image.clone()
    }

    /// Composite everything drawn since the last flush onto the image.
    pub fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        for _ in self.open.drain(..) {
            self.ctx.pop_layer();
        }

        self.ctx.flush();
        self.layer.data_as_u8_slice_mut().fill(0);
        self.ctx.render_to_pixmap(&mut self.layer);
        composite_over(&mut self.image, &self.layer);

        self.ctx.reset();
        self.dirty = false;
    }

    /// Replace the contents with a video frame, scaling it if needed.
    pub fn draw_frame(&mut self, frame: &RgbaImage) {
        self.discard();
        if frame.dimensions() == self.image.dimensions() {
            self.image.copy_from_slice(frame.as_raw());
        } else {
            self.image = imageops::resize(
                frame,
                self.image.width(),
                self.image.height(),
                imageops::FilterType::Triangle,
            );
        }
    }

    pub fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    /// Drop the state stack and anything drawn but not yet flushed.
    pub fn reset_state(&mut self) {
        self.state = DrawState::default();
        self.stack.clear();
        self.discard();
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.state.transform = self.state.transform * Affine::translate((dx, dy));
    }

    pub fn rotate(&mut self, theta: f64) {
        self.state.transform = self.state.transform * Affine::rotate(theta);
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.state.transform = self.state.transform * Affine::scale_non_uniform(sx, sy);
    }

    pub fn reset_transform(&mut self) {
        self.state.transform = Affine::IDENTITY;
    }

    pub fn transform(&self) -> Affine {
        self.state.transform
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0., 1.);
    }

    pub fn alpha(&self) -> f32 {
        self.state.alpha
    }

    pub fn set_glow(&mut self, color: Color, radius: f32) {
        self.state.glow = (radius > 0.).then_some(Glow { color, radius });
    }

    pub fn clear_glow(&mut self) {
        self.state.glow = None;
    }

    pub fn set_dash(&mut self, on: f64, off: f64) {
        self.state.dash = (on > 0. && off > 0.).then_some((on, off));
    }

    pub fn clear_dash(&mut self) {
        self.state.dash = None;
    }

    /// Intersect the clip region with a shape. Lasts until `restore`.
    pub fn clip(&mut self, shape: &impl Shape) {
        let path = self.state.transform * shape.to_path(TOLERANCE);
        self.state.clips.push(Arc::new(to_cpu_path(&path)));
    }

    pub fn fill(&mut self, shape: &impl Shape, paint: impl Into<Paint>) {
        self.draw(shape.to_path(TOLERANCE), &paint.into(), Mode::Fill);
    }

    pub fn stroke(&mut self, shape: &impl Shape, paint: impl Into<Paint>, width: f64) {
        self.draw(shape.to_path(TOLERANCE), &paint.into(), Mode::Stroke(width));
    }

    pub fn fill_circle(&mut self, center: Point, radius: f32, paint: impl Into<Paint>) {
        if radius > 0. {
            self.fill(&kurbo::Circle::new(center, radius as f64), paint);
        }
    }

    pub fn stroke_circle(&mut self, center: Point, radius: f32, paint: impl Into<Paint>, width: f32) {
        if radius > 0. {
            self.stroke(&kurbo::Circle::new(center, radius as f64), paint, width as f64);
        }
    }

    pub fn fill_ellipse(
        &mut self,
        center: Point,
        rx: f32,
        ry: f32,
        rotation: f32,
        paint: impl Into<Paint>,
    ) {
        if rx > 0. && ry > 0. {
            let ellipse = kurbo::Ellipse::new(center, (rx as f64, ry as f64), rotation as f64);
            self.fill(&ellipse, paint);
        }
    }

    pub fn stroke_ellipse(
        &mut self,
        center: Point,
        rx: f32,
        ry: f32,
        rotation: f32,
        paint: impl Into<Paint>,
        width: f32,
    ) {
        if rx > 0. && ry > 0. {
            let ellipse = kurbo::Ellipse::new(center, (rx as f64, ry as f64), rotation as f64);
            self.stroke(&ellipse, paint, width as f64);
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, paint: impl Into<Paint>) {
        if !rect.is_degenerate() {
            self.fill(&kurbo::Rect::from(rect), paint);
        }
    }

    pub fn fill_polygon(&mut self, points: &[Point], paint: impl Into<Paint>) {
        if points.len() >= 3 {
            self.fill(&polyline(points, true), paint);
        }
    }

    pub fn stroke_polyline(
        &mut self,
        points: &[Point],
        closed: bool,
        paint: impl Into<Paint>,
        width: f32,
    ) {
        if points.len() >= 2 {
            self.stroke(&polyline(points, closed), paint, width as f64);
        }
    }

    pub fn line(&mut self, a: Point, b: Point, paint: impl Into<Paint>, width: f32) {
        self.stroke(&kurbo::Line::new(a, b), paint, width as f64);
    }

    /// Paint the whole surface, ignoring the transform but honoring clip and alpha.
    pub fn fill_all(&mut self, paint: impl Into<Paint>) {
        let (w, h) = self.dimensions();
        let saved = self.state.transform;
        self.state.transform = Affine::IDENTITY;
        self.fill(&kurbo::Rect::new(0., 0., w as f64, h as f64), paint);
        self.state.transform = saved;
    }

    /// Paint a device-space block with a solid color. Honors clip and alpha.
    pub fn fill_block(&mut self, x: u32, y: u32, w: u32, h: u32, color: Color) {
        let saved = (self.state.transform, self.state.glow.take());
        self.state.transform = Affine::IDENTITY;
        self.fill_rect(Rect::new(x as f32, y as f32, w as f32, h as f32), color);
        (self.state.transform, self.state.glow) = saved;
    }

    /// Average color of a device-space block, `None` when it falls outside.
    pub fn block_average(&mut self, x: u32, y: u32, w: u32, h: u32) -> Option<Color> {
        self.flush();
        let (sw, sh) = self.dimensions();
        let x1 = x.saturating_add(w).min(sw);
        let y1 = y.saturating_add(h).min(sh);
        if x >= x1 || y >= y1 {
            return None;
        }

        let mut sum = [0u64; 4];
        for py in y..y1 {
            for px in x..x1 {
                let p = self.image.get_pixel(px, py);
                for (s, c) in sum.iter_mut().zip(p.0) {
                    *s += c as u64;
                }
            }
        }
        let n = ((x1 - x) * (y1 - y)) as u64;

        Some(Rgba(sum.map(|s| (s / n) as u8)))
    }

    /// Copy of a device-space region, clamped to the surface.
    pub fn region(&mut self, rect: Rect) -> Option<(Rect, RgbaImage)> {
        self.flush();
        let r = rect.clamp(self.width() as f32, self.height() as f32);
        let (x, y) = (r.x.floor() as u32, r.y.floor() as u32);
        let (w, h) = (r.w.ceil() as u32, r.h.ceil() as u32);
        if w == 0 || h == 0 {
            return None;
        }
        let view = self.image.view(x, y, w.min(self.width() - x), h.min(self.height() - y));
        let img = view.to_image();
        let placed = Rect::new(x as f32, y as f32, img.width() as f32, img.height() as f32);

        Some((placed, img))
    }

    /// Draw an image stretched into `dest` (user space, so the current
    /// transform may rotate or scale it).
    pub fn draw_image(&mut self, img: &RgbaImage, dest: Rect) {
        if !self.begin() || dest.is_degenerate() {
            return;
        }
        let (Ok(w), Ok(h)) = (u16::try_from(img.width()), u16::try_from(img.height())) else {
            return;
        };
        if w == 0 || h == 0 {
            return;
        }

        let pixels = img.pixels().map(premultiply).collect();
        let pixmap = Pixmap::from_parts_with_opacity(pixels, w, h, true);
        let paint = vello_cpu::Image {
            image: ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: ImageSampler::default(),
        };
        let placement = self.state.transform
            * Affine::translate((dest.x as f64, dest.y as f64))
            * Affine::scale_non_uniform(
                dest.w as f64 / img.width() as f64,
                dest.h as f64 / img.height() as f64,
            );

        let alpha = self.state.alpha;
        self.ctx.set_transform(to_cpu_affine(placement));
        with_opacity(&mut self.ctx, alpha, |ctx| {
            ctx.set_paint(paint);
            ctx.fill_rect(&vk::Rect::new(0., 0., w as f64, h as f64));
        });
    }

    /// Ready the context for a draw. False when nothing would be visible.
    fn begin(&mut self) -> bool {
        if self.image.width() == 0 || self.image.height() == 0 || self.state.alpha <= 0. {
            return false;
        }

        let keep = self
            .open
            .iter()
            .zip(&self.state.clips)
            .take_while(|(a, b)| Arc::ptr_eq(a, b))
            .count();
        while self.open.len() > keep {
            self.ctx.pop_layer();
            self.open.pop();
        }
        if self.state.clips.len() > keep {
            self.ctx.set_transform(vk::Affine::IDENTITY);
            for clip in &self.state.clips[keep..] {
                self.ctx.push_clip_layer(clip);
                self.open.push(clip.clone());
            }
        }

        self.dirty = true;
        true
    }

    fn draw(&mut self, path: BezPath, paint: &Paint, mode: Mode) {
        let Some(paint) = paint.normalized() else {
            return;
        };
        if !is_finite(&path) || !self.begin() {
            return;
        }

        let path = to_cpu_path(&path);
        let alpha = self.state.alpha;
        self.ctx.set_transform(to_cpu_affine(self.state.transform));

        if let Some(glow) = self.state.glow {
            let base = match mode {
                Mode::Fill => 0.,
                Mode::Stroke(w) => w,
            };
            for (spread, strength) in GLOW_PASSES {
                let width = base + glow.radius as f64 * 2. * spread;
                let style = self.stroke_style(width, matches!(mode, Mode::Stroke(_)));
                with_opacity(&mut self.ctx, alpha * strength, |ctx| {
                    ctx.set_stroke(style);
                    ctx.set_paint(paint::to_cpu_color(glow.color));
                    ctx.stroke_path(&path);
                });
            }
        }

        let style = match mode {
            Mode::Stroke(w) => Some(self.stroke_style(w, true)),
            Mode::Fill => None,
        };
        with_opacity(&mut self.ctx, alpha, |ctx| {
            paint::set_paint(ctx, &paint);
            match style {
                Some(style) => {
                    ctx.set_stroke(style);
                    ctx.stroke_path(&path);
                }
                None => ctx.fill_path(&path),
            }
        });
    }

    fn stroke_style(&self, width: f64, dashed: bool) -> vk::Stroke {
        let stroke = vk::Stroke::new(width.max(0.))
            .with_caps(vk::Cap::Round)
            .with_join(vk::Join::Round);
        match self.state.dash {
            Some((on, off)) if dashed => stroke.with_dashes(0., [on, off]),
            _ => stroke,
        }
    }

    fn discard(&mut self) {
        if self.dirty || !self.open.is_empty() {
            self.ctx.reset();
            self.open.clear();
            self.dirty = false;
        }
    }
}

fn canvas_size(width: u32, height: u32) -> (u16, u16) {
    let dim = |v: u32| v.clamp(1, u16::MAX as u32) as u16;
    (dim(width), dim(height))
}

fn with_opacity(ctx: &mut RenderContext, alpha: f32, draw: impl FnOnce(&mut RenderContext)) {
    if alpha <= 0. {
        return;
    }
    let layered = alpha < 1.;
    if layered {
        ctx.push_opacity_layer(alpha);
    }
    draw(ctx);
    if layered {
        ctx.pop_layer();
    }
}

fn polyline(points: &[Point], closed: bool) -> BezPath {
    crate::shapes::Polygon::new(points.to_vec()).to_path(closed)
}

fn is_finite(path: &BezPath) -> bool {
    path.elements().iter().all(|el| match *el {
        PathEl::MoveTo(p) | PathEl::LineTo(p) => p.is_finite(),
        PathEl::QuadTo(a, b) => a.is_finite() && b.is_finite(),
        PathEl::CurveTo(a, b, c) => a.is_finite() && b.is_finite() && c.is_finite(),
        PathEl::ClosePath => true,
    })
}

fn to_cpu_affine(a: Affine) -> vk::Affine {
    vk::Affine::new(a.as_coeffs())
}

fn to_cpu_path(path: &BezPath) -> vk::BezPath {
    let pt = |p: kurbo::Point| vk::Point::new(p.x, p.y);
    let mut out = vk::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(a, b) => out.quad_to(pt(a), pt(b)),
            PathEl::CurveTo(a, b, c) => out.curve_to(pt(a), pt(b), pt(c)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn premultiply(p: &Rgba<u8>) -> PremulRgba8 {
    let [r, g, b, a] = p.0;
    let mul = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
    PremulRgba8::from_u8_array([mul(r), mul(g), mul(b), a])
}

/// Source-over of a premultiplied layer onto a straight-alpha image.
fn composite_over(dst: &mut RgbaImage, layer: &Pixmap) {
    let stride = layer.width() as usize * 4;
    let src = layer.data_as_u8_slice();
    let (lw, lh) = (layer.width() as u32, layer.height() as u32);

    for (x, y, d) in dst.enumerate_pixels_mut() {
        if x >= lw || y >= lh {
            continue;
        }
        let i = y as usize * stride + x as usize * 4;
        let s = &src[i..i + 4];
        let sa = s[3] as u32;
        if sa == 0 {
            continue;
        }

        let inv = 255 - sa;
        let da = div255(d[3] as u32 * inv);
        let oa = sa + da;
        for c in 0..3 {
            let premul = s[c] as u32 + div255(d[c] as u32 * da);
            d[c] = ((premul * 255 + oa / 2) / oa).min(255) as u8;
        }
        d[3] = oa.min(255) as u8;
    }
}

fn div255(v: u32) -> u32 {
    (v + 127) / 255
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(w: u32, h: u32, c: Color) -> Surface {
        Surface::from_image(RgbaImage::from_pixel(w, h, c))
    }

    #[test]
    fn test_fill_rect_covers_interior_only() {
        let mut s = opaque(20, 20, paint::BLACK);
        s.fill_rect(Rect::new(5., 5., 10., 10.), paint::WHITE);
        assert_eq!(*s.image().get_pixel(10, 10), paint::WHITE);
        assert_eq!(*s.image().get_pixel(1, 1), paint::BLACK);
        assert_eq!(*s.image().get_pixel(18, 18), paint::BLACK);
    }

    #[test]
    fn test_circle_edges_are_antialiased() {
        let mut s = opaque(64, 64, paint::BLACK);
        s.fill_circle(Point::new(32.3, 31.7), 20.4, paint::WHITE);

        let img = s.image();
        assert_eq!(*img.get_pixel(32, 32), paint::WHITE);
        assert_eq!(*img.get_pixel(2, 2), paint::BLACK);
        let partial = img.pixels().filter(|p| p[0] > 0 && p[0] < 255).count();
        assert!(partial > 20, "{partial} partially covered pixels");
    }

    #[test]
    fn test_alpha_blends_half() {
        let mut s = opaque(4, 4, paint::BLACK);
        s.set_alpha(0.5);
        s.fill_all(paint::WHITE);
        let p = s.image().get_pixel(2, 2);
        assert!(p[0] >= 125 && p[0] <= 130, "{p:?}");
        assert_eq!(p[3], 255);
    }

    #[test]
    fn test_draws_onto_transparent_image() {
        let mut s = Surface::new(8, 8);
        s.fill_rect(Rect::new(0., 0., 4., 8.), rgb(255, 0, 0));
        assert_eq!(*s.image().get_pixel(1, 1), rgb(255, 0, 0));
        assert_eq!(s.image().get_pixel(6, 1)[3], 0);
    }

    #[test]
    fn test_save_restore_clip() {
        let mut s = opaque(20, 20, paint::BLACK);
        s.save();
        s.clip(&kurbo::Rect::new(0., 0., 10., 20.));
        s.fill_all(paint::WHITE);
        s.restore();
        assert_eq!(*s.image().get_pixel(5, 5), paint::WHITE);
        assert_eq!(*s.image().get_pixel(15, 5), paint::BLACK);

        s.fill_all(rgb(255, 0, 0));
        assert_eq!(*s.image().get_pixel(15, 5), rgb(255, 0, 0));
    }

    #[test]
    fn test_clip_survives_pixel_reads() {
        let mut s = opaque(20, 20, paint::BLACK);
        s.save();
        s.clip(&kurbo::Rect::new(0., 0., 10., 20.));
        s.fill_rect(Rect::new(0., 0., 20., 5.), paint::WHITE);
        assert!(s.block_average(0, 0, 4, 4).is_some());
        s.fill_rect(Rect::new(0., 10., 20., 5.), paint::WHITE);
        s.restore();

        let img = s.image();
        assert_eq!(*img.get_pixel(5, 2), paint::WHITE);
        assert_eq!(*img.get_pixel(15, 2), paint::BLACK);
        assert_eq!(*img.get_pixel(5, 12), paint::WHITE);
        assert_eq!(*img.get_pixel(15, 12), paint::BLACK);
    }

    #[test]
    fn test_transform_moves_geometry() {
        let mut s = opaque(20, 20, paint::BLACK);
        s.save();
        s.translate(10., 10.);
        s.fill_rect(Rect::new(0., 0., 5., 5.), paint::WHITE);
        s.restore();
        assert_eq!(*s.image().get_pixel(12, 12), paint::WHITE);
        assert_eq!(*s.image().get_pixel(2, 2), paint::BLACK);
    }

    #[test]
    fn test_stroke_leaves_center_untouched() {
        let mut s = opaque(40, 40, paint::BLACK);
        s.stroke_circle(Point::new(20., 20.), 15., paint::WHITE, 3.);
        assert_eq!(*s.image().get_pixel(20, 20), paint::BLACK);
        assert_eq!(*s.image().get_pixel(35, 20), paint::WHITE);
    }

    #[test]
    fn test_dashed_stroke_has_gaps() {
        let mut s = opaque(40, 10, paint::BLACK);
        s.set_dash(4., 6.);
        s.line(Point::new(0., 5.), Point::new(40., 5.), paint::WHITE, 2.);

        let img = s.image();
        let lit = (0..40).filter(|&x| img.get_pixel(x, 5)[0] > 128).count();
        assert!((12..=30).contains(&lit), "{lit} lit pixels");
        assert_eq!(*img.get_pixel(2, 5), paint::WHITE);
        assert!(img.get_pixel(7, 5)[0] < 50);
    }

    #[test]
    fn test_glow_reaches_past_shape() {
        let mut s = opaque(40, 40, paint::BLACK);
        s.set_glow(rgb(0, 0, 255), 4.);
        s.fill_rect(Rect::new(15., 15., 10., 10.), paint::WHITE);

        let img = s.image();
        assert_eq!(*img.get_pixel(20, 20), paint::WHITE);
        assert!(img.get_pixel(20, 12)[2] > 0);
        assert_eq!(*img.get_pixel(2, 2), paint::BLACK);
    }

    #[test]
    fn test_gradient_fill() {
        let mut s = opaque(20, 4, paint::BLACK);
        s.fill_all(Paint::linear(
            (0., 0.),
            (20., 0.),
            &[stop(0., rgb(0, 0, 0)), stop(1., rgb(255, 0, 0))],
        ));
        let img = s.image();
        assert!(img.get_pixel(2, 1)[0] < img.get_pixel(10, 1)[0]);
        assert!(img.get_pixel(10, 1)[0] < img.get_pixel(18, 1)[0]);
    }

    #[test]
    fn test_degenerate_geometry_is_ignored() {
        let mut s = opaque(10, 10, paint::BLACK);
        let before = s.snapshot();
        s.fill_polygon(&[Point::new(1., 1.), Point::new(1., 1.)], paint::WHITE);
        s.fill_circle(Point::new(5., 5.), 0., paint::WHITE);
        s.fill_rect(Rect::new(2., 2., 0., 0.), paint::WHITE);
        s.fill_polygon(
            &[Point::new(3., 3.), Point::new(3., 3.), Point::new(3., 3.)],
            paint::WHITE,
        );
        s.line(Point::new(f32::NAN, 0.), Point::new(4., 4.), paint::WHITE, 4.);
        s.fill_circle(Point::new(500., 500.), 3., paint::WHITE);
        assert_eq!(s.image(), &before);
    }

    #[test]
    fn test_empty_surface_draws_nothing() {
        let mut s = Surface::new(0, 0);
        s.fill_all(paint::WHITE);
        s.fill_circle(Point::new(1., 1.), 3., paint::WHITE);
        assert_eq!(s.image().dimensions(), (0, 0));
    }

    #[test]
    fn test_reset_state_discards_pending() {
        let mut s = opaque(10, 10, paint::BLACK);
        s.save();
        s.set_alpha(0.3);
        s.fill_all(paint::WHITE);
        s.reset_state();
        assert_eq!(s.alpha(), 1.);
        assert_eq!(*s.image().get_pixel(5, 5), paint::BLACK);
    }

    #[test]
    fn test_block_average() {
        let mut s = opaque(4, 2, paint::BLACK);
        s.image_mut().put_pixel(0, 0, paint::WHITE);
        s.image_mut().put_pixel(1, 0, paint::WHITE);
        let avg = s.block_average(0, 0, 2, 2).unwrap();
        assert_eq!(avg, rgb(127, 127, 127));
        assert!(s.block_average(4, 0, 2, 2).is_none());
    }

    #[test]
    fn test_draw_image_scales_into_dest() {
        let mut s = opaque(20, 20, paint::BLACK);
        let img = RgbaImage::from_pixel(2, 2, rgb(0, 255, 0));
        s.draw_image(&img, Rect::new(10., 10., 10., 10.));
        assert_eq!(*s.image().get_pixel(15, 15), rgb(0, 255, 0));
        assert_eq!(*s.image().get_pixel(5, 5), paint::BLACK);
    }
}
