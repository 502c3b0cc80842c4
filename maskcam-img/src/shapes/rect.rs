use super::point::Point;

/// Axis aligned rectangle anchored at its top-left corner. Used both in
/// pixel space and in percentage-of-frame space (0..100).
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect { x, y, w, h }
    }

    pub fn from_center(center: Point, w: f32, h: f32) -> Rect {
        Rect {
            x: center.x - w / 2.,
            y: center.y - h / 2.,
            w,
            h,
        }
    }

    pub fn from_corners(min: Point, max: Point) -> Rect {
        Rect {
            x: min.x,
            y: min.y,
            w: max.x - min.x,
            h: max.y - min.y,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }
    pub fn right(&self) -> f32 {
        self.x + self.w
    }
    pub fn top(&self) -> f32 {
        self.y
    }
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.w / 2.,
            y: self.y + self.h / 2.,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.w > 0. && self.h > 0.) || !self.w.is_finite() || !self.h.is_finite()
    }

    pub fn pad(&self, amount: f32) -> Rect {
        Rect {
            x: self.x - amount,
            y: self.y - amount,
            w: self.w + amount * 2.,
            h: self.h + amount * 2.,
        }
    }

    /// Grow or shrink around the center.
    pub fn scale(&self, mag_x: f32, mag_y: f32) -> Rect {
        Rect::from_center(self.center(), self.w * mag_x, self.h * mag_y)
    }

    pub fn clamp(&self, max_w: f32, max_h: f32) -> Rect {
        let left = self.left().clamp(0., max_w);
        let top = self.top().clamp(0., max_h);
        let right = self.right().clamp(0., max_w);
        let bottom = self.bottom().clamp(0., max_h);

        Rect::new(left, top, (right - left).max(0.), (bottom - top).max(0.))
    }

    /// Convert a pixel rect into percentage-of-frame units.
    pub fn to_pct(&self, frame_w: f32, frame_h: f32) -> Rect {
        Rect {
            x: self.x / frame_w * 100.,
            y: self.y / frame_h * 100.,
            w: self.w / frame_w * 100.,
            h: self.h / frame_h * 100.,
        }
    }

    pub fn to_px(&self, frame_w: f32, frame_h: f32) -> Rect {
        Rect {
            x: self.x / 100. * frame_w,
            y: self.y / 100. * frame_h,
            w: self.w / 100. * frame_w,
            h: self.h / 100. * frame_h,
        }
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Intersection over union, as a percentage.
    pub fn overlap_pct(&self, other: &Rect) -> f32 {
        let x_min = self.left().max(other.left());
        let x_max = self.right().min(other.right());
        let y_min = self.top().max(other.top());
        let y_max = self.bottom().min(other.bottom());

        let overlap_area = if x_min < x_max && y_min < y_max {
            (x_max - x_min) * (y_max - y_min)
        } else {
            0.
        };

        let area_delta = self.area() + other.area() - overlap_area;

        if area_delta > 0. {
            overlap_area / area_delta * 100.
        } else {
            0.
        }
    }
}

impl From<Rect> for kurbo::Rect {
    fn from(r: Rect) -> kurbo::Rect {
        kurbo::Rect::new(
            r.left() as f64,
            r.top() as f64,
            r.right() as f64,
            r.bottom() as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_pct() {
        let a = Rect::new(0., 0., 10., 10.);
        assert_eq!(a.overlap_pct(&a), 100.);
        assert_eq!(a.overlap_pct(&Rect::new(20., 20., 5., 5.)), 0.);

        let half = Rect::new(5., 0., 10., 10.);
        let pct = a.overlap_pct(&half);
        assert!((pct - 100. / 3.).abs() < 0.01);
    }

    #[test]
    fn test_clamp_to_frame() {
        let r = Rect::new(-10., 5., 50., 200.).clamp(30., 100.);
        assert_eq!(r, Rect::new(0., 5., 30., 95.));
    }

    #[test]
    fn test_pct_px_conversion() {
        let px = Rect::new(160., 120., 320., 240.);
        let pct = px.to_pct(640., 480.);
        assert_eq!(pct, Rect::new(25., 25., 50., 50.));
        assert_eq!(pct.to_px(640., 480.), px);
    }

    #[test]
    fn test_degenerate() {
        assert!(Rect::new(1., 1., 0., 10.).is_degenerate());
        assert!(Rect::new(1., 1., f32::NAN, 10.).is_degenerate());
        assert!(!Rect::new(1., 1., 1., 1.).is_degenerate());
    }
}
