use super::point::Point;
use super::rect::Rect;
use kurbo::BezPath;

#[derive(Debug, Clone, Default)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn bounds(&self) -> Option<Rect> {
        let first = self.points.first()?;
        let (mut min, mut max) = (*first, *first);
        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }

        Some(Rect::from_corners(min, max))
    }

    pub fn center(&self) -> Option<Point> {
        self.bounds().map(|b| b.center())
    }

    /// Mean of all points, as opposed to the bounding box center.
    pub fn centroid(&self) -> Option<Point> {
        if self.points.is_empty() {
            return None;
        }

        let n = self.points.len() as f32;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0., 0.), |(sx, sy), p| (sx + p.x, sy + p.y));

        Some(Point::new(sx / n, sy / n))
    }

    /// Scale each point away from the bounds center.
    pub fn stretch(&mut self, mag_x: f32, mag_y: f32) -> &mut Self {
        if let Some(center) = self.center() {
            for p in self.points.iter_mut() {
                p.x = center.x + (p.x - center.x) * mag_x;
                p.y = center.y + (p.y - center.y) * mag_y;
            }
        }

        self
    }

    pub fn to_path(&self, closed: bool) -> BezPath {
        let mut path = BezPath::new();
        let mut iter = self.points.iter();
        if let Some(first) = iter.next() {
            path.move_to(*first);
            for p in iter {
                path.line_to(*p);
            }
            if closed {
                path.close_path();
            }
        }

        path
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Polygon {
        Polygon::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_and_centroid() {
        let poly = Polygon::new(vec![
            Point::new(0., 0.),
            Point::new(4., 0.),
            Point::new(4., 2.),
            Point::new(0., 2.),
        ]);
        assert_eq!(poly.bounds(), Some(Rect::new(0., 0., 4., 2.)));
        assert_eq!(poly.centroid(), Some(Point::new(2., 1.)));
    }

    #[test]
    fn test_empty_polygon_has_no_bounds() {
        let poly = Polygon::default();
        assert!(poly.bounds().is_none());
        assert!(poly.centroid().is_none());
        assert!(poly.to_path(true).elements().is_empty());
    }

    #[test]
    fn test_stretch() {
        let mut poly = Polygon::new(vec![Point::new(0., 0.), Point::new(2., 2.)]);
        poly.stretch(2., 1.);
        assert_eq!(poly.points[0], Point::new(-1., 0.));
        assert_eq!(poly.points[1], Point::new(3., 2.));
    }
}
