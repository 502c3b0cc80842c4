#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Point {
        Point { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        self.lerp(other, 0.5)
    }

    pub fn lerp(&self, other: &Point, t: f32) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Point {
        Point {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Angle of the line from self to other, in radians.
    pub fn angle_to(&self, other: &Point) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    pub fn rotate(&mut self, origin: Point, theta: f32) -> Point {
        let x = self.x - origin.x;
        let y = self.y - origin.y;

        let (sin, cos) = theta.sin_cos();
        self.x = x * cos - y * sin + origin.x;
        self.y = x * sin + y * cos + origin.y;

        *self
    }
}

impl From<Point> for kurbo::Point {
    fn from(p: Point) -> kurbo::Point {
        kurbo::Point::new(p.x as f64, p.y as f64)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Point {
        Point { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_quarter_turn() {
        let mut p = Point::new(2., 1.);
        p.rotate(Point::new(1., 1.), std::f32::consts::FRAC_PI_2);
        assert!((p.x - 1.).abs() < 1e-5);
        assert!((p.y - 2.).abs() < 1e-5);
    }

    #[test]
    fn test_distance_and_midpoint() {
        let a = Point::new(0., 0.);
        let b = Point::new(3., 4.);
        assert_eq!(a.distance(&b), 5.);
        assert_eq!(a.midpoint(&b), Point::new(1.5, 2.));
    }
}
