use image::Rgba;
use kurbo::Point;
use vello_cpu::RenderContext;
use vello_cpu::peniko::color::DynamicColor;
use vello_cpu::peniko::{self, ColorStop, Gradient};

pub type Color = Rgba<u8>;

pub const TRANSPARENT: Color = rgba(0, 0, 0, 0);
pub const WHITE: Color = rgb(255, 255, 255);
pub const BLACK: Color = rgb(0, 0, 0);

pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Rgba([r, g, b, 255])
}

pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
    Rgba([r, g, b, a])
}

/// Replace the alpha channel with `a` in 0..1.
pub fn with_alpha(c: Color, a: f32) -> Color {
    Rgba([c[0], c[1], c[2], unit_to_u8(a)])
}

/// Hue in degrees, saturation/lightness/alpha in 0..1.
pub fn hsla(h: f32, s: f32, l: f32, a: f32) -> Color {
    let h = h.rem_euclid(360.) / 60.;
    let c = (1. - (2. * l - 1.).abs()) * s;
    let x = c * (1. - (h % 2. - 1.).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.),
        1 => (x, c, 0.),
        2 => (0., c, x),
        3 => (0., x, c),
        4 => (x, 0., c),
        _ => (c, 0., x),
    };
    let m = l - c / 2.;

    Rgba([
        unit_to_u8(r + m),
        unit_to_u8(g + m),
        unit_to_u8(b + m),
        unit_to_u8(a),
    ])
}

pub fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0., 1.) * 255.).round() as u8
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stop {
    pub offset: f32,
    pub color: Color,
}

pub const fn stop(offset: f32, color: Color) -> Stop {
    Stop { offset, color }
}

/// Gradient geometry is in user space and follows the surface transform.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    Linear {
        start: Point,
        end: Point,
        stops: Vec<Stop>,
    },
    /// Concentric radial gradient; `inner` is where offset 0 sits.
    Radial {
        center: Point,
        inner: f64,
        outer: f64,
        stops: Vec<Stop>,
    },
}

impl From<Color> for Paint {
    fn from(c: Color) -> Paint {
        Paint::Solid(c)
    }
}

impl Paint {
    pub fn linear(start: impl Into<Point>, end: impl Into<Point>, stops: &[Stop]) -> Paint {
        Paint::Linear {
            start: start.into(),
            end: end.into(),
            stops: stops.to_vec(),
        }
    }

    pub fn radial(center: impl Into<Point>, inner: f64, outer: f64, stops: &[Stop]) -> Paint {
        Paint::Radial {
            center: center.into(),
            inner,
            outer,
            stops: stops.to_vec(),
        }
    }

    /// Collapse gradients that cannot be rasterized: no stops draws nothing,
    /// one stop or zero-length geometry becomes a solid color.
    pub fn normalized(&self) -> Option<Paint> {
        match self {
            Paint::Solid(c) => Some(Paint::Solid(*c)),
            Paint::Linear { start, end, stops } => match stops.as_slice() {
                [] => None,
                [only] => Some(Paint::Solid(only.color)),
                [first, ..] if start.distance(*end) < 1e-6 => Some(Paint::Solid(first.color)),
                _ => Some(self.clone()),
            },
            Paint::Radial {
                inner,
                outer,
                stops,
                ..
            } => match stops.as_slice() {
                [] => None,
                [only] => Some(Paint::Solid(only.color)),
                [.., last] if outer - inner <= 1e-6 => Some(Paint::Solid(last.color)),
                _ => Some(self.clone()),
            },
        }
    }
}

pub(super) fn to_cpu_color(c: Color) -> peniko::Color {
    peniko::Color::from_rgba8(c[0], c[1], c[2], c[3])
}

fn to_cpu_stops(stops: &[Stop]) -> Vec<ColorStop> {
    stops
        .iter()
        .map(|s| ColorStop {
            offset: s.offset.clamp(0., 1.),
            color: DynamicColor::from_alpha_color(to_cpu_color(s.color)),
        })
        .collect()
}

/// Set `paint` as the context's current paint. Expects a normalized paint.
pub(super) fn set_paint(ctx: &mut RenderContext, paint: &Paint) {
    match paint {
        Paint::Solid(c) => ctx.set_paint(to_cpu_color(*c)),
        Paint::Linear { start, end, stops } => {
            let gradient = Gradient::new_linear((start.x, start.y), (end.x, end.y))
                .with_stops(to_cpu_stops(stops).as_slice());
            ctx.set_paint(gradient);
        }
        Paint::Radial {
            center,
            inner,
            outer,
            stops,
        } => {
            let c = (center.x, center.y);
            let gradient = if *inner > 0. {
                Gradient::new_two_point_radial(c, *inner as f32, c, *outer as f32)
            } else {
                Gradient::new_radial(c, *outer as f32)
            };
            ctx.set_paint(gradient.with_stops(to_cpu_stops(stops).as_slice()));
        }
    }
}
