//! Color/look filters applied to the whole frame before masks are drawn.
//!
//! Each look maps to a filter-graph string in the CSS filter syntax, which
//! is parsed into a list of ops and run over the frame. Beauty toggles
//! append their own ops to the same graph.

use crate::error::FilterParseError;
use image::RgbaImage;
use imageproc::filter::gaussian_blur_f32;
use std::fmt;
use std::str::FromStr;
use tracing::{Level, span};

pub const SMOOTH_GRAPH: &str = "blur(0.5px) contrast(1.05)";
pub const BRIGHTEN_GRAPH: &str = "brightness(1.15) saturate(1.05)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LookFilter {
    #[default]
    Normal,
    Sepia,
    Bw,
    Neon,
    Vintage,
    Blur,
}

impl LookFilter {
    pub const ALL: [LookFilter; 6] = [
        LookFilter::Normal,
        LookFilter::Sepia,
        LookFilter::Bw,
        LookFilter::Neon,
        LookFilter::Vintage,
        LookFilter::Blur,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            LookFilter::Normal => "normal",
            LookFilter::Sepia => "sepia",
            LookFilter::Bw => "bw",
            LookFilter::Neon => "neon",
            LookFilter::Vintage => "vintage",
            LookFilter::Blur => "blur",
        }
    }

    pub fn graph(&self) -> &'static str {
        match self {
            LookFilter::Normal => "none",
            LookFilter::Sepia => "sepia(0.8) saturate(1.2)",
            LookFilter::Bw => "grayscale(1)",
            LookFilter::Neon => "saturate(2.5) contrast(1.3) hue-rotate(30deg)",
            LookFilter::Vintage => "sepia(0.4) saturate(0.8) contrast(1.1) brightness(0.95)",
            LookFilter::Blur => "blur(2px)",
        }
    }
}

impl FromStr for LookFilter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LookFilter::ALL
            .into_iter()
            .find(|f| f.id() == s)
            .ok_or_else(|| FilterParseError::UnknownFunction(s.to_string()))
    }
}

/// Combine the active look with the beauty toggles into one graph string.
/// Nothing active yields `none`.
pub fn filter_graph(look: Option<LookFilter>, smooth: bool, brighten: bool) -> String {
    let mut parts = Vec::new();
    if let Some(look) = look {
        if look != LookFilter::Normal {
            parts.push(look.graph());
        }
    }
    if smooth {
        parts.push(SMOOTH_GRAPH);
    }
    if brighten {
        parts.push(BRIGHTEN_GRAPH);
    }

    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    Sepia(f32),
    Grayscale(f32),
    Saturate(f32),
    Contrast(f32),
    Brightness(f32),
    /// Degrees.
    HueRotate(f32),
    /// Standard deviation in pixels.
    Blur(f32),
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOp::Sepia(v) => write!(f, "sepia({v})"),
            FilterOp::Grayscale(v) => write!(f, "grayscale({v})"),
            FilterOp::Saturate(v) => write!(f, "saturate({v})"),
            FilterOp::Contrast(v) => write!(f, "contrast({v})"),
            FilterOp::Brightness(v) => write!(f, "brightness({v})"),
            FilterOp::HueRotate(v) => write!(f, "hue-rotate({v}deg)"),
            FilterOp::Blur(v) => write!(f, "blur({v}px)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterGraph {
    ops: Vec<FilterOp>,
}

impl FilterGraph {
    pub fn ops(&self) -> &[FilterOp] {
        &self.ops
    }

    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// Run the graph over a frame in place. Runs of color ops share one
    /// pass over the pixels; a blur splits the runs.
    pub fn apply(&self, img: &mut RgbaImage) {
        if self.ops.is_empty() {
            return;
        }
        let span = span!(Level::TRACE, "filter_graph");
        let _guard = span.enter();

        let mut run: Vec<ColorMatrix> = Vec::new();
        for op in &self.ops {
            match op {
                FilterOp::Blur(sigma) => {
                    apply_color(&run, img);
                    run.clear();
                    if *sigma > 0. && img.width() > 0 && img.height() > 0 {
                        *img = gaussian_blur_f32(img, *sigma);
                    }
                }
                op => run.push(ColorMatrix::from_op(op)),
            }
        }
        apply_color(&run, img);
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ops.is_empty() {
            return write!(f, "none");
        }
        let parts: Vec<String> = self.ops.iter().map(|op| op.to_string()).collect();
        write!(f, "{}", parts.join(" "))
    }
}

impl FromStr for FilterGraph {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "none" {
            return Ok(FilterGraph::default());
        }

        let mut ops = Vec::new();
        let mut rest = s;
        while !rest.is_empty() {
            let open = rest
                .find('(')
                .ok_or_else(|| FilterParseError::Malformed(rest.to_string()))?;
            let close = rest
                .find(')')
                .filter(|c| *c > open)
                .ok_or_else(|| FilterParseError::Malformed(rest.to_string()))?;

            let name = rest[..open].trim();
            let arg = rest[open + 1..close].trim();
            ops.push(parse_op(name, arg)?);
            rest = rest[close + 1..].trim_start();
        }

        Ok(FilterGraph { ops })
    }
}

fn parse_op(name: &str, arg: &str) -> Result<FilterOp, FilterParseError> {
    let invalid = || FilterParseError::InvalidArgument {
        function: name.to_string(),
        arg: arg.to_string(),
    };
    let amount = |unit: &str| -> Result<f32, FilterParseError> {
        let (num, pct) = match arg.strip_suffix('%') {
            Some(n) => (n, true),
            None => (arg.strip_suffix(unit).unwrap_or(arg), false),
        };
        let v: f32 = num.trim().parse().map_err(|_| invalid())?;
        Ok(if pct { v / 100. } else { v })
    };

    let op = match name {
        "sepia" => FilterOp::Sepia(amount("")?),
        "grayscale" => FilterOp::Grayscale(amount("")?),
        "saturate" => FilterOp::Saturate(amount("")?),
        "contrast" => FilterOp::Contrast(amount("")?),
        "brightness" => FilterOp::Brightness(amount("")?),
        "hue-rotate" => FilterOp::HueRotate(amount("deg")?),
        "blur" => FilterOp::Blur(amount("px")?),
        other => return Err(FilterParseError::UnknownFunction(other.to_string())),
    };

    Ok(op)
}

/// Per-channel affine color transform: out = m * rgb + offset, on 0..1 values.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ColorMatrix {
    m: [[f32; 3]; 3],
    offset: f32,
}

impl ColorMatrix {
    fn scale(s: f32, offset: f32) -> ColorMatrix {
        ColorMatrix {
            m: [[s, 0., 0.], [0., s, 0.], [0., 0., s]],
            offset,
        }
    }

    fn from_op(op: &FilterOp) -> ColorMatrix {
        match *op {
            FilterOp::Sepia(a) => {
                let a = 1. - a.clamp(0., 1.);
                ColorMatrix {
                    m: [
                        [0.393 + 0.607 * a, 0.769 - 0.769 * a, 0.189 - 0.189 * a],
                        [0.349 - 0.349 * a, 0.686 + 0.314 * a, 0.168 - 0.168 * a],
                        [0.272 - 0.272 * a, 0.534 - 0.534 * a, 0.131 + 0.869 * a],
                    ],
                    offset: 0.,
                }
            }
            FilterOp::Grayscale(a) => {
                let a = 1. - a.clamp(0., 1.);
                ColorMatrix {
                    m: [
                        [0.2126 + 0.7874 * a, 0.7152 - 0.7152 * a, 0.0722 - 0.0722 * a],
                        [0.2126 - 0.2126 * a, 0.7152 + 0.2848 * a, 0.0722 - 0.0722 * a],
                        [0.2126 - 0.2126 * a, 0.7152 - 0.7152 * a, 0.0722 + 0.9278 * a],
                    ],
                    offset: 0.,
                }
            }
            FilterOp::Saturate(s) => {
                let s = s.max(0.);
                ColorMatrix {
                    m: [
                        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
                        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
                        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
                    ],
                    offset: 0.,
                }
            }
            FilterOp::HueRotate(deg) => {
                let (sin, cos) = deg.to_radians().sin_cos();
                ColorMatrix {
                    m: [
                        [
                            0.213 + cos * 0.787 - sin * 0.213,
                            0.715 - cos * 0.715 - sin * 0.715,
                            0.072 - cos * 0.072 + sin * 0.928,
                        ],
                        [
                            0.213 - cos * 0.213 + sin * 0.143,
                            0.715 + cos * 0.285 + sin * 0.140,
                            0.072 - cos * 0.072 - sin * 0.283,
                        ],
                        [
                            0.213 - cos * 0.213 - sin * 0.787,
                            0.715 - cos * 0.715 + sin * 0.715,
                            0.072 + cos * 0.928 + sin * 0.072,
                        ],
                    ],
                    offset: 0.,
                }
            }
            FilterOp::Brightness(b) => ColorMatrix::scale(b.max(0.), 0.),
            FilterOp::Contrast(c) => ColorMatrix::scale(c.max(0.), 0.5 - 0.5 * c.max(0.)),
            FilterOp::Blur(_) => ColorMatrix::scale(1., 0.),
        }
    }

    fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let mut out = [0.; 3];
        for (o, row) in out.iter_mut().zip(self.m.iter()) {
            *o = (row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2] + self.offset).clamp(0., 1.);
        }
        out
    }
}

fn apply_color(run: &[ColorMatrix], img: &mut RgbaImage) {
    if run.is_empty() {
        return;
    }

    for px in img.pixels_mut() {
        let mut rgb = [
            px[0] as f32 / 255.,
            px[1] as f32 / 255.,
            px[2] as f32 / 255.,
        ];
        for m in run {
            rgb = m.apply(rgb);
        }
        px[0] = (rgb[0] * 255.).round() as u8;
        px[1] = (rgb[1] * 255.).round() as u8;
        px[2] = (rgb[2] * 255.).round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_documented_graphs() {
        let expected = [
            (LookFilter::Normal, "none"),
            (LookFilter::Sepia, "sepia(0.8) saturate(1.2)"),
            (LookFilter::Bw, "grayscale(1)"),
            (
                LookFilter::Neon,
                "saturate(2.5) contrast(1.3) hue-rotate(30deg)",
            ),
            (
                LookFilter::Vintage,
                "sepia(0.4) saturate(0.8) contrast(1.1) brightness(0.95)",
            ),
            (LookFilter::Blur, "blur(2px)"),
        ];
        for (look, graph) in expected {
            assert_eq!(filter_graph(Some(look), false, false), graph);
            // stable across calls
            assert_eq!(filter_graph(Some(look), false, false), graph);
        }
    }

    #[test]
    fn test_graphs_parse_to_documented_ops() -> Result<(), FilterParseError> {
        let bw: FilterGraph = LookFilter::Bw.graph().parse()?;
        assert_eq!(bw.ops(), &[FilterOp::Grayscale(1.)]);

        let blur: FilterGraph = LookFilter::Blur.graph().parse()?;
        assert_eq!(blur.ops(), &[FilterOp::Blur(2.)]);

        let none: FilterGraph = LookFilter::Normal.graph().parse()?;
        assert!(none.is_identity());

        for look in LookFilter::ALL {
            let graph: FilterGraph = look.graph().parse()?;
            assert_eq!(graph.to_string(), look.graph());
        }
        Ok(())
    }

    #[test]
    fn test_beauty_composition() {
        assert_eq!(filter_graph(None, false, false), "none");
        assert_eq!(filter_graph(None, true, false), SMOOTH_GRAPH);
        assert_eq!(
            filter_graph(Some(LookFilter::Bw), true, true),
            "grayscale(1) blur(0.5px) contrast(1.05) brightness(1.15) saturate(1.05)"
        );
        assert_eq!(
            filter_graph(Some(LookFilter::Normal), false, true),
            BRIGHTEN_GRAPH
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "wobble(2)".parse::<FilterGraph>(),
            Err(FilterParseError::UnknownFunction("wobble".into()))
        );
        assert!(matches!(
            "blur(2px".parse::<FilterGraph>(),
            Err(FilterParseError::Malformed(_))
        ));
        assert!(matches!(
            "contrast(abc)".parse::<FilterGraph>(),
            Err(FilterParseError::InvalidArgument { .. })
        ));
        let pct: FilterGraph = "grayscale(50%)".parse().unwrap();
        assert_eq!(pct.ops(), &[FilterOp::Grayscale(0.5)]);
    }

    #[test]
    fn test_grayscale_equalizes_channels() -> Result<(), FilterParseError> {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([200, 40, 90, 255]));
        let graph: FilterGraph = "grayscale(1)".parse()?;
        graph.apply(&mut img);
        let p = img.get_pixel(0, 0);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
        assert_eq!(p[3], 255);
        Ok(())
    }

    #[test]
    fn test_identity_leaves_frame() -> Result<(), FilterParseError> {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let before = img.clone();
        let graph: FilterGraph = "none".parse()?;
        graph.apply(&mut img);
        assert_eq!(img, before);

        let graph: FilterGraph = "brightness(1) contrast(1) saturate(1)".parse()?;
        graph.apply(&mut img);
        for (a, b) in img.pixels().zip(before.pixels()) {
            for c in 0..3 {
                assert!((a[c] as i16 - b[c] as i16).abs() <= 1);
            }
        }
        Ok(())
    }

    #[test]
    fn test_brightness_scales() -> Result<(), FilterParseError> {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        let graph: FilterGraph = "brightness(1.5)".parse()?;
        graph.apply(&mut img);
        assert_eq!(img.get_pixel(0, 0)[0], 150);
        Ok(())
    }
}
