use super::{HEIGHT, WIDTH};
use crate::shapes::Point;

pub const NUM_ANCHORS: usize = 896;

// (stride, anchors per cell) for the short range model
const LAYERS: [(u32, usize); 2] = [(8, 2), (16, 6)];

/// Anchor centers in normalized [0, 1] input coordinates. Anchor sizes are
/// fixed at 1 so regressor offsets apply directly.
pub fn gen_anchors() -> Vec<Point> {
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for (stride, per_cell) in LAYERS {
        let cols = WIDTH / stride;
        let rows = HEIGHT / stride;
        for y in 0..rows {
            for x in 0..cols {
                let center = Point::new(
                    (x as f32 + 0.5) / cols as f32,
                    (y as f32 + 0.5) / rows as f32,
                );
                anchors.extend(std::iter::repeat_n(center, per_cell));
            }
        }
    }

    anchors
}
