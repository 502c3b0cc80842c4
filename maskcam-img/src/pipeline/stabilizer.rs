use super::TrackedBox;
use crate::shapes::Rect;

/// Weight of the previous stable box in each update.
pub const SMOOTHING: f32 = 0.85;

/// Centered box published when nothing has ever been detected.
pub const DEFAULT_BOX: Rect = Rect::new(25., 12., 50., 55.);

/// Exponential smoothing of raw per-frame boxes.
#[derive(Debug, Clone)]
pub struct Stabilizer {
    alpha: f32,
    current: Option<Rect>,
    detected: bool,
    misses: u32,
}

impl Default for Stabilizer {
    fn default() -> Self {
        Stabilizer::new(SMOOTHING)
    }
}

impl Stabilizer {
    pub fn new(alpha: f32) -> Stabilizer {
        Stabilizer {
            alpha: alpha.clamp(0., 1.),
            current: None,
            detected: false,
            misses: 0,
        }
    }

    /// Feed a raw detection. The first real detection is taken as is so
    /// tracking doesn't crawl in from the default box.
    pub fn hit(&mut self, raw: Rect) -> TrackedBox {
        let next = match self.current {
            Some(prev) if self.detected => Rect {
                x: prev.x * self.alpha + raw.x * (1. - self.alpha),
                y: prev.y * self.alpha + raw.y * (1. - self.alpha),
                w: prev.w * self.alpha + raw.w * (1. - self.alpha),
                h: prev.h * self.alpha + raw.h * (1. - self.alpha),
            },
            _ => raw,
        };

        self.current = Some(next);
        self.detected = true;
        self.misses = 0;

        TrackedBox {
            rect: next,
            misses: 0,
        }
    }

    /// Record a miss, keeping the last stable box.
    pub fn miss(&mut self) -> TrackedBox {
        self.misses = self.misses.saturating_add(1);
        let rect = *self.current.get_or_insert(DEFAULT_BOX);

        TrackedBox {
            rect,
            misses: self.misses,
        }
    }

    pub fn current(&self) -> Option<TrackedBox> {
        self.current.map(|rect| TrackedBox {
            rect,
            misses: self.misses,
        })
    }

    pub fn has_detected(&self) -> bool {
        self.detected
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.detected = false;
        self.misses = 0;
    }
}
