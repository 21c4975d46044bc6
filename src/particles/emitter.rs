//! Emission geometry

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::initializers::sample_range;

/// Axis-aligned region new particles are spawned from
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmitterRect {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl EmitterRect {
    pub const fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Degenerate rectangle: every particle starts at `(x, y)`
    pub const fn point(x: f32, y: f32) -> Self {
        Self::new(x, x, y, y)
    }

    /// Build from `[min_x, max_x, min_y, max_y]`.
    ///
    /// Returns None when fewer than four values are given; extra values are
    /// ignored.
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        match values {
            [min_x, max_x, min_y, max_y, ..] => Some(Self::new(*min_x, *max_x, *min_y, *max_y)),
            _ => None,
        }
    }

    /// Uniform origin inside the rectangle, each axis sampled on its own.
    /// Reversed bounds are treated as if given in order.
    pub fn sample(&self, rng: &mut dyn RngCore) -> (f32, f32) {
        let (x0, x1) = ordered(self.min_x, self.max_x);
        let (y0, y1) = ordered(self.min_y, self.max_y);
        (sample_range(rng, x0, x1), sample_range(rng, y0, y1))
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        let (x0, x1) = ordered(self.min_x, self.max_x);
        let (y0, y1) = ordered(self.min_y, self.max_y);
        x >= x0 && x <= x1 && y >= y0 && y <= y1
    }
}

#[inline]
fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
