//! Particle images
//!
//! A `Sprite` is the image a particle is drawn with; an `Animation` is a
//! sequence of sprites with per-frame durations. Loading images from disk
//! and density conversion belong to the host, so only procedural
//! generation and raw RGBA construction live here.

use std::sync::Arc;

/// An image stored as RGBA pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    width: u32,
    height: u32,
    pixels: Vec<u8>, // RGBA format, 4 bytes per pixel
}

impl Sprite {
    /// Create a new fully transparent sprite
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    /// Create sprite from raw RGBA data
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() == (width * height * 4) as usize {
            Some(Self {
                width,
                height,
                pixels: data,
            })
        } else {
            None
        }
    }

    /// Solid rectangle, mostly useful for tests and debugging
    pub fn solid(width: u32, height: u32, color: (u8, u8, u8)) -> Self {
        let mut sprite = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                sprite.set_pixel(x, y, color.0, color.1, color.2, 255);
            }
        }
        sprite
    }

    /// Round dot with a soft edge, the default particle image
    pub fn soft_dot(radius: u32, color: (u8, u8, u8)) -> Self {
        let size = radius.max(1) * 2;
        let mut sprite = Self::new(size, size);
        let center = size as f32 / 2.0;
        let r = radius.max(1) as f32;

        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 + 0.5 - center;
                let dy = y as f32 + 0.5 - center;
                let d = (dx * dx + dy * dy).sqrt() / r;
                if d < 1.0 {
                    // Quadratic falloff toward the rim
                    let a = (1.0 - d * d).clamp(0.0, 1.0);
                    sprite.set_pixel(x, y, color.0, color.1, color.2, (a * 255.0) as u8);
                }
            }
        }
        sprite
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Set a pixel in the sprite
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, r: u8, g: u8, b: u8, a: u8) {
        if x < self.width && y < self.height {
            let idx = ((y * self.width + x) * 4) as usize;
            self.pixels[idx] = r;
            self.pixels[idx + 1] = g;
            self.pixels[idx + 2] = b;
            self.pixels[idx + 3] = a;
        }
    }

    /// Read (r, g, b, a) at texel coordinates, None outside the image
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<(u8, u8, u8, u8)> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        Some((
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ))
    }
}

/// One frame of an animation
#[derive(Debug, Clone)]
pub struct Frame {
    pub sprite: Arc<Sprite>,
    pub duration_ms: u64,
}

/// A frame sequence played back on a fixed schedule
#[derive(Debug, Clone)]
pub struct Animation {
    frames: Vec<Frame>,
    total_ms: u64,
    one_shot: bool,
}

impl Animation {
    /// Looping animation. Returns None when there are no frames.
    pub fn new(frames: Vec<Frame>) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }
        let total_ms = frames.iter().map(|f| f.duration_ms).sum();
        Some(Self {
            frames,
            total_ms,
            one_shot: false,
        })
    }

    /// Play the frames once; particles using it expire at the end
    pub fn once(mut self) -> Self {
        self.one_shot = true;
        self
    }

    #[inline]
    pub fn is_one_shot(&self) -> bool {
        self.one_shot
    }

    #[inline]
    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, index: usize) -> &Sprite {
        &self.frames[index.min(self.frames.len() - 1)].sprite
    }

    /// Frame shown `elapsed_ms` after the start.
    ///
    /// Returns None for a one-shot animation that has finished playing.
    pub fn frame_index_at(&self, elapsed_ms: u64) -> Option<usize> {
        let mut t = elapsed_ms;
        if t >= self.total_ms {
            if self.one_shot {
                return None;
            }
            // A zero-length animation pins to its last frame
            if self.total_ms == 0 {
                return Some(self.frames.len() - 1);
            }
            t %= self.total_ms;
        }

        let mut end = 0;
        for (i, frame) in self.frames.iter().enumerate() {
            end += frame.duration_ms;
            if end > t {
                return Some(i);
            }
        }
        Some(self.frames.len() - 1)
    }
}
