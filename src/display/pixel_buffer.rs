use super::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::sprite::Sprite;

/// Alpha blend a single color channel
/// Uses fast approximation: (x + 1 + (x >> 8)) >> 8 instead of x / 255
#[inline]
fn blend_channel(src: u8, dst: u8, alpha: u16) -> u8 {
    let result = src as u16 * alpha + dst as u16 * (255 - alpha);
    ((result + 1 + (result >> 8)) >> 8) as u8
}

/// RGBA8888 pixel buffer for software rendering.
/// Bytes are stored ABGR so the buffer uploads straight into an SDL
/// `RGBA8888` streaming texture on little-endian machines.
pub struct PixelBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Create a new pixel buffer with default resolution (640x480)
    pub fn new() -> Self {
        Self::with_size(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; (width * height * 4) as usize],
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        ((y * self.width + x) * 4) as usize
    }

    /// Clear to a solid color
    pub fn clear(&mut self, r: u8, g: u8, b: u8) {
        let pixel = [255, b, g, r];
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&pixel);
        }
    }

    /// Set a single pixel (bounds checked)
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            self.pixels[idx..idx + 4].copy_from_slice(&[255, b, g, r]);
        }
    }

    /// Set pixel with alpha blending
    #[inline]
    pub fn blend_pixel(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8, a: u8) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            let alpha = a as u16;
            self.pixels[idx] = 255;
            self.pixels[idx + 1] = blend_channel(b, self.pixels[idx + 1], alpha);
            self.pixels[idx + 2] = blend_channel(g, self.pixels[idx + 2], alpha);
            self.pixels[idx + 3] = blend_channel(r, self.pixels[idx + 3], alpha);
        }
    }

    /// Read a pixel as (r, g, b), None out of bounds
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<(u8, u8, u8)> {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            Some((self.pixels[idx + 3], self.pixels[idx + 2], self.pixels[idx + 1]))
        } else {
            None
        }
    }

    /// Draw a circle outline (1px thick), midpoint algorithm
    pub fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, r: u8, g: u8, b: u8) {
        let mut x = radius;
        let mut y = 0;
        let mut err = 0;

        while x >= y {
            self.set_pixel(cx + x, cy + y, r, g, b);
            self.set_pixel(cx + y, cy + x, r, g, b);
            self.set_pixel(cx - y, cy + x, r, g, b);
            self.set_pixel(cx - x, cy + y, r, g, b);
            self.set_pixel(cx - x, cy - y, r, g, b);
            self.set_pixel(cx - y, cy - x, r, g, b);
            self.set_pixel(cx + y, cy - x, r, g, b);
            self.set_pixel(cx + x, cy - y, r, g, b);

            y += 1;
            err += 1 + 2 * y;
            if 2 * (err - x) + 1 > 0 {
                x -= 1;
                err += 1 - 2 * x;
            }
        }
    }

    /// Draw `sprite` centered at (cx, cy), rotated `degrees` clockwise,
    /// scaled by `scale`, with overall opacity `alpha / 255`.
    ///
    /// Inverse-maps every destination pixel in the rotated bounding box back
    /// into sprite space and samples the nearest texel.
    pub fn draw_sprite(&mut self, sprite: &Sprite, cx: f32, cy: f32, degrees: f32, scale: f32, alpha: u8) {
        if alpha == 0 || scale <= 0.0 || sprite.width() == 0 || sprite.height() == 0 {
            return;
        }

        let sw = sprite.width() as f32;
        let sh = sprite.height() as f32;
        let reach = (sw * sw + sh * sh).sqrt() * scale / 2.0;

        let x0 = ((cx - reach).floor() as i32).max(0);
        let x1 = ((cx + reach).ceil() as i32).min(self.width as i32 - 1);
        let y0 = ((cy - reach).floor() as i32).max(0);
        let y1 = ((cy + reach).ceil() as i32).min(self.height as i32 - 1);

        let (sin, cos) = degrees.to_radians().sin_cos();
        let inv_scale = 1.0 / scale;
        let opacity = alpha as u32;

        for py in y0..=y1 {
            let dy = py as f32 + 0.5 - cy;
            for px in x0..=x1 {
                let dx = px as f32 + 0.5 - cx;
                // Undo the clockwise rotation, then the scale
                let sx = (dx * cos + dy * sin) * inv_scale + sw / 2.0;
                let sy = (dy * cos - dx * sin) * inv_scale + sh / 2.0;

                if let Some((r, g, b, a)) = sprite.pixel(sx.floor() as i32, sy.floor() as i32) {
                    let a = (a as u32 * opacity / 255) as u8;
                    if a > 0 {
                        self.blend_pixel(px, py, r, g, b, a);
                    }
                }
            }
        }
    }

    /// Raw bytes for SDL texture upload
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self::new()
    }
}
