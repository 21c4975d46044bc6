//! Software rendering of particles into a pixel buffer

mod pixel_buffer;

pub use pixel_buffer::PixelBuffer;

use crate::particles::{ActiveParticles, Particle};

/// Default render resolution
pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;

/// Draw one particle's current sprite centered on its position, rotated by
/// its rotation, scaled by its scale, at opacity `alpha / 255`.
pub fn draw_particle(buffer: &mut PixelBuffer, particle: &Particle) {
    buffer.draw_sprite(
        particle.sprite(),
        particle.position.x,
        particle.position.y,
        particle.rotation,
        particle.scale,
        particle.alpha,
    );
}

/// Draw every live particle. Holds the pool lock for the duration.
pub fn draw_particles(buffer: &mut PixelBuffer, particles: &ActiveParticles) {
    particles.read(|live| {
        for particle in live {
            draw_particle(buffer, particle);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::Appearance;
    use crate::sprite::Sprite;
    use std::sync::Arc;

    #[test]
    fn test_draw_particle_uses_alpha() {
        let sprite = Arc::new(Sprite::solid(2, 2, (255, 255, 255)));
        let mut particle = Particle::new(Appearance::still(sprite));
        particle.init();
        particle.configure(1000, 4.0, 4.0);
        particle.alpha = 0;

        let mut buffer = PixelBuffer::with_size(8, 8);
        buffer.clear(0, 0, 0);
        draw_particle(&mut buffer, &particle);
        assert_eq!(buffer.get_pixel(4, 4), Some((0, 0, 0)));

        particle.alpha = 255;
        draw_particle(&mut buffer, &particle);
        assert_eq!(buffer.get_pixel(4, 4), Some((255, 255, 255)));
    }
}
