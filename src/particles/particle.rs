//! A single pooled particle
//!
//! Particles are built once when their system is created and then recycled:
//! `init` clears per-activation state, initializers assign properties,
//! `configure` places the particle at its origin and `activate` stamps the
//! start time. Position and rotation are evaluated in closed form from the
//! time elapsed since activation (`x(t) = x0 + v*t + a*t²/2`), so an update
//! depends only on `now` and never on how often it was called.

use std::sync::Arc;

use super::modifiers::ParticleModifier;
use crate::math::Vec2;
use crate::sprite::{Animation, Sprite};

/// What a particle is drawn with
#[derive(Debug, Clone)]
pub enum Appearance {
    Still(Arc<Sprite>),
    Animated {
        animation: Arc<Animation>,
        frame: usize,
    },
}

impl Appearance {
    pub fn still(sprite: Arc<Sprite>) -> Self {
        Self::Still(sprite)
    }

    pub fn animated(animation: Arc<Animation>) -> Self {
        Self::Animated {
            animation,
            frame: 0,
        }
    }

    /// Image for the current frame
    pub fn sprite(&self) -> &Sprite {
        match self {
            Self::Still(sprite) => sprite,
            Self::Animated { animation, frame } => animation.frame(*frame),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    /// Center of the particle in pixels
    pub position: Vec2,
    /// Pixels per millisecond
    pub velocity: Vec2,
    /// Pixels per millisecond squared
    pub acceleration: Vec2,
    /// Degrees, clockwise
    pub rotation: f32,
    /// Rotation at activation, degrees
    pub initial_rotation: f32,
    /// Degrees per millisecond
    pub rotation_speed: f32,
    /// Multiplier on the sprite's size
    pub scale: f32,
    pub alpha: u8,
    origin: Vec2,
    time_to_live: u64,
    start_ms: u64,
    elapsed: u64,
    appearance: Appearance,
}

impl Particle {
    pub fn new(appearance: Appearance) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            rotation: 0.0,
            initial_rotation: 0.0,
            rotation_speed: 0.0,
            scale: 1.0,
            alpha: 255,
            origin: Vec2::ZERO,
            time_to_live: 0,
            start_ms: 0,
            elapsed: 0,
            appearance,
        }
    }

    /// Reset per-activation state.
    ///
    /// Position, velocity and acceleration are left alone; initializers and
    /// `configure` own those.
    pub fn init(&mut self) {
        self.elapsed = 0;
        self.scale = 1.0;
        self.alpha = 255;
        self.rotation_speed = 0.0;
        if let Appearance::Animated { frame, .. } = &mut self.appearance {
            *frame = 0;
        }
    }

    /// Set lifetime and place the particle at its emission origin
    pub fn configure(&mut self, time_to_live: u64, origin_x: f32, origin_y: f32) {
        self.time_to_live = time_to_live;
        self.origin = Vec2::new(origin_x, origin_y);
        self.position = self.origin;
        self.rotation = self.initial_rotation;
    }

    /// Mark the simulation time this particle's life is measured from
    pub fn activate(&mut self, start_ms: u64) {
        self.start_ms = start_ms;
        self.elapsed = 0;
    }

    /// Advance to `now_ms`, running `modifiers` in order.
    ///
    /// Returns false once the particle has outlived its time to live (or a
    /// one-shot animation has finished); the particle is left untouched in
    /// that case and the caller must return it to the pool.
    pub fn update(&mut self, now_ms: u64, modifiers: &[Box<dyn ParticleModifier>]) -> bool {
        let elapsed = now_ms.saturating_sub(self.start_ms);
        if elapsed > self.time_to_live {
            return false;
        }

        if let Appearance::Animated { animation, frame } = &mut self.appearance {
            match animation.frame_index_at(elapsed) {
                Some(index) => *frame = index,
                None => return false,
            }
        }

        self.elapsed = elapsed;
        let t = elapsed as f32;
        self.position = self.origin + self.velocity * t + self.acceleration * (0.5 * t * t);
        self.rotation = self.initial_rotation + self.rotation_speed * t;

        for modifier in modifiers {
            modifier.apply(self, elapsed);
        }
        true
    }

    /// Milliseconds since activation as of the last successful update
    #[inline]
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    #[inline]
    pub fn time_to_live(&self) -> u64 {
        self.time_to_live
    }

    /// Simulation time this particle was activated at
    #[inline]
    pub fn start_time(&self) -> u64 {
        self.start_ms
    }

    #[inline]
    pub fn appearance(&self) -> &Appearance {
        &self.appearance
    }

    /// Image to draw this frame
    #[inline]
    pub fn sprite(&self) -> &Sprite {
        self.appearance.sprite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::Frame;

    fn dot() -> Particle {
        Particle::new(Appearance::still(Arc::new(Sprite::solid(2, 2, (255, 255, 255)))))
    }

    fn launched(ttl: u64, start: u64) -> Particle {
        let mut p = dot();
        p.init();
        p.configure(ttl, 10.0, 20.0);
        p.activate(start);
        p
    }

    #[test]
    fn test_init_resets_visual_state_only() {
        let mut p = dot();
        p.velocity = Vec2::new(1.0, 1.0);
        p.scale = 3.0;
        p.alpha = 7;
        p.rotation_speed = 2.0;
        p.init();
        assert_eq!(p.scale, 1.0);
        assert_eq!(p.alpha, 255);
        assert_eq!(p.rotation_speed, 0.0);
        assert_eq!(p.velocity, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_update_closed_form_kinematics() {
        let mut p = dot();
        p.init();
        p.velocity = Vec2::new(0.1, 0.0);
        p.acceleration = Vec2::new(0.0, 0.002);
        p.configure(1000, 10.0, 20.0);
        p.activate(100);

        assert!(p.update(200, &[]));
        // t = 100ms: x = 10 + 0.1*100, y = 20 + 0.5*0.002*100^2
        assert!(p.position.approx_eq(&Vec2::new(20.0, 30.0), 1e-3));

        // Same `now` twice gives the same state
        assert!(p.update(200, &[]));
        assert!(p.position.approx_eq(&Vec2::new(20.0, 30.0), 1e-3));
    }

    #[test]
    fn test_rotation_advances_from_initial() {
        let mut p = dot();
        p.init();
        p.initial_rotation = 45.0;
        p.rotation_speed = 0.09; // 90 degrees per second
        p.configure(2000, 0.0, 0.0);
        p.activate(0);
        assert!(p.update(1000, &[]));
        assert!((p.rotation - 135.0).abs() < 1e-3);
    }

    #[test]
    fn test_expiry_boundary() {
        let mut p = launched(50, 100);
        assert!(p.update(100, &[]));
        assert!(p.update(150, &[]));
        assert_eq!(p.elapsed(), 50);
        assert!(!p.update(151, &[]));
        // Rejected update leaves the particle as it was
        assert_eq!(p.elapsed(), 50);
    }

    #[test]
    fn test_update_before_start_clamps_to_zero() {
        let mut p = launched(50, 100);
        assert!(p.update(40, &[]));
        assert_eq!(p.elapsed(), 0);
        assert!(p.position.approx_eq(&Vec2::new(10.0, 20.0), 1e-6));
    }

    #[test]
    fn test_animated_particle_tracks_frames() {
        let frames = (0..3)
            .map(|_| Frame {
                sprite: Arc::new(Sprite::solid(1, 1, (0, 0, 0))),
                duration_ms: 10,
            })
            .collect();
        let anim = Arc::new(Animation::new(frames).unwrap().once());
        let mut p = Particle::new(Appearance::animated(anim));
        p.init();
        p.configure(1000, 0.0, 0.0);
        p.activate(0);

        assert!(p.update(25, &[]));
        assert!(matches!(p.appearance(), Appearance::Animated { frame: 2, .. }));
        // One-shot animation has played through before the TTL
        assert!(!p.update(30, &[]));
    }
}
