//! Renderer collaborator
//!
//! The drawing surface receives the live particle handle once emission is
//! prepared and a redraw request after every tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use super::pool::ActiveParticles;

pub trait ParticleView: Send + Sync {
    /// Called by `prepare_emitting` with the handle to draw from
    fn set_particles(&self, particles: ActiveParticles);

    /// State changed; schedule a redraw. Must not block.
    fn post_invalidate(&self);
}

/// View that stores the handle and raises a flag on invalidation.
///
/// The render loop polls `take_dirty` and draws from `particles`.
#[derive(Default)]
pub struct RedrawFlag {
    particles: Mutex<Option<ActiveParticles>>,
    dirty: AtomicBool,
}

impl RedrawFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// The handle published by the system, if emission was prepared
    pub fn particles(&self) -> Option<ActiveParticles> {
        self.particles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a redraw was requested since the last call
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }
}

impl ParticleView for RedrawFlag {
    fn set_particles(&self, particles: ActiveParticles) {
        *self.particles.lock().unwrap_or_else(PoisonError::into_inner) = Some(particles);
    }

    fn post_invalidate(&self) {
        self.dirty.store(true, Ordering::Release);
    }
}
