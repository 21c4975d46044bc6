//! Fixed-capacity particle storage
//!
//! All particles live in one `Vec` sized at construction. The first
//! `active` entries are alive, the rest are the free pool. Activating takes
//! the first free slot; releasing swaps the expired particle to the end of
//! the active prefix. Nothing is allocated or dropped after construction.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::particle::Particle;

pub struct ParticlePool {
    particles: Vec<Particle>,
    active: usize,
}

impl ParticlePool {
    pub fn new(particles: Vec<Particle>) -> Self {
        Self {
            particles,
            active: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn active_len(&self) -> usize {
        self.active
    }

    #[inline]
    pub fn free_len(&self) -> usize {
        self.particles.len() - self.active
    }

    #[inline]
    pub fn has_free(&self) -> bool {
        self.active < self.particles.len()
    }

    /// Alive particles, in no particular order
    #[inline]
    pub fn active(&self) -> &[Particle] {
        &self.particles[..self.active]
    }

    /// Move the next free particle into the active set.
    /// Returns None when the pool is exhausted.
    pub fn activate_next(&mut self) -> Option<&mut Particle> {
        if !self.has_free() {
            return None;
        }
        let idx = self.active;
        self.active += 1;
        Some(&mut self.particles[idx])
    }

    /// Run `keep` on every active particle, returning those it rejects to
    /// the pool. Returns how many were released.
    pub fn retain_active(&mut self, mut keep: impl FnMut(&mut Particle) -> bool) -> usize {
        let mut released = 0;
        let mut i = 0;
        while i < self.active {
            if keep(&mut self.particles[i]) {
                i += 1;
            } else {
                self.active -= 1;
                self.particles.swap(i, self.active);
                released += 1;
                // Don't advance i: the swapped-in particle still needs a visit
            }
        }
        released
    }

    /// Return every active particle to the pool
    pub fn release_all(&mut self) -> usize {
        let released = self.active;
        self.active = 0;
        released
    }
}

/// Shared read access to a system's live particles.
///
/// The system mutates the pool only while holding the lock, so readers on
/// another thread see either the state before a tick or after it.
#[derive(Clone)]
pub struct ActiveParticles {
    pool: Arc<Mutex<ParticlePool>>,
}

impl ActiveParticles {
    pub(crate) fn new(pool: Arc<Mutex<ParticlePool>>) -> Self {
        Self { pool }
    }

    fn lock(&self) -> MutexGuard<'_, ParticlePool> {
        // Pool state is plain numbers; a panicked holder can't leave it torn
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` over the active particles with the lock held
    pub fn read<R>(&self, f: impl FnOnce(&[Particle]) -> R) -> R {
        let pool = self.lock();
        f(pool.active())
    }

    /// Copy of the active particles, for readers that must not hold the lock
    pub fn snapshot(&self) -> Vec<Particle> {
        self.read(<[Particle]>::to_vec)
    }

    pub fn len(&self) -> usize {
        self.lock().active_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
