use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::parallel::Executor;

/// A vorton or a passive tracer.
///
/// The layout is fixed so a renderer can read a store as raw bytes using
/// [`Particle::STRIDE`] and the field offsets below.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Zero for tracers.
    pub vorticity: Vec3,
    pub radius: f32,
    /// Frame index at creation.
    pub birth_time: u32,
    pub mass: f32,
}

impl Particle {
    pub const STRIDE: usize = std::mem::size_of::<Particle>();
    pub const OFFSET_OF_POSITION: usize = 0;
    pub const OFFSET_OF_VORTICITY: usize = 24;
    pub const OFFSET_OF_RADIUS: usize = 36;

    pub fn vorton(position: Vec3, vorticity: Vec3, radius: f32, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            vorticity,
            radius,
            birth_time: 0,
            mass,
        }
    }

    pub fn tracer(position: Vec3, radius: f32, birth_time: u32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            vorticity: Vec3::ZERO,
            radius,
            birth_time,
            mass: 0.0,
        }
    }

    /// Signed so that a particle stamped with a later frame has negative age.
    pub fn age(&self, frame: u32) -> i64 {
        frame as i64 - self.birth_time as i64
    }

    /// Volume of the cube of side `2 * radius` a vorton represents.
    pub fn volume(&self) -> f32 {
        let side = 2.0 * self.radius;
        side * side * side
    }
}

/// Owns a contiguous, resizable sequence of particles.
///
/// Indices are only meaningful within a single pass: [`ParticleStore::remove_at`]
/// moves the last particle into the vacated slot.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Panics if `index >= len()`.
    pub fn at(&self, index: usize) -> &Particle {
        &self.particles[index]
    }

    /// Panics if `index >= len()`.
    pub fn at_mut(&mut self, index: usize) -> &mut Particle {
        &mut self.particles[index]
    }

    /// Removes the particle at `index` in O(1) by moving the last particle
    /// into its slot. Panics if `index >= len()`.
    pub fn remove_at(&mut self, index: usize) -> Particle {
        self.particles.swap_remove(index)
    }

    pub fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Particle> {
        self.particles.iter_mut()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.particles)
    }

    /// Unweighted mean position, or `None` for an empty store.
    pub fn center_of_mass(&self, executor: &Executor) -> Option<Vec3> {
        if self.particles.is_empty() {
            return None;
        }
        let sum = executor.reduce(
            self.particles.len(),
            Vec3::ZERO,
            |i| self.particles[i].position,
            |a, b| a + b,
        );
        Some(sum / self.particles.len() as f32)
    }

    /// Axis-aligned bounds of particle positions, or `None` for an empty store.
    pub fn bounding_box(&self, executor: &Executor) -> Option<(Vec3, Vec3)> {
        if self.particles.is_empty() {
            return None;
        }
        let (min, max) = executor.reduce(
            self.particles.len(),
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |i| (self.particles[i].position, self.particles[i].position),
            |(min_a, max_a), (min_b, max_b)| (min_a.min(min_b), max_a.max(max_b)),
        );
        Some((min, max))
    }

    /// Sum of vorticity weighted by particle volume (total circulation).
    pub fn total_vorticity(&self, executor: &Executor) -> Vec3 {
        executor.reduce(
            self.particles.len(),
            Vec3::ZERO,
            |i| self.particles[i].vorticity * self.particles[i].volume(),
            |a, b| a + b,
        )
    }
}

impl FromIterator<Particle> for ParticleStore {
    fn from_iter<I: IntoIterator<Item = Particle>>(iter: I) -> Self {
        Self {
            particles: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ParticleStore {
    type Item = &'a Particle;
    type IntoIter = std::slice::Iter<'a, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.particles.iter()
    }
}
