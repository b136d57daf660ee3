//! Per-frame particle operations and the pipeline that runs them in order.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EmitterConfig;
use crate::grid::UniformGrid;
use crate::parallel::Executor;
use crate::particle::{Particle, ParticleStore};

/// What an operation gets to see about the current frame.
pub struct OperationContext<'a> {
    pub time_step: f32,
    pub frame: u32,
    pub executor: &'a Executor,
    /// Velocity field of the current frame, if one has been built.
    pub velocity: Option<&'a UniformGrid<Vec3>>,
}

pub trait ParticleOperation: Send {
    fn name(&self) -> &'static str;
    fn operate(&mut self, particles: &mut ParticleStore, ctx: &OperationContext<'_>);
}

/// Ordered list of operations applied to one particle store each frame.
#[derive(Default)]
pub struct OperationPipeline {
    operations: Vec<Box<dyn ParticleOperation>>,
}

impl OperationPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: impl ParticleOperation + 'static) {
        self.operations.push(Box::new(operation));
    }

    pub fn with(mut self, operation: impl ParticleOperation + 'static) -> Self {
        self.push(operation);
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.operations.iter().map(|op| op.name()).collect()
    }

    pub fn run(&mut self, particles: &mut ParticleStore, ctx: &OperationContext<'_>) {
        for op in self.operations.iter_mut() {
            op.operate(particles, ctx);
        }
    }
}

impl std::fmt::Debug for OperationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KillStats {
    /// Age comparisons performed.
    pub examined: usize,
    pub removed: usize,
}

/// Removes particles older than `age_max` frames.
#[derive(Debug, Clone, Copy)]
pub struct KillAge {
    pub age_max: u32,
}

impl KillAge {
    pub fn new(age_max: u32) -> Self {
        Self { age_max }
    }

    /// Single pass; the index stays put after a removal because the former
    /// last particle now occupies that slot and has not been examined yet.
    pub fn kill(&self, particles: &mut ParticleStore, frame: u32) -> KillStats {
        let age_max = self.age_max as i64;
        let mut stats = KillStats::default();
        let mut i = 0;
        // Length shrinks inside the loop, so it is re-read every iteration.
        while i < particles.len() {
            stats.examined += 1;
            if particles.at(i).age(frame) > age_max {
                particles.remove_at(i);
                stats.removed += 1;
            } else {
                i += 1;
            }
        }
        stats
    }
}

impl ParticleOperation for KillAge {
    fn name(&self) -> &'static str {
        "kill_age"
    }

    fn operate(&mut self, particles: &mut ParticleStore, ctx: &OperationContext<'_>) {
        let stats = self.kill(particles, ctx.frame);
        if stats.removed > 0 {
            log::trace!(
                "frame {}: killed {} of {} particles older than {}",
                ctx.frame,
                stats.removed,
                stats.examined,
                self.age_max
            );
        }
    }
}

/// Births particles at a steady rate inside a box.
#[derive(Debug, Clone)]
pub struct Emit {
    pub config: EmitterConfig,
    carry: f32,
    rng: StdRng,
}

impl Emit {
    pub fn new(config: EmitterConfig, seed: u64) -> Self {
        Self {
            config,
            carry: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ParticleOperation for Emit {
    fn name(&self) -> &'static str {
        "emit"
    }

    fn operate(&mut self, particles: &mut ParticleStore, ctx: &OperationContext<'_>) {
        self.carry += self.config.rate * ctx.time_step;
        let count = self.carry.floor();
        self.carry -= count;

        for _ in 0..count as usize {
            let jitter = Vec3::new(
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
            );
            let mut particle = Particle::tracer(
                self.config.center + jitter * self.config.spread,
                self.config.radius,
                ctx.frame,
            );
            particle.velocity = self.config.velocity;
            particles.push(particle);
        }
    }
}

/// Moves particles through the frame's velocity field.
#[derive(Debug, Clone, Copy, Default)]
pub struct Advect;

impl ParticleOperation for Advect {
    fn name(&self) -> &'static str {
        "advect"
    }

    fn operate(&mut self, particles: &mut ParticleStore, ctx: &OperationContext<'_>) {
        let Some(velocity) = ctx.velocity else {
            return;
        };
        let dt = ctx.time_step;
        ctx.executor.for_each_mut(particles.as_mut_slice(), |_, p| {
            p.velocity = velocity.interpolate(p.position);
            p.position += p.velocity * dt;
        });
    }
}
