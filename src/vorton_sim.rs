//! Vortex particle method: vortons carry vorticity, a grid carries the
//! velocity they induce, and tracers ride along for display.

use std::f32::consts::PI;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimConfig;
use crate::grid::{GridShape, UniformGrid};
use crate::operation::{Advect, Emit, KillAge, OperationContext, OperationPipeline, ParticleOperation};
use crate::parallel::Executor;
use crate::particle::{Particle, ParticleStore};

const ONE_OVER_FOUR_PI: f32 = 1.0 / (4.0 * PI);
// cbrt(f32::MIN_POSITIVE)
const AVOID_SINGULARITY: f32 = 2.2737368e-13;

/// Velocity induced at `query` by one vorton, with the singularity inside
/// the vorton's core smoothed out.
pub fn induced_velocity(vorton: &Particle, query: Vec3) -> Vec3 {
    let from_vorton = query - vorton.position;
    let radius2 = vorton.radius * vorton.radius;
    let dist2 = from_vorton.length_squared() + AVOID_SINGULARITY;
    let one_over_dist = dist2.sqrt().recip();
    let dist_law = if dist2 < radius2 {
        one_over_dist / radius2
    } else {
        one_over_dist / dist2
    };
    // 8 r^3 is the volume of the cube each vorton stands for.
    ONE_OVER_FOUR_PI * (8.0 * radius2 * vorton.radius) * vorton.vorticity.cross(from_vorton) * dist_law
}

/// Mutable view of the particle stores plus the executor, for coupling passes
/// that live outside the solver.
pub struct FluidStateMut<'a> {
    pub vortons: &'a mut ParticleStore,
    pub tracers: &'a mut ParticleStore,
    pub executor: &'a Executor,
    pub density: f32,
}

pub struct VortonSim {
    config: SimConfig,
    vortons: ParticleStore,
    tracers: ParticleStore,
    velocity_grid: Option<UniformGrid<Vec3>>,
    vorton_advect: Advect,
    tracer_ops: OperationPipeline,
    executor: Executor,
    rng: StdRng,
    eternal_bounds: Option<(Vec3, Vec3)>,
    tracer_center_of_mass: Option<Vec3>,
}

impl VortonSim {
    pub fn new(config: SimConfig) -> Self {
        let executor = Executor::new(config.execution);
        Self::with_executor(config, executor)
    }

    pub fn with_executor(config: SimConfig, executor: Executor) -> Self {
        Self {
            tracer_ops: build_tracer_pipeline(&config),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            vortons: ParticleStore::new(),
            tracers: ParticleStore::new(),
            velocity_grid: None,
            vorton_advect: Advect,
            executor,
            eternal_bounds: None,
            tracer_center_of_mass: None,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn vortons(&self) -> &ParticleStore {
        &self.vortons
    }

    pub fn vortons_mut(&mut self) -> &mut ParticleStore {
        &mut self.vortons
    }

    pub fn tracers(&self) -> &ParticleStore {
        &self.tracers
    }

    pub fn tracers_mut(&mut self) -> &mut ParticleStore {
        &mut self.tracers
    }

    pub fn tracer_ops(&self) -> &OperationPipeline {
        &self.tracer_ops
    }

    pub fn velocity_grid(&self) -> Option<&UniformGrid<Vec3>> {
        self.velocity_grid.as_ref()
    }

    pub fn tracer_center_of_mass(&self) -> Option<Vec3> {
        self.tracer_center_of_mass
    }

    /// Union of every bounding box seen since the last clear.
    pub fn eternal_bounds(&self) -> Option<(Vec3, Vec3)> {
        self.eternal_bounds
    }

    pub fn min_corner_eternal(&self) -> Option<Vec3> {
        self.eternal_bounds.map(|(min, _)| min)
    }

    pub fn max_corner_eternal(&self) -> Option<Vec3> {
        self.eternal_bounds.map(|(_, max)| max)
    }

    pub fn fluid_mut(&mut self) -> FluidStateMut<'_> {
        FluidStateMut {
            vortons: &mut self.vortons,
            tracers: &mut self.tracers,
            executor: &self.executor,
            density: self.config.density,
        }
    }

    /// Drops all particles and derived state, and resets the tracer pipeline.
    pub fn clear(&mut self) {
        self.vortons.clear();
        self.tracers.clear();
        self.velocity_grid = None;
        self.eternal_bounds = None;
        self.tracer_center_of_mass = None;
        self.tracer_ops = build_tracer_pipeline(&self.config);
        self.rng = StdRng::seed_from_u64(self.config.seed);
        log::info!("Cleared vorton simulation");
    }

    /// Builds the velocity grid around the current vortons and fills each of
    /// its cells with `tracers_per_cell` cubed jittered tracers.
    pub fn initialize(&mut self, tracers_per_cell: usize) {
        self.tracers.clear();
        let Some((min, max)) = self.update_bounding_box() else {
            self.velocity_grid = None;
            self.tracer_center_of_mass = None;
            log::warn!("Initialized vorton simulation without vortons");
            return;
        };
        self.compute_velocity_grid(min, max);

        if let Some(grid) = &self.velocity_grid {
            let shape = *grid.shape();
            let n = tracers_per_cell;
            let sub = shape.spacing / n.max(1) as f32;
            let radius = 0.5 * sub.min_element();
            let [cx, cy, cz] = shape.num_cells();
            for k in 0..cz {
                for j in 0..cy {
                    for i in 0..cx {
                        let corner = shape.cell_min_corner(i, j, k);
                        for sk in 0..n {
                            for sj in 0..n {
                                for si in 0..n {
                                    let jitter = Vec3::new(
                                        self.rng.r#gen::<f32>(),
                                        self.rng.r#gen::<f32>(),
                                        self.rng.r#gen::<f32>(),
                                    );
                                    let cell_pos = Vec3::new(si as f32, sj as f32, sk as f32) + jitter;
                                    self.tracers
                                        .push(Particle::tracer(corner + sub * cell_pos, radius, 0));
                                }
                            }
                        }
                    }
                }
            }
        }

        self.tracer_center_of_mass = self.tracers.center_of_mass(&self.executor);
        log::info!(
            "Initialized vorton simulation: {} vortons, {} tracers",
            self.vortons.len(),
            self.tracers.len()
        );
    }

    /// Advances the simulation by one time step. Passes run strictly in
    /// order; each one finishes before the next reads its output.
    pub fn update(&mut self, time_step: f32, frame: u32) {
        match self.update_bounding_box() {
            Some((min, max)) => self.compute_velocity_grid(min, max),
            None => self.velocity_grid = None,
        }

        self.stretch_and_tilt(time_step);
        self.diffuse_vorticity(time_step);

        let ctx = OperationContext {
            time_step,
            frame,
            executor: &self.executor,
            velocity: self.velocity_grid.as_ref(),
        };
        self.vorton_advect.operate(&mut self.vortons, &ctx);
        self.tracer_ops.run(&mut self.tracers, &ctx);

        self.tracer_center_of_mass = self.tracers.center_of_mass(&self.executor);

        log::debug!(
            "frame {}: {} vortons, {} tracers, grid {:?}",
            frame,
            self.vortons.len(),
            self.tracers.len(),
            self.velocity_grid.as_ref().map(|g| g.shape().num_points)
        );
    }

    /// Bounds of vortons and tracers, grown by the largest vorton radius.
    fn update_bounding_box(&mut self) -> Option<(Vec3, Vec3)> {
        let vorton_box = self.vortons.bounding_box(&self.executor);
        let tracer_box = self.tracers.bounding_box(&self.executor);
        let (min, max) = match (vorton_box, tracer_box) {
            (None, None) => return None,
            (Some(b), None) | (None, Some(b)) => b,
            (Some((vmin, vmax)), Some((tmin, tmax))) => (vmin.min(tmin), vmax.max(tmax)),
        };

        let vortons = self.vortons.as_slice();
        let margin = self
            .executor
            .reduce(vortons.len(), 0.0f32, |i| vortons[i].radius, f32::max);
        let min = min - Vec3::splat(margin);
        let max = max + Vec3::splat(margin);

        self.eternal_bounds = Some(match self.eternal_bounds {
            None => (min, max),
            Some((emin, emax)) => (emin.min(min), emax.max(max)),
        });
        Some((min, max))
    }

    fn compute_velocity_grid(&mut self, min: Vec3, max: Vec3) {
        let shape = GridShape::with_cell_budget(min, max, self.config.grid_cell_budget);
        let vortons = self.vortons.as_slice();
        let values = self.executor.map_collect(shape.total_points(), |offset| {
            let [ix, iy, iz] = shape.point_indices(offset);
            let position = shape.point_position(ix, iy, iz);
            vortons
                .iter()
                .fold(Vec3::ZERO, |acc, v| acc + induced_velocity(v, position))
        });
        self.velocity_grid = Some(UniformGrid::from_values(shape, values));
    }

    /// Vortex stretching and tilting: `dω/dt = (ω · ∇) u`.
    fn stretch_and_tilt(&mut self, time_step: f32) {
        let Some(grid) = &self.velocity_grid else {
            return;
        };
        if self.vortons.is_empty() {
            return;
        }
        let jacobian = grid.jacobian(&self.executor);
        let scale = self.config.stretch_tilt_scale * time_step;
        self.executor
            .for_each_mut(self.vortons.as_mut_slice(), |_, v| {
                let gradient = jacobian.interpolate(v.position);
                v.vorticity += (gradient * v.vorticity) * scale;
            });
    }

    /// Particle strength exchange between vortons sharing a grid cell.
    ///
    /// Every vorton moves toward the vorticity of its cell mates at a rate
    /// shared by the whole cell, so the cell's total vorticity is unchanged.
    /// New values are computed from a snapshot, making the result independent
    /// of execution order.
    fn diffuse_vorticity(&mut self, time_step: f32) {
        let Some(grid) = &self.velocity_grid else {
            return;
        };
        let rate = 2.0 * self.config.viscosity * time_step;
        if rate <= 0.0 || self.vortons.len() < 2 {
            return;
        }

        let shape = *grid.shape();
        let cell_of: Vec<usize> = self
            .vortons
            .iter()
            .map(|v| shape.cell_offset_of(v.position))
            .collect();
        let mut cells: Vec<Vec<usize>> = vec![Vec::new(); shape.total_cells()];
        for (i, &cell) in cell_of.iter().enumerate() {
            cells[cell].push(i);
        }
        let snapshot: Vec<Vec3> = self.vortons.iter().map(|v| v.vorticity).collect();

        self.executor
            .for_each_mut(self.vortons.as_mut_slice(), |i, v| {
                let mates = &cells[cell_of[i]];
                if mates.len() < 2 {
                    return;
                }
                // Keeps the update a convex combination.
                let exchange = rate.min(1.0 / mates.len() as f32);
                let own = snapshot[i];
                let delta = mates
                    .iter()
                    .filter(|&&j| j != i)
                    .fold(Vec3::ZERO, |acc, &j| acc + (snapshot[j] - own));
                v.vorticity = own + delta * exchange;
            });
    }
}

fn build_tracer_pipeline(config: &SimConfig) -> OperationPipeline {
    let mut pipeline = OperationPipeline::new();
    if let Some(emitter) = &config.tracer_emitter {
        pipeline.push(Emit::new(emitter.clone(), config.seed.wrapping_add(1)));
    }
    if let Some(age_max) = config.tracer_max_age {
        pipeline.push(KillAge::new(age_max));
    }
    pipeline.push(Advect);
    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::ExecutionStrategy;

    fn sequential_config() -> SimConfig {
        SimConfig {
            execution: ExecutionStrategy::Sequential,
            grid_cell_budget: 64,
            ..Default::default()
        }
    }

    #[test]
    fn induced_velocity_is_perpendicular() {
        let vorton = Particle::vorton(Vec3::ZERO, Vec3::Z, 0.1, 1.0);
        let v = induced_velocity(&vorton, Vec3::X);
        // ω × r with ω = z, r = x points along +y.
        assert!(v.y > 0.0);
        assert!(v.x.abs() < 1e-9 && v.z.abs() < 1e-9);
        assert!(induced_velocity(&vorton, Vec3::ZERO).length() < 1e-9);
    }

    #[test]
    fn pipeline_built_from_config() {
        let config = SimConfig {
            tracer_max_age: Some(10),
            tracer_emitter: Some(Default::default()),
            ..sequential_config()
        };
        let sim = VortonSim::new(config);
        assert_eq!(sim.tracer_ops().names(), vec!["emit", "kill_age", "advect"]);
    }

    #[test]
    fn diffusion_conserves_total_vorticity() {
        let mut sim = VortonSim::new(SimConfig {
            viscosity: 5.0,
            stretch_tilt_scale: 0.0,
            grid_cell_budget: 1,
            ..sequential_config()
        });
        // Cubic bounds so the single-cell budget really yields one cell.
        let positions = [Vec3::ZERO, Vec3::splat(0.01), Vec3::splat(0.02)];
        let vorticities = [Vec3::X, Vec3::Y * 2.0, Vec3::new(0.0, 0.0, -3.0)];
        for (p, w) in positions.iter().zip(vorticities) {
            sim.vortons_mut().push(Particle::vorton(*p, w, 0.05, 1.0));
        }
        let before: Vec3 = sim.vortons().iter().map(|v| v.vorticity).sum();

        let (min, max) = sim.update_bounding_box().unwrap();
        sim.compute_velocity_grid(min, max);
        sim.diffuse_vorticity(0.1);

        let after: Vec3 = sim.vortons().iter().map(|v| v.vorticity).sum();
        assert!((after - before).length() < 1e-5);
        // Rate clamps to 1/3: everyone lands on the mean.
        let mean = before / 3.0;
        for v in sim.vortons().iter() {
            assert!((v.vorticity - mean).length() < 1e-5);
        }
    }
}
