//! Two-way coupling between the vorton fluid and rigid spheres.

use glam::Vec3;

use crate::config::SimConfig;
use crate::parallel::{Executor, SharedAccumulator};
use crate::particle::ParticleStore;
use crate::rigid_body::RbSphere;
use crate::vorton_sim::{FluidStateMut, VortonSim};

pub struct FluidBodySim {
    vorton_sim: VortonSim,
    spheres: Vec<RbSphere>,
}

impl FluidBodySim {
    pub fn new(config: SimConfig) -> Self {
        Self::from_vorton_sim(VortonSim::new(config))
    }

    pub fn from_vorton_sim(vorton_sim: VortonSim) -> Self {
        Self {
            vorton_sim,
            spheres: Vec::new(),
        }
    }

    pub fn vorton_sim(&self) -> &VortonSim {
        &self.vorton_sim
    }

    pub fn vorton_sim_mut(&mut self) -> &mut VortonSim {
        &mut self.vorton_sim
    }

    pub fn spheres(&self) -> &[RbSphere] {
        &self.spheres
    }

    pub fn spheres_mut(&mut self) -> &mut Vec<RbSphere> {
        &mut self.spheres
    }

    pub fn add_sphere(&mut self, sphere: RbSphere) {
        self.spheres.push(sphere);
    }

    pub fn clear(&mut self) {
        self.vorton_sim.clear();
        self.spheres.clear();
    }

    pub fn initialize(&mut self, tracers_per_cell: usize) {
        self.vorton_sim.initialize(tracers_per_cell);
    }

    /// Fluid step, then the fluid-body exchange, then rigid body integration.
    pub fn update(&mut self, time_step: f32, frame: u32) {
        self.vorton_sim.update(time_step, frame);
        self.solve_boundary_conditions();
        for sphere in self.spheres.iter_mut() {
            sphere.update(time_step);
        }
    }

    /// Enforces no-slip and no-through conditions on every sphere surface and
    /// hands the momentum exchanged with vortons to the spheres.
    pub fn solve_boundary_conditions(&mut self) {
        let FluidStateMut {
            vortons,
            tracers,
            executor,
            ..
        } = self.vorton_sim.fluid_mut();

        for (index, sphere) in self.spheres.iter_mut().enumerate() {
            let (impulse, torque) = collide_vortons(sphere, vortons, executor);
            sphere.apply_impulse(impulse);
            sphere.apply_impulsive_torque(torque);
            collide_tracers(sphere, tracers, executor);

            if impulse != Vec3::ZERO {
                log::trace!(
                    "sphere {}: impulse {:?}, torque {:?}",
                    index,
                    impulse,
                    torque
                );
            }
        }
    }
}

/// Returns the linear and angular impulse the vortons exert on `sphere`.
fn collide_vortons(sphere: &RbSphere, vortons: &mut ParticleStore, executor: &Executor) -> (Vec3, Vec3) {
    let body = *sphere;
    let total = SharedAccumulator::new((Vec3::ZERO, Vec3::ZERO));

    executor.for_each_chunk_mut(vortons.as_mut_slice(), |_, chunk| {
        let mut impulse = Vec3::ZERO;
        let mut torque = Vec3::ZERO;

        for vorton in chunk.iter_mut() {
            let to_vorton = vorton.position - body.position;
            let dist = to_vorton.length();
            let contact = body.radius + vorton.radius;
            if dist >= contact {
                continue;
            }

            let normal = if dist > f32::EPSILON {
                to_vorton / dist
            } else {
                Vec3::X
            };
            let surface_point = body.position + normal * body.radius;
            let body_velocity = body.velocity_at(surface_point);
            let relative = vorton.velocity - body_velocity;

            // Boundary layer vorticity that cancels the slip at the surface.
            if vorton.radius > 0.0 {
                vorton.vorticity += normal.cross(body_velocity - vorton.velocity) / (2.0 * vorton.radius);
            }
            vorton.position = body.position + normal * contact;
            vorton.velocity = body_velocity;

            let exchanged = relative * vorton.mass;
            impulse += exchanged;
            torque += (normal * body.radius).cross(exchanged);
        }

        if impulse != Vec3::ZERO || torque != Vec3::ZERO {
            total.merge((impulse, torque), |acc, (i, t)| {
                acc.0 += i;
                acc.1 += t;
            });
        }
    });

    total.into_inner()
}

/// Pushes tracers out of `sphere` and drags them along with its surface.
fn collide_tracers(sphere: &RbSphere, tracers: &mut ParticleStore, executor: &Executor) {
    let body = *sphere;
    executor.for_each_mut(tracers.as_mut_slice(), |_, tracer| {
        let to_tracer = tracer.position - body.position;
        let contact = body.radius + tracer.radius;
        let dist2 = to_tracer.length_squared();
        if dist2 >= contact * contact {
            return;
        }
        let dist = dist2.sqrt();
        let normal = if dist > f32::EPSILON {
            to_tracer / dist
        } else {
            Vec3::X
        };
        tracer.position = body.position + normal * contact;
        tracer.velocity = body.velocity_at(body.position + normal * body.radius);
    });
}
