//! Canned initial conditions.

use std::fmt;

use glam::Vec3;

use crate::fluid_body_sim::FluidBodySim;
use crate::rigid_body::RbSphere;
use crate::vorticity_distribution::{
    assign_vorticity, JetRing, VortexNoise, VortexRing, VortexSheet, VortexTube, VorticityDistribution,
};

const RADIUS: f32 = 1.0;
const THICKNESS: f32 = 1.0;
const MAGNITUDE: f32 = 20.0;
const NUM_VORTONS_MAX: usize = 16 * 16 * 16;
/// Background vortons for sphere scenarios carry almost no vorticity.
const QUIET_MAGNITUDE: f32 = 0.125 * f32::EPSILON;
const QUIET_VORTONS_MAX: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    VortexRing,
    JetRing,
    Projectile,
    ProjectileLongitudinalSpin,
    ProjectileTransverseSpin,
    SpinningSphere,
    SphereInSpinningFluid,
    SpanwiseSheet,
    VortexTube,
    OrthogonalTubes,
    Sheet2d,
}

impl Scenario {
    pub const ALL: [Scenario; 11] = [
        Scenario::VortexRing,
        Scenario::JetRing,
        Scenario::Projectile,
        Scenario::ProjectileLongitudinalSpin,
        Scenario::ProjectileTransverseSpin,
        Scenario::SpinningSphere,
        Scenario::SphereInSpinningFluid,
        Scenario::SpanwiseSheet,
        Scenario::VortexTube,
        Scenario::OrthogonalTubes,
        Scenario::Sheet2d,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn tracers_per_cell(self) -> usize {
        if self.has_sphere() { 6 } else { 3 }
    }

    pub fn has_sphere(self) -> bool {
        matches!(
            self,
            Scenario::Projectile
                | Scenario::ProjectileLongitudinalSpin
                | Scenario::ProjectileTransverseSpin
                | Scenario::SpinningSphere
                | Scenario::SphereInSpinningFluid
        )
    }

    /// Resets `sim` and fills it with this scenario's vortons, spheres and
    /// tracers.
    pub fn load(self, sim: &mut FluidBodySim) {
        sim.clear();
        let density = sim.vorton_sim().config().density;
        let seed = sim.vorton_sim().config().seed;
        let mut assign = |magnitude: f32, max: usize, distribution: &mut dyn VorticityDistribution| {
            assign_vorticity(
                sim.vorton_sim_mut().vortons_mut(),
                magnitude,
                max,
                density,
                distribution,
            )
        };

        let projectile_noise = || VortexNoise::new(Vec3::new(4.0 * THICKNESS, 0.5 * THICKNESS, 0.5 * THICKNESS), seed);
        let mut spheres = Vec::new();
        let mut torque = Vec3::ZERO;

        match self {
            Scenario::VortexRing => {
                assign(5.0 * MAGNITUDE, NUM_VORTONS_MAX, &mut VortexRing::new(RADIUS, THICKNESS, Vec3::X));
            }
            Scenario::JetRing => {
                assign(5.0 * MAGNITUDE, NUM_VORTONS_MAX, &mut JetRing::new(RADIUS, THICKNESS, Vec3::X));
            }
            Scenario::Projectile | Scenario::ProjectileLongitudinalSpin | Scenario::ProjectileTransverseSpin => {
                assign(QUIET_MAGNITUDE, QUIET_VORTONS_MAX, &mut projectile_noise());
                spheres.push(RbSphere::new(Vec3::new(-2.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0), 0.2, 0.2));
                torque = match self {
                    Scenario::ProjectileLongitudinalSpin => Vec3::new(0.1, 0.0, 0.0),
                    Scenario::ProjectileTransverseSpin => Vec3::new(0.0, 0.1, 0.0),
                    _ => Vec3::ZERO,
                };
            }
            Scenario::SpinningSphere => {
                assign(QUIET_MAGNITUDE, QUIET_VORTONS_MAX, &mut VortexNoise::new(Vec3::splat(THICKNESS), seed));
                spheres.push(RbSphere::new(Vec3::ZERO, Vec3::ZERO, 100.0, 0.2));
                torque = Vec3::new(0.0, 0.0, 10.0);
            }
            Scenario::SphereInSpinningFluid => {
                assign(
                    2.0 * MAGNITUDE,
                    NUM_VORTONS_MAX,
                    &mut VortexTube::new(THICKNESS, 0.0, 2.0 * THICKNESS, 2, 0),
                );
                spheres.push(RbSphere::new(Vec3::ZERO, Vec3::ZERO, 5.0, 0.1));
            }
            Scenario::SpanwiseSheet => {
                assign(MAGNITUDE, NUM_VORTONS_MAX, &mut VortexSheet::new(THICKNESS, 0.2, 7.0 * THICKNESS));
            }
            Scenario::VortexTube => {
                assign(MAGNITUDE, NUM_VORTONS_MAX, &mut VortexTube::new(THICKNESS, 0.0, 2.0 * THICKNESS, 2, 0));
            }
            Scenario::OrthogonalTubes => {
                assign(MAGNITUDE, NUM_VORTONS_MAX, &mut VortexTube::new(THICKNESS, 0.0, 4.0 * THICKNESS, 2, -1));
                assign(MAGNITUDE, NUM_VORTONS_MAX, &mut VortexTube::new(THICKNESS, 0.0, 4.0 * THICKNESS, 2, 1));
            }
            Scenario::Sheet2d => {
                assign(MAGNITUDE, NUM_VORTONS_MAX, &mut VortexSheet::new(THICKNESS, 0.0, 2.0 * THICKNESS));
            }
        }

        for mut sphere in spheres {
            sphere.apply_impulsive_torque(torque);
            sim.add_sphere(sphere);
        }
        sim.initialize(self.tracers_per_cell());

        log::info!(
            "Loaded scenario {}: {} vortons, {} tracers, {} spheres",
            self,
            sim.vorton_sim().vortons().len(),
            sim.vorton_sim().tracers().len(),
            sim.spheres().len()
        );
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scenario::VortexRing => "vortex ring",
            Scenario::JetRing => "jet ring",
            Scenario::Projectile => "projectile",
            Scenario::ProjectileLongitudinalSpin => "projectile with longitudinal spin",
            Scenario::ProjectileTransverseSpin => "projectile with transverse spin",
            Scenario::SpinningSphere => "spinning sphere",
            Scenario::SphereInSpinningFluid => "sphere in spinning fluid",
            Scenario::SpanwiseSheet => "vortex sheet with spanwise variation",
            Scenario::VortexTube => "vortex tube",
            Scenario::OrthogonalTubes => "two orthogonal vortex tubes",
            Scenario::Sheet2d => "2D sheet",
        };
        write!(f, "{}", name)
    }
}
