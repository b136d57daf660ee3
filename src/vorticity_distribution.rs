//! Analytic vorticity fields used to seed vortons.
//!
//! Each distribution is centred on the origin and returns a raw vorticity of
//! order one; [`assign_vorticity`] scales it and turns it into vortons.

use std::f32::consts::PI;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::particle::{Particle, ParticleStore};

pub trait VorticityDistribution {
    /// Size of the box, centred on the origin, outside which vorticity is zero.
    fn domain_size(&self) -> Vec3;
    fn vorticity_at(&mut self, offset: Vec3) -> Vec3;
}

/// Smooth bump: 1 at the centre, 0 at `|x| >= half_width`.
fn bump(x: f32, half_width: f32) -> f32 {
    if x.abs() >= half_width {
        0.0
    } else {
        0.5 * ((PI * x / half_width).cos() + 1.0)
    }
}

/// Splits `offset` into the component along `axis` and the radial part.
fn axial_radial(offset: Vec3, axis: Vec3) -> (f32, Vec3) {
    let axial = offset.dot(axis);
    (axial, offset - axis * axial)
}

/// Torus of vorticity circulating around `direction`; the ring travels along it.
#[derive(Debug, Clone, Copy)]
pub struct VortexRing {
    pub radius: f32,
    pub thickness: f32,
    pub direction: Vec3,
}

impl VortexRing {
    pub fn new(radius: f32, thickness: f32, direction: Vec3) -> Self {
        Self {
            radius,
            thickness,
            direction: direction.normalize_or_zero(),
        }
    }
}

impl VorticityDistribution for VortexRing {
    fn domain_size(&self) -> Vec3 {
        Vec3::splat(2.0 * (self.radius + self.thickness))
    }

    fn vorticity_at(&mut self, offset: Vec3) -> Vec3 {
        let (axial, radial) = axial_radial(offset, self.direction);
        let rho = radial.length();
        if rho <= f32::EPSILON {
            return Vec3::ZERO;
        }
        let core_distance = ((rho - self.radius).powi(2) + axial * axial).sqrt();
        let profile = bump(core_distance, self.thickness);
        let tangent = radial.cross(self.direction) / rho;
        tangent * profile
    }
}

/// Cylindrical shell of uniform vorticity, which induces a jet along
/// `direction` through the ring's hole.
#[derive(Debug, Clone, Copy)]
pub struct JetRing {
    pub radius: f32,
    pub thickness: f32,
    pub direction: Vec3,
}

impl JetRing {
    pub fn new(radius: f32, thickness: f32, direction: Vec3) -> Self {
        Self {
            radius,
            thickness,
            direction: direction.normalize_or_zero(),
        }
    }
}

impl VorticityDistribution for JetRing {
    fn domain_size(&self) -> Vec3 {
        Vec3::splat(2.0 * (self.radius + self.thickness))
    }

    fn vorticity_at(&mut self, offset: Vec3) -> Vec3 {
        let (axial, radial) = axial_radial(offset, self.direction);
        let rho = radial.length();
        let half = 0.5 * self.thickness;
        if rho <= f32::EPSILON || (rho - self.radius).abs() > half || axial.abs() > half {
            return Vec3::ZERO;
        }
        radial.cross(self.direction) / rho
    }
}

/// Uniformly random vorticity inside a box.
#[derive(Debug, Clone)]
pub struct VortexNoise {
    pub extent: Vec3,
    rng: StdRng,
}

impl VortexNoise {
    pub fn new(extent: Vec3, seed: u64) -> Self {
        Self {
            extent,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl VorticityDistribution for VortexNoise {
    fn domain_size(&self) -> Vec3 {
        self.extent
    }

    fn vorticity_at(&mut self, _offset: Vec3) -> Vec3 {
        Vec3::new(
            self.rng.gen_range(-1.0..=1.0),
            self.rng.gen_range(-1.0..=1.0),
            self.rng.gen_range(-1.0..=1.0),
        )
    }
}

/// Shear layer in the xz-plane with spanwise (z) vorticity, optionally
/// modulated along x.
#[derive(Debug, Clone, Copy)]
pub struct VortexSheet {
    pub thickness: f32,
    pub variation: f32,
    pub width: f32,
}

impl VortexSheet {
    pub fn new(thickness: f32, variation: f32, width: f32) -> Self {
        Self {
            thickness,
            variation,
            width,
        }
    }
}

impl VorticityDistribution for VortexSheet {
    fn domain_size(&self) -> Vec3 {
        Vec3::new(self.width, self.thickness, self.width)
    }

    fn vorticity_at(&mut self, offset: Vec3) -> Vec3 {
        if offset.y.abs() > 0.5 * self.thickness {
            return Vec3::ZERO;
        }
        let modulation = 1.0 + self.variation * (2.0 * PI * offset.x / self.width).sin();
        Vec3::new(0.0, 0.0, modulation)
    }
}

/// Straight tube of vorticity.
///
/// `axis` selects the tube direction (0 = x, 1 = y, 2 = z). The tube is
/// shifted perpendicular to its axis by `offset * thickness`, and `offset`'s
/// sign flips the axis so two tubes with opposite offsets are orthogonal.
#[derive(Debug, Clone, Copy)]
pub struct VortexTube {
    pub thickness: f32,
    pub variation: f32,
    pub width: f32,
    pub axis: usize,
    pub offset: i32,
}

impl VortexTube {
    pub fn new(thickness: f32, variation: f32, width: f32, axis: usize, offset: i32) -> Self {
        Self {
            thickness,
            variation,
            width,
            axis: axis.min(2),
            offset,
        }
    }

    fn axis_vector(&self) -> Vec3 {
        let axis = if self.offset < 0 {
            (self.axis + 1) % 3
        } else {
            self.axis
        };
        let mut v = Vec3::ZERO;
        v[axis] = 1.0;
        v
    }
}

impl VorticityDistribution for VortexTube {
    fn domain_size(&self) -> Vec3 {
        Vec3::splat(self.width)
    }

    fn vorticity_at(&mut self, offset: Vec3) -> Vec3 {
        let axis = self.axis_vector();
        let shift_dir = axis.any_orthonormal_vector();
        let center = shift_dir * (self.offset as f32 * self.thickness);
        let (along, radial) = axial_radial(offset - center, axis);
        let profile = bump(radial.length(), self.thickness);
        if profile <= 0.0 {
            return Vec3::ZERO;
        }
        let modulation = 1.0 + self.variation * (2.0 * PI * along / self.width).cos();
        axis * (profile * modulation)
    }
}

/// Samples `distribution` on a lattice of about `num_vortons_max` points and
/// appends a vorton at every point whose raw vorticity is non-negligible.
/// Returns the number of vortons added.
pub fn assign_vorticity(
    vortons: &mut ParticleStore,
    magnitude: f32,
    num_vortons_max: usize,
    density: f32,
    distribution: &mut dyn VorticityDistribution,
) -> usize {
    let size = distribution.domain_size();
    let volume = size.x * size.y * size.z;
    if num_vortons_max == 0 || !(volume > 0.0) {
        return 0;
    }
    let spacing = (volume / num_vortons_max as f32).cbrt();
    let radius = 0.5 * spacing;
    let counts = [
        ((size.x / spacing).round() as usize).max(1),
        ((size.y / spacing).round() as usize).max(1),
        ((size.z / spacing).round() as usize).max(1),
    ];
    let step = size / Vec3::new(counts[0] as f32, counts[1] as f32, counts[2] as f32);
    let min_corner = -0.5 * size + 0.5 * step;
    let mass = density * (2.0 * radius).powi(3);

    let before = vortons.len();
    for iz in 0..counts[2] {
        for iy in 0..counts[1] {
            for ix in 0..counts[0] {
                let position = min_corner + step * Vec3::new(ix as f32, iy as f32, iz as f32);
                let raw = distribution.vorticity_at(position);
                if raw.length_squared() > f32::EPSILON {
                    vortons.push(Particle::vorton(position, raw * magnitude, radius, mass));
                }
            }
        }
    }
    let added = vortons.len() - before;
    log::debug!(
        "Assigned {} vortons (lattice {}x{}x{}, radius {:.4})",
        added,
        counts[0],
        counts[1],
        counts[2],
        radius
    );
    added
}
