use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Solid sphere coupled to the fluid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RbSphere {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Rotation vector: axis scaled by angle in radians.
    pub orientation: Vec3,
    pub angular_velocity: Vec3,
    pub angular_momentum: Vec3,
    pub radius: f32,
    pub mass: f32,
    pub inverse_mass: f32,
    pub inverse_inertia: f32,
}

impl RbSphere {
    /// Zero mass makes the sphere immovable; zero mass or radius makes it
    /// unable to spin.
    pub fn new(position: Vec3, velocity: Vec3, mass: f32, radius: f32) -> Self {
        let inertia = 0.4 * mass * radius * radius;
        Self {
            position,
            velocity,
            orientation: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            angular_momentum: Vec3::ZERO,
            radius,
            mass,
            inverse_mass: if mass > 0.0 { 1.0 / mass } else { 0.0 },
            inverse_inertia: if inertia > 0.0 { 1.0 / inertia } else { 0.0 },
        }
    }

    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.velocity += impulse * self.inverse_mass;
    }

    pub fn apply_impulsive_torque(&mut self, torque: Vec3) {
        self.angular_momentum += torque;
        self.angular_velocity = self.angular_momentum * self.inverse_inertia;
    }

    /// Velocity of the body material at `point`.
    pub fn velocity_at(&self, point: Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(point - self.position)
    }

    pub fn contains(&self, point: Vec3) -> bool {
        (point - self.position).length_squared() < self.radius * self.radius
    }

    pub fn update(&mut self, time_step: f32) {
        self.position += self.velocity * time_step;
        self.orientation += self.angular_velocity * time_step;
    }

    pub fn momentum(&self) -> Vec3 {
        self.velocity * self.mass
    }
}
