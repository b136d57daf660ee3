use glam::Vec3;

use crate::export::ParticleData;

#[derive(Debug, Clone)]
pub struct SimMetrics {
    pub num_vortons: usize,
    pub num_tracers: usize,
    /// Volume-weighted vorticity sum (total circulation).
    pub total_circulation: Vec3,
    pub max_vorticity: f32,
    pub avg_vorticity: f32,
    pub max_tracer_speed: f32,
    pub avg_tracer_speed: f32,
    pub tracer_center_of_mass: Vec3,
    pub sphere_kinetic_energy: f32,
    pub sphere_momentum: Vec3,
    pub frame: u32,
}

impl SimMetrics {
    pub fn analyze(simulation: &impl ParticleData, frame: u32) -> Self {
        let mut total_circulation = Vec3::ZERO;
        let mut max_vorticity: f32 = 0.0;
        let mut vorticity_sum: f32 = 0.0;
        for vorton in simulation.vortons() {
            total_circulation += vorton.vorticity * vorton.volume();
            let magnitude = vorton.vorticity.length();
            max_vorticity = max_vorticity.max(magnitude);
            vorticity_sum += magnitude;
        }

        let mut max_tracer_speed: f32 = 0.0;
        let mut speed_sum: f32 = 0.0;
        let mut position_sum = Vec3::ZERO;
        for tracer in simulation.tracers() {
            let speed = tracer.velocity.length();
            max_tracer_speed = max_tracer_speed.max(speed);
            speed_sum += speed;
            position_sum += tracer.position;
        }

        let mut sphere_kinetic_energy = 0.0;
        let mut sphere_momentum = Vec3::ZERO;
        for sphere in simulation.spheres() {
            sphere_kinetic_energy += 0.5 * sphere.mass * sphere.velocity.length_squared()
                + 0.5 * sphere.angular_momentum.dot(sphere.angular_velocity);
            sphere_momentum += sphere.momentum();
        }

        let num_vortons = simulation.vortons().len();
        let num_tracers = simulation.tracers().len();
        let mean = |sum: f32, n: usize| if n > 0 { sum / n as f32 } else { 0.0 };

        Self {
            num_vortons,
            num_tracers,
            total_circulation,
            max_vorticity,
            avg_vorticity: mean(vorticity_sum, num_vortons),
            max_tracer_speed,
            avg_tracer_speed: mean(speed_sum, num_tracers),
            tracer_center_of_mass: if num_tracers > 0 {
                position_sum / num_tracers as f32
            } else {
                Vec3::ZERO
            },
            sphere_kinetic_energy,
            sphere_momentum,
            frame,
        }
    }

    pub fn log_summary(&self) {
        log::info!(
            "Frame {}: {} vortons, {} tracers",
            self.frame,
            self.num_vortons,
            self.num_tracers
        );
        log::info!(
            "  Circulation: {:.6?}  Max/avg vorticity: {:.6} / {:.6}",
            self.total_circulation,
            self.max_vorticity,
            self.avg_vorticity
        );
        log::info!(
            "  Max/avg tracer speed: {:.6} / {:.6}  Tracer CoM: {:.4?}",
            self.max_tracer_speed,
            self.avg_tracer_speed,
            self.tracer_center_of_mass
        );
        if self.sphere_kinetic_energy > 0.0 {
            log::info!(
                "  Sphere energy: {:.6}  momentum: {:.6?}",
                self.sphere_kinetic_energy,
                self.sphere_momentum
            );
        }
    }
}

#[derive(Default)]
pub struct AnalysisRecorder {
    pub metrics_history: Vec<SimMetrics>,
}

impl AnalysisRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&mut self, simulation: &impl ParticleData, frame: u32) -> &SimMetrics {
        self.metrics_history.push(SimMetrics::analyze(simulation, frame));
        &self.metrics_history[self.metrics_history.len() - 1]
    }

    pub fn log_trends(&self) {
        let (Some(first), Some(last)) = (self.metrics_history.first(), self.metrics_history.last()) else {
            return;
        };
        if self.metrics_history.len() < 2 {
            return;
        }

        let percent = |from: f32, to: f32| (to - from) / from.abs().max(0.001) * 100.0;

        log::info!("=== TREND ANALYSIS ===");
        log::info!(
            "Circulation change: {:.6?} -> {:.6?} ({:.6} drift)",
            first.total_circulation,
            last.total_circulation,
            (last.total_circulation - first.total_circulation).length()
        );
        log::info!(
            "Max vorticity change: {:.6} -> {:.6} ({:+.3}%)",
            first.max_vorticity,
            last.max_vorticity,
            percent(first.max_vorticity, last.max_vorticity)
        );
        log::info!(
            "Tracer count change: {} -> {}",
            first.num_tracers,
            last.num_tracers
        );
        log::info!(
            "Tracer CoM travel: {:.6}",
            (last.tracer_center_of_mass - first.tracer_center_of_mass).length()
        );
        if first.sphere_kinetic_energy > 0.0 || last.sphere_kinetic_energy > 0.0 {
            log::info!(
                "Sphere energy change: {:.6} -> {:.6} ({:+.3}%)",
                first.sphere_kinetic_energy,
                last.sphere_kinetic_energy,
                percent(first.sphere_kinetic_energy, last.sphere_kinetic_energy)
            );
        }
    }
}
