use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::parallel::ExecutionStrategy;

/// Settings for a tracer emitter attached to the tracer pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterConfig {
    pub center: Vec3,
    /// Half-extent of the box particles are scattered in.
    pub spread: Vec3,
    pub velocity: Vec3,
    /// Particles per second.
    pub rate: f32,
    pub radius: f32,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            spread: Vec3::splat(0.5),
            velocity: Vec3::ZERO,
            rate: 100.0,
            radius: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub viscosity: f32,
    pub density: f32,
    /// Approximate number of cells in the velocity grid.
    pub grid_cell_budget: usize,
    /// Scales vortex stretching and tilting; 1.0 is the physical value.
    pub stretch_tilt_scale: f32,
    /// Tracers older than this many frames are removed.
    pub tracer_max_age: Option<u32>,
    pub tracer_emitter: Option<EmitterConfig>,
    pub execution: ExecutionStrategy,
    pub seed: u64,
    pub time_step: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            viscosity: 0.01,
            density: 1.0,
            grid_cell_budget: 16 * 16 * 16,
            stretch_tilt_scale: 0.5,
            tracer_max_age: None,
            tracer_emitter: None,
            execution: ExecutionStrategy::ThreadPool { threads: 0 },
            seed: 1,
            time_step: 1.0 / 30.0,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> SimResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded simulation config from {:?}", path);
        Ok(config)
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.viscosity >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "viscosity must be non-negative, got {}",
                self.viscosity
            )));
        }
        if !(self.density > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "density must be positive, got {}",
                self.density
            )));
        }
        if self.grid_cell_budget == 0 {
            return Err(SimError::InvalidConfig(
                "grid_cell_budget must be at least 1".to_string(),
            ));
        }
        if !(self.time_step > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if let Some(emitter) = &self.tracer_emitter {
            if !(emitter.rate >= 0.0 && emitter.rate.is_finite()) {
                return Err(SimError::InvalidConfig(format!(
                    "emitter rate must be finite and non-negative, got {}",
                    emitter.rate
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = SimConfig::from_json_str(r#"{ "viscosity": 0.5, "tracer_max_age": 30 }"#)
            .expect("partial config should parse");
        assert_eq!(config.viscosity, 0.5);
        assert_eq!(config.tracer_max_age, Some(30));
        assert_eq!(config.density, 1.0);
    }

    #[test]
    fn json_round_trip_preserves_strategy() {
        let config = SimConfig {
            execution: ExecutionStrategy::Sequential,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        let parsed = SimConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn rejects_bad_values() {
        let bad_density = SimConfig {
            density: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            bad_density.validate(),
            Err(SimError::InvalidConfig(_))
        ));

        let bad_viscosity = SimConfig {
            viscosity: -1.0,
            ..Default::default()
        };
        assert!(bad_viscosity.validate().is_err());

        assert!(SimConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn rejects_unbounded_emitter_rate() {
        for rate in [f32::INFINITY, f32::NAN, -1.0] {
            let config = SimConfig {
                tracer_emitter: Some(EmitterConfig {
                    rate,
                    ..Default::default()
                }),
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(SimError::InvalidConfig(_))),
                "rate {} should be rejected",
                rate
            );
        }
    }
}
