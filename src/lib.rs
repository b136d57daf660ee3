//! Vortex particle fluid simulation with rigid sphere coupling

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod fluid_body_sim;
pub mod grid;
pub mod operation;
pub mod parallel;
pub mod particle;
pub mod rigid_body;
pub mod scenario;
pub mod vorticity_distribution;
pub mod vorton_sim;

pub use analysis::{AnalysisRecorder, SimMetrics};
pub use config::{EmitterConfig, SimConfig};
pub use error::{SimError, SimResult};
pub use export::{ParticleData, Snapshot, SnapshotExporter, Step};
pub use fluid_body_sim::FluidBodySim;
pub use grid::{GridShape, UniformGrid};
pub use operation::{Advect, Emit, KillAge, KillStats, OperationContext, OperationPipeline, ParticleOperation};
pub use parallel::{ExecutionStrategy, Executor, SharedAccumulator};
pub use particle::{Particle, ParticleStore};
pub use rigid_body::RbSphere;
pub use scenario::Scenario;
pub use vorton_sim::VortonSim;
