use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::fluid_body_sim::FluidBodySim;
use crate::particle::{Particle, ParticleStore};
use crate::rigid_body::RbSphere;
use crate::vorton_sim::VortonSim;

/// Read-only view a renderer or exporter takes of the simulation.
pub trait ParticleData {
    fn vortons(&self) -> &ParticleStore;
    fn tracers(&self) -> &ParticleStore;
    fn spheres(&self) -> &[RbSphere];
}

impl ParticleData for VortonSim {
    fn vortons(&self) -> &ParticleStore {
        VortonSim::vortons(self)
    }

    fn tracers(&self) -> &ParticleStore {
        VortonSim::tracers(self)
    }

    fn spheres(&self) -> &[RbSphere] {
        &[]
    }
}

impl ParticleData for FluidBodySim {
    fn vortons(&self) -> &ParticleStore {
        self.vorton_sim().vortons()
    }

    fn tracers(&self) -> &ParticleStore {
        self.vorton_sim().tracers()
    }

    fn spheres(&self) -> &[RbSphere] {
        FluidBodySim::spheres(self)
    }
}

pub trait Step {
    fn step(&mut self, time_step: f32, frame: u32);
}

impl Step for VortonSim {
    fn step(&mut self, time_step: f32, frame: u32) {
        self.update(time_step, frame);
    }
}

impl Step for FluidBodySim {
    fn step(&mut self, time_step: f32, frame: u32) {
        self.update(time_step, frame);
    }
}

/// Everything a renderer reads after one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub frame: u32,
    pub vortons: Vec<Particle>,
    pub tracers: Vec<Particle>,
    pub spheres: Vec<RbSphere>,
}

impl Snapshot {
    pub fn capture(simulation: &impl ParticleData, frame: u32) -> Self {
        Self {
            frame,
            vortons: simulation.vortons().as_slice().to_vec(),
            tracers: simulation.tracers().as_slice().to_vec(),
            spheres: simulation.spheres().to_vec(),
        }
    }

    pub fn load(path: &Path) -> SimResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

pub struct SnapshotExporter {
    pretty: bool,
}

impl SnapshotExporter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn export_json(&self, simulation: &impl ParticleData, frame: u32, path: &Path) -> SimResult<()> {
        let snapshot = Snapshot::capture(simulation, frame);
        let writer = BufWriter::new(File::create(path)?);
        if self.pretty {
            serde_json::to_writer_pretty(writer, &snapshot)?;
        } else {
            serde_json::to_writer(writer, &snapshot)?;
        }
        log::debug!("Wrote snapshot for frame {} to {:?}", frame, path);
        Ok(())
    }

    /// Steps `simulation` `steps` times, writing a snapshot after each step.
    /// Frames are numbered from `first_frame`.
    pub fn export_frame_sequence(
        &self,
        simulation: &mut (impl ParticleData + Step),
        steps: u32,
        first_frame: u32,
        time_step: f32,
        output_dir: &Path,
        prefix: &str,
    ) -> SimResult<Vec<PathBuf>> {
        std::fs::create_dir_all(output_dir)?;
        let mut written = Vec::with_capacity(steps as usize);
        for i in 0..steps {
            let frame = first_frame + i;
            simulation.step(time_step, frame);

            let filename = format!("{}_frame_{:04}.json", prefix, frame);
            let path = output_dir.join(filename);
            self.export_json(&*simulation, frame, &path)?;
            written.push(path);
        }
        Ok(written)
    }
}

impl Default for SnapshotExporter {
    fn default() -> Self {
        Self::new(false)
    }
}
