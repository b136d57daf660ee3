use std::path::{Path, PathBuf};

use vortonsim::{AnalysisRecorder, FluidBodySim, Scenario, SimConfig, SnapshotExporter};

/// Owns the simulation and the frame counter for a headless run.
struct Driver {
    sim: FluidBodySim,
    frame: u32,
    time_step: f32,
}

impl Driver {
    fn new(config: SimConfig, scenario: Scenario) -> Self {
        let time_step = config.time_step;
        let mut sim = FluidBodySim::new(config);
        scenario.load(&mut sim);
        Self {
            sim,
            frame: 0,
            time_step,
        }
    }

    fn advance(&mut self) {
        self.frame += 1;
        self.sim.update(self.time_step, self.frame);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    let scenario_index = match args.get(1) {
        Some(arg) => arg.parse::<usize>()?,
        None => 0,
    };
    let scenario = Scenario::from_index(scenario_index)
        .ok_or_else(|| format!("unknown scenario {} (expected 0..=10)", scenario_index))?;
    let frames = match args.get(2) {
        Some(arg) => arg.parse::<u32>()?,
        None => 60,
    };
    let config = match args.get(3) {
        Some(path) if path != "-" => SimConfig::from_json_file(Path::new(path))?,
        _ => SimConfig::default(),
    };
    let export_dir = args.get(4).map(PathBuf::from);

    run_headless(config, scenario, frames, export_dir.as_deref())
}

fn run_headless(
    config: SimConfig,
    scenario: Scenario,
    frames: u32,
    export_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("Running scenario {} ({}) for {} frames", scenario.index(), scenario, frames);

    let mut driver = Driver::new(config, scenario);
    let mut recorder = AnalysisRecorder::new();
    let exporter = SnapshotExporter::default();

    recorder.record_frame(&driver.sim, driver.frame).log_summary();
    if let Some(dir) = export_dir {
        std::fs::create_dir_all(dir)?;
        exporter.export_json(&driver.sim, driver.frame, &dir.join(format!("frame_{:04}.json", driver.frame)))?;
    }

    let started = std::time::Instant::now();
    for _ in 0..frames {
        driver.advance();
        let metrics = recorder.record_frame(&driver.sim, driver.frame);
        if driver.frame % 10 == 0 {
            metrics.log_summary();
        }
        if let Some(dir) = export_dir {
            let path = dir.join(format!("frame_{:04}.json", driver.frame));
            exporter.export_json(&driver.sim, driver.frame, &path)?;
        }
    }
    let elapsed = started.elapsed();

    recorder.log_trends();
    log::info!(
        "Completed {} frames in {:.2?} ({:.2} ms/frame)",
        frames,
        elapsed,
        elapsed.as_secs_f64() * 1000.0 / frames.max(1) as f64
    );
    Ok(())
}
