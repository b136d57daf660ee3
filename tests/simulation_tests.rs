use glam::Vec3;
use vortonsim::vorticity_distribution::{assign_vorticity, VortexNoise, VortexRing};
use vortonsim::{
    EmitterConfig, ExecutionStrategy, FluidBodySim, RbSphere, Scenario, SimConfig, VortonSim,
};

fn small_config(execution: ExecutionStrategy) -> SimConfig {
    SimConfig {
        execution,
        grid_cell_budget: 64,
        ..Default::default()
    }
}

fn ring_sim(config: SimConfig, num_vortons: usize) -> VortonSim {
    let density = config.density;
    let mut sim = VortonSim::new(config);
    let added = assign_vorticity(
        sim.vortons_mut(),
        10.0,
        num_vortons,
        density,
        &mut VortexRing::new(1.0, 1.0, Vec3::X),
    );
    assert!(added > 0, "ring should produce vortons");
    sim
}

#[test]
fn test_empty_update_is_noop() {
    let mut sim = VortonSim::new(small_config(ExecutionStrategy::Sequential));
    for frame in 1..=3 {
        sim.update(1.0 / 30.0, frame);
    }
    assert!(sim.vortons().is_empty());
    assert!(sim.tracers().is_empty());
    assert!(sim.velocity_grid().is_none());
    assert!(sim.tracer_center_of_mass().is_none());
}

#[test]
fn test_initialize_fills_every_cell() {
    let mut sim = ring_sim(small_config(ExecutionStrategy::Sequential), 400);
    sim.initialize(2);

    let grid = sim.velocity_grid().expect("initialize should build the grid");
    let shape = *grid.shape();
    assert_eq!(sim.tracers().len(), shape.total_cells() * 8);

    let (min, max) = (shape.min_corner, shape.max_corner());
    for tracer in sim.tracers() {
        assert_eq!(tracer.birth_time, 0);
        assert_eq!(tracer.vorticity, Vec3::ZERO);
        assert!(
            tracer.position.cmpge(min - 1e-4).all() && tracer.position.cmple(max + 1e-4).all(),
            "tracer {:?} outside grid [{:?}, {:?}]",
            tracer.position,
            min,
            max
        );
    }
    assert!(sim.tracer_center_of_mass().is_some());
}

#[test]
fn test_initialize_without_vortons_drops_stale_grid() {
    let mut sim = ring_sim(small_config(ExecutionStrategy::Sequential), 200);
    sim.initialize(1);
    assert!(sim.velocity_grid().is_some());
    assert!(sim.tracer_center_of_mass().is_some());

    sim.vortons_mut().clear();
    sim.initialize(1);

    assert!(sim.tracers().is_empty());
    assert!(sim.velocity_grid().is_none(), "grid from the removed vortons should be dropped");
    assert!(sim.tracer_center_of_mass().is_none());
}

#[test]
fn test_clear_empties_everything() {
    let mut sim = FluidBodySim::new(small_config(ExecutionStrategy::Sequential));
    Scenario::SpinningSphere.load(&mut sim);
    sim.update(1.0 / 30.0, 1);
    assert!(!sim.vorton_sim().vortons().is_empty());
    assert!(!sim.vorton_sim().tracers().is_empty());
    assert_eq!(sim.spheres().len(), 1);

    sim.clear();

    assert!(sim.vorton_sim().vortons().is_empty());
    assert!(sim.vorton_sim().tracers().is_empty());
    assert!(sim.vorton_sim().velocity_grid().is_none());
    assert!(sim.vorton_sim().eternal_bounds().is_none());
    assert!(sim.spheres().is_empty());
}

#[test]
fn test_sequential_and_parallel_agree() {
    let make = |execution| {
        let config = SimConfig {
            viscosity: 0.2,
            tracer_max_age: Some(3),
            tracer_emitter: Some(EmitterConfig {
                rate: 90.0,
                ..Default::default()
            }),
            ..small_config(execution)
        };
        let mut sim = ring_sim(config, 300);
        sim.initialize(2);
        sim
    };
    let mut sequential = make(ExecutionStrategy::Sequential);
    let mut parallel = make(ExecutionStrategy::ThreadPool { threads: 4 });
    assert!(parallel.executor().is_parallel());

    for frame in 1..=5 {
        sequential.update(1.0 / 30.0, frame);
        parallel.update(1.0 / 30.0, frame);
    }

    assert_eq!(sequential.vortons().as_slice(), parallel.vortons().as_slice());
    assert_eq!(sequential.tracers().as_slice(), parallel.tracers().as_slice());
}

#[test]
fn test_diffusion_conserves_total_vorticity() {
    let config = SimConfig {
        viscosity: 0.5,
        stretch_tilt_scale: 0.0,
        ..small_config(ExecutionStrategy::ThreadPool { threads: 2 })
    };
    let mut sim = ring_sim(config, 500);
    let before: Vec3 = sim.vortons().iter().map(|v| v.vorticity).sum();
    let scale: f32 = sim.vortons().iter().map(|v| v.vorticity.length()).sum();
    let initial: Vec<Vec3> = sim.vortons().iter().map(|v| v.vorticity).collect();
    let circulation_before = sim.vortons().total_vorticity(sim.executor());
    let weighted_scale: f32 = sim.vortons().iter().map(|v| v.vorticity.length() * v.volume()).sum();

    for frame in 1..=3 {
        sim.update(1.0 / 30.0, frame);
    }

    let after: Vec3 = sim.vortons().iter().map(|v| v.vorticity).sum();
    assert!(
        (after - before).length() <= 1e-4 * scale,
        "total vorticity drifted from {:?} to {:?}",
        before,
        after
    );
    // Equal vorton volumes, so the weighted total is conserved too.
    let circulation_after = sim.vortons().total_vorticity(sim.executor());
    assert!(
        (circulation_after - circulation_before).length() <= 1e-4 * weighted_scale,
        "circulation drifted from {:?} to {:?}",
        circulation_before,
        circulation_after
    );
    let changed = sim
        .vortons()
        .iter()
        .zip(&initial)
        .any(|(v, w)| (v.vorticity - *w).length() > 1e-6);
    assert!(changed, "diffusion should exchange vorticity between cell mates");
}

#[test]
fn test_eternal_bounds_only_grow() {
    let mut sim = ring_sim(small_config(ExecutionStrategy::Sequential), 300);
    sim.update(0.1, 1);
    let (min0, max0) = sim.eternal_bounds().expect("bounds after first update");
    for frame in 2..=4 {
        sim.update(0.1, frame);
        let (min, max) = sim.eternal_bounds().unwrap();
        assert!(min.cmple(min0).all() && max.cmpge(max0).all());
    }
    assert_eq!(sim.min_corner_eternal(), sim.eternal_bounds().map(|b| b.0));
}

#[test]
fn test_tracers_pushed_out_of_sphere() {
    let config = small_config(ExecutionStrategy::ThreadPool { threads: 3 });
    let density = config.density;
    let mut sim = FluidBodySim::new(config);
    assign_vorticity(
        sim.vorton_sim_mut().vortons_mut(),
        1.0e-6,
        512,
        density,
        &mut VortexNoise::new(Vec3::splat(2.0), 3),
    );
    sim.initialize(3);
    let sphere = RbSphere::new(Vec3::ZERO, Vec3::ZERO, 1.0, 0.5);
    assert!(
        sim.vorton_sim().tracers().iter().any(|t| sphere.contains(t.position)),
        "setup should start with tracers inside the sphere"
    );
    sim.add_sphere(sphere);

    sim.solve_boundary_conditions();

    for tracer in sim.vorton_sim().tracers() {
        assert!(!sphere.contains(tracer.position), "tracer left inside at {:?}", tracer.position);
    }
    for vorton in sim.vorton_sim().vortons() {
        let dist = (vorton.position - sphere.position).length();
        assert!(dist >= sphere.radius + vorton.radius - 1e-5);
    }
}

#[test]
fn test_projectile_loses_speed() {
    let mut sim = FluidBodySim::new(small_config(ExecutionStrategy::ThreadPool { threads: 0 }));
    Scenario::Projectile.load(&mut sim);
    assert_eq!(sim.spheres().len(), 1);
    let start = sim.spheres()[0];

    for frame in 1..=3 {
        sim.update(1.0 / 30.0, frame);
    }

    let sphere = sim.spheres()[0];
    assert!(sphere.position.x > start.position.x, "projectile should move forward");
    assert!(
        sphere.velocity.x < start.velocity.x,
        "fluid drag should slow the projectile, got {:?}",
        sphere.velocity
    );
}

#[test]
fn test_every_scenario_loads() {
    for scenario in Scenario::ALL {
        let mut sim = FluidBodySim::new(small_config(ExecutionStrategy::Sequential));
        scenario.load(&mut sim);
        assert!(!sim.vorton_sim().vortons().is_empty(), "{} has no vortons", scenario);
        assert!(!sim.vorton_sim().tracers().is_empty(), "{} has no tracers", scenario);
        assert_eq!(sim.spheres().is_empty(), !scenario.has_sphere(), "{}", scenario);
    }
}
