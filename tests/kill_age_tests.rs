use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vortonsim::{Executor, KillAge, OperationContext, Particle, ParticleOperation, ParticleStore};

fn store_with_births(births: &[u32]) -> ParticleStore {
    births
        .iter()
        .enumerate()
        .map(|(i, &b)| Particle::tracer(Vec3::new(i as f32, 0.0, 0.0), 0.1, b))
        .collect()
}

fn sorted_births(store: &ParticleStore) -> Vec<u32> {
    let mut births: Vec<u32> = store.iter().map(|p| p.birth_time).collect();
    births.sort_unstable();
    births
}

#[test]
fn test_five_particles_frame_four_age_max_two() {
    let mut store = store_with_births(&[0, 1, 2, 3, 4]);
    let stats = KillAge::new(2).kill(&mut store, 4);

    assert_eq!(store.len(), 3, "ages [4,3,2,1,0] with age_max 2 should leave 3");
    assert_eq!(sorted_births(&store), vec![2, 3, 4]);
    assert_eq!(stats.removed, 2);
    assert_eq!(stats.examined, 5);
}

#[test]
fn test_empty_store_is_noop() {
    for age_max in [0, 1, 100] {
        for frame in [0, 7, u32::MAX] {
            let mut store = ParticleStore::new();
            let stats = KillAge::new(age_max).kill(&mut store, frame);
            assert!(store.is_empty());
            assert_eq!(stats.examined, 0);
        }
    }
}

#[test]
fn test_born_this_frame_survives_age_max_zero() {
    let mut store = store_with_births(&[9, 9, 9, 9]);
    let stats = KillAge::new(0).kill(&mut store, 9);
    assert_eq!(store.len(), 4, "age 0 is not greater than age_max 0");
    assert_eq!(stats.removed, 0);
}

#[test]
fn test_future_born_particles_are_never_killed() {
    let mut store = store_with_births(&[10, 20]);
    KillAge::new(0).kill(&mut store, 5);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_all_killed_leaves_store_empty() {
    let mut store = store_with_births(&[0, 0, 1, 2]);
    let stats = KillAge::new(1).kill(&mut store, 10);
    assert!(store.is_empty());
    assert_eq!(stats.examined, 4);
    assert_eq!(stats.removed, 4);
}

#[test]
fn test_no_kill_pass_leaves_store_untouched() {
    let mut store = store_with_births(&[5, 3, 8, 4, 6]);
    for (i, p) in store.iter_mut().enumerate() {
        p.vorticity = Vec3::splat(i as f32);
        p.velocity = Vec3::new(0.0, i as f32, 1.0);
    }
    let before = store.clone();

    KillAge::new(10).kill(&mut store, 12);

    assert_eq!(store.as_slice(), before.as_slice(), "no removals means no changes, order included");
}

#[test]
fn test_partition_property_random_stores() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let len = rng.gen_range(0..64);
        let births: Vec<u32> = (0..len).map(|_| rng.gen_range(0..50)).collect();
        let frame = rng.gen_range(0..60);
        let age_max = rng.gen_range(0..20);

        let mut store = store_with_births(&births);
        let stats = KillAge::new(age_max).kill(&mut store, frame);

        let age = |b: u32| frame as i64 - b as i64;
        let mut expected_kept: Vec<u32> = births.iter().copied().filter(|&b| age(b) <= age_max as i64).collect();
        expected_kept.sort_unstable();
        let mut expected_removed: Vec<u32> = births.iter().copied().filter(|&b| age(b) > age_max as i64).collect();
        expected_removed.sort_unstable();

        assert!(
            store.iter().all(|p| p.age(frame) <= age_max as i64),
            "survivor older than {} at frame {}",
            age_max,
            frame
        );
        assert_eq!(sorted_births(&store), expected_kept);
        assert_eq!(stats.removed, expected_removed.len());
        assert_eq!(stats.examined, len, "exactly one comparison per initial particle");
    }
}

#[test]
fn test_operate_uses_context_frame() {
    let executor = Executor::sequential();
    let ctx = OperationContext {
        time_step: 1.0 / 30.0,
        frame: 4,
        executor: &executor,
        velocity: None,
    };
    let mut store = store_with_births(&[0, 1, 2, 3, 4]);
    let mut op = KillAge::new(2);
    op.operate(&mut store, &ctx);

    assert_eq!(op.name(), "kill_age");
    assert_eq!(sorted_births(&store), vec![2, 3, 4]);
}
