use delivery_rs::{DeliveryConfig, DeliveryEnv};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn moves_follow_action_deltas() {
    let mut env = DeliveryEnv::new(DeliveryConfig { width: 5, height: 5, ..Default::default() });
    assert_eq!(env.position(), (2, 2));
    env.step(0).unwrap();
    assert_eq!(env.position(), (3, 2));
    env.step(1).unwrap();
    assert_eq!(env.position(), (2, 2));
    env.step(2).unwrap();
    assert_eq!(env.position(), (2, 3));
    env.step(3).unwrap();
    assert_eq!(env.position(), (2, 2));
}

#[test]
fn moves_into_border_are_clamped() {
    let mut env = DeliveryEnv::new(DeliveryConfig { width: 3, height: 3, ..Default::default() });
    for _ in 0..5 {
        env.step(3).unwrap();
    }
    assert_eq!(env.position(), (1, 0));
    for _ in 0..5 {
        env.step(1).unwrap();
    }
    assert_eq!(env.position(), (0, 0));
    for _ in 0..5 {
        env.step(2).unwrap();
    }
    assert_eq!(env.position(), (0, 2));
    // A blocked move still costs a step.
    assert_eq!(env.step_count(), 15);
}

#[test]
fn random_walks_never_leave_the_grid() {
    let mut rng = StdRng::seed_from_u64(7);
    for &(w, h) in &[(1, 1), (2, 1), (3, 1), (4, 4), (7, 2), (1, 5)] {
        let mut env = DeliveryEnv::new(DeliveryConfig { width: w, height: h, max_steps: 10_000, ..Default::default() });
        let n = env.num_actions() as i64;
        for _ in 0..500 {
            let out = env.step(rng.gen_range(0..n)).unwrap();
            let (x, y) = env.position();
            assert!(x >= 0 && x < w, "x={x} outside width {w}");
            assert!(y >= 0 && y < h, "y={y} outside height {h}");
            assert_eq!((out.observation.x, out.observation.y), (x, y));
        }
    }
}
