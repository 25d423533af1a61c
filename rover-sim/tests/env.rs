use rover_core::Env;
use rover_sim::{CarAct, LayoutConfig, SimEnv, SimEnvConfig};

fn open_arena_config() -> SimEnvConfig {
    SimEnvConfig {
        layout: LayoutConfig::default().n_obstacles(0),
        ..Default::default()
    }
}

#[test]
fn forward_only_accumulates_twice_the_speed_per_step() {
    let mut env = SimEnv::build(&open_arena_config(), 11).unwrap();
    env.reset().unwrap();

    // starting speed level is 3, so each forward step covers 6 units; 20
    // steps from the arena center cannot reach a wall
    let mut total = 0.;
    for _ in 0..20 {
        let (step, record) = env.step(&CarAct(0));
        assert!(!step.is_done());
        total += record.get_scalar("distance_moved").unwrap();
    }
    assert!((total - 20. * 6.).abs() < 1e-3, "total was {}", total);
}

#[test]
fn driving_into_a_wall_terminates_with_the_crash_penalty() {
    let mut env = SimEnv::build(&open_arena_config(), 11).unwrap();
    env.reset().unwrap();

    for _ in 0..200 {
        let (step, record) = env.step(&CarAct(0));
        if step.is_done() {
            assert_eq!(step.is_terminated[0], 1);
            assert_eq!(step.is_truncated[0], 0);
            // the move was reverted and the collision penalty dominates
            assert_eq!(record.get_scalar("distance_moved").unwrap(), 0.);
            assert!(step.reward[0] <= -9.0, "reward was {}", step.reward[0]);
            return;
        }
    }
    panic!("no collision in 200 forward steps");
}

#[test]
fn step_with_reset_starts_the_next_episode() {
    let mut env = SimEnv::build(&open_arena_config(), 11).unwrap();
    env.reset().unwrap();

    for _ in 0..200 {
        let (step, _) = env.step_with_reset(&CarAct(0));
        if step.is_done() {
            let init_obs = step.init_obs.expect("init_obs should be set");
            // back at the arena center, everything far away
            assert_eq!(init_obs.rays, [1., 1., 1.]);
            return;
        }
    }
    panic!("no collision in 200 forward steps");
}
