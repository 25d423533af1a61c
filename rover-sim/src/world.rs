use crate::{Layout, LayoutConfig, Rect};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Number of discrete actions accepted by [`PhysicsWorld::step`].
///
/// `0` drives forward, `1`/`2` rotate left/right, `3..=7` select speed
/// levels `1..=5`.
pub const N_ACTIONS: usize = 8;

/// Configuration of [`PhysicsWorld`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct WorldConfig {
    /// Side length of the square car body.
    pub car_size: f32,

    /// Heading change per rotation step in radians.
    pub turn_rate: f32,

    /// Speed level at episode start.
    pub init_speed_level: u8,

    /// Lowest selectable speed level.
    pub min_speed_level: u8,

    /// Highest selectable speed level.
    pub max_speed_level: u8,

    /// Number of steps after which an episode is truncated.
    pub max_steps: usize,

    /// Moves shorter than this count as low motion.
    pub low_motion_threshold: f32,

    /// Number of consecutive low-motion steps after which an episode is
    /// truncated.
    pub max_low_motion_steps: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            car_size: 30.,
            turn_rate: 0.1,
            init_speed_level: 3,
            min_speed_level: 1,
            max_speed_level: 5,
            max_steps: 1000,
            low_motion_threshold: 0.5,
            max_low_motion_steps: 50,
        }
    }
}

/// The car state: position, heading and speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarPose {
    /// Horizontal position.
    pub x: f32,

    /// Vertical position.
    pub y: f32,

    /// Heading in radians, unnormalized.
    pub heading: f32,

    /// Selected speed level in `min_speed_level..=max_speed_level`.
    pub speed_level: u8,

    /// Linear velocity of the last step in world units per step.
    pub velocity: f32,
}

/// The result of advancing the world by one step.
#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    /// Euclidean distance actually moved, zero when the move was reverted.
    pub distance_moved: f32,

    /// The car hit a wall or an obstacle.
    pub collision: bool,

    /// The episode ended with a collision.
    pub terminated: bool,

    /// The episode ran out of steps or the car stalled for too long.
    pub truncated: bool,
}

impl StepOutcome {
    /// Returns `true` when the episode ended with this step.
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Kinematics and collision bookkeeping of the car in its arena.
///
/// The pose is mutated only through [`PhysicsWorld::step`] and the reset
/// methods. The obstacle layout is generated once at construction and kept
/// across resets; [`PhysicsWorld::regenerate_obstacles`] rebuilds it on
/// request.
#[derive(Debug)]
pub struct PhysicsWorld {
    config: WorldConfig,
    layout_config: LayoutConfig,
    layout: Layout,
    pose: CarPose,
    steps: usize,
    total_distance: f32,
    low_motion_steps: usize,
    rng: SmallRng,
}

impl PhysicsWorld {
    /// Builds a world with a layout drawn from the given seed and resets it.
    pub fn new(config: WorldConfig, layout_config: LayoutConfig, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let layout = Layout::generate(&layout_config, &mut rng);
        let mut world = Self {
            pose: CarPose {
                x: 0.,
                y: 0.,
                heading: 0.,
                speed_level: config.init_speed_level,
                velocity: 0.,
            },
            config,
            layout_config,
            layout,
            steps: 0,
            total_distance: 0.,
            low_motion_steps: 0,
            rng,
        };
        world.reset();
        world
    }

    /// Returns the car pose.
    pub fn pose(&self) -> &CarPose {
        &self.pose
    }

    /// Returns the arena layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Returns the number of steps taken in the current episode.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Returns the cumulative distance moved in the current episode.
    pub fn total_distance(&self) -> f32 {
        self.total_distance
    }

    /// Returns the number of consecutive low-motion steps.
    pub fn low_motion_steps(&self) -> usize {
        self.low_motion_steps
    }

    /// Returns the highest selectable speed level.
    pub fn max_speed_level(&self) -> u8 {
        self.config.max_speed_level
    }

    /// Places the car at the arena center with a random heading and zeroes
    /// the episode counters. The layout is kept.
    pub fn reset(&mut self) {
        let heading = self.rng.gen_range(0.0..TAU);
        self.reset_to_heading(heading);
    }

    /// Like [`PhysicsWorld::reset`], but with the heading drawn from a
    /// dedicated seed for reproducible evaluation episodes.
    pub fn reset_with_seed(&mut self, seed: u64) {
        let heading = SmallRng::seed_from_u64(seed).gen_range(0.0..TAU);
        self.reset_to_heading(heading);
    }

    fn reset_to_heading(&mut self, heading: f32) {
        self.pose = CarPose {
            x: self.layout.width / 2.,
            y: self.layout.height / 2.,
            heading,
            speed_level: self.config.init_speed_level,
            velocity: 0.,
        };
        self.steps = 0;
        self.total_distance = 0.;
        self.low_motion_steps = 0;
    }

    /// Draws a fresh obstacle layout from the world RNG.
    pub fn regenerate_obstacles(&mut self) {
        self.layout = Layout::generate(&self.layout_config, &mut self.rng);
    }

    /// Advances the world by one action.
    ///
    /// On collision the position is reverted to its value before the move,
    /// and the outcome reports the collision.
    ///
    /// # Panics
    ///
    /// Panics if `action >= N_ACTIONS`.
    pub fn step(&mut self, action: usize) -> StepOutcome {
        assert!(action < N_ACTIONS, "invalid action index: {}", action);

        self.steps += 1;
        let (old_x, old_y) = (self.pose.x, self.pose.y);
        let speed = self.pose.speed_level as f32;

        match action {
            0 => self.pose.velocity = 2. * speed,
            1 => {
                self.pose.heading -= self.config.turn_rate;
                self.pose.velocity = 0.5 * speed;
            }
            2 => {
                self.pose.heading += self.config.turn_rate;
                self.pose.velocity = 0.5 * speed;
            }
            _ => {
                // action indices outside the configured range select the
                // nearest valid level
                let level = ((action - 2) as u8)
                    .clamp(self.config.min_speed_level, self.config.max_speed_level);
                self.pose.speed_level = level;
                self.pose.velocity = level as f32;
            }
        }

        self.pose.x += self.pose.velocity * self.pose.heading.cos();
        self.pose.y += self.pose.velocity * self.pose.heading.sin();

        let collision = self.check_collision();
        if collision {
            self.pose.x = old_x;
            self.pose.y = old_y;
        }

        let distance_moved = ((self.pose.x - old_x).powi(2) + (self.pose.y - old_y).powi(2)).sqrt();
        self.total_distance += distance_moved;

        if distance_moved < self.config.low_motion_threshold {
            self.low_motion_steps += 1;
        } else {
            self.low_motion_steps = 0;
        }

        let terminated = collision;
        let truncated = !terminated
            && (self.steps > self.config.max_steps
                || self.low_motion_steps > self.config.max_low_motion_steps);

        StepOutcome {
            distance_moved,
            collision,
            terminated,
            truncated,
        }
    }

    fn check_collision(&self) -> bool {
        let half = self.config.car_size / 2.;

        // Arena bounds against the car center
        if self.pose.x < half
            || self.pose.x > self.layout.width - half
            || self.pose.y < half
            || self.pose.y > self.layout.height - half
        {
            return true;
        }

        let body = Rect::centered(
            self.pose.x,
            self.pose.y,
            self.config.car_size,
            self.config.car_size,
        );
        self.layout.collides(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::{PhysicsWorld, WorldConfig, N_ACTIONS};
    use crate::LayoutConfig;

    fn empty_world() -> PhysicsWorld {
        let layout = LayoutConfig::default().n_obstacles(0);
        PhysicsWorld::new(WorldConfig::default(), layout, 42)
    }

    #[test]
    fn forward_moves_twice_the_speed_level() {
        let mut world = empty_world();
        let outcome = world.step(0);
        assert!(!outcome.collision);
        assert!((outcome.distance_moved - 6.).abs() < 1e-4);
        assert!((world.pose().velocity - 6.).abs() < 1e-4);
    }

    #[test]
    fn rotation_changes_heading_and_creeps() {
        let mut world = empty_world();
        let h0 = world.pose().heading;
        let outcome = world.step(1);
        assert!((world.pose().heading - (h0 - 0.1)).abs() < 1e-6);
        assert!((outcome.distance_moved - 1.5).abs() < 1e-4);

        world.step(2);
        assert!((world.pose().heading - h0).abs() < 1e-6);
    }

    #[test]
    fn speed_actions_select_levels() {
        let mut world = empty_world();
        for (action, level) in (3..N_ACTIONS).zip(1u8..) {
            world.step(action);
            assert_eq!(world.pose().speed_level, level);
        }
    }

    #[test]
    fn speed_selection_respects_configured_bounds() {
        let layout = LayoutConfig::default().n_obstacles(0);
        let config = WorldConfig {
            min_speed_level: 2,
            max_speed_level: 3,
            init_speed_level: 3,
            ..Default::default()
        };
        let mut world = PhysicsWorld::new(config, layout, 42);

        world.step(7); // level 5, above the configured max
        assert_eq!(world.pose().speed_level, 3);

        world.step(3); // level 1, below the configured min
        assert_eq!(world.pose().speed_level, 2);
    }

    #[test]
    #[should_panic(expected = "invalid action index")]
    fn invalid_action_panics() {
        let mut world = empty_world();
        world.step(N_ACTIONS);
    }

    #[test]
    fn collision_reverts_position() {
        let mut world = empty_world();
        let mut last = (world.pose().x, world.pose().y);
        // drive forward until the car hits a wall
        for _ in 0..1000 {
            let outcome = world.step(0);
            if outcome.collision {
                assert!(outcome.terminated);
                assert_eq!((world.pose().x, world.pose().y), last);
                assert_eq!(outcome.distance_moved, 0.);
                return;
            }
            last = (world.pose().x, world.pose().y);
        }
        panic!("no collision in 1000 forward steps");
    }

    #[test]
    fn stalling_truncates() {
        let layout = LayoutConfig::default().n_obstacles(0);
        let config = WorldConfig {
            // rotations at speed level 1 creep 0.5 per step, below this
            low_motion_threshold: 0.6,
            max_low_motion_steps: 10,
            ..Default::default()
        };
        let mut world = PhysicsWorld::new(config, layout, 3);
        world.step(3); // speed level 1
        let mut done = false;
        for i in 0..20usize {
            let outcome = world.step(1 + (i % 2));
            if outcome.truncated {
                assert!(!outcome.terminated);
                assert!(world.low_motion_steps() > 10);
                done = true;
                break;
            }
        }
        assert!(done);
    }

    #[test]
    fn step_limit_truncates() {
        let layout = LayoutConfig::default().n_obstacles(0);
        let config = WorldConfig {
            max_steps: 5,
            max_low_motion_steps: 1000,
            ..Default::default()
        };
        let mut world = PhysicsWorld::new(config, layout, 1);
        for _ in 0..5 {
            // rotate in place, far from any wall
            assert!(!world.step(1).is_done());
        }
        assert!(world.step(2).truncated);
    }
}
