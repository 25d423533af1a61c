use crate::{
    LayoutConfig, PhysicsWorld, RayCastSensor, RewardConfig, RewardModel, SensorConfig,
    WorldConfig, N_ACTIONS, N_RAYS,
};
use anyhow::Result;
use log::trace;
use rover_core::{
    record::{Record, RecordValue::Scalar},
    Env, Step,
};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Observation of [`SimEnv`]: three normalized sensor readings plus the
/// normalized speed level, each in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct CarObs {
    /// Left, center and right ray readings, normalized by the sensor range.
    pub rays: [f32; N_RAYS],

    /// Speed level normalized by the highest selectable level.
    pub speed: f32,
}

impl CarObs {
    /// Returns the observation as a flat feature vector.
    pub fn to_array(&self) -> [f32; N_RAYS + 1] {
        [self.rays[0], self.rays[1], self.rays[2], self.speed]
    }
}

impl rover_core::Obs for CarObs {
    fn len(&self) -> usize {
        1
    }
}

/// Action of [`SimEnv`]: a discrete command index in `0..N_ACTIONS`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CarAct(pub usize);

impl rover_core::Act for CarAct {}

/// Configuration of [`SimEnv`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct SimEnvConfig {
    /// Arena layout parameters.
    pub layout: LayoutConfig,

    /// Sensor parameters.
    pub sensor: SensorConfig,

    /// Car and episode parameters.
    pub world: WorldConfig,

    /// Reward coefficients.
    pub reward: RewardConfig,
}

impl SimEnvConfig {
    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// The simulated car environment.
///
/// Composes the physics world, the ray-cast sensor and the reward model
/// into an [`Env`]. The obstacle layout is derived from the build seed and
/// kept across episodes; [`Env::reset_with_index`] draws the initial
/// heading from `seed + ix` for reproducible evaluation episodes.
pub struct SimEnv {
    world: PhysicsWorld,
    sensor: RayCastSensor,
    reward: RewardModel,
    seed: u64,
}

impl SimEnv {
    fn observe(&self) -> CarObs {
        let pose = self.world.pose();
        let rays = self
            .sensor
            .distances(self.world.layout(), pose.x, pose.y, pose.heading);
        CarObs {
            rays,
            speed: pose.speed_level as f32 / self.world.max_speed_level() as f32,
        }
    }
}

impl Env for SimEnv {
    type Config = SimEnvConfig;
    type Obs = CarObs;
    type Act = CarAct;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let seed = seed as u64;
        let world = PhysicsWorld::new(config.world.clone(), config.layout.clone(), seed);
        Ok(Self {
            world,
            sensor: RayCastSensor::new(&config.sensor),
            reward: RewardModel::new(config.reward.clone()),
            seed,
        })
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.world.reset();
        Ok(self.observe())
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.world.reset_with_seed(self.seed.wrapping_add(ix as u64));
        Ok(self.observe())
    }

    /// Applies an action.
    ///
    /// The returned record carries step diagnostics: distance moved and
    /// speed level. They are not used for training.
    ///
    /// # Panics
    ///
    /// Panics if the action index is out of `0..N_ACTIONS`.
    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        assert!(a.0 < N_ACTIONS, "invalid action index: {}", a.0);

        let outcome = self.world.step(a.0);
        let obs = self.observe();
        let min_reading = obs.rays.iter().cloned().fold(f32::INFINITY, f32::min);
        let reward = self.reward.compute(
            &outcome,
            min_reading,
            self.world.low_motion_steps(),
            self.world.pose().speed_level,
        );
        trace!(
            "step {}: act={}, reward={:.3}, done={}",
            self.world.steps(),
            a.0,
            reward,
            outcome.is_done()
        );

        let step = Step::new(
            obs,
            a.clone(),
            vec![reward],
            vec![outcome.terminated as i8],
            vec![outcome.truncated as i8],
            (),
            None,
        );
        let record = Record::from_slice(&[
            ("distance_moved", Scalar(outcome.distance_moved)),
            ("speed_level", Scalar(self.world.pose().speed_level as f32)),
        ]);

        (step, record)
    }

    fn step_with_reset(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        let (step, record) = self.step(a);
        if step.is_done() {
            let mut step = step;
            step.init_obs = self.reset().ok();
            (step, record)
        } else {
            (step, record)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CarAct, SimEnv, SimEnvConfig};
    use rover_core::Env;

    #[test]
    fn observation_components_in_unit_interval() {
        let mut env = SimEnv::build(&SimEnvConfig::default(), 5).unwrap();
        let mut obs = env.reset().unwrap();
        for i in 0..200 {
            for v in obs.to_array().iter() {
                assert!(*v >= 0. && *v <= 1.);
            }
            let (step, _) = env.step_with_reset(&CarAct(i % 8));
            obs = match step.is_done() {
                true => step.init_obs.unwrap(),
                false => step.obs,
            };
        }
    }

    #[test]
    fn reset_with_index_is_deterministic() {
        let config = SimEnvConfig::default();
        let mut env = SimEnv::build(&config, 42).unwrap();
        let a = env.reset_with_index(3).unwrap();
        let b = env.reset_with_index(3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn diagnostics_record_has_step_metrics() {
        let mut env = SimEnv::build(&SimEnvConfig::default(), 1).unwrap();
        env.reset().unwrap();
        let (_, record) = env.step(&CarAct(0));
        assert!(record.get_scalar("distance_moved").is_ok());
        assert_eq!(record.get_scalar("speed_level").unwrap(), 3.);
    }
}
