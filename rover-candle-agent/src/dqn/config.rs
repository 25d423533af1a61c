//! Configuration of [`Dqn`](super::Dqn) agent.
use super::{DqnModelConfig, EpsilonGreedy};
use crate::{util::OutDim, Device};
use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Dqn`](super::Dqn) agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<Q>
where
    Q: OutDim,
{
    /// Configuration of the Q-network model.
    pub model_config: DqnModelConfig<Q>,

    /// Size of minibatches taken from the replay buffer.
    pub batch_size: usize,

    /// Minimum number of stored transitions before optimization starts.
    pub min_transitions_warmup: usize,

    /// Discount factor of future rewards.
    pub discount_factor: f64,

    /// Mixing coefficient of target network updates. With the default 1.0
    /// the target network is overwritten by the online network.
    pub tau: f64,

    /// Interval of target network synchronization in episodes.
    pub target_sync_interval: usize,

    /// The epsilon-greedy explorer.
    pub explorer: EpsilonGreedy,

    /// Device on which tensors are located.
    pub device: Option<Device>,

    /// Seed of the RNG used for exploration.
    pub seed: u64,

    /// If `true`, the agent starts in training mode.
    pub train: bool,
}

impl<Q> Default for DqnConfig<Q>
where
    Q: OutDim,
{
    fn default() -> Self {
        Self {
            model_config: DqnModelConfig::default(),
            batch_size: 32,
            min_transitions_warmup: 32,
            discount_factor: 0.95,
            tau: 1.0,
            target_sync_interval: 10,
            explorer: EpsilonGreedy::default(),
            device: None,
            seed: 42,
            train: false,
        }
    }
}

impl<Q> DqnConfig<Q>
where
    Q: DeserializeOwned + Serialize + OutDim,
{
    /// Sets the configuration of the Q-network model.
    pub fn model_config(mut self, model_config: DqnModelConfig<Q>) -> Self {
        self.model_config = model_config;
        self
    }

    /// Sets the minibatch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the number of stored transitions required before optimization.
    pub fn min_transitions_warmup(mut self, v: usize) -> Self {
        self.min_transitions_warmup = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets the mixing coefficient of target network updates.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Sets the target network synchronization interval in episodes.
    pub fn target_sync_interval(mut self, v: usize) -> Self {
        self.target_sync_interval = v;
        self
    }

    /// Sets the explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = Some(v);
        self
    }

    /// Sets the seed of the exploration RNG.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
