//! Configuration of the training loop.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
///
/// Training is driven by episodes. Intervals counted in episodes apply when
/// an episode finishes, `opt_interval` and `warmup_period` are counted in
/// environment steps.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The maximum number of training episodes.
    pub max_episodes: usize,

    /// Interval of optimization steps in environment steps.
    pub opt_interval: usize,

    /// Warmup period in environment steps, for filling the replay buffer
    /// before the first optimization step.
    pub warmup_period: usize,

    /// Interval of evaluation in episodes.
    pub eval_interval: usize,

    /// Interval of saving model parameters in episodes.
    ///
    /// A value of 0 disables periodic saving.
    pub save_interval: usize,

    /// Interval of flushing records in episodes.
    pub flush_record_interval: usize,

    /// Where to save the trained model.
    pub model_dir: Option<String>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_episodes: 500,
            opt_interval: 1,
            warmup_period: 0,
            eval_interval: 50,
            save_interval: 100,
            flush_record_interval: 1,
            model_dir: None,
        }
    }
}

impl TrainerConfig {
    /// Sets the maximum number of training episodes.
    pub fn max_episodes(mut self, v: usize) -> Self {
        self.max_episodes = v;
        self
    }

    /// Sets the optimization interval in environment steps.
    pub fn opt_interval(mut self, opt_interval: usize) -> Self {
        self.opt_interval = opt_interval;
        self
    }

    /// Sets the warmup period in environment steps.
    pub fn warmup_period(mut self, warmup_period: usize) -> Self {
        self.warmup_period = warmup_period;
        self
    }

    /// Sets the evaluation interval in episodes.
    pub fn eval_interval(mut self, eval_interval: usize) -> Self {
        self.eval_interval = eval_interval;
        self
    }

    /// Sets the save interval in episodes.
    pub fn save_interval(mut self, save_interval: usize) -> Self {
        self.save_interval = save_interval;
        self
    }

    /// Sets the record flushing interval in episodes.
    pub fn flush_record_interval(mut self, flush_record_interval: usize) -> Self {
        self.flush_record_interval = flush_record_interval;
        self
    }

    /// Sets the directory where the model parameters will be saved.
    pub fn model_dir<T: Into<String>>(mut self, model_dir: T) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

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

#[cfg(test)]
mod tests {
    use super::TrainerConfig;
    use tempdir::TempDir;

    #[test]
    fn yaml_round_trip() {
        let config = TrainerConfig::default()
            .max_episodes(500)
            .eval_interval(50)
            .model_dir("model/dqn");
        let dir = TempDir::new("trainer_config").unwrap();
        let path = dir.path().join("trainer.yaml");
        config.save(&path).unwrap();
        let loaded = TrainerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
