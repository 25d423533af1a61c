//! Trains a DQN agent to drive the simulated rover.
//!
//! ```bash
//! # Train for 500 episodes, saving checkpoints and metrics under ./model/dqn_rover
//! cargo run --release -p rover -- --train
//!
//! # Evaluate the best checkpoint
//! cargo run --release -p rover -- --eval
//! ```
use anyhow::Result;
use clap::Parser;
use log::info;
use obs_act_types::*;
use rover_core::{
    record::{AggregateRecorder, CsvRecorder},
    replay_buffer::{SimpleReplayBufferConfig, SimpleStepProcessorConfig},
    Agent, Configurable, Evaluator as _, Trainer, TrainerConfig,
};
use rover_sim::SimEnvConfig;
use std::path::Path;

const DIM_OBS: i64 = 4;
const DIM_ACT: i64 = 8;
const LR_QNET: f64 = 0.001;
const DISCOUNT_FACTOR: f64 = 0.95;
const BATCH_SIZE: usize = 32;
const WARMUP_PERIOD: usize = 100;
const OPT_INTERVAL: usize = 1;
const MAX_EPISODES: usize = 500;
const EVAL_INTERVAL: usize = 50;
const SAVE_INTERVAL: usize = 100;
const TARGET_SYNC_INTERVAL: usize = 10;
const REPLAY_BUFFER_CAPACITY: usize = 10000;
const EVAL_EPISODES: usize = 5;
const EVAL_SEED: i64 = 1;
const MODEL_DIR: &str = "./model/dqn_rover";

mod obs_act_types {
    use candle_core::{Device, Tensor};
    use rover_candle_agent::TensorBatch;
    use rover_core::replay_buffer::{BatchBase, SimpleReplayBuffer, SimpleStepProcessor};
    use rover_sim::{CarAct, CarObs, SimEnv};

    /// Batch of observations stored in the replay buffer, of shape
    /// `[n, 4]`.
    pub struct ObsBatch(TensorBatch);

    impl BatchBase for ObsBatch {
        fn new(capacity: usize) -> Self {
            Self(TensorBatch::new(capacity))
        }

        fn push(&mut self, i: usize, data: Self) {
            self.0.push(i, data.0)
        }

        fn sample(&self, ixs: &Vec<usize>) -> Self {
            Self(self.0.sample(ixs))
        }
    }

    impl From<CarObs> for ObsBatch {
        fn from(obs: CarObs) -> Self {
            Self(TensorBatch::from_tensor(obs.into()))
        }
    }

    impl From<ObsBatch> for Tensor {
        fn from(b: ObsBatch) -> Self {
            b.0.into()
        }
    }

    /// Batch of action indices stored in the replay buffer, of shape
    /// `[n, 1]` so that it can be used with `Tensor::gather()`.
    pub struct ActBatch(TensorBatch);

    impl BatchBase for ActBatch {
        fn new(capacity: usize) -> Self {
            Self(TensorBatch::new(capacity))
        }

        fn push(&mut self, i: usize, data: Self) {
            self.0.push(i, data.0)
        }

        fn sample(&self, ixs: &Vec<usize>) -> Self {
            Self(self.0.sample(ixs))
        }
    }

    impl From<CarAct> for ActBatch {
        fn from(act: CarAct) -> Self {
            let t = Tensor::from_slice(&[act.0 as i64], &[1, 1], &Device::Cpu)
                .expect("Failed to convert CarAct to ActBatch");
            Self(TensorBatch::from_tensor(t))
        }
    }

    impl From<ActBatch> for Tensor {
        fn from(b: ActBatch) -> Self {
            b.0.into()
        }
    }

    pub type Env = SimEnv;
    pub type StepProc = SimpleStepProcessor<Env, ObsBatch, ActBatch>;
    pub type ReplayBuffer = SimpleReplayBuffer<ObsBatch, ActBatch>;
    pub type Dqn = rover_candle_agent::dqn::Dqn<Env, rover_candle_agent::mlp::Mlp, ReplayBuffer>;
    pub type Evaluator = rover_core::DefaultEvaluator<Env, Dqn>;
}

mod config {
    use super::*;
    use rover_candle_agent::{
        dqn::{DqnConfig, DqnModelConfig},
        mlp::MlpConfig,
        opt::OptimizerConfig,
        Device,
    };

    pub fn create_env_config() -> SimEnvConfig {
        SimEnvConfig::default()
    }

    pub fn create_trainer_config(
        max_episodes: usize,
        eval_interval: usize,
        model_dir: &str,
    ) -> TrainerConfig {
        TrainerConfig::default()
            .max_episodes(max_episodes)
            .opt_interval(OPT_INTERVAL)
            .warmup_period(WARMUP_PERIOD)
            .eval_interval(eval_interval)
            .save_interval(SAVE_INTERVAL)
            .model_dir(model_dir)
    }

    pub fn create_agent_config() -> DqnConfig<MlpConfig> {
        let model_config = DqnModelConfig::default()
            .q_config(MlpConfig::new(DIM_OBS, vec![128, 128], DIM_ACT, false))
            .opt_config(OptimizerConfig::default().learning_rate(LR_QNET));
        DqnConfig::default()
            .model_config(model_config)
            .batch_size(BATCH_SIZE)
            .min_transitions_warmup(BATCH_SIZE)
            .discount_factor(DISCOUNT_FACTOR)
            .target_sync_interval(TARGET_SYNC_INTERVAL)
            .device(Device::Cpu)
    }
}

/// Train a DQN agent to drive the simulated rover.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Train the agent.
    #[arg(long)]
    train: bool,

    /// Evaluate the best checkpoint of a trained agent.
    #[arg(long)]
    eval: bool,

    /// Directory for model parameters and metrics.
    #[arg(long, default_value = MODEL_DIR)]
    model_dir: String,

    /// Number of training episodes.
    #[arg(long, default_value_t = MAX_EPISODES)]
    episodes: usize,
}

fn train(max_episodes: usize, model_dir: &str, eval_interval: usize) -> Result<()> {
    let env_config = config::create_env_config();
    let trainer_config = config::create_trainer_config(max_episodes, eval_interval, model_dir);
    let agent_config = config::create_agent_config();
    let step_proc_config = SimpleStepProcessorConfig::default();
    let replay_buffer_config =
        SimpleReplayBufferConfig::default().capacity(REPLAY_BUFFER_CAPACITY);

    std::fs::create_dir_all(model_dir)?;
    env_config.save(format!("{}/env.yaml", model_dir))?;
    agent_config.save(format!("{}/agent.yaml", model_dir))?;
    trainer_config.save(format!("{}/trainer.yaml", model_dir))?;

    let mut trainer = Trainer::<Env, StepProc, ReplayBuffer>::build(
        trainer_config,
        env_config.clone(),
        step_proc_config,
        replay_buffer_config,
    );
    let mut agent = Dqn::build(agent_config);
    let mut recorder: Box<dyn AggregateRecorder> =
        Box::new(CsvRecorder::new(format!("{}/metrics.csv", model_dir))?);
    let mut evaluator = Evaluator::new(&env_config, EVAL_SEED, EVAL_EPISODES)?;

    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    Ok(())
}

fn eval(model_dir: &str) -> Result<()> {
    let env_config = config::create_env_config();
    let mut agent = Dqn::build(config::create_agent_config());
    agent.load_params(&Path::new(model_dir).join("best"))?;
    agent.eval();

    let mut evaluator = Evaluator::new(&env_config, EVAL_SEED, EVAL_EPISODES)?;
    let reward = evaluator.evaluate(&mut agent)?;
    info!("Mean evaluation reward: {}", reward);

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.train {
        train(args.episodes, &args.model_dir, EVAL_INTERVAL)?;
    } else if args.eval {
        eval(&args.model_dir)?;
    } else {
        train(args.episodes, &args.model_dir, EVAL_INTERVAL)?;
        eval(&args.model_dir)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{eval, train};
    use tempdir::TempDir;

    #[test]
    fn test_dqn_rover() {
        let tmp_dir = TempDir::new("dqn_rover").unwrap();
        let model_dir = tmp_dir.path().join("dqn_rover");
        let model_dir = model_dir.as_path().to_str().unwrap();
        train(2, model_dir, 1).unwrap();
        eval(model_dir).unwrap();
    }
}
