//! Train [`Agent`].
mod config;
mod sampler;
use crate::{
    record::{AggregateRecorder, RecordValue::Scalar},
    Agent, Env, Evaluator, ExperienceBufferBase, ReplayBufferBase, StepProcessor,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::info;
pub use sampler::Sampler;
use std::path::Path;

/// Manages the episode-driven training loop and related objects.
///
/// The training loop interleaves environment steps with optimization steps:
///
/// 1. Reset the environment and start an episode.
/// 2. Sample an action from the agent, step the environment, and push the
///    resulting transition to the replay buffer.
/// 3. After the warmup period, do an optimization step every `opt_interval`
///    environment steps. The agent may skip the step while the buffer does
///    not hold enough transitions.
/// 4. When the episode ends, notify the agent via
///    [`Agent::on_episode_end`], then apply episode-counted intervals:
///    evaluation, saving model parameters, flushing records.
/// 5. Stop once `max_episodes` episodes have finished.
///
/// Records produced by the environment, the sampler, and the agent are
/// stored in the given recorder and flushed with the episode index as step.
pub struct Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
{
    /// Configuration of the environment for training.
    env_config: E::Config,

    /// Configuration of the transition producer.
    step_proc_config: P::Config,

    /// Configuration of the replay buffer.
    replay_buffer_config: R::Config,

    /// Where to save the trained model.
    model_dir: Option<String>,

    max_episodes: usize,
    opt_interval: usize,
    warmup_period: usize,
    eval_interval: usize,
    save_interval: usize,
    flush_record_interval: usize,
}

impl<E, P, R> Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
{
    /// Constructs a trainer.
    pub fn build(
        config: TrainerConfig,
        env_config: E::Config,
        step_proc_config: P::Config,
        replay_buffer_config: R::Config,
    ) -> Self {
        Self {
            env_config,
            step_proc_config,
            replay_buffer_config,
            model_dir: config.model_dir,
            max_episodes: config.max_episodes,
            opt_interval: config.opt_interval,
            warmup_period: config.warmup_period,
            eval_interval: config.eval_interval,
            save_interval: config.save_interval,
            flush_record_interval: config.flush_record_interval,
        }
    }

    fn save_model<A: Agent<E, R>>(agent: &A, model_dir: String) {
        match agent.save_params(Path::new(&model_dir)) {
            Ok(()) => info!("Saved the model in {:?}.", &model_dir),
            Err(_) => info!("Failed to save model in {:?}.", &model_dir),
        }
    }

    fn save_best_model<A: Agent<E, R>>(agent: &A, model_dir: String) {
        let model_dir = model_dir + "/best";
        Self::save_model(agent, model_dir);
    }

    fn save_model_with_episodes<A: Agent<E, R>>(agent: &A, model_dir: String, episodes: usize) {
        let model_dir = model_dir + format!("/{}", episodes).as_str();
        Self::save_model(agent, model_dir);
    }

    /// Train the agent.
    pub fn train<A, D>(
        &mut self,
        agent: &mut A,
        recorder: &mut Box<dyn AggregateRecorder>,
        evaluator: &mut D,
    ) -> Result<()>
    where
        A: Agent<E, R>,
        D: Evaluator<E, A>,
    {
        let env = E::build(&self.env_config, 0)?;
        let producer = P::build(&self.step_proc_config);
        let mut buffer = R::build(&self.replay_buffer_config);
        let mut sampler = Sampler::new(env, producer);
        let mut max_eval_reward = f32::MIN;
        let mut env_steps: usize = 0;
        let mut episodes: usize = 0;
        agent.train();

        loop {
            let (mut record, is_done) = sampler.sample_and_push(agent, &mut buffer)?;
            env_steps += 1;

            // Optimization step
            if env_steps >= self.warmup_period && env_steps % self.opt_interval == 0 {
                if let Some(record_agent) = agent.opt(&mut buffer) {
                    record.merge_inplace(record_agent);
                }
            }

            if is_done {
                episodes += 1;
                agent.on_episode_end();
                record.insert("episode", Scalar(episodes as f32));

                // Evaluation
                if episodes % self.eval_interval == 0 {
                    info!("Starts evaluation of the trained model");
                    agent.eval();
                    let eval_reward = evaluator.evaluate(agent)?;
                    agent.train();
                    record.insert("eval_reward", Scalar(eval_reward));

                    // Save the best model up to the current iteration
                    if eval_reward > max_eval_reward {
                        if let Some(model_dir) = self.model_dir.as_ref() {
                            max_eval_reward = eval_reward;
                            Self::save_best_model(agent, model_dir.clone())
                        }
                    }
                }

                // Save the current model
                if (self.save_interval > 0) && (episodes % self.save_interval == 0) {
                    if let Some(model_dir) = self.model_dir.as_ref() {
                        Self::save_model_with_episodes(agent, model_dir.clone(), episodes);
                    }
                }
            }

            // Store record to the recorder
            if !record.is_empty() {
                recorder.store(record);
            }

            if is_done {
                if episodes % self.flush_record_interval == 0 {
                    recorder.flush(episodes as _);
                }

                if episodes == self.max_episodes {
                    break;
                }
            }
        }

        // Final checkpoint
        if let Some(model_dir) = self.model_dir.as_ref() {
            Self::save_model(agent, model_dir.clone() + "/final");
        }

        Ok(())
    }
}
