//! Samples environment steps and pushes transitions to a replay buffer.
use crate::{
    record::{Record, RecordValue::Scalar},
    Env, ExperienceBufferBase, Policy, StepProcessor,
};
use anyhow::Result;

/// Drives the interaction between a policy and an environment.
///
/// Each call to [`Sampler::sample_and_push`] performs one environment step,
/// converts it into a transition with the step processor, and pushes the
/// transition to the given buffer. Episode return and length are accumulated
/// internally and emitted in the record of the final step of each episode.
pub struct Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    env: E,
    prev_obs: Option<E::Obs>,
    step_processor: P,

    /// Return of the episode in progress.
    episode_return: f32,

    /// Length of the episode in progress.
    episode_length: usize,
}

impl<E, P> Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    /// Creates a sampler for the given environment and step processor.
    pub fn new(env: E, step_processor: P) -> Self {
        Self {
            env,
            prev_obs: None,
            step_processor,
            episode_return: 0.,
            episode_length: 0,
        }
    }

    /// Samples a step with the given policy and pushes the transition to the
    /// replay buffer.
    ///
    /// The second return value is `true` when the step finished an episode.
    /// In that case the record carries `episode_return` and `episode_length`.
    pub fn sample_and_push<A, R>(&mut self, policy: &mut A, buffer: &mut R) -> Result<(Record, bool)>
    where
        A: Policy<E>,
        R: ExperienceBufferBase<Item = P::Output>,
    {
        // Reset the environment on the first call
        if self.prev_obs.is_none() {
            self.prev_obs = Some(self.env.reset()?);
            self.step_processor
                .reset(self.prev_obs.as_ref().unwrap().clone());
        }

        let act = policy.sample(self.prev_obs.as_ref().unwrap());
        let (step, mut record) = self.env.step_with_reset(&act);
        let is_done = step.is_done();

        self.episode_return += step.reward[0];
        self.episode_length += 1;

        self.prev_obs = match is_done {
            true => Some(step.init_obs.clone().expect("Failed to unwrap init_obs")),
            false => Some(step.obs.clone()),
        };

        let transition = self.step_processor.process(step);
        buffer.push(transition)?;

        if is_done {
            self.step_processor
                .reset(self.prev_obs.as_ref().unwrap().clone());
            record.insert("episode_return", Scalar(self.episode_return));
            record.insert("episode_length", Scalar(self.episode_length as f32));
            self.episode_return = 0.;
            self.episode_length = 0;
        }

        Ok((record, is_done))
    }
}
