use super::{BatchBase, GenericTransitionBatch};
use crate::{Env, Obs, StepProcessor};
use std::{default::Default, marker::PhantomData};

/// Configuration of [`SimpleStepProcessor`].
#[derive(Clone, Debug)]
pub struct SimpleStepProcessorConfig {}

impl Default for SimpleStepProcessorConfig {
    fn default() -> Self {
        Self {}
    }
}

/// Converts environment steps into transitions with a 1-step backup.
///
/// The processor keeps the observation preceding each step so that a step
/// `(act, obs, reward, flags)` becomes the transition
/// `(prev_obs, act, obs, reward, flags)`. When an episode ends, the kept
/// observation is replaced with the initial observation of the next episode
/// carried by the step.
///
/// # Type Parameters
///
/// * `E` - The environment type
/// * `O` - The observation batch type, must implement `From<E::Obs>`
/// * `A` - The action batch type, must implement `From<E::Act>`
pub struct SimpleStepProcessor<E, O, A> {
    prev_obs: Option<O>,
    phantom: PhantomData<(E, A)>,
}

impl<E, O, A> StepProcessor<E> for SimpleStepProcessor<E, O, A>
where
    E: Env,
    O: BatchBase + From<E::Obs>,
    A: BatchBase + From<E::Act>,
{
    type Config = SimpleStepProcessorConfig;
    type Output = GenericTransitionBatch<O, A>;

    fn build(_config: &Self::Config) -> Self {
        Self {
            prev_obs: None,
            phantom: PhantomData,
        }
    }

    fn reset(&mut self, init_obs: E::Obs) {
        self.prev_obs = Some(init_obs.into());
    }

    /// Processes a step into a transition.
    ///
    /// # Panics
    ///
    /// Panics if the step contains more than one observation, if `reset()`
    /// has not been called, or if a terminal step carries no initial
    /// observation for the next episode.
    fn process(&mut self, step: crate::Step<E>) -> Self::Output {
        assert_eq!(step.obs.len(), 1);

        if self.prev_obs.is_none() {
            panic!("prev_obs is not set. Forgot to call reset()?");
        }

        let is_done = step.is_done();
        let next_obs = step.obs.clone().into();
        let obs = self.prev_obs.replace(step.obs.into()).unwrap();
        let act = step.act.into();

        if is_done {
            self.prev_obs
                .replace(step.init_obs.expect("Failed to unwrap init_obs").into());
        }

        GenericTransitionBatch {
            obs,
            act,
            next_obs,
            reward: step.reward,
            is_terminated: step.is_terminated,
            is_truncated: step.is_truncated,
        }
    }
}
