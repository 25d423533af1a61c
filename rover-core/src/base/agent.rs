//! Agent.
use super::{Env, Policy, ReplayBufferBase};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
pub trait Agent<E: Env, R: ReplayBufferBase>: Policy<E> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Performs an optimization step.
    ///
    /// `buffer` is a replay buffer from which a batch of transitions will
    /// be taken for updating model parameters. Returns `None` when the
    /// step was skipped, e.g., while the buffer has fewer transitions
    /// than a minibatch. This is an expected early-training condition,
    /// not an error.
    fn opt(&mut self, buffer: &mut R) -> Option<Record>;

    /// Notifies the agent that an episode has been completed.
    ///
    /// Agents use this hook for per-episode schedules like exploration
    /// decay and cadenced target network synchronization. The default
    /// implementation does nothing.
    fn on_episode_end(&mut self) {}

    /// Save the parameters of the agent in the given directory.
    ///
    /// This method commonly creates a number of files consisting the
    /// agent in the directory. For example, the DQN agent in the
    /// `rover-candle-agent` crate saves its online Q-network there.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
