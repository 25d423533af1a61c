#![warn(missing_docs)]
//! Core abstractions of the rover reinforcement learning stack.
//!
//! This crate defines the interfaces tying together an environment
//! ([`Env`]), a trainable policy ([`Agent`]), experience storage
//! ([`ReplayBufferBase`]) and the episode-driven training loop
//! ([`Trainer`]). Concrete implementations live in the sibling crates:
//! the simulated car world in `rover-sim` and the DQN agent in
//! `rover-candle-agent`.
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    Act, Agent, Configurable, Env, ExperienceBufferBase, Info, Obs, Policy, ReplayBufferBase, Step,
    StepProcessor, TransitionBatch,
};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{Sampler, Trainer, TrainerConfig};
