//! Uniform experience replay for off-policy training.
//!
//! [`SimpleReplayBuffer`] stores transitions of arbitrary observation and
//! action types in fixed-capacity ring storage and samples minibatches
//! uniformly at random. [`SimpleStepProcessor`] converts environment steps
//! into the transitions the buffer stores.
mod base;
mod batch;
mod config;
mod step_proc;
pub use base::SimpleReplayBuffer;
pub use batch::{BatchBase, GenericTransitionBatch};
pub use config::SimpleReplayBufferConfig;
pub use step_proc::{SimpleStepProcessor, SimpleStepProcessorConfig};
