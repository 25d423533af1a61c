//! Evaluate [`Policy`](crate::Policy).
use crate::{Env, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluates a policy.
pub trait Evaluator<E: Env, P: Policy<E>> {
    /// Evaluates the policy and returns a performance score, typically the
    /// mean return over evaluation episodes.
    ///
    /// The caller of this method needs to handle the internal state of the
    /// policy, like training/evaluation mode.
    fn evaluate(&mut self, policy: &mut P) -> Result<f32>;
}
