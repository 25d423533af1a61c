use crate::TransitionBatch;

/// Ring storage of a batchable quantity, such as observations or actions.
///
/// Implementations own fixed-capacity storage. `push` writes a batch at an
/// index and wraps around at the capacity, `sample` gathers rows at the
/// given indices into a new batch.
pub trait BatchBase {
    /// Creates storage for `capacity` elements.
    fn new(capacity: usize) -> Self;

    /// Writes `data` starting at index `ix`, wrapping at the capacity.
    fn push(&mut self, ix: usize, data: Self);

    /// Gathers the elements at `ixs` into a new batch.
    fn sample(&self, ixs: &Vec<usize>) -> Self;
}

/// A batch of transitions `(obs, act, next_obs, reward, is_terminated,
/// is_truncated)` with generic observation and action types.
pub struct GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Observations before taking actions.
    pub obs: O,

    /// Selected actions.
    pub act: A,

    /// Observations after taking actions.
    pub next_obs: O,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Termination flags.
    pub is_terminated: Vec<i8>,

    /// Truncation flags.
    pub is_truncated: Vec<i8>,
}

impl<O, A> TransitionBatch for GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type ObsBatch = O;
    type ActBatch = A;

    fn unpack(
        self,
    ) -> (
        Self::ObsBatch,
        Self::ActBatch,
        Self::ObsBatch,
        Vec<f32>,
        Vec<i8>,
        Vec<i8>,
    ) {
        (
            self.obs,
            self.act,
            self.next_obs,
            self.reward,
            self.is_terminated,
            self.is_truncated,
        )
    }

    fn len(&self) -> usize {
        self.reward.len()
    }

    fn obs(&self) -> &Self::ObsBatch {
        &self.obs
    }

    fn act(&self) -> &Self::ActBatch {
        &self.act
    }
}
