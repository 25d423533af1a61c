use super::{BatchBase, GenericTransitionBatch, SimpleReplayBufferConfig};
use crate::{error::RoverError, ExperienceBufferBase, ReplayBufferBase, TransitionBatch};
use anyhow::Result;
use rand::{rngs::StdRng, RngCore, SeedableRng};

/// A fixed-capacity replay buffer with uniform sampling.
///
/// Transitions are stored in ring storage. Once the buffer is full, new
/// transitions overwrite the oldest ones. Sampling draws indices uniformly
/// at random with replacement and fails while the buffer holds fewer
/// transitions than requested.
///
/// # Type Parameters
///
/// * `O` - Observation storage, must implement [`BatchBase`]
/// * `A` - Action storage, must implement [`BatchBase`]
pub struct SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    capacity: usize,

    /// Current insertion index.
    i: usize,

    /// Current number of stored transitions.
    size: usize,

    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
    is_truncated: Vec<i8>,

    /// Random number generator for sampling.
    rng: StdRng,
}

impl<O, A> SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    #[inline]
    fn push_reward(&mut self, i: usize, b: &Vec<f32>) {
        let mut j = i;
        for r in b.iter() {
            self.reward[j] = *r;
            j += 1;
            if j == self.capacity {
                j = 0;
            }
        }
    }

    #[inline]
    fn push_is_terminated(&mut self, i: usize, b: &Vec<i8>) {
        let mut j = i;
        for d in b.iter() {
            self.is_terminated[j] = *d;
            j += 1;
            if j == self.capacity {
                j = 0;
            }
        }
    }

    #[inline]
    fn push_is_truncated(&mut self, i: usize, b: &Vec<i8>) {
        let mut j = i;
        for d in b.iter() {
            self.is_truncated[j] = *d;
            j += 1;
            if j == self.capacity {
                j = 0;
            }
        }
    }

    fn sample_reward(&self, ixs: &Vec<usize>) -> Vec<f32> {
        ixs.iter().map(|ix| self.reward[*ix]).collect()
    }

    fn sample_is_terminated(&self, ixs: &Vec<usize>) -> Vec<i8> {
        ixs.iter().map(|ix| self.is_terminated[*ix]).collect()
    }

    fn sample_is_truncated(&self, ixs: &Vec<usize>) -> Vec<i8> {
        ixs.iter().map(|ix| self.is_truncated[*ix]).collect()
    }

    /// Returns the maximum number of transitions the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the sum of all rewards in the buffer.
    pub fn sum_rewards(&self) -> f32 {
        self.reward.iter().sum()
    }
}

impl<O, A> ExperienceBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Item = GenericTransitionBatch<O, A>;

    fn len(&self) -> usize {
        self.size
    }

    /// Adds transitions to the buffer, overwriting the oldest entries when
    /// the buffer is full.
    fn push(&mut self, tr: Self::Item) -> Result<()> {
        let len = tr.len();
        let (obs, act, next_obs, reward, is_terminated, is_truncated) = tr.unpack();
        self.obs.push(self.i, obs);
        self.act.push(self.i, act);
        self.next_obs.push(self.i, next_obs);
        self.push_reward(self.i, &reward);
        self.push_is_terminated(self.i, &is_terminated);
        self.push_is_truncated(self.i, &is_truncated);

        self.i = (self.i + len) % self.capacity;
        self.size += len;
        if self.size >= self.capacity {
            self.size = self.capacity;
        }

        Ok(())
    }
}

impl<O, A> ReplayBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Config = SimpleReplayBufferConfig;
    type Batch = GenericTransitionBatch<O, A>;

    fn build(config: &Self::Config) -> Self {
        let capacity = config.capacity;

        Self {
            capacity,
            i: 0,
            size: 0,
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: vec![0.; capacity],
            is_terminated: vec![0; capacity],
            is_truncated: vec![0; capacity],
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Samples a batch of transitions uniformly at random.
    ///
    /// # Errors
    ///
    /// Returns [`RoverError::NotEnoughTransitions`] while the buffer holds
    /// fewer than `size` transitions.
    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        if self.size < size {
            return Err(RoverError::NotEnoughTransitions {
                len: self.size,
                requested: size,
            }
            .into());
        }

        let ixs = (0..size)
            .map(|_| (self.rng.next_u32() as usize) % self.size)
            .collect::<Vec<_>>();

        Ok(Self::Batch {
            obs: self.obs.sample(&ixs),
            act: self.act.sample(&ixs),
            next_obs: self.next_obs.sample(&ixs),
            reward: self.sample_reward(&ixs),
            is_terminated: self.sample_is_terminated(&ixs),
            is_truncated: self.sample_is_truncated(&ixs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::RoverError, TransitionBatch};

    #[derive(Clone, Debug)]
    struct VecBatch(Vec<f32>);

    impl BatchBase for VecBatch {
        fn new(capacity: usize) -> Self {
            Self(vec![0.; capacity])
        }

        fn push(&mut self, ix: usize, data: Self) {
            let capacity = self.0.len();
            let mut j = ix;
            for v in data.0.iter() {
                self.0[j] = *v;
                j += 1;
                if j == capacity {
                    j = 0;
                }
            }
        }

        fn sample(&self, ixs: &Vec<usize>) -> Self {
            Self(ixs.iter().map(|ix| self.0[*ix]).collect())
        }
    }

    fn transition(v: f32) -> GenericTransitionBatch<VecBatch, VecBatch> {
        GenericTransitionBatch {
            obs: VecBatch(vec![v]),
            act: VecBatch(vec![v]),
            next_obs: VecBatch(vec![v + 1.]),
            reward: vec![v],
            is_terminated: vec![0],
            is_truncated: vec![0],
        }
    }

    fn buffer(capacity: usize) -> SimpleReplayBuffer<VecBatch, VecBatch> {
        let config = SimpleReplayBufferConfig::default().capacity(capacity);
        SimpleReplayBuffer::build(&config)
    }

    #[test]
    fn len_saturates_at_capacity() {
        let mut buffer = buffer(4);
        for i in 0..6 {
            buffer.push(transition(i as f32)).unwrap();
        }
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn overwrites_oldest_when_full() {
        let mut buffer = buffer(3);
        for i in 0..5 {
            buffer.push(transition(i as f32)).unwrap();
        }
        // slots hold transitions 3, 4, 2 after wrapping
        assert_eq!(buffer.sum_rewards(), 9.0);
    }

    #[test]
    fn batch_fails_until_enough_transitions() {
        let mut buffer = buffer(8);
        buffer.push(transition(0.)).unwrap();
        let err = buffer.batch(2).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<RoverError>(),
            Some(RoverError::NotEnoughTransitions {
                len: 1,
                requested: 2
            })
        ));

        buffer.push(transition(1.)).unwrap();
        let batch = buffer.batch(2).unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn sampled_transitions_stay_aligned() {
        let mut buffer = buffer(8);
        for i in 0..8 {
            buffer.push(transition(i as f32)).unwrap();
        }
        let batch = buffer.batch(8).unwrap();
        for i in 0..8 {
            assert_eq!(batch.obs.0[i], batch.reward[i]);
            assert_eq!(batch.next_obs.0[i], batch.reward[i] + 1.);
        }
    }
}
