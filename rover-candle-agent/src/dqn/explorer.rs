//! Exploration strategy of DQN.
use candle_core::{shape::D, DType, Tensor};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Epsilon-greedy explorer with per-episode multiplicative decay.
///
/// `eps` starts at `eps_start` and is multiplied by `decay` at every call
/// of [`EpsilonGreedy::decay`], never falling below `eps_final`. After `E`
/// decays, `eps = max(eps_final, eps_start * decay^E)`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    pub(super) eps: f64,
    pub(super) eps_start: f64,
    pub(super) eps_final: f64,
    pub(super) decay_rate: f64,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            eps: 1.0,
            eps_start: 1.0,
            eps_final: 0.01,
            decay_rate: 0.995,
        }
    }
}

impl EpsilonGreedy {
    /// Set the initial epsilon value.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.eps_start = v;
        self.eps = v;
        self
    }

    /// Set the lower bound of epsilon.
    pub fn eps_final(mut self, v: f64) -> Self {
        self.eps_final = v;
        self
    }

    /// Set the multiplicative decay factor.
    pub fn decay_rate(mut self, v: f64) -> Self {
        self.decay_rate = v;
        self
    }

    /// Returns the current epsilon value.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Decays epsilon by one episode.
    pub fn decay(&mut self) {
        self.eps = (self.eps * self.decay_rate).max(self.eps_final);
    }

    /// Takes an action based on action values, returns i64 tensor.
    ///
    /// * `a` - action values of shape `[n_samples, n_actions]`.
    pub fn action(&mut self, a: &Tensor, rng: &mut impl Rng) -> Tensor {
        let is_random = rng.gen::<f64>() < self.eps;

        if is_random {
            let n_samples = a.dims()[0];
            let n_actions = a.dims()[1] as u64;
            Tensor::from_slice(
                (0..n_samples)
                    .map(|_| (rng.gen::<u64>() % n_actions) as i64)
                    .collect::<Vec<_>>()
                    .as_slice(),
                &[n_samples],
                a.device(),
            )
            .unwrap()
        } else {
            a.argmax(D::Minus1).unwrap().to_dtype(DType::I64).unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EpsilonGreedy;
    use candle_core::{Device, Tensor};
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn decay_has_a_closed_form() {
        let mut explorer = EpsilonGreedy::default();
        for _ in 0..100 {
            explorer.decay();
        }
        let expected = 0.995f64.powi(100);
        assert!((explorer.eps() - expected).abs() < 1e-12);
    }

    #[test]
    fn decay_is_floored() {
        let mut explorer = EpsilonGreedy::default();
        for _ in 0..2000 {
            explorer.decay();
        }
        assert_eq!(explorer.eps(), 0.01);
    }

    #[test]
    fn zero_eps_is_greedy() {
        let mut explorer = EpsilonGreedy::default().eps_start(0.);
        let mut rng = SmallRng::seed_from_u64(0);
        let a = Tensor::from_slice(&[0.1f32, 0.9, 0.2, 0.3], &[1, 4], &Device::Cpu).unwrap();
        for _ in 0..10 {
            let act = explorer.action(&a, &mut rng);
            assert_eq!(act.to_vec1::<i64>().unwrap(), vec![1]);
        }
    }
}
