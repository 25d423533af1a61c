//! DQN agent implemented with candle.
use super::{config::DqnConfig, explorer::EpsilonGreedy, model::DqnModel};
use crate::{
    model::SubModel1,
    util::{track, OutDim},
};
use anyhow::Result;
use candle_core::{shape::D, DType, Device, Tensor};
use candle_nn::loss::mse;
use log::info;
use rand::{rngs::SmallRng, SeedableRng};
use rover_core::{
    record::{Record, RecordValue},
    Agent, Configurable, Env, ExperienceBufferBase, Policy, ReplayBufferBase, TransitionBatch,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, marker::PhantomData, path::Path};

/// DQN agent with an online and a target Q-network.
///
/// In training mode actions are epsilon-greedy; in evaluation mode the
/// greedy action is always taken. Exploration decay and target network
/// synchronization are driven by [`Agent::on_episode_end`].
pub struct Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: Into<Q::Input>,
    E::Act: From<Q::Output>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<Q::Input>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    pub(in crate::dqn) qnet: DqnModel<Q>,
    pub(in crate::dqn) qnet_tgt: DqnModel<Q>,
    pub(in crate::dqn) batch_size: usize,
    pub(in crate::dqn) min_transitions_warmup: usize,
    pub(in crate::dqn) discount_factor: f64,
    pub(in crate::dqn) tau: f64,
    pub(in crate::dqn) target_sync_interval: usize,
    pub(in crate::dqn) explorer: EpsilonGreedy,
    pub(in crate::dqn) train: bool,
    pub(in crate::dqn) device: Device,
    pub(in crate::dqn) n_opts: usize,
    pub(in crate::dqn) episodes: usize,
    rng: SmallRng,
    phantom: PhantomData<(E, R)>,
}

impl<E, Q, R> Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: Into<Q::Input>,
    E::Act: From<Q::Output>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<Q::Input>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    /// Returns the current epsilon of the explorer.
    pub fn eps(&self) -> f64 {
        self.explorer.eps()
    }

    fn update_critic(&mut self, buffer: &mut R) -> f32 {
        let batch = buffer.batch(self.batch_size).unwrap();
        let (obs, act, next_obs, reward, is_terminated, is_truncated) = batch.unpack();
        let obs = obs.into();
        let act = act.into().to_device(&self.device).unwrap();
        let next_obs = next_obs.into();
        let reward = Tensor::from_slice(&reward[..], &[reward.len()], &self.device).unwrap();
        // an episode end of either kind stops the bootstrap
        let is_not_done = {
            let is_not_done = is_terminated
                .iter()
                .zip(is_truncated.iter())
                .map(|(t, u)| (1 - (t | u)) as f32)
                .collect::<Vec<_>>();
            Tensor::from_slice(&is_not_done[..], &[is_not_done.len()], &self.device).unwrap()
        };

        let pred = {
            let x = self.qnet.forward(&obs);
            x.gather(&act, D::Minus1)
                .unwrap()
                .squeeze(D::Minus1)
                .unwrap()
        };

        let tgt = {
            let q = {
                let x = self.qnet_tgt.forward(&next_obs);
                let y = x.argmax(D::Minus1).unwrap();
                x.gather(&y.unsqueeze(D::Minus1).unwrap(), D::Minus1)
                    .unwrap()
            };

            reward + is_not_done * self.discount_factor * q.squeeze(D::Minus1).unwrap()
        }
        .unwrap()
        .detach();

        let loss = mse(&pred, &tgt).unwrap();
        self.qnet.backward_step(&loss).unwrap();

        loss.to_scalar::<f32>().unwrap()
    }

    fn opt_(&mut self, buffer: &mut R) -> Record {
        let loss = self.update_critic(buffer);
        self.n_opts += 1;

        Record::from_slice(&[
            ("loss", RecordValue::Scalar(loss)),
            ("eps", RecordValue::Scalar(self.explorer.eps() as f32)),
        ])
    }

    fn sync_target(&mut self) {
        // tau = 1.0 overwrites the target with the online network
        let _ = track(self.qnet_tgt.get_varmap(), self.qnet.get_varmap(), self.tau);
    }
}

impl<E, Q, R> Configurable for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: Into<Q::Input>,
    E::Act: From<Q::Output>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<Q::Input>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    type Config = DqnConfig<Q::Config>;

    /// Constructs DQN agent.
    fn build(config: Self::Config) -> Self {
        let device: Device = config
            .device
            .expect("No device is given for DQN agent")
            .into();
        let qnet = DqnModel::build(config.model_config.clone(), device.clone()).unwrap();
        let qnet_tgt = qnet.clone();

        Dqn {
            qnet,
            qnet_tgt,
            batch_size: config.batch_size,
            min_transitions_warmup: config.min_transitions_warmup,
            discount_factor: config.discount_factor,
            tau: config.tau,
            target_sync_interval: config.target_sync_interval,
            explorer: config.explorer,
            train: config.train,
            device,
            n_opts: 0,
            episodes: 0,
            rng: SmallRng::seed_from_u64(config.seed),
            phantom: PhantomData,
        }
    }
}

impl<E, Q, R> Policy<E> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: Into<Q::Input>,
    E::Act: From<Q::Output>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<Q::Input>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    /// In evaluation mode, always takes the greedy action.
    fn sample(&mut self, obs: &E::Obs) -> E::Act {
        let a = self.qnet.forward(&obs.clone().into());
        let a = if self.train {
            self.explorer.action(&a, &mut self.rng)
        } else {
            a.argmax(D::Minus1).unwrap().to_dtype(DType::I64).unwrap()
        };
        a.into()
    }
}

impl<E, Q, R> Agent<E, R> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Output = Tensor>,
    R: ReplayBufferBase + ExperienceBufferBase,
    E::Obs: Into<Q::Input>,
    E::Act: From<Q::Output>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<Q::Input>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt(&mut self, buffer: &mut R) -> Option<Record> {
        if buffer.len() >= self.batch_size.max(self.min_transitions_warmup) {
            Some(self.opt_(buffer))
        } else {
            None
        }
    }

    fn on_episode_end(&mut self) {
        self.episodes += 1;
        self.explorer.decay();
        if self.episodes % self.target_sync_interval == 0 {
            info!("Sync target network at episode {}", self.episodes);
            self.sync_target();
        }
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(path.join("qnet.safetensors").as_path())?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.qnet.load(path.join("qnet.safetensors").as_path())?;
        // refresh the target copy from the loaded online network
        track(self.qnet_tgt.get_varmap(), self.qnet.get_varmap(), 1.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dqn::DqnModelConfig,
        mlp::{Mlp, MlpConfig},
        TensorBatch,
    };
    use rover_core::{
        replay_buffer::{GenericTransitionBatch, SimpleReplayBuffer, SimpleReplayBufferConfig},
        Act, Obs, Step,
    };

    #[derive(Clone, Debug)]
    struct PointObs([f32; 4]);

    impl Obs for PointObs {
        fn len(&self) -> usize {
            1
        }
    }

    impl From<PointObs> for Tensor {
        fn from(obs: PointObs) -> Tensor {
            Tensor::from_slice(&obs.0, &[1, 4], &Device::Cpu).unwrap()
        }
    }

    #[derive(Clone, Debug)]
    struct IndexAct(i64);

    impl Act for IndexAct {}

    impl From<Tensor> for IndexAct {
        fn from(t: Tensor) -> Self {
            let ixs: Vec<i64> = t.flatten_all().unwrap().to_vec1().unwrap();
            Self(ixs[0])
        }
    }

    struct PointEnv;

    impl Env for PointEnv {
        type Config = ();
        type Obs = PointObs;
        type Act = IndexAct;
        type Info = ();

        fn build(_config: &Self::Config, _seed: i64) -> anyhow::Result<Self> {
            Ok(Self)
        }

        fn reset(&mut self) -> anyhow::Result<Self::Obs> {
            Ok(PointObs([0.; 4]))
        }

        fn reset_with_index(&mut self, _ix: usize) -> anyhow::Result<Self::Obs> {
            self.reset()
        }

        fn step(&mut self, _a: &Self::Act) -> (Step<Self>, Record) {
            unimplemented!()
        }

        fn step_with_reset(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
            self.step(a)
        }
    }

    type Buffer = SimpleReplayBuffer<TensorBatch, TensorBatch>;

    fn agent() -> Dqn<PointEnv, Mlp, Buffer> {
        let model_config =
            DqnModelConfig::default().q_config(MlpConfig::new(4, vec![16, 16], 8, false));
        let config = DqnConfig::default()
            .model_config(model_config)
            .batch_size(4)
            .min_transitions_warmup(4)
            .target_sync_interval(2)
            .device(crate::Device::Cpu);
        Dqn::build(config)
    }

    fn transition(v: f32, a: i64) -> GenericTransitionBatch<TensorBatch, TensorBatch> {
        let row = |v: f32| {
            TensorBatch::from_tensor(
                Tensor::from_slice(&[v, v, v, v], &[1, 4], &Device::Cpu).unwrap(),
            )
        };
        GenericTransitionBatch {
            obs: row(v),
            act: TensorBatch::from_tensor(
                Tensor::from_slice(&[a], &[1, 1], &Device::Cpu).unwrap(),
            ),
            next_obs: row(v + 1.),
            reward: vec![1.],
            is_terminated: vec![0],
            is_truncated: vec![0],
        }
    }

    #[test]
    fn opt_waits_for_warmup_transitions() {
        let mut agent = agent();
        agent.train();
        let mut buffer = Buffer::build(&SimpleReplayBufferConfig::default().capacity(16));

        for i in 0..4 {
            assert!(agent.opt(&mut buffer).is_none());
            buffer.push(transition(i as f32, i as i64)).unwrap();
        }

        let record = agent.opt(&mut buffer).unwrap();
        assert!(record.get_scalar("loss").is_ok());
        assert!(record.get_scalar("eps").is_ok());
    }

    #[test]
    fn episode_end_decays_eps_and_syncs_target() {
        let mut agent = agent();
        let eps0 = agent.eps();

        agent.on_episode_end();
        assert!(agent.eps() < eps0);

        // the second episode triggers a target sync, which must complete
        agent.on_episode_end();
        assert_eq!(agent.episodes, 2);
    }
}
