use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::{track, OutDim},
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`DqnModel`].
pub struct DqnModelConfig<Q>
where
    Q: OutDim,
{
    pub(super) q_config: Option<Q>,
    pub(super) opt_config: OptimizerConfig,
}

impl<Q> Default for DqnModelConfig<Q>
where
    Q: OutDim,
{
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<Q> DqnModelConfig<Q>
where
    Q: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for action-value function.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets output dimension of the model.
    pub fn out_dim(mut self, v: i64) -> Self {
        match &mut self.q_config {
            None => {}
            Some(q_config) => q_config.set_out_dim(v),
        };
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`DqnModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnModelConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// An action-value function with its own [`VarMap`] and optimizer.
///
/// The DQN agent holds two of these, the online network and the target
/// network, and synchronizes the latter from the former.
pub struct DqnModel<Q>
where
    Q: SubModel1<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim,
{
    device: Device,
    varmap: VarMap,

    // Dimension of the output vector (equal to the number of actions).
    pub(super) out_dim: i64,

    // Action-value function
    q: Q,

    opt_config: OptimizerConfig,
    q_config: Q::Config,
    opt: Optimizer,
}

impl<Q> DqnModel<Q>
where
    Q: SubModel1<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`DqnModel`].
    pub fn build(config: DqnModelConfig<Q::Config>, device: Device) -> Result<Self> {
        let q_config = config.q_config.context("q_config is not set.")?;
        let out_dim = q_config.get_out_dim();
        let opt_config = config.opt_config;
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            Q::build(vb, q_config.clone())
        };

        Ok(Self::_build(
            device, out_dim, opt_config, q_config, q, varmap, None,
        ))
    }

    fn _build(
        device: Device,
        out_dim: i64,
        opt_config: OptimizerConfig,
        q_config: Q::Config,
        q: Q,
        varmap: VarMap,
        varmap_src: Option<&VarMap>,
    ) -> Self {
        let opt = opt_config.build(varmap.all_vars()).unwrap();

        // Copy values into the freshly built variables. `VarMap::clone`
        // would alias the underlying storage; the two maps must stay
        // distinct so the networks can diverge and synchronize later.
        if let Some(varmap_src) = varmap_src {
            track(&varmap, varmap_src, 1.0).unwrap();
        }

        Self {
            device,
            out_dim,
            opt_config,
            varmap,
            opt,
            q,
            q_config,
        }
    }

    /// Outputs the action-value given observation(s).
    pub fn forward(&self, obs: &Q::Input) -> Tensor {
        self.q.forward(obs)
    }

    /// Applies a backward pass and an optimization step given a loss.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Returns the variables of the network.
    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the variables as a safetensors file.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save DQN model to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the variables from a safetensors file.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load DQN model from {:?}", path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DqnModel, DqnModelConfig};
    use crate::mlp::{Mlp, MlpConfig};
    use crate::util::track;
    use candle_core::{Device, Tensor};
    use tempdir::TempDir;

    fn model_config() -> DqnModelConfig<MlpConfig> {
        DqnModelConfig::default().q_config(MlpConfig::new(4, vec![16, 16], 8, false))
    }

    fn probe_batch() -> Tensor {
        Tensor::rand(0f32, 1f32, (5, 4), &Device::Cpu).unwrap()
    }

    #[test]
    fn save_load_round_trip_preserves_outputs() {
        let dir = TempDir::new("dqn_model").unwrap();
        let path = dir.path().join("qnet.safetensors");
        let xs = probe_batch();

        let model = DqnModel::<Mlp>::build(model_config(), Device::Cpu).unwrap();
        let before = model.forward(&xs).to_vec2::<f32>().unwrap();
        model.save(&path).unwrap();

        // a freshly initialized model disagrees until it loads the file
        let mut other = DqnModel::<Mlp>::build(model_config(), Device::Cpu).unwrap();
        other.load(&path).unwrap();
        let after = other.forward(&xs).to_vec2::<f32>().unwrap();
        assert_eq!(before, after);

        let greedy_before = argmax_rows(&before);
        let greedy_after = argmax_rows(&after);
        assert_eq!(greedy_before, greedy_after);
    }

    #[test]
    fn clone_copies_the_variables() {
        let model = DqnModel::<Mlp>::build(model_config(), Device::Cpu).unwrap();
        let clone = model.clone();
        let xs = probe_batch();
        assert_eq!(
            model.forward(&xs).to_vec2::<f32>().unwrap(),
            clone.forward(&xs).to_vec2::<f32>().unwrap()
        );
    }

    #[test]
    fn cloned_variable_maps_stay_distinct() {
        let model = DqnModel::<Mlp>::build(model_config(), Device::Cpu).unwrap();
        let target = model.clone();
        let xs = probe_batch();
        let cloned = target.forward(&xs).to_vec2::<f32>().unwrap();

        // overwrite the online network; the target must keep its own values
        let other = DqnModel::<Mlp>::build(model_config(), Device::Cpu).unwrap();
        track(model.get_varmap(), other.get_varmap(), 1.0).unwrap();
        assert_ne!(model.forward(&xs).to_vec2::<f32>().unwrap(), cloned);
        assert_eq!(target.forward(&xs).to_vec2::<f32>().unwrap(), cloned);

        // a hard sync between the two maps completes and re-equalizes them
        track(target.get_varmap(), model.get_varmap(), 1.0).unwrap();
        assert_eq!(
            model.forward(&xs).to_vec2::<f32>().unwrap(),
            target.forward(&xs).to_vec2::<f32>().unwrap()
        );
    }

    fn argmax_rows(rows: &Vec<Vec<f32>>) -> Vec<usize> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                    .unwrap()
                    .0
            })
            .collect()
    }
}

impl<Q> Clone for DqnModel<Q>
where
    Q: SubModel1<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    fn clone(&self) -> Self {
        let device = self.device.clone();
        let out_dim = self.out_dim;
        let opt_config = self.opt_config.clone();
        let q_config = self.q_config.clone();
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            Q::build(vb, self.q_config.clone())
        };

        Self::_build(
            device,
            out_dim,
            opt_config,
            q_config,
            q,
            varmap,
            Some(&self.varmap),
        )
    }
}
