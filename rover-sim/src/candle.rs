//! Tensor conversions for observations and actions.
//!
//! Available with the `candle` feature. These conversions let a neural
//! agent consume [`CarObs`] and emit [`CarAct`] as [`candle_core::Tensor`]s
//! with a leading batch dimension of 1.
use crate::{CarAct, CarObs, N_RAYS};
use candle_core::{Device, Tensor};

impl From<CarObs> for Tensor {
    fn from(obs: CarObs) -> Tensor {
        Tensor::from_slice(&obs.to_array(), &[1, N_RAYS + 1], &Device::Cpu)
            .expect("Failed to convert CarObs to Tensor")
    }
}

impl From<Tensor> for CarAct {
    /// Takes the first element of a tensor of action indices.
    fn from(t: Tensor) -> Self {
        let ixs: Vec<i64> = t
            .flatten_all()
            .and_then(|t| t.to_vec1())
            .expect("Failed to convert Tensor to CarAct");
        Self(ixs[0] as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obs_to_tensor_shape() {
        let obs = CarObs {
            rays: [0.25, 0.5, 1.0],
            speed: 0.6,
        };
        let t: Tensor = obs.into();
        assert_eq!(t.dims(), &[1, 4]);
        assert_eq!(
            t.flatten_all().unwrap().to_vec1::<f32>().unwrap(),
            vec![0.25, 0.5, 1.0, 0.6]
        );
    }

    #[test]
    fn tensor_to_act() {
        let t = Tensor::from_slice(&[3i64], &[1], &Device::Cpu).unwrap();
        let act = CarAct::from(t);
        assert_eq!(act, CarAct(3));
    }
}
