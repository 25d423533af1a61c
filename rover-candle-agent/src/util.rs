//! Utilities.
use anyhow::Result;
use candle_nn::VarMap;
use log::trace;

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
///
/// With `tau = 1.0` this is a hard copy of `src` into `dest`.
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("dest");
    let dest = dest.data().lock().unwrap();
    trace!("src");
    let src = src.data().lock().unwrap();

    dest.iter().for_each(|(k_dest, v_dest)| {
        let v_src = src.get(k_dest).unwrap();
        let t_src = v_src.as_tensor();
        let t_dest = v_dest.as_tensor();
        let t_dest = ((tau * t_src).unwrap() + (1.0 - tau) * t_dest).unwrap();
        v_dest.set(&t_dest).unwrap();
    });

    Ok(())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;

    /// Sets the output dimension.
    fn set_out_dim(&mut self, v: i64);
}

#[test]
fn test_track() -> Result<()> {
    use candle_core::{DType, Device, Tensor};
    use candle_nn::{Init, VarBuilder};

    let tau = 0.7;

    let vm_src = VarMap::new();
    let vm_dest = VarMap::new();
    {
        let vb = VarBuilder::from_varmap(&vm_src, DType::F32, &Device::Cpu);
        vb.get_with_hints(&[3], "w", Init::Const(1.))?;
        let vb = VarBuilder::from_varmap(&vm_dest, DType::F32, &Device::Cpu);
        vb.get_with_hints(&[3], "w", Init::Const(4.))?;
    }

    track(&vm_dest, &vm_src, tau)?;

    let expected = tau * 1. + (1. - tau) * 4.;
    let data = vm_dest.data().lock().unwrap();
    let w = data.get("w").unwrap().as_tensor().to_vec1::<f32>()?;
    for v in w {
        assert!((v as f64 - expected).abs() < 1e-6);
    }

    Ok(())
}

#[test]
fn test_track_hard_copy() -> Result<()> {
    use candle_core::{DType, Device};
    use candle_nn::{Init, VarBuilder};

    let vm_src = VarMap::new();
    let vm_dest = VarMap::new();
    {
        let vb = VarBuilder::from_varmap(&vm_src, DType::F32, &Device::Cpu);
        vb.get_with_hints(&[2], "w", Init::Const(3.))?;
        let vb = VarBuilder::from_varmap(&vm_dest, DType::F32, &Device::Cpu);
        vb.get_with_hints(&[2], "w", Init::Const(-1.))?;
    }

    track(&vm_dest, &vm_src, 1.0)?;

    let data = vm_dest.data().lock().unwrap();
    let w = data.get("w").unwrap().as_tensor().to_vec1::<f32>()?;
    assert_eq!(w, vec![3., 3.]);

    Ok(())
}
