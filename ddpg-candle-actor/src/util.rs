//! Utilities.
use crate::{
    error::ActorError,
    record::{Record, RecordValue},
};
use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor, Var, WithDType};
use candle_nn::VarMap;
use log::trace;
use ndarray::{Array1, Array2, ArrayD, Ix1, Ix2, IxDyn};
use num_traits::AsPrimitive;
use std::{collections::HashMap, sync::MutexGuard};

pub(crate) fn lock_vars(varmap: &VarMap) -> Result<MutexGuard<'_, HashMap<String, Var>>> {
    varmap
        .data()
        .lock()
        .map_err(|_| anyhow!("VarMap mutex is poisoned"))
}

/// Checks that `found` holds exactly the names and shapes of `expected`.
pub(crate) fn check_same_structure<'a, I>(
    expected: &HashMap<String, Var>,
    found: I,
) -> Result<(), ActorError>
where
    I: IntoIterator<Item = (&'a String, &'a Tensor)>,
{
    let found: HashMap<&str, &[usize]> = found
        .into_iter()
        .map(|(k, t)| (k.as_str(), t.dims()))
        .collect();
    if expected.len() != found.len() {
        return Err(ActorError::ShapeMismatch(format!(
            "expected {} parameter tensors, found {}",
            expected.len(),
            found.len()
        )));
    }
    for (name, var) in expected.iter() {
        let dims = found
            .get(name.as_str())
            .ok_or_else(|| ActorError::ShapeMismatch(format!("parameter {} is missing", name)))?;
        if *dims != var.dims() {
            return Err(ActorError::ShapeMismatch(format!(
                "parameter {}: expected {:?}, found {:?}",
                name,
                var.dims(),
                dims
            )));
        }
    }
    Ok(())
}

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
///
/// Names and shapes are checked before any variable is written, so `dest` is
/// left unchanged on error. Tracking a [`VarMap`] with itself is a no-op.
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("track with tau = {}", tau);
    if std::ptr::eq(dest.data(), src.data()) {
        return Ok(());
    }
    let dest = lock_vars(dest)?;
    let src = lock_vars(src)?;
    check_same_structure(&dest, src.iter().map(|(k, v)| (k, v.as_tensor())))?;

    let updated = dest
        .iter()
        .map(|(k, v_dest)| {
            let t_src = src[k].as_tensor();
            let t_dest = v_dest.as_tensor();
            let t = (t_src.affine(tau, 0.0)? + t_dest.affine(1.0 - tau, 0.0)?)?;
            Ok((v_dest, t))
        })
        .collect::<Result<Vec<_>>>()?;

    for (v_dest, t) in updated {
        v_dest.set(&t)?;
    }

    Ok(())
}

/// Returns the standard deviation of a tensor.
pub fn std(t: &Tensor) -> Result<f32> {
    Ok(t
        .broadcast_sub(&t.mean_all()?)?
        .powf(2f64)?
        .mean_all()?
        .sqrt()?
        .to_vec0::<f32>()?)
}

/// Returns the mean and standard deviation of the parameters.
///
/// Keys are `{name}_mean` and `{name}_std`.
pub fn param_stats(varmap: &VarMap) -> Result<Record> {
    let mut record = Record::empty();

    for (k, v) in lock_vars(varmap)?.iter() {
        let m: f32 = v.mean_all()?.to_vec0()?;
        record.insert(format!("{}_mean", &k), RecordValue::Scalar(m));

        let s = std(v.as_tensor())?;
        record.insert(format!("{}_std", &k), RecordValue::Scalar(s));
    }

    Ok(record)
}

/// Converts an array into a tensor on the given device.
pub fn arrayd_to_tensor<T1, T2>(
    a: ArrayD<T1>,
    add_batch_dim: bool,
    device: &Device,
) -> Result<Tensor>
where
    T1: AsPrimitive<T2>,
    T2: WithDType,
{
    let shape = a.shape().to_vec();
    let v = a.iter().map(|e| e.as_()).collect::<Vec<T2>>();
    let t = Tensor::from_vec(v, shape, device)?;

    match add_batch_dim {
        true => Ok(t.unsqueeze(0)?),
        false => Ok(t),
    }
}

/// Converts a tensor into an array.
///
/// If `delete_batch_dim` is `true`, the first axis, which must be of length 1, is removed.
pub fn tensor_to_arrayd<T>(t: Tensor, delete_batch_dim: bool) -> Result<ArrayD<T>>
where
    T: WithDType,
{
    let shape = match delete_batch_dim {
        false => t.dims().to_vec(),
        true => {
            if t.dims().first() != Some(&1) {
                return Err(ActorError::ShapeMismatch(format!(
                    "cannot remove batch dimension of a tensor of shape {:?}",
                    t.dims()
                ))
                .into());
            }
            t.dims()[1..].to_vec()
        }
    };
    let v: Vec<T> = t.flatten_all()?.to_vec1()?;

    Ok(ndarray::Array1::<T>::from(v).into_shape(IxDyn(&shape))?)
}

/// Converts a state vector into a tensor, optionally with a batch dimension of length 1.
pub fn array1_to_tensor(a: &Array1<f32>, add_batch_dim: bool, device: &Device) -> Result<Tensor> {
    arrayd_to_tensor::<f32, f32>(a.clone().into_dyn(), add_batch_dim, device)
}

/// Converts a batch `(batch_size, dim)` into a tensor.
pub fn array2_to_tensor(a: &Array2<f32>, device: &Device) -> Result<Tensor> {
    arrayd_to_tensor::<f32, f32>(a.clone().into_dyn(), false, device)
}

/// Converts a tensor into a vector, removing the batch dimension if `delete_batch_dim` is `true`.
pub fn tensor_to_array1(t: Tensor, delete_batch_dim: bool) -> Result<Array1<f32>> {
    Ok(tensor_to_arrayd::<f32>(t, delete_batch_dim)?.into_dimensionality::<Ix1>()?)
}

/// Converts a tensor of shape `(batch_size, dim)` into an array.
pub fn tensor_to_array2(t: Tensor) -> Result<Array2<f32>> {
    Ok(tensor_to_arrayd::<f32>(t, false)?.into_dimensionality::<Ix2>()?)
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::DType;
    use candle_nn::Init;

    fn varmap_with(name: &str, t: &Tensor) -> Result<VarMap> {
        let vm = VarMap::new();
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };
        vm.get(t.dims(), name, init, DType::F32, &Device::Cpu)?;
        lock_vars(&vm)?[name].set(t)?;
        Ok(vm)
    }

    fn get(vm: &VarMap, name: &str) -> Result<Vec<f32>> {
        Ok(lock_vars(vm)?[name].as_tensor().to_vec1()?)
    }

    #[test]
    fn test_track() -> Result<()> {
        let tau = 0.7;
        let t_src = Tensor::from_slice(&[1.0f32, 2.0, 3.0], (3,), &Device::Cpu)?;
        let t_dest = Tensor::from_slice(&[4.0f32, 5.0, 6.0], (3,), &Device::Cpu)?;
        let t: Vec<f32> = ((tau * &t_src)? + ((1.0 - tau) * &t_dest)?)?.to_vec1()?;

        let vm_src = varmap_with("var1", &t_src)?;
        let vm_dest = varmap_with("var1", &t_dest)?;
        track(&vm_dest, &vm_src, tau)?;

        let t_ = get(&vm_dest, "var1")?;
        for (a, b) in t.iter().zip(t_.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
        assert_eq!(get(&vm_src, "var1")?, vec![1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_track_boundary_rates() -> Result<()> {
        let t_src = Tensor::from_slice(&[1.5f32, -2.25, 3.0], (3,), &Device::Cpu)?;
        let t_dest = Tensor::from_slice(&[4.0f32, 5.0, -6.125], (3,), &Device::Cpu)?;
        let vm_src = varmap_with("w", &t_src)?;
        let vm_dest = varmap_with("w", &t_dest)?;

        track(&vm_dest, &vm_src, 0.0)?;
        assert_eq!(get(&vm_dest, "w")?, vec![4.0, 5.0, -6.125]);

        track(&vm_dest, &vm_src, 1.0)?;
        assert_eq!(get(&vm_dest, "w")?, vec![1.5, -2.25, 3.0]);
        Ok(())
    }

    #[test]
    fn test_track_with_itself() -> Result<()> {
        let t = Tensor::from_slice(&[1.5f32, -2.25, 3.0], (3,), &Device::Cpu)?;
        let vm = varmap_with("w", &t)?;

        track(&vm, &vm, 0.5)?;
        assert_eq!(get(&vm, "w")?, vec![1.5, -2.25, 3.0]);

        // Clones of a VarMap share their variables.
        let vm_ = vm.clone();
        track(&vm, &vm_, 0.3)?;
        assert_eq!(get(&vm, "w")?, vec![1.5, -2.25, 3.0]);
        Ok(())
    }

    #[test]
    fn test_track_shape_mismatch_leaves_dest() -> Result<()> {
        let t_src = Tensor::from_slice(&[1.0f32, 2.0], (2,), &Device::Cpu)?;
        let t_dest = Tensor::from_slice(&[4.0f32, 5.0, 6.0], (3,), &Device::Cpu)?;
        let vm_src = varmap_with("w", &t_src)?;
        let vm_dest = varmap_with("w", &t_dest)?;

        let err = track(&vm_dest, &vm_src, 0.5).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActorError>(),
            Some(ActorError::ShapeMismatch(_))
        ));
        assert_eq!(get(&vm_dest, "w")?, vec![4.0, 5.0, 6.0]);
        Ok(())
    }

    #[test]
    fn test_param_stats() -> Result<()> {
        let t = Tensor::from_slice(&[1.0f32, 3.0], (2,), &Device::Cpu)?;
        let vm = varmap_with("w", &t)?;
        let record = param_stats(&vm)?;

        assert_eq!(record.len(), 2);
        assert_eq!(record.get_scalar("w_mean")?, 2.0);
        assert_eq!(record.get_scalar("w_std")?, 1.0);
        Ok(())
    }

    #[test]
    fn test_array_tensor_conversion() -> Result<()> {
        let a = ndarray::array![[1.0f32, 2.0], [3.0, 4.0]].into_dyn();
        let t = arrayd_to_tensor::<f32, f32>(a.clone(), true, &Device::Cpu)?;
        assert_eq!(t.dims(), &[1, 2, 2]);

        let b = tensor_to_arrayd::<f32>(t, true)?;
        assert_eq!(a, b);

        let t = arrayd_to_tensor::<f32, f32>(a, false, &Device::Cpu)?;
        assert!(tensor_to_arrayd::<f32>(t, true).is_err());
        Ok(())
    }

    #[test]
    fn test_typed_array_tensor_conversion() -> Result<()> {
        let state = ndarray::array![0.5f32, -1.0, 2.0];
        let t = array1_to_tensor(&state, true, &Device::Cpu)?;
        assert_eq!(t.dims(), &[1, 3]);
        assert_eq!(tensor_to_array1(t, true)?, state);

        let batch = ndarray::array![[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let t = array2_to_tensor(&batch, &Device::Cpu)?;
        assert_eq!(t.dims(), &[2, 3]);
        assert!(tensor_to_array1(t.clone(), false).is_err());
        assert_eq!(tensor_to_array2(t)?, batch);
        Ok(())
    }
}
