use super::ActorConfig;
use crate::{
    error::ActorError,
    model::SubModel1,
    opt::Optimizer,
    policy::{BoundedPolicy, BoundedPolicyConfig},
    record::Record,
    util::{
        array1_to_tensor, array2_to_tensor, check_same_structure, lock_vars, param_stats,
        tensor_to_array1, tensor_to_array2, track,
    },
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::{info, trace};
use ndarray::{Array1, Array2};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// File name used by [`Actor::save_weights_in`] and [`Actor::load_weights_from`].
pub const WEIGHTS_FILE_NAME: &str = "actor.safetensors";

fn build_policy(config: BoundedPolicyConfig, device: &Device) -> Result<(VarMap, BoundedPolicy)> {
    let varmap = VarMap::new();
    let policy = {
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device).set_prefix("actor");
        BoundedPolicy::build(vb, config)?
    };
    Ok((varmap, policy))
}

fn snapshot(varmap: &VarMap) -> Result<HashMap<String, Tensor>> {
    lock_vars(varmap)?
        .iter()
        .map(|(k, v)| Ok((k.clone(), v.as_tensor().copy()?)))
        .collect()
}

/// Deterministic actor of DDPG.
///
/// The actor has two policy networks of the same structure. The online network is
/// trained with [`Actor::train`], while the target network follows the online
/// network with [`Actor::update_target_network`] only.
pub struct Actor {
    config: ActorConfig,
    device: Device,

    // Online network
    varmap: VarMap,
    policy: BoundedPolicy,

    // Target network
    varmap_tgt: VarMap,
    policy_tgt: BoundedPolicy,

    // Optimizer of the online network
    opt: Optimizer,
}

impl Actor {
    /// Constructs [`Actor`].
    ///
    /// The online and target networks are initialized independently.
    pub fn build(config: ActorConfig) -> Result<Self> {
        config.check()?;
        let device = config.device.to_candle()?;
        let (varmap, policy) = build_policy(config.policy_config(), &device)?;
        let (varmap_tgt, policy_tgt) = build_policy(config.policy_config(), &device)?;
        let opt = config.opt_config.build(varmap.all_vars())?;
        info!(
            "Build actor: state_dim = {}, action_dim = {}, action_bound = {}, tau = {}",
            config.state_dim, config.action_dim, config.action_bound, config.tau
        );

        Ok(Self {
            config,
            device,
            varmap,
            policy,
            varmap_tgt,
            policy_tgt,
            opt,
        })
    }

    /// Constructs [`Actor`] with the default network and Adam optimizer.
    pub fn new(
        state_dim: usize,
        action_dim: usize,
        action_bound: f64,
        tau: f64,
        learning_rate: f64,
    ) -> Result<Self> {
        Self::build(ActorConfig::new(
            state_dim,
            action_dim,
            action_bound,
            tau,
            learning_rate,
        ))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ActorConfig {
        &self.config
    }

    /// Returns the soft update rate.
    pub fn tau(&self) -> f64 {
        self.config.tau
    }

    /// Returns the bound of actions.
    pub fn action_bound(&self) -> f64 {
        self.config.action_bound
    }

    fn check_states(&self, dims: &[usize]) -> Result<(), ActorError> {
        if dims.len() != 2 || dims[1] != self.config.state_dim {
            return Err(ActorError::ShapeMismatch(format!(
                "states must be of shape (batch_size, {}), got {:?}",
                self.config.state_dim, dims
            )));
        }
        Ok(())
    }

    /// Applies the online network to a batch of states of shape `(batch_size, state_dim)`.
    ///
    /// The output keeps the computation graph, so it can be differentiated.
    pub fn forward(&self, states: &Tensor) -> Result<Tensor> {
        self.check_states(states.dims())?;
        self.policy.forward(states)
    }

    /// Returns the action of the online network for a single state.
    pub fn predict(&self, state: &Array1<f32>) -> Result<Array1<f32>> {
        if state.len() != self.config.state_dim {
            return Err(ActorError::ShapeMismatch(format!(
                "state must be of length {}, got {}",
                self.config.state_dim,
                state.len()
            ))
            .into());
        }
        let xs = array1_to_tensor(state, true, &self.device)?;
        let act = self.policy.forward(&xs)?.detach();
        tensor_to_array1(act, true)
    }

    /// Returns the actions of the target network for a batch of states.
    ///
    /// Unlike [`Actor::predict`], the batch dimension is given by the caller:
    /// `states` is of shape `(batch_size, state_dim)`.
    pub fn target_predict(&self, states: &Array2<f32>) -> Result<Array2<f32>> {
        self.check_states(states.shape())?;
        let xs = array2_to_tensor(states, &self.device)?;
        let act = self.policy_tgt.forward(&xs)?.detach();
        tensor_to_array2(act)
    }

    /// Moves the target network toward the online network.
    ///
    /// `target = tau * online + (1 - tau) * target`
    pub fn update_target_network(&mut self) -> Result<()> {
        track(&self.varmap_tgt, &self.varmap, self.config.tau)
    }

    /// Applies one optimization step to the online network.
    ///
    /// `dq_das` is the gradient of the critic's action value with respect to the
    /// action, evaluated at `states` and the actions of the online network, of shape
    /// `(batch_size, action_dim)`. The parameters are moved in the direction
    /// increasing the action value.
    pub fn train(&mut self, states: &Array2<f32>, dq_das: &Array2<f32>) -> Result<()> {
        self.check_states(states.shape())?;
        let (n, action_dim) = dq_das.dim();
        if action_dim != self.config.action_dim {
            return Err(ActorError::ShapeMismatch(format!(
                "dq_das must be of shape (batch_size, {}), got {:?}",
                self.config.action_dim,
                dq_das.shape()
            ))
            .into());
        }
        if n != states.nrows() || n == 0 {
            return Err(ActorError::ShapeMismatch(format!(
                "batch sizes of states ({}) and dq_das ({}) must be equal and positive",
                states.nrows(),
                n
            ))
            .into());
        }

        let states = array2_to_tensor(states, &self.device)?;
        let dq_das = array2_to_tensor(dq_das, &self.device)?;
        self.train_tensor(&states, &dq_das)
    }

    // The gradient of sum(a(s) * (-dq_das)) w.r.t. the parameters is the vector-Jacobian
    // product of the policy output with -dq_das. The optimizer descends on it.
    fn train_tensor(&mut self, states: &Tensor, dq_das: &Tensor) -> Result<()> {
        let upstream = dq_das.detach().neg()?;
        let act = self.forward(states)?;
        let loss = (&act * &upstream)?.sum_all()?;
        trace!("actor surrogate loss: {:?}", loss.to_vec0::<f32>()?);
        self.opt.backward_step(&loss)
    }

    /// Saves the parameters of the online network to `path`.
    pub fn save_weights(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.varmap.save(path)?;
        info!("Save actor parameters to {:?}", path);
        Ok(())
    }

    /// Loads the parameters of the online network from `path`.
    ///
    /// The file must hold exactly the parameters of the current network. Otherwise
    /// the online network is left unchanged.
    pub fn load_weights(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tensors = candle_core::safetensors::load(path, &self.device).map_err(|e| {
            ActorError::WeightFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        let vars = lock_vars(&self.varmap)?;
        check_same_structure(&vars, tensors.iter())?;
        let values = vars
            .iter()
            .map(|(k, var)| Ok((var, tensors[k].to_dtype(var.dtype())?)))
            .collect::<Result<Vec<_>>>()?;
        for (var, t) in values {
            var.set(&t)?;
        }
        info!("Load actor parameters from {:?}", path);

        Ok(())
    }

    /// Saves the parameters of the online network to [`WEIGHTS_FILE_NAME`] in `dir`.
    pub fn save_weights_in(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(WEIGHTS_FILE_NAME);
        self.save_weights(&path)?;
        Ok(path)
    }

    /// Loads the parameters of the online network from [`WEIGHTS_FILE_NAME`] in `dir`.
    pub fn load_weights_from(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        self.load_weights(dir.as_ref().join(WEIGHTS_FILE_NAME))
    }

    /// Returns the mean and standard deviation of the parameters of the online network.
    pub fn param_stats(&self) -> Result<Record> {
        param_stats(&self.varmap)
    }

    /// Returns a copy of the parameters of the online network.
    pub fn online_params(&self) -> Result<HashMap<String, Tensor>> {
        snapshot(&self.varmap)
    }

    /// Returns a copy of the parameters of the target network.
    pub fn target_params(&self) -> Result<HashMap<String, Tensor>> {
        snapshot(&self.varmap_tgt)
    }
}
