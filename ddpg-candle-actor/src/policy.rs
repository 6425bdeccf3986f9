//! Deterministic policy with bounded actions.
use crate::{
    mlp::{Activation, Mlp, MlpConfig},
    model::SubModel1,
};
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::VarBuilder;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`BoundedPolicy`].
pub struct BoundedPolicyConfig {
    pub(crate) mlp_config: MlpConfig,
    pub(crate) action_bound: f64,
}

impl BoundedPolicyConfig {
    /// MLP with the given hidden layers and a `tanh` output layer, followed by scaling.
    pub fn new(state_dim: usize, units: Vec<usize>, action_dim: usize, action_bound: f64) -> Self {
        Self {
            mlp_config: MlpConfig::new(state_dim, units, action_dim, Activation::Tanh),
            action_bound,
        }
    }
}

/// Deterministic policy network.
///
/// Maps a batch of states `(batch_size, state_dim)` to actions
/// `(batch_size, action_dim)` in `[-action_bound, action_bound]`. The scaling is a
/// separate operation after `tanh` so that gradients flow through it in training.
pub struct BoundedPolicy {
    mlp: Mlp,
    action_bound: f64,
}

impl SubModel1 for BoundedPolicy {
    type Config = BoundedPolicyConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let mlp = Mlp::build(vb, config.mlp_config)?;
        Ok(Self {
            mlp,
            action_bound: config.action_bound,
        })
    }

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        let xs = self.mlp.forward(xs)?;
        Ok(xs.affine(self.action_bound, 0.0)?)
    }
}
