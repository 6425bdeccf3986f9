//! Multilayer perceptron.
mod base;
mod config;
use anyhow::Result;
pub use base::Mlp;
use candle_core::Tensor;
use candle_nn::{Linear, Module};
pub use config::MlpConfig;
use serde::{Deserialize, Serialize};

/// Activation function applied to the output of the last layer.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum Activation {
    /// Identity.
    None,

    /// ReLU.
    ReLU,

    /// Hyperbolic tangent, bounding the output to `[-1, 1]`.
    Tanh,
}

impl Activation {
    /// Applies the activation function.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        Ok(match self {
            Self::None => xs.clone(),
            Self::ReLU => xs.relu()?,
            Self::Tanh => xs.tanh()?,
        })
    }
}

fn mlp_forward(xs: Tensor, layers: &[Linear], final_act: &Activation) -> Result<Tensor> {
    let (last, hidden) = match layers.split_last() {
        Some(v) => v,
        None => return Ok(xs),
    };
    let mut xs = xs;

    for layer in hidden {
        xs = layer.forward(&xs)?.relu()?;
    }

    let xs = last.forward(&xs)?;
    final_act.forward(&xs)
}
