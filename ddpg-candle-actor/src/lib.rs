//! Actor (policy) network of a DDPG agent implemented with [candle](https://crates.io/crates/candle-core).
//!
//! [`Actor`] owns an online policy network, a target policy network tracking the
//! online one with Polyak averaging, and the optimizer of the online network.
//! Gradients of the action value with respect to actions are supplied by a critic
//! living outside of this crate.
pub mod actor;
pub mod error;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod policy;
pub mod record;
pub mod util;
pub use actor::{Actor, ActorConfig, WEIGHTS_FILE_NAME};
pub use error::ActorError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl Device {
    /// Creates the corresponding [`candle_core::Device`].
    ///
    /// Fails if candle is built without CUDA support or the GPU is not available.
    pub fn to_candle(self) -> candle_core::Result<candle_core::Device> {
        match self {
            Self::Cpu => Ok(candle_core::Device::Cpu),
            Self::Cuda(n) => candle_core::Device::new_cuda(n),
        }
    }
}
