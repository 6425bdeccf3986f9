//! Actor of DDPG agent.
mod base;
mod config;
pub use base::{Actor, WEIGHTS_FILE_NAME};
pub use config::ActorConfig;
