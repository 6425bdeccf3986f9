use crate::{error::ActorError, opt::OptimizerConfig, policy::BoundedPolicyConfig, Device};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

fn default_hidden_units() -> Vec<usize> {
    vec![64, 32, 16]
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
/// Configuration of [`Actor`](super::Actor).
pub struct ActorConfig {
    /// Dimension of state vectors.
    pub state_dim: usize,

    /// Dimension of action vectors.
    pub action_dim: usize,

    /// Actions are bounded to `[-action_bound, action_bound]`.
    pub action_bound: f64,

    /// Rate of the soft update of the target network, in `(0, 1]`.
    pub tau: f64,

    /// Widths of the hidden layers.
    pub hidden_units: Vec<usize>,

    /// Optimizer of the online network.
    pub opt_config: OptimizerConfig,

    /// Device on which the networks are placed.
    pub device: Device,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            state_dim: 0,
            action_dim: 0,
            action_bound: 1.0,
            tau: 0.001,
            hidden_units: default_hidden_units(),
            opt_config: OptimizerConfig::default(),
            device: Device::Cpu,
        }
    }
}

impl ActorConfig {
    /// Configuration with the default network and Adam optimizer.
    pub fn new(
        state_dim: usize,
        action_dim: usize,
        action_bound: f64,
        tau: f64,
        learning_rate: f64,
    ) -> Self {
        Self {
            state_dim,
            action_dim,
            action_bound,
            tau,
            opt_config: OptimizerConfig::adam(learning_rate),
            ..Self::default()
        }
    }

    /// Sets the dimension of state vectors.
    pub fn state_dim(mut self, v: usize) -> Self {
        self.state_dim = v;
        self
    }

    /// Sets the dimension of action vectors.
    pub fn action_dim(mut self, v: usize) -> Self {
        self.action_dim = v;
        self
    }

    /// Sets the bound of actions.
    pub fn action_bound(mut self, v: f64) -> Self {
        self.action_bound = v;
        self
    }

    /// Sets the soft update rate.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Sets the widths of the hidden layers.
    pub fn hidden_units(mut self, v: Vec<usize>) -> Self {
        self.hidden_units = v;
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Overrides the learning rate of the optimizer.
    pub fn learning_rate(mut self, v: f64) -> Self {
        self.opt_config = self.opt_config.learning_rate(v);
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Checks the values of the configuration.
    pub fn check(&self) -> Result<(), ActorError> {
        let err = |s: String| Err(ActorError::Configuration(s));

        if self.state_dim == 0 {
            return err("state_dim must be positive".to_string());
        }
        if self.action_dim == 0 {
            return err("action_dim must be positive".to_string());
        }
        if !(self.action_bound.is_finite() && self.action_bound > 0.0) {
            return err(format!("action_bound must be positive, got {}", self.action_bound));
        }
        if !(self.tau > 0.0 && self.tau <= 1.0) {
            return err(format!("tau must be in (0, 1], got {}", self.tau));
        }
        if self.hidden_units.is_empty() || self.hidden_units.contains(&0) {
            return err(format!(
                "hidden_units must be non-empty and positive, got {:?}",
                self.hidden_units
            ));
        }
        let lr = self.opt_config.lr();
        if !(lr.is_finite() && lr > 0.0) {
            return err(format!("learning rate must be positive, got {}", lr));
        }
        Ok(())
    }

    /// Configuration of the policy network.
    pub(crate) fn policy_config(&self) -> BoundedPolicyConfig {
        BoundedPolicyConfig::new(
            self.state_dim,
            self.hidden_units.clone(),
            self.action_dim,
            self.action_bound,
        )
    }

    /// Constructs [`ActorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ActorConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    fn is_config_error(config: ActorConfig) -> bool {
        matches!(config.check(), Err(ActorError::Configuration(_)))
    }

    #[test]
    fn test_check() {
        let config = ActorConfig::new(3, 1, 2.0, 0.01, 0.001);
        assert!(config.check().is_ok());
        assert!(config.clone().tau(1.0).check().is_ok());

        assert!(is_config_error(config.clone().state_dim(0)));
        assert!(is_config_error(config.clone().action_dim(0)));
        assert!(is_config_error(config.clone().tau(0.0)));
        assert!(is_config_error(config.clone().tau(1.5)));
        assert!(is_config_error(config.clone().tau(f64::NAN)));
        assert!(is_config_error(config.clone().action_bound(0.0)));
        assert!(is_config_error(config.clone().action_bound(f64::INFINITY)));
        assert!(is_config_error(config.clone().learning_rate(0.0)));
        assert!(is_config_error(config.clone().hidden_units(vec![])));
        assert!(is_config_error(config.hidden_units(vec![64, 0])));
    }

    #[test]
    fn test_serde_actor_config() -> Result<()> {
        let config = ActorConfig::new(3, 1, 2.0, 0.01, 0.001).hidden_units(vec![32, 32]);

        let dir = TempDir::new("actor_config")?;
        let path = dir.path().join("actor_config.yaml");
        config.save(&path)?;
        let config_ = ActorConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_partial_yaml_uses_defaults() -> Result<()> {
        let config: ActorConfig = serde_yaml::from_str("state_dim: 3\naction_dim: 1\n")?;
        assert_eq!(config.hidden_units, vec![64, 32, 16]);
        assert_eq!(config.device, Device::Cpu);
        assert!(config.check().is_ok());
        Ok(())
    }
}
