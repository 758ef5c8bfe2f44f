use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkerErr};

const DEFAULT_LOCAL_EPOCHS: NonZeroUsize = NonZeroUsize::new(5).unwrap();
const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(10).unwrap();

/// Where local training should run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceTarget {
    #[default]
    Cpu,
    Accelerator,
}

/// Local training settings, shared by every worker of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub local_epochs: NonZeroUsize,
    pub batch_size: NonZeroUsize,
    pub learning_rate: f32,
    pub device: DeviceTarget,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            local_epochs: DEFAULT_LOCAL_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            learning_rate: 0.1,
            device: DeviceTarget::Cpu,
        }
    }
}

impl WorkerConfig {
    /// Checks the invariants the types can't express.
    ///
    /// # Errors
    /// `WorkerErr::InvalidConfig` if the learning rate isn't a positive finite number.
    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(WorkerErr::InvalidConfig(format!(
                "learning rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(WorkerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_learning_rates() {
        for learning_rate in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let config = WorkerConfig {
                learning_rate,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(WorkerErr::InvalidConfig(_))));
        }
    }
}
