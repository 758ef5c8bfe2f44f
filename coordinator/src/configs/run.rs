use std::{num::NonZeroUsize, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{CoordinatorError, Result};

const DEFAULT_GLOBAL_EPOCHS: NonZeroUsize = NonZeroUsize::new(10).unwrap();
const DEFAULT_GLOBAL_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(128).unwrap();
const DEFAULT_CHANNEL_CAPACITY: NonZeroUsize = NonZeroUsize::new(4).unwrap();

/// How the dataset is dealt among the workers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    /// Uniformly at random, in balanced shares.
    #[default]
    Iid,
    /// One class per worker.
    NonIid,
}

/// How each worker is scheduled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnStrategy {
    /// A task on the coordinator's runtime.
    #[default]
    Task,
    /// A dedicated OS thread driving its own single threaded runtime.
    Thread,
}

/// What to do when a selected worker doesn't report back.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StallPolicy {
    /// Wait for as long as it takes.
    #[default]
    Block,
    /// Fail the round once `millis` have passed since its dispatch.
    Timeout { millis: u64 },
}

impl StallPolicy {
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            Self::Block => None,
            Self::Timeout { millis } => Some(Duration::from_millis(*millis)),
        }
    }
}

/// The settings of the global training loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// The amount of rounds.
    pub global_epochs: NonZeroUsize,
    /// The amount of workers selected each round.
    pub quorum_size: usize,
    /// The batch size of the centralized baseline.
    pub global_batch_size: NonZeroUsize,
    pub partition: PartitionStrategy,
    /// Seeds the partitioning, the selection and the local trainers.
    pub seed: Option<u64>,
    pub spawn: SpawnStrategy,
    pub stall: StallPolicy,
    /// The capacity of each direction of a worker's channel.
    pub channel_capacity: NonZeroUsize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            global_epochs: DEFAULT_GLOBAL_EPOCHS,
            quorum_size: 2,
            global_batch_size: DEFAULT_GLOBAL_BATCH_SIZE,
            partition: PartitionStrategy::default(),
            seed: None,
            spawn: SpawnStrategy::default(),
            stall: StallPolicy::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl RunConfig {
    /// Checks the configuration against the size of the roster it'll run with.
    ///
    /// # Errors
    /// `InvalidArgument` for a zero quorum, `InvalidConfig` for a quorum larger than the roster
    /// or a zero stall timeout.
    pub fn validate(&self, roster: usize) -> Result<()> {
        if self.quorum_size == 0 {
            return Err(CoordinatorError::InvalidArgument(
                "quorum size must be positive".into(),
            ));
        }

        if self.quorum_size > roster {
            return Err(CoordinatorError::InvalidConfig(format!(
                "quorum size {} exceeds the {roster} available workers",
                self.quorum_size
            )));
        }

        if self.stall == (StallPolicy::Timeout { millis: 0 }) {
            return Err(CoordinatorError::InvalidConfig(
                "stall timeout must be positive".into(),
            ));
        }

        Ok(())
    }
}
