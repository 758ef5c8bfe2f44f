mod dataset;
mod run;

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use worker::WorkerConfig;

use crate::error::{CoordinatorError, Result};

pub use dataset::DatasetSettings;
pub use run::{PartitionStrategy, RunConfig, SpawnStrategy, StallPolicy};

/// Every setting of a run.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub run: RunConfig,
    pub worker: WorkerConfig,
    pub dataset: DatasetSettings,
}

/// Loads the `Settings` from a JSON file, missing fields take their defaults.
///
/// # Errors
/// `CoordinatorError::InvalidConfig` if the file cannot be read or parsed.
pub fn load(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        CoordinatorError::InvalidConfig(format!("cannot read '{}': {e}", path.display()))
    })?;

    Ok(serde_json::from_str(&content)?)
}
