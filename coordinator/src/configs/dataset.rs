use serde::{Deserialize, Serialize};

/// The shape of the synthetic dataset the binary trains on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSettings {
    pub per_class: usize,
    pub features: usize,
    /// The standard deviation of each class cluster.
    pub spread: f32,
    /// The fraction of samples held out for testing.
    pub holdout: f32,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            per_class: 200,
            features: 16,
            spread: 1.0,
            holdout: 0.2,
        }
    }
}
