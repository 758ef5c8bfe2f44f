use std::sync::Arc;

use machine_learning::{Dataset, ModelSnapshot};
use tokio::runtime::Runtime;
use worker::{TrainerFactory, WorkerId, WorkerState};

use crate::{
    configs::Settings,
    coordinator::{Coordinator, Training},
    error::Result,
};

/// Represents a federated training that's running in the background.
/// It lets its owner drive the entire run from synchronous code.
pub struct Session {
    runtime: Runtime,
    coordinator: Coordinator,
}

impl Session {
    /// Creates a new `Session`, starting every worker.
    ///
    /// # Arguments
    /// * `model` - The initial shared model.
    /// * `dataset` - The training set to split among the workers.
    /// * `settings` - Every setting of the run.
    /// * `factory` - Builds the local trainer of each worker.
    ///
    /// # Errors
    /// `CoordinatorError::Io` if the runtime can't be created, or the error of
    /// `Coordinator::start`.
    pub fn new(
        model: ModelSnapshot,
        dataset: &Dataset,
        settings: Settings,
        factory: Arc<dyn TrainerFactory>,
    ) -> Result<Self> {
        let runtime = Runtime::new()?;
        let coordinator =
            runtime.block_on(Coordinator::start(model, dataset, settings, factory))?;

        Ok(Self {
            runtime,
            coordinator,
        })
    }

    pub fn roster(&self) -> Vec<WorkerId> {
        self.coordinator.roster()
    }

    pub fn statuses(&self) -> Vec<(WorkerId, WorkerState)> {
        self.coordinator.statuses().into_iter().collect()
    }

    /// Runs every round and waits until all the workers are done.
    ///
    /// # Returns
    /// The final model along with the summary of every round.
    pub fn wait(self) -> Result<Training> {
        let Self {
            runtime,
            coordinator,
        } = self;

        runtime.block_on(coordinator.run())
    }
}
