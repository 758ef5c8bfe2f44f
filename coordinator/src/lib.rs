pub mod aggregator;
pub mod baseline;
pub mod configs;
mod coordinator;
pub mod error;
mod roster;
pub mod selector;
mod session;

use std::sync::Arc;

use machine_learning::{Dataset, ModelSnapshot};
use worker::TrainerFactory;

pub use coordinator::{Coordinator, RoundSummary, Training};
pub use error::{CoordinatorError, Result};
pub use roster::WorkerHandle;
pub use selector::{RoundSelector, generate_rng};
pub use session::Session;

use crate::configs::Settings;

/// Starts a federated training run in the background and returns its session.
///
/// # Errors
/// Returns a `CoordinatorError` if the settings are invalid or a worker can't be started.
pub fn train(
    model: ModelSnapshot,
    dataset: &Dataset,
    settings: Settings,
    factory: Arc<dyn TrainerFactory>,
) -> Result<Session> {
    log::info!(
        "starting {} worker(s), {} per round",
        dataset.num_classes(),
        settings.run.quorum_size
    );
    Session::new(model, dataset, settings, factory)
}
