use std::num::NonZeroUsize;

use log::info;
use machine_learning::{Dataset, ModelSnapshot, training::ModelTrainer};

use crate::{
    error::{CoordinatorError, Result},
    selector::generate_rng,
};

/// Trains a single model over the whole dataset, the centralized counterpart of a federated run.
///
/// # Arguments
/// * `model` - The initial model.
/// * `dataset` - Every training sample.
/// * `epochs` - The amount of passes over the dataset.
/// * `batch_size` - The amount of samples per minibatch.
/// * `learning_rate` - The step size of gradient descent.
/// * `seed` - Seeds the shuffling of the samples.
///
/// # Returns
/// The trained model and the mean minibatch loss of each epoch.
///
/// # Errors
/// `CoordinatorError::InvalidConfig` for a learning rate that isn't positive and finite, or the
/// training error.
pub fn train_centralized(
    model: &ModelSnapshot,
    dataset: &Dataset,
    epochs: NonZeroUsize,
    batch_size: NonZeroUsize,
    learning_rate: f32,
    seed: Option<u64>,
) -> Result<(ModelSnapshot, Vec<f32>)> {
    if !learning_rate.is_finite() || learning_rate <= 0.0 {
        return Err(CoordinatorError::InvalidConfig(format!(
            "learning rate must be positive and finite, got {learning_rate}"
        )));
    }

    let mut trainer = ModelTrainer::sgd(learning_rate, epochs, batch_size, generate_rng(seed));
    let (model, losses) = trainer.fit(model, dataset.samples())?;

    for (epoch, loss) in losses.iter().enumerate() {
        info!("Train epoch {epoch:3}, Average loss {loss:.3}");
    }

    Ok((model, losses))
}
