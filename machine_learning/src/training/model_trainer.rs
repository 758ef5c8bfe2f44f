use std::num::NonZeroUsize;

use log::trace;
use rand::{Rng, seq::SliceRandom};

use super::{TrainOutcome, Trainer};
use crate::{
    arch::{
        LinearClassifier,
        loss::{CrossEntropy, LossFn},
    },
    dataset::{Sample, batch_arrays},
    error::{MlErr, Result},
    optimization::{GradientDescent, Optimizer},
    partition::Partition,
    snapshot::ModelSnapshot,
};

/// A minibatch `Trainer` for `LinearClassifier` models.
pub struct ModelTrainer<O, L, R>
where
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    optimizer: O,
    loss_fn: L,
    epochs: NonZeroUsize,
    batch_size: NonZeroUsize,
    rng: R,
}

impl<O, L, R> ModelTrainer<O, L, R>
where
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    /// Returns a new `ModelTrainer`.
    ///
    /// # Arguments
    /// * `optimizer` - The update rule applied after every minibatch.
    /// * `loss_fn` - The loss function used to measure the difference between a model's output and the expected one.
    /// * `epochs` - The amount of passes over the samples per `train` call.
    /// * `batch_size` - The amount of samples per minibatch, the last one of an epoch may be smaller.
    /// * `rng` - A random number generator, used to shuffle the samples every epoch.
    pub fn new(
        optimizer: O,
        loss_fn: L,
        epochs: NonZeroUsize,
        batch_size: NonZeroUsize,
        rng: R,
    ) -> Self {
        Self {
            optimizer,
            loss_fn,
            epochs,
            batch_size,
            rng,
        }
    }

    /// Trains `model` over `samples` for every configured epoch.
    ///
    /// # Returns
    /// The trained model and the mean minibatch loss of each epoch.
    ///
    /// # Errors
    /// `MlErr::EmptyPartition` if there are no samples, or the error of a sample or model that
    /// don't fit each other.
    pub fn fit(
        &mut self,
        model: &ModelSnapshot,
        samples: &[Sample],
    ) -> Result<(ModelSnapshot, Vec<f32>)> {
        if samples.is_empty() {
            return Err(MlErr::EmptyPartition);
        }

        let mut classifier = LinearClassifier::from_snapshot(model)?;
        let (features, classes) = (classifier.features(), classifier.classes());

        let mut order: Vec<usize> = (0..samples.len()).collect();
        let mut losses = Vec::with_capacity(self.epochs.get());

        for epoch in 0..self.epochs.get() {
            order.shuffle(&mut self.rng);

            let mut total = 0.0;
            let mut batches = 0;
            for batch in order.chunks(self.batch_size.get()) {
                let (x, y) = batch_arrays(batch.iter().map(|&i| &samples[i]), features, classes)?;
                total += classifier.step(x.view(), y.view(), &self.loss_fn, &mut self.optimizer);
                batches += 1;
            }

            let loss = total / batches as f32;
            trace!(epoch = epoch, loss = loss; "finished local epoch");
            losses.push(loss);
        }

        Ok((classifier.into_snapshot(), losses))
    }
}

impl<R: Rng> ModelTrainer<GradientDescent, CrossEntropy, R> {
    /// A plain stochastic gradient descent trainer with cross entropy loss.
    pub fn sgd(learning_rate: f32, epochs: NonZeroUsize, batch_size: NonZeroUsize, rng: R) -> Self {
        Self::new(
            GradientDescent::new(learning_rate),
            CrossEntropy::new(),
            epochs,
            batch_size,
            rng,
        )
    }
}

impl<O, L, R> Trainer for ModelTrainer<O, L, R>
where
    O: Optimizer + Send,
    L: LossFn + Send,
    R: Rng + Send,
{
    /// Every epoch has the same amount of minibatches, so the mean of the epoch losses is the
    /// mean over every minibatch.
    fn train(&mut self, model: ModelSnapshot, partition: &Partition) -> Result<TrainOutcome> {
        let (model, losses) = self.fit(&model, partition.samples())?;
        let loss = losses.iter().sum::<f32>() / losses.len() as f32;

        Ok(TrainOutcome { model, loss })
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{dataset::Dataset, partition::Partition};

    fn blobs() -> Dataset {
        let mut rng = StdRng::seed_from_u64(5);
        let classes = vec!["a".into(), "b".into(), "c".into()];
        Dataset::gaussian_blobs(classes, 30, 4, 0.2, &mut rng).unwrap()
    }

    fn trainer(epochs: usize) -> ModelTrainer<GradientDescent, CrossEntropy, StdRng> {
        ModelTrainer::sgd(
            0.5,
            NonZeroUsize::new(epochs).unwrap(),
            NonZeroUsize::new(8).unwrap(),
            StdRng::seed_from_u64(9),
        )
    }

    #[test]
    fn loss_decreases_over_epochs() {
        let dataset = blobs();
        let model = ModelSnapshot::zeros(&LinearClassifier::layer_shape(4, 3));

        let (_, losses) = trainer(10).fit(&model, dataset.samples()).unwrap();
        assert_eq!(losses.len(), 10);
        assert!(losses[9] < losses[0]);
    }

    #[test]
    fn train_reports_mean_loss_and_keeps_shape() {
        let dataset = blobs();
        let model = ModelSnapshot::zeros(&LinearClassifier::layer_shape(4, 3));

        let outcome = trainer(2).train(model.clone(), &Partition::whole(&dataset)).unwrap();
        assert_eq!(outcome.model.shape(), model.shape());
        assert_ne!(outcome.model, model);
        assert!(outcome.loss.is_finite() && outcome.loss > 0.0);
    }

    #[test]
    fn rejects_empty_partitions() {
        let model = ModelSnapshot::zeros(&LinearClassifier::layer_shape(4, 3));
        let result = trainer(1).train(model, &Partition::default());
        assert_eq!(result, Err(MlErr::EmptyPartition));
    }

    #[test]
    fn rejects_models_that_do_not_fit_the_samples() {
        let dataset = blobs();
        let model = ModelSnapshot::zeros(&LinearClassifier::layer_shape(5, 3));
        let result = trainer(1).train(model, &Partition::whole(&dataset));
        assert!(matches!(result, Err(MlErr::ShapeMismatch { .. })));
    }
}
