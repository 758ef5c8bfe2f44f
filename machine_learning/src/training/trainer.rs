use crate::{error::Result, partition::Partition, snapshot::ModelSnapshot};

/// What a local training pass produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOutcome {
    pub model: ModelSnapshot,
    pub loss: f32,
}

/// A local training routine.
///
/// Implementors receive their own copy of the model and must return the trained copy alongside
/// a scalar summary of the loss seen during training.
pub trait Trainer: Send {
    /// Trains `model` over the samples of `partition`.
    ///
    /// # Errors
    /// Whatever made training impossible, implementors must not panic on bad input.
    fn train(&mut self, model: ModelSnapshot, partition: &Partition) -> Result<TrainOutcome>;
}

impl<T: Trainer + ?Sized> Trainer for Box<T> {
    fn train(&mut self, model: ModelSnapshot, partition: &Partition) -> Result<TrainOutcome> {
        (**self).train(model, partition)
    }
}
