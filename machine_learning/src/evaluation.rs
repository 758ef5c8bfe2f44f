use crate::{
    arch::{
        LinearClassifier,
        loss::{CrossEntropy, LossFn},
    },
    dataset::{Sample, batch_arrays},
    error::{MlErr, Result},
    snapshot::ModelSnapshot,
};

/// How a model performs over a set of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// The mean cross entropy per sample.
    pub loss: f32,
    pub correct: usize,
    pub total: usize,
}

impl Evaluation {
    /// The fraction of correctly classified samples.
    pub fn accuracy(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }

        self.correct as f32 / self.total as f32
    }
}

/// Measures the loss and accuracy of `model` over `samples`.
///
/// # Errors
/// `MlErr::InvalidInput` if there are no samples, or the error of a sample that doesn't fit the
/// model.
pub fn evaluate(model: &ModelSnapshot, samples: &[Sample]) -> Result<Evaluation> {
    if samples.is_empty() {
        return Err(MlErr::InvalidInput("no samples to evaluate".into()));
    }

    let classifier = LinearClassifier::from_snapshot(model)?;
    let (x, y) = batch_arrays(samples, classifier.features(), classifier.classes())?;
    let y_pred = classifier.probabilities(x.view());

    let loss = CrossEntropy.loss(y_pred.view(), y.view());
    let correct = y_pred
        .rows()
        .into_iter()
        .zip(samples)
        .filter(|(row, sample)| {
            let predicted = row
                .iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |best, (i, &p)| {
                    if p > best.1 { (i, p) } else { best }
                })
                .0;

            predicted == sample.label
        })
        .count();

    Ok(Evaluation {
        loss,
        correct,
        total: samples.len(),
    })
}
