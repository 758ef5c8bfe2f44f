use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::loss::LossFn;
use crate::{
    error::{MlErr, Result},
    optimization::Optimizer,
    snapshot::ModelSnapshot,
};

/// A softmax (multinomial logistic) regression model.
///
/// As a snapshot its parameters are two layers: the `classes x features` weights in row major
/// order followed by the `classes` biases.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearClassifier {
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl LinearClassifier {
    /// The snapshot shape of a classifier with the given dimensions.
    pub fn layer_shape(features: usize, classes: usize) -> Vec<usize> {
        vec![classes * features, classes]
    }

    /// Creates a new classifier with normally distributed weights scaled by the fan in, and
    /// zeroed biases.
    ///
    /// # Arguments
    /// * `features` - The size of each input.
    /// * `classes` - The amount of classes to tell apart.
    /// * `rng` - The random number generator used for the initialization.
    ///
    /// # Errors
    /// `MlErr::InvalidInput` if either dimension is zero.
    pub fn init<R: Rng>(features: usize, classes: usize, rng: &mut R) -> Result<Self> {
        if features == 0 || classes == 0 {
            return Err(MlErr::InvalidInput(format!(
                "a classifier needs at least one feature and one class, got {features} features and {classes} classes"
            )));
        }

        let std_dev = (1.0 / features as f32).sqrt();
        let normal =
            Normal::new(0.0, std_dev).map_err(|e| MlErr::InvalidInput(e.to_string()))?;

        let weights = Array2::from_shape_simple_fn((classes, features), || normal.sample(rng));
        let bias = Array1::zeros(classes);

        Ok(Self { weights, bias })
    }

    /// Rebuilds a classifier out of a snapshot, the dimensions are inferred from the layers.
    ///
    /// # Errors
    /// `MlErr::ShapeMismatch` if the snapshot doesn't hold exactly two layers, `MlErr::InvalidInput`
    /// if their lengths aren't compatible.
    pub fn from_snapshot(snapshot: &ModelSnapshot) -> Result<Self> {
        let [weights, bias] = snapshot.layers() else {
            return Err(MlErr::ShapeMismatch {
                what: "layer count",
                got: snapshot.layers().len(),
                expected: 2,
            });
        };

        let classes = bias.len();
        if classes == 0 || weights.is_empty() || weights.len() % classes != 0 {
            return Err(MlErr::InvalidInput(format!(
                "a weights layer of {} parameters doesn't fit {classes} classes",
                weights.len()
            )));
        }

        let features = weights.len() / classes;
        let weights = Array2::from_shape_vec((classes, features), weights.to_vec())
            .map_err(|e| MlErr::InvalidInput(e.to_string()))?;

        Ok(Self {
            weights,
            bias: bias.clone(),
        })
    }

    /// Flattens the classifier back into a snapshot.
    pub fn into_snapshot(self) -> ModelSnapshot {
        let weights = Array1::from_iter(self.weights);
        ModelSnapshot::new(vec![weights, self.bias])
    }

    pub fn features(&self) -> usize {
        self.weights.ncols()
    }

    pub fn classes(&self) -> usize {
        self.weights.nrows()
    }

    /// Computes the class probabilities of each row of `x`.
    pub fn probabilities(&self, x: ArrayView2<f32>) -> Array2<f32> {
        let mut out = x.dot(&self.weights.t()) + &self.bias;

        for mut row in out.rows_mut() {
            let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
            row.mapv_inplace(|v| (v - max).exp());
            let total = row.sum();
            row /= total;
        }

        out
    }

    /// Makes one optimization step over a minibatch.
    ///
    /// # Arguments
    /// * `x` - The `batch x features` inputs.
    /// * `y` - The `batch x classes` one-hot encoded labels.
    /// * `loss_fn` - The loss to minimize, its derivative must be taken with respect to the logits.
    /// * `optimizer` - The update rule.
    ///
    /// # Returns
    /// The minibatch loss before the step.
    pub fn step<L: LossFn, O: Optimizer>(
        &mut self,
        x: ArrayView2<f32>,
        y: ArrayView2<f32>,
        loss_fn: &L,
        optimizer: &mut O,
    ) -> f32 {
        let y_pred = self.probabilities(x);
        let loss = loss_fn.loss(y_pred.view(), y);

        let delta = loss_fn.loss_prime(y_pred.view(), y);
        let grad_w = delta.t().dot(&x);
        let grad_b = delta.sum_axis(Axis(0));

        optimizer.update_params(&mut self.weights, &grad_w);
        optimizer.update_params(&mut self.bias, &grad_b);

        loss
    }
}
