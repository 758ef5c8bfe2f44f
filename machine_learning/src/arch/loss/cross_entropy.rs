use ndarray::{Array2, ArrayView2, Zip};

use super::LossFn;

/// Smallest probability fed into the logarithm.
const EPSILON: f32 = 1e-7;

/// Categorical cross entropy over softmax outputs.
///
/// `y_pred` holds one probability distribution per row and `y` the one-hot encoded labels.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossEntropy;

impl CrossEntropy {
    /// Returns a new `CrossEntropy`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for CrossEntropy {
    /// The mean over the batch of `-sum(y * ln(y_pred))`.
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        let rows = y_pred.nrows();
        if rows == 0 {
            return 0.0;
        }

        let total = Zip::from(&y_pred)
            .and(&y)
            .fold(0.0, |acc, &p, &t| acc - t * p.max(EPSILON).ln());

        total / rows as f32
    }

    /// The gradient of the mean loss with respect to the logits that produced `y_pred` through a
    /// softmax, which simplifies to `(y_pred - y) / batch`.
    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32> {
        let rows = y_pred.nrows().max(1);
        (&y_pred - &y) / rows as f32
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn perfect_prediction_has_no_loss() {
        let y = array![[0., 1.], [1., 0.]];
        let loss = CrossEntropy.loss(y.view(), y.view());
        assert!(loss.abs() < 1e-6);
    }

    #[test]
    fn uniform_prediction_costs_ln_classes() {
        let y_pred = array![[0.25, 0.25, 0.25, 0.25]];
        let y = array![[0., 0., 1., 0.]];
        let loss = CrossEntropy.loss(y_pred.view(), y.view());
        assert!((loss - 4f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn gradient_is_mean_residual() {
        let y_pred = array![[0.5, 0.5], [0.2, 0.8]];
        let y = array![[1., 0.], [0., 1.]];
        let grad = CrossEntropy.loss_prime(y_pred.view(), y.view());
        assert_eq!(grad, array![[-0.25, 0.25], [0.1, -0.1]]);
    }
}
