use ndarray::{Array, Dimension};

use super::Optimizer;

/// Gradient descent optimization algorithm.
#[derive(Debug, Clone, Copy)]
pub struct GradientDescent {
    learning_rate: f32,
}

impl GradientDescent {
    /// Returns a new `GradientDescent`.
    ///
    /// # Arguments
    /// * `learning_rate` - The *length* of the steps taken on `update_params`.
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for GradientDescent {
    /// Updates the parameters according to the algorithm's learning rule, that is, making a step in
    /// the opposite direction of the gradient, with a length of `learning_rate`.
    ///
    /// # Arguments
    /// * `params` - The parameters that are going to be modified.
    /// * `grad` - The gradient used for taking the step.
    fn update_params<D: Dimension>(&mut self, params: &mut Array<f32, D>, grad: &Array<f32, D>) {
        params.scaled_add(-self.learning_rate, grad);
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn steps_against_the_gradient() {
        let mut params = array![1.0, -1.0];
        GradientDescent::new(0.5).update_params(&mut params, &array![2.0, -4.0]);
        assert_eq!(params, array![0.0, 1.0]);
    }
}
