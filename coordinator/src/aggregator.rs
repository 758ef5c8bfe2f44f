use machine_learning::ModelSnapshot;

use crate::error::{CoordinatorError, Result};

/// Federated averaging: the unweighted parameter-wise mean of `models`.
///
/// Every model counts the same regardless of how many samples trained it.
///
/// # Errors
/// `CoordinatorError::InvalidArgument` if `models` is empty, `CoordinatorError::ShapeMismatch`
/// if they don't all share the shape of the first one.
pub fn federated_averaging(models: &[ModelSnapshot]) -> Result<ModelSnapshot> {
    let Some((first, rest)) = models.split_first() else {
        return Err(CoordinatorError::InvalidArgument(
            "cannot average an empty set of models".into(),
        ));
    };

    let expected = first.shape();
    let mut sum = first.clone();

    for model in rest {
        let got = model.shape();
        if got != expected {
            return Err(CoordinatorError::ShapeMismatch { expected, got });
        }

        for (acc, layer) in sum.layers_mut().iter_mut().zip(model.layers()) {
            *acc += layer;
        }
    }

    let n = models.len() as f32;
    for layer in sum.layers_mut() {
        *layer /= n;
    }

    Ok(sum)
}
