use ndarray::Array2;
use rand::{Rng, seq::SliceRandom};
use rand_distr::{Distribution, Normal, Uniform};

use crate::error::{MlErr, Result};

/// A single labeled example.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub features: Vec<f32>,
    pub label: usize,
}

impl Sample {
    pub fn new(features: Vec<f32>, label: usize) -> Self {
        Self { features, label }
    }
}

/// A labeled dataset where every sample has the same amount of features and a label that
/// indexes `classes`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    classes: Vec<String>,
    features: usize,
    samples: Vec<Sample>,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `classes` - The class names, a sample's label is an index into this list.
    /// * `features` - The size of every sample.
    /// * `samples` - The labeled samples.
    ///
    /// # Errors
    /// `MlErr::InvalidInput` if there are no classes or no features, `MlErr::InvalidSample` if a
    /// sample doesn't fit.
    pub fn new(classes: Vec<String>, features: usize, samples: Vec<Sample>) -> Result<Self> {
        if classes.is_empty() {
            return Err(MlErr::InvalidInput("a dataset needs at least one class".into()));
        }

        if features == 0 {
            return Err(MlErr::InvalidInput("a dataset needs at least one feature".into()));
        }

        for (index, sample) in samples.iter().enumerate() {
            check_sample(index, sample, features, classes.len())?;
        }

        Ok(Self {
            classes,
            features,
            samples,
        })
    }

    /// Generates a synthetic dataset of one gaussian cluster per class.
    ///
    /// Each class center is drawn uniformly from `[-2, 2)` per feature, and each sample is its
    /// center plus normal noise with a standard deviation of `spread`.
    ///
    /// # Arguments
    /// * `classes` - The class names.
    /// * `per_class` - The amount of samples generated for each class.
    /// * `features` - The size of every sample.
    /// * `spread` - The standard deviation of every cluster.
    /// * `rng` - The random number generator used.
    ///
    /// # Errors
    /// `MlErr::InvalidInput` if `spread` is negative or not finite, or if `Dataset::new` would fail.
    pub fn gaussian_blobs<R: Rng>(
        classes: Vec<String>,
        per_class: usize,
        features: usize,
        spread: f32,
        rng: &mut R,
    ) -> Result<Self> {
        let noise = Normal::new(0.0, spread).map_err(|e| MlErr::InvalidInput(e.to_string()))?;
        let position =
            Uniform::new(-2.0f32, 2.0).map_err(|e| MlErr::InvalidInput(e.to_string()))?;

        let mut samples = Vec::with_capacity(classes.len() * per_class);
        for label in 0..classes.len() {
            let center: Vec<f32> = (0..features).map(|_| position.sample(rng)).collect();

            for _ in 0..per_class {
                let features = center.iter().map(|c| c + noise.sample(rng)).collect();
                samples.push(Sample::new(features, label));
            }
        }

        Self::new(classes, features, samples)
    }

    /// Shuffles the samples and splits a `fraction` of them off.
    ///
    /// # Returns
    /// The remaining samples and the split off ones, both with the same classes.
    ///
    /// # Errors
    /// `MlErr::InvalidInput` if `fraction` isn't within `[0, 1)`.
    pub fn holdout<R: Rng>(mut self, fraction: f32, rng: &mut R) -> Result<(Self, Self)> {
        if !(0.0..1.0).contains(&fraction) {
            return Err(MlErr::InvalidInput(format!(
                "holdout fraction must be within [0, 1), got {fraction}"
            )));
        }

        self.samples.shuffle(rng);
        let held = (self.samples.len() as f32 * fraction).round() as usize;
        let rest = self.samples.split_off(self.samples.len() - held);

        let test = Self {
            classes: self.classes.clone(),
            features: self.features,
            samples: rest,
        };

        Ok((self, test))
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn features(&self) -> usize {
        self.features
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn check_sample(index: usize, sample: &Sample, features: usize, classes: usize) -> Result<()> {
    if sample.features.len() != features {
        return Err(MlErr::InvalidSample {
            index,
            reason: format!(
                "has {} features, expected {features}",
                sample.features.len()
            ),
        });
    }

    if sample.label >= classes {
        return Err(MlErr::InvalidSample {
            index,
            reason: format!("label {} out of {classes} classes", sample.label),
        });
    }

    Ok(())
}

/// Packs a batch of samples into an input matrix and a one-hot encoded label matrix.
///
/// # Errors
/// `MlErr::ShapeMismatch` if a sample doesn't match the given dimensions.
pub(crate) fn batch_arrays<'a, I>(
    samples: I,
    features: usize,
    classes: usize,
) -> Result<(Array2<f32>, Array2<f32>)>
where
    I: IntoIterator<Item = &'a Sample>,
{
    let samples: Vec<&Sample> = samples.into_iter().collect();
    let mut x = Array2::zeros((samples.len(), features));
    let mut y = Array2::zeros((samples.len(), classes));

    for (i, sample) in samples.iter().enumerate() {
        if sample.features.len() != features {
            return Err(MlErr::ShapeMismatch {
                what: "sample features",
                got: sample.features.len(),
                expected: features,
            });
        }

        if sample.label >= classes {
            return Err(MlErr::ShapeMismatch {
                what: "label classes",
                got: sample.label + 1,
                expected: classes,
            });
        }

        for (dst, &src) in x.row_mut(i).iter_mut().zip(&sample.features) {
            *dst = src;
        }
        y[[i, sample.label]] = 1.0;
    }

    Ok((x, y))
}
