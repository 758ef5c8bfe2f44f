use std::{num::NonZeroUsize, ops::Range};

use rand::{Rng, seq::SliceRandom};

use crate::dataset::{Dataset, Sample};

/// One worker's exclusive share of a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    indices: Vec<usize>,
    samples: Vec<Sample>,
}

impl Partition {
    /// Copies the samples at `indices` out of `dataset`.
    fn from_indices(dataset: &Dataset, indices: Vec<usize>) -> Self {
        let samples = indices
            .iter()
            .map(|&i| dataset.samples()[i].clone())
            .collect();

        Self { indices, samples }
    }

    /// A partition holding the entire dataset.
    pub fn whole(dataset: &Dataset) -> Self {
        Self::from_indices(dataset, (0..dataset.len()).collect())
    }

    /// The positions in the source dataset of this partition's samples.
    pub fn indices(&self) -> &[usize] {
        &self.indices
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

/// Splits `total` samples among `parts` and returns the range of `part`.
///
/// Ranges are contiguous, disjoint and cover `[0..total)`, their sizes differ by at most 1.
fn shard_range(total: usize, part: usize, parts: usize) -> Range<usize> {
    let base = total / parts;
    let rem = total % parts;

    let start = part * base + part.min(rem);
    let extra = usize::from(part < rem);

    start..start + base + extra
}

/// Shuffles the samples and deals them into `parts` balanced partitions.
///
/// # Arguments
/// * `dataset` - The dataset to split.
/// * `parts` - The amount of partitions.
/// * `rng` - The random number generator used for shuffling.
pub fn split_iid<R: Rng>(dataset: &Dataset, parts: NonZeroUsize, rng: &mut R) -> Vec<Partition> {
    let mut order: Vec<usize> = (0..dataset.len()).collect();
    order.shuffle(rng);

    (0..parts.get())
        .map(|part| {
            let range = shard_range(order.len(), part, parts.get());
            Partition::from_indices(dataset, order[range].to_vec())
        })
        .collect()
}

/// Splits the samples by label, returning one partition per class in class index order.
pub fn split_non_iid(dataset: &Dataset) -> Vec<Partition> {
    let mut by_class = vec![Vec::new(); dataset.num_classes()];
    for (i, sample) in dataset.samples().iter().enumerate() {
        by_class[sample.label].push(i);
    }

    by_class
        .into_iter()
        .map(|indices| Partition::from_indices(dataset, indices))
        .collect()
}
