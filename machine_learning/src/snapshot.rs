use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A point-in-time copy of every parameter of a model.
///
/// The parameters are kept as an ordered list of flat layers. Cloning a snapshot
/// deep copies every layer, so a clone handed to a worker never aliases the
/// coordinator's model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    layers: Vec<Array1<f32>>,
}

impl ModelSnapshot {
    /// Creates a new `ModelSnapshot` out of its parameter layers.
    pub fn new(layers: Vec<Array1<f32>>) -> Self {
        Self { layers }
    }

    /// Creates a snapshot filled with zeros.
    ///
    /// # Arguments
    /// * `shape` - The length of each layer.
    pub fn zeros(shape: &[usize]) -> Self {
        Self::new(shape.iter().map(|&len| Array1::zeros(len)).collect())
    }

    /// The length of each of the layers, two snapshots can only be combined
    /// when their shapes are equal.
    pub fn shape(&self) -> Vec<usize> {
        self.layers.iter().map(Array1::len).collect()
    }

    /// The total amount of parameters.
    pub fn num_params(&self) -> usize {
        self.layers.iter().map(Array1::len).sum()
    }

    pub fn layers(&self) -> &[Array1<f32>] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Array1<f32>] {
        &mut self.layers
    }

    /// Iterates every parameter, layer after layer.
    pub fn params(&self) -> impl Iterator<Item = f32> + '_ {
        self.layers.iter().flat_map(|layer| layer.iter().copied())
    }
}
