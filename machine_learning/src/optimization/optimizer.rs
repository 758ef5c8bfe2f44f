use ndarray::{Array, Dimension};

pub trait Optimizer {
    fn update_params<D: Dimension>(&mut self, params: &mut Array<f32, D>, grad: &Array<f32, D>);
}
