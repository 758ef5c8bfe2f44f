mod model_trainer;
mod trainer;

pub use model_trainer::ModelTrainer;
pub use trainer::{TrainOutcome, Trainer};
