pub mod arch;
pub mod dataset;
pub mod error;
mod evaluation;
pub mod optimization;
pub mod partition;
mod snapshot;
pub mod training;

pub use dataset::{Dataset, Sample};
pub use error::{MlErr, Result};
pub use evaluation::{Evaluation, evaluate};
pub use partition::{Partition, split_iid, split_non_iid};
pub use snapshot::ModelSnapshot;
