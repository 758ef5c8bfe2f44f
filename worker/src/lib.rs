pub mod builder;
pub mod config;
pub mod error;
pub mod protocol;
mod state;
mod worker;

pub use builder::{SgdTrainers, TrainerFactory, WorkerBuilder};
pub use config::{DeviceTarget, WorkerConfig};
pub use error::{Result, WorkerErr};
pub use protocol::{Command, Report, RoundResult, WorkerId};
pub use state::{StatusWatch, WorkerState};
pub use worker::Worker;
