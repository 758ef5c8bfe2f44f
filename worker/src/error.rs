use std::{error::Error, fmt, io};

/// The worker module's result type.
pub type Result<T> = std::result::Result<T, WorkerErr>;

/// Worker runtime failures.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerErr {
    /// The worker configuration can't be used to train.
    InvalidConfig(String),
    /// The trainer panicked while training for `round`, the worker can't continue without it.
    TrainerPanicked { round: usize, detail: String },
}

impl fmt::Display for WorkerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerErr::InvalidConfig(msg) => write!(f, "invalid worker config: {msg}"),
            WorkerErr::TrainerPanicked { round, detail } => {
                write!(f, "trainer panicked at round {round}: {detail}")
            }
        }
    }
}

impl Error for WorkerErr {}

/// Boundary conversion for binaries / I/O APIs.
impl From<WorkerErr> for io::Error {
    fn from(value: WorkerErr) -> Self {
        io::Error::other(value)
    }
}
