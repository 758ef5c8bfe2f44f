use std::{fmt, io};

use machine_learning::MlErr;
use worker::{WorkerErr, WorkerId};

/// The coordinator's result type.
pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// All errors that can occur while coordinating a run.
#[derive(Debug)]
pub enum CoordinatorError {
    /// Invalid configuration, caught before any round starts.
    InvalidConfig(String),
    /// An operation was called with arguments it can't work with.
    InvalidArgument(String),
    /// Models of different shapes were handed to the aggregator.
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },
    /// A worker's channel closed while the coordinator still needed it.
    ChannelClosed { worker: WorkerId, round: usize },
    /// A worker reported that its local training failed.
    WorkerFailed {
        worker: WorkerId,
        round: usize,
        detail: String,
    },
    /// A worker answered something other than what it was asked for.
    UnexpectedReport {
        worker: WorkerId,
        round: usize,
        got_round: usize,
    },
    /// The selected workers didn't all report before the stall timeout.
    RoundTimeout { round: usize, missing: Vec<WorkerId> },
    /// An earlier round failed, the coordinator can only be shut down.
    Aborted { round: usize },
    /// A worker ended with an error.
    WorkerError { worker: WorkerId, source: WorkerErr },
    /// A worker's task or thread panicked.
    WorkerPanicked { worker: WorkerId },
    Ml(MlErr),
    Io(io::Error),
}

impl CoordinatorError {
    /// Whether the error comes from the run's settings rather than from something that went
    /// wrong while running.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::InvalidArgument(_))
    }
}

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::ShapeMismatch { expected, got } => {
                write!(f, "model shape mismatch: got {got:?}, expected {expected:?}")
            }
            Self::ChannelClosed { worker, round } => {
                write!(f, "channel to worker {worker} closed during round {round}")
            }
            Self::WorkerFailed {
                worker,
                round,
                detail,
            } => write!(f, "worker {worker} failed round {round}: {detail}"),
            Self::UnexpectedReport {
                worker,
                round,
                got_round,
            } => write!(
                f,
                "worker {worker} reported round {got_round} while round {round} was running"
            ),
            Self::RoundTimeout { round, missing } => {
                let names: Vec<&str> = missing.iter().map(WorkerId::name).collect();
                write!(f, "round {round} timed out waiting for {}", names.join(", "))
            }
            Self::Aborted { round } => {
                write!(f, "round {round} failed, no further rounds can run")
            }
            Self::WorkerError { worker, source } => write!(f, "worker {worker} error: {source}"),
            Self::WorkerPanicked { worker } => write!(f, "worker {worker} panicked"),
            Self::Ml(e) => write!(f, "machine learning error: {e}"),
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for CoordinatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::WorkerError { source, .. } => Some(source),
            Self::Ml(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CoordinatorError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<MlErr> for CoordinatorError {
    fn from(e: MlErr) -> Self {
        Self::Ml(e)
    }
}

impl From<serde_json::Error> for CoordinatorError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidConfig(format!("invalid JSON: {e}"))
    }
}
