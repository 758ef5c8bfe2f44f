use std::fmt;

use machine_learning::ModelSnapshot;

/// Uniquely identifies a worker for the lifetime of a run.
///
/// Workers are named after the class they were created for, and ordered by the class index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId {
    index: usize,
    name: String,
}

impl WorkerId {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Coordinator to worker messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Train a copy of the shared model for the given round.
    Train { round: usize, model: ModelSnapshot },
    Stop,
}

/// A worker's contribution to a round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    pub worker: WorkerId,
    pub round: usize,
    pub model: ModelSnapshot,
    /// The mean minibatch loss of the local training, never negative.
    pub loss: f32,
}

/// Worker to coordinator messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Trained(RoundResult),
    /// Local training failed, the worker is still able to serve later rounds.
    Failed {
        worker: WorkerId,
        round: usize,
        detail: String,
    },
}

impl Report {
    pub fn worker(&self) -> &WorkerId {
        match self {
            Report::Trained(result) => &result.worker,
            Report::Failed { worker, .. } => worker,
        }
    }

    pub fn round(&self) -> usize {
        match self {
            Report::Trained(result) => result.round,
            Report::Failed { round, .. } => *round,
        }
    }
}
