use std::sync::Arc;

use comms::Endpoint;
use log::{debug, info, warn};
use machine_learning::{
    Partition,
    training::{TrainOutcome, Trainer},
};
use tokio::{sync::watch, task};

use crate::{
    error::{Result, WorkerErr},
    protocol::{Command, Report, RoundResult, WorkerId},
    state::{RunningGuard, StatusWatch, WorkerState},
};

/// A simulated edge device, trains the models it's sent over its own partition.
pub struct Worker {
    id: WorkerId,
    partition: Arc<Partition>,
    trainer: Box<dyn Trainer>,
    endpoint: Endpoint<Report, Command>,
    state: watch::Sender<WorkerState>,
}

impl Worker {
    /// Creates a new idle `Worker`.
    ///
    /// # Arguments
    /// * `id` - The worker's identity, attached to every report.
    /// * `partition` - The samples this worker exclusively trains on.
    /// * `trainer` - The local training routine.
    /// * `endpoint` - The worker's half of the channel pair to the coordinator.
    pub fn new(
        id: WorkerId,
        partition: Partition,
        trainer: Box<dyn Trainer>,
        endpoint: Endpoint<Report, Command>,
    ) -> Self {
        let (state, _) = watch::channel(WorkerState::Idle);

        Self {
            id,
            partition: Arc::new(partition),
            trainer,
            endpoint,
            state,
        }
    }

    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    /// Subscribes to this worker's state changes.
    pub fn status(&self) -> StatusWatch {
        self.state.subscribe()
    }

    /// Serves training requests until told to stop.
    ///
    /// Training runs on Tokio's blocking pool. A trainer error is reported back as a
    /// `Report::Failed` and the worker keeps serving.
    ///
    /// # Returns
    /// `Ok(())` after a `Command::Stop` or once the coordinator's half of the channel is gone.
    ///
    /// # Errors
    /// `WorkerErr::TrainerPanicked` if the trainer panics, after reporting the failure.
    pub async fn run(self) -> Result<()> {
        let Self {
            id,
            partition,
            mut trainer,
            mut endpoint,
            state,
        } = self;

        let _running = RunningGuard::new(&state);
        info!(worker = id.name(), samples = partition.len(); "worker started");

        loop {
            let (round, model) = match endpoint.recv().await {
                Ok(Command::Train { round, model }) => (round, model),
                Ok(Command::Stop) => {
                    info!(worker = id.name(); "stop requested");
                    return Ok(());
                }
                Err(_) => {
                    info!(worker = id.name(); "coordinator channel closed");
                    return Ok(());
                }
            };

            debug!(worker = id.name(), round = round; "training");

            let shared = Arc::clone(&partition);
            let joined = task::spawn_blocking(move || {
                let outcome = trainer.train(model, &shared);
                (trainer, outcome)
            })
            .await;

            let report = match joined {
                Ok((back, outcome)) => {
                    trainer = back;
                    report_outcome(&id, round, outcome)
                }
                Err(e) => {
                    let detail = format!("trainer panicked: {e}");
                    warn!(worker = id.name(), round = round; "{detail}");

                    let report = Report::Failed {
                        worker: id.clone(),
                        round,
                        detail: detail.clone(),
                    };
                    let _ = endpoint.send(report).await;

                    return Err(WorkerErr::TrainerPanicked { round, detail });
                }
            };

            if endpoint.send(report).await.is_err() {
                info!(worker = id.name(); "coordinator channel closed");
                return Ok(());
            }
        }
    }
}

/// Turns the outcome of a training call into the report sent back to the coordinator.
fn report_outcome(
    id: &WorkerId,
    round: usize,
    outcome: machine_learning::Result<TrainOutcome>,
) -> Report {
    let failed = |detail: String| {
        warn!(worker = id.name(), round = round; "training failed: {detail}");
        Report::Failed {
            worker: id.clone(),
            round,
            detail,
        }
    };

    match outcome {
        Ok(TrainOutcome { model, loss }) if loss.is_finite() && loss >= 0.0 => {
            debug!(worker = id.name(), round = round, loss = loss; "trained");
            Report::Trained(RoundResult {
                worker: id.clone(),
                round,
                model,
                loss,
            })
        }
        Ok(TrainOutcome { loss, .. }) => failed(format!("invalid loss {loss}")),
        Err(e) => failed(e.to_string()),
    }
}
