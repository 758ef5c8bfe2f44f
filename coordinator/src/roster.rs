use std::thread;

use comms::Endpoint;
use log::debug;
use tokio::{runtime, task::JoinHandle};
use worker::{Command, Report, StatusWatch, Worker, WorkerId, WorkerState};

use crate::{
    configs::SpawnStrategy,
    error::{CoordinatorError, Result},
};

/// Whatever is driving a worker.
enum Runner {
    Task(JoinHandle<worker::Result<()>>),
    Thread(thread::JoinHandle<worker::Result<()>>),
}

/// The coordinator's side of a running worker.
pub struct WorkerHandle {
    id: WorkerId,
    endpoint: Endpoint<Command, Report>,
    status: StatusWatch,
    runner: Runner,
}

impl WorkerHandle {
    /// Starts `worker` with the given strategy.
    ///
    /// # Arguments
    /// * `worker` - The idle worker to start.
    /// * `endpoint` - The coordinator's half of the worker's channel pair.
    /// * `strategy` - How the worker is scheduled.
    ///
    /// # Errors
    /// `CoordinatorError::Io` if the worker's thread or runtime can't be created.
    pub(crate) fn launch(
        worker: Worker,
        endpoint: Endpoint<Command, Report>,
        strategy: SpawnStrategy,
    ) -> Result<Self> {
        let id = worker.id().clone();
        let status = worker.status();

        let runner = match strategy {
            SpawnStrategy::Task => Runner::Task(tokio::spawn(worker.run())),
            SpawnStrategy::Thread => {
                let runtime = runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()?;

                let handle = thread::Builder::new()
                    .name(format!("worker-{}", id.name()))
                    .spawn(move || runtime.block_on(worker.run()))?;

                Runner::Thread(handle)
            }
        };

        debug!(worker = id.name(); "worker launched as {strategy:?}");

        Ok(Self {
            id,
            endpoint,
            status,
            runner,
        })
    }

    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    pub fn state(&self) -> WorkerState {
        *self.status.borrow()
    }

    /// Subscribes to the worker's state changes.
    pub fn status(&self) -> StatusWatch {
        self.status.clone()
    }

    pub(crate) fn endpoint(&self) -> &Endpoint<Command, Report> {
        &self.endpoint
    }

    pub(crate) fn endpoint_mut(&mut self) -> &mut Endpoint<Command, Report> {
        &mut self.endpoint
    }

    /// Tells the worker to stop, closes its channel and waits for it to finish.
    ///
    /// Stopping a worker that already exited is fine.
    ///
    /// # Errors
    /// The error the worker ended with, or `CoordinatorError::WorkerPanicked`.
    pub(crate) async fn stop(self) -> Result<()> {
        let Self {
            id,
            endpoint,
            runner,
            ..
        } = self;

        // The worker may be gone already, then there's no one to tell.
        let _ = endpoint.send(Command::Stop).await;
        drop(endpoint);

        let joined = match runner {
            Runner::Task(handle) => handle.await.map_err(|_| ()),
            Runner::Thread(handle) => tokio::task::spawn_blocking(move || handle.join())
                .await
                .map_err(|_| ())
                .and_then(|joined| joined.map_err(|_| ())),
        };

        match joined {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(CoordinatorError::WorkerError { worker: id, source }),
            Err(()) => Err(CoordinatorError::WorkerPanicked { worker: id }),
        }
    }
}
