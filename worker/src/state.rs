use tokio::sync::watch;

/// The lifecycle of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Created but not started.
    Idle,
    Running,
    /// Terminal.
    Stopped,
}

/// Observes a worker's state from outside of it.
pub type StatusWatch = watch::Receiver<WorkerState>;

/// Publishes `Running` on creation and `Stopped` when dropped, so every exit path of a worker,
/// including an unwinding or aborted one, ends up stopped.
pub(crate) struct RunningGuard<'a> {
    tx: &'a watch::Sender<WorkerState>,
}

impl<'a> RunningGuard<'a> {
    pub(crate) fn new(tx: &'a watch::Sender<WorkerState>) -> Self {
        tx.send_replace(WorkerState::Running);
        Self { tx }
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.tx.send_replace(WorkerState::Stopped);
    }
}
