use std::{
    collections::{BTreeMap, BTreeSet},
    num::NonZeroUsize,
    sync::Arc,
};

use comms::{WaitSet, duplex};
use futures::future::join_all;
use log::{debug, info, warn};
use machine_learning::{Dataset, ModelSnapshot, arch::LinearClassifier, split_iid, split_non_iid};
use tokio::time::{self, Instant};
use worker::{
    Command, Report, RoundResult, StatusWatch, TrainerFactory, WorkerBuilder, WorkerId,
    WorkerState,
};

use crate::{
    aggregator::federated_averaging,
    configs::{PartitionStrategy, RunConfig, Settings},
    error::{CoordinatorError, Result},
    roster::WorkerHandle,
    selector::{RoundSelector, generate_rng, selection_seed},
};

/// What a single round produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    pub round: usize,
    /// The mean of the losses reported by the round's participants.
    pub mean_loss: f32,
    pub participants: Vec<WorkerId>,
}

/// The outcome of a complete run.
#[derive(Debug, Clone, PartialEq)]
pub struct Training {
    pub model: ModelSnapshot,
    pub history: Vec<RoundSummary>,
}

/// Drives the global training loop and owns every worker.
pub struct Coordinator {
    roster: BTreeMap<WorkerId, WorkerHandle>,
    selector: RoundSelector,
    model: ModelSnapshot,
    config: RunConfig,
    round: usize,
    /// The round that failed, set once a round errors out after dispatching.
    aborted: Option<usize>,
}

impl Coordinator {
    /// Splits the dataset and starts one worker per class.
    ///
    /// # Arguments
    /// * `model` - The initial shared model.
    /// * `dataset` - The complete training set, each worker gets an exclusive share of it.
    /// * `settings` - The run and worker settings.
    /// * `factory` - Builds the local trainer of each worker.
    ///
    /// # Errors
    /// A configuration error if the settings, the model or the partitions can't be used, in
    /// which case no worker is left running.
    pub async fn start(
        model: ModelSnapshot,
        dataset: &Dataset,
        settings: Settings,
        factory: Arc<dyn TrainerFactory>,
    ) -> Result<Self> {
        let Settings { run, worker, .. } = settings;
        let workers = dataset.num_classes();
        run.validate(workers)?;

        let builder = WorkerBuilder::new(worker, factory)
            .map_err(|e| CoordinatorError::InvalidConfig(e.to_string()))?;

        let expected = LinearClassifier::layer_shape(dataset.features(), workers);
        let got = model.shape();
        if got != expected {
            return Err(CoordinatorError::InvalidConfig(format!(
                "model shape {got:?} doesn't fit the dataset, expected {expected:?}"
            )));
        }

        let mut rng = generate_rng(selection_seed(run.seed));
        let partitions = match run.partition {
            PartitionStrategy::Iid => {
                let parts = NonZeroUsize::new(workers).ok_or_else(|| {
                    CoordinatorError::InvalidConfig("the dataset has no classes".into())
                })?;
                split_iid(dataset, parts, &mut rng)
            }
            PartitionStrategy::NonIid => split_non_iid(dataset),
        };

        if let Some(index) = partitions.iter().position(|p| p.is_empty()) {
            return Err(CoordinatorError::InvalidConfig(format!(
                "worker {} would get no samples",
                dataset.classes()[index]
            )));
        }

        let mut coordinator = Self {
            roster: BTreeMap::new(),
            selector: RoundSelector::new(rng),
            model,
            config: run,
            round: 0,
            aborted: None,
        };

        for (index, (name, partition)) in dataset.classes().iter().zip(partitions).enumerate() {
            let id = WorkerId::new(index, name.as_str());
            let (endpoint, worker_endpoint) = duplex(coordinator.config.channel_capacity);
            let worker = builder.build(id.clone(), partition, worker_endpoint);

            match WorkerHandle::launch(worker, endpoint, coordinator.config.spawn) {
                Ok(handle) => {
                    coordinator.roster.insert(id, handle);
                }
                Err(e) => {
                    if let Err(shutdown) = coordinator.shutdown().await {
                        warn!("shutdown after a failed start: {shutdown}");
                    }
                    return Err(e);
                }
            }
        }

        info!(workers = workers; "[server] all workers started");
        Ok(coordinator)
    }

    /// Runs every configured round, then shuts every worker down.
    ///
    /// # Errors
    /// The first error of a round or, if every round went well, of the shutdown. Workers are shut
    /// down either way.
    pub async fn run(mut self) -> Result<Training> {
        let rounds = self.config.global_epochs.get();
        let mut history = Vec::with_capacity(rounds);
        let mut failure = None;

        for _ in 0..rounds {
            match self.run_round().await {
                Ok(summary) => history.push(summary),
                Err(e) => {
                    warn!(round = self.round; "aborting run: {e}");
                    failure = Some(e);
                    break;
                }
            }
        }

        let model = self.model.clone();
        let shutdown = self.shutdown().await;

        if let Some(e) = failure {
            if let Err(shutdown) = shutdown {
                warn!("shutdown after an aborted run: {shutdown}");
            }
            return Err(e);
        }

        shutdown?;
        Ok(Training { model, history })
    }

    /// Runs a single round: selects a quorum, sends it the current model, waits for every
    /// selected worker and adopts the average of their models.
    ///
    /// A round that fails after its model was sent out leaves reports in flight, so every later
    /// call fails with `Aborted` and only `shutdown` is left.
    ///
    /// # Errors
    /// `InvalidArgument` for an unusable quorum, any worker failure, a `RoundTimeout` if the
    /// stall policy gives up on the quorum, or `Aborted` after a failed round.
    pub async fn run_round(&mut self) -> Result<RoundSummary> {
        if let Some(round) = self.aborted {
            return Err(CoordinatorError::Aborted { round });
        }

        let round = self.round;
        let ids: Vec<WorkerId> = self.roster.keys().cloned().collect();
        let selected = self.selector.select(&ids, self.config.quorum_size)?;
        let deadline = self.config.stall.timeout().map(|t| Instant::now() + t);

        let summary = self.play(round, &selected, deadline).await;
        if summary.is_err() {
            self.aborted = Some(round);
        }

        summary
    }

    async fn play(
        &mut self,
        round: usize,
        selected: &[WorkerId],
        deadline: Option<Instant>,
    ) -> Result<RoundSummary> {
        self.dispatch(round, selected).await?;
        let results = self.collect(round, selected, deadline).await?;

        let participants: Vec<WorkerId> = results.keys().cloned().collect();
        let (models, losses): (Vec<_>, Vec<_>) =
            results.into_values().map(|r| (r.model, r.loss)).unzip();

        let mean_loss = losses.iter().sum::<f32>() / losses.len() as f32;
        self.model = federated_averaging(&models)?;
        self.round += 1;

        info!("Round {round:3}, Average loss {mean_loss:.3}");

        Ok(RoundSummary {
            round,
            mean_loss,
            participants,
        })
    }

    /// Sends a copy of the current model to each selected worker.
    async fn dispatch(&self, round: usize, selected: &[WorkerId]) -> Result<()> {
        for id in selected {
            let handle = self.handle(id)?;
            info!(round = round; "[server] sending model to {id}");

            let command = Command::Train {
                round,
                model: self.model.clone(),
            };

            handle.endpoint().send(command).await.map_err(|_| {
                CoordinatorError::ChannelClosed {
                    worker: id.clone(),
                    round,
                }
            })?;
        }

        Ok(())
    }

    /// Waits until every selected worker has reported once, in whatever order they finish.
    async fn collect(
        &mut self,
        round: usize,
        selected: &[WorkerId],
        deadline: Option<Instant>,
    ) -> Result<BTreeMap<WorkerId, RoundResult>> {
        let wanted: BTreeSet<&WorkerId> = selected.iter().collect();
        let waiting: WaitSet<'_, WorkerId, Report> = self
            .roster
            .iter_mut()
            .filter(|(id, _)| wanted.contains(id))
            .map(|(id, handle)| (id.clone(), handle.endpoint_mut().receiver_mut()))
            .collect();

        gather(round, selected, waiting, deadline).await
    }

    /// Stops every worker of the roster, whether it ever took part in a round or not, and waits
    /// for all of them to finish.
    ///
    /// # Errors
    /// The first error a worker ended with. Every worker is waited for regardless.
    pub async fn shutdown(self) -> Result<()> {
        let stops = self.roster.into_values().map(|handle| {
            info!("[server] terminating {}", handle.id());
            handle.stop()
        });

        let mut first = None;
        for result in join_all(stops).await {
            if let Err(e) = result {
                debug!("worker ended badly: {e}");
                first.get_or_insert(e);
            }
        }

        first.map_or(Ok(()), Err)
    }

    fn handle(&self, id: &WorkerId) -> Result<&WorkerHandle> {
        self.roster.get(id).ok_or_else(|| {
            CoordinatorError::InvalidArgument(format!("worker {id} is not in the roster"))
        })
    }

    /// The identities of every worker, in index order.
    pub fn roster(&self) -> Vec<WorkerId> {
        self.roster.keys().cloned().collect()
    }

    /// The current shared model.
    pub fn model(&self) -> &ModelSnapshot {
        &self.model
    }

    /// The index of the next round.
    pub fn round(&self) -> usize {
        self.round
    }

    /// The current state of every worker.
    pub fn statuses(&self) -> BTreeMap<WorkerId, WorkerState> {
        self.roster
            .iter()
            .map(|(id, handle)| (id.clone(), handle.state()))
            .collect()
    }

    /// Subscribes to the state changes of every worker, the subscriptions outlive the
    /// coordinator.
    pub fn status_watches(&self) -> BTreeMap<WorkerId, StatusWatch> {
        self.roster
            .iter()
            .map(|(id, handle)| (id.clone(), handle.status()))
            .collect()
    }
}

/// Drains `waiting`, one report per selected worker.
///
/// # Errors
/// The first failure, closed channel or report for another round, or `RoundTimeout` once
/// `deadline` passes.
async fn gather(
    round: usize,
    selected: &[WorkerId],
    mut waiting: WaitSet<'_, WorkerId, Report>,
    deadline: Option<Instant>,
) -> Result<BTreeMap<WorkerId, RoundResult>> {
    let mut results: BTreeMap<WorkerId, RoundResult> = BTreeMap::new();

    loop {
        let next = match deadline {
            None => waiting.next().await,
            Some(deadline) => match time::timeout_at(deadline, waiting.next()).await {
                Ok(next) => next,
                Err(_) => {
                    let missing = selected
                        .iter()
                        .filter(|id| !results.contains_key(*id))
                        .cloned()
                        .collect();
                    return Err(CoordinatorError::RoundTimeout { round, missing });
                }
            },
        };

        let Some((id, report)) = next else {
            break;
        };

        match report {
            Ok(Report::Trained(result)) if result.round == round => {
                info!(round = round, loss = result.loss; "[server] receiving model from {id}");
                results.insert(id, result);
            }
            Ok(Report::Trained(result)) => {
                return Err(CoordinatorError::UnexpectedReport {
                    worker: id,
                    round,
                    got_round: result.round,
                });
            }
            Ok(Report::Failed { detail, .. }) => {
                return Err(CoordinatorError::WorkerFailed {
                    worker: id,
                    round,
                    detail,
                });
            }
            Err(_) => return Err(CoordinatorError::ChannelClosed { worker: id, round }),
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use std::iter;

    use comms::Endpoint;
    use machine_learning::{
        Partition, Sample,
        training::{TrainOutcome, Trainer},
    };
    use worker::WorkerConfig;

    use super::*;

    struct NoopTrainer;

    impl Trainer for NoopTrainer {
        fn train(
            &mut self,
            model: ModelSnapshot,
            _: &Partition,
        ) -> machine_learning::Result<TrainOutcome> {
            Ok(TrainOutcome { model, loss: 0.0 })
        }
    }

    fn ids() -> Vec<WorkerId> {
        vec![WorkerId::new(0, "airplane"), WorkerId::new(1, "bird")]
    }

    fn trained(id: &WorkerId, round: usize) -> Report {
        Report::Trained(RoundResult {
            worker: id.clone(),
            round,
            model: ModelSnapshot::zeros(&[2]),
            loss: 0.5,
        })
    }

    /// The coordinator's ends and the workers' ends of `n` channel pairs.
    fn channels(n: usize) -> (Vec<Endpoint<Command, Report>>, Vec<Endpoint<Report, Command>>) {
        (0..n).map(|_| duplex(NonZeroUsize::MIN)).unzip()
    }

    #[tokio::test]
    async fn gathers_one_report_per_worker() {
        let ids = ids();
        let (mut ours, theirs) = channels(2);
        theirs[1].send(trained(&ids[1], 4)).await.unwrap();
        theirs[0].send(trained(&ids[0], 4)).await.unwrap();

        let waiting = ids
            .iter()
            .cloned()
            .zip(ours.iter_mut().map(Endpoint::receiver_mut))
            .collect();
        let results = gather(4, &ids, waiting, None).await.unwrap();

        assert_eq!(results.keys().cloned().collect::<Vec<_>>(), ids);
        assert!(results.values().all(|r| r.round == 4));
    }

    #[tokio::test]
    async fn a_closed_channel_mid_round_is_reported() {
        let ids = ids();
        let (mut ours, mut theirs) = channels(2);
        theirs[0].send(trained(&ids[0], 0)).await.unwrap();
        drop(theirs.pop());

        let waiting = ids
            .iter()
            .cloned()
            .zip(ours.iter_mut().map(Endpoint::receiver_mut))
            .collect();

        match gather(0, &ids, waiting, None).await {
            Err(CoordinatorError::ChannelClosed { worker, round }) => {
                assert_eq!(worker.name(), "bird");
                assert_eq!(round, 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn reports_for_another_round_are_rejected() {
        let ids = ids();
        let (mut ours, theirs) = channels(1);
        theirs[0].send(trained(&ids[0], 3)).await.unwrap();

        let waiting = iter::once((ids[0].clone(), ours[0].receiver_mut())).collect();

        match gather(0, &ids[..1], waiting, None).await {
            Err(CoordinatorError::UnexpectedReport {
                worker,
                round,
                got_round,
            }) => {
                assert_eq!(worker, ids[0]);
                assert_eq!(round, 0);
                assert_eq!(got_round, 3);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn workers_gone_before_dispatch_end_the_round() {
        let classes = vec!["airplane".into(), "bird".into(), "cat".into()];
        let samples = (0..6)
            .map(|i| Sample::new(vec![i as f32, 1.0], i % 3))
            .collect();
        let dataset = Dataset::new(classes, 2, samples).unwrap();

        let settings = Settings {
            run: RunConfig {
                quorum_size: 3,
                partition: PartitionStrategy::NonIid,
                seed: Some(3),
                ..Default::default()
            },
            ..Default::default()
        };
        let factory: Arc<dyn TrainerFactory> =
            Arc::new(|_: &WorkerId, _: &WorkerConfig| -> Box<dyn Trainer> { Box::new(NoopTrainer) });
        let model = ModelSnapshot::zeros(&LinearClassifier::layer_shape(2, 3));

        let mut coordinator = Coordinator::start(model, &dataset, settings, factory)
            .await
            .unwrap();

        let bird = coordinator.roster()[1].clone();
        {
            let handle = coordinator.handle(&bird).unwrap();
            handle.endpoint().send(Command::Stop).await.unwrap();

            let mut status = handle.status();
            status
                .wait_for(|state| *state == WorkerState::Stopped)
                .await
                .unwrap();
        }

        match coordinator.run_round().await {
            Err(CoordinatorError::ChannelClosed { worker, round }) => {
                assert_eq!(worker, bird);
                assert_eq!(round, 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(coordinator.round(), 0);

        coordinator.shutdown().await.unwrap();
    }
}
