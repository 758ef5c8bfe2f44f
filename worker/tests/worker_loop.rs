use std::num::NonZeroUsize;

use comms::duplex;
use machine_learning::{
    Dataset, ModelSnapshot, Partition, Sample,
    training::{TrainOutcome, Trainer},
};
use ndarray::array;
use worker::{Command, Report, Worker, WorkerId, WorkerState};

/// Adds the amount of samples to every parameter and reports it as the loss.
struct CountingTrainer;

impl Trainer for CountingTrainer {
    fn train(
        &mut self,
        mut model: ModelSnapshot,
        partition: &Partition,
    ) -> machine_learning::Result<TrainOutcome> {
        let n = partition.len() as f32;
        for layer in model.layers_mut() {
            layer.mapv_inplace(|p| p + n);
        }

        Ok(TrainOutcome { model, loss: n })
    }
}

fn partition(samples: usize) -> Partition {
    let samples = (0..samples).map(|i| Sample::new(vec![i as f32], 0)).collect();
    let dataset = Dataset::new(vec!["only".into()], 1, samples).unwrap();
    Partition::whole(&dataset)
}

fn capacity() -> NonZeroUsize {
    NonZeroUsize::new(4).unwrap()
}

#[tokio::test]
async fn worker_trains_and_reports_each_round() {
    let (mut coordinator, endpoint) = duplex(capacity());
    let id = WorkerId::new(3, "cat");
    let worker = Worker::new(id.clone(), partition(2), Box::new(CountingTrainer), endpoint);
    let task = tokio::spawn(worker.run());

    for round in 0..3 {
        let model = ModelSnapshot::new(vec![array![round as f32, 0.0]]);
        coordinator
            .send(Command::Train { round, model })
            .await
            .unwrap();

        match coordinator.recv().await.unwrap() {
            Report::Trained(result) => {
                assert_eq!(result.worker, id);
                assert_eq!(result.round, round);
                assert_eq!(result.loss, 2.0);
                assert_eq!(result.model.layers()[0], array![round as f32 + 2.0, 2.0]);
            }
            other => panic!("unexpected report: {other:?}"),
        }
    }

    coordinator.send(Command::Stop).await.unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn worker_moves_from_idle_to_stopped() {
    let (coordinator, endpoint) = duplex::<Command, Report>(capacity());
    let worker = Worker::new(
        WorkerId::new(0, "dog"),
        partition(1),
        Box::new(CountingTrainer),
        endpoint,
    );

    let mut status = worker.status();
    assert_eq!(*status.borrow(), WorkerState::Idle);

    let task = tokio::spawn(worker.run());
    status
        .wait_for(|state| *state == WorkerState::Running)
        .await
        .unwrap();

    coordinator.send(Command::Stop).await.unwrap();
    task.await.unwrap().unwrap();
    assert_eq!(*status.borrow(), WorkerState::Stopped);
}

#[tokio::test]
async fn worker_stops_when_coordinator_goes_away() {
    let (coordinator, endpoint) = duplex::<Command, Report>(capacity());
    let worker = Worker::new(
        WorkerId::new(0, "dog"),
        partition(1),
        Box::new(CountingTrainer),
        endpoint,
    );
    let status = worker.status();

    let task = tokio::spawn(worker.run());
    drop(coordinator);

    task.await.unwrap().unwrap();
    assert_eq!(*status.borrow(), WorkerState::Stopped);
}

#[tokio::test]
async fn worker_never_reports_unprompted() {
    let (mut coordinator, endpoint) = duplex::<Command, Report>(capacity());
    let worker = Worker::new(
        WorkerId::new(0, "dog"),
        partition(1),
        Box::new(CountingTrainer),
        endpoint,
    );
    let task = tokio::spawn(worker.run());

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(coordinator.try_recv(), Ok(None));

    coordinator.send(Command::Stop).await.unwrap();
    task.await.unwrap().unwrap();
}
