use std::sync::Arc;

use comms::Endpoint;
use log::warn;
use machine_learning::{Partition, training::ModelTrainer, training::Trainer};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    Worker,
    config::{DeviceTarget, WorkerConfig},
    error::Result,
    protocol::{Command, Report, WorkerId},
};

/// Builds the local trainer of each worker.
pub trait TrainerFactory: Send + Sync {
    fn build(&self, id: &WorkerId, config: &WorkerConfig) -> Box<dyn Trainer>;
}

impl<F> TrainerFactory for F
where
    F: Fn(&WorkerId, &WorkerConfig) -> Box<dyn Trainer> + Send + Sync,
{
    fn build(&self, id: &WorkerId, config: &WorkerConfig) -> Box<dyn Trainer> {
        self(id, config)
    }
}

/// Builds stochastic gradient descent trainers, seeding each worker differently.
#[derive(Debug, Default, Clone, Copy)]
pub struct SgdTrainers {
    seed: Option<u64>,
}

impl SgdTrainers {
    /// Creates a new `SgdTrainers`.
    ///
    /// # Arguments
    /// * `seed` - The run seed, each worker derives its own from it. Unseeded workers draw
    ///   from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    fn rng_for(&self, id: &WorkerId) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id.index() as u64 + 1)),
            None => StdRng::from_os_rng(),
        }
    }
}

impl TrainerFactory for SgdTrainers {
    fn build(&self, id: &WorkerId, config: &WorkerConfig) -> Box<dyn Trainer> {
        if config.device == DeviceTarget::Accelerator {
            warn!(worker = id.name(); "no accelerator available, training on cpu");
        }

        Box::new(ModelTrainer::sgd(
            config.learning_rate,
            config.local_epochs,
            config.batch_size,
            self.rng_for(id),
        ))
    }
}

/// Binds the run-wide worker settings and builds every worker from them.
#[derive(Clone)]
pub struct WorkerBuilder {
    config: WorkerConfig,
    factory: Arc<dyn TrainerFactory>,
}

impl WorkerBuilder {
    /// Creates a new `WorkerBuilder`.
    ///
    /// # Errors
    /// `WorkerErr::InvalidConfig` if `config` is invalid.
    pub fn new(config: WorkerConfig, factory: Arc<dyn TrainerFactory>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, factory })
    }

    /// Builds an idle `Worker`.
    ///
    /// # Arguments
    /// * `id` - The identity of the new worker.
    /// * `partition` - The samples it owns.
    /// * `endpoint` - Its half of the channel pair to the coordinator.
    pub fn build(
        &self,
        id: WorkerId,
        partition: Partition,
        endpoint: Endpoint<Report, Command>,
    ) -> Worker {
        let trainer = self.factory.build(&id, &self.config);
        Worker::new(id, partition, trainer, endpoint)
    }
}
