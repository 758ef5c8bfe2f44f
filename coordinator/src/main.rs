use std::{env, process::ExitCode, sync::Arc};

use coordinator::{Result, baseline, configs, configs::Settings, generate_rng, train};
use log::error;
use machine_learning::{Dataset, ModelSnapshot, arch::LinearClassifier, evaluate};
use worker::SgdTrainers;

const CLASSES: [&str; 10] = [
    "airplane",
    "automobile",
    "bird",
    "cat",
    "deer",
    "dog",
    "frog",
    "horse",
    "ship",
    "truck",
];

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let mut settings_path = None;
    let mut centralized = false;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--centralized" => centralized = true,
            _ => settings_path = Some(arg),
        }
    }

    let settings = match settings_path {
        Some(path) => configs::load(path)?,
        None => Settings::default(),
    };

    let mut rng = generate_rng(settings.run.seed);
    let shape = &settings.dataset;
    let classes = CLASSES.iter().map(|c| c.to_string()).collect();
    let dataset = Dataset::gaussian_blobs(
        classes,
        shape.per_class,
        shape.features,
        shape.spread,
        &mut rng,
    )?;
    let (train_set, test_set) = dataset.holdout(shape.holdout, &mut rng)?;

    let model =
        LinearClassifier::init(train_set.features(), train_set.num_classes(), &mut rng)?
            .into_snapshot();

    let factory = Arc::new(SgdTrainers::new(settings.run.seed));
    let training = train(model.clone(), &train_set, settings.clone(), factory)?.wait()?;
    report("federated", &training.model, &test_set)?;

    if centralized {
        let (trained, _) = baseline::train_centralized(
            &model,
            &train_set,
            settings.run.global_epochs,
            settings.run.global_batch_size,
            settings.worker.learning_rate,
            settings.run.seed,
        )?;
        report("centralized", &trained, &test_set)?;
    }

    Ok(())
}

fn report(label: &str, model: &ModelSnapshot, test_set: &Dataset) -> Result<()> {
    if test_set.is_empty() {
        println!("{label}: no held out samples to test on");
        return Ok(());
    }

    let evaluation = evaluate(model, test_set.samples())?;
    println!(
        "{label}: test set average loss {:.4}, accuracy {}/{} ({:.2}%)",
        evaluation.loss,
        evaluation.correct,
        evaluation.total,
        100.0 * evaluation.accuracy()
    );

    Ok(())
}
