// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse the pipeline mode.
// All business logic is delegated to Layer 2 (application).
//
// Four modes are supported, one handler each:
//   1. `process_data`  split the raw dataset (default)
//   2. `train`         fine-tune and save the best model
//   3. `test`          evaluate, gate and publish
//   4. `inference`     interactive predictions
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::de::DeserializeOwned;

use crate::application::{
    inference_use_case::InferenceUseCase, preprocess_use_case::PreprocessUseCase,
    test_use_case::TestUseCase, train_use_case::TrainUseCase,
};
use crate::infra::config::{
    load_config, InferenceConfig, PreprocessingConfig, TestingConfig, TrainingConfig, Validate,
};
use commands::{Mode, DEFAULT_CONFIG_DIR};

#[derive(Parser, Debug)]
#[command(
    name = "sentiment-pipeline",
    version,
    about = "Prepare data, fine-tune, evaluate and serve a review sentiment classifier."
)]
pub struct Cli {
    /// Pipeline stage to run
    #[arg(value_enum, default_value_t = Mode::ProcessData)]
    pub mode: Mode,

    /// Directory holding the per-mode JSON configs
    #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
    pub config_dir: PathBuf,
}

impl Cli {
    /// Route to the handler for the selected mode.
    pub fn run(self) -> Result<()> {
        let path = self.mode.config_path(&self.config_dir);
        tracing::info!(stage = ?self.mode, config = %path.display(), "Starting");

        match self.mode {
            Mode::ProcessData => run_process_data(&path),
            Mode::Train       => run_train(&path),
            Mode::Test        => run_test(&path),
            Mode::Inference   => run_inference(&path),
        }
    }
}

fn read<T: DeserializeOwned + Validate>(path: &Path) -> Result<T> {
    load_config(path).with_context(|| format!("Invalid configuration '{}'", path.display()))
}

fn run_process_data(path: &Path) -> Result<()> {
    let config: PreprocessingConfig = read(path)?;
    let split = PreprocessUseCase::new(config).execute()?;
    println!(
        "Data processed: {} train / {} validation / {} test rows.",
        split.train.len(),
        split.validation.len(),
        split.test.len()
    );
    Ok(())
}

fn run_train(path: &Path) -> Result<()> {
    let config: TrainingConfig = read(path)?;
    let best_model_path = config.best_model_path.clone();
    TrainUseCase::new(config).execute()?;
    println!("Training complete. Best model saved to {}.", best_model_path.display());
    Ok(())
}

fn run_test(path: &Path) -> Result<()> {
    let config: TestingConfig = read(path)?;
    let outcome = TestUseCase::new(config).execute()?;
    for (name, value) in outcome.report.entries() {
        println!("{name:>10}: {value:.3}");
    }
    if outcome.decision.is_approved() {
        println!("Model promoted.");
    } else {
        println!("Model not promoted: {:?}", outcome.decision);
    }
    Ok(())
}

fn run_inference(path: &Path) -> Result<()> {
    let config: InferenceConfig = read(path)?;
    InferenceUseCase::new(config).execute()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_process_data() {
        let cli = Cli::try_parse_from(["sentiment-pipeline"]).unwrap();
        assert_eq!(cli.mode, Mode::ProcessData);
        assert_eq!(cli.config_dir, PathBuf::from("config"));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["sentiment-pipeline", "deploy"]).is_err());
    }

    #[test]
    fn test_missing_config_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "sentiment-pipeline",
            "train",
            "--config-dir",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();

        let err = cli.run().unwrap_err();
        assert!(format!("{err:#}").contains("training_config.json"));
    }
}
