// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load train + validation CSVs     (Layer 4 - data)
//   Step 2: Build model + tokenizer          (Layer 5 - ml)
//   Step 3: Tokenise both splits once        (Layer 5 - ml)
//   Step 4: Run the training loop            (Layer 5 - ml)
//   Step 5: Save the best model artifact     (Layer 6 - infra)
//   Step 6: Render the training curve        (Layer 6 - infra)
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use burn::{module::AutodiffModule, tensor::backend::AutodiffBackend};

use crate::data::loader::CsvSource;
use crate::domain::traits::DatasetSource;
use crate::infra::{
    checkpoint::{save_artifact, CheckpointManager},
    config::TrainingConfig,
    metrics::TrainingHistory,
    plot::render_training_curve,
};
use crate::ml::{
    builder,
    trainer::{tokenize_split, train, TrainerSettings},
    TrainBackend,
};

pub struct TrainUseCase {
    config: TrainingConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Train on the configured backend and device.
    pub fn execute(&self) -> Result<TrainingHistory> {
        let device = crate::ml::default_device();
        self.execute_on::<TrainBackend>(&device)
    }

    pub fn execute_on<B: AutodiffBackend>(&self, device: &B::Device) -> Result<TrainingHistory> {
        let cfg = &self.config;

        // ── Step 1: Load data ─────────────────────────────────────────────────
        // Missing files fail here, before any model is built
        let train_rows = load(&cfg.training_data_path)?;
        let val_rows   = load(&cfg.validation_data_path)?;

        // ── Step 2: Model + tokenizer ─────────────────────────────────────────
        let built = builder::build::<B>(&train_rows, &cfg.model, device)
            .with_context(|| format!("Failed to build model '{}'", cfg.model.model_name))?;
        let labels = &built.metadata.labels;

        // ── Step 3: Tokenise ──────────────────────────────────────────────────
        let train_set = tokenize_split(&train_rows, &built.encoder, labels, "train")?;
        let val_set   = tokenize_split(&val_rows, &built.encoder, labels, "validation")?;
        tracing::info!(
            stage = "train",
            train = train_set.sample_count(),
            validation = val_set.sample_count(),
            max_input_length = built.metadata.max_input_length,
            "Tokenised splits"
        );

        // ── Step 4: Training loop ─────────────────────────────────────────────
        let settings = TrainerSettings {
            n_epochs:      cfg.n_epochs,
            batch_size:    cfg.model.batch_size,
            learning_rate: cfg.model.learning_rate,
            clean_before:  cfg.clean_train_dir_before_training,
        };
        let checkpoints = CheckpointManager::new(&cfg.train_dir);
        let (model, history) = train(
            built.model,
            &built.encoder,
            train_set,
            val_set,
            &settings,
            &checkpoints,
            device,
        )
        .context("Training failed")?;

        // ── Step 5: Persist the best model ────────────────────────────────────
        save_artifact(&cfg.best_model_path, &model.valid(), &built.encoder, &built.metadata)
            .with_context(|| format!("Failed to save model to '{}'", cfg.best_model_path.display()))?;

        // ── Step 6: Training curve ────────────────────────────────────────────
        render_training_curve(&history, &cfg.training_curve_path)?;

        if let Some(best) = history.best() {
            tracing::info!(
                stage = "train",
                best_epoch = best.epoch,
                eval_accuracy = best.eval_accuracy,
                path = %cfg.best_model_path.display(),
                "Training complete"
            );
        }
        Ok(history)
    }
}

fn load(location: &str) -> Result<Vec<crate::domain::review::ReviewRecord>> {
    let rows = CsvSource::new(location)
        .load_all()
        .with_context(|| format!("Failed to load '{location}'"))?;
    if rows.is_empty() {
        anyhow::bail!("'{location}' contains no rows");
    }
    Ok(rows)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::infra::checkpoint::{CONFIG_FILE, WEIGHTS_FILE};
    use crate::infra::tokenizer_store::TOKENIZER_FILE;
    use crate::ml::builder::tests::write_tiny_backbone;

    const TRAIN_CSV: &str = "review,sentiment,label\n\
        great film,positive,1\n\
        loved it,positive,1\n\
        awful movie,negative,0\n\
        boring film,negative,0\n\
        hated it,negative,0\n\
        great movie,positive,1\n";

    const VAL_CSV: &str = "review,sentiment,label\n\
        loved the film,positive,1\n\
        boring,negative,0\n";

    #[test]
    fn test_end_to_end_training_writes_artifact_and_curve() {
        let dir  = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("train.csv"), TRAIN_CSV).unwrap();
        std::fs::write(root.join("val.csv"), VAL_CSV).unwrap();

        let config = TrainingConfig {
            training_data_path:              root.join("train.csv").to_string_lossy().into_owned(),
            validation_data_path:            root.join("val.csv").to_string_lossy().into_owned(),
            model:                           write_tiny_backbone(root),
            n_epochs:                        2,
            train_dir:                       root.join("runs"),
            clean_train_dir_before_training: true,
            best_model_path:                 root.join("best"),
            training_curve_path:             root.join("curve.svg"),
        };

        let history = TrainUseCase::new(config.clone())
            .execute_on::<Autodiff<NdArray>>(&Default::default())
            .unwrap();

        assert_eq!(history.len(), 2);
        for file in [WEIGHTS_FILE, TOKENIZER_FILE, CONFIG_FILE] {
            assert!(config.best_model_path.join(file).is_file(), "{file}");
        }
        assert!(config.training_curve_path.is_file());
        assert_eq!(CheckpointManager::new(&config.train_dir).list().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_training_file_fails_before_building() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainingConfig {
            training_data_path:              dir.path().join("absent.csv").to_string_lossy().into_owned(),
            validation_data_path:            dir.path().join("absent.csv").to_string_lossy().into_owned(),
            model:                           write_tiny_backbone(dir.path()),
            n_epochs:                        1,
            train_dir:                       dir.path().join("runs"),
            clean_train_dir_before_training: true,
            best_model_path:                 dir.path().join("best"),
            training_curve_path:             dir.path().join("curve.svg"),
        };

        let err = TrainUseCase::new(config)
            .execute_on::<Autodiff<NdArray>>(&Default::default())
            .unwrap_err();
        assert!(format!("{err:#}").contains("absent.csv"));
    }
}
