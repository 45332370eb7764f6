// ============================================================
// Layer 2 — PreprocessUseCase
// ============================================================
// Orchestrates the data preparation run in order:
//
//   Step 1: Load the raw CSV (path or URL)   (Layer 4 - data)
//   Step 2: Validate + apply label mapping   (Layer 4 - data)
//   Step 3: Seeded train/val/test split      (Layer 4 - data)
//   Step 4: Write the three partitions       (Layer 4 - data)

use anyhow::{Context, Result};

use crate::data::{
    loader::{write_records, CsvSource},
    preprocessor::LabelMapper,
    splitter::{split_three_way, Split},
};
use crate::domain::review::ReviewRecord;
use crate::domain::traits::DatasetSource;
use crate::infra::config::PreprocessingConfig;

pub struct PreprocessUseCase {
    config: PreprocessingConfig,
}

impl PreprocessUseCase {
    pub fn new(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Split<ReviewRecord>> {
        let cfg = &self.config;

        // ── Step 1: Load raw data ─────────────────────────────────────────────
        let source  = CsvSource::new(&cfg.url_data);
        let records = source
            .load_all()
            .with_context(|| format!("Failed to load raw data from '{}'", source.describe()))?;

        // ── Step 2: Label mapping ─────────────────────────────────────────────
        // Fails before splitting if the mapping and the data disagree
        let records = LabelMapper::new(&cfg.label_mapping_dict)
            .apply(records)
            .context("Label mapping does not match the data")?;

        // ── Step 3: Split ─────────────────────────────────────────────────────
        let split = split_three_way(records, cfg.test_size, cfg.validation_size, cfg.seed)?;
        tracing::info!(
            stage = "process_data",
            train = split.train.len(),
            validation = split.validation.len(),
            test = split.test.len(),
            total = split.total(),
            "Split dataset"
        );

        // ── Step 4: Persist partitions ────────────────────────────────────────
        for (path, rows) in [
            (&cfg.training_data_path, &split.train),
            (&cfg.validation_data_path, &split.validation),
            (&cfg.test_data_path, &split.test),
        ] {
            write_records(path, rows)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
        }

        tracing::info!(stage = "process_data", "Preprocessing complete");
        Ok(split)
    }
}
