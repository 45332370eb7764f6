// ============================================================
// Layer 6 — Pipeline Configuration
// ============================================================
// One JSON file per pipeline run, deserialised by serde into a
// typed struct and validated eagerly before any work starts:
//
//   config/preprocessing_config.json  → PreprocessingConfig
//   config/training_config.json       → TrainingConfig
//   config/testing_config.json        → TestingConfig
//   config/inference_config.json      → InferenceConfig
//
// Missing required fields and wrong types are reported by
// serde; range and consistency checks live in `validate()`.
// Unknown fields are ignored.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::data::splitter::DEFAULT_SEED;
use crate::domain::metrics_report::MetricsReport;
use crate::domain::promotion::PromotionPolicy;
use crate::error::{PipelineError, Result};

/// Eager range / consistency checks run right after parsing.
pub trait Validate {
    fn validate(&self) -> std::result::Result<(), String>;
}

/// Read, parse and validate a config file.
pub fn load_config<T>(path: impl AsRef<Path>) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PipelineError::ConfigNotFound(path.to_path_buf()),
        _ => PipelineError::Io(e),
    })?;
    parse_config(&raw, path)
}

/// Parse and validate config JSON; `origin` only labels errors.
pub fn parse_config<T>(raw: &str, origin: &Path) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let invalid = |message: String| PipelineError::Config {
        path: origin.to_path_buf(),
        message,
    };

    let config: T = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;
    config.validate().map_err(invalid)?;

    tracing::debug!(path = %origin.display(), "Loaded config");
    Ok(config)
}

fn require_non_empty(field: &str, value: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("`{field}` must not be empty"));
    }
    Ok(())
}

fn require_open_unit(field: &str, value: f64) -> std::result::Result<(), String> {
    if !(value > 0.0 && value < 1.0) {
        return Err(format!("`{field}` must be in (0, 1), got {value}"));
    }
    Ok(())
}

// ─── Preprocessing ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Local path or http(s) URL of the raw CSV
    pub url_data:             String,
    pub label_mapping_dict:   BTreeMap<String, i64>,
    #[serde(default = "default_split_fraction")]
    pub test_size:            f64,
    #[serde(default = "default_split_fraction")]
    pub validation_size:      f64,
    pub training_data_path:   PathBuf,
    pub validation_data_path: PathBuf,
    pub test_data_path:       PathBuf,
    #[serde(default = "default_seed")]
    pub seed:                 u64,
}

fn default_split_fraction() -> f64 { 0.2 }
fn default_seed() -> u64 { DEFAULT_SEED }

impl Validate for PreprocessingConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        require_non_empty("url_data", &self.url_data)?;
        if self.label_mapping_dict.is_empty() {
            return Err("`label_mapping_dict` must not be empty".into());
        }
        require_open_unit("test_size", self.test_size)?;
        require_open_unit("validation_size", self.validation_size)?;
        Ok(())
    }
}

// ─── Training ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_pretrained")]
    pub tokenizer_pretrained_model: String,
    /// Defaults to the backbone's position limit when null/absent
    #[serde(default)]
    pub max_input_length:           Option<usize>,
    pub batch_size:                 usize,
    #[serde(default = "default_pretrained")]
    pub model_name:                 String,
    #[serde(default = "default_learning_rate")]
    pub learning_rate:              f64,
    #[serde(default)]
    pub dropout_rate:               Option<f64>,
    #[serde(default = "default_true")]
    pub freeze_backbone:            bool,
}

fn default_pretrained() -> String { "t5-base".to_string() }
fn default_learning_rate() -> f64 { 1e-4 }
fn default_true() -> bool { true }

impl Validate for ModelConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        require_non_empty("model.model_name", &self.model_name)?;
        require_non_empty("model.tokenizer_pretrained_model", &self.tokenizer_pretrained_model)?;
        if self.batch_size == 0 {
            return Err("`model.batch_size` must be at least 1".into());
        }
        if self.max_input_length == Some(0) {
            return Err("`model.max_input_length` must be at least 1".into());
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(format!("`model.learning_rate` must be positive, got {}", self.learning_rate));
        }
        if let Some(rate) = self.dropout_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(format!("`model.dropout_rate` must be in [0, 1], got {rate}"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub training_data_path:              String,
    pub validation_data_path:            String,
    pub model:                           ModelConfig,
    pub n_epochs:                        usize,
    pub train_dir:                       PathBuf,
    #[serde(default = "default_true")]
    pub clean_train_dir_before_training: bool,
    pub best_model_path:                 PathBuf,
    #[serde(alias = "losses_curve_path")]
    pub training_curve_path:             PathBuf,
}

impl Validate for TrainingConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        require_non_empty("training_data_path", &self.training_data_path)?;
        require_non_empty("validation_data_path", &self.validation_data_path)?;
        self.model.validate()?;
        if self.n_epochs == 0 {
            return Err("`n_epochs` must be at least 1".into());
        }
        if self.best_model_path.starts_with(&self.train_dir)
            && self
                .best_model_path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(crate::infra::checkpoint::CHECKPOINT_PREFIX))
        {
            return Err("`best_model_path` must not be a checkpoint directory of `train_dir`".into());
        }
        Ok(())
    }
}

// ─── Testing ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestingConfig {
    pub test_data_path:      String,
    pub trained_model_path:  PathBuf,
    #[serde(default = "default_test_batch_size")]
    pub batch_size:          usize,
    pub metrics_output_file: PathBuf,
    #[serde(default = "default_positive_label")]
    pub positive_label:      String,
    #[serde(default)]
    pub push_model_s3:       Option<PromotionPolicy>,
}

fn default_test_batch_size() -> usize { 32 }
fn default_positive_label() -> String { "positive".to_string() }

impl Validate for TestingConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        require_non_empty("test_data_path", &self.test_data_path)?;
        require_non_empty("positive_label", &self.positive_label)?;
        if self.batch_size == 0 {
            return Err("`batch_size` must be at least 1".into());
        }

        let Some(policy) = &self.push_model_s3 else { return Ok(()) };
        if policy.enabled {
            require_non_empty("push_model_s3.bucket_name", &policy.bucket_name)?;
            require_non_empty("push_model_s3.prefix", &policy.prefix)?;
        }

        // metric names are checked here so a typo fails before evaluation
        let probe = MetricsReport { accuracy: 0.0, precision: 0.0, recall: 0.0, f1_score: 0.0 };
        for condition in &policy.conditions {
            if probe.get(&condition.metric).is_none() {
                return Err(format!(
                    "`push_model_s3.conditions` references unknown metric '{}'",
                    condition.metric
                ));
            }
            if !(0.0..=1.0).contains(&condition.threshold) {
                return Err(format!(
                    "threshold for '{}' must be in [0, 1], got {}",
                    condition.metric, condition.threshold
                ));
            }
        }
        Ok(())
    }
}

// ─── Inference ───────────────────────────────────────────────────────────────
pub const SUPPORTED_TASKS: [&str; 2] = ["text-classification", "sentiment-analysis"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub bucket_name:     String,
    pub local_model_dir: PathBuf,
    pub s3_model_prefix: String,
    #[serde(default = "default_task")]
    pub model_task:      String,
}

fn default_task() -> String { SUPPORTED_TASKS[0].to_string() }

impl Validate for InferenceConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        require_non_empty("bucket_name", &self.bucket_name)?;
        require_non_empty("s3_model_prefix", &self.s3_model_prefix)?;
        if !SUPPORTED_TASKS.contains(&self.model_task.as_str()) {
            return Err(format!(
                "`model_task` '{}' is not supported (expected one of {:?})",
                self.model_task, SUPPORTED_TASKS
            ));
        }
        Ok(())
    }
}
