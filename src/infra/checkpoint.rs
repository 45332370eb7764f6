// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// Two kinds of directories are written:
//
//   1. Per-epoch checkpoints inside `train_dir`
//
//        train_dir/
//          checkpoint-250/
//            model.mpk             ← weights after that step
//            trainer_state.json    ← TrainingHistory so far
//          checkpoint-500/
//          ...
//
//   2. The final model artifact at `best_model_path`
//
//        best_model/
//          model.mpk               ← classifier weights
//          tokenizer.json          ← tokenizer used in training
//          config.json             ← backbone config + label maps
//
// The artifact's config.json carries everything needed to
// rebuild the classifier before its weights are loaded, so a
// downloaded artifact directory is self-contained.
//
// Pretrained backbones come either as a Burn record
// (`model.mpk`) or as a Hugging Face PyTorch checkpoint
// (`pytorch_model.bin`), imported through burn-import with the
// BERT parameter names remapped onto `Backbone`.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{
    fs,
    path::{Path, PathBuf},
};

use burn::{
    prelude::*,
    record::{CompactRecorder, FullPrecisionSettings, Recorder},
};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use serde::{Deserialize, Serialize};

use crate::domain::label_space::LabelSpace;
use crate::error::{PipelineError, Result};
use crate::infra::metrics::TrainingHistory;
use crate::infra::tokenizer_store::{TextEncoder, TOKENIZER_FILE};
use crate::ml::model::{BackboneConfig, BackboneRecord, SentimentClassifier};

pub const CHECKPOINT_PREFIX:  &str = "checkpoint-";
pub const TRAINER_STATE_FILE: &str = "trainer_state.json";
pub const CONFIG_FILE:        &str = "config.json";
/// Weights file stem; CompactRecorder appends `.mpk`
pub const WEIGHTS_STEM:       &str = "model";
pub const WEIGHTS_FILE:       &str = "model.mpk";
pub const PYTORCH_WEIGHTS:    &str = "pytorch_model.bin";

/// HF BERT parameter names → `Backbone` field paths, applied in order.
const BERT_KEY_REMAP: &[(&str, &str)] = &[
    (r"^bert\.",                                                   ""),
    (r"LayerNorm\.gamma$",                                         "LayerNorm.weight"),
    (r"LayerNorm\.beta$",                                          "LayerNorm.bias"),
    (r"^embeddings\.word_embeddings",                              "token_embedding"),
    (r"^embeddings\.position_embeddings",                          "position_embedding"),
    (r"^embeddings\.token_type_embeddings",                        "token_type_embedding"),
    (r"^embeddings\.LayerNorm",                                    "embedding_norm"),
    (r"^encoder\.layer\.([0-9]+)\.attention\.self\.(query|key|value)", "layers.${1}.self_attn.${2}"),
    (r"^encoder\.layer\.([0-9]+)\.attention\.output\.dense",     "layers.${1}.self_attn.output"),
    (r"^encoder\.layer\.([0-9]+)\.attention\.output\.LayerNorm", "layers.${1}.norm1"),
    (r"^encoder\.layer\.([0-9]+)\.intermediate\.dense",          "layers.${1}.ffn_linear1"),
    (r"^encoder\.layer\.([0-9]+)\.output\.dense",                "layers.${1}.ffn_linear2"),
    (r"^encoder\.layer\.([0-9]+)\.output\.LayerNorm",            "layers.${1}.norm2"),
];

// ─── CheckpointManager ────────────────────────────────────────────────────────
/// Manages the `checkpoint-{step}` directories of one training run.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn checkpoint_dir(&self, step: usize) -> PathBuf {
        self.dir.join(format!("{CHECKPOINT_PREFIX}{step}"))
    }

    /// Delete every `checkpoint-*` directory. Other entries stay.
    /// Returns how many checkpoints were removed.
    pub fn clean(&self) -> Result<usize> {
        let checkpoints = self.list()?;
        for (_, path) in &checkpoints {
            fs::remove_dir_all(path)?;
        }
        tracing::info!(dir = %self.dir.display(), removed = checkpoints.len(), "Cleaned checkpoints");
        Ok(checkpoints.len())
    }

    /// Existing checkpoints as (step, path), ordered by step.
    pub fn list(&self) -> Result<Vec<(usize, PathBuf)>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let step = name
                .to_str()
                .and_then(|n| n.strip_prefix(CHECKPOINT_PREFIX))
                .and_then(|s| s.parse::<usize>().ok());
            if let Some(step) = step {
                found.push((step, entry.path()));
            }
        }
        found.sort_by_key(|(step, _)| *step);
        Ok(found)
    }

    /// Write weights and trainer state for `step`.
    pub fn save<B: Backend>(
        &self,
        model:   &SentimentClassifier<B>,
        history: &TrainingHistory,
        step:    usize,
    ) -> Result<PathBuf> {
        let dir = self.checkpoint_dir(step);
        fs::create_dir_all(&dir)?;

        save_weights(model, &dir)?;
        history.save(&dir.join(TRAINER_STATE_FILE))?;

        tracing::debug!(checkpoint = %dir.display(), "Saved checkpoint");
        Ok(dir)
    }

    /// Load the weights saved at `step` into `model`.
    pub fn load<B: Backend>(
        &self,
        model:  SentimentClassifier<B>,
        step:   usize,
        device: &B::Device,
    ) -> Result<SentimentClassifier<B>> {
        let dir = self.checkpoint_dir(step);
        tracing::info!(checkpoint = %dir.display(), "Restoring checkpoint");
        load_weights::<_, B>(model, &dir, device)
    }
}

fn save_weights<B: Backend>(model: &SentimentClassifier<B>, dir: &Path) -> Result<()> {
    let path = dir.join(WEIGHTS_STEM);
    model
        .clone()
        .save_file(path.clone(), &CompactRecorder::new())
        .map_err(|e| PipelineError::model(path.display().to_string(), format!("{e:?}")))
}

fn load_weights<M, B>(model: M, dir: &Path, device: &B::Device) -> Result<M>
where
    M: Module<B>,
    B: Backend,
{
    let path = dir.join(WEIGHTS_STEM);
    model
        .load_file(path.clone(), &CompactRecorder::new(), device)
        .map_err(|e| PipelineError::model(path.display().to_string(), format!("{e:?}")))
}

// ─── Model artifact ───────────────────────────────────────────────────────────
/// Metadata stored as the artifact's config.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub model_name:       String,
    pub tokenizer_name:   String,
    pub max_input_length: usize,
    pub backbone:         BackboneConfig,
    pub labels:           LabelSpace,
}

/// Write weights, tokenizer and config.json into `dir`.
pub fn save_artifact<B: Backend>(
    dir:     &Path,
    model:   &SentimentClassifier<B>,
    encoder: &TextEncoder,
    config:  &ArtifactConfig,
) -> Result<()> {
    fs::create_dir_all(dir)?;
    save_weights(model, dir)?;
    encoder.save(&dir.join(TOKENIZER_FILE))?;
    fs::write(dir.join(CONFIG_FILE), serde_json::to_string_pretty(config)?)?;

    tracing::info!(path = %dir.display(), labels = config.labels.len(), "Saved model artifact");
    Ok(())
}

pub fn load_artifact_config(dir: &Path) -> Result<ArtifactConfig> {
    let path = dir.join(CONFIG_FILE);
    if !path.is_file() {
        return Err(PipelineError::model(
            dir.display().to_string(),
            format!("no {CONFIG_FILE}; is this a trained model directory?"),
        ));
    }
    serde_json::from_str(&fs::read_to_string(&path)?)
        .map_err(|e| PipelineError::model(path.display().to_string(), e))
}

/// Rebuild the classifier from config.json and load its weights.
pub fn load_artifact<B: Backend>(dir: &Path, device: &B::Device) -> Result<(SentimentClassifier<B>, TextEncoder, ArtifactConfig)> {
    let config  = load_artifact_config(dir)?;
    let model   = config.backbone.init_classifier::<B>(config.labels.len(), device);
    let model   = load_weights::<_, B>(model, dir, device)?;
    let encoder = TextEncoder::from_file(&config.tokenizer_name, &dir.join(TOKENIZER_FILE))?
        .with_max_length(config.max_input_length)?;

    tracing::info!(path = %dir.display(), "Loaded model artifact");
    Ok((model, encoder, config))
}

/// Load pretrained backbone weights (`dir/model.mpk`) into a
/// freshly built classifier. The head keeps its initialisation.
pub fn load_backbone_weights<B: Backend>(
    mut model: SentimentClassifier<B>,
    dir:       &Path,
    device:    &B::Device,
) -> Result<SentimentClassifier<B>> {
    model.backbone = load_weights::<_, B>(model.backbone, dir, device)?;
    Ok(model)
}

/// Import a Hugging Face BERT-style `pytorch_model.bin` into the
/// backbone. Linear weights are transposed and LayerNorm
/// weight/bias renamed by the recorder; pooler and pretraining
/// heads in the file are ignored.
pub fn load_pytorch_backbone<B: Backend>(
    mut model: SentimentClassifier<B>,
    file:      &Path,
    device:    &B::Device,
) -> Result<SentimentClassifier<B>> {
    let args = BERT_KEY_REMAP
        .iter()
        .fold(LoadArgs::new(file.to_path_buf()), |args, (pattern, replacement)| {
            args.with_key_remap(pattern, replacement)
        });

    let record: BackboneRecord<B> = PyTorchFileRecorder::<FullPrecisionSettings>::default()
        .load(args, device)
        .map_err(|e| PipelineError::model(file.display().to_string(), format!("{e:?}")))?;
    model.backbone = model.backbone.load_record(record);

    tracing::info!(file = %file.display(), "Imported PyTorch backbone weights");
    Ok(model)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::infra::tokenizer_store::tests::word_level;
    use crate::ml::model::tests::tiny_config;

    #[test]
    fn test_clean_removes_only_checkpoint_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("checkpoint-1")).unwrap();
        fs::create_dir(dir.path().join("checkpoint-50")).unwrap();
        fs::write(dir.path().join("checkpoint-1").join("x"), "w").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        fs::create_dir(dir.path().join("logs")).unwrap();
        // a file named like a checkpoint is not a checkpoint
        fs::write(dir.path().join("checkpoint-7"), "keep").unwrap();

        let removed = CheckpointManager::new(dir.path()).clean().unwrap();

        assert_eq!(removed, 2);
        assert!(!dir.path().join("checkpoint-1").exists());
        assert!(!dir.path().join("checkpoint-50").exists());
        assert!(dir.path().join("notes.txt").is_file());
        assert!(dir.path().join("logs").is_dir());
        assert!(dir.path().join("checkpoint-7").is_file());
    }

    #[test]
    fn test_clean_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path().join("absent"));
        assert_eq!(manager.clean().unwrap(), 0);
    }

    #[test]
    fn test_list_is_ordered_by_step() {
        let dir = tempfile::tempdir().unwrap();
        for step in [120, 8, 40] {
            fs::create_dir(dir.path().join(format!("checkpoint-{step}"))).unwrap();
        }
        let steps: Vec<usize> = CheckpointManager::new(dir.path())
            .list()
            .unwrap()
            .into_iter()
            .map(|(s, _)| s)
            .collect();
        assert_eq!(steps, vec![8, 40, 120]);
    }

    #[test]
    fn test_checkpoint_save_writes_weights_and_state() {
        let dir     = tempfile::tempdir().unwrap();
        let device  = Default::default();
        let model   = tiny_config().init_classifier::<NdArray>(2, &device);
        let manager = CheckpointManager::new(dir.path());

        let saved = manager.save(&model, &TrainingHistory::default(), 12).unwrap();

        assert_eq!(saved, dir.path().join("checkpoint-12"));
        assert!(saved.join(WEIGHTS_FILE).is_file());
        assert!(saved.join(TRAINER_STATE_FILE).is_file());
        assert!(manager.load(model, 12, &device).is_ok());
    }

    #[test]
    fn test_artifact_round_trip_keeps_labels() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let labels = LabelSpace::from_labels(["negative", "positive"]).unwrap();
        let model  = tiny_config().init_classifier::<NdArray>(labels.len(), &device);
        let config = ArtifactConfig {
            model_name:       "tiny".into(),
            tokenizer_name:   "word-level".into(),
            max_input_length: 8,
            backbone:         tiny_config(),
            labels:           labels.clone(),
        };

        save_artifact(dir.path(), &model, &word_level(), &config).unwrap();
        let (loaded, _, loaded_config) = load_artifact::<NdArray>(dir.path(), &device).unwrap();

        assert_eq!(loaded_config, config);
        assert_eq!(loaded.num_labels, 2);
        assert_eq!(loaded_config.labels.id_of("positive"), Some(1));
    }

    #[test]
    fn test_weights_file_matches_recorder_output() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let model  = tiny_config().init_classifier::<NdArray>(2, &device);

        save_weights(&model, dir.path()).unwrap();
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![WEIGHTS_FILE.to_string()]);

        // a backbone-only record under the same name loads into the classifier
        let backbone = tiny_config().init_backbone::<NdArray>(&device);
        backbone.save_file(dir.path().join(WEIGHTS_STEM), &CompactRecorder::new()).unwrap();
        assert!(load_backbone_weights(model, dir.path(), &device).is_ok());
    }

    #[test]
    fn test_unreadable_pytorch_checkpoint_names_the_file() {
        let dir    = tempfile::tempdir().unwrap();
        let file   = dir.path().join(PYTORCH_WEIGHTS);
        fs::write(&file, b"not a torch archive").unwrap();
        let device = Default::default();
        let model  = tiny_config().init_classifier::<NdArray>(2, &device);

        let err = load_pytorch_backbone(model, &file, &device).err().unwrap();
        assert!(matches!(err, PipelineError::Model { .. }));
        assert!(err.to_string().contains(PYTORCH_WEIGHTS));
    }

    #[test]
    fn test_missing_artifact_names_the_path() {
        let err = load_artifact_config(Path::new("no/such/model")).unwrap_err();
        assert!(err.to_string().contains("no/such/model"));
    }
}
