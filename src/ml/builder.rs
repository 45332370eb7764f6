// ============================================================
// Layer 5 — Model Builder
// ============================================================
// Turns a training partition and the `model` block of the
// training config into a ready-to-train classifier and its
// tokenizer:
//
//   1. Derive the label space from the training sentiments
//   2. Resolve the backbone (local directory or Hub repo)
//   3. Apply the dropout override, if the backbone has one
//   4. Load the tokenizer by its own identifier and check its
//      ids fit the backbone's embedding table
//   5. Build the classifier with |labels| outputs and load
//      the pretrained backbone weights
//   6. Optionally freeze the backbone
//
// A backbone directory / Hub repo holds:
//   config.json         → BackboneConfig (BERT-style encoder)
//   model.mpk           → Backbone record, or
//   pytorch_model.bin   → Hugging Face checkpoint
// Without weights the backbone starts from random init, which is
// only accepted when it is also trained (freeze_backbone = false).

use std::path::{Path, PathBuf};

use burn::prelude::*;
use hf_hub::{api::sync::Api, Repo, RepoType};

use crate::domain::label_space::LabelSpace;
use crate::domain::review::ReviewRecord;
use crate::error::{PipelineError, Result};
use crate::infra::checkpoint::{
    load_backbone_weights, load_pytorch_backbone, ArtifactConfig, CONFIG_FILE, PYTORCH_WEIGHTS,
    WEIGHTS_FILE,
};
use crate::infra::config::ModelConfig;
use crate::infra::tokenizer_store::TextEncoder;
use crate::ml::model::{BackboneConfig, SentimentClassifier};

/// Everything the trainer needs, plus the metadata saved with it.
pub struct BuiltModel<B: Backend> {
    pub model:    SentimentClassifier<B>,
    pub encoder:  TextEncoder,
    pub metadata: ArtifactConfig,
}

/// Pretrained weights shipped with a backbone.
#[derive(Debug, Clone, PartialEq)]
pub enum BackboneWeights {
    /// Directory holding a Burn `model.mpk` record
    Burn(PathBuf),
    /// A Hugging Face `pytorch_model.bin`
    PyTorch(PathBuf),
}

/// Where a backbone's files were found.
#[derive(Debug, Clone)]
pub struct ResolvedBackbone {
    pub config:  BackboneConfig,
    pub weights: Option<BackboneWeights>,
}

/// Weight files in order of preference.
const WEIGHT_FILES: [&str; 2] = [WEIGHTS_FILE, PYTORCH_WEIGHTS];

/// First weights file the backbone ships, by preference.
fn pick_weights_file<'a>(available: impl IntoIterator<Item = &'a str>) -> Option<&'static str> {
    let available: Vec<&str> = available.into_iter().collect();
    WEIGHT_FILES.into_iter().find(|name| available.contains(name))
}

fn weights_at(name: &str, path: PathBuf) -> Option<BackboneWeights> {
    if name == WEIGHTS_FILE {
        path.parent().map(|dir| BackboneWeights::Burn(dir.to_path_buf()))
    } else {
        Some(BackboneWeights::PyTorch(path))
    }
}

pub fn build<B: Backend>(
    train:  &[ReviewRecord],
    cfg:    &ModelConfig,
    device: &B::Device,
) -> Result<BuiltModel<B>> {
    let labels = LabelSpace::from_labels(train.iter().map(|r| r.sentiment.as_str()))?;
    tracing::info!(labels = ?labels.labels(), "Derived label space");

    let resolved = resolve_backbone(&cfg.model_name)?;
    let backbone = apply_dropout(resolved.config, cfg.dropout_rate);

    let max_input_length = cfg.max_input_length.unwrap_or(backbone.max_position_embeddings);
    if max_input_length > backbone.max_position_embeddings {
        return Err(PipelineError::model(
            &cfg.model_name,
            format!(
                "max_input_length {max_input_length} exceeds the backbone's {} positions",
                backbone.max_position_embeddings
            ),
        ));
    }

    let encoder = TextEncoder::resolve(&cfg.tokenizer_pretrained_model)?
        .with_max_length(max_input_length)?;
    if encoder.vocab_size() > backbone.vocab_size {
        return Err(PipelineError::model(
            &cfg.model_name,
            format!(
                "embedding table has {} rows but tokenizer '{}' has {} ids",
                backbone.vocab_size,
                encoder.identifier(),
                encoder.vocab_size()
            ),
        ));
    }

    let mut model = backbone.init_classifier::<B>(labels.len(), device);
    model = match &resolved.weights {
        Some(BackboneWeights::Burn(dir)) => load_backbone_weights(model, dir, device)
            .map_err(|e| PipelineError::model(&cfg.model_name, e))?,
        Some(BackboneWeights::PyTorch(file)) => load_pytorch_backbone(model, file, device)
            .map_err(|e| PipelineError::model(&cfg.model_name, e))?,
        None if cfg.freeze_backbone => {
            return Err(PipelineError::model(
                &cfg.model_name,
                format!(
                    "no pretrained weights ({WEIGHTS_FILE} or {PYTORCH_WEIGHTS}) to freeze; \
                     set freeze_backbone to false to train the backbone from scratch"
                ),
            ));
        }
        None => {
            tracing::warn!(model = %cfg.model_name, "Backbone ships no weights; training from random init");
            model
        }
    };
    if cfg.freeze_backbone {
        model = model.freeze_backbone();
    }
    log_trainable_parameters(&model, cfg.freeze_backbone);

    let metadata = ArtifactConfig {
        model_name:       cfg.model_name.clone(),
        tokenizer_name:   cfg.tokenizer_pretrained_model.clone(),
        max_input_length,
        backbone,
        labels,
    };

    Ok(BuiltModel { model, encoder, metadata })
}

/// Override the backbone dropout when the config exposes one.
pub fn apply_dropout(mut backbone: BackboneConfig, rate: Option<f64>) -> BackboneConfig {
    if let Some(rate) = rate {
        if backbone.override_dropout(rate) {
            tracing::info!(dropout = rate, "Overrode backbone dropout");
        } else {
            tracing::warn!(dropout = rate, "Backbone exposes no dropout setting; dropout_rate ignored");
        }
    }
    backbone
}

/// Find a backbone by local directory first, then on the Hub.
pub fn resolve_backbone(model_name: &str) -> Result<ResolvedBackbone> {
    let local = Path::new(model_name);
    if local.is_dir() {
        return resolve_local(model_name, local);
    }

    tracing::info!(model = model_name, "Fetching backbone from the Hugging Face Hub");
    let api  = Api::new().map_err(|e| PipelineError::model(model_name, e))?;
    let repo = api.repo(Repo::new(model_name.to_string(), RepoType::Model));

    let info = repo.info().map_err(|e| PipelineError::model(model_name, e))?;
    let config_path = repo.get(CONFIG_FILE).map_err(|e| PipelineError::model(model_name, e))?;
    let config      = read_backbone_config(model_name, &config_path)?;

    let weights = match pick_weights_file(info.siblings.iter().map(|s| s.rfilename.as_str())) {
        Some(name) => {
            let path = repo.get(name).map_err(|e| PipelineError::model(model_name, e))?;
            weights_at(name, path)
        }
        None => None,
    };

    Ok(ResolvedBackbone { config, weights })
}

fn resolve_local(model_name: &str, dir: &Path) -> Result<ResolvedBackbone> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.is_file() {
        return Err(PipelineError::model(model_name, format!("directory has no {CONFIG_FILE}")));
    }
    let config  = read_backbone_config(model_name, &config_path)?;
    let present = WEIGHT_FILES.into_iter().filter(|name| dir.join(name).is_file());
    let weights = pick_weights_file(present).and_then(|name| weights_at(name, dir.join(name)));
    Ok(ResolvedBackbone { config, weights })
}

fn read_backbone_config(model_name: &str, path: &Path) -> Result<BackboneConfig> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| {
        let model_type = serde_json::from_str::<serde_json::Value>(&raw)
            .ok()
            .and_then(|v| v.get("model_type").and_then(|t| t.as_str()).map(str::to_string));
        match model_type {
            Some(kind) => PipelineError::model(
                model_name,
                format!("model_type '{kind}' is not a BERT-style encoder backbone: {e}"),
            ),
            None => PipelineError::model(model_name, e),
        }
    })
}

/// One line per parameter group, trainable or frozen.
fn log_trainable_parameters<B: Backend>(model: &SentimentClassifier<B>, backbone_frozen: bool) {
    let backbone = model.backbone.num_params();
    let head     = model.head.num_params();
    let trainable = head + if backbone_frozen { 0 } else { backbone };

    tracing::info!("Trainable parameters:");
    tracing::info!(group = "backbone", params = backbone, trainable = !backbone_frozen, " - backbone");
    tracing::info!(group = "head", params = head, trainable = true, " - classification head");
    tracing::info!(trainable, total = backbone + head, "Parameter summary");
}
