// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Loads a trained model artifact directory and classifies text:
//
//   texts ─▶ tokenise (truncate) ─▶ ReviewBatcher (pad + mask)
//         ─▶ classifier logits ─▶ softmax ─▶ (label, score)
//
// The label names come from the artifact's own config.json, so
// no training-time state is needed.

use std::path::Path;

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::activation::softmax,
};

use crate::data::{batcher::ReviewBatcher, dataset::ReviewSample};
use crate::domain::label_space::LabelSpace;
use crate::domain::traits::{Prediction, SentimentPredictor};
use crate::error::{PipelineError, Result};
use crate::infra::checkpoint::load_artifact;
use crate::infra::tokenizer_store::TextEncoder;
use crate::ml::model::SentimentClassifier;

pub struct SentimentInferencer<B: Backend> {
    model:      SentimentClassifier<B>,
    encoder:    TextEncoder,
    labels:     LabelSpace,
    batch_size: usize,
    device:     B::Device,
}

impl<B: Backend> SentimentInferencer<B> {
    pub fn from_artifact(dir: &Path, batch_size: usize, device: B::Device) -> Result<Self> {
        let (model, encoder, config) = load_artifact::<B>(dir, &device)?;
        tracing::info!(path = %dir.display(), labels = ?config.labels.labels(), "Model ready for inference");
        Ok(Self::new(model, encoder, config.labels, batch_size, device))
    }

    pub fn new(
        model:      SentimentClassifier<B>,
        encoder:    TextEncoder,
        labels:     LabelSpace,
        batch_size: usize,
        device:     B::Device,
    ) -> Self {
        Self { model, encoder, labels, batch_size: batch_size.max(1), device }
    }

    fn predict_chunk(&self, texts: &[String]) -> Result<Vec<Prediction>> {
        let samples: Vec<ReviewSample> = self
            .encoder
            .encode_batch(texts)?
            .into_iter()
            .map(|input_ids| ReviewSample { input_ids, label: 0 })
            .collect();

        let batch  = ReviewBatcher::<B>::new(self.device.clone(), self.encoder.pad_id()).batch(samples);
        let logits = self.model.forward(batch.input_ids, batch.attention_mask);
        let [rows, classes] = logits.dims();

        let probs: Vec<f32> = softmax(logits, 1)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| PipelineError::model("inference", format!("{e:?}")))?;

        (0..rows)
            .map(|row| {
                let scores = &probs[row * classes..(row + 1) * classes];
                let (id, score) = scores
                    .iter()
                    .copied()
                    .enumerate()
                    .fold((0, f32::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
                let label = self.labels.label_of(id).ok_or_else(|| {
                    PipelineError::model("inference", format!("class {id} has no label"))
                })?;
                Ok(Prediction { label: label.to_string(), score })
            })
            .collect()
    }
}

impl<B: Backend> SentimentPredictor for SentimentInferencer<B> {
    fn predict_batch(&self, texts: &[String]) -> Result<Vec<Prediction>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            out.extend(self.predict_chunk(chunk)?);
        }
        tracing::debug!(texts = texts.len(), "Classified batch");
        Ok(out)
    }
}
