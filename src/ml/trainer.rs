// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fine-tunes the classifier with Burn's DataLoader and Adam.
//
//   tokenise train + validation once (truncated, unpadded)
//   for epoch in 1..=n_epochs:
//       train pass   (Autodiff backend, shuffled batches)
//       eval pass    (model.valid(), no autodiff, no dropout)
//       append EpochMetrics, save checkpoint-{step}
//   restore the best epoch if it was not the last one
//
// Key Burn insights:
//   - Training uses B (Autodiff<…>) for gradients
//   - model.valid() returns the model on B::InnerBackend
//   - the validation batcher must also use B::InnerBackend
//   - argmax(1) returns [batch, 1], flattened before .equal()
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::ReviewBatcher,
    dataset::{ReviewDataset, ReviewSample},
};
use crate::domain::label_space::LabelSpace;
use crate::domain::review::ReviewRecord;
use crate::error::{PipelineError, Result};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, TrainingHistory};
use crate::infra::tokenizer_store::TextEncoder;
use crate::ml::model::SentimentClassifier;

/// Shuffle seed for the training DataLoader
const SHUFFLE_SEED: u64 = 42;

/// Loop settings taken from the training config.
#[derive(Debug, Clone)]
pub struct TrainerSettings {
    pub n_epochs:      usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    pub clean_before:  bool,
}

/// Tokenise `records` and map each sentiment to its LabelSpace id.
pub fn tokenize_split(
    records: &[ReviewRecord],
    encoder: &TextEncoder,
    labels:  &LabelSpace,
    split:   &str,
) -> Result<ReviewDataset> {
    let texts: Vec<String> = records.iter().map(|r| r.review.clone()).collect();
    let ids = encoder.encode_batch(&texts)?;

    let samples = records
        .iter()
        .zip(ids)
        .enumerate()
        .map(|(row, (record, input_ids))| {
            let label = labels.id_of(&record.sentiment).ok_or_else(|| {
                PipelineError::Data(format!(
                    "{split} row {row} has sentiment '{}' which is not in the training labels {:?}",
                    record.sentiment,
                    labels.labels()
                ))
            })?;
            Ok(ReviewSample { input_ids, label })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(split, samples = samples.len(), "Tokenised split");
    Ok(ReviewDataset::new(samples))
}

pub fn train<B: AutodiffBackend>(
    mut model:   SentimentClassifier<B>,
    encoder:     &TextEncoder,
    train_set:   ReviewDataset,
    val_set:     ReviewDataset,
    settings:    &TrainerSettings,
    checkpoints: &CheckpointManager,
    device:      &B::Device,
) -> Result<(SentimentClassifier<B>, TrainingHistory)> {
    if settings.clean_before {
        checkpoints.clean()?;
    }

    let pad_id = encoder.pad_id();

    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_batcher = ReviewBatcher::<B>::new(device.clone(), pad_id);
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(settings.batch_size)
        .shuffle(SHUFFLE_SEED)
        .num_workers(1)
        .build(train_set);

    // ── Validation data loader (InnerBackend) ─────────────────────────────────
    let val_batcher = ReviewBatcher::<B::InnerBackend>::new(device.clone(), pad_id);
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(settings.batch_size)
        .num_workers(1)
        .build(val_set);

    let mut history = TrainingHistory::default();
    let mut step    = 0usize;

    for epoch in 1..=settings.n_epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(batch.input_ids, batch.attention_mask, batch.labels);

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(settings.learning_rate, model, grads);
            step += 1;
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut val_loss_sum  = 0.0f64;
        let mut val_batches   = 0usize;
        let mut correct       = 0usize;
        let mut total_samples = 0usize;

        for batch in val_loader.iter() {
            let (loss, logits) = model_valid.forward_loss(
                batch.input_ids,
                batch.attention_mask,
                batch.labels.clone(),
            );
            val_loss_sum += loss.into_scalar().elem::<f64>();
            val_batches  += 1;

            total_samples += batch.labels.dims()[0];
            let predicted = logits.argmax(1).flatten::<1>(0, 1);
            let hits: i64 = predicted.equal(batch.labels).int().sum().into_scalar().elem::<i64>();
            correct += hits as usize;
        }

        let metrics = EpochMetrics::new(
            epoch,
            step,
            mean(train_loss_sum, train_batches),
            mean(val_loss_sum, val_batches),
            if total_samples > 0 { correct as f64 / total_samples as f64 } else { 0.0 },
        );

        tracing::info!(
            stage = "train",
            epoch,
            n_epochs = settings.n_epochs,
            step,
            train_loss = metrics.train_loss,
            eval_loss = metrics.eval_loss,
            eval_accuracy = metrics.eval_accuracy,
            "Epoch finished"
        );

        history.push(metrics);
        checkpoints.save(&model, &history, step)?;
    }

    // ── Best epoch ────────────────────────────────────────────────────────────
    let model = restore_best(model, &history, checkpoints, device)?;
    Ok((model, history))
}

/// Swap in the best epoch's checkpoint when it is not the last
/// epoch; otherwise `model` already holds the best weights.
pub fn restore_best<B: Backend>(
    model:       SentimentClassifier<B>,
    history:     &TrainingHistory,
    checkpoints: &CheckpointManager,
    device:      &B::Device,
) -> Result<SentimentClassifier<B>> {
    match (history.best(), history.last()) {
        (Some(best), Some(last)) if best.epoch != last.epoch => {
            tracing::info!(
                best_epoch = best.epoch,
                eval_accuracy = best.eval_accuracy,
                "Restoring best checkpoint"
            );
            checkpoints.load(model, best.step, device)
        }
        _ => Ok(model),
    }
}

fn mean(sum: f64, count: usize) -> f64 {
    if count > 0 { sum / count as f64 } else { f64::NAN }
}
