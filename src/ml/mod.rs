// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here: the architecture, the model
// builder, the training loop, evaluation and inference.
//
//   model.rs       encoder backbone + classification head
//   builder.rs     label space, backbone resolution, dropout
//                  override, freezing, tokenizer
//   trainer.rs     epoch loop, checkpoints, best-epoch restore
//   evaluator.rs   accuracy / precision / recall / F1
//   inferencer.rs  artifact loading and batched prediction
//
// Backends:
//   feature "wgpu" (default) → Wgpu, otherwise NdArray (CPU).
//   Training wraps the inference backend in Autodiff.
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Encoder backbone and sentiment classification head
pub mod model;

/// Builds a classifier sized to the training label space
pub mod builder;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Binary classification metrics and their CSV sink
pub mod evaluator;

/// Loads an artifact and predicts (label, score)
pub mod inferencer;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;
#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

pub fn default_device() -> <InferBackend as burn::tensor::backend::Backend>::Device {
    let device = Default::default();
    tracing::info!(device = ?device, "Using compute device");
    device
}
