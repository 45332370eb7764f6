// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all cross-cutting concerns that don't belong in
// any specific business layer:
//
//   config.rs           Typed JSON configs per pipeline mode,
//                       validated right after parsing.
//
//   checkpoint.rs       Per-epoch checkpoints under train_dir
//                       and the final model artifact directory
//                       (weights, tokenizer, config.json with
//                       the label maps). Uses Burn's
//                       CompactRecorder.
//
//   tokenizer_store.rs  Resolves a tokenizer from a file, a
//                       directory or the Hugging Face Hub, and
//                       saves it next to the model.
//
//   metrics.rs          Per-epoch log history and best-epoch
//                       selection, persisted as trainer_state.json.
//
//   plot.rs             Training loss / accuracy curve image.
//
//   object_store.rs     Manifest-committed directory upload and
//                       verified download over an ObjectStore,
//                       plus the S3 implementation.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling)
//            Burn Book §5 (Checkpointing)

/// Pipeline configuration files
pub mod config;

/// Model checkpoint and artifact saving and loading
pub mod checkpoint;

/// Tokenizer resolution and persistence
pub mod tokenizer_store;

/// Training history and best-epoch selection
pub mod metrics;

/// Training curve rendering
pub mod plot;

/// Artifact publication to S3
pub mod object_store;
