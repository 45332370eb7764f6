// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// One use case per pipeline mode. Each orchestrates the other
// layers to accomplish a single run:
//
//   process_data → PreprocessUseCase
//   train        → TrainUseCase
//   test         → TestUseCase
//   inference    → InferenceUseCase
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - Only workflow coordination, with anyhow context naming
//     the failing path or identifier
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// Load, label, split and persist the raw dataset
pub mod preprocess_use_case;

/// Build, fine-tune and persist the classifier
pub mod train_use_case;

/// Evaluate, gate and optionally publish the classifier
pub mod test_use_case;

/// Download the published classifier and serve predictions
pub mod inference_use_case;
