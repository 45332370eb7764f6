// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits describing the sentiment
// pipeline: review records, the label space, evaluation
// reports and the promotion policy.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file or network I/O
//   - Only structs, enums, pure functions and traits

/// A single labelled review row
pub mod review;

/// Dense id <-> name mapping for classification targets
pub mod label_space;

/// Rounded evaluation metrics for one test run
pub mod metrics_report;

/// Threshold-based gate deciding artifact publication
pub mod promotion;

/// Seams implemented by the data, ml and infra layers
pub mod traits;
