// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a CSV file and a tensor batch:
//
//   CSV (path or URL)
//       │
//       ▼
//   CsvSource         → ReviewRecord rows
//       │
//       ▼
//   LabelMapper       → validates + fills the `label` column
//       │
//       ▼
//   split_three_way   → seeded train / validation / test
//       │
//       ▼
//   ReviewDataset     → tokenised samples (Burn Dataset)
//       │
//       ▼
//   ReviewBatcher     → padded tensors per batch

/// Reads and writes the review CSV tables
pub mod loader;

/// Validates and applies the sentiment → label mapping
pub mod preprocessor;

/// Seeded train / validation / test partitioning
pub mod splitter;

/// Implements Burn's Dataset trait for tokenised reviews
pub mod dataset;

/// Implements Burn's Batcher trait with per-batch padding
pub mod batcher;
