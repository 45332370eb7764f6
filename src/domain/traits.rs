// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between the pipeline stages and their outside
// collaborators:
//
//   DatasetSource      ← CsvSource (local file or URL)
//   SentimentPredictor ← SentimentInferencer (Burn model)
//   ObjectStore        ← S3ObjectStore, in-memory store in tests

use std::path::Path;

use crate::domain::review::ReviewRecord;
use crate::error::Result;

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Anything that yields the review table.
pub trait DatasetSource {
    /// Load every record in source order.
    fn load_all(&self) -> Result<Vec<ReviewRecord>>;

    /// Human-readable location, used in logs and errors.
    fn describe(&self) -> String;
}

// ─── SentimentPredictor ───────────────────────────────────────────────────────
/// One classified text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    /// Softmax probability of `label`, in [0, 1]
    pub score: f32,
}

/// Given text, return (label, confidence).
pub trait SentimentPredictor {
    fn predict_batch(&self, texts: &[String]) -> Result<Vec<Prediction>>;

    fn predict(&self, text: &str) -> Result<Prediction> {
        let mut out = self.predict_batch(&[text.to_string()])?;
        out.pop().ok_or_else(|| {
            crate::error::PipelineError::InvalidInput("predictor returned no output".into())
        })
    }
}

// ─── ObjectStore ──────────────────────────────────────────────────────────────
/// Minimal keyed blob store: buckets of objects addressed by key.
/// Errors from the underlying client are returned unmodified.
pub trait ObjectStore {
    fn list_buckets(&self) -> Result<Vec<String>>;

    fn create_bucket(&self, bucket: &str) -> Result<()>;

    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;

    /// Upload a local file without buffering it whole.
    fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()>;

    /// Every key starting with `prefix`, across all result pages.
    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
}
