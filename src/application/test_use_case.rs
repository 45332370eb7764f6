// ============================================================
// Layer 2 — TestUseCase
// ============================================================
// Orchestrates the evaluation and promotion run:
//
//   Step 1: Load the test CSV                (Layer 4 - data)
//   Step 2: Load the trained model artifact  (Layer 5 - ml)
//   Step 3: Predict a label per review       (Layer 5 - ml)
//   Step 4: Compute + persist metrics        (Layer 5 - ml)
//   Step 5: Promotion gate                   (Layer 3 - domain)
//   Step 6: On approval, publish to S3       (Layer 6 - infra)

use anyhow::{Context, Result};

use crate::data::loader::CsvSource;
use crate::domain::{
    review::ReviewRecord,
    metrics_report::MetricsReport,
    promotion::{self, PromotionDecision},
    traits::{DatasetSource, ObjectStore, SentimentPredictor},
};
use crate::infra::{
    config::TestingConfig,
    object_store::{ArtifactStore, S3ObjectStore},
};
use crate::ml::{
    evaluator::{compute_metrics, write_report},
    inferencer::SentimentInferencer,
    InferBackend,
};

/// What one testing run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub report:   MetricsReport,
    pub decision: PromotionDecision,
}

pub struct TestUseCase {
    config: TestingConfig,
}

impl TestUseCase {
    pub fn new(config: TestingConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TestOutcome> {
        let cfg = &self.config;

        // ── Step 1: Load test data ────────────────────────────────────────────
        let rows = self.load_rows()?;

        // ── Step 2: Load the trained model ────────────────────────────────────
        let device = crate::ml::default_device();
        let model  = SentimentInferencer::<InferBackend>::from_artifact(&cfg.trained_model_path, cfg.batch_size, device)
            .with_context(|| {
                format!("Could not load the model at '{}'", cfg.trained_model_path.display())
            })?;

        self.run(&rows, &model, || Ok(S3ObjectStore::from_env()?))
    }

    pub fn load_rows(&self) -> Result<Vec<ReviewRecord>> {
        let path = &self.config.test_data_path;
        CsvSource::new(path)
            .load_all()
            .with_context(|| format!("Failed to load '{path}'"))
    }

    /// Evaluate `predictor` on `rows` and gate the artifact.
    /// `connect` is only called when the gate approves publication.
    pub fn run<P, S, F>(&self, rows: &[ReviewRecord], predictor: &P, connect: F) -> Result<TestOutcome>
    where
        P: SentimentPredictor,
        S: ObjectStore,
        F: FnOnce() -> Result<S>,
    {
        let cfg = &self.config;

        // ── Step 3: Predict ───────────────────────────────────────────────────
        let texts: Vec<String> = rows.iter().map(|r| r.review.clone()).collect();
        let predictions = predictor.predict_batch(&texts)?;

        // ── Step 4: Metrics ───────────────────────────────────────────────────
        let truth: Vec<&str> = rows.iter().map(|r| r.sentiment.as_str()).collect();
        let pred:  Vec<&str> = predictions.iter().map(|p| p.label.as_str()).collect();
        let report = compute_metrics(&truth, &pred, &cfg.positive_label)?;
        write_report(&cfg.metrics_output_file, &report)?;

        tracing::info!(
            stage = "test",
            accuracy = report.accuracy,
            precision = report.precision,
            recall = report.recall,
            f1_score = report.f1_score,
            "Evaluation complete"
        );

        // ── Step 5: Promotion gate ────────────────────────────────────────────
        let policy   = cfg.push_model_s3.as_ref();
        let decision = promotion::evaluate(&report, policy)?;

        // ── Step 6: Publish ───────────────────────────────────────────────────
        match (&decision, policy) {
            (PromotionDecision::Approved, Some(policy)) => {
                let store = ArtifactStore::new(connect()?, &policy.bucket_name);
                store.ensure_bucket()?;
                store
                    .upload_directory(&cfg.trained_model_path, &policy.prefix)
                    .with_context(|| {
                        format!("Failed to publish to s3://{}/{}", policy.bucket_name, policy.prefix)
                    })?;
                tracing::info!(stage = "test", bucket = %policy.bucket_name, prefix = %policy.prefix, "Model promoted");
            }
            (PromotionDecision::Rejected { metric, value, threshold }, _) => {
                tracing::warn!(stage = "test", metric = %metric, value, threshold, "Model not promoted: condition failed");
            }
            (PromotionDecision::Skipped(reason), _) => {
                tracing::info!(stage = "test", reason = %reason, "Promotion skipped");
            }
            (PromotionDecision::Approved, None) => {}
        }

        Ok(TestOutcome { report, decision })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::domain::promotion::{PromotionCondition, PromotionPolicy};
    use crate::domain::traits::Prediction;
    use crate::error::Result as PipelineResult;
    use crate::infra::object_store::tests::MemoryStore;

    /// Predicts "positive" for every review.
    struct AlwaysPositive;

    impl SentimentPredictor for AlwaysPositive {
        fn predict_batch(&self, texts: &[String]) -> PipelineResult<Vec<Prediction>> {
            Ok(texts.iter().map(|_| Prediction { label: "positive".into(), score: 0.9 }).collect())
        }
    }

    fn config(dir: &Path, threshold: Option<f64>) -> TestingConfig {
        std::fs::write(
            dir.join("test.csv"),
            "review,sentiment,label\ngood,positive,1\nbad,negative,0\nfine,positive,1\n",
        )
        .unwrap();
        let model_dir = dir.join("model");
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(model_dir.join("config.json"), "{}").unwrap();

        TestingConfig {
            test_data_path:      dir.join("test.csv").to_string_lossy().into_owned(),
            trained_model_path:  model_dir,
            batch_size:          8,
            metrics_output_file: dir.join("reports").join("metrics.csv"),
            positive_label:      "positive".into(),
            push_model_s3:       threshold.map(|t| PromotionPolicy {
                enabled:     true,
                bucket_name: "models".into(),
                prefix:      "imdb/latest".into(),
                conditions:  vec![PromotionCondition { metric: "accuracy".into(), threshold: t }],
            }),
        }
    }

    #[test]
    fn test_approved_model_is_uploaded() {
        let dir   = tempfile::tempdir().unwrap();
        let store = MemoryStore::default();
        let use_case = TestUseCase::new(config(dir.path(), Some(0.6)));
        let rows     = use_case.load_rows().unwrap();
        let outcome  = use_case.run(&rows, &AlwaysPositive, || Ok(store.clone())).unwrap();

        assert_eq!(outcome.report.accuracy, 0.667);
        assert_eq!(outcome.decision, PromotionDecision::Approved);
        assert!(store.buckets.borrow()["models"].contains_key("imdb/latest/config.json"));
        assert!(dir.path().join("reports").join("metrics.csv").is_file());
    }

    #[test]
    fn test_rejected_model_never_connects() {
        let dir = tempfile::tempdir().unwrap();
        let use_case = TestUseCase::new(config(dir.path(), Some(0.9)));
        let rows     = use_case.load_rows().unwrap();
        let outcome  = use_case
            .run(&rows, &AlwaysPositive, || -> Result<MemoryStore> { panic!("store must not be touched") })
            .unwrap();

        assert!(matches!(outcome.decision, PromotionDecision::Rejected { ref metric, .. } if metric == "accuracy"));
    }

    #[test]
    fn test_no_policy_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let use_case = TestUseCase::new(config(dir.path(), None));
        let rows     = use_case.load_rows().unwrap();
        let outcome  = use_case
            .run(&rows, &AlwaysPositive, || -> Result<MemoryStore> { panic!("store must not be touched") })
            .unwrap();

        assert_eq!(outcome.decision, PromotionDecision::Skipped("not configured".into()));
    }

    #[test]
    fn test_missing_test_data_reported_before_model_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), None);
        cfg.test_data_path     = dir.path().join("absent.csv").to_string_lossy().into_owned();
        cfg.trained_model_path = dir.path().join("no-model");

        let err = format!("{:#}", TestUseCase::new(cfg).execute().unwrap_err());
        assert!(err.contains("absent.csv"));
        assert!(!err.contains("no-model"));
    }
}
