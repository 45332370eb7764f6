// ============================================================
// Layer 2 — InferenceUseCase
// ============================================================
// Serves predictions from a published model:
//
//   Step 1: Download the artifact from S3    (Layer 6 - infra)
//   Step 2: Load the classifier              (Layer 5 - ml)
//   Step 3: Read reviews line by line and
//           answer each with a prediction    (this file)
//
// Session example:
//
//   Enter your review: This movie was amazing!
//   Prediction: positive (98.12%)
//   Enter your review: exit

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::domain::traits::{Prediction, SentimentPredictor};
use crate::infra::{
    config::InferenceConfig,
    object_store::{ArtifactStore, S3ObjectStore},
};
use crate::ml::{inferencer::SentimentInferencer, InferBackend};

const PROMPT: &str = "Enter your review: ";
const EXIT_WORDS: [&str; 2] = ["exit", "quit"];

pub struct InferenceUseCase {
    config: InferenceConfig,
}

impl InferenceUseCase {
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Download ──────────────────────────────────────────────────
        let store = ArtifactStore::new(S3ObjectStore::from_env()?, &cfg.bucket_name);
        store
            .download_directory(&cfg.s3_model_prefix, &cfg.local_model_dir)
            .with_context(|| {
                format!("Failed to download s3://{}/{}", cfg.bucket_name, cfg.s3_model_prefix)
            })?;

        // ── Step 2: Load ──────────────────────────────────────────────────────
        let device = crate::ml::default_device();
        let model  = SentimentInferencer::<InferBackend>::from_artifact(&cfg.local_model_dir, 1, device)
            .with_context(|| format!("Could not load the model at '{}'", cfg.local_model_dir.display()))?;
        tracing::info!(stage = "inference", task = %cfg.model_task, "Model ready");

        // ── Step 3: Serve ─────────────────────────────────────────────────────
        let stdin  = std::io::stdin();
        let stdout = std::io::stdout();
        run_repl(&model, stdin.lock(), stdout.lock())?;
        Ok(())
    }
}

/// Answer each non-empty input line until EOF or an exit word.
/// Returns the number of predictions made.
pub fn run_repl<P, R, W>(predictor: &P, input: R, mut output: W) -> Result<usize>
where
    P: SentimentPredictor,
    R: BufRead,
    W: Write,
{
    writeln!(output, "Sentiment Analysis Application (type 'exit' to quit)")?;

    let mut answered = 0usize;
    let mut lines = input.lines();
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let text = line.trim();

        if EXIT_WORDS.contains(&text.to_lowercase().as_str()) {
            break;
        }
        if text.is_empty() {
            continue;
        }

        let prediction = predictor.predict(text)?;
        writeln!(output, "{}", format_prediction(&prediction))?;
        answered += 1;
    }

    writeln!(output)?;
    Ok(answered)
}

/// `Prediction: <label> (<score as a percentage, 2 decimals>%)`
pub fn format_prediction(prediction: &Prediction) -> String {
    let percent = (f64::from(prediction.score) * 100.0 * 100.0).round() / 100.0;
    format!("Prediction: {} ({:.2}%)", prediction.label, percent)
}
