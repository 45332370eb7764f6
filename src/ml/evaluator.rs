// ============================================================
// Layer 5 — Metrics Engine
// ============================================================
// Compares predicted label names with the true sentiments of
// the test partition:
//
//   accuracy  = correct / total
//   precision = TP / (TP + FP)      anchored on `positive_label`
//   recall    = TP / (TP + FN)
//   f1        = 2PR / (P + R)
//
// Zero denominators give 0.0. Every value is rounded to 3
// decimals. Only binary problems are scored: more than two
// distinct labels across both sequences is an error.
//
// The report is persisted as a single-row CSV:
//
//   accuracy,precision,recall,f1_score
//   0.667,0.667,1.0,0.8

use std::{collections::BTreeSet, path::Path};

use crate::domain::metrics_report::MetricsReport;
use crate::error::{PipelineError, Result};

pub fn compute_metrics<S: AsRef<str>>(
    true_labels:    &[S],
    pred_labels:    &[S],
    positive_label: &str,
) -> Result<MetricsReport> {
    if true_labels.is_empty() {
        return Err(PipelineError::InvalidInput("cannot score an empty label sequence".into()));
    }
    if true_labels.len() != pred_labels.len() {
        return Err(PipelineError::InvalidInput(format!(
            "{} true labels but {} predictions",
            true_labels.len(),
            pred_labels.len()
        )));
    }

    let distinct: BTreeSet<&str> = true_labels
        .iter()
        .chain(pred_labels)
        .map(AsRef::as_ref)
        .collect();
    if distinct.len() > 2 {
        return Err(PipelineError::Data(format!(
            "binary metrics need at most two labels, found {}: {:?}",
            distinct.len(),
            distinct
        )));
    }

    let (mut correct, mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize, 0usize);
    for (t, p) in true_labels.iter().zip(pred_labels) {
        let (t, p) = (t.as_ref(), p.as_ref());
        if t == p {
            correct += 1;
        }
        match (t == positive_label, p == positive_label) {
            (true, true)  => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }

    let accuracy  = ratio(correct, true_labels.len());
    let precision = ratio(tp, tp + fp);
    let recall    = ratio(tp, tp + fn_);
    let f1_score  = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Ok(MetricsReport {
        accuracy:  round3(accuracy),
        precision: round3(precision),
        recall:    round3(recall),
        f1_score:  round3(f1_score),
    })
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Write the report as a header plus one row, replacing any old file.
pub fn write_report(path: &Path, report: &MetricsReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.serialize(report)?;
    wtr.flush()?;

    tracing::info!(path = %path.display(), "Saved metrics report");
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_example() {
        let truth = ["positive", "negative", "positive"];
        let pred  = ["positive", "positive", "positive"];
        let r = compute_metrics(&truth, &pred, "positive").unwrap();
        assert_eq!(r.accuracy, 0.667);
        assert_eq!(r.precision, 0.667);
        assert_eq!(r.recall, 1.0);
        assert_eq!(r.f1_score, 0.8);
    }

    #[test]
    fn test_no_positive_predictions_gives_zero() {
        let truth = ["positive", "negative"];
        let pred  = ["negative", "negative"];
        let r = compute_metrics(&truth, &pred, "positive").unwrap();
        assert_eq!(r.accuracy, 0.5);
        assert_eq!(r.precision, 0.0);
        assert_eq!(r.recall, 0.0);
        assert_eq!(r.f1_score, 0.0);
    }

    #[test]
    fn test_more_than_two_labels_is_rejected() {
        let truth = ["positive", "negative", "neutral"];
        let pred  = ["positive", "negative", "negative"];
        let err = compute_metrics(&truth, &pred, "positive").unwrap_err();
        assert!(matches!(err, PipelineError::Data(_)));
    }

    #[test]
    fn test_empty_and_mismatched_input() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            compute_metrics(&empty, &empty, "positive"),
            Err(PipelineError::InvalidInput(_))
        ));
        assert!(matches!(
            compute_metrics(&["positive"], &["positive", "negative"], "positive"),
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_report_csv_layout() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("metrics.csv");
        let r = MetricsReport { accuracy: 0.667, precision: 0.667, recall: 1.0, f1_score: 0.8 };
        write_report(&path, &r).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("accuracy,precision,recall,f1_score"));
        assert_eq!(lines.next(), Some("0.667,0.667,1.0,0.8"));
        assert_eq!(lines.next(), None);
    }
}
