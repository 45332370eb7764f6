// ============================================================
// Layer 6 — Training State
// ============================================================
// The append-only per-epoch log of one training run.
//
// Metrics recorded per epoch:
//   - epoch:         the epoch number (starts at 1)
//   - step:          optimiser steps taken so far
//   - train_loss:    average cross-entropy over training batches
//   - eval_loss:     average cross-entropy over validation batches
//   - eval_accuracy: fraction of validation reviews classified
//                    correctly
//
// A copy is written as `trainer_state.json` into every
// checkpoint directory, e.g.
//
//   {"log_history": [
//      {"epoch": 1, "step": 250, "train_loss": 0.61, "eval_loss": 0.52, "eval_accuracy": 0.74},
//      ...
//   ]}
//
// How to read the metrics:
//   - If eval_loss rises while train_loss falls → overfitting
//   - The best epoch is the one with the highest eval_accuracy

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One row of metrics for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:         usize,
    pub step:          usize,
    pub train_loss:    f64,
    pub eval_loss:     f64,
    pub eval_accuracy: f64,
}

impl EpochMetrics {
    pub fn new(
        epoch:         usize,
        step:          usize,
        train_loss:    f64,
        eval_loss:     f64,
        eval_accuracy: f64,
    ) -> Self {
        Self { epoch, step, train_loss, eval_loss, eval_accuracy }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub log_history: Vec<EpochMetrics>,
}

impl TrainingHistory {
    pub fn push(&mut self, metrics: EpochMetrics) {
        self.log_history.push(metrics);
    }

    pub fn len(&self) -> usize {
        self.log_history.len()
    }

    pub fn last(&self) -> Option<&EpochMetrics> {
        self.log_history.last()
    }

    /// Highest eval accuracy; ties keep the earlier epoch.
    pub fn best(&self) -> Option<&EpochMetrics> {
        let accuracies: Vec<f64> = self.log_history.iter().map(|m| m.eval_accuracy).collect();
        select_best(&accuracies).map(|i| &self.log_history[i])
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Index of the highest value, earliest on ties. NaN never wins.
pub fn select_best(accuracies: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &acc) in accuracies.iter().enumerate() {
        if acc.is_nan() {
            continue;
        }
        match best {
            Some((_, best_acc)) if acc <= best_acc => {}
            _ => best = Some((i, acc)),
        }
    }
    best.map(|(i, _)| i)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn history(accuracies: &[f64]) -> TrainingHistory {
        let mut h = TrainingHistory::default();
        for (i, &acc) in accuracies.iter().enumerate() {
            h.push(EpochMetrics::new(i + 1, (i + 1) * 10, 0.5, 0.4, acc));
        }
        h
    }

    #[test]
    fn test_best_epoch_by_accuracy() {
        let h = history(&[0.70, 0.82, 0.78]);
        let best = h.best().unwrap();
        assert_eq!(best.epoch, 2);
        assert_eq!(best.step, 20);
    }

    #[test]
    fn test_ties_keep_earlier_epoch() {
        assert_eq!(select_best(&[0.8, 0.9, 0.9]), Some(1));
    }

    #[test]
    fn test_nan_is_skipped() {
        assert_eq!(select_best(&[f64::NAN, 0.1]), Some(1));
        assert_eq!(select_best(&[]), None);
    }

    #[test]
    fn test_state_file_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("trainer_state.json");
        let h    = history(&[0.6, 0.7]);
        h.save(&path).unwrap();
        let loaded: TrainingHistory = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, h);
    }
}
