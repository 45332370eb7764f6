// ============================================================
// Layer 3 — Metrics Report
// ============================================================
// The outcome of one evaluation run. Values are already
// rounded to 3 decimals and lie in [0, 1].
//
// Serialises to the single-row CSV sink with the header:
//   accuracy,precision,recall,f1_score

use serde::{Deserialize, Serialize};

pub const ACCURACY:  &str = "accuracy";
pub const PRECISION: &str = "precision";
pub const RECALL:    &str = "recall";
pub const F1_SCORE:  &str = "f1_score";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub accuracy:  f64,
    pub precision: f64,
    pub recall:    f64,
    pub f1_score:  f64,
}

impl MetricsReport {
    /// Look a metric up by name. `f1` is accepted as a synonym
    /// of `f1_score`. Unknown names return None.
    pub fn get(&self, metric: &str) -> Option<f64> {
        match metric {
            ACCURACY         => Some(self.accuracy),
            PRECISION        => Some(self.precision),
            RECALL           => Some(self.recall),
            F1_SCORE | "f1"  => Some(self.f1_score),
            _                => None,
        }
    }

    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            (ACCURACY,  self.accuracy),
            (PRECISION, self.precision),
            (RECALL,    self.recall),
            (F1_SCORE,  self.f1_score),
        ]
    }
}
