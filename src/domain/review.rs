// ============================================================
// Layer 3 — Review Record
// ============================================================
// One row of the sentiment dataset. Column names follow the
// CSV schema shared by every pipeline stage:
//
//   review,sentiment,label
//   "A wonderful little production...",positive,1
//
// `label` is absent in the raw source and filled in exactly
// once by the label mapping step of the preprocessing run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub review:    String,
    pub sentiment: String,
    #[serde(default)]
    pub label:     Option<i64>,
}

impl ReviewRecord {
    pub fn new(review: impl Into<String>, sentiment: impl Into<String>) -> Self {
        Self {
            review:    review.into(),
            sentiment: sentiment.into(),
            label:     None,
        }
    }

    pub fn with_label(mut self, label: i64) -> Self {
        self.label = Some(label);
        self
    }
}
