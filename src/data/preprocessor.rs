// ============================================================
// Layer 4 — Label Mapping
// ============================================================
// Turns the categorical `sentiment` column into the integer
// `label` column using the configured mapping.
//
// The mapping must cover exactly the sentiments observed in
// the data: a missing key would leave rows unlabelled and an
// extra key would describe a class that never occurs. Either
// mismatch fails before the data is split.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::review::ReviewRecord;
use crate::error::{PipelineError, Result};

pub struct LabelMapper<'a> {
    mapping: &'a BTreeMap<String, i64>,
}

impl<'a> LabelMapper<'a> {
    pub fn new(mapping: &'a BTreeMap<String, i64>) -> Self {
        Self { mapping }
    }

    /// Check the mapping keys against the distinct sentiments.
    pub fn validate(&self, records: &[ReviewRecord]) -> Result<()> {
        let observed: BTreeSet<&str> = records.iter().map(|r| r.sentiment.as_str()).collect();
        let expected: BTreeSet<&str> = self.mapping.keys().map(String::as_str).collect();

        if observed != expected {
            return Err(PipelineError::Data(format!(
                "label mapping should match the unique sentiment values in the data: {:?}. Got {:?} instead.",
                observed, expected
            )));
        }
        Ok(())
    }

    /// Validate, then fill in `label` on every record.
    pub fn apply(&self, records: Vec<ReviewRecord>) -> Result<Vec<ReviewRecord>> {
        self.validate(&records)?;
        Ok(records
            .into_iter()
            .map(|r| {
                let code = self.mapping[&r.sentiment];
                r.with_label(code)
            })
            .collect())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn rows() -> Vec<ReviewRecord> {
        vec![
            ReviewRecord::new("great", "positive"),
            ReviewRecord::new("awful", "negative"),
            ReviewRecord::new("superb", "positive"),
        ]
    }

    #[test]
    fn test_applies_codes() {
        let m      = mapping(&[("negative", 0), ("positive", 1)]);
        let mapped = LabelMapper::new(&m).apply(rows()).unwrap();
        let labels: Vec<_> = mapped.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec![Some(1), Some(0), Some(1)]);
    }

    #[test]
    fn test_missing_key_fails() {
        let m = mapping(&[("positive", 1)]);
        assert!(matches!(LabelMapper::new(&m).apply(rows()), Err(PipelineError::Data(_))));
    }

    #[test]
    fn test_extra_key_fails() {
        let m = mapping(&[("negative", 0), ("neutral", 2), ("positive", 1)]);
        assert!(LabelMapper::new(&m).validate(&rows()).is_err());
    }
}
