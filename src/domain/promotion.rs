// ============================================================
// Layer 3 — Promotion Gate
// ============================================================
// Decides whether an evaluated model is fit to publish.
//
//   policy absent            → Skipped("not configured")
//   enabled = false          → Skipped("disabled")
//   no conditions            → Skipped("no conditions")
//   first condition failing  → Rejected(metric)
//   every condition holds    → Approved
//
// Conditions are checked in policy order with `>=` and the
// first failure short-circuits. A condition naming a metric
// the report does not carry is a configuration bug and fails
// the run instead of producing a decision.

use serde::{Deserialize, Serialize};

use crate::domain::metrics_report::MetricsReport;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionCondition {
    pub metric:    String,
    pub threshold: f64,
}

/// The `push_model_s3` block of the testing config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionPolicy {
    #[serde(default)]
    pub enabled:     bool,
    pub bucket_name: String,
    pub prefix:      String,
    #[serde(default)]
    pub conditions:  Vec<PromotionCondition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromotionDecision {
    Approved,
    Rejected { metric: String, value: f64, threshold: f64 },
    Skipped(String),
}

impl PromotionDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, PromotionDecision::Approved)
    }
}

pub fn evaluate(metrics: &MetricsReport, policy: Option<&PromotionPolicy>) -> Result<PromotionDecision> {
    let policy = match policy {
        None                  => return Ok(PromotionDecision::Skipped("not configured".into())),
        Some(p) if !p.enabled => return Ok(PromotionDecision::Skipped("disabled".into())),
        Some(p)               => p,
    };

    if policy.conditions.is_empty() {
        return Ok(PromotionDecision::Skipped("no conditions".into()));
    }

    for condition in &policy.conditions {
        let value = metrics.get(&condition.metric).ok_or_else(|| {
            PipelineError::Policy(format!(
                "condition references unknown metric '{}'",
                condition.metric
            ))
        })?;

        if value < condition.threshold {
            return Ok(PromotionDecision::Rejected {
                metric:    condition.metric.clone(),
                value,
                threshold: condition.threshold,
            });
        }
    }

    Ok(PromotionDecision::Approved)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn report(accuracy: f64) -> MetricsReport {
        MetricsReport { accuracy, precision: 0.9, recall: 0.9, f1_score: 0.9 }
    }

    fn policy(conditions: Vec<(&str, f64)>) -> PromotionPolicy {
        PromotionPolicy {
            enabled:     true,
            bucket_name: "models".into(),
            prefix:      "sentiment/latest".into(),
            conditions:  conditions
                .into_iter()
                .map(|(m, t)| PromotionCondition { metric: m.into(), threshold: t })
                .collect(),
        }
    }

    #[test]
    fn test_below_threshold_is_rejected() {
        let p = policy(vec![("accuracy", 0.9)]);
        let decision = evaluate(&report(0.85), Some(&p)).unwrap();
        assert!(matches!(decision, PromotionDecision::Rejected { ref metric, .. } if metric == "accuracy"));
    }

    #[test]
    fn test_above_threshold_is_approved() {
        let p = policy(vec![("accuracy", 0.9)]);
        assert_eq!(evaluate(&report(0.95), Some(&p)).unwrap(), PromotionDecision::Approved);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let p = policy(vec![("accuracy", 0.9)]);
        assert!(evaluate(&report(0.9), Some(&p)).unwrap().is_approved());
    }

    #[test]
    fn test_disabled_policy_is_skipped() {
        let mut p = policy(vec![("accuracy", 0.9)]);
        p.enabled = false;
        assert_eq!(
            evaluate(&report(0.1), Some(&p)).unwrap(),
            PromotionDecision::Skipped("disabled".into())
        );
    }

    #[test]
    fn test_missing_policy_is_skipped() {
        assert_eq!(
            evaluate(&report(0.1), None).unwrap(),
            PromotionDecision::Skipped("not configured".into())
        );
    }

    #[test]
    fn test_no_conditions_is_skipped() {
        let p = policy(vec![]);
        assert_eq!(
            evaluate(&report(0.1), Some(&p)).unwrap(),
            PromotionDecision::Skipped("no conditions".into())
        );
    }

    #[test]
    fn test_first_failing_condition_is_reported() {
        // recall fails first even though accuracy also fails later
        let p = policy(vec![("precision", 0.5), ("recall", 0.95), ("accuracy", 0.99)]);
        let decision = evaluate(&report(0.5), Some(&p)).unwrap();
        assert!(matches!(decision, PromotionDecision::Rejected { ref metric, .. } if metric == "recall"));
    }

    #[test]
    fn test_unknown_metric_is_fatal() {
        let p = policy(vec![("auc", 0.5)]);
        assert!(matches!(evaluate(&report(0.99), Some(&p)), Err(PipelineError::Policy(_))));
    }

    #[test]
    fn test_unknown_metric_after_rejection_is_not_reached() {
        let p = policy(vec![("accuracy", 0.99), ("auc", 0.5)]);
        assert!(matches!(
            evaluate(&report(0.5), Some(&p)).unwrap(),
            PromotionDecision::Rejected { .. }
        ));
    }
}
