// ============================================================
// Layer 3 — Label Space
// ============================================================
// The classification targets of a model, derived from the
// distinct sentiment values of the *training* partition and
// sorted lexicographically:
//
//   {"positive", "negative"}  →  negative = 0, positive = 1
//
// Ids are dense and zero-based. The maps are written into the
// model artifact so inference can decode logits on its own.
//
// Labels absent from the training partition are not part of
// the space; validation rows carrying them are rejected.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LabelMaps", into = "LabelMaps")]
pub struct LabelSpace {
    labels: Vec<String>,
}

/// Wire form stored in the artifact's config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LabelMaps {
    id2label: BTreeMap<usize, String>,
    label2id: BTreeMap<String, usize>,
}

impl LabelSpace {
    /// Build the space from any sequence of label names.
    /// Duplicates collapse; order of appearance is irrelevant.
    pub fn from_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = labels
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect();

        if distinct.is_empty() {
            return Err(PipelineError::Data(
                "cannot derive a label space from an empty training split".into(),
            ));
        }

        Ok(Self { labels: distinct.into_iter().collect() })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn id_of(&self, label: &str) -> Option<usize> {
        self.labels.binary_search_by(|l| l.as_str().cmp(label)).ok()
    }

    pub fn label_of(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn id2label(&self) -> BTreeMap<usize, String> {
        self.labels.iter().cloned().enumerate().collect()
    }

    pub fn label2id(&self) -> BTreeMap<String, usize> {
        self.labels.iter().cloned().enumerate().map(|(i, l)| (l, i)).collect()
    }
}

impl From<LabelSpace> for LabelMaps {
    fn from(space: LabelSpace) -> Self {
        Self { id2label: space.id2label(), label2id: space.label2id() }
    }
}

impl TryFrom<LabelMaps> for LabelSpace {
    type Error = String;

    fn try_from(maps: LabelMaps) -> std::result::Result<Self, Self::Error> {
        // ids must be exactly 0..n
        let labels: Vec<String> = maps.id2label.values().cloned().collect();
        if maps.id2label.keys().copied().ne(0..labels.len()) {
            return Err("id2label ids must be dense and zero-based".into());
        }

        let space = LabelSpace::from_labels(&labels).map_err(|e| e.to_string())?;
        if space.labels != labels {
            return Err("id2label must list labels in sorted order without duplicates".into());
        }
        if space.label2id() != maps.label2id {
            return Err("label2id is not the inverse of id2label".into());
        }
        Ok(space)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexicographic_ids() {
        let space = LabelSpace::from_labels(["positive", "negative", "positive"]).unwrap();
        assert_eq!(space.len(), 2);
        assert_eq!(space.id_of("negative"), Some(0));
        assert_eq!(space.id_of("positive"), Some(1));
        assert_eq!(space.label_of(0), Some("negative"));
        assert_eq!(space.label_of(1), Some("positive"));
    }

    #[test]
    fn test_maps_are_exact_inverses() {
        let space = LabelSpace::from_labels(["neutral", "positive", "negative"]).unwrap();
        let id2label = space.id2label();
        let label2id = space.label2id();
        for (id, label) in &id2label {
            assert_eq!(label2id[label], *id);
        }
        assert_eq!(id2label.len(), label2id.len());
    }

    #[test]
    fn test_unknown_label_has_no_id() {
        let space = LabelSpace::from_labels(["negative", "positive"]).unwrap();
        assert_eq!(space.id_of("neutral"), None);
        assert_eq!(space.label_of(2), None);
    }

    #[test]
    fn test_empty_split_is_rejected() {
        let labels: Vec<String> = Vec::new();
        assert!(LabelSpace::from_labels(labels).is_err());
    }

    #[test]
    fn test_json_round_trip_uses_hf_style_maps() {
        let space = LabelSpace::from_labels(["negative", "positive"]).unwrap();
        let json  = serde_json::to_value(&space).unwrap();
        assert_eq!(json["id2label"]["0"], "negative");
        assert_eq!(json["label2id"]["positive"], 1);

        let back: LabelSpace = serde_json::from_value(json).unwrap();
        assert_eq!(back, space);
    }

    #[test]
    fn test_inconsistent_maps_are_rejected() {
        let json = serde_json::json!({
            "id2label": {"0": "negative", "1": "positive"},
            "label2id": {"negative": 1, "positive": 0}
        });
        assert!(serde_json::from_value::<LabelSpace>(json).is_err());
    }
}
