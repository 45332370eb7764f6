use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One tokenised review: token ids (already truncated, not yet
/// padded) and the LabelSpace id of its sentiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSample {
    pub input_ids: Vec<u32>,
    pub label:     usize,
}

#[derive(Debug)]
pub struct ReviewDataset {
    samples: Vec<ReviewSample>,
}

impl ReviewDataset {
    pub fn new(samples: Vec<ReviewSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<ReviewSample> for ReviewDataset {
    fn get(&self, index: usize) -> Option<ReviewSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
