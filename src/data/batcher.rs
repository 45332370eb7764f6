// ============================================================
// Layer 4 — Review Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<ReviewSample>
// into tensors for the classifier.
//
// Samples arrive tokenised and truncated but NOT padded, so
// each batch is padded here to its own longest sequence:
//
//   ids:  [5 9 2]        →  [5 9 2 0 0]   mask: [1 1 1 0 0]
//         [7 3 8 4 6]    →  [7 3 8 4 6]         [1 1 1 1 1]
//
// Output shapes:
//   input_ids, attention_mask : [batch_size, longest]
//   labels                    : [batch_size]
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::ReviewSample;

// ─── ReviewBatch ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ReviewBatch<B: Backend> {
    /// Token ids, right-padded with the tokenizer's pad id
    pub input_ids: Tensor<B, 2, Int>,

    /// 1 = real token, 0 = padding
    pub attention_mask: Tensor<B, 2, Int>,

    /// LabelSpace ids
    pub labels: Tensor<B, 1, Int>,
}

// ─── ReviewBatcher ────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ReviewBatcher<B: Backend> {
    pub device: B::Device,
    pub pad_id: u32,
}

impl<B: Backend> ReviewBatcher<B> {
    pub fn new(device: B::Device, pad_id: u32) -> Self {
        Self { device, pad_id }
    }
}

impl<B: Backend> Batcher<ReviewSample, ReviewBatch<B>> for ReviewBatcher<B> {
    fn batch(&self, items: Vec<ReviewSample>) -> ReviewBatch<B> {
        let batch_size = items.len();
        // an empty review still occupies one position
        let longest = items.iter().map(|s| s.input_ids.len()).max().unwrap_or(0).max(1);

        let mut ids_flat  = Vec::with_capacity(batch_size * longest);
        let mut mask_flat = Vec::with_capacity(batch_size * longest);

        for sample in &items {
            let real = sample.input_ids.len();
            ids_flat.extend(sample.input_ids.iter().map(|&id| id as i64));
            ids_flat.extend(std::iter::repeat(self.pad_id as i64).take(longest - real));
            mask_flat.extend(std::iter::repeat(1i64).take(real));
            mask_flat.extend(std::iter::repeat(0i64).take(longest - real));
        }

        let labels: Vec<i64> = items.iter().map(|s| s.label as i64).collect();

        let input_ids = Tensor::<B, 2, Int>::from_ints(
            TensorData::new(ids_flat, [batch_size, longest]), &self.device,
        );
        let attention_mask = Tensor::<B, 2, Int>::from_ints(
            TensorData::new(mask_flat, [batch_size, longest]), &self.device,
        );
        let labels = Tensor::<B, 1, Int>::from_ints(
            TensorData::new(labels, [batch_size]), &self.device,
        );

        ReviewBatch { input_ids, attention_mask, labels }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_pads_to_longest_in_batch() {
        let batcher = ReviewBatcher::<NdArray>::new(Default::default(), 0);
        let batch = batcher.batch(vec![
            ReviewSample { input_ids: vec![5, 9, 2], label: 1 },
            ReviewSample { input_ids: vec![7, 3, 8, 4, 6], label: 0 },
        ]);

        assert_eq!(batch.input_ids.dims(), [2, 5]);
        assert_eq!(batch.attention_mask.dims(), [2, 5]);
        assert_eq!(batch.labels.dims(), [2]);

        let mask: Vec<i64> = batch.attention_mask.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(mask, vec![1, 1, 1, 0, 0, 1, 1, 1, 1, 1]);

        let ids: Vec<i64> = batch.input_ids.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(&ids[..5], &[5, 9, 2, 0, 0]);
    }

    #[test]
    fn test_uses_configured_pad_id() {
        let batcher = ReviewBatcher::<NdArray>::new(Default::default(), 3);
        let batch = batcher.batch(vec![
            ReviewSample { input_ids: vec![10], label: 0 },
            ReviewSample { input_ids: vec![11, 12], label: 1 },
        ]);
        let ids: Vec<i64> = batch.input_ids.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(ids, vec![10, 3, 11, 12]);
    }
}
