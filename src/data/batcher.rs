// ============================================================
// Layer 4 — Pair Batcher (variable-length collation)
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<ClaimGroup> into
// tensors the scoring model can consume.
//
// How batching works here:
//   Input:  batch_size ClaimGroups, each holding data_batch_size
//           (claim, evidence, label) pairs of varying lengths
//   Output: PairBatch with N = batch_size × data_batch_size rows
//
//   claims    [N, feature_dim, Lc]   Lc = longest claim in the batch
//   evidences [N, feature_dim, Le]   Le = longest evidence in the batch
//   labels    [N]
//
// Sequences are NOT pre-padded: each batch is padded to its own
// maximum, so a batch of short claims stays small. Features are
// laid out channel-first because Conv1d convolves over the last
// dimension.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::ClaimGroup;
use crate::domain::features::FeatureSequence;

/// A collated batch of claim/evidence pairs.
#[derive(Debug, Clone)]
pub struct PairBatch<B: Backend> {
    /// Claim features — shape: [pairs, feature_dim, claim_len]
    pub claims: Tensor<B, 3>,

    /// Evidence features — shape: [pairs, feature_dim, evidence_len]
    pub evidences: Tensor<B, 3>,

    /// Binary relevance labels — shape: [pairs]
    pub labels: Tensor<B, 1, Int>,
}

impl<B: Backend> PairBatch<B> {
    #[cfg(test)]
    pub fn pair_count(&self) -> usize {
        self.labels.dims()[0]
    }
}

#[derive(Clone, Debug)]
pub struct PairBatcher<B: Backend> {
    pub device:      B::Device,
    pub feature_dim: usize,
}

impl<B: Backend> PairBatcher<B> {
    pub fn new(device: B::Device, feature_dim: usize) -> Self {
        Self { device, feature_dim }
    }

    /// Scatter sequences into a zero-padded [N, feature_dim, max_len] tensor.
    fn dense<'a>(&self, seqs: impl Iterator<Item = &'a FeatureSequence> + Clone) -> Tensor<B, 3> {
        let n       = seqs.clone().count();
        // Conv1d needs at least one position even for empty texts
        let max_len = seqs.clone().map(|s| s.len).max().unwrap_or(0).max(1);
        let f       = self.feature_dim;

        let mut buf = vec![0.0f32; n * f * max_len];
        for (row, seq) in seqs.enumerate() {
            for e in &seq.entries {
                buf[(row * f + e.feature()) * max_len + e.position()] += e.value();
            }
        }

        Tensor::<B, 1>::from_floats(buf.as_slice(), &self.device).reshape([n, f, max_len])
    }
}

impl<B: Backend> Batcher<ClaimGroup, PairBatch<B>> for PairBatcher<B> {
    fn batch(&self, items: Vec<ClaimGroup>) -> PairBatch<B> {
        let pairs: Vec<_> = items.iter().flat_map(|g| g.pairs.iter()).collect();

        let claims    = self.dense(pairs.iter().map(|p| p.claim.as_ref()));
        let evidences = self.dense(pairs.iter().map(|p| &p.evidence));

        let labels: Vec<i32> = pairs.iter().map(|p| p.label as i32).collect();
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        PairBatch { claims, evidences, labels }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::PairSample;
    use crate::domain::features::FeatureEntry;
    use burn::backend::NdArray;
    use std::sync::Arc;

    type TestBackend = NdArray;

    fn pair(claim: &[Vec<u32>], evidence: Vec<FeatureEntry>, label: u8) -> PairSample {
        PairSample {
            claim:    Arc::new(FeatureSequence::from_multi_hot(claim)),
            evidence: FeatureSequence::from_entries(evidence),
            label,
        }
    }

    #[test]
    fn test_pads_to_longest_sequence_in_batch() {
        let batcher = PairBatcher::<TestBackend>::new(Default::default(), 6);
        let groups = vec![
            ClaimGroup { pairs: vec![
                pair(&[vec![1]], vec![FeatureEntry(0, 2, 1.0)], 1),
                pair(&[vec![1]], vec![FeatureEntry(4, 3, 1.0)], 0),
            ] },
            ClaimGroup { pairs: vec![
                pair(&[vec![0], vec![5], vec![2]], vec![FeatureEntry(1, 1, 0.5)], 1),
                pair(&[vec![0], vec![5], vec![2]], vec![], 0),
            ] },
        ];

        let batch = batcher.batch(groups);

        assert_eq!(batch.claims.dims(),    [4, 6, 3]);
        assert_eq!(batch.evidences.dims(), [4, 6, 5]);
        assert_eq!(batch.pair_count(), 4);

        let labels = batch.labels.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(labels, vec![1, 0, 1, 0]);
    }

    #[test]
    fn test_scatters_feature_values() {
        let batcher = PairBatcher::<TestBackend>::new(Default::default(), 4);
        let groups  = vec![ClaimGroup { pairs: vec![
            pair(&[vec![3], vec![1]], vec![FeatureEntry(0, 2, 0.5), FeatureEntry(0, 2, 0.25)], 1),
        ] }];

        let batch  = batcher.batch(groups);
        let claims = batch.claims.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        // Layout [pair, feature, position] with feature_dim 4, len 2
        let at = |feature: usize, pos: usize| claims[feature * 2 + pos];
        assert_eq!(at(3, 0), 1.0);
        assert_eq!(at(1, 1), 1.0);
        assert_eq!(claims.iter().sum::<f32>(), 2.0);

        let evidences = batch.evidences.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        // Duplicate cells accumulate
        assert_eq!(evidences[2], 0.75);
    }

    #[test]
    fn test_empty_sequences_get_one_position() {
        let batcher = PairBatcher::<TestBackend>::new(Default::default(), 3);
        let groups  = vec![ClaimGroup { pairs: vec![pair(&[], vec![], 0)] }];

        let batch = batcher.batch(groups);
        assert_eq!(batch.claims.dims(),    [1, 3, 1]);
        assert_eq!(batch.evidences.dims(), [1, 3, 1]);
    }
}
