// ============================================================
// Layer 4 — Claim Dataset
// ============================================================
// Implements Burn's Dataset trait over claim examples.
//
// One dataset item = one claim, already expanded into exactly
// `data_batch_size` (claim, evidence, label) sub-examples. The
// DataLoader's `batch_size` then groups `batch_size` claims, so a
// collated batch holds batch_size × data_batch_size pairs.
//
// Sub-example selection for a claim with n candidates:
//   n >= data_batch_size → sample data_batch_size distinct candidates
//   n <  data_batch_size → all n, topped up with random repeats
// The RNG is seeded from (seed, item index), so get(i) is a pure
// function of the dataset and can run on any loader worker.
//
// Everything that could go wrong (unknown claim, bad sparse row,
// feature id out of range) is checked once in `new`, before any
// training starts.

use anyhow::{bail, ensure, Result};
use burn::data::dataset::Dataset;
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};
use std::sync::Arc;

use crate::data::loader::{ClaimsDict, SparseEvidenceMatrix};
use crate::domain::{
    example::{ClaimExample, EvidenceRef},
    features::FeatureSequence,
};

/// One (claim, evidence, label) pair.
#[derive(Debug, Clone)]
pub struct PairSample {
    pub claim:    Arc<FeatureSequence>,
    pub evidence: FeatureSequence,
    pub label:    u8,
}

/// The `data_batch_size` pairs drawn for one claim.
#[derive(Debug, Clone)]
pub struct ClaimGroup {
    pub pairs: Vec<PairSample>,
}

#[derive(Debug, Clone, Copy)]
pub struct DatasetOptions {
    pub data_batch_size: usize,
    pub feature_dim:     usize,
    pub seed:            u64,
}

pub struct ClaimDataset {
    examples: Vec<ClaimExample>,
    claims:   Vec<Arc<FeatureSequence>>,
    sparse:   Option<Arc<SparseEvidenceMatrix>>,
    options:  DatasetOptions,
}

impl ClaimDataset {
    pub fn new(
        examples: Vec<ClaimExample>,
        claims_dict: &ClaimsDict,
        sparse: Option<Arc<SparseEvidenceMatrix>>,
        options: DatasetOptions,
    ) -> Result<Self> {
        ensure!(options.data_batch_size > 0, "data batch size must be at least 1");

        if let Some(matrix) = &sparse {
            check_sparse_matrix(matrix, options.feature_dim)?;
        }

        let mut claims = Vec::with_capacity(examples.len());
        for ex in &examples {
            let Some(words) = claims_dict.get(&ex.claim_id) else {
                bail!("claim '{}' is not in the claims dictionary", ex.claim_id);
            };
            let claim = FeatureSequence::from_multi_hot(words);
            check_features(&claim, options.feature_dim, &ex.claim_id)?;

            ensure!(!ex.evidences.is_empty(), "claim '{}' has no candidate evidences", ex.claim_id);
            for cand in &ex.evidences {
                ensure!(
                    cand.label <= 1,
                    "claim '{}' has non-binary label {}",
                    ex.claim_id,
                    cand.label
                );
                check_candidate(&cand.evidence, sparse.as_deref(), options.feature_dim, &ex.claim_id)?;
            }

            claims.push(Arc::new(claim));
        }

        Ok(Self { examples, claims, sparse, options })
    }

    pub fn claim_count(&self) -> usize {
        self.examples.len()
    }

    pub fn data_batch_size(&self) -> usize {
        self.options.data_batch_size
    }

    fn resolve(&self, evidence: &EvidenceRef) -> FeatureSequence {
        match (evidence, &self.sparse) {
            (EvidenceRef::Dense(words), _) => FeatureSequence::from_multi_hot(words),
            // Rows were bounds-checked in `new`
            (EvidenceRef::Row(row), Some(matrix)) => matrix.sequence(*row).unwrap_or_default(),
            (EvidenceRef::Row(_), None) => FeatureSequence::default(),
        }
    }
}

impl Dataset<ClaimGroup> for ClaimDataset {
    fn get(&self, index: usize) -> Option<ClaimGroup> {
        let example = self.examples.get(index)?;
        let claim   = self.claims.get(index)?;

        let mut rng = StdRng::seed_from_u64(self.options.seed.wrapping_add(index as u64));
        let picks   = select_candidates(example.evidences.len(), self.options.data_batch_size, &mut rng);

        let pairs = picks
            .into_iter()
            .map(|i| {
                let cand = &example.evidences[i];
                PairSample {
                    claim:    Arc::clone(claim),
                    evidence: self.resolve(&cand.evidence),
                    label:    cand.label,
                }
            })
            .collect();

        Some(ClaimGroup { pairs })
    }

    fn len(&self) -> usize {
        self.examples.len()
    }
}

/// Indices of the candidates used for one claim; always `wanted` long.
pub fn select_candidates<R: Rng>(available: usize, wanted: usize, rng: &mut R) -> Vec<usize> {
    if available == 0 {
        return Vec::new();
    }
    if available >= wanted {
        return index::sample(rng, available, wanted).into_vec();
    }
    let mut picks: Vec<usize> = (0..available).collect();
    picks.extend((available..wanted).map(|_| rng.gen_range(0..available)));
    picks
}

fn check_features(seq: &FeatureSequence, feature_dim: usize, claim_id: &str) -> Result<()> {
    if let Some(max) = seq.max_feature() {
        ensure!(
            max < feature_dim,
            "claim '{}': feature id {} is outside feature_dim {}",
            claim_id,
            max,
            feature_dim
        );
    }
    Ok(())
}

fn check_candidate(
    evidence: &EvidenceRef,
    sparse: Option<&SparseEvidenceMatrix>,
    feature_dim: usize,
    claim_id: &str,
) -> Result<()> {
    match (evidence, sparse) {
        (EvidenceRef::Row(row), Some(matrix)) => {
            ensure!(
                *row < matrix.row_count(),
                "claim '{}': evidence row {} is outside the sparse matrix ({} rows)",
                claim_id,
                row,
                matrix.row_count()
            );
            Ok(())
        }
        (EvidenceRef::Row(_), None) => {
            bail!("claim '{}' references a sparse evidence row but --sparse-evidences is off", claim_id)
        }
        (EvidenceRef::Dense(_), Some(_)) => {
            bail!("claim '{}' has inline evidence but --sparse-evidences is on", claim_id)
        }
        (EvidenceRef::Dense(words), None) => {
            check_features(&FeatureSequence::from_multi_hot(words), feature_dim, claim_id)
        }
    }
}

fn check_sparse_matrix(matrix: &SparseEvidenceMatrix, feature_dim: usize) -> Result<()> {
    ensure!(
        matrix.feature_dim <= feature_dim,
        "sparse evidences use feature_dim {} but the model expects {}",
        matrix.feature_dim,
        feature_dim
    );
    let max = matrix.rows.iter().flatten().map(|e| e.feature()).max();
    if let Some(max) = max {
        ensure!(max < feature_dim, "sparse evidence feature id {} is outside feature_dim {}", max, feature_dim);
    }
    Ok(())
}
