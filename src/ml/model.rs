// ============================================================
// Layer 5 — CLSM Scoring Model
// ============================================================
// Convolutional Latent Semantic Model (Shen et al., 2014):
//
//   features [N, F, L]
//       │ Conv1d(F → conv_dim, window, same padding) + tanh
//       ▼
//   local features [N, conv_dim, L]
//       │ max-pool over positions
//       ▼
//   global feature [N, conv_dim]
//       │ Linear(conv_dim → semantic_dim) + tanh
//       ▼
//   semantic vector [N, semantic_dim]
//
// Claims and evidences use separate encoders. Relevance is the
// cosine similarity of the two semantic vectors, mapped to a
// logit by a learned scale and bias.
//
// The training loop only sees the RelevanceModel trait, so any
// other scorer can be dropped in.

use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        Linear, LinearConfig, PaddingConfig1d,
    },
    prelude::*,
    tensor::activation,
};

const COSINE_EPS: f64 = 1e-8;

/// Anything that scores (claim, evidence) pairs with one logit per pair.
pub trait RelevanceModel<B: Backend> {
    /// claims [N, F, Lc], evidences [N, F, Le] → logits [N, 1]
    fn forward(&self, claims: Tensor<B, 3>, evidences: Tensor<B, 3>) -> Tensor<B, 2>;
}

#[derive(Config, Debug)]
pub struct ClsmConfig {
    /// Size of the feature vocabulary (letter-trigram ids)
    pub feature_dim: usize,
    #[config(default = 300)]
    pub conv_dim: usize,
    #[config(default = 128)]
    pub semantic_dim: usize,
    /// Convolution window in positions; must be odd
    #[config(default = 3)]
    pub window: usize,
}

impl ClsmConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ClsmModel<B> {
        ClsmModel {
            claim_encoder:    self.build_encoder(device),
            evidence_encoder: self.build_encoder(device),
            score:            LinearConfig::new(1, 1).init(device),
        }
    }

    fn build_encoder<B: Backend>(&self, device: &B::Device) -> SemanticEncoder<B> {
        let conv = Conv1dConfig::new(self.feature_dim, self.conv_dim, self.window)
            .with_padding(PaddingConfig1d::Explicit(self.window / 2))
            .init(device);
        let semantic = LinearConfig::new(self.conv_dim, self.semantic_dim).init(device);
        SemanticEncoder { conv, semantic }
    }
}

#[derive(Module, Debug)]
pub struct SemanticEncoder<B: Backend> {
    pub conv:     Conv1d<B>,
    pub semantic: Linear<B>,
}

impl<B: Backend> SemanticEncoder<B> {
    /// [N, F, L] → [N, semantic_dim]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let local = activation::tanh(self.conv.forward(x)); // [N, C, L]
        let [n, c, _] = local.dims();
        let global = local.max_dim(2).reshape([n, c]);
        activation::tanh(self.semantic.forward(global))
    }
}

#[derive(Module, Debug)]
pub struct ClsmModel<B: Backend> {
    pub claim_encoder:    SemanticEncoder<B>,
    pub evidence_encoder: SemanticEncoder<B>,
    pub score:            Linear<B>,
}

impl<B: Backend> RelevanceModel<B> for ClsmModel<B> {
    fn forward(&self, claims: Tensor<B, 3>, evidences: Tensor<B, 3>) -> Tensor<B, 2> {
        let q = self.claim_encoder.forward(claims);
        let d = self.evidence_encoder.forward(evidences);
        self.score.forward(cosine_similarity(q, d))
    }
}

/// Row-wise cosine similarity: [N, D] × [N, D] → [N, 1]
pub fn cosine_similarity<B: Backend>(a: Tensor<B, 2>, b: Tensor<B, 2>) -> Tensor<B, 2> {
    let dot    = (a.clone() * b.clone()).sum_dim(1);
    let norm_a = (a.clone() * a).sum_dim(1).sqrt();
    let norm_b = (b.clone() * b).sum_dim(1).sqrt();
    dot / (norm_a * norm_b).clamp_min(COSINE_EPS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::test_support::backend_rng_lock;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_forward_shapes() {
        let _rng   = backend_rng_lock();
        let device = Default::default();
        let model: ClsmModel<TestBackend> = ClsmConfig::new(10)
            .with_conv_dim(6)
            .with_semantic_dim(4)
            .init(&device);

        let claims    = Tensor::<TestBackend, 3>::ones([5, 10, 3], &device);
        let evidences = Tensor::<TestBackend, 3>::ones([5, 10, 7], &device);

        let logits = model.forward(claims, evidences);
        assert_eq!(logits.dims(), [5, 1]);
    }

    #[test]
    fn test_single_position_inputs() {
        let _rng   = backend_rng_lock();
        let device = Default::default();
        let model: ClsmModel<TestBackend> = ClsmConfig::new(4)
            .with_conv_dim(3)
            .with_semantic_dim(2)
            .init(&device);

        let x = Tensor::<TestBackend, 3>::zeros([2, 4, 1], &device);
        assert_eq!(model.forward(x.clone(), x).dims(), [2, 1]);
    }

    #[test]
    fn test_cosine_similarity() {
        let device = Default::default();
        let a = Tensor::<TestBackend, 2>::from_floats([[1.0, 0.0], [1.0, 1.0], [0.0, 0.0]], &device);
        let b = Tensor::<TestBackend, 2>::from_floats([[2.0, 0.0], [-1.0, -1.0], [1.0, 0.0]], &device);

        let sim = cosine_similarity(a, b).into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert!((sim[0] - 1.0).abs() < 1e-5);
        assert!((sim[1] + 1.0).abs() < 1e-5);
        // Zero vectors do not divide by zero
        assert_eq!(sim[2], 0.0);
    }
}
