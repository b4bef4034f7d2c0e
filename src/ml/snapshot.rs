// ============================================================
// Layer 5 — Parameter Snapshots
// ============================================================
// Host copies of a model's float parameters and of their last
// gradients, for histogram summaries.
//
// Burn's ModuleVisitor walks parameters in declaration order but
// does not know their field names, so each tensor is tagged by its
// position in that walk:
//
//   param0, param1, ...            parameter values
//   param0/grad, param1/grad, ...  gradients of the same tensors
//
// The walk order only depends on the module structure, so
// `model.valid()` yields the same tags as the autodiff model.

use anyhow::{anyhow, Result};
use burn::{
    module::{AutodiffModule, ModuleVisitor, ParamId},
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

/// One tensor copied to the host, flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct HostTensor {
    pub tag:    String,
    pub values: Vec<f32>,
}

/// Every float parameter of `model`, in visiting order.
pub fn parameter_values<B: Backend, M: Module<B>>(model: &M) -> Result<Vec<HostTensor>> {
    let mut collector = ValueCollector::default();
    model.visit(&mut collector);
    collector.inner.finish()
}

/// Gradients of `model`'s parameters found in `grads`. Parameters
/// without a gradient are skipped but keep their index.
pub fn gradient_values<B, M>(model: &M, grads: &GradientsParams) -> Result<Vec<HostTensor>>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let mut collector = GradCollector { grads, inner: Collected::default() };
    model.visit(&mut collector);
    collector.inner.finish()
}

fn param_tag(index: usize) -> String {
    format!("param{index}")
}

fn host_values<B: Backend, const D: usize>(t: Tensor<B, D>) -> Result<Vec<f32>> {
    t.into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read parameter data: {e:?}"))
}

// Visitors cannot fail, so the first error is parked until `finish`.
#[derive(Default)]
struct Collected {
    next:  usize,
    out:   Vec<HostTensor>,
    error: Option<anyhow::Error>,
}

impl Collected {
    fn next_index(&mut self) -> usize {
        let index = self.next;
        self.next += 1;
        index
    }

    fn push(&mut self, tag: String, values: Result<Vec<f32>>) {
        match values {
            Ok(values) => self.out.push(HostTensor { tag, values }),
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
    }

    fn finish(self) -> Result<Vec<HostTensor>> {
        match self.error {
            Some(e) => Err(e),
            None    => Ok(self.out),
        }
    }
}

#[derive(Default)]
struct ValueCollector {
    inner: Collected,
}

impl<B: Backend> ModuleVisitor<B> for ValueCollector {
    fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
        let index = self.inner.next_index();
        self.inner.push(param_tag(index), host_values(tensor.clone()));
    }
}

struct GradCollector<'g> {
    grads: &'g GradientsParams,
    inner: Collected,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for GradCollector<'_> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        let index = self.inner.next_index();
        if let Some(grad) = self.grads.get::<B::InnerBackend, D>(id) {
            self.inner.push(format!("{}/grad", param_tag(index)), host_values(grad));
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{
        model::{ClsmConfig, RelevanceModel},
        test_support::backend_rng_lock,
    };
    use burn::backend::{Autodiff, NdArray};

    type TestAutodiff = Autodiff<NdArray>;

    #[test]
    fn test_one_entry_per_parameter_tensor() {
        let _rng   = backend_rng_lock();
        let device = Default::default();
        let model  = ClsmConfig::new(5)
            .with_conv_dim(3)
            .with_semantic_dim(2)
            .init::<NdArray>(&device);

        let params = parameter_values(&model).unwrap();
        // Two encoders × (conv weight, conv bias, linear weight, linear bias)
        // plus the score layer's weight and bias
        assert_eq!(params.len(), 10);
        assert_eq!(params[0].tag, "param0");
        assert_eq!(params.iter().map(|p| p.values.len()).sum::<usize>(), model.num_params());
    }

    #[test]
    fn test_gradients_line_up_with_parameters() {
        let _rng   = backend_rng_lock();
        let device = Default::default();
        let model  = ClsmConfig::new(4)
            .with_conv_dim(2)
            .with_semantic_dim(2)
            .init::<TestAutodiff>(&device);

        let x     = Tensor::<TestAutodiff, 3>::ones([2, 4, 3], &device);
        let loss  = model.forward(x.clone(), x).sum();
        let grads = GradientsParams::from_grads(loss.backward(), &model);

        let values = parameter_values(&model).unwrap();
        let grads  = gradient_values(&model, &grads).unwrap();
        assert_eq!(grads.len(), values.len());
        for (g, v) in grads.iter().zip(&values) {
            assert_eq!(g.tag, format!("{}/grad", v.tag));
            assert_eq!(g.values.len(), v.values.len());
        }
    }
}
