// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The scoring model and the loop that trains it.
//
//   accumulator.rs — windowed and per-phase metric bookkeeping
//                    (plain f64 math, no tensors)
//
//   model.rs       — RelevanceModel trait and the CLSM scorer:
//                    Conv1d → tanh → max-pool → Linear → tanh
//                    per side, cosine similarity, Linear(1→1)
//
//   snapshot.rs    — host copies of parameters and gradients
//                    for histogram summaries
//
//   trainer.rs     — train + validation phases per epoch,
//                    Adam with weight decay, checkpoint policy
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Shen et al. (2014) A Latent Semantic Model with
//            Convolutional-Pooling Structure

/// Loss / accuracy / recall aggregation
pub mod accumulator;

/// Relevance scoring model
pub mod model;

/// Parameter and gradient histograms
pub mod snapshot;

/// Epoch loop with validation and checkpointing
pub mod trainer;
