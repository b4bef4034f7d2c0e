// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training loop reports to a MetricsSink instead of a
// concrete logger, so the same loop can write to disk during a
// real run and into a Vec during tests.
//
//   - ExperimentLogger → logs/<run>/params.json, scalars.csv,
//                        histograms.csv, epochs.csv
//   - (tests) an in-memory sink that records every call
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use serde::{Deserialize, Serialize};

// ─── EpochMetrics ─────────────────────────────────────────────────────────────
/// Summary of one finished epoch (training + validation phase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Zero-based epoch index
    pub epoch: usize,

    /// Mean of the per-batch training losses
    pub train_loss: f64,

    /// Mean of the per-batch training accuracies; this is the
    /// value the checkpoint policy compares against its best
    pub train_accuracy: f64,

    pub val_loss: f64,
    pub val_accuracy: f64,

    /// Whether a new best checkpoint was written this epoch
    pub saved: bool,
}

// ─── MetricsSink ──────────────────────────────────────────────────────────────
/// Anything that can record a run's hyperparameters and metrics.
pub trait MetricsSink {
    /// Record the hyperparameters of the run, once, before training.
    fn log_params(&mut self, params: &[(&'static str, String)]) -> Result<()>;

    /// Record one scalar summary (e.g. `val_loss`) at a batch step.
    fn log_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()>;

    /// Record the distribution of one tensor's values (e.g. a model
    /// parameter or its gradient) at a batch step.
    fn log_histogram(&mut self, tag: &str, values: &[f32], step: usize) -> Result<()>;

    /// Record the end-of-epoch summary.
    fn log_epoch(&mut self, metrics: &EpochMetrics) -> Result<()>;
}
