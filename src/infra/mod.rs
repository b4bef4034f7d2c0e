// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
//   checkpoint.rs — best-accuracy policy, versioned checkpoint
//                   names, CompactRecorder weights plus JSON
//                   sidecar, and the saved TrainConfig
//
//   metrics.rs    — file-backed MetricsSink: hyperparameters,
//                   window scalars and epoch summaries per run
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint policy and persistence
pub mod checkpoint;

/// Experiment log writer
pub mod metrics;
