// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits that define what the trainer
// works on. No burn types, no file I/O.
//
//   example.rs        — a claim with its labelled candidate evidences
//   features.rs       — featurised texts (dense or sparse encodings)
//   run_parameters.rs — the hyperparameter record of a run
//   traits.rs         — MetricsSink and the epoch summary it receives
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

pub mod example;

pub mod features;

pub mod run_parameters;

pub mod traits;
