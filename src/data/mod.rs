// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from JSON inputs on disk to tensor batches.
//
//   train.json / evidence.json / claims dict
//       │
//       ▼
//   CorpusLoader      → reads and deserialises the inputs
//       │
//       ▼
//   split_train_val   → ordered 80/20 split of the claims
//       │
//       ▼
//   ClaimDataset      → one claim = data_batch_size pairs
//       │
//       ▼
//   PairBatcher       → pads and stacks pairs into tensors
//       │
//       ▼
//   BatchSource       → a fresh pass of batches per phase
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads train.json, evidence.json and the claims dictionary
pub mod loader;

/// Ordered train/validation split
pub mod splitter;

/// Implements Burn's Dataset trait for claim groups
pub mod dataset;

/// Implements Burn's Batcher trait for variable-length pairs
pub mod batcher;

/// Lazily yields the batches of one phase
pub mod producer;
