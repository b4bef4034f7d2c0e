// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to run one training job.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow and its configuration
pub mod train_use_case;
