// ============================================================
// Layer 1 — CLI Arguments
// ============================================================
// Every training flag and its default. The flags sit directly on
// the binary (no subcommand), so
//
//   clsm-trainer --batch-size 2 --sparse-evidences
//
// starts a run.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for bad values
//   - type conversion (string → usize, f64, enum)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, ValueEnum};

use crate::application::train_use_case::{DeviceKind, RuntimeConfig, TrainConfig};

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Number of claims per batch
    #[arg(long, default_value_t = 1)]
    pub batch_size: usize,

    /// Number of (claim, evidence) pairs drawn for each claim
    #[arg(long, default_value_t = 8)]
    pub data_batch_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Number of full passes through the training claims
    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    /// Directory containing train.json (and evidence.json)
    #[arg(long, default_value = "data/large/train.pkl")]
    pub data: String,

    /// Evidences are row indices into <data>/evidence.json
    #[arg(long)]
    pub sparse_evidences: bool,

    /// Claim id → feature sequence dictionary
    #[arg(long, default_value = "new_claims_dict.json")]
    pub claims_dict: String,

    /// Where checkpoints and train_config.json are written
    #[arg(long, default_value = "models")]
    pub models_dir: String,

    /// Root of the per-run experiment logs
    #[arg(long, default_value = "logs")]
    pub logs_dir: String,

    /// Size of the feature vocabulary
    #[arg(long, default_value_t = 30000)]
    pub feature_dim: usize,

    #[arg(long, default_value_t = 300)]
    pub conv_dim: usize,

    #[arg(long, default_value_t = 128)]
    pub semantic_dim: usize,

    /// Convolution window; must be odd
    #[arg(long, default_value_t = 3)]
    pub window: usize,

    #[arg(long, value_enum, default_value_t = DeviceArg::Wgpu)]
    pub device: DeviceArg,

    /// Data loader worker threads; use 1 for reproducible runs
    #[arg(long, default_value_t = 5)]
    pub num_workers: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceArg {
    Wgpu,
    Cpu,
}

impl From<DeviceArg> for DeviceKind {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Wgpu => DeviceKind::Wgpu,
            DeviceArg::Cpu  => DeviceKind::Cpu,
        }
    }
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            batch_size:       a.batch_size,
            data_batch_size:  a.data_batch_size,
            learning_rate:    a.learning_rate,
            epochs:           a.epochs,
            data:             a.data,
            sparse_evidences: a.sparse_evidences,
            claims_dict:      a.claims_dict,
            models_dir:       a.models_dir,
            logs_dir:         a.logs_dir,
            feature_dim:      a.feature_dim,
            conv_dim:         a.conv_dim,
            semantic_dim:     a.semantic_dim,
            window:           a.window,
            runtime: RuntimeConfig {
                device:      a.device.into(),
                num_workers: a.num_workers,
                seed:        a.seed,
            },
        }
    }
}
