// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load claim examples        (Layer 4 - data)
//   Step 2: Load sparse evidences      (Layer 4 - data, optional)
//   Step 3: Load claims dictionary     (Layer 4 - data)
//   Step 4: Split train/validation     (Layer 4 - data)
//   Step 5: Build datasets             (Layer 4 - data)
//   Step 6: Record hyperparameters     (Layer 6 - infra)
//   Step 7: Save config                (Layer 6 - infra)
//   Step 8: Run training loop          (Layer 5 - ml)
//
// Every input is read and validated in steps 1-5, so a missing
// file or a malformed example stops the run before any epoch.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::{
    dataset::{ClaimDataset, DatasetOptions},
    loader::{load_claims_dict, CorpusLoader},
    splitter::{split_train_val, TRAIN_FRACTION},
};
use crate::domain::{
    example::ClaimExample,
    run_parameters::RunParameters,
    traits::{EpochMetrics, MetricsSink},
};
use crate::infra::{checkpoint::CheckpointManager, metrics::ExperimentLogger};
use crate::ml::{
    model::ClsmConfig,
    trainer::{run_training, LOSS_NAME, OPTIMIZER_NAME},
};

// ─── Runtime Configuration ───────────────────────────────────────────────────
// Process-wide settings, fixed once at startup: which device trains,
// how many loader threads collate batches, and the seed every RNG
// in the run is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    /// GPU through burn's WGPU backend
    Wgpu,
    /// CPU through burn's NdArray backend
    Cpu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub device:      DeviceKind,
    pub num_workers: usize,
    pub seed:        u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { device: DeviceKind::Wgpu, num_workers: 5, seed: 42 }
    }
}

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it can be saved next to the checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub batch_size:       usize,
    pub data_batch_size:  usize,
    pub learning_rate:    f64,
    pub epochs:           usize,
    /// Directory holding train.json (and evidence.json)
    pub data:             String,
    pub sparse_evidences: bool,
    pub claims_dict:      String,
    pub models_dir:       String,
    pub logs_dir:         String,
    pub feature_dim:      usize,
    pub conv_dim:         usize,
    pub semantic_dim:     usize,
    pub window:           usize,
    pub runtime:          RuntimeConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            batch_size:       1,
            data_batch_size:  8,
            learning_rate:    1e-3,
            epochs:           3,
            data:             "data/large/train.pkl".to_string(),
            sparse_evidences: false,
            claims_dict:      "new_claims_dict.json".to_string(),
            models_dir:       "models".to_string(),
            logs_dir:         "logs".to_string(),
            feature_dim:      30000,
            conv_dim:         300,
            semantic_dim:     128,
            window:           3,
            runtime:          RuntimeConfig::default(),
        }
    }
}

impl TrainConfig {
    pub fn model_config(&self) -> ClsmConfig {
        ClsmConfig::new(self.feature_dim)
            .with_conv_dim(self.conv_dim)
            .with_semantic_dim(self.semantic_dim)
            .with_window(self.window)
    }

    fn dataset_options(&self) -> DatasetOptions {
        DatasetOptions {
            data_batch_size: self.data_batch_size,
            feature_dim:     self.feature_dim,
            seed:            self.runtime.seed,
        }
    }

    fn run_parameters(&self, training_size: usize) -> RunParameters {
        RunParameters {
            batch_size:       self.batch_size,
            epochs:           self.epochs,
            learning_rate:    self.learning_rate,
            optimizer:        OPTIMIZER_NAME.to_string(),
            loss:             LOSS_NAME.to_string(),
            training_size,
            data_batch_size:  self.data_batch_size,
            data:             self.data.clone(),
            sparse_evidences: self.sparse_evidences,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end.
    /// Returns the metrics of every finished epoch.
    pub fn execute(&self) -> Result<Vec<EpochMetrics>> {
        let cfg = &self.config;

        // ── Step 1: Claim examples ────────────────────────────────────────────
        let corpus   = CorpusLoader::new(&cfg.data);
        let examples = corpus.load_examples()?;
        let positives: usize = examples.iter().map(ClaimExample::positives).sum();
        let row_refs = examples
            .iter()
            .flat_map(|ex| &ex.evidences)
            .filter(|cand| cand.evidence.is_sparse())
            .count();
        tracing::info!("{} relevant candidates, {} sparse row references", positives, row_refs);

        // ── Step 2: Sparse evidences, only in sparse mode ─────────────────────
        let sparse = if cfg.sparse_evidences {
            Some(Arc::new(corpus.load_sparse_evidences()?))
        } else {
            None
        };

        // ── Step 3: Claims dictionary ─────────────────────────────────────────
        let claims_dict = load_claims_dict(&cfg.claims_dict)?;

        // ── Step 4: Train / validation split (80/20, ordered) ─────────────────
        let (train_examples, val_examples) = split_train_val(examples, TRAIN_FRACTION);
        tracing::info!(
            "Split: {} train, {} validation",
            train_examples.len(),
            val_examples.len()
        );

        // ── Step 5: Build Burn datasets ───────────────────────────────────────
        let options       = cfg.dataset_options();
        let train_dataset = ClaimDataset::new(train_examples, &claims_dict, sparse.clone(), options)
            .context("Invalid training examples")?;
        let val_dataset   = ClaimDataset::new(val_examples, &claims_dict, sparse, options)
            .context("Invalid validation examples")?;
        tracing::info!(
            "Each claim expands to {} pairs; {} claims per batch",
            train_dataset.data_batch_size(),
            cfg.batch_size
        );

        // ── Step 6: Record the hyperparameters of this run ────────────────────
        let params     = cfg.run_parameters(train_dataset.claim_count());
        let mut logger = ExperimentLogger::for_new_run(&cfg.logs_dir)?;
        logger.log_params(&params.entries())?;
        tracing::info!("Logging experiment to '{}'", logger.dir().display());

        // ── Step 7: Save config next to the checkpoints ───────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.models_dir)?;
        ckpt_manager.save_config(cfg)?;

        // ── Step 8: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, train_dataset, val_dataset, &params, &ckpt_manager, &mut logger)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{is_not_found, EVIDENCE_FILE, TRAIN_FILE};
    use crate::ml::test_support::backend_rng_lock;
    use std::{fs, path::Path};

    fn write_inputs(dir: &Path, train_json: &str) -> TrainConfig {
        let data = dir.join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join(TRAIN_FILE), train_json).unwrap();
        fs::write(dir.join("claims.json"), r#"{"c1": [[1], [2]], "c2": [[3]]}"#).unwrap();

        TrainConfig {
            data:        data.to_string_lossy().into_owned(),
            claims_dict: dir.join("claims.json").to_string_lossy().into_owned(),
            models_dir:  dir.join("models").to_string_lossy().into_owned(),
            logs_dir:    dir.join("logs").to_string_lossy().into_owned(),
            feature_dim: 8,
            conv_dim:    4,
            semantic_dim: 2,
            runtime: RuntimeConfig { device: DeviceKind::Cpu, num_workers: 1, seed: 3 },
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_sparse_mode_without_evidence_file_fails_before_training() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            sparse_evidences: true,
            ..write_inputs(
                dir.path(),
                r#"[{"claim_id": "c1", "evidences": [{"evidence": 0, "label": 1}]}]"#,
            )
        };
        assert!(!Path::new(&cfg.data).join(EVIDENCE_FILE).exists());

        let err = TrainUseCase::new(cfg.clone()).execute().unwrap_err();
        assert!(is_not_found(&err), "unexpected error: {err:#}");

        // Nothing was logged or saved
        assert!(!Path::new(&cfg.logs_dir).exists());
        assert!(!Path::new(&cfg.models_dir).exists());
    }

    #[test]
    fn test_missing_train_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            data: dir.path().join("nowhere").to_string_lossy().into_owned(),
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(is_not_found(&err));
    }

    const FIVE_CLAIMS: &str = r#"[
        {"claim_id": "c1", "evidences": [{"evidence": [[1], [4]], "label": 1},
                                         {"evidence": [[5]], "label": 0}]},
        {"claim_id": "c2", "evidences": [{"evidence": [[3]], "label": 1}]},
        {"claim_id": "c1", "evidences": [{"evidence": [[6, 7]], "label": 0}]},
        {"claim_id": "c2", "evidences": [{"evidence": [[2]], "label": 1}]},
        {"claim_id": "c1", "evidences": [{"evidence": [[0]], "label": 0}]}
    ]"#;

    #[test]
    fn test_cpu_run_writes_logs_and_checkpoint() {
        let _rng = backend_rng_lock();
        let dir  = tempfile::tempdir().unwrap();
        let cfg  = TrainConfig {
            epochs:          1,
            data_batch_size: 2,
            ..write_inputs(dir.path(), FIVE_CLAIMS)
        };

        let history = TrainUseCase::new(cfg.clone()).execute().unwrap();

        assert_eq!(history.len(), 1);
        assert!((0.0..=1.0).contains(&history[0].train_accuracy));
        // The first epoch always becomes the best checkpoint
        assert!(history[0].saved);

        let models = Path::new(&cfg.models_dir);
        assert!(models.join("train_config.json").exists());
        let checkpoints = fs::read_dir(models)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("saved_model_batch_size-1_"))
            .count();
        assert_eq!(checkpoints, 1);

        let runs: Vec<_> = fs::read_dir(&cfg.logs_dir).unwrap().filter_map(|e| e.ok()).collect();
        assert_eq!(runs.len(), 1);
        let params = fs::read_to_string(runs[0].path().join("params.json")).unwrap();
        assert!(params.contains("\"training size\": \"4\""));
    }

    #[test]
    fn test_same_config_gives_the_same_history() {
        let _rng = backend_rng_lock();
        let dir  = tempfile::tempdir().unwrap();
        let cfg  = TrainConfig {
            epochs:          2,
            data_batch_size: 2,
            ..write_inputs(dir.path(), FIVE_CLAIMS)
        };
        let rerun = TrainConfig {
            models_dir: dir.path().join("models-2").to_string_lossy().into_owned(),
            logs_dir:   dir.path().join("logs-2").to_string_lossy().into_owned(),
            ..cfg.clone()
        };

        let first  = TrainUseCase::new(cfg).execute().unwrap();
        let second = TrainUseCase::new(rerun).execute().unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }
}
