// ============================================================
// Layer 6 — Checkpoints
// ============================================================
// Three pieces:
//
//   CheckpointPolicy  — decides, once per epoch, whether the
//                       epoch's mean training accuracy is a new
//                       best (>= every previous epoch)
//   NamingScheme      — turns the run's hyperparameters and the
//                       accuracy into a checkpoint directory name
//   CheckpointManager — writes the weights (Burn CompactRecorder)
//                       and a small JSON sidecar
//
// Policy states:
//
//   NoBestYet ──(acc >= 0.0)──▶ HasBest{epoch, acc}
//   HasBest   ──(acc >= best)─▶ HasBest{epoch', acc'}   save
//   HasBest   ──(acc <  best)─▶ HasBest (unchanged)     skip
//
// Layout of one saved best:
//   models/
//     train_config.json
//     saved_model_batch_size-1_..._sparse_evidences-False_accuracy_0.8/
//       model.mpk        ← weights
//       checkpoint.json  ← {naming_version, epoch, best_accuracy}
//
// The hyperparameter string lives in the directory name, not the
// file name: values such as "0.001" contain dots that the
// recorder's extension handling would otherwise cut off.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::run_parameters::RunParameters;

const MODEL_FILE: &str = "model";
const META_FILE:  &str = "checkpoint.json";
const CONFIG_FILE: &str = "train_config.json";

// ─── Policy ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestCheckpoint {
    pub epoch:    usize,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckpointState {
    NoBestYet,
    HasBest(BestCheckpoint),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckpointDecision {
    /// New best: persist it
    Save(BestCheckpoint),
    /// No improvement; carries the best accuracy so far
    Skip { best_accuracy: f64 },
}

#[derive(Debug, Clone)]
pub struct CheckpointPolicy {
    state: CheckpointState,
}

impl CheckpointPolicy {
    pub fn new() -> Self {
        Self { state: CheckpointState::NoBestYet }
    }

    #[cfg(test)]
    pub fn state(&self) -> CheckpointState {
        self.state
    }

    /// 0.0 until the first checkpoint is taken.
    pub fn best_accuracy(&self) -> f64 {
        match self.state {
            CheckpointState::NoBestYet   => 0.0,
            CheckpointState::HasBest(b)  => b.accuracy,
        }
    }

    /// Feed one epoch's mean training accuracy.
    /// Ties count as improvements; NaN never does.
    pub fn observe(&mut self, epoch: usize, train_accuracy: f64) -> CheckpointDecision {
        if train_accuracy >= self.best_accuracy() {
            let best = BestCheckpoint { epoch, accuracy: train_accuracy };
            self.state = CheckpointState::HasBest(best);
            CheckpointDecision::Save(best)
        } else {
            CheckpointDecision::Skip { best_accuracy: self.best_accuracy() }
        }
    }
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Naming ───────────────────────────────────────────────────────────────────

/// Versioned checkpoint naming. A new variant must be added
/// instead of changing an existing one, so old names stay parseable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamingScheme {
    /// `saved_model_<key>-<value>..._accuracy_<acc>`; spaces in keys
    /// become `_`, slashes in values become `-`, booleans are
    /// `True` / `False`.
    V1,
}

impl NamingScheme {
    pub const CURRENT: NamingScheme = NamingScheme::V1;

    pub fn version(&self) -> u32 {
        match self {
            NamingScheme::V1 => 1,
        }
    }

    pub fn checkpoint_name(&self, params: &RunParameters, accuracy: f64) -> String {
        match self {
            NamingScheme::V1 => {
                let mut name = String::from("saved_model");
                for (key, value) in params.entries() {
                    name.push('_');
                    name.push_str(&key.replace(' ', "_"));
                    name.push('-');
                    name.push_str(&value.replace('/', "-"));
                }
                name.push_str(&format!("_accuracy_{accuracy}"));
                name
            }
        }
    }
}

// ─── Manager ──────────────────────────────────────────────────────────────────

/// Sidecar written next to the weights of every saved best.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub naming_version: u32,
    pub epoch:          usize,
    pub best_accuracy:  f64,
}

pub struct CheckpointManager {
    dir:    PathBuf,
    scheme: NamingScheme,
}

impl CheckpointManager {
    /// Creates the models directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create models directory '{}'", dir.display()))?;
        Ok(Self { dir, scheme: NamingScheme::CURRENT })
    }

    /// Persist a new best: weights via CompactRecorder plus checkpoint.json.
    /// Returns the checkpoint directory.
    pub fn save_best<B: Backend, M: Module<B>>(
        &self,
        model:  &M,
        best:   &BestCheckpoint,
        params: &RunParameters,
    ) -> Result<PathBuf> {
        let ckpt_dir = self.dir.join(self.scheme.checkpoint_name(params, best.accuracy));
        fs::create_dir_all(&ckpt_dir)
            .with_context(|| format!("Cannot create '{}'", ckpt_dir.display()))?;

        let weights = ckpt_dir.join(MODEL_FILE);
        CompactRecorder::new()
            .record(model.clone().into_record(), weights.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", weights.display()))?;

        let meta = CheckpointMeta {
            naming_version: self.scheme.version(),
            epoch:          best.epoch,
            best_accuracy:  best.accuracy,
        };
        let meta_path = ckpt_dir.join(META_FILE);
        fs::write(&meta_path, serde_json::to_string_pretty(&meta)?)
            .with_context(|| format!("Cannot write '{}'", meta_path.display()))?;

        tracing::debug!("Saved checkpoint: epoch {} → '{}'", best.epoch, ckpt_dir.display());
        Ok(ckpt_dir)
    }

    /// Read the sidecar of a saved checkpoint directory.
    #[cfg(test)]
    pub fn load_meta(&self, ckpt_dir: &std::path::Path) -> Result<CheckpointMeta> {
        let path = ckpt_dir.join(META_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save the run configuration before training starts.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }
}
