// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses the flags with
// `clap`, validates what the application layer cannot, and hands
// a TrainConfig to Layer 2.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{ensure, Result};
use clap::Parser;
use commands::TrainArgs;

use crate::application::train_use_case::{TrainConfig, TrainUseCase};
use crate::data::loader::is_not_found;

#[derive(Parser, Debug)]
#[command(
    name = "clsm-trainer",
    version = "0.1.0",
    about = "Train a CLSM model to score claim/evidence relevance."
)]
pub struct Cli {
    #[command(flatten)]
    pub args: TrainArgs,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let cfg: TrainConfig = self.args.into();
        check_config(&cfg)?;

        tracing::info!(
            "Starting training on '{}' (sparse evidences: {})",
            cfg.data,
            cfg.sparse_evidences
        );

        let history = TrainUseCase::new(cfg).execute().inspect_err(|err| {
            if is_not_found(err) {
                tracing::error!("An input file is missing; check --data and --claims-dict");
            }
        })?;
        if let Some(best) = history.iter().rev().find(|m| m.saved) {
            println!(
                "Training complete. Best checkpoint: epoch {} (accuracy {})",
                best.epoch, best.train_accuracy
            );
        }
        Ok(())
    }
}

fn check_config(cfg: &TrainConfig) -> Result<()> {
    ensure!(cfg.batch_size > 0, "--batch-size must be at least 1");
    ensure!(cfg.data_batch_size > 0, "--data-batch-size must be at least 1");
    ensure!(cfg.runtime.num_workers > 0, "--num-workers must be at least 1");
    ensure!(cfg.window % 2 == 1, "--window must be odd, got {}", cfg.window);
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::DeviceKind;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["clsm-trainer"]).unwrap();
        let cfg: TrainConfig = cli.args.into();

        assert_eq!(cfg.batch_size, 1);
        assert_eq!(cfg.data_batch_size, 8);
        assert_eq!(cfg.learning_rate, 1e-3);
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.data, "data/large/train.pkl");
        assert!(!cfg.sparse_evidences);
        assert_eq!(cfg.runtime.device, DeviceKind::Wgpu);
        assert_eq!(cfg.runtime.num_workers, 5);
        assert!(check_config(&cfg).is_ok());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "clsm-trainer",
            "--batch-size", "4",
            "--data-batch-size", "2",
            "--learning-rate", "0.01",
            "--epochs", "7",
            "--data", "data/small",
            "--sparse-evidences",
            "--device", "cpu",
            "--seed", "9",
        ])
        .unwrap();
        let cfg: TrainConfig = cli.args.into();

        assert_eq!(cfg.batch_size, 4);
        assert_eq!(cfg.data_batch_size, 2);
        assert_eq!(cfg.learning_rate, 0.01);
        assert_eq!(cfg.epochs, 7);
        assert_eq!(cfg.data, "data/small");
        assert!(cfg.sparse_evidences);
        assert_eq!(cfg.runtime.device, DeviceKind::Cpu);
        assert_eq!(cfg.runtime.seed, 9);
    }

    #[test]
    fn test_rejects_even_window() {
        let cli = Cli::try_parse_from(["clsm-trainer", "--window", "4"]).unwrap();
        assert!(check_config(&cli.args.into()).is_err());
    }
}
