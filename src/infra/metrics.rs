// ============================================================
// Layer 6 — Experiment Logger
// ============================================================
// File-backed MetricsSink. One directory per run:
//
//   logs/<unix-seconds>/
//     params.json   — hyperparameter record, written once
//     scalars.csv   — tag,step,value   (window reports)
//     histograms.csv — tag,step,count,min,max,buckets
//     epochs.csv    — one row per finished epoch
//
// Example scalars.csv:
//   tag,step,value
//   train_loss,101,0.693147
//   train_accuracy,101,0.512500
//   val_loss,21,0.688012
//
// Histogram rows split [min, max] into HISTOGRAM_BINS equal buckets;
// `buckets` holds the space-separated counts. Non-finite values are
// left out of every column.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::domain::traits::{EpochMetrics, MetricsSink};

pub const HISTOGRAM_BINS: usize = 30;

/// Bucket counts of a set of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub count:   usize,
    pub min:     f32,
    pub max:     f32,
    pub buckets: Vec<usize>,
}

impl Histogram {
    pub fn from_values(values: &[f32], bins: usize) -> Self {
        let bins = bins.max(1);
        let finite = || values.iter().copied().filter(|v| v.is_finite());

        let count = finite().count();
        if count == 0 {
            return Self { count, min: 0.0, max: 0.0, buckets: vec![0; bins] };
        }
        let min = finite().fold(f32::INFINITY, f32::min);
        let max = finite().fold(f32::NEG_INFINITY, f32::max);

        let mut buckets = vec![0; bins];
        let width = (max - min) / bins as f32;
        for v in finite() {
            let idx = if width > 0.0 { ((v - min) / width) as usize } else { 0 };
            buckets[idx.min(bins - 1)] += 1;
        }
        Self { count, min, max, buckets }
    }
}

pub struct ExperimentLogger {
    dir: PathBuf,
}

impl ExperimentLogger {
    /// Create `<root>/<unix-seconds>/` for this run.
    pub fn for_new_run(root: impl AsRef<Path>) -> Result<Self> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self::new(root.as_ref().join(stamp.to_string()))
    }

    /// Use `dir` as the run directory; CSV headers are written if
    /// the files are new so a directory can be appended to.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create log directory '{}'", dir.display()))?;

        write_header(&dir.join("scalars.csv"), "tag,step,value")?;
        write_header(&dir.join("histograms.csv"), "tag,step,count,min,max,buckets")?;
        write_header(
            &dir.join("epochs.csv"),
            "epoch,train_loss,train_accuracy,val_loss,val_accuracy,saved",
        )?;

        tracing::debug!("Experiment log: '{}'", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn append(&self, file: &str, line: std::fmt::Arguments<'_>) -> Result<()> {
        let path  = self.dir.join(file);
        let mut f = OpenOptions::new()
            .append(true)
            .open(&path)
            .with_context(|| format!("Cannot open '{}'", path.display()))?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

fn write_header(path: &Path, header: &str) -> Result<()> {
    if !path.exists() {
        let mut f = File::create(path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        writeln!(f, "{header}")?;
    }
    Ok(())
}

impl MetricsSink for ExperimentLogger {
    fn log_params(&mut self, params: &[(&'static str, String)]) -> Result<()> {
        let record: BTreeMap<&str, &str> = params
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        let path = self.dir.join("params.json");
        fs::write(&path, serde_json::to_string_pretty(&record)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        Ok(())
    }

    fn log_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        self.append("scalars.csv", format_args!("{tag},{step},{value:.6}"))
    }

    fn log_histogram(&mut self, tag: &str, values: &[f32], step: usize) -> Result<()> {
        let h = Histogram::from_values(values, HISTOGRAM_BINS);
        let buckets = h
            .buckets
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.append(
            "histograms.csv",
            format_args!("{tag},{step},{},{:.6},{:.6},{buckets}", h.count, h.min, h.max),
        )
    }

    fn log_epoch(&mut self, m: &EpochMetrics) -> Result<()> {
        self.append(
            "epochs.csv",
            format_args!(
                "{},{:.6},{:.6},{:.6},{:.6},{}",
                m.epoch, m.train_loss, m.train_accuracy, m.val_loss, m.val_accuracy, m.saved,
            ),
        )?;
        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_params_scalars_and_epochs() {
        let dir        = tempfile::tempdir().unwrap();
        let mut logger = ExperimentLogger::new(dir.path().join("run")).unwrap();

        logger.log_params(&[("batch size", "1".into()), ("data", "data/large".into())]).unwrap();
        logger.log_scalar("val_loss", 0.5, 21).unwrap();
        logger
            .log_epoch(&EpochMetrics {
                epoch: 0,
                train_loss: 0.7,
                train_accuracy: 0.8,
                val_loss: 0.6,
                val_accuracy: 0.75,
                saved: true,
            })
            .unwrap();

        let params: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(logger.dir().join("params.json")).unwrap()).unwrap();
        assert_eq!(params["batch size"], "1");

        let scalars = fs::read_to_string(logger.dir().join("scalars.csv")).unwrap();
        assert_eq!(scalars, "tag,step,value\nval_loss,21,0.500000\n");

        let epochs = fs::read_to_string(logger.dir().join("epochs.csv")).unwrap();
        assert!(epochs.ends_with("0,0.700000,0.800000,0.600000,0.750000,true\n"));
    }

    #[test]
    fn test_histogram_buckets() {
        let h = Histogram::from_values(&[0.0, 0.1, 0.5, 1.0, f32::NAN], 4);
        assert_eq!(h.count, 4);
        assert_eq!((h.min, h.max), (0.0, 1.0));
        // The maximum falls into the last bucket
        assert_eq!(h.buckets, vec![2, 0, 1, 1]);

        let flat = Histogram::from_values(&[2.0, 2.0], 3);
        assert_eq!(flat.buckets, vec![2, 0, 0]);

        let empty = Histogram::from_values(&[], 3);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.buckets.iter().sum::<usize>(), 0);
    }

    #[test]
    fn test_writes_histogram_rows() {
        let dir        = tempfile::tempdir().unwrap();
        let mut logger = ExperimentLogger::new(dir.path()).unwrap();
        logger.log_histogram("param0/grad", &[-1.0, 1.0], 4).unwrap();

        let rows = fs::read_to_string(dir.path().join("histograms.csv")).unwrap();
        let row  = rows.lines().nth(1).unwrap();
        assert!(row.starts_with("param0/grad,4,2,-1.000000,1.000000,1 "));
        assert!(row.ends_with(" 1"));
        assert_eq!(row.rsplit(',').next().unwrap().split(' ').count(), HISTOGRAM_BINS);
    }

    #[test]
    fn test_reopening_keeps_single_header() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut logger = ExperimentLogger::new(dir.path()).unwrap();
            logger.log_scalar("train_loss", 1.0, 1).unwrap();
        }
        let mut logger = ExperimentLogger::new(dir.path()).unwrap();
        logger.log_scalar("train_loss", 2.0, 2).unwrap();

        let scalars = fs::read_to_string(dir.path().join("scalars.csv")).unwrap();
        assert_eq!(scalars.matches("tag,step,value").count(), 1);
        assert_eq!(scalars.lines().count(), 3);
    }
}
