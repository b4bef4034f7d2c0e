// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads the three JSON inputs of a training run:
//
//   <data>/train.json        — Vec<ClaimExample>
//   <data>/evidence.json     — sparse evidence matrix (only with
//                              --sparse-evidences)
//   new_claims_dict.json     — claim id → multi-hot feature sequence
//
// A missing file is fatal: the error keeps the io::Error (kind
// NotFound) in its chain and names the path that was tried, so
// the run stops before any epoch starts.
//
// Reference: Rust Book §9 (Error Handling)
//            serde_json documentation (from_reader)

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::domain::{
    example::ClaimExample,
    features::{FeatureEntry, FeatureSequence, MultiHot},
};

pub const TRAIN_FILE:    &str = "train.json";
pub const EVIDENCE_FILE: &str = "evidence.json";

/// Claim id → featurised claim text.
pub type ClaimsDict = HashMap<String, MultiHot>;

/// Evidence rows stored as (position, feature, value) triplets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparseEvidenceMatrix {
    pub feature_dim: usize,
    pub rows:        Vec<Vec<FeatureEntry>>,
}

impl SparseEvidenceMatrix {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Materialise one row as a FeatureSequence, if the row exists.
    pub fn sequence(&self, row: usize) -> Option<FeatureSequence> {
        self.rows
            .get(row)
            .map(|entries| FeatureSequence::from_entries(entries.clone()))
    }
}

/// Loads the files that live inside the `--data` directory.
pub struct CorpusLoader {
    dir: PathBuf,
}

impl CorpusLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load every claim example from `<dir>/train.json`.
    pub fn load_examples(&self) -> Result<Vec<ClaimExample>> {
        let path = self.dir.join(TRAIN_FILE);
        tracing::info!("Loading {}", path.display());
        let examples: Vec<ClaimExample> = read_json(&path)?;
        tracing::info!("Loaded {} claim examples", examples.len());
        Ok(examples)
    }

    /// Load the sparse evidence matrix from `<dir>/evidence.json`.
    pub fn load_sparse_evidences(&self) -> Result<SparseEvidenceMatrix> {
        let path = self.dir.join(EVIDENCE_FILE);
        tracing::info!("Loading sparse evidences from {}", path.display());
        let matrix: SparseEvidenceMatrix = read_json(&path)?;
        tracing::info!(
            "Loaded {} evidence rows (feature_dim={})",
            matrix.row_count(),
            matrix.feature_dim
        );
        Ok(matrix)
    }
}

/// Load the claims dictionary from its own path (outside `--data`).
pub fn load_claims_dict(path: impl AsRef<Path>) -> Result<ClaimsDict> {
    let path = path.as_ref();
    tracing::info!("Loading claims data from {}", path.display());
    let dict: ClaimsDict = read_json(path)?;
    tracing::info!("Loaded {} claims", dict.len());
    Ok(dict)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Cannot parse '{}'", path.display()))
}

/// True if an io::Error of kind NotFound sits anywhere in the chain.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_loads_examples_and_evidences() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(TRAIN_FILE),
            r#"[{"claim_id": "1", "evidences": [{"evidence": 0, "label": 1}]}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(EVIDENCE_FILE),
            r#"{"feature_dim": 16, "rows": [[[0, 3, 1.0], [2, 5, 0.5]]]}"#,
        )
        .unwrap();

        let loader   = CorpusLoader::new(dir.path());
        let examples = loader.load_examples().unwrap();
        let matrix   = loader.load_sparse_evidences().unwrap();

        assert_eq!(examples.len(), 1);
        assert_eq!(matrix.feature_dim, 16);
        let row = matrix.sequence(0).unwrap();
        assert_eq!(row.len, 3);
        assert!(matrix.sequence(1).is_none());
    }

    #[test]
    fn test_missing_evidence_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = CorpusLoader::new(dir.path())
            .load_sparse_evidences()
            .unwrap_err();

        assert!(is_not_found(&err));
        assert!(err.to_string().contains(EVIDENCE_FILE));
    }

    #[test]
    fn test_malformed_json_is_not_a_not_found_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("claims.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_claims_dict(&path).unwrap_err();
        assert!(!is_not_found(&err));
    }

    #[test]
    fn test_claims_dict_roundtrips_ids() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("claims.json");
        fs::write(&path, r#"{"7": [[1, 2], [3]], "9": [[4]]}"#).unwrap();

        let dict = load_claims_dict(&path).unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict["7"], vec![vec![1, 2], vec![3]]);
    }
}
