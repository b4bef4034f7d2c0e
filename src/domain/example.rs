// ============================================================
// Layer 3 — Claim Examples
// ============================================================
// One record of train.json: a claim id (resolved through the
// claims dictionary) plus every candidate evidence retrieved for
// it, each with a binary relevance label.
//
// Example record:
//   {"claim_id": "75397",
//    "evidences": [{"evidence": [[10, 4711], [88]], "label": 1},
//                  {"evidence": 12, "label": 0}]}
//
// The first candidate is dense (inline multi-hot features), the
// second is sparse (row 12 of evidence.json).

use serde::{Deserialize, Serialize};

use crate::domain::features::MultiHot;

/// A claim and its candidate evidences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimExample {
    pub claim_id:  String,
    pub evidences: Vec<Candidate>,
}

/// One candidate evidence with its relevance label (0 or 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub evidence: EvidenceRef,
    pub label:    u8,
}

/// Where a candidate's features live.
///
/// Untagged so the JSON stays compact: a bare integer is a row of
/// the sparse evidence matrix, a nested list is an inline sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvidenceRef {
    Row(usize),
    Dense(MultiHot),
}

impl EvidenceRef {
    pub fn is_sparse(&self) -> bool {
        matches!(self, EvidenceRef::Row(_))
    }
}

impl ClaimExample {
    #[cfg(test)]
    pub fn new(claim_id: impl Into<String>, evidences: Vec<Candidate>) -> Self {
        Self { claim_id: claim_id.into(), evidences }
    }

    pub fn positives(&self) -> usize {
        self.evidences.iter().filter(|c| c.label == 1).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_mixed_candidates() {
        let json = r#"{"claim_id": "75397",
                       "evidences": [{"evidence": [[10, 4711], [88]], "label": 1},
                                     {"evidence": 12, "label": 0}]}"#;
        let ex: ClaimExample = serde_json::from_str(json).unwrap();

        assert_eq!(ex.claim_id, "75397");
        assert_eq!(ex.evidences.len(), 2);
        assert_eq!(ex.evidences[0].evidence, EvidenceRef::Dense(vec![vec![10, 4711], vec![88]]));
        assert!(ex.evidences[1].evidence.is_sparse());
        assert_eq!(ex.positives(), 1);
    }
}
