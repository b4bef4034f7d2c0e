// ============================================================
// Layer 3 — Feature Sequences
// ============================================================
// Claims and evidences reach the trainer already featurised:
// every text is a sequence of positions (words), and every
// position activates a handful of features (letter-trigram ids
// in the CLSM paper).
//
// Two encodings exist on disk:
//   - dense:  [[12, 4711], [88], ...]    one list of ids per word
//   - sparse: [[0, 12, 1.0], [1, 88, 2.0]] (position, feature, value)
//
// Both are normalised into FeatureSequence here, so the batcher
// only ever deals with one shape.

use serde::{Deserialize, Serialize};

/// Multi-hot dense encoding: one list of active feature ids per position.
pub type MultiHot = Vec<Vec<u32>>;

/// One non-zero cell of a sparse [position, feature] matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureEntry(pub u32, pub u32, pub f32);

impl FeatureEntry {
    pub fn position(&self) -> usize { self.0 as usize }
    pub fn feature(&self)  -> usize { self.1 as usize }
    pub fn value(&self)    -> f32   { self.2 }
}

/// A featurised text: `len` positions with sparse non-zero cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureSequence {
    pub len:     usize,
    pub entries: Vec<FeatureEntry>,
}

impl FeatureSequence {
    /// Every listed feature id gets value 1.0 at its position.
    pub fn from_multi_hot(words: &[Vec<u32>]) -> Self {
        let entries = words
            .iter()
            .enumerate()
            .flat_map(|(pos, ids)| {
                ids.iter().map(move |&id| FeatureEntry(pos as u32, id, 1.0))
            })
            .collect();
        Self { len: words.len(), entries }
    }

    /// Length is one past the highest position present.
    pub fn from_entries(entries: Vec<FeatureEntry>) -> Self {
        let len = entries
            .iter()
            .map(|e| e.position() + 1)
            .max()
            .unwrap_or(0);
        Self { len, entries }
    }

    /// Highest feature id referenced, if any.
    pub fn max_feature(&self) -> Option<usize> {
        self.entries.iter().map(FeatureEntry::feature).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_hot_positions() {
        let seq = FeatureSequence::from_multi_hot(&[vec![3, 7], vec![], vec![1]]);
        assert_eq!(seq.len, 3);
        assert_eq!(
            seq.entries,
            vec![
                FeatureEntry(0, 3, 1.0),
                FeatureEntry(0, 7, 1.0),
                FeatureEntry(2, 1, 1.0),
            ]
        );
        assert_eq!(seq.max_feature(), Some(7));
    }

    #[test]
    fn test_entries_length_from_highest_position() {
        let seq = FeatureSequence::from_entries(vec![
            FeatureEntry(4, 2, 0.5),
            FeatureEntry(1, 9, 2.0),
        ]);
        assert_eq!(seq.len, 5);

        let empty = FeatureSequence::from_entries(Vec::new());
        assert_eq!(empty.len, 0);
        assert_eq!(empty.max_feature(), None);
    }
}
