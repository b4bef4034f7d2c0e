// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Splits the claim examples into two sets:
//   - Training set:   the first floor(n * train_fraction) examples
//   - Validation set: everything after that
//
// The split boundary is NOT shuffled: the same train.json always
// yields the same two sets. Shuffling happens later, inside each
// split, when the DataLoader draws batches.
//
// Split ratio: 80% training, 20% validation
//
// Reference: Rust Book §8 (Vectors)

/// Fraction of the corpus that goes to training.
pub const TRAIN_FRACTION: f64 = 0.8;

/// Number of training examples for a corpus of `total` examples.
pub fn train_size(total: usize, train_fraction: f64) -> usize {
    // Truncation, not rounding: 9 examples * 0.8 = 7.2 → 7
    let size = ((total as f64) * train_fraction) as usize;
    size.min(total)
}

/// Split `samples` into (train, validation), preserving order.
///
/// # Example
/// ```ignore
/// let (train, val) = split_train_val(all_samples, 0.8);
/// // train has floor(80%) of samples, val has the rest
/// ```
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64) -> (Vec<T>, Vec<T>) {
    let total    = samples.len();
    let split_at = train_size(total, train_fraction);

    // split_off(n) removes elements [n..] from the Vec and returns them
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_train_val(items, TRAIN_FRACTION);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_sizes_always_sum_to_total() {
        for n in 0..200usize {
            let items: Vec<usize> = (0..n).collect();
            let (train, val)      = split_train_val(items, TRAIN_FRACTION);
            assert_eq!(train.len() + val.len(), n);
            assert_eq!(train.len(), (n * 4) / 5, "floor(0.8 * {n})");
        }
    }

    #[test]
    fn test_order_is_preserved() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val)      = split_train_val(items, TRAIN_FRACTION);
        assert_eq!(train, (0..8).collect::<Vec<_>>());
        assert_eq!(val,   vec![8, 9]);
    }

    #[test]
    fn test_truncates_instead_of_rounding() {
        // 9 * 0.8 = 7.2 and 4 * 0.8 = 3.2
        assert_eq!(train_size(9, TRAIN_FRACTION), 7);
        assert_eq!(train_size(4, TRAIN_FRACTION), 3);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, val)      = split_train_val(items, TRAIN_FRACTION);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }
}
