// ============================================================
// Layer 5 — Running Metrics
// ============================================================
// Pure bookkeeping for the epoch loop, no tensors involved:
//
//   BatchOutcome  — loss / accuracy / recall of one batch
//   RunningMetric — windowed sums, flushed every OUTPUT_FREQ batches
//   PhaseTotals   — whole-phase sums for the epoch means
//
// Window cadence: a report is emitted when
//   batch_num % output_freq == 0 && batch_num > 0
// and the window means are sum / output_freq. The first window
// therefore covers batches 0..=output_freq (one batch more than
// the divisor); later windows cover exactly output_freq batches.

/// Fraction of the training set (in batches) between two reports.
const REPORT_FRACTION: f64 = 0.02;

/// OUTPUT_FREQ = floor(train_len / batch_size * 0.02), at least 1.
pub fn output_frequency(train_len: usize, batch_size: usize) -> usize {
    let batches = train_len as f64 / batch_size.max(1) as f64;
    ((batches * REPORT_FRACTION) as usize).max(1)
}

/// Metrics of a single batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOutcome {
    pub loss:     f64,
    pub accuracy: f64,
    pub recall:   f64,
}

impl BatchOutcome {
    /// `predictions` and `labels` are 0.0/1.0 vectors of equal length.
    pub fn measure(loss: f64, predictions: &[f32], labels: &[f32]) -> Self {
        Self {
            loss,
            accuracy: accuracy(predictions, labels),
            recall:   recall(predictions, labels),
        }
    }
}

/// Fraction of positions where prediction == label; 0.0 for an empty batch.
pub fn accuracy(predictions: &[f32], labels: &[f32]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let hits = predictions
        .iter()
        .zip(labels)
        .filter(|(p, y)| p == y)
        .count();
    hits as f64 / labels.len() as f64
}

/// True positives over actual positives; 0.0 when there are no positives.
pub fn recall(predictions: &[f32], labels: &[f32]) -> f64 {
    let positives = labels.iter().filter(|&&y| y == 1.0).count();
    if positives == 0 {
        return 0.0;
    }
    let true_positives = predictions
        .iter()
        .zip(labels)
        .filter(|&(&p, &y)| p == 1.0 && y == 1.0)
        .count();
    true_positives as f64 / positives as f64
}

/// One flushed reporting window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowReport {
    pub batch_num:     usize,
    pub mean_loss:     f64,
    pub mean_accuracy: f64,
    /// Recall of the batch that closed the window, not of the whole
    /// window. Loss and accuracy are window means; recall is not.
    pub recall:        f64,
}

#[derive(Debug, Clone)]
pub struct RunningMetric {
    output_freq:  usize,
    loss_sum:     f64,
    accuracy_sum: f64,
}

impl RunningMetric {
    pub fn new(output_freq: usize) -> Self {
        Self { output_freq: output_freq.max(1), loss_sum: 0.0, accuracy_sum: 0.0 }
    }

    /// Add one batch; returns a report (and resets) on window boundaries.
    pub fn push(&mut self, batch_num: usize, outcome: BatchOutcome) -> Option<WindowReport> {
        self.loss_sum     += outcome.loss;
        self.accuracy_sum += outcome.accuracy;

        if batch_num == 0 || batch_num % self.output_freq != 0 {
            return None;
        }

        let report = WindowReport {
            batch_num,
            mean_loss:     self.loss_sum     / self.output_freq as f64,
            mean_accuracy: self.accuracy_sum / self.output_freq as f64,
            recall:        outcome.recall,
        };
        self.loss_sum     = 0.0;
        self.accuracy_sum = 0.0;
        Some(report)
    }
}

/// Whole-phase sums; never reset inside an epoch.
#[derive(Debug, Clone, Default)]
pub struct PhaseTotals {
    loss_sum:     f64,
    accuracy_sum: f64,
    batches:      usize,
}

/// Means over every batch of one phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSummary {
    pub batches:       usize,
    pub mean_loss:     f64,
    pub mean_accuracy: f64,
}

impl PhaseTotals {
    pub fn add(&mut self, outcome: &BatchOutcome) {
        self.loss_sum     += outcome.loss;
        self.accuracy_sum += outcome.accuracy;
        self.batches      += 1;
    }

    /// An empty phase reports NaN loss and 0.0 accuracy.
    pub fn summary(&self) -> PhaseSummary {
        if self.batches == 0 {
            return PhaseSummary { batches: 0, mean_loss: f64::NAN, mean_accuracy: 0.0 };
        }
        PhaseSummary {
            batches:       self.batches,
            mean_loss:     self.loss_sum     / self.batches as f64,
            mean_accuracy: self.accuracy_sum / self.batches as f64,
        }
    }
}
