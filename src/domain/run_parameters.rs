// ============================================================
// Layer 3 — Run Parameters
// ============================================================
// The hyperparameter record of one training run. It is used in
// two places:
//   1. logged once to the experiment sink at startup
//   2. encoded into the checkpoint directory name
//
// Entries keep a fixed order so checkpoint names are stable
// between runs with the same settings. Booleans render as
// `True` / `False`, the spelling existing checkpoint names use.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub batch_size:       usize,
    pub epochs:           usize,
    pub learning_rate:    f64,
    pub optimizer:        String,
    pub loss:             String,
    pub training_size:    usize,
    pub data_batch_size:  usize,
    pub data:             String,
    pub sparse_evidences: bool,
}

impl RunParameters {
    /// (key, value) pairs in their canonical order.
    /// Keys use spaces; callers decide how to escape them.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("batch size",       self.batch_size.to_string()),
            ("epochs",           self.epochs.to_string()),
            ("learning rate",    self.learning_rate.to_string()),
            ("optimizer",        self.optimizer.clone()),
            ("loss",             self.loss.clone()),
            ("training size",    self.training_size.to_string()),
            ("data batch size",  self.data_batch_size.to_string()),
            ("data",             self.data.clone()),
            ("sparse_evidences", bool_text(self.sparse_evidences).to_string()),
        ]
    }
}

fn bool_text(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}
