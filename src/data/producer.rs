// ============================================================
// Layer 4 — Batch Producer
// ============================================================
// The epoch loop asks for a fresh, lazy sequence of batches once
// per phase per epoch. In a real run that sequence comes from a
// Burn DataLoader (shuffled, collated on worker threads); in tests
// it can be a plain Vec of prepared batches.

use burn::data::dataloader::DataLoader;
use std::sync::Arc;

pub trait BatchSource<O> {
    /// A new pass over the batches.
    fn batches(&self) -> Box<dyn Iterator<Item = O> + '_>;
}

impl<O: 'static> BatchSource<O> for Arc<dyn DataLoader<O>> {
    fn batches(&self) -> Box<dyn Iterator<Item = O> + '_> {
        Box::new(self.iter())
    }
}

impl<O: Clone> BatchSource<O> for Vec<O> {
    fn batches(&self) -> Box<dyn Iterator<Item = O> + '_> {
        Box::new(self.iter().cloned())
    }
}
