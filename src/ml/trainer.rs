// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop with windowed metrics and a
// best-training-accuracy checkpoint policy.
//
// Per epoch:
//   1. training phase   — forward, BCE-with-logits, accuracy,
//                         backward, Adam step (on Autodiff<B>)
//   2. validation phase — forward, loss, accuracy only, on
//                         model.valid() (inner backend, no graph)
//   3. checkpoint       — save iff mean training accuracy >= best
//
// Every OUTPUT_FREQ batches each phase prints a window report and
// forwards it to the MetricsSink. Validation windows also log a
// histogram of every parameter and of its gradient from the last
// training step of the epoch.
//
// Key Burn insight:
//   - Training uses Autodiff<B> for gradients
//   - model.valid() returns the model on B::InnerBackend
//   - The validation batcher must also use B::InnerBackend
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{anyhow, Result};
use burn::{
    backend::{
        ndarray::NdArrayDevice,
        wgpu::WgpuDevice,
        Autodiff, NdArray, Wgpu,
    },
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::AutodiffModule,
    nn::loss::BinaryCrossEntropyLossConfig,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{activation, backend::AutodiffBackend},
};
use std::{sync::Arc, time::Instant};

use crate::application::train_use_case::{DeviceKind, TrainConfig};
use crate::data::{
    batcher::{PairBatch, PairBatcher},
    dataset::ClaimDataset,
    producer::BatchSource,
};
use crate::domain::{
    run_parameters::RunParameters,
    traits::{EpochMetrics, MetricsSink},
};
use crate::infra::checkpoint::{BestCheckpoint, CheckpointDecision, CheckpointManager, CheckpointPolicy};
use crate::ml::accumulator::{output_frequency, BatchOutcome, PhaseSummary, PhaseTotals, RunningMetric};
use crate::ml::model::{ClsmModel, RelevanceModel};
use crate::ml::snapshot::{gradient_values, parameter_values, HostTensor};

/// Fixed L2 penalty of the Adam optimiser.
pub const WEIGHT_DECAY: f32 = 1e-4;

pub const OPTIMIZER_NAME: &str = "Adam";
pub const LOSS_NAME:      &str = "BCEWithLogitsLoss";

/// Report cadence and progress denominators, computed once per run.
#[derive(Debug, Clone, Copy)]
pub struct ReportSchedule {
    pub output_freq:             usize,
    pub train_batches_per_epoch: f64,
    pub val_batches_per_epoch:   f64,
}

impl ReportSchedule {
    pub fn new(train_len: usize, val_len: usize, batch_size: usize) -> Self {
        let bs = batch_size.max(1) as f64;
        Self {
            output_freq:             output_frequency(train_len, batch_size),
            train_batches_per_epoch: train_len as f64 / bs,
            val_batches_per_epoch:   val_len   as f64 / bs,
        }
    }
}

/// Epoch count and learning rate for `run_epochs`.
#[derive(Debug, Clone, Copy)]
pub struct EpochPlan {
    pub epochs:        usize,
    pub learning_rate: f64,
    pub schedule:      ReportSchedule,
}

/// Called with the model every time the policy reports a new best.
pub type SaveBest<'a, M> = dyn FnMut(&M, &BestCheckpoint) -> Result<()> + 'a;

// ─── Entry point ──────────────────────────────────────────────────────────────

pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: ClaimDataset,
    val_dataset:   ClaimDataset,
    params:        &RunParameters,
    ckpt_manager:  &CheckpointManager,
    sink:          &mut dyn MetricsSink,
) -> Result<Vec<EpochMetrics>> {
    match cfg.runtime.device {
        DeviceKind::Wgpu => {
            let device = WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<Autodiff<Wgpu>>(cfg, device, train_dataset, val_dataset, params, ckpt_manager, sink)
        }
        DeviceKind::Cpu => {
            let device = NdArrayDevice::Cpu;
            tracing::info!("Using CPU device: {:?}", device);
            train_loop::<Autodiff<NdArray>>(cfg, device, train_dataset, val_dataset, params, ckpt_manager, sink)
        }
    }
}

fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    device:        B::Device,
    train_dataset: ClaimDataset,
    val_dataset:   ClaimDataset,
    params:        &RunParameters,
    ckpt_manager:  &CheckpointManager,
    sink:          &mut dyn MetricsSink,
) -> Result<Vec<EpochMetrics>> {
    let model = seeded_model::<B>(cfg, &device);
    tracing::info!(
        "Created model: feature_dim={}, conv_dim={}, semantic_dim={}",
        cfg.feature_dim,
        cfg.conv_dim,
        cfg.semantic_dim
    );

    let mut save = |model: &ClsmModel<B>, best: &BestCheckpoint| -> Result<()> {
        let path = ckpt_manager.save_best::<B, _>(model, best, params)?;
        tracing::info!("Checkpoint saved to '{}'", path.display());
        Ok(())
    };

    let (_, history) = fit(model, cfg, device, train_dataset, val_dataset, &mut save, sink)?;
    tracing::info!("Training complete!");
    Ok(history)
}

/// Seed the backend RNG, then initialise the model from it.
pub fn seeded_model<B: Backend>(cfg: &TrainConfig, device: &B::Device) -> ClsmModel<B> {
    B::seed(cfg.runtime.seed);
    cfg.model_config().init(device)
}

pub fn adam_config() -> AdamConfig {
    AdamConfig::new().with_weight_decay(Some(WeightDecayConfig::new(WEIGHT_DECAY)))
}

/// Build optimiser and data loaders around an existing model, then
/// run every epoch. Returns the trained model and per-epoch metrics.
pub fn fit<B, M>(
    model:         M,
    cfg:           &TrainConfig,
    device:        B::Device,
    train_dataset: ClaimDataset,
    val_dataset:   ClaimDataset,
    save_best:     &mut SaveBest<'_, M>,
    sink:          &mut dyn MetricsSink,
) -> Result<(M, Vec<EpochMetrics>)>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + RelevanceModel<B>,
    M::InnerModule: RelevanceModel<B::InnerBackend>,
{
    let plan = EpochPlan {
        epochs:        cfg.epochs,
        learning_rate: cfg.learning_rate,
        schedule:      ReportSchedule::new(train_dataset.len(), val_dataset.len(), cfg.batch_size),
    };
    tracing::info!("Reporting every {} batches", plan.schedule.output_freq);

    // ── Adam with weight decay ────────────────────────────────────────────────
    let mut optim = adam_config().init::<B, M>();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader: Arc<dyn DataLoader<PairBatch<B>>> =
        DataLoaderBuilder::new(PairBatcher::<B>::new(device.clone(), cfg.feature_dim))
            .batch_size(cfg.batch_size)
            .shuffle(cfg.runtime.seed)
            .num_workers(cfg.runtime.num_workers)
            .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_loader: Arc<dyn DataLoader<PairBatch<B::InnerBackend>>> =
        DataLoaderBuilder::new(PairBatcher::<B::InnerBackend>::new(device, cfg.feature_dim))
            .batch_size(cfg.batch_size)
            .shuffle(cfg.runtime.seed)
            .num_workers(cfg.runtime.num_workers)
            .build(val_dataset);

    println!("Training...");
    run_epochs(model, &mut optim, &plan, &train_loader, &val_loader, save_best, sink)
}

// ─── Epoch loop ───────────────────────────────────────────────────────────────

pub fn run_epochs<B, M, O>(
    mut model: M,
    optim:     &mut O,
    plan:      &EpochPlan,
    train:     &dyn BatchSource<PairBatch<B>>,
    val:       &dyn BatchSource<PairBatch<B::InnerBackend>>,
    save_best: &mut SaveBest<'_, M>,
    sink:      &mut dyn MetricsSink,
) -> Result<(M, Vec<EpochMetrics>)>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + RelevanceModel<B>,
    M::InnerModule: RelevanceModel<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    let mut policy  = CheckpointPolicy::new();
    let mut history = Vec::with_capacity(plan.epochs);

    for epoch in 0..plan.epochs {
        let (trained, train_summary, last_grads) = train_phase(
            model,
            optim,
            plan.learning_rate,
            train.batches(),
            epoch,
            &plan.schedule,
            sink,
        )?;
        model = trained;
        tracing::debug!("Epoch {}: {} training batches", epoch, train_summary.batches);

        println!("Running validation...");
        let model_valid  = model.valid();
        let val_summary  = validate_phase(
            &model_valid,
            val.batches(),
            epoch,
            &plan.schedule,
            &last_grads,
            sink,
        )?;

        let train_acc = train_summary.mean_accuracy;
        println!("[{}] mean accuracy: {}", epoch, train_acc);

        let saved = match policy.observe(epoch, train_acc) {
            CheckpointDecision::Save(best) => {
                println!("=> Saving a new best");
                save_best(&model, &best)?;
                true
            }
            CheckpointDecision::Skip { best_accuracy } => {
                println!("=> Training accuracy did not improve (best {best_accuracy})");
                false
            }
        };

        let metrics = EpochMetrics {
            epoch,
            train_loss:     train_summary.mean_loss,
            train_accuracy: train_acc,
            val_loss:       val_summary.mean_loss,
            val_accuracy:   val_summary.mean_accuracy,
            saved,
        };
        sink.log_epoch(&metrics)?;
        history.push(metrics);
    }

    Ok((model, history))
}

/// One pass over the training batches with a parameter update per batch.
/// Also returns the gradients of the final batch, copied to the host.
pub fn train_phase<B, M, O>(
    mut model:     M,
    optim:         &mut O,
    learning_rate: f64,
    batches:       impl Iterator<Item = PairBatch<B>>,
    epoch:         usize,
    schedule:      &ReportSchedule,
    sink:          &mut dyn MetricsSink,
) -> Result<(M, PhaseSummary, Vec<HostTensor>)>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + RelevanceModel<B>,
    O: Optimizer<M, B>,
{
    let mut window       = RunningMetric::new(schedule.output_freq);
    let mut totals       = PhaseTotals::default();
    let mut window_start = Instant::now();
    let mut last_grads   = Vec::new();

    let mut batches = batches.enumerate().peekable();
    while let Some((batch_num, batch)) = batches.next() {
        let (loss, outcome) = score_batch(&model, batch)?;
        totals.add(&outcome);

        if let Some(report) = window.push(batch_num, outcome) {
            println!(
                "[{}:{}:{:.3}s] training loss: {}, training accuracy: {}, training recall: {}",
                epoch,
                report.batch_num as f64 / schedule.train_batches_per_epoch,
                window_start.elapsed().as_secs_f64(),
                report.mean_loss,
                report.mean_accuracy,
                report.recall,
            );
            sink.log_scalar("train_loss", report.mean_loss, report.batch_num + 1)?;
            sink.log_scalar("train_accuracy", report.mean_accuracy, report.batch_num + 1)?;
            window_start = Instant::now();
        }

        // Backward builds fresh gradients every step; nothing to zero
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        if batches.peek().is_none() {
            last_grads = gradient_values(&model, &grads)?;
        }
        model = optim.step(learning_rate, model, grads);
    }

    Ok((model, totals.summary(), last_grads))
}

/// One pass over the validation batches; parameters are untouched.
/// `grads` are logged next to the parameter histograms.
pub fn validate_phase<B, M>(
    model:    &M,
    batches:  impl Iterator<Item = PairBatch<B>>,
    epoch:    usize,
    schedule: &ReportSchedule,
    grads:    &[HostTensor],
    sink:     &mut dyn MetricsSink,
) -> Result<PhaseSummary>
where
    B: Backend,
    M: Module<B> + RelevanceModel<B>,
{
    let mut window = RunningMetric::new(schedule.output_freq);
    let mut totals = PhaseTotals::default();
    // Parameters are fixed during validation; copy them once
    let mut params: Option<Vec<HostTensor>> = None;

    for (batch_num, batch) in batches.enumerate() {
        let (_, outcome) = score_batch(model, batch)?;
        totals.add(&outcome);

        if let Some(report) = window.push(batch_num, outcome) {
            println!(
                "[{}:{}] loss: {}, accuracy: {}, recall: {}",
                epoch,
                report.batch_num as f64 / schedule.val_batches_per_epoch,
                report.mean_loss,
                report.mean_accuracy,
                report.recall,
            );
            let step = report.batch_num + 1;
            sink.log_scalar("val_loss", report.mean_loss, step)?;
            sink.log_scalar("val_accuracy", report.mean_accuracy, step)?;

            if params.is_none() {
                params = Some(parameter_values(model)?);
            }
            for t in params.iter().flatten().chain(grads) {
                sink.log_histogram(&t.tag, &t.values, step)?;
            }
        }
    }

    Ok(totals.summary())
}

/// Forward pass, loss and host-side metrics for one batch.
/// The loss tensor is returned so the training phase can backprop it.
pub fn score_batch<B: Backend, M: RelevanceModel<B>>(
    model: &M,
    batch: PairBatch<B>,
) -> Result<(Tensor<B, 1>, BatchOutcome)> {
    let labels = batch.labels;
    let logits = model.forward(batch.claims, batch.evidences).flatten::<1>(0, 1);

    let bce  = BinaryCrossEntropyLossConfig::new()
        .with_logits(true)
        .init(&logits.device());
    let loss = bce.forward(logits.clone(), labels.clone());

    // round(sigmoid(x)) rounds half to even, so exactly 0.5 is a 0
    let predictions = activation::sigmoid(logits).greater_elem(0.5).float();

    let predictions = to_host(predictions)?;
    let labels      = to_host(labels.float())?;
    let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

    Ok((loss, BatchOutcome::measure(loss_val, &predictions, &labels)))
}

fn to_host<B: Backend>(t: Tensor<B, 1>) -> Result<Vec<f32>> {
    t.into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))
}
