// Copyright 2025 The rust-seq2sum Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Scheduled-sampling training loop
//!
//! Fits a `Seq2SumModel` on batches of (source, target) pairs. At every
//! target position beyond the first, the decoder input is either the
//! ground-truth previous token (teacher forcing) or the model's own previous
//! prediction, chosen stochastically with a probability that follows the
//! configured schedule over training progress. The stochastic branch is a
//! single decision function over a seeded `StdRng`, so runs are reproducible.
//!
//! Token-level cross-entropy is masked at padded target positions and
//! averaged over the valid tokens of the batch. A non-finite loss aborts the
//! run with a `DivergenceError` before the optimizer step, so the last good
//! checkpoint is never overwritten by a diverged state.

use crate::common::error::SummarizerError;
use crate::pipelines::dataset::{batch_examples, EncodedExample, SummaryBatch, SummaryDataset};
use crate::seq2sum::{Seq2SumConfig, Seq2SumModel};
use crate::vocab::SummaryVocab;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tch::kind::Kind::Float;
use tch::nn::OptimizerConfig;
use tch::{nn, Device, Tensor};

/// # Scheduled-sampling probability curve
///
/// Maps training progress to the probability of feeding the model its own
/// previous prediction instead of the ground truth. Both shapes start near
/// zero and increase monotonically; the shape and its parameters are
/// configuration, not constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum SamplingSchedule {
    /// Probability rises linearly from `start` to `end` over the run.
    Linear { start: f64, end: f64 },
    /// Inverse-sigmoid decay of the teacher-forcing probability over global
    /// steps: `p = 1 - k / (k + exp(step / k))`. Larger `k` delays the ramp.
    InverseSigmoid { k: f64 },
}

impl SamplingSchedule {
    /// Sampling probability at the given global step of `total_steps`.
    pub fn sampling_probability(&self, step: usize, total_steps: usize) -> f64 {
        let probability = match self {
            SamplingSchedule::Linear { start, end } => {
                let progress = step as f64 / total_steps.max(1) as f64;
                start + (end - start) * progress.min(1f64)
            }
            SamplingSchedule::InverseSigmoid { k } => 1f64 - k / (k + (step as f64 / k).exp()),
        };
        probability.max(0f64).min(1f64)
    }

    fn validate(&self) -> Result<(), SummarizerError> {
        match self {
            SamplingSchedule::Linear { start, end } => {
                if !(0f64..=1f64).contains(start) || !(0f64..=1f64).contains(end) || end < start {
                    return Err(SummarizerError::ConfigurationError(format!(
                        "linear sampling schedule requires 0 <= start <= end <= 1, got start {} end {}",
                        start, end
                    )));
                }
            }
            SamplingSchedule::InverseSigmoid { k } => {
                if !k.is_finite() || *k < 1f64 {
                    return Err(SummarizerError::ConfigurationError(format!(
                        "inverse-sigmoid sampling schedule requires k >= 1, got {}",
                        k
                    )));
                }
            }
        }
        Ok(())
    }
}

/// # Configuration for a training run
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Number of examples per batch (default: 8)
    pub batch_size: usize,
    /// Maximum encoded source length, including start/end ids (default: 384)
    pub max_source_len: usize,
    /// Maximum encoded target length, including start/end ids (default: 64)
    pub max_target_len: usize,
    /// Adam learning rate (default: 1e-3)
    pub learning_rate: f64,
    /// Number of passes over the dataset (default: 10)
    pub epochs: usize,
    /// Epochs between checkpoints (default: 1)
    pub checkpoint_interval: usize,
    /// Scheduled-sampling curve (default: linear from 0 to 0.25)
    pub sampling_schedule: SamplingSchedule,
    /// Seed for the sampling-decision random source (default: 42)
    pub seed: u64,
    /// Directory checkpoints are written to (default: `checkpoints`)
    pub checkpoint_dir: PathBuf,
    /// Device to train on (default: CUDA/GPU when available)
    pub device: Device,
}

impl Default for TrainConfig {
    fn default() -> TrainConfig {
        TrainConfig {
            batch_size: 8,
            max_source_len: 384,
            max_target_len: 64,
            learning_rate: 1e-3,
            epochs: 10,
            checkpoint_interval: 1,
            sampling_schedule: SamplingSchedule::Linear {
                start: 0f64,
                end: 0.25,
            },
            seed: 42,
            checkpoint_dir: PathBuf::from("checkpoints"),
            device: Device::cuda_if_available(),
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<(), SummarizerError> {
        if self.batch_size < 1 {
            return Err(SummarizerError::ConfigurationError(
                "batch_size must be at least 1".into(),
            ));
        }
        if self.max_source_len < 3 || self.max_target_len < 3 {
            return Err(SummarizerError::ConfigurationError(format!(
                "sequence length bounds must be at least 3, got source {} target {}",
                self.max_source_len, self.max_target_len
            )));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0f64 {
            return Err(SummarizerError::ConfigurationError(format!(
                "learning_rate must be strictly positive, got {}",
                self.learning_rate
            )));
        }
        if self.epochs < 1 {
            return Err(SummarizerError::ConfigurationError(
                "epochs must be at least 1".into(),
            ));
        }
        if self.checkpoint_interval < 1 {
            return Err(SummarizerError::ConfigurationError(
                "checkpoint_interval must be at least 1".into(),
            ));
        }
        self.sampling_schedule.validate()
    }
}

/// Per-epoch loss history of a completed run.
#[derive(Debug, Clone)]
pub struct TrainingMetrics {
    pub epoch_losses: Vec<f64>,
    pub final_loss: f64,
}

/// # Trainer owning the model, its parameters and the optimizer
///
/// Model parameters live in the trainer's `VarStore` and are mutated only by
/// the optimizer step inside `train`; there are no concurrent writers.
/// Checkpoints are plain `VarStore` saves, so a run can be restarted by
/// constructing a trainer with the same model configuration and calling
/// `load_checkpoint`.
pub struct SummaryTrainer {
    model: Seq2SumModel,
    model_config: Seq2SumConfig,
    var_store: nn::VarStore,
    optimizer: nn::Optimizer<nn::Adam>,
    config: TrainConfig,
    rng: StdRng,
}

impl SummaryTrainer {
    /// Builds a fresh model and its optimizer.
    ///
    /// # Arguments
    ///
    /// * `model_config` - Model hyperparameters (must match the vocabulary
    ///   the dataset was encoded with)
    /// * `config` - Training run configuration
    pub fn new(
        model_config: &Seq2SumConfig,
        config: TrainConfig,
    ) -> Result<SummaryTrainer, SummarizerError> {
        config.validate()?;
        let var_store = nn::VarStore::new(config.device);
        let model = Seq2SumModel::new(&var_store.root(), model_config);
        let optimizer = nn::Adam::default().build(&var_store, config.learning_rate)?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(SummaryTrainer {
            model,
            model_config: model_config.clone(),
            var_store,
            optimizer,
            config,
            rng,
        })
    }

    /// Encodes a raw dataset through the vocabulary adapter, bounded by the
    /// configured maximum lengths, and trains on it. The vocabulary is
    /// checked against the model configuration first: token ids are stable
    /// for the lifetime of a trained model.
    pub fn train_dataset(
        &mut self,
        dataset: &SummaryDataset,
        vocab: &SummaryVocab,
    ) -> Result<TrainingMetrics, SummarizerError> {
        self.model_config.validate_against_vocab(vocab)?;
        let examples = dataset.encode(
            vocab,
            self.config.max_source_len,
            self.config.max_target_len,
        )?;
        self.train(&examples)
    }

    pub fn model(&self) -> &Seq2SumModel {
        &self.model
    }

    pub fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), SummarizerError> {
        self.var_store.save(path.as_ref())?;
        Ok(())
    }

    pub fn load_checkpoint<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SummarizerError> {
        self.var_store.load(path.as_ref())?;
        Ok(())
    }

    /// Runs the configured number of epochs over the encoded dataset.
    ///
    /// Checkpoints are written at the configured epoch interval, only after
    /// the epoch completed with finite losses throughout.
    pub fn train(
        &mut self,
        examples: &[EncodedExample],
    ) -> Result<TrainingMetrics, SummarizerError> {
        if examples.is_empty() {
            return Err(SummarizerError::ConfigurationError(
                "cannot train on an empty dataset".into(),
            ));
        }
        let batches = batch_examples(
            examples,
            self.config.batch_size,
            self.model_config.pad_token_id,
            self.config.device,
        );
        let total_steps = batches.len() * self.config.epochs;
        let mut epoch_losses = Vec::with_capacity(self.config.epochs);
        let mut global_step = 0usize;

        for epoch in 1..=self.config.epochs {
            let mut epoch_loss = 0f64;
            for batch in &batches {
                epoch_loss += self.train_step(batch, global_step, total_steps)?;
                global_step += 1;
            }
            let mean_loss = epoch_loss / batches.len() as f64;
            epoch_losses.push(mean_loss);
            info!(
                "epoch {}/{}: mean loss {:.6}",
                epoch, self.config.epochs, mean_loss
            );

            if epoch % self.config.checkpoint_interval == 0 {
                fs::create_dir_all(&self.config.checkpoint_dir)?;
                let checkpoint_path = self
                    .config
                    .checkpoint_dir
                    .join(format!("seq2sum_epoch_{}.ot", epoch));
                self.save_checkpoint(&checkpoint_path)?;
                info!("wrote checkpoint {:?}", checkpoint_path);
            }
        }

        let final_loss = *epoch_losses.last().expect("at least one epoch was run");
        Ok(TrainingMetrics {
            epoch_losses,
            final_loss,
        })
    }

    /// One optimizer step over a batch. Returns the batch-mean loss over
    /// valid target tokens.
    fn train_step(
        &mut self,
        batch: &SummaryBatch,
        step: usize,
        total_steps: usize,
    ) -> Result<f64, SummarizerError> {
        let encoder_output = self
            .model
            .encode_t(&batch.source_ids, &batch.source_mask, true);
        let target_length = batch.target_ids.size()[1];
        let sampling_probability = self
            .config
            .sampling_schedule
            .sampling_probability(step, total_steps);

        let mut state = encoder_output.final_state;
        let mut prev_tokens = batch.target_ids.select(1, 0);
        let mut previous_logits: Option<Tensor> = None;
        let mut step_losses = Vec::with_capacity(target_length as usize - 1);

        for position in 1..target_length {
            if let Some(logits) = &previous_logits {
                if self.sample_from_model(sampling_probability) {
                    prev_tokens = logits.argmax(-1, false);
                }
            }
            let output = self.model.decode_step_t(
                &prev_tokens,
                &state,
                &encoder_output.hidden_states,
                &batch.source_mask,
                true,
            );
            let gold = batch.target_ids.select(1, position);
            let position_mask = batch.target_mask.select(1, position);
            let log_probs = output.vocab_logits.log_softmax(-1, Float);
            let token_loss =
                -log_probs.gather(-1, &gold.unsqueeze(-1), false).squeeze1(-1) * position_mask;
            step_losses.push(token_loss);
            state = output.state;
            previous_logits = Some(output.vocab_logits);
            prev_tokens = gold;
        }

        let summed_loss = Tensor::stack(&step_losses, 0).sum(Float);
        let valid_tokens = batch.target_mask.narrow(1, 1, target_length - 1).sum(Float);
        let loss = summed_loss / valid_tokens;
        let loss_value = f64::from(&loss);
        ensure_finite(loss_value, step)?;
        self.optimizer.backward_step(&loss);
        Ok(loss_value)
    }

    /// The scheduled-sampling decision: true when the decoder should be fed
    /// its own previous prediction for this step.
    fn sample_from_model(&mut self, sampling_probability: f64) -> bool {
        self.rng.gen::<f64>() < sampling_probability
    }
}

/// Fails a training run on a non-finite loss value.
pub(crate) fn ensure_finite(loss_value: f64, step: usize) -> Result<(), SummarizerError> {
    if !loss_value.is_finite() {
        return Err(SummarizerError::DivergenceError(format!(
            "non-finite loss {} at step {}",
            loss_value, step
        )));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{ensure_finite, SamplingSchedule};

    #[test]
    fn linear_schedule_hits_its_endpoints() {
        let schedule = SamplingSchedule::Linear {
            start: 0.0,
            end: 0.5,
        };
        assert!((schedule.sampling_probability(0, 100) - 0.0).abs() < 1e-12);
        assert!((schedule.sampling_probability(100, 100) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn inverse_sigmoid_schedule_starts_near_zero_and_increases() {
        let schedule = SamplingSchedule::InverseSigmoid { k: 100.0 };
        let early = schedule.sampling_probability(0, 10_000);
        let late = schedule.sampling_probability(10_000, 10_000);
        assert!(early < 0.05);
        assert!(late > early);
        let mut previous = 0f64;
        for step in (0..10_000).step_by(500) {
            let probability = schedule.sampling_probability(step, 10_000);
            assert!(probability >= previous);
            previous = probability;
        }
    }

    #[test]
    fn non_finite_loss_is_a_divergence_error() {
        assert!(ensure_finite(f64::NAN, 3).is_err());
        assert!(ensure_finite(f64::INFINITY, 3).is_err());
        assert!(ensure_finite(2.5, 3).is_ok());
    }
}
