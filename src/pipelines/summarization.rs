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

//! # Abstractive summarization pipeline
//!
//! Text-in/text-out interface assembling the vocabulary adapter, a trained
//! model and a search driver from resource descriptions.
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use rust_seq2sum::pipelines::summarization::{SummarizationConfig, SummarizationModel};
//! use rust_seq2sum::resources::LocalResource;
//! use std::path::PathBuf;
//!
//! let config = SummarizationConfig::new(
//!     Box::new(LocalResource::from(PathBuf::from("path/to/spiece.model"))),
//!     Box::new(LocalResource::from(PathBuf::from("path/to/config.json"))),
//!     Box::new(LocalResource::from(PathBuf::from("path/to/model.ot"))),
//! );
//! let model = SummarizationModel::new(config)?;
//!
//! let input = ["The ministry announced a new scheme for farmers today."];
//! let summaries = model.summarize(&input)?;
//! # Ok(())
//! # }
//! ```

use crate::common::error::SummarizerError;
use crate::common::resources::ResourceProvider;
use crate::pipelines::generation::{GenerateConfig, SummaryGenerator};
use crate::seq2sum::{Seq2SumConfig, Seq2SumModel};
use crate::vocab::SummaryVocab;
use crate::Config;
use tch::{nn, Device};

/// # Configuration for the summarization pipeline
///
/// Mirrors `GenerateConfig` and adds the three artifacts the pipeline is
/// assembled from.
pub struct SummarizationConfig {
    /// Resource for the SentencePiece model file
    pub vocab_resource: Box<dyn ResourceProvider + Send>,
    /// Resource for the model hyperparameter JSON file
    pub config_resource: Box<dyn ResourceProvider + Send>,
    /// Resource for the trained weights
    pub weights_resource: Box<dyn ResourceProvider + Send>,
    /// Maximum encoded source length, including start/end ids (default: 384)
    pub max_source_len: usize,
    /// Number of hypotheses retained at each beam search step; 1 selects
    /// greedy decoding (default: 3)
    pub beam_width: i64,
    /// Maximum number of decoder steps per summary (default: 60)
    pub max_decode_len: i64,
    /// Length-normalization exponent for the final hypothesis ranking
    /// (default: 1.0)
    pub length_norm_exponent: f64,
    /// Device to place the model on (default: CUDA/GPU when available)
    pub device: Device,
}

impl SummarizationConfig {
    pub fn new(
        vocab_resource: Box<dyn ResourceProvider + Send>,
        config_resource: Box<dyn ResourceProvider + Send>,
        weights_resource: Box<dyn ResourceProvider + Send>,
    ) -> SummarizationConfig {
        SummarizationConfig {
            vocab_resource,
            config_resource,
            weights_resource,
            max_source_len: 384,
            beam_width: 3,
            max_decode_len: 60,
            length_norm_exponent: 1.0,
            device: Device::cuda_if_available(),
        }
    }
}

/// One summarized input.
#[derive(Debug, Clone)]
pub struct SummaryOutput {
    /// Decoded summary text
    pub text: String,
    /// Length-normalized log-probability of the selected hypothesis
    pub score: f64,
    /// False when the length budget force-terminated decoding
    pub finished: bool,
}

/// # Summarization pipeline over a trained Seq2Sum model
pub struct SummarizationModel {
    vocab: SummaryVocab,
    model: Seq2SumModel,
    generator: SummaryGenerator,
    max_source_len: usize,
    var_store: nn::VarStore,
}

impl SummarizationModel {
    /// Loads the vocabulary, hyperparameters and weights, checks that they
    /// belong together and builds the search driver.
    ///
    /// # Arguments
    ///
    /// * `config` - `SummarizationConfig` naming the artifacts and decoding
    ///   parameters
    pub fn new(config: SummarizationConfig) -> Result<SummarizationModel, SummarizerError> {
        let generator = SummaryGenerator::new(GenerateConfig {
            beam_width: config.beam_width,
            max_decode_len: config.max_decode_len,
            length_norm_exponent: config.length_norm_exponent,
            include_eos_token: false,
            device: config.device,
        })?;

        let vocab_path = config.vocab_resource.get_local_path()?;
        let config_path = config.config_resource.get_local_path()?;
        let weights_path = config.weights_resource.get_local_path()?;

        let vocab = SummaryVocab::from_file(vocab_path)?;
        let model_config = Seq2SumConfig::from_file(config_path);
        model_config.validate_against_vocab(&vocab)?;

        let mut var_store = nn::VarStore::new(config.device);
        let model = Seq2SumModel::new(&var_store.root(), &model_config);
        var_store.load(weights_path)?;

        Ok(SummarizationModel {
            vocab,
            model,
            generator,
            max_source_len: config.max_source_len,
            var_store,
        })
    }

    /// Device the model parameters live on.
    pub fn device(&self) -> Device {
        self.var_store.device()
    }

    /// Summarizes a batch of texts.
    ///
    /// Encoding errors (e.g. empty input) surface immediately with the
    /// offending input retained. Decoding never fails on imperfect output:
    /// a summary that hit the length budget is returned with `finished`
    /// unset.
    pub fn summarize(&self, texts: &[&str]) -> Result<Vec<SummaryOutput>, SummarizerError> {
        texts
            .iter()
            .map(|text| {
                let source_ids = self.vocab.encode(text, self.max_source_len)?;
                let best = if self.generator.config().beam_width > 1 {
                    self.generator
                        .beam_search(&self.model, &source_ids)?
                        .into_iter()
                        .next()
                        .expect("beam search returns at least one hypothesis")
                } else {
                    self.generator.greedy_search(&self.model, &source_ids)?
                };
                Ok(SummaryOutput {
                    text: self.vocab.decode(&best.token_ids),
                    score: best.score,
                    finished: best.finished,
                })
            })
            .collect()
    }
}
