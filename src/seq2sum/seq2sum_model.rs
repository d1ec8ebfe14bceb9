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

use crate::common::error::SummarizerError;
use crate::seq2sum::decoder::{AttentionDecoder, DecoderOutput};
use crate::seq2sum::embeddings::TokenEmbeddings;
use crate::seq2sum::encoder::{EncoderOutput, RecurrentEncoder};
use crate::vocab::SummaryVocab;
use crate::Config;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use tch::kind::Kind::Float;
use tch::nn::LSTMState;
use tch::{nn, Device, Tensor};

/// # Seq2Sum model configuration
///
/// Loaded from a JSON file alongside the weights. The special-token ids and
/// vocabulary size duplicate what the SentencePiece artifact defines; the
/// duplication is deliberate, so that a weights file can be checked against
/// the vocabulary it was trained with (`validate_against_vocab`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seq2SumConfig {
    pub vocab_size: i64,
    pub d_embed: i64,
    pub d_hidden: i64,
    pub d_attention: i64,
    pub n_layers: i64,
    pub dropout: f64,
    pub pad_token_id: i64,
    pub bos_token_id: i64,
    pub eos_token_id: i64,
    pub unk_token_id: i64,
}

impl Config for Seq2SumConfig {}

impl Seq2SumConfig {
    /// Checks that this configuration was produced against the given
    /// vocabulary. Token ids are stable for the lifetime of a trained model;
    /// a mismatch means the weights are unusable with this artifact.
    pub fn validate_against_vocab(&self, vocab: &SummaryVocab) -> Result<(), SummarizerError> {
        if self.vocab_size != vocab.vocab_size
            || self.pad_token_id != vocab.pad_token_id
            || self.bos_token_id != vocab.bos_token_id
            || self.eos_token_id != vocab.eos_token_id
            || self.unk_token_id != vocab.unk_token_id
        {
            return Err(SummarizerError::ConfigurationError(format!(
                "model configuration does not match the vocabulary artifact \
                 (configured vocab_size {} / special ids {:?}, artifact vocab_size {} / special ids {:?})",
                self.vocab_size,
                (self.pad_token_id, self.bos_token_id, self.eos_token_id, self.unk_token_id),
                vocab.vocab_size,
                (vocab.pad_token_id, vocab.bos_token_id, vocab.eos_token_id, vocab.unk_token_id),
            )));
        }
        Ok(())
    }
}

/// # Attention-based recurrent encoder-decoder
///
/// Owns the shared embedding table, the encoder and the decoder. Parameters
/// live in the `VarStore` the model was built on: they are mutated only by
/// the training loop's optimizer step and read as a frozen snapshot (inside
/// `no_grad`) during decoding.
pub struct Seq2SumModel {
    embeddings: TokenEmbeddings,
    encoder: RecurrentEncoder,
    decoder: AttentionDecoder,
    /// Padding token id
    pub pad_token_id: i64,
    /// Sequence start token id
    pub bos_token_id: i64,
    /// Sequence end token id
    pub eos_token_id: i64,
    /// Output vocabulary size
    pub vocab_size: i64,
}

impl Seq2SumModel {
    /// Builds the model on the given variable-store path.
    ///
    /// # Arguments
    ///
    /// * `p` - Variable store path, e.g. `&vs.root()`
    /// * `config` - `Seq2SumConfig` hyperparameters
    pub fn new<'p, P>(p: P, config: &Seq2SumConfig) -> Seq2SumModel
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();
        let embeddings = TokenEmbeddings::new(
            p / "embeddings",
            config.vocab_size,
            config.d_embed,
            config.pad_token_id,
        );
        let encoder = RecurrentEncoder::new(p / "encoder", config);
        let decoder = AttentionDecoder::new(p / "decoder", config);
        Seq2SumModel {
            embeddings,
            encoder,
            decoder,
            pad_token_id: config.pad_token_id,
            bos_token_id: config.bos_token_id,
            eos_token_id: config.eos_token_id,
            vocab_size: config.vocab_size,
        }
    }

    /// Encodes a source batch into per-timestep hidden states and a final
    /// state.
    ///
    /// # Arguments
    ///
    /// * `source_ids` - Token ids of shape (*batch size*, *source length*)
    /// * `source_mask` - Float mask built from the true sequence lengths (see
    ///   `length_mask`); masking is driven by lengths, not by token values,
    ///   so the content of the padded suffix is irrelevant
    /// * `train` - Enables dropout
    pub fn encode_t(&self, source_ids: &Tensor, source_mask: &Tensor, train: bool) -> EncoderOutput {
        let embedded = self.embeddings.forward(source_ids);
        self.encoder.forward_t(&embedded, source_mask, train)
    }

    /// Runs one decoder step for a batch of previous tokens.
    ///
    /// # Arguments
    ///
    /// * `prev_tokens` - Previous output token ids, shape (*batch size*,)
    /// * `prev_state` - Recurrent state from the previous step (the encoder's
    ///   final state on the first step)
    /// * `encoder_states` - Encoder hidden-state sequence
    /// * `source_mask` - Float mask over source positions
    /// * `train` - Enables dropout
    pub fn decode_step_t(
        &self,
        prev_tokens: &Tensor,
        prev_state: &LSTMState,
        encoder_states: &Tensor,
        source_mask: &Tensor,
        train: bool,
    ) -> DecoderOutput {
        let embedded = self.embeddings.forward(prev_tokens);
        self.decoder
            .step_t(&embedded, prev_state, encoder_states, source_mask, train)
    }
}

/// Builds a float mask of shape (*batch size*, *max_length*) with 1 at
/// positions below each sequence's length and 0 elsewhere.
pub fn length_mask(lengths: &[i64], max_length: i64, device: Device) -> Tensor {
    let positions = Tensor::arange(max_length, (Float, device)).unsqueeze(0);
    let lengths = Tensor::of_slice(lengths)
        .to_kind(Float)
        .to_device(device)
        .unsqueeze(-1);
    positions.lt1(&lengths).to_kind(Float)
}
