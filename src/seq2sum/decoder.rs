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

use crate::common::dropout::Dropout;
use crate::seq2sum::attention::AdditiveAttention;
use crate::seq2sum::seq2sum_model::Seq2SumConfig;
use std::borrow::Borrow;
use tch::nn::{LSTMState, RNNConfig, RNN};
use tch::{nn, Tensor};

/// Outputs of a single decoder step.
pub struct DecoderOutput {
    /// Recurrent state to thread into the next step
    pub state: LSTMState,
    /// Unnormalized scores over the vocabulary, shape
    /// (*batch size*, *vocabulary size*)
    pub vocab_logits: Tensor,
    /// Alignment weights over source positions, shape
    /// (*batch size*, *source length*)
    pub attention_weights: Tensor,
}

/// # Autoregressive attention decoder
///
/// One step maps `(previous token embedding, previous state)` to a new state
/// and an output-vocabulary distribution:
///
/// 1. the previous hidden state queries the encoder states through
///    `AdditiveAttention`, yielding a context vector;
/// 2. the concatenation of the token embedding and the context feeds the LSTM
///    cell together with the previous state;
/// 3. the concatenation of the new hidden state and the context is projected
///    to vocabulary logits.
///
/// The initial state is seeded from the encoder's final state; the first
/// input token is the start id. Termination (end id emitted, or the step
/// budget exhausted) is the caller's concern: training and both search
/// drivers share this step function.
#[derive(Debug)]
pub struct AttentionDecoder {
    lstm: nn::LSTM,
    attention: AdditiveAttention,
    output_proj: nn::Linear,
    dropout: Dropout,
}

impl AttentionDecoder {
    pub fn new<'p, P>(p: P, config: &Seq2SumConfig) -> AttentionDecoder
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();
        let rnn_config = RNNConfig {
            num_layers: config.n_layers,
            ..Default::default()
        };
        let lstm = nn::lstm(
            p / "lstm",
            config.d_embed + config.d_hidden,
            config.d_hidden,
            rnn_config,
        );
        let attention = AdditiveAttention::new(p / "attention", config.d_hidden, config.d_attention);
        let output_proj = nn::linear(
            p / "output_proj",
            2 * config.d_hidden,
            config.vocab_size,
            Default::default(),
        );
        let dropout = Dropout::new(config.dropout);
        AttentionDecoder {
            lstm,
            attention,
            output_proj,
            dropout,
        }
    }

    /// Runs one decoder step.
    ///
    /// # Arguments
    ///
    /// * `embedded_prev` - Embedding of the previous output token, shape
    ///   (*batch size*, *embedding size*)
    /// * `prev_state` - Recurrent state carried from the previous step
    /// * `encoder_states` - Encoder hidden-state sequence of shape
    ///   (*batch size*, *source length*, *hidden size*)
    /// * `source_mask` - Float mask over source positions
    /// * `train` - Enables dropout on the embedded input
    pub fn step_t(
        &self,
        embedded_prev: &Tensor,
        prev_state: &LSTMState,
        encoder_states: &Tensor,
        source_mask: &Tensor,
        train: bool,
    ) -> DecoderOutput {
        let query = prev_state.h().select(0, -1);
        let (context, attention_weights) =
            self.attention.forward(&query, encoder_states, source_mask);
        let embedded = embedded_prev.apply_t(&self.dropout, train);
        let step_input = Tensor::cat(&[&embedded, &context], -1);
        let state = self.lstm.step(&step_input, prev_state);
        let hidden = state.h().select(0, -1);
        let vocab_logits = Tensor::cat(&[&hidden, &context], -1).apply(&self.output_proj);
        DecoderOutput {
            state,
            vocab_logits,
            attention_weights,
        }
    }
}
