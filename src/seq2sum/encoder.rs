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
use crate::seq2sum::seq2sum_model::Seq2SumConfig;
use std::borrow::Borrow;
use tch::nn::{LSTMState, RNNConfig, RNN};
use tch::{nn, Tensor};

/// Encoder pass outputs.
pub struct EncoderOutput {
    /// Hidden state for every source timestep, shape
    /// (*batch size*, *source length*, *hidden size*). Padded timesteps are
    /// zeroed.
    pub hidden_states: Tensor,
    /// Recurrent state frozen at each sequence's true last timestep; seeds
    /// the decoder.
    pub final_state: LSTMState,
}

/// # Recurrent source encoder
///
/// Runs the embedded source batch through an LSTM cell one timestep at a
/// time, in lockstep across the batch. Padded timesteps still run, but their
/// hidden states are masked to zero and the final-state summary stops
/// advancing past each sequence's true length — downstream consumers never
/// observe padding. Deterministic given parameters and input (dropout only
/// active in training mode).
#[derive(Debug)]
pub struct RecurrentEncoder {
    lstm: nn::LSTM,
    dropout: Dropout,
}

impl RecurrentEncoder {
    pub fn new<'p, P>(p: P, config: &Seq2SumConfig) -> RecurrentEncoder
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();
        let rnn_config = RNNConfig {
            num_layers: config.n_layers,
            ..Default::default()
        };
        let lstm = nn::lstm(p / "lstm", config.d_embed, config.d_hidden, rnn_config);
        let dropout = Dropout::new(config.dropout);
        RecurrentEncoder { lstm, dropout }
    }

    /// Encodes an embedded source batch.
    ///
    /// # Arguments
    ///
    /// * `embedded_source` - Embedded tokens of shape
    ///   (*batch size*, *source length*, *embedding size*)
    /// * `source_mask` - Float mask of shape (*batch size*, *source length*),
    ///   1 at valid positions and 0 at padded positions
    /// * `train` - Enables dropout on the embedded inputs
    pub fn forward_t(
        &self,
        embedded_source: &Tensor,
        source_mask: &Tensor,
        train: bool,
    ) -> EncoderOutput {
        let embedded = embedded_source.apply_t(&self.dropout, train);
        let (batch_size, source_length) = (embedded.size()[0], embedded.size()[1]);

        let mut state = self.lstm.zero_state(batch_size);
        let mut final_h = state.h();
        let mut final_c = state.c();
        let mut step_states = Vec::with_capacity(source_length as usize);

        for position in 0..source_length {
            let step_input = embedded.select(1, position);
            state = self.lstm.step(&step_input, &state);
            let step_mask = source_mask.select(1, position).unsqueeze(-1);
            step_states.push(state.h().select(0, -1) * &step_mask);
            let state_mask = step_mask.unsqueeze(0);
            final_h = &final_h + (state.h() - &final_h) * &state_mask;
            final_c = &final_c + (state.c() - &final_c) * &state_mask;
        }

        EncoderOutput {
            hidden_states: Tensor::stack(&step_states, 1),
            final_state: LSTMState((final_h, final_c)),
        }
    }
}
