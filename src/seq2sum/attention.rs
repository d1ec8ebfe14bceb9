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

use crate::common::linear::{linear_no_bias, LinearNoBias};
use std::borrow::Borrow;
use tch::kind::Kind::Float;
use tch::{nn, Tensor};

/// # Additive (Bahdanau-style) attention
///
/// Scores each encoder hidden state against the decoder query through a
/// learned additive projection, `e_i = v · tanh(W_q q + W_h h_i)`, masks
/// padded source positions to negative infinity, and normalizes with a
/// softmax over the valid positions. The resulting weights are exactly zero
/// at padded positions and sum to one over the valid ones; the context vector
/// is their weighted sum of encoder states.
#[derive(Debug)]
pub struct AdditiveAttention {
    query_proj: nn::Linear,
    key_proj: nn::Linear,
    score_proj: LinearNoBias,
}

impl AdditiveAttention {
    pub fn new<'p, P>(p: P, hidden_dim: i64, attention_dim: i64) -> AdditiveAttention
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();
        let query_proj = nn::linear(p / "query_proj", hidden_dim, attention_dim, Default::default());
        let key_proj = nn::linear(p / "key_proj", hidden_dim, attention_dim, Default::default());
        let score_proj = linear_no_bias(p / "score_proj", attention_dim, 1, Default::default());
        AdditiveAttention {
            query_proj,
            key_proj,
            score_proj,
        }
    }

    /// Computes the attention context and alignment weights for one decoder
    /// step.
    ///
    /// # Arguments
    ///
    /// * `query` - Decoder hidden state of shape (*batch size*, *hidden size*)
    /// * `encoder_states` - Encoder hidden-state sequence of shape
    ///   (*batch size*, *source length*, *hidden size*)
    /// * `source_mask` - Float mask of shape (*batch size*, *source length*),
    ///   1 at valid positions and 0 at padded positions
    ///
    /// # Returns
    ///
    /// * `(context, weights)` - Context of shape (*batch size*, *hidden size*)
    ///   and alignment weights of shape (*batch size*, *source length*)
    pub fn forward(
        &self,
        query: &Tensor,
        encoder_states: &Tensor,
        source_mask: &Tensor,
    ) -> (Tensor, Tensor) {
        let scores = (query.apply(&self.query_proj).unsqueeze(1)
            + encoder_states.apply(&self.key_proj))
        .tanh()
        .apply(&self.score_proj)
        .squeeze1(-1);
        let scores = scores.masked_fill(&source_mask.eq(0.), std::f64::NEG_INFINITY);
        let weights = scores.softmax(-1, Float);
        let context = weights.unsqueeze(1).bmm(encoder_states).squeeze1(1);
        (context, weights)
    }
}
