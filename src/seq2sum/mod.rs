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

//! # Seq2Sum: attention-based recurrent encoder-decoder for summarization
//!
//! The base model is implemented in the `seq2sum::Seq2SumModel` struct: a
//! shared token embedding table, an LSTM encoder run one timestep at a time,
//! an additive (Bahdanau-style) attention module and an autoregressive LSTM
//! decoder with an output-vocabulary projection.
//!
//! Recurrent state is threaded explicitly: the encoder returns an
//! `EncoderOutput` holding the per-timestep hidden states and the final state
//! taken at each sequence's true length, and every decoder step maps
//! `(previous token, previous state)` to a `DecoderOutput`. Padded timesteps
//! are run but masked out of the hidden-state sequence, the final-state
//! summary, the attention distribution and the training loss.
//!
//! The model is fitted by `pipelines::training` and driven at inference time
//! by the greedy and beam search drivers in `pipelines::generation`.

mod attention;
mod decoder;
mod embeddings;
mod encoder;
mod seq2sum_model;

pub use attention::AdditiveAttention;
pub use decoder::{AttentionDecoder, DecoderOutput};
pub use embeddings::TokenEmbeddings;
pub use encoder::{EncoderOutput, RecurrentEncoder};
pub use seq2sum_model::{length_mask, Seq2SumConfig, Seq2SumModel};
