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

use std::borrow::Borrow;
use tch::nn::{embedding, EmbeddingConfig};
use tch::{nn, Tensor};

/// # Token embedding table shared by the encoder and the decoder
///
/// Pure lookup from token id to a dense vector of dimension `d_embed`, with
/// the padding row pinned at the padding index. Gradients accumulate through
/// the lookup during training.
#[derive(Debug)]
pub struct TokenEmbeddings {
    embedding: nn::Embedding,
}

impl TokenEmbeddings {
    pub fn new<'p, P>(
        p: P,
        vocab_size: i64,
        embed_dim: i64,
        padding_index: i64,
    ) -> TokenEmbeddings
    where
        P: Borrow<nn::Path<'p>>,
    {
        let embedding_config = EmbeddingConfig {
            padding_idx: padding_index,
            ..Default::default()
        };
        let embedding = embedding(p.borrow(), vocab_size, embed_dim, embedding_config);
        TokenEmbeddings { embedding }
    }

    /// Looks up embeddings for a tensor of token ids of any shape, appending
    /// the embedding dimension.
    pub fn forward(&self, token_ids: &Tensor) -> Tensor {
        token_ids.apply(&self.embedding)
    }
}
