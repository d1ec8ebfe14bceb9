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

//! # Vocabulary adapter
//!
//! Boundary between raw text and token-id sequences. The adapter wraps a
//! pretrained SentencePiece model consumed as a black box: vocabulary size and
//! the ids of the `<pad>`, `<s>`, `</s>` and `<unk>` pieces are read from the
//! artifact, never assumed. Token ids are stable for the lifetime of a trained
//! model; loading weights against a different vocabulary is rejected at
//! model-assembly time (see `pipelines::summarization`).

mod sentence_piece;

pub use sentence_piece::SummaryVocab;
