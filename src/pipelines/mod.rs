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

//! # End-to-end pipelines over the Seq2Sum model
//!
//! - `summarization`: text-in/text-out summarization over a trained model
//! - `generation`: greedy and beam search drivers and their configuration
//! - `training`: scheduled-sampling training loop with checkpointing
//! - `dataset`: JSON-Lines training sets and padded batch assembly
//! - `evaluation`: opaque ROUGE and remote-LLM boundaries

pub mod dataset;
pub mod evaluation;
pub mod generation;
pub mod summarization;
pub mod training;
