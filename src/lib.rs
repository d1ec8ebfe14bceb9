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

//! # Abstractive summarization with an attention-based recurrent encoder-decoder
//!
//! This crate turns extracted document text into short abstractive summaries.
//! A shared-embedding LSTM encoder-decoder with additive attention
//! (`seq2sum`) is fitted with scheduled sampling (`pipelines::training`) and
//! decoded with greedy or beam search (`pipelines::generation`). Text crosses
//! the model boundary through a SentencePiece vocabulary adapter (`vocab`)
//! whose vocabulary size and special ids are read from the pretrained
//! artifact.
//!
//! The ready-to-use entry point is `pipelines::summarization`:
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use rust_seq2sum::pipelines::summarization::{SummarizationConfig, SummarizationModel};
//! use rust_seq2sum::resources::LocalResource;
//! use std::path::PathBuf;
//!
//! let config = SummarizationConfig::new(
//!     Box::new(LocalResource::from(PathBuf::from("artifacts/spiece.model"))),
//!     Box::new(LocalResource::from(PathBuf::from("artifacts/config.json"))),
//!     Box::new(LocalResource::from(PathBuf::from("artifacts/model.ot"))),
//! );
//! let model = SummarizationModel::new(config)?;
//! let summaries = model.summarize(&["Document text to summarize."])?;
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod pipelines;
pub mod seq2sum;
pub mod vocab;

pub use common::error::SummarizerError;
pub use common::resources;
pub use common::Config;
