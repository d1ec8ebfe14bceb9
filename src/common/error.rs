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

use rust_tokenizers::error::TokenizerError;
use tch::TchError;
use thiserror::Error;

/// # Errors for the summarization crate
///
/// `EncodingError` and `ConfigurationError` surface immediately to the caller
/// with the offending input retained in the message. `DivergenceError` is fatal
/// for a training run: it aborts the current run without touching the last
/// checkpoint. Decoding that merely hits the maximum length is not an error
/// (see `GeneratedSummary::finished`).
#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Invalid configuration error: {0}")]
    ConfigurationError(String),

    #[error("Training diverged: {0}")]
    DivergenceError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Tch tensor error: {0}")]
    TchError(String),

    #[error("Tokenizer error: {0}")]
    TokenizerError(String),

    #[error("File download error: {0}")]
    FileDownloadError(String),
}

impl From<std::io::Error> for SummarizerError {
    fn from(error: std::io::Error) -> Self {
        SummarizerError::IOError(error.to_string())
    }
}

impl From<TchError> for SummarizerError {
    fn from(error: TchError) -> Self {
        SummarizerError::TchError(error.to_string())
    }
}

impl From<TokenizerError> for SummarizerError {
    fn from(error: TokenizerError) -> Self {
        SummarizerError::TokenizerError(error.to_string())
    }
}

impl From<cached_path::Error> for SummarizerError {
    fn from(error: cached_path::Error) -> Self {
        SummarizerError::FileDownloadError(error.to_string())
    }
}
