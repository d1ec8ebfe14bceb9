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
use rust_tokenizers::tokenizer::{SentencePieceTokenizer, Tokenizer};
use rust_tokenizers::vocab::SentencePieceVocab;
use std::path::Path;

/// Piece names expected in the SentencePiece artifact. The training tool
/// exports the model with all four registered.
const PAD_PIECE: &str = "<pad>";
const BOS_PIECE: &str = "<s>";
const EOS_PIECE: &str = "</s>";
const UNK_PIECE: &str = "<unk>";

/// # Subword vocabulary wrapping a pretrained SentencePiece model
///
/// `encode` is deterministic: it tokenizes, truncates to the configured
/// maximum and brackets the sequence with the start and end ids. `decode`
/// drops all special ids and re-assembles subwords; it is not guaranteed to
/// invert `encode` when unknown subwords were mapped to `<unk>` (lossy by
/// design).
pub struct SummaryVocab {
    tokenizer: SentencePieceTokenizer,
    /// Number of pieces in the artifact
    pub vocab_size: i64,
    /// Padding token id
    pub pad_token_id: i64,
    /// Sequence start token id
    pub bos_token_id: i64,
    /// Sequence end token id
    pub eos_token_id: i64,
    /// Unknown token id
    pub unk_token_id: i64,
}

impl SummaryVocab {
    /// Loads the vocabulary from a SentencePiece model file.
    ///
    /// Vocabulary size and special-token ids are read from the artifact. A
    /// model file missing any of the four special pieces cannot drive the
    /// summarizer and is rejected with a `ConfigurationError`.
    ///
    /// # Arguments
    ///
    /// * `model_path` - Path to the SentencePiece `.model` file
    pub fn from_file<P: AsRef<Path>>(model_path: P) -> Result<SummaryVocab, SummarizerError> {
        let model_path = model_path.as_ref().to_str().ok_or_else(|| {
            SummarizerError::IOError("SentencePiece model path is not valid unicode".into())
        })?;
        let tokenizer = SentencePieceTokenizer::from_file(model_path, false)?;
        let vocab_size = tokenizer.vocab().values.len() as i64;
        let pad_token_id = special_id(tokenizer.vocab(), PAD_PIECE)?;
        let bos_token_id = special_id(tokenizer.vocab(), BOS_PIECE)?;
        let eos_token_id = special_id(tokenizer.vocab(), EOS_PIECE)?;
        let unk_token_id = special_id(tokenizer.vocab(), UNK_PIECE)?;
        Ok(SummaryVocab {
            tokenizer,
            vocab_size,
            pad_token_id,
            bos_token_id,
            eos_token_id,
            unk_token_id,
        })
    }

    /// Converts text into a token-id sequence bracketed by the start and end
    /// ids, truncated to `max_len` ids in total. Unknown subwords map to the
    /// unknown id.
    ///
    /// # Arguments
    ///
    /// * `text` - Source text. Empty or whitespace-only input is an
    ///   `EncodingError` carrying the offending input.
    /// * `max_len` - Maximum total sequence length, including the start and
    ///   end ids. Must be at least 3 to carry any content.
    pub fn encode(&self, text: &str, max_len: usize) -> Result<Vec<i64>, SummarizerError> {
        validate_input_text(text)?;
        if max_len < 3 {
            return Err(SummarizerError::ConfigurationError(format!(
                "max_len must be at least 3 to encode any content, got {}",
                max_len
            )));
        }
        let tokens = self.tokenizer.tokenize(text);
        let mut token_ids = self.tokenizer.convert_tokens_to_ids(&tokens);
        token_ids.truncate(max_len - 2);
        let mut sequence = Vec::with_capacity(token_ids.len() + 2);
        sequence.push(self.bos_token_id);
        sequence.extend(token_ids);
        sequence.push(self.eos_token_id);
        Ok(sequence)
    }

    /// Converts a token-id sequence back into text, dropping all special ids.
    pub fn decode(&self, token_ids: &[i64]) -> String {
        let content_ids = token_ids
            .iter()
            .copied()
            .filter(|id| !self.is_special(*id))
            .collect::<Vec<i64>>();
        self.tokenizer.decode(content_ids, true, true)
    }

    /// True for the pad, start, end and unknown ids.
    pub fn is_special(&self, token_id: i64) -> bool {
        token_id == self.pad_token_id
            || token_id == self.bos_token_id
            || token_id == self.eos_token_id
            || token_id == self.unk_token_id
    }
}

fn special_id(vocab: &SentencePieceVocab, piece: &str) -> Result<i64, SummarizerError> {
    vocab.values.get(piece).copied().ok_or_else(|| {
        SummarizerError::ConfigurationError(format!(
            "SentencePiece model does not define the {} piece",
            piece
        ))
    })
}

pub(crate) fn validate_input_text(text: &str) -> Result<(), SummarizerError> {
    if text.trim().is_empty() {
        return Err(SummarizerError::EncodingError(format!(
            "cannot encode empty input text: {:?}",
            text
        )));
    }
    Ok(())
}
