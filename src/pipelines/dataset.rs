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

//! # Training dataset handling
//!
//! Reads the JSON-Lines training sets produced by the extraction tool (one
//! record per document with the extracted text and its reference summary) and
//! assembles padded mini-batches. Every batch carries a float mask built from
//! the true sequence lengths, so that padding never contributes to attention
//! or loss.

use crate::common::error::SummarizerError;
use crate::seq2sum::length_mask;
use crate::vocab::SummaryVocab;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tch::kind::Kind::Int64;
use tch::{Device, Tensor};

/// One record of the JSON-Lines training set. Field names follow the
/// extraction tool's output format.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryRecord {
    #[serde(rename = "pdf_filename", default)]
    pub filename: Option<String>,
    #[serde(rename = "extracted_text")]
    pub text: String,
    #[serde(rename = "gemini_summary")]
    pub summary: String,
}

/// # Dataset of (source text, reference summary) pairs
pub struct SummaryDataset {
    pub records: Vec<SummaryRecord>,
}

impl SummaryDataset {
    /// Loads a dataset from a JSON-Lines file. Blank lines are skipped;
    /// malformed records are rejected with their line number.
    pub fn from_jsonl<P: AsRef<Path>>(path: P) -> Result<SummaryDataset, SummarizerError> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();
        for (line_index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: SummaryRecord = serde_json::from_str(&line).map_err(|error| {
                SummarizerError::IOError(format!(
                    "invalid dataset record on line {}: {}",
                    line_index + 1,
                    error
                ))
            })?;
            records.push(record);
        }
        Ok(SummaryDataset { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Encodes every record through the vocabulary adapter, truncating
    /// sources and targets to their respective maximum lengths.
    pub fn encode(
        &self,
        vocab: &SummaryVocab,
        max_source_len: usize,
        max_target_len: usize,
    ) -> Result<Vec<EncodedExample>, SummarizerError> {
        self.records
            .iter()
            .map(|record| {
                Ok(EncodedExample {
                    source_ids: vocab.encode(&record.text, max_source_len)?,
                    target_ids: vocab.encode(&record.summary, max_target_len)?,
                })
            })
            .collect()
    }
}

/// A tokenized (source, target) pair.
#[derive(Debug, Clone)]
pub struct EncodedExample {
    pub source_ids: Vec<i64>,
    pub target_ids: Vec<i64>,
}

/// # Padded mini-batch
///
/// Sequences are padded to the batch maximum; the masks are derived from the
/// recorded lengths, not from token values.
pub struct SummaryBatch {
    /// Source token ids, shape (*batch size*, *source length*)
    pub source_ids: Tensor,
    /// Float mask over source positions
    pub source_mask: Tensor,
    /// Target token ids, shape (*batch size*, *target length*)
    pub target_ids: Tensor,
    /// Float mask over target positions
    pub target_mask: Tensor,
    /// True source lengths
    pub source_lengths: Vec<i64>,
    /// True target lengths
    pub target_lengths: Vec<i64>,
}

impl SummaryBatch {
    pub fn new(examples: &[EncodedExample], pad_token_id: i64, device: Device) -> SummaryBatch {
        let source_lengths = examples
            .iter()
            .map(|example| example.source_ids.len() as i64)
            .collect::<Vec<i64>>();
        let target_lengths = examples
            .iter()
            .map(|example| example.target_ids.len() as i64)
            .collect::<Vec<i64>>();
        let max_source = *source_lengths.iter().max().unwrap_or(&1);
        let max_target = *target_lengths.iter().max().unwrap_or(&1);

        let source_ids = stack_padded(
            examples.iter().map(|example| example.source_ids.as_slice()),
            max_source,
            pad_token_id,
            device,
        );
        let target_ids = stack_padded(
            examples.iter().map(|example| example.target_ids.as_slice()),
            max_target,
            pad_token_id,
            device,
        );
        let source_mask = length_mask(&source_lengths, max_source, device);
        let target_mask = length_mask(&target_lengths, max_target, device);
        SummaryBatch {
            source_ids,
            source_mask,
            target_ids,
            target_mask,
            source_lengths,
            target_lengths,
        }
    }

    pub fn batch_size(&self) -> i64 {
        self.source_lengths.len() as i64
    }
}

/// Splits encoded examples into padded batches of at most `batch_size`
/// elements, in dataset order.
pub fn batch_examples(
    examples: &[EncodedExample],
    batch_size: usize,
    pad_token_id: i64,
    device: Device,
) -> Vec<SummaryBatch> {
    examples
        .chunks(batch_size)
        .map(|chunk| SummaryBatch::new(chunk, pad_token_id, device))
        .collect()
}

fn stack_padded<'a>(
    sequences: impl Iterator<Item = &'a [i64]>,
    padded_length: i64,
    pad_token_id: i64,
    device: Device,
) -> Tensor {
    let rows = sequences
        .map(|sequence| {
            let mut padded = sequence.to_vec();
            padded.resize(padded_length as usize, pad_token_id);
            Tensor::of_slice(&padded)
        })
        .collect::<Vec<Tensor>>();
    Tensor::stack(&rows, 0).to_kind(Int64).to_device(device)
}
