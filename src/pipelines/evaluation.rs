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

//! # Evaluation boundaries
//!
//! The ROUGE metric and the remote LLM summarization path are external
//! collaborators: both are modelled as opaque traits with no internal
//! contract beyond text in, text or scores out. This crate only guarantees
//! that candidate and reference strings handed to a scorer are well formed.

use crate::common::error::SummarizerError;
use crate::pipelines::summarization::SummarizationModel;

/// ROUGE sub-metric scores for one (candidate, reference) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RougeScores {
    pub rouge_1: f64,
    pub rouge_2: f64,
    pub rouge_l: f64,
}

/// Black-box scorer over (candidate, reference) text pairs.
pub trait SummaryScorer {
    fn score(&self, candidate: &str, reference: &str) -> Result<RougeScores, SummarizerError>;
}

/// Black-box alternate summarization path backed by a remote LLM API.
pub trait RemoteSummarizer {
    fn summarize(&self, text: &str) -> Result<String, SummarizerError>;
}

/// Evaluation results over a dataset of (source, reference) pairs.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// Per-pair scores, in input order
    pub scores: Vec<RougeScores>,
    /// Arithmetic mean over all pairs
    pub mean: RougeScores,
}

/// Runs the model over every source text and scores the generated candidate
/// against its reference.
pub fn evaluate_model(
    model: &SummarizationModel,
    scorer: &dyn SummaryScorer,
    pairs: &[(String, String)],
) -> Result<EvaluationReport, SummarizerError> {
    if pairs.is_empty() {
        return Err(SummarizerError::ConfigurationError(
            "cannot evaluate on an empty set of pairs".into(),
        ));
    }
    let mut scores = Vec::with_capacity(pairs.len());
    for (source, reference) in pairs {
        let output = model.summarize(&[source.as_str()])?;
        let candidate = &output[0].text;
        scores.push(scorer.score(candidate, reference)?);
    }
    let count = scores.len() as f64;
    let mean = RougeScores {
        rouge_1: scores.iter().map(|score| score.rouge_1).sum::<f64>() / count,
        rouge_2: scores.iter().map(|score| score.rouge_2).sum::<f64>() / count,
        rouge_l: scores.iter().map(|score| score.rouge_l).sum::<f64>() / count,
    };
    Ok(EvaluationReport { scores, mean })
}
