use rust_seq2sum::pipelines::generation::{GenerateConfig, SummaryGenerator};
use rust_seq2sum::seq2sum::{Seq2SumConfig, Seq2SumModel};
use rust_seq2sum::SummarizerError;
use tch::{nn, Device};

fn toy_config() -> Seq2SumConfig {
    Seq2SumConfig {
        vocab_size: 16,
        d_embed: 8,
        d_hidden: 12,
        d_attention: 10,
        n_layers: 1,
        dropout: 0.0,
        pad_token_id: 0,
        bos_token_id: 1,
        eos_token_id: 2,
        unk_token_id: 3,
    }
}

fn toy_model(seed: i64) -> (nn::VarStore, Seq2SumModel) {
    tch::manual_seed(seed);
    let vs = nn::VarStore::new(Device::Cpu);
    let model = Seq2SumModel::new(&vs.root(), &toy_config());
    (vs, model)
}

fn generate_config(beam_width: i64) -> GenerateConfig {
    GenerateConfig {
        beam_width,
        max_decode_len: 10,
        length_norm_exponent: 1.0,
        include_eos_token: false,
        device: Device::Cpu,
    }
}

const SOURCE: [i64; 6] = [1, 7, 9, 4, 11, 2];

#[test]
fn beam_width_one_matches_greedy_search() -> anyhow::Result<()> {
    let (_vs, model) = toy_model(23);
    let greedy = SummaryGenerator::new(generate_config(1))?;
    let beam = SummaryGenerator::new(generate_config(1))?;

    let greedy_summary = greedy.greedy_search(&model, &SOURCE)?;
    let beam_summaries = beam.beam_search(&model, &SOURCE)?;

    assert_eq!(beam_summaries.len(), 1);
    assert_eq!(beam_summaries[0].token_ids, greedy_summary.token_ids);
    assert_eq!(beam_summaries[0].finished, greedy_summary.finished);
    assert!((beam_summaries[0].score - greedy_summary.score).abs() < 1e-9);
    Ok(())
}

#[test]
fn decoding_is_deterministic_across_runs() -> anyhow::Result<()> {
    let (_vs, model) = toy_model(29);
    let generator = SummaryGenerator::new(generate_config(3))?;

    let first = generator.beam_search(&model, &SOURCE)?;
    let second = generator.beam_search(&model, &SOURCE)?;
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.token_ids, b.token_ids);
        assert!((a.score - b.score).abs() < 1e-12);
    }

    let greedy = SummaryGenerator::new(generate_config(1))?;
    assert_eq!(
        greedy.greedy_search(&model, &SOURCE)?.token_ids,
        greedy.greedy_search(&model, &SOURCE)?.token_ids
    );
    Ok(())
}

#[test]
fn hypotheses_are_ranked_by_normalized_score() -> anyhow::Result<()> {
    let (_vs, model) = toy_model(31);
    let generator = SummaryGenerator::new(generate_config(3))?;

    let summaries = generator.beam_search(&model, &SOURCE)?;
    assert!(!summaries.is_empty());
    assert!(summaries.len() <= 3);
    for pair in summaries.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    Ok(())
}

#[test]
fn length_budget_returns_a_best_effort_summary() -> anyhow::Result<()> {
    let (_vs, model) = toy_model(37);
    let generator = SummaryGenerator::new(generate_config(2))?;

    let summaries = generator.beam_search(&model, &SOURCE)?;
    let best = &summaries[0];
    if best.finished {
        // Terminated on the end id, which was stripped from the output.
        assert!(best.token_ids.len() < 10);
    } else {
        assert_eq!(best.token_ids.len(), 10);
    }
    Ok(())
}

#[test]
fn zero_beam_width_is_rejected_before_any_encoding() {
    match SummaryGenerator::new(generate_config(0)) {
        Err(SummarizerError::ConfigurationError(message)) => {
            assert!(message.contains("beam_width"))
        }
        Err(error) => panic!("expected ConfigurationError, got {:?}", error),
        Ok(_) => panic!("expected ConfigurationError, got a generator"),
    }
}

#[test]
fn negative_beam_width_is_rejected() {
    assert!(SummaryGenerator::new(generate_config(-2)).is_err());
}

#[test]
fn invalid_length_norm_exponent_is_rejected() {
    let mut config = generate_config(2);
    config.length_norm_exponent = f64::NAN;
    assert!(SummaryGenerator::new(config).is_err());
}

#[test]
fn empty_source_is_an_encoding_error() -> anyhow::Result<()> {
    let (_vs, model) = toy_model(41);
    let generator = SummaryGenerator::new(generate_config(2))?;
    match generator.beam_search(&model, &[]) {
        Err(SummarizerError::EncodingError(_)) => Ok(()),
        other => panic!("expected EncodingError, got {:?}", other),
    }
}
