use rust_seq2sum::vocab::SummaryVocab;
use rust_seq2sum::SummarizerError;

/// Requires a real SentencePiece artifact; point `SEQ2SUM_SPM_MODEL` at a
/// model trained with `<pad>`, `<s>`, `</s>` and `<unk>` pieces and run with
/// `cargo test -- --ignored`.
#[test]
#[ignore]
fn encode_decode_round_trip() -> anyhow::Result<()> {
    let model_path = std::env::var("SEQ2SUM_SPM_MODEL")?;
    let vocab = SummaryVocab::from_file(&model_path)?;

    let text = "The ministry announced a new scheme for farmers today.";
    let token_ids = vocab.encode(text, 128)?;

    assert_eq!(token_ids.first(), Some(&vocab.bos_token_id));
    assert_eq!(token_ids.last(), Some(&vocab.eos_token_id));
    assert!(token_ids.iter().all(|id| *id >= 0 && *id < vocab.vocab_size));

    if !token_ids.contains(&vocab.unk_token_id) {
        assert_eq!(vocab.decode(&token_ids), text);
    }
    Ok(())
}

#[test]
#[ignore]
fn encode_truncates_to_the_configured_maximum() -> anyhow::Result<()> {
    let model_path = std::env::var("SEQ2SUM_SPM_MODEL")?;
    let vocab = SummaryVocab::from_file(&model_path)?;

    let text = "One sentence. ".repeat(200);
    let token_ids = vocab.encode(&text, 32)?;
    assert_eq!(token_ids.len(), 32);
    assert_eq!(token_ids.last(), Some(&vocab.eos_token_id));
    Ok(())
}

#[test]
#[ignore]
fn empty_text_surfaces_as_an_encoding_error() -> anyhow::Result<()> {
    let model_path = std::env::var("SEQ2SUM_SPM_MODEL")?;
    let vocab = SummaryVocab::from_file(&model_path)?;
    match vocab.encode("   ", 32) {
        Err(SummarizerError::EncodingError(_)) => Ok(()),
        other => panic!("expected EncodingError, got {:?}", other),
    }
}
