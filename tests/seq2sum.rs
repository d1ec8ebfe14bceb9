use rust_seq2sum::seq2sum::{length_mask, Seq2SumConfig, Seq2SumModel};
use tch::kind::Kind::{Float, Int64};
use tch::nn::LSTMState;
use tch::{nn, no_grad, Device, Tensor};

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

/// Batch of two sequences with true lengths 5 and 3, padded to 5.
fn toy_batch(padded_suffix_value: i64) -> (Tensor, Tensor) {
    let source_ids = Tensor::of_slice(&[
        1,
        7,
        8,
        9,
        2,
        1,
        5,
        2,
        padded_suffix_value,
        padded_suffix_value,
    ])
    .view((2, 5))
    .to_kind(Int64);
    let source_mask = length_mask(&[5, 3], 5, Device::Cpu);
    (source_ids, source_mask)
}

#[test]
fn encoder_zeroes_hidden_states_at_padded_positions() -> anyhow::Result<()> {
    let (_vs, model) = toy_model(7);
    let (source_ids, source_mask) = toy_batch(0);
    let encoder_output = no_grad(|| model.encode_t(&source_ids, &source_mask, false));

    let padded_states = encoder_output.hidden_states.narrow(1, 3, 2).narrow(0, 1, 1);
    assert!(f64::from(&padded_states.abs().max()) == 0.0);
    let valid_states = encoder_output.hidden_states.narrow(1, 0, 3).narrow(0, 1, 1);
    assert!(f64::from(&valid_states.abs().max()) > 0.0);
    Ok(())
}

#[test]
fn attention_weights_are_zero_on_padding_and_sum_to_one() -> anyhow::Result<()> {
    let (_vs, model) = toy_model(7);
    let (source_ids, source_mask) = toy_batch(0);
    let output = no_grad(|| {
        let encoder_output = model.encode_t(&source_ids, &source_mask, false);
        let prev_tokens = Tensor::of_slice(&[1i64, 1]);
        model.decode_step_t(
            &prev_tokens,
            &encoder_output.final_state,
            &encoder_output.hidden_states,
            &source_mask,
            false,
        )
    });

    let weights = output.attention_weights;
    assert_eq!(weights.size(), &[2, 5]);
    let padded_weights = weights.narrow(0, 1, 1).narrow(1, 3, 2);
    assert!(f64::from(&padded_weights.abs().max()) == 0.0);
    for row in 0..2 {
        let total = f64::from(&weights.get(row).sum(Float));
        assert!((total - 1.0).abs() < 1e-6);
    }
    Ok(())
}

#[test]
fn padded_suffix_content_does_not_leak_into_other_sequences() -> anyhow::Result<()> {
    let (_vs, model) = toy_model(11);
    let (source_ids_a, source_mask) = toy_batch(0);
    let (source_ids_b, _) = toy_batch(9);

    let step = |source_ids: &Tensor| {
        no_grad(|| {
            let encoder_output = model.encode_t(source_ids, &source_mask, false);
            let prev_tokens = Tensor::of_slice(&[1i64, 1]);
            let output = model.decode_step_t(
                &prev_tokens,
                &encoder_output.final_state,
                &encoder_output.hidden_states,
                &source_mask,
                false,
            );
            (output.attention_weights, output.vocab_logits)
        })
    };

    let (weights_a, logits_a) = step(&source_ids_a);
    let (weights_b, logits_b) = step(&source_ids_b);

    let weight_gap = f64::from(&(weights_a - weights_b).abs().max());
    let logit_gap = f64::from(&(logits_a - logits_b).abs().max());
    assert!(weight_gap < 1e-6);
    assert!(logit_gap < 1e-6);
    Ok(())
}

#[test]
fn encoder_final_state_freezes_at_true_length() -> anyhow::Result<()> {
    let (_vs, model) = toy_model(13);
    let (source_ids, source_mask) = toy_batch(0);

    // The same short sequence without padding must produce the same final
    // state as its padded counterpart.
    let short_ids = Tensor::of_slice(&[1i64, 5, 2]).view((1, 3));
    let short_mask = length_mask(&[3], 3, Device::Cpu);

    let (padded_final, short_final) = no_grad(|| {
        let padded = model.encode_t(&source_ids, &source_mask, false);
        let short = model.encode_t(&short_ids, &short_mask, false);
        (padded.final_state, short.final_state)
    });

    let padded_h = padded_final.h().narrow(1, 1, 1);
    let gap = f64::from(&(padded_h - short_final.h()).abs().max());
    assert!(gap < 1e-6);
    Ok(())
}

#[test]
fn decoder_step_is_a_pure_function_of_its_inputs() -> anyhow::Result<()> {
    let (_vs, model) = toy_model(17);
    let (source_ids, source_mask) = toy_batch(0);

    let run = || {
        no_grad(|| {
            let encoder_output = model.encode_t(&source_ids, &source_mask, false);
            let prev_tokens = Tensor::of_slice(&[4i64, 6]);
            let state = LSTMState((
                encoder_output.final_state.h(),
                encoder_output.final_state.c(),
            ));
            let output = model.decode_step_t(
                &prev_tokens,
                &state,
                &encoder_output.hidden_states,
                &source_mask,
                false,
            );
            output.vocab_logits
        })
    };

    let gap = f64::from(&(run() - run()).abs().max());
    assert!(gap == 0.0);
    Ok(())
}
