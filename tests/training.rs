use rust_seq2sum::pipelines::dataset::EncodedExample;
use rust_seq2sum::pipelines::generation::{GenerateConfig, SummaryGenerator};
use rust_seq2sum::pipelines::training::{SamplingSchedule, SummaryTrainer, TrainConfig};
use rust_seq2sum::seq2sum::Seq2SumConfig;
use rust_seq2sum::SummarizerError;
use std::path::PathBuf;
use tch::Device;

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

fn train_config(checkpoint_dir: PathBuf, epochs: usize) -> TrainConfig {
    TrainConfig {
        batch_size: 4,
        max_source_len: 16,
        max_target_len: 16,
        learning_rate: 0.01,
        epochs,
        checkpoint_interval: 1,
        sampling_schedule: SamplingSchedule::Linear {
            start: 0.0,
            end: 0.1,
        },
        seed: 42,
        checkpoint_dir,
        device: Device::Cpu,
    }
}

/// Tiny copy task: the reference summary repeats the source content ids.
fn copy_examples() -> Vec<EncodedExample> {
    let contents: [&[i64]; 8] = [
        &[4, 5, 6],
        &[6, 5],
        &[7, 8, 9, 10],
        &[5, 9, 4],
        &[10, 4],
        &[8, 6, 7],
        &[9, 10, 5],
        &[4, 7],
    ];
    contents
        .iter()
        .map(|content| {
            let mut sequence = vec![1i64];
            sequence.extend_from_slice(content);
            sequence.push(2);
            EncodedExample {
                source_ids: sequence.clone(),
                target_ids: sequence,
            }
        })
        .collect()
}

#[test]
fn training_reduces_the_loss_on_a_toy_copy_task() -> anyhow::Result<()> {
    let checkpoint_dir = tempfile::tempdir()?;
    tch::manual_seed(3);
    let mut trainer = SummaryTrainer::new(
        &toy_config(),
        train_config(checkpoint_dir.path().to_path_buf(), 30),
    )?;
    let metrics = trainer.train(&copy_examples())?;

    assert_eq!(metrics.epoch_losses.len(), 30);
    assert!(metrics.epoch_losses.iter().all(|loss| loss.is_finite()));
    assert!(metrics.final_loss < metrics.epoch_losses[0]);
    Ok(())
}

#[test]
fn checkpoints_are_written_and_reloadable() -> anyhow::Result<()> {
    let checkpoint_dir = tempfile::tempdir()?;
    tch::manual_seed(5);
    let mut trainer = SummaryTrainer::new(
        &toy_config(),
        train_config(checkpoint_dir.path().to_path_buf(), 2),
    )?;
    trainer.train(&copy_examples())?;

    let first = checkpoint_dir.path().join("seq2sum_epoch_1.ot");
    let second = checkpoint_dir.path().join("seq2sum_epoch_2.ot");
    assert!(first.exists());
    assert!(second.exists());

    // A fresh trainer with the same model configuration can resume from the
    // saved parameters.
    tch::manual_seed(6);
    let mut restored = SummaryTrainer::new(
        &toy_config(),
        train_config(checkpoint_dir.path().to_path_buf(), 2),
    )?;
    restored.load_checkpoint(&second)?;
    Ok(())
}

#[test]
fn seeded_runs_are_reproducible() -> anyhow::Result<()> {
    let run = || -> anyhow::Result<f64> {
        let checkpoint_dir = tempfile::tempdir()?;
        tch::manual_seed(9);
        let mut trainer = SummaryTrainer::new(
            &toy_config(),
            train_config(checkpoint_dir.path().to_path_buf(), 5),
        )?;
        Ok(trainer.train(&copy_examples())?.final_loss)
    };

    let first = run()?;
    let second = run()?;
    assert!((first - second).abs() < 1e-9);
    Ok(())
}

#[test]
fn empty_dataset_is_a_configuration_error() -> anyhow::Result<()> {
    let checkpoint_dir = tempfile::tempdir()?;
    tch::manual_seed(12);
    let mut trainer = SummaryTrainer::new(
        &toy_config(),
        train_config(checkpoint_dir.path().to_path_buf(), 1),
    )?;
    match trainer.train(&[]) {
        Err(SummarizerError::ConfigurationError(_)) => Ok(()),
        other => panic!("expected ConfigurationError, got {:?}", other),
    }
}

#[test]
fn invalid_learning_rate_is_rejected() {
    let mut config = train_config(PathBuf::from("checkpoints"), 1);
    config.learning_rate = 0.0;
    assert!(SummaryTrainer::new(&toy_config(), config).is_err());
}

#[test]
fn invalid_sampling_schedule_is_rejected() {
    let mut config = train_config(PathBuf::from("checkpoints"), 1);
    config.sampling_schedule = SamplingSchedule::Linear {
        start: 0.5,
        end: 0.1,
    };
    assert!(SummaryTrainer::new(&toy_config(), config).is_err());
}

#[test]
fn trained_model_beam_search_returns_a_ranked_terminated_summary() -> anyhow::Result<()> {
    let checkpoint_dir = tempfile::tempdir()?;
    tch::manual_seed(15);
    let mut trainer = SummaryTrainer::new(
        &toy_config(),
        train_config(checkpoint_dir.path().to_path_buf(), 30),
    )?;
    trainer.train(&copy_examples())?;

    let generator = SummaryGenerator::new(GenerateConfig {
        beam_width: 3,
        max_decode_len: 10,
        length_norm_exponent: 1.0,
        include_eos_token: true,
        device: Device::Cpu,
    })?;
    let source = [1i64, 7, 8, 9, 10, 2];
    let summaries = generator.beam_search(trainer.model(), &source)?;

    let best = &summaries[0];
    assert!(!best.token_ids.is_empty());
    assert!(best.finished && best.token_ids.last() == Some(&2) || best.token_ids.len() == 10);
    for other in summaries.iter().skip(1) {
        assert!(best.score >= other.score);
    }
    Ok(())
}
