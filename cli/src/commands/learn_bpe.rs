//! learn-bpe command implementation.

use clap::Parser;
use std::path::PathBuf;

/// learn-bpe command arguments.
#[derive(Parser)]
pub struct LearnBpeCommand {
    /// Network directory the model is written to
    #[arg(long)]
    pub dnet: PathBuf,

    /// Number of merge operations to learn
    #[arg(short, long)]
    pub merges: usize,

    /// Learn a model for one side only (src or tgt); joint by default
    #[arg(long)]
    pub side: Option<Side>,

    /// Stop when the best pair occurs fewer times than this
    #[arg(long, default_value_t = 2)]
    pub min_frequency: u64,

    /// Tokenization config used to pre-tokenize the input (aggressive mode otherwise)
    #[arg(long)]
    pub token_config: Option<PathBuf>,
}

use anyhow::Result as AnyhowResult;
use nmtprep_core::EncodingWarnings;
use nmtprep_tokenizer::{
    save_bpe_model, NetworkDir, Side, TokenizationMode, Tokenizer, TokenizerConfig,
};
use nmtprep_training::{BpeLearner, LearnConfig, TokenCounter};
use std::time::Instant;
use tracing::info;

pub fn run(cmd: LearnBpeCommand) -> AnyhowResult<()> {
    let tokenizer = match &cmd.token_config {
        Some(path) => {
            // Learning works on pre-BPE tokens without joiners.
            let mut config = TokenizerConfig::from_file(path)?;
            config.bpe_model_path = None;
            config.joiner_annotate = false;
            Tokenizer::from_config(&config)?
        }
        None => Tokenizer::builder()
            .mode(TokenizationMode::Aggressive { digit_groups: None })
            .build()?,
    };

    let start = Instant::now();
    let warnings = EncodingWarnings::new();
    let mut counts = TokenCounter::new();
    for chunk in super::stdin_chunks() {
        let chunk = chunk?;
        counts.merge(TokenCounter::count_parallel(&chunk, |line| match line.text() {
            Ok(text) => Some((line.index, tokenizer.tokenize_to_strings(text))),
            Err(_) => {
                warnings.record(line.index, "learn-bpe (skipped)");
                None
            }
        }));
    }
    warnings.report("learn-bpe");
    info!(
        "counted {} distinct tokens over {} lines in {:.2}s",
        counts.len(),
        counts.lines(),
        start.elapsed().as_secs_f64()
    );

    let learner = BpeLearner::new(LearnConfig {
        num_merges: cmd.merges,
        min_frequency: cmd.min_frequency,
        ..Default::default()
    });
    let model = learner.learn(&counts)?;

    let network = NetworkDir::create(&cmd.dnet)?;
    save_bpe_model(&model, network.bpe_model(cmd.side))?;
    Ok(())
}
