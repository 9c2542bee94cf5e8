//! build-vocab command implementation.

use clap::Parser;
use std::path::PathBuf;

/// build-vocab command arguments.
#[derive(Parser)]
pub struct BuildVocabCommand {
    /// Network directory the vocabulary is written to
    #[arg(long)]
    pub dnet: PathBuf,

    /// Side the vocabulary belongs to (src or tgt)
    #[arg(long)]
    pub side: Side,

    /// Maximum vocabulary size, reserved specials included
    #[arg(long)]
    pub max_size: Option<usize>,

    /// Leave out symbols seen fewer times than this
    #[arg(long, default_value_t = 1)]
    pub min_frequency: u64,

    /// Joiner symbol reserved at id 5
    #[arg(long, default_value = DEFAULT_JOINER)]
    pub joiner: String,
}

use anyhow::Result as AnyhowResult;
use nmtprep_core::{EncodingWarnings, DEFAULT_JOINER};
use nmtprep_tokenizer::{save_vocabulary, NetworkDir, Side};
use nmtprep_training::{TokenCounter, VocabBuilder, VocabConfig};
use tracing::info;

pub fn run(cmd: BuildVocabCommand) -> AnyhowResult<()> {
    // Fail on a bad size before reading any input.
    let builder = VocabBuilder::new(VocabConfig {
        max_size: cmd.max_size,
        min_frequency: cmd.min_frequency,
        joiner: cmd.joiner.clone(),
    })?;

    let warnings = EncodingWarnings::new();
    let mut counts = TokenCounter::new();
    for chunk in super::stdin_chunks() {
        let chunk = chunk?;
        counts.merge(TokenCounter::count_parallel(&chunk, |line| match line.text() {
            Ok(text) => Some((line.index, text.split_whitespace().collect::<Vec<_>>())),
            Err(_) => {
                warnings.record(line.index, "build-vocab (skipped)");
                None
            }
        }));
    }
    warnings.report("build-vocab");
    info!(
        "read {} lines with {} distinct symbols",
        counts.lines(),
        counts.len()
    );

    let vocab = builder.build(&counts)?;
    let network = NetworkDir::create(&cmd.dnet)?;
    save_vocabulary(&vocab, network.vocab(cmd.side))?;
    Ok(())
}
