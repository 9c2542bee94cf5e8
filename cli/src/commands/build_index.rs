//! build-index command implementation.

use clap::Parser;
use std::path::PathBuf;

/// build-index command arguments.
#[derive(Parser)]
pub struct BuildIndexCommand {
    /// Network directory holding `<side>_vocab` and optional `<side>_token.json`
    #[arg(long)]
    pub dnet: PathBuf,

    /// Source corpus
    #[arg(long)]
    pub src: PathBuf,

    /// Target corpus, line-aligned with the source
    #[arg(long)]
    pub tgt: PathBuf,

    /// Index file to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Maximum examples per batch
    #[arg(long, default_value_t = 64)]
    pub max_batch_examples: usize,

    /// Maximum tokens (both sides, no padding) per batch
    #[arg(long, default_value_t = 4096)]
    pub max_batch_tokens: usize,

    /// Examples per shard, sorted and batched in memory (0 = whole corpus)
    #[arg(long, default_value_t = 500_000)]
    pub shard_size: usize,

    /// Seed for example and batch shuffling
    #[arg(long, default_value_t = 1234)]
    pub seed: u64,

    /// Keep corpus order within shards and the shards' batch order
    #[arg(long)]
    pub no_shuffle: bool,

    /// Do not wrap sequences in <bos>/<eos>
    #[arg(long)]
    pub no_bos_eos: bool,
}

use anyhow::Result as AnyhowResult;
use nmtprep_dataset::{BatchBuilder, BatchConfig, SideEncoder};
use nmtprep_tokenizer::{NetworkDir, Side};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub fn run(cmd: BuildIndexCommand) -> AnyhowResult<()> {
    let config = BatchConfig {
        max_batch_examples: cmd.max_batch_examples,
        max_batch_tokens: cmd.max_batch_tokens,
        shard_size: cmd.shard_size,
        shuffle: !cmd.no_shuffle,
        seed: cmd.seed,
        add_bos_eos: !cmd.no_bos_eos,
    };
    config.validate()?;

    let network = NetworkDir::new(&cmd.dnet);
    let builder = BatchBuilder::new(
        config,
        side_encoder(&network, Side::Src)?,
        side_encoder(&network, Side::Tgt)?,
    )?;

    let start = Instant::now();
    let stats = builder.build_index_file(&cmd.src, &cmd.tgt, &cmd.output)?;

    info!(
        "{} lines, {} examples in {} batches, {} malformed in {:.2}s",
        stats.lines,
        stats.examples,
        stats.batches,
        stats.malformed,
        start.elapsed().as_secs_f64()
    );
    info!(
        "src <unk> rate {:.2}% ({}/{}), tgt <unk> rate {:.2}% ({}/{})",
        100.0 * stats.src_oov.rate(),
        stats.src_oov.unknown,
        stats.src_oov.tokens,
        100.0 * stats.tgt_oov.rate(),
        stats.tgt_oov.unknown,
        stats.tgt_oov.tokens
    );
    Ok(())
}

fn side_encoder(network: &NetworkDir, side: Side) -> AnyhowResult<SideEncoder> {
    let vocab = Arc::new(network.load_vocabulary(side)?);
    let tokenizer = network.load_tokenizer(side)?;
    if tokenizer.is_none() {
        info!("{}: no tokenization config, input taken as tokenized", side);
    }
    Ok(SideEncoder::new(vocab, tokenizer))
}
