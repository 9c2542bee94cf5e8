//! nmtprep CLI - Command-line interface for corpus preprocessing.
//!
//! This is the main entry point for the `nmtprep` command-line tool. Logs go
//! to stderr so stdout stays a data channel for `tokenize` and `detokenize`.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    BuildIndexCommand, BuildVocabCommand, DetokenizeCommand, LearnBpeCommand, TokenizeCommand,
};

#[derive(Parser)]
#[command(name = "nmtprep")]
#[command(about = "Tokenization, BPE and batch preparation for translation corpora", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Learn BPE merges from raw text on stdin
    LearnBpe(LearnBpeCommand),
    /// Build a vocabulary from tokenized text on stdin
    BuildVocab(BuildVocabCommand),
    /// Tokenize stdin to stdout
    Tokenize(TokenizeCommand),
    /// Detokenize stdin to stdout
    Detokenize(DetokenizeCommand),
    /// Build a batch index file from an aligned corpus
    BuildIndex(BuildIndexCommand),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nmtprep=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::LearnBpe(cmd) => commands::learn_bpe::run(cmd)?,
        Commands::BuildVocab(cmd) => commands::build_vocab::run(cmd)?,
        Commands::Tokenize(cmd) => commands::tokenize::run_tokenize(cmd)?,
        Commands::Detokenize(cmd) => commands::tokenize::run_detokenize(cmd)?,
        Commands::BuildIndex(cmd) => commands::build_index::run(cmd)?,
    }

    Ok(())
}
