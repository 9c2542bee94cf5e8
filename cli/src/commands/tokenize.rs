//! tokenize and detokenize command implementations.
//!
//! Both stream stdin to stdout. Each chunk of lines is processed on the
//! worker pool and written back in input order.

use clap::Parser;
use std::path::PathBuf;

/// tokenize command arguments.
#[derive(Parser)]
pub struct TokenizeCommand {
    /// Tokenization config file (JSON)
    #[arg(short, long)]
    pub config: PathBuf,
}

/// detokenize command arguments.
#[derive(Parser)]
pub struct DetokenizeCommand {
    /// Tokenization config file (JSON) the text was tokenized with
    #[arg(short, long)]
    pub config: PathBuf,

    /// Read lines of ids and map them through this vocabulary first
    #[arg(long)]
    pub vocab: Option<PathBuf>,
}

use anyhow::{Context, Result as AnyhowResult};
use nmtprep_core::{EncodingWarnings, RawLine, Vocabulary};
use nmtprep_tokenizer::{load_vocabulary, Tokenizer, TokenizerConfig};
use rayon::prelude::*;
use std::io::{BufWriter, Write};
use tracing::info;

pub fn run_tokenize(cmd: TokenizeCommand) -> AnyhowResult<()> {
    let tokenizer = load(&cmd.config)?;
    stream("tokenize", |line, warnings| {
        Ok(tokenizer.tokenize_line(line, warnings))
    })
}

pub fn run_detokenize(cmd: DetokenizeCommand) -> AnyhowResult<()> {
    let tokenizer = load(&cmd.config)?;
    match &cmd.vocab {
        Some(path) => {
            let vocab = load_vocabulary(path)?;
            stream("detokenize", |line, warnings| {
                detokenize_ids(&tokenizer, &vocab, line, warnings)
            })
        }
        None => stream("detokenize", |line, warnings| {
            Ok(tokenizer.detokenize_line(line, warnings))
        }),
    }
}

fn load(path: &std::path::Path) -> AnyhowResult<Tokenizer> {
    let config = TokenizerConfig::from_file(path)?;
    Ok(Tokenizer::from_config(&config)?)
}

/// Ids -> symbols -> text. `<pad>`, `<bos>` and `<eos>` are dropped.
fn detokenize_ids(
    tokenizer: &Tokenizer,
    vocab: &Vocabulary,
    line: &RawLine,
    warnings: &EncodingWarnings,
) -> AnyhowResult<Vec<u8>> {
    let Ok(text) = line.text() else {
        warnings.record(line.index, "detokenize");
        return Ok(line.bytes.clone());
    };
    let ids = text
        .split_whitespace()
        .map(|id| id.parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("line {}: expected token ids", line.index + 1))?;
    let symbols = vocab
        .decode(&ids, true)
        .with_context(|| format!("line {}", line.index + 1))?;
    Ok(tokenizer.detokenize_strings(&symbols).into_bytes())
}

fn stream<F>(name: &str, process: F) -> AnyhowResult<()>
where
    F: Fn(&RawLine, &EncodingWarnings) -> AnyhowResult<Vec<u8>> + Sync,
{
    let warnings = EncodingWarnings::new();
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut lines = 0usize;

    for chunk in super::stdin_chunks() {
        let chunk = chunk?;
        let processed: Vec<Vec<u8>> = chunk
            .par_iter()
            .map(|line| process(line, &warnings))
            .collect::<AnyhowResult<_>>()?;
        for line in processed {
            out.write_all(&line)?;
            out.write_all(b"\n")?;
        }
        lines += chunk.len();
    }
    out.flush()?;

    warnings.report(name);
    info!("{}: {} lines", name, lines);
    Ok(())
}
